use crate::backend::BackendClient;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::sync::Mutex;

/// Who authored a chat message
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

/// One entry in the chat transcript
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub sender: Sender,
    pub text: String,
    pub at: DateTime<Utc>,
}

impl ChatMessage {
    fn new(sender: Sender, text: &str) -> Self {
        ChatMessage {
            sender,
            text: text.to_string(),
            at: Utc::now(),
        }
    }
}

/// Chat transcript backed by search results
///
/// A question and its answer are committed together, so a failed or
/// malformed search leaves the transcript exactly as it was.
#[derive(Debug, Default)]
pub struct ChatLog {
    messages: Vec<ChatMessage>,
}

impl ChatLog {
    pub fn new() -> Self {
        ChatLog::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    fn commit(&mut self, query: &str, answer: &str) {
        self.messages.push(ChatMessage::new(Sender::User, query));
        self.messages.push(ChatMessage::new(Sender::Assistant, answer));
    }
}

/// Pull the answer text out of a search payload
///
/// The collaborator nests it as `props.data.result`; any other shape yields
/// `None`.
pub fn extract_result(payload: &Value) -> Option<&str> {
    payload.get("props")?.get("data")?.get("result")?.as_str()
}

/// Send one chat message through the search backend
///
/// A blank query is a no-op. Transport failures and malformed payloads are
/// logged and leave the transcript unchanged; only a well-shaped answer
/// commits the question/answer pair. Returns a snapshot of the transcript
/// after the attempt.
///
/// # Arguments
/// * `client` - Backend collaborator client
/// * `log` - Shared transcript
/// * `query` - The user's free-text question
pub async fn send_message(
    client: &BackendClient,
    log: &Mutex<ChatLog>,
    query: &str,
) -> Vec<ChatMessage> {
    if query.trim().is_empty() {
        return snapshot(log);
    }

    let outcome = client.get_search_results(query).await;
    apply_search_outcome(log, query, outcome);
    snapshot(log)
}

/// Fold a search outcome into the transcript
///
/// Split out from [`send_message`] so the commit/degrade policy is testable
/// without a live backend. Returns whether a pair was committed.
pub fn apply_search_outcome(
    log: &Mutex<ChatLog>,
    query: &str,
    outcome: Result<Value, String>,
) -> bool {
    match outcome {
        Ok(payload) => match extract_result(&payload) {
            Some(answer) => {
                log.lock().unwrap().commit(query, answer);
                true
            }
            None => {
                log::error!("invalid search results format or no details found");
                false
            }
        },
        Err(e) => {
            log::error!("error fetching search results: {}", e);
            false
        }
    }
}

fn snapshot(log: &Mutex<ChatLog>) -> Vec<ChatMessage> {
    log.lock().unwrap().messages().to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn result_is_extracted_from_nested_path() {
        let payload = json!({"props": {"data": {"result": "an answer"}}});
        assert_eq!(extract_result(&payload), Some("an answer"));
    }

    #[test]
    fn malformed_payloads_give_none() {
        assert_eq!(extract_result(&json!({"props": {"data": {}}})), None);
        assert_eq!(extract_result(&json!({"result": "top level"})), None);
        assert_eq!(extract_result(&json!(null)), None);
    }

    #[test]
    fn well_shaped_outcome_commits_question_and_answer() {
        let log = Mutex::new(ChatLog::new());
        let payload = json!({"props": {"data": {"result": "the answer"}}});

        assert!(apply_search_outcome(&log, "why?", Ok(payload)));

        let log = log.lock().unwrap();
        let messages = log.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].sender, Sender::User);
        assert_eq!(messages[0].text, "why?");
        assert_eq!(messages[1].sender, Sender::Assistant);
        assert_eq!(messages[1].text, "the answer");
    }

    #[test]
    fn malformed_outcome_leaves_transcript_unchanged() {
        let log = Mutex::new(ChatLog::new());

        assert!(!apply_search_outcome(&log, "why?", Ok(json!({"oops": 1}))));
        assert!(!apply_search_outcome(
            &log,
            "why?",
            Err("connection reset".to_string())
        ));
        assert!(log.lock().unwrap().messages().is_empty());
    }
}
