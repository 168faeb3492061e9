use crate::backend::BackendClient;
use serde_json::Value;

/// Pull the newline-delimited question block out of a prompt payload
///
/// The collaborator nests it as `props.data.questions`; a missing path or a
/// null value yields `None`.
pub fn extract_questions(payload: &Value) -> Option<&str> {
    payload.get("props")?.get("data")?.get("questions")?.as_str()
}

/// Split a question block into discrete prompt lines
///
/// Plain split on `'\n'`; every segment is kept, including empty ones, so the
/// list mirrors the block exactly.
pub fn split_prompt_lines(questions: &str) -> Vec<String> {
    questions.split('\n').map(str::to_string).collect()
}

/// Fetch the suggested prompts for a document
///
/// Degrades silently: an empty file name, a transport failure, or a payload
/// without the expected `props.data.questions` path all produce an empty
/// list with a logged message, never an error.
///
/// # Arguments
/// * `client` - Backend collaborator client
/// * `file_name` - Document to generate prompts for
/// * `count` - Optional number of prompts to request
///
/// # Returns
/// * `Vec<String>` - Prompt lines, possibly empty
pub async fn fetch_document_prompts(
    client: &BackendClient,
    file_name: &str,
    count: Option<u32>,
) -> Vec<String> {
    if file_name.is_empty() {
        log::warn!("prompt fetch skipped: no file name provided");
        return Vec::new();
    }

    match client.generate_document_prompts(file_name, count).await {
        Ok(payload) => match extract_questions(&payload) {
            Some(questions) => split_prompt_lines(questions),
            None => {
                log::error!("no prompts found for '{}'", file_name);
                Vec::new()
            }
        },
        Err(e) => {
            log::error!("prompt fetch for '{}' failed: {}", file_name, e);
            Vec::new()
        }
    }
}
