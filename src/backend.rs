use crate::report::ExportBackend;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for the backend collaborator endpoints
///
/// Every method maps one collaborator call; responses come back as untyped
/// JSON because none of the endpoints has a contractually fixed shape. The
/// shape-tolerant layers ([`crate::agents`], [`crate::prompts`],
/// [`crate::chat`]) absorb the variance.
#[derive(Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    /// Create a client for the backend at `base_url`
    ///
    /// A trailing slash on the base URL is dropped so endpoint paths can be
    /// appended uniformly.
    ///
    /// # Errors
    /// * Returns an error if the underlying HTTP client cannot be built;
    ///   this is a startup failure, not a per-request one
    pub fn new(base_url: &str) -> Result<Self, String> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| format!("failed to build HTTP client: {}", e))?;

        Ok(BackendClient {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Fetch the raw agent list for a scope
    ///
    /// The response shape is not fixed; callers run it through
    /// [`crate::agents::normalize`].
    ///
    /// # Arguments
    /// * `scope_id` - Opaque tenant/dataset key
    ///
    /// # Returns
    /// * `Result<Value, String>` - Raw payload, or a displayable error message
    pub async fn list_agents(&self, scope_id: &str) -> Result<Value, String> {
        let url = self.endpoint("/agents/list");
        let response = self
            .http
            .get(&url)
            .query(&[("scope", scope_id)])
            .send()
            .await
            .map_err(|e| e.to_string())?;

        read_json(response).await
    }

    /// Ask the backend to generate prompts for a document
    ///
    /// Expected shape is `{props: {data: {questions: string|null}}}`; callers
    /// use [`crate::prompts::extract_questions`] rather than assuming it.
    ///
    /// # Arguments
    /// * `file_name` - Document to generate prompts for
    /// * `count` - Optional number of prompts to request
    pub async fn generate_document_prompts(
        &self,
        file_name: &str,
        count: Option<u32>,
    ) -> Result<Value, String> {
        let url = self.endpoint("/documents/prompts");
        let body = serde_json::json!({
            "file_name": file_name,
            "count": count,
        });

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        read_json(response).await
    }

    /// Run a hybrid search for a free-text query
    ///
    /// Expected shape is `{props: {data: {result: string}}}`.
    pub async fn get_search_results(&self, query: &str) -> Result<Value, String> {
        let url = self.endpoint("/search");
        let body = serde_json::json!({ "query": query });

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        read_json(response).await
    }
}

impl ExportBackend for BackendClient {
    /// Push one document's data to the remote export store
    fn populate_export(
        &self,
        scope_id: &str,
        agent_id: &str,
        file_name: &str,
    ) -> impl Future<Output = Result<(), String>> + Send {
        let url = self.endpoint("/exports/populate");
        let body = serde_json::json!({
            "scope_id": scope_id,
            "agent_id": agent_id,
            "file_name": file_name,
        });
        let http = self.http.clone();

        async move {
            let response = http
                .post(&url)
                .json(&body)
                .send()
                .await
                .map_err(|e| e.to_string())?;

            check_status(response).map(|_| ())
        }
    }
}

fn check_status(response: reqwest::Response) -> Result<reqwest::Response, String> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(format!("backend returned {}", status))
    }
}

async fn read_json(response: reqwest::Response) -> Result<Value, String> {
    check_status(response)?
        .json::<Value>()
        .await
        .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_builds_for_a_plain_base_url() {
        assert!(BackendClient::new("http://backend.local").is_ok());
    }

    #[test]
    fn trailing_slash_is_dropped_from_base_url() {
        let client = BackendClient::new("http://backend.local/").unwrap();
        assert_eq!(client.endpoint("/search"), "http://backend.local/search");
    }

    #[test]
    fn endpoints_join_cleanly_without_trailing_slash() {
        let client = BackendClient::new("http://backend.local").unwrap();
        assert_eq!(
            client.endpoint("/agents/list"),
            "http://backend.local/agents/list"
        );
    }
}
