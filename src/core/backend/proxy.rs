use async_trait::async_trait;
use tracing::{debug, warn};

use crate::api::{AskRequest, AskResponse};
use crate::core::backend::upstream::construct_api_url;
use crate::core::backend::{Backend, BackendError};

/// Client for a running `duochat serve` instance.
///
/// Unlike [`super::VendorBackend`], every non-2xx status is an error so the
/// retry wrapper can try again.
pub struct ProxyClient {
    http: reqwest::Client,
    server_url: String,
    backend_id: String,
}

impl ProxyClient {
    pub fn new(http: reqwest::Client, server_url: &str, backend_id: &str) -> Self {
        Self {
            http,
            server_url: server_url.to_string(),
            backend_id: backend_id.to_string(),
        }
    }

    fn endpoint(&self) -> String {
        construct_api_url(&self.server_url, &format!("api/{}", self.backend_id))
    }

    async fn post(
        &self,
        question: &str,
        conversation_id: Option<&str>,
    ) -> Result<String, BackendError> {
        let url = self.endpoint();
        debug!(url = %url, conversation = ?conversation_id, "posting question to proxy");
        let response = self
            .http
            .post(&url)
            .json(&AskRequest::new(question, conversation_id.map(str::to_string)))
            .send()
            .await
            .map_err(BackendError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %body, "proxy rejected question");
            return Err(BackendError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let payload = response
            .json::<AskResponse>()
            .await
            .map_err(|err| BackendError::Decode(err.to_string()))?;
        Ok(payload.answer)
    }
}

#[async_trait]
impl Backend for ProxyClient {
    fn id(&self) -> &str {
        &self.backend_id
    }

    async fn answer(&self, question: &str) -> Result<String, BackendError> {
        self.post(question, None).await
    }

    async fn answer_in(
        &self,
        question: &str,
        conversation_id: &str,
    ) -> Result<String, BackendError> {
        self.post(question, Some(conversation_id)).await
    }
}
