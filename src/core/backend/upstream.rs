use tracing::debug;

use crate::api::{extract_error_message, ChatCompletion, ChatMessage, ChatRequest};
use crate::core::backend::BackendError;

/// Returned when the vendor accepted the request but produced no content.
pub const NO_ANSWER: &str = "Sorry, I could not generate a response.";

const UNKNOWN_ERROR: &str = "Unknown error";

/// Join a base URL and an endpoint without doubling slashes.
pub(crate) fn construct_api_url(base_url: &str, endpoint: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        endpoint.trim_start_matches('/')
    )
}

/// One authenticated connection to a vendor's chat-completion endpoint.
pub struct CompletionClient<'a> {
    http: &'a reqwest::Client,
    url: String,
    api_key: &'a str,
}

impl<'a> CompletionClient<'a> {
    pub fn new(http: &'a reqwest::Client, base_url: &str, api_key: &'a str) -> Self {
        Self {
            http,
            url: construct_api_url(base_url, "chat/completions"),
            api_key,
        }
    }

    /// Sends one non-streaming request and returns the first choice's text.
    pub async fn send(&self, request: &ChatRequest) -> Result<String, BackendError> {
        debug!(url = %self.url, model = %request.model, "sending chat completion");
        let response = self
            .http
            .post(&self.url)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(request)
            .send()
            .await
            .map_err(BackendError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_rejection(status.as_u16(), &body));
        }

        let completion = response
            .json::<ChatCompletion>()
            .await
            .map_err(|err| BackendError::Decode(err.to_string()))?;
        Ok(completion
            .first_content()
            .map(str::to_owned)
            .unwrap_or_else(|| NO_ANSWER.to_string()))
    }
}

pub fn build_request(model: &str, question: &str, max_tokens: u32, temperature: f32) -> ChatRequest {
    ChatRequest {
        model: model.to_string(),
        messages: vec![ChatMessage::user(question)],
        max_tokens,
        temperature,
        stream: false,
    }
}

/// Maps a non-2xx vendor response to a backend error.
pub(crate) fn classify_rejection(status: u16, body: &str) -> BackendError {
    let message = extract_error_message(body).unwrap_or_else(|| UNKNOWN_ERROR.to_string());
    if status == 402 {
        BackendError::InsufficientBalance { message }
    } else {
        BackendError::Upstream { status, message }
    }
}
