//! Backend call adapters.
//!
//! A [`VendorBackend`] turns one question into a vendor chat-completion call.
//! Single-model vendors get exactly one call; vendors with several candidate
//! models walk them in order via [`fallback::first_accepted_model`].
//! [`Backend::answer`] folds every failure except an empty question into a
//! markdown document, so callers only special-case bad input.

pub mod fallback;
pub mod notices;
pub mod proxy;
pub mod upstream;

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, info};

use crate::core::builtin_backends::BuiltinBackend;
use crate::core::credentials::CredentialSource;
use upstream::{build_request, CompletionClient};

#[derive(Debug)]
pub enum BackendError {
    /// The question was missing or blank; no call was made.
    EmptyQuestion,
    MissingCredential {
        backend: String,
        env_var: String,
    },
    /// The vendor answered 402.
    InsufficientBalance {
        message: String,
    },
    Upstream {
        status: u16,
        message: String,
    },
    AllModelsFailed {
        last_reason: String,
    },
    Transport(reqwest::Error),
    Decode(String),
    /// The proxy answered with a non-2xx status.
    Http {
        status: u16,
        body: String,
    },
}

impl BackendError {
    /// True when the vendor rejected the model name rather than the request.
    pub fn is_invalid_model(&self) -> bool {
        match self {
            BackendError::Upstream { status, message } => {
                *status == 400 && message.contains("model")
            }
            _ => false,
        }
    }

    /// The vendor's own wording where there is one.
    pub fn reason(&self) -> String {
        match self {
            BackendError::Upstream { message, .. }
            | BackendError::InsufficientBalance { message } => message.clone(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::EmptyQuestion => write!(f, "Message is required"),
            BackendError::MissingCredential { backend, env_var } => write!(
                f,
                "API key for {backend} is not configured (set {env_var} or run `duochat auth {}`)",
                backend.to_ascii_lowercase()
            ),
            BackendError::InsufficientBalance { message } => {
                write!(f, "Insufficient balance: {message}")
            }
            BackendError::Upstream { status, message } => {
                write!(f, "API error: {status} - {message}")
            }
            BackendError::AllModelsFailed { last_reason } => {
                write!(f, "All models failed. Last error: {last_reason}")
            }
            BackendError::Transport(err) => write!(f, "Request failed: {err}"),
            BackendError::Decode(detail) => write!(f, "Invalid response: {detail}"),
            BackendError::Http { status, body } => write!(f, "HTTP {status}: {body}"),
        }
    }
}

impl Error for BackendError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            BackendError::Transport(err) => Some(err),
            _ => None,
        }
    }
}

/// Anything that can answer a question with a markdown string.
#[async_trait]
pub trait Backend: Send + Sync {
    fn id(&self) -> &str;

    async fn answer(&self, question: &str) -> Result<String, BackendError>;

    /// [`Backend::answer`] for a question asked within a stored conversation.
    async fn answer_in(
        &self,
        question: &str,
        _conversation_id: &str,
    ) -> Result<String, BackendError> {
        self.answer(question).await
    }
}

#[derive(Debug, Clone)]
enum ModelStrategy {
    Single(String),
    Fallback(Vec<String>),
}

pub struct VendorBackend {
    meta: BuiltinBackend,
    base_url: String,
    strategy: ModelStrategy,
    http: reqwest::Client,
    credentials: Arc<dyn CredentialSource>,
}

impl VendorBackend {
    pub fn new(
        meta: BuiltinBackend,
        http: reqwest::Client,
        credentials: Arc<dyn CredentialSource>,
    ) -> Self {
        let strategy = if meta.uses_model_fallback() {
            ModelStrategy::Fallback(meta.models.clone())
        } else {
            ModelStrategy::Single(meta.models.first().cloned().unwrap_or_default())
        };
        Self {
            base_url: meta.base_url.clone(),
            meta,
            strategy,
            http,
            credentials,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }


    /// Runs the vendor call(s) without folding failures into markdown.
    pub async fn complete(&self, question: &str) -> Result<String, BackendError> {
        if question.trim().is_empty() {
            return Err(BackendError::EmptyQuestion);
        }
        let api_key = self.credentials.api_key(&self.meta).ok_or_else(|| {
            BackendError::MissingCredential {
                backend: self.meta.display_name.clone(),
                env_var: self.meta.api_key_env.clone(),
            }
        })?;
        let client = CompletionClient::new(&self.http, &self.base_url, &api_key);
        let (max_tokens, temperature) = (self.meta.max_tokens, self.meta.temperature);

        match &self.strategy {
            ModelStrategy::Single(model) => {
                client
                    .send(&build_request(model, question, max_tokens, temperature))
                    .await
            }
            ModelStrategy::Fallback(models) => {
                let client = &client;
                fallback::first_accepted_model(models, |model| async move {
                    client
                        .send(&build_request(&model, question, max_tokens, temperature))
                        .await
                })
                .await
            }
        }
    }
}

#[async_trait]
impl Backend for VendorBackend {
    fn id(&self) -> &str {
        &self.meta.id
    }

    async fn answer(&self, question: &str) -> Result<String, BackendError> {
        info!(backend = %self.meta.id, chars = question.chars().count(), "forwarding question");
        debug!(backend = %self.meta.id, question = %question, "question text");
        match self.complete(question).await {
            Ok(answer) => {
                info!(backend = %self.meta.id, "answer received");
                Ok(answer)
            }
            Err(BackendError::EmptyQuestion) => Err(BackendError::EmptyQuestion),
            Err(err) => {
                error!(backend = %self.meta.id, error = %err, "backend call failed");
                Ok(notices::failure_document(&self.meta, &err, question))
            }
        }
    }
}

#[cfg(test)]
mod tests;
