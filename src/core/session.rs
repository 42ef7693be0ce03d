//! Client-side chat flow: question → retry → backend → store → animation.

use std::error::Error;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::core::animator::TypingAnimator;
use crate::core::backend::notices::connection_error;
use crate::core::backend::upstream::NO_ANSWER;
use crate::core::backend::Backend;
use crate::core::conversation::{Conversation, ExchangeRecord};
use crate::core::i18n::{self, Strings};
use crate::core::notice::{Notice, Notifier};
use crate::core::retry::{retry_call, RetryError, RetryPolicy};
use crate::core::speech::SpeechPort;
use crate::core::store::{export_file_name, ConversationStore, StoreError};

#[derive(Debug)]
pub enum SessionError {
    EmptyQuestion,
    Store(StoreError),
    Io { path: PathBuf, source: std::io::Error },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::EmptyQuestion => write!(f, "Question is empty"),
            SessionError::Store(err) => write!(f, "{err}"),
            SessionError::Io { path, source } => {
                write!(f, "Failed to write {}: {source}", path.display())
            }
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SessionError::Store(err) => Some(err),
            SessionError::Io { source, .. } => Some(source),
            SessionError::EmptyQuestion => None,
        }
    }
}

impl From<StoreError> for SessionError {
    fn from(err: StoreError) -> Self {
        SessionError::Store(err)
    }
}

pub struct ChatSession {
    store: ConversationStore,
    backend: Arc<dyn Backend>,
    notifier: Arc<dyn Notifier>,
    retry: RetryPolicy,
    animator: TypingAnimator,
    cancel: CancellationToken,
}

impl ChatSession {
    pub fn new(
        store: ConversationStore,
        backend: Arc<dyn Backend>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            store,
            backend,
            notifier,
            retry: RetryPolicy::default(),
            animator: TypingAnimator::default(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_animator(mut self, animator: TypingAnimator) -> Self {
        self.animator = animator;
        self
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ConversationStore {
        &mut self.store
    }

    pub fn animator(&self) -> &TypingAnimator {
        &self.animator
    }

    pub fn animator_mut(&mut self) -> &mut TypingAnimator {
        &mut self.animator
    }

    /// Token that aborts the retry wait of the submission in progress.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    fn strings(&self) -> &'static Strings {
        i18n::strings(self.store.settings().language)
    }

    pub fn new_conversation(&mut self) -> Conversation {
        self.animator.cancel();
        let conversation = self.store.create_conversation();
        info!(conversation = %conversation.id, "conversation created");
        self.notifier
            .notify(Notice::success(self.strings().conversation_created));
        conversation
    }

    /// Asks the backend and records the exchange.
    ///
    /// A record is stored for every non-empty question: when all attempts
    /// fail the answer is a markdown document carrying the error and the
    /// question. The answer's typing animation starts before returning.
    pub async fn submit(&mut self, question: &str) -> Result<ExchangeRecord, SessionError> {
        if question.trim().is_empty() {
            return Err(SessionError::EmptyQuestion);
        }
        let conversation_id = match self.store.current_conversation_id() {
            Some(id) => id.to_string(),
            None => self.new_conversation().id,
        };
        if self.cancel.is_cancelled() {
            self.cancel = CancellationToken::new();
        }

        let strings = self.strings();
        let backend = self.backend.clone();
        let conversation = conversation_id.as_str();
        let result = retry_call(
            &self.retry,
            self.notifier.as_ref(),
            strings.retry,
            &self.cancel,
            || {
                let backend = backend.clone();
                async move { backend.answer_in(question, conversation).await }
            },
        )
        .await;

        let answer = match result {
            Ok(answer) if answer.trim().is_empty() => NO_ANSWER.to_string(),
            Ok(answer) => {
                self.notifier.notify(Notice::success(strings.success));
                answer
            }
            Err(err) => {
                let detail = match &err {
                    RetryError::Exhausted { last, .. } => last.to_string(),
                    RetryError::Cancelled { .. } => "Request cancelled".to_string(),
                };
                warn!(
                    backend = backend.id(),
                    attempts = err.attempts(),
                    error = %detail,
                    "giving up on question"
                );
                self.notifier
                    .notify(Notice::error(format!("{}: {detail}", strings.error)));
                connection_error(&detail, question)
            }
        };

        let record = self
            .store
            .append_exchange(&conversation_id, question, &answer)?;
        self.animator.start(record.answer.clone());
        Ok(record)
    }

    /// Writes `conversation-<id>.txt` into `dir`.
    pub fn export(&self, conversation_id: &str, dir: &Path) -> Result<PathBuf, SessionError> {
        let text = match self.store.export_text(conversation_id) {
            Ok(text) => text,
            Err(err) => {
                if matches!(err, StoreError::EmptyExport(_)) {
                    self.notifier
                        .notify(Notice::error(self.strings().nothing_to_export));
                }
                return Err(err.into());
            }
        };
        let path = dir.join(export_file_name(conversation_id));
        fs::write(&path, text).map_err(|source| SessionError::Io {
            path: path.clone(),
            source,
        })?;
        self.notifier
            .notify(Notice::success(self.strings().exported));
        Ok(path)
    }

    pub fn speak(&self, record: &ExchangeRecord, speech: &dyn SpeechPort) {
        if let Err(err) = speech.speak(&record.answer, self.store.settings().language) {
            warn!(error = %err, "speech unavailable");
            self.notifier
                .notify(Notice::error(format!("{}: {err}", self.strings().error)));
        }
    }
}
