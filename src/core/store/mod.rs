//! Conversation store.
//!
//! Holds the conversation list, the exchange records and the settings, and
//! writes all three records through a [`StoragePort`] after every change.
//! Both lists are kept newest first. Writes are best effort: a failing
//! write is logged and the in-memory state stays authoritative.

pub mod storage;

use std::error::Error;
use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::core::conversation::{Conversation, ExchangeRecord, Settings};
use crate::core::i18n;
pub use storage::{FileStorage, MemoryStorage, StoragePort};

pub const CONVERSATIONS_KEY: &str = "conversations";
pub const RESPONSES_KEY: &str = "responses";
pub const SETTINGS_KEY: &str = "settings";

#[derive(Debug)]
pub enum StoreError {
    UnknownConversation(String),
    /// The conversation has no exchange records.
    EmptyExport(String),
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Json {
        key: String,
        source: serde_json::Error,
    },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::UnknownConversation(id) => write!(f, "Unknown conversation '{id}'"),
            StoreError::EmptyExport(id) => {
                write!(f, "Conversation '{id}' has no exchanges to export")
            }
            StoreError::Io { path, source } => {
                write!(f, "Failed to access {}: {source}", path.display())
            }
            StoreError::Json { key, source } => write!(f, "Corrupt {key} record: {source}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            StoreError::Io { source, .. } => Some(source),
            StoreError::Json { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Hands out strictly increasing millisecond ids.
#[derive(Debug, Default, Clone, Copy)]
struct IdClock {
    last: i64,
}

impl IdClock {
    fn observe(&mut self, id: &str) {
        if let Ok(value) = id.parse::<i64>() {
            self.last = self.last.max(value);
        }
    }

    fn next(&mut self, now: DateTime<Utc>) -> String {
        self.last = now.timestamp_millis().max(self.last + 1);
        self.last.to_string()
    }
}

pub fn export_file_name(conversation_id: &str) -> String {
    format!("conversation-{conversation_id}.txt")
}

pub struct ConversationStore {
    storage: Box<dyn StoragePort>,
    conversations: Vec<Conversation>,
    exchanges: Vec<ExchangeRecord>,
    settings: Settings,
    ids: IdClock,
}

impl ConversationStore {
    /// Reloads all three records; absent records start empty/default.
    pub fn load(storage: Box<dyn StoragePort>) -> Result<Self, StoreError> {
        let conversations: Vec<Conversation> =
            read_record(storage.as_ref(), CONVERSATIONS_KEY)?.unwrap_or_default();
        let exchanges: Vec<ExchangeRecord> =
            read_record(storage.as_ref(), RESPONSES_KEY)?.unwrap_or_default();
        let settings: Settings = read_record(storage.as_ref(), SETTINGS_KEY)?.unwrap_or_default();

        let mut ids = IdClock::default();
        for id in conversations
            .iter()
            .map(|c| c.id.as_str())
            .chain(exchanges.iter().map(|r| r.id.as_str()))
        {
            ids.observe(id);
        }

        debug!(
            conversations = conversations.len(),
            exchanges = exchanges.len(),
            "store loaded"
        );
        Ok(Self {
            storage,
            conversations,
            exchanges,
            settings,
            ids,
        })
    }

    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn exchanges(&self) -> &[ExchangeRecord] {
        &self.exchanges
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn conversation(&self, id: &str) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.id == id)
    }

    pub fn current_conversation_id(&self) -> Option<&str> {
        self.settings
            .current_conversation
            .as_deref()
            .filter(|id| self.conversation(id).is_some())
    }

    /// Creates a conversation at the front of the list and makes it current.
    pub fn create_conversation(&mut self) -> Conversation {
        let now = Utc::now();
        let label = i18n::strings(self.settings.language).new_conversation;
        let conversation = Conversation {
            id: self.ids.next(now),
            title: format!("{label} {}", self.conversations.len() + 1),
            created_at: now,
            updated_at: now,
        };
        self.conversations.insert(0, conversation.clone());
        self.settings.current_conversation = Some(conversation.id.clone());
        self.persist();
        conversation
    }

    pub fn select_conversation(&mut self, id: &str) -> Result<(), StoreError> {
        if self.conversation(id).is_none() {
            return Err(StoreError::UnknownConversation(id.to_string()));
        }
        self.settings.current_conversation = Some(id.to_string());
        self.persist();
        Ok(())
    }

    pub fn rename_conversation(&mut self, id: &str, title: &str) -> Result<(), StoreError> {
        let conversation = self
            .conversations
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| StoreError::UnknownConversation(id.to_string()))?;
        conversation.title = title.to_string();
        conversation.updated_at = Utc::now();
        self.persist();
        Ok(())
    }

    /// Records one exchange at the front of the list.
    pub fn append_exchange(
        &mut self,
        conversation_id: &str,
        question: &str,
        answer: &str,
    ) -> Result<ExchangeRecord, StoreError> {
        let now = Utc::now();
        let conversation = self
            .conversations
            .iter_mut()
            .find(|c| c.id == conversation_id)
            .ok_or_else(|| StoreError::UnknownConversation(conversation_id.to_string()))?;
        conversation.updated_at = now;

        let record = ExchangeRecord {
            id: self.ids.next(now),
            question: question.to_string(),
            answer: answer.to_string(),
            timestamp: now,
            conversation_id: conversation_id.to_string(),
        };
        self.exchanges.insert(0, record.clone());
        self.persist();
        Ok(record)
    }

    /// Records of one conversation, in stored order (newest first).
    pub fn exchanges_for(&self, conversation_id: &str) -> Vec<&ExchangeRecord> {
        self.exchanges
            .iter()
            .filter(|r| r.conversation_id == conversation_id)
            .collect()
    }

    /// Conversations whose title, questions or answers contain `term`,
    /// ignoring case. An empty term matches everything.
    pub fn search(&self, term: &str) -> Vec<&Conversation> {
        let needle = term.to_lowercase();
        self.conversations
            .iter()
            .filter(|c| {
                c.title.to_lowercase().contains(&needle)
                    || self.exchanges.iter().any(|r| {
                        r.conversation_id == c.id
                            && (r.question.to_lowercase().contains(&needle)
                                || r.answer.to_lowercase().contains(&needle))
                    })
            })
            .collect()
    }

    /// Plain-text transcript: one `Q:`/`A:` pair per record.
    pub fn export_text(&self, conversation_id: &str) -> Result<String, StoreError> {
        if self.conversation(conversation_id).is_none() {
            return Err(StoreError::UnknownConversation(conversation_id.to_string()));
        }
        let records = self.exchanges_for(conversation_id);
        if records.is_empty() {
            return Err(StoreError::EmptyExport(conversation_id.to_string()));
        }
        Ok(records
            .iter()
            .map(|r| format!("Q: {}\nA: {}\n\n", r.question, r.answer))
            .collect())
    }

    pub fn update_settings(&mut self, update: impl FnOnce(&mut Settings)) {
        update(&mut self.settings);
        self.persist();
    }

    fn persist(&mut self) {
        let records = [
            (CONVERSATIONS_KEY, serde_json::to_string(&self.conversations)),
            (RESPONSES_KEY, serde_json::to_string(&self.exchanges)),
            (SETTINGS_KEY, serde_json::to_string(&self.settings)),
        ];
        for (key, serialized) in records {
            let result = serialized
                .map_err(|source| StoreError::Json {
                    key: key.to_string(),
                    source,
                })
                .and_then(|contents| self.storage.write(key, &contents));
            if let Err(err) = result {
                warn!(record = key, error = %err, "failed to persist store record");
            }
        }
    }
}

fn read_record<T: DeserializeOwned>(
    storage: &dyn StoragePort,
    key: &str,
) -> Result<Option<T>, StoreError> {
    match storage.read(key)? {
        Some(contents) => serde_json::from_str(&contents)
            .map(Some)
            .map_err(|source| StoreError::Json {
                key: key.to_string(),
                source,
            }),
        None => Ok(None),
    }
}
