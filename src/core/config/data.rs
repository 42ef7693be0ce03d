use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::animator::DEFAULT_TYPING_INTERVAL;
use crate::core::retry::RetryPolicy;
use crate::core::speech::DEFAULT_SPEECH_COMMAND;

pub const DEFAULT_BIND: &str = "127.0.0.1:3000";
pub const DEFAULT_BACKEND: &str = "groq";

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    pub max_retries: Option<u32>,
    pub delay_ms: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct TypingConfig {
    pub interval_ms: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct SpeechConfig {
    /// Synthesizer reading text on stdin (e.g., "espeak-ng")
    pub command: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct BackendOverride {
    pub base_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct Config {
    /// Listen address for `duochat serve`
    pub bind: Option<String>,
    /// Backend used by `duochat ask` when none is given (e.g., "groq", "deepseek")
    pub default_backend: Option<String>,
    /// Directory holding conversations.json, responses.json and settings.json
    pub data_dir: Option<PathBuf>,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub typing: TypingConfig,
    /// Enable syntax highlighting for fenced code blocks
    pub syntax: Option<bool>,
    #[serde(default)]
    pub speech: SpeechConfig,
    /// Per-backend overrides keyed by backend id
    #[serde(default)]
    pub backends: HashMap<String, BackendOverride>,
}

/// Get a user-friendly display string for a path
/// Converts absolute paths to use ~ notation on Unix-like systems when possible
pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}

impl Config {
    pub fn bind_addr(&self) -> &str {
        self.bind.as_deref().unwrap_or(DEFAULT_BIND)
    }

    pub fn default_backend(&self) -> &str {
        self.default_backend.as_deref().unwrap_or(DEFAULT_BACKEND)
    }

    pub fn syntax_enabled(&self) -> bool {
        self.syntax.unwrap_or(true)
    }

    pub fn speech_command(&self) -> &str {
        self.speech.command.as_deref().unwrap_or(DEFAULT_SPEECH_COMMAND)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        let default = RetryPolicy::default();
        RetryPolicy {
            max_retries: self.retry.max_retries.unwrap_or(default.max_retries),
            delay: self
                .retry
                .delay_ms
                .map(Duration::from_millis)
                .unwrap_or(default.delay),
        }
    }

    pub fn typing_interval(&self) -> Duration {
        self.typing
            .interval_ms
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_TYPING_INTERVAL)
    }

    pub fn base_url_for(&self, backend_id: &str) -> Option<&str> {
        self.backends
            .iter()
            .find(|(id, _)| id.eq_ignore_ascii_case(backend_id))
            .and_then(|(_, o)| o.base_url.as_deref())
    }
}
