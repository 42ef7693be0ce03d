//! Built-in backend catalog
//!
//! The catalog is embedded from `builtin_backends.toml` at build time and
//! describes every vendor the proxy can forward questions to.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuiltinBackend {
    pub id: String,
    pub display_name: String,
    pub base_url: String,
    /// Environment variable consulted first for the API key.
    pub api_key_env: String,
    pub billing_url: String,
    /// Candidate models, in the order they are tried.
    pub models: Vec<String>,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct BuiltinBackendsConfig {
    backends: Vec<BuiltinBackend>,
}

impl BuiltinBackend {
    /// Whether rejected model names advance to the next candidate.
    pub fn uses_model_fallback(&self) -> bool {
        self.models.len() > 1
    }
}

/// Load built-in backends from the embedded configuration
pub fn load_builtin_backends() -> Vec<BuiltinBackend> {
    const CONFIG_CONTENT: &str = include_str!("../builtin_backends.toml");

    let config: BuiltinBackendsConfig =
        toml::from_str(CONFIG_CONTENT).expect("Failed to parse builtin_backends.toml");

    config.backends
}

/// Find a built-in backend by ID (case-insensitive)
pub fn find_builtin_backend(id: &str) -> Option<BuiltinBackend> {
    load_builtin_backends()
        .into_iter()
        .find(|b| b.id.eq_ignore_ascii_case(id))
}
