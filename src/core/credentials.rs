//! API key lookup for the vendor backends.
//!
//! Keys come from the backend's environment variable first and from the
//! system keyring second. A missing key is not an error here; the backend
//! turns it into a markdown notice for the user.

use std::error::Error;
use std::fmt;

use crate::core::builtin_backends::BuiltinBackend;

const KEYRING_SERVICE: &str = "duochat";

/// Failures when accessing the system keyring.
///
/// Recoverable errors mean the credential store was temporarily unavailable
/// (locked keychain, no secret service running).
#[derive(Debug)]
pub enum KeyringAccessError {
    Recoverable(keyring::Error),
    Permanent(keyring::Error),
}

impl KeyringAccessError {
    fn inner(&self) -> &keyring::Error {
        match self {
            KeyringAccessError::Recoverable(err) | KeyringAccessError::Permanent(err) => err,
        }
    }

    pub fn is_recoverable(&self) -> bool {
        matches!(self, KeyringAccessError::Recoverable(_))
    }
}

impl From<keyring::Error> for KeyringAccessError {
    fn from(err: keyring::Error) -> Self {
        match err {
            keyring::Error::PlatformFailure(_) | keyring::Error::NoStorageAccess(_) => {
                KeyringAccessError::Recoverable(err)
            }
            other => KeyringAccessError::Permanent(other),
        }
    }
}

impl fmt::Display for KeyringAccessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "keyring unavailable: {}", self.inner())
    }
}

impl Error for KeyringAccessError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(self.inner())
    }
}

/// Where a backend's key is looked up.
pub trait CredentialSource: Send + Sync {
    fn api_key(&self, backend: &BuiltinBackend) -> Option<String>;
}

/// Environment variable, then keyring.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemCredentials {
    /// Skip the keyring; used by `serve --env-only` and in containers.
    pub env_only: bool,
}

impl SystemCredentials {
    pub fn new(env_only: bool) -> Self {
        Self { env_only }
    }
}

impl CredentialSource for SystemCredentials {
    fn api_key(&self, backend: &BuiltinBackend) -> Option<String> {
        if let Some(key) = std::env::var(&backend.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
        {
            return Some(key);
        }
        if self.env_only {
            return None;
        }
        match keyring_get(&backend.id) {
            Ok(key) => key,
            Err(err) => {
                tracing::warn!(backend = %backend.id, error = %err, "keyring lookup failed");
                None
            }
        }
    }
}

/// Fixed keys, for tests and embedding.
#[derive(Debug, Default, Clone)]
pub struct StaticCredentials {
    keys: Vec<(String, String)>,
}

impl StaticCredentials {
    pub fn with_key(mut self, backend_id: &str, key: &str) -> Self {
        self.keys.push((backend_id.to_string(), key.to_string()));
        self
    }
}

impl CredentialSource for StaticCredentials {
    fn api_key(&self, backend: &BuiltinBackend) -> Option<String> {
        self.keys
            .iter()
            .find(|(id, _)| id.eq_ignore_ascii_case(&backend.id))
            .map(|(_, key)| key.clone())
    }
}

fn entry(backend_id: &str) -> Result<keyring::Entry, KeyringAccessError> {
    Ok(keyring::Entry::new(KEYRING_SERVICE, backend_id)?)
}

pub fn keyring_get(backend_id: &str) -> Result<Option<String>, KeyringAccessError> {
    match entry(backend_id)?.get_password() {
        Ok(key) => Ok(Some(key)),
        Err(keyring::Error::NoEntry) => Ok(None),
        Err(err) => Err(err.into()),
    }
}

pub fn keyring_set(backend_id: &str, key: &str) -> Result<(), KeyringAccessError> {
    entry(backend_id)?.set_password(key)?;
    Ok(())
}

/// Removes a stored key. Returns false when nothing was stored.
pub fn keyring_remove(backend_id: &str) -> Result<bool, KeyringAccessError> {
    match entry(backend_id)?.delete_credential() {
        Ok(()) => Ok(true),
        Err(keyring::Error::NoEntry) => Ok(false),
        Err(err) => Err(err.into()),
    }
}
