//! `auth` / `deauth`: API keys in the system keyring.

use std::error::Error;
use std::io::{self, BufRead, Write};

use crate::core::builtin_backends::{find_builtin_backend, load_builtin_backends, BuiltinBackend};
use crate::core::credentials::{keyring_get, keyring_remove, keyring_set};

fn lookup(backend_id: &str) -> Result<BuiltinBackend, Box<dyn Error>> {
    find_builtin_backend(backend_id)
        .ok_or_else(|| format!("Unknown backend '{backend_id}' (expected deepseek or groq)").into())
}

/// Where a backend's key would currently come from.
pub fn key_status(backend: &BuiltinBackend, env_value: Option<&str>, in_keyring: bool) -> String {
    if env_value.is_some_and(|value| !value.trim().is_empty()) {
        format!("{} (from {})", backend.display_name, backend.api_key_env)
    } else if in_keyring {
        format!("{} (keyring)", backend.display_name)
    } else {
        format!("{} (not configured)", backend.display_name)
    }
}

fn print_status() {
    println!("API keys:");
    for backend in load_builtin_backends() {
        let env_value = std::env::var(&backend.api_key_env).ok();
        let in_keyring = match keyring_get(&backend.id) {
            Ok(key) => key.is_some(),
            Err(err) => {
                tracing::warn!(backend = %backend.id, error = %err, "keyring lookup failed");
                false
            }
        };
        println!("  {}", key_status(&backend, env_value.as_deref(), in_keyring));
    }
}

pub fn auth(backend_id: Option<&str>) -> Result<(), Box<dyn Error>> {
    let Some(backend_id) = backend_id else {
        print_status();
        return Ok(());
    };
    let backend = lookup(backend_id)?;

    print!("Enter your {} API key: ", backend.display_name);
    io::stdout().flush()?;
    let mut key = String::new();
    io::stdin().lock().read_line(&mut key)?;
    let key = key.trim();
    if key.is_empty() {
        return Err("API key cannot be empty".into());
    }

    keyring_set(&backend.id, key)?;
    println!("✅ Stored API key for {}", backend.display_name);
    Ok(())
}

pub fn deauth(backend_id: &str) -> Result<(), Box<dyn Error>> {
    let backend = lookup(backend_id)?;
    if keyring_remove(&backend.id)? {
        println!("✅ Removed API key for {}", backend.display_name);
    } else {
        println!("No stored API key for {}", backend.display_name);
    }
    Ok(())
}
