//! `tracing` subscriber setup for the binary.
//!
//! The filter comes from `DUOCHAT_LOG` (same syntax as `RUST_LOG`); without
//! it the server logs at `info` and client commands at `warn`. With a log file
//! all output is appended there without ANSI colors.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "DUOCHAT_LOG";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogProfile {
    Server,
    Client,
}

impl LogProfile {
    pub fn default_directive(self) -> &'static str {
        match self {
            LogProfile::Server => "info,tower_http=info",
            LogProfile::Client => "warn",
        }
    }
}

pub fn build_filter(profile: LogProfile, env_value: Option<&str>) -> EnvFilter {
    env_value
        .filter(|value| !value.trim().is_empty())
        .and_then(|value| EnvFilter::try_new(value).ok())
        .unwrap_or_else(|| EnvFilter::new(profile.default_directive()))
}

/// Opens `path` for appending, creating it when missing.
pub fn open_log_file(path: &Path) -> Result<File, Box<dyn std::error::Error>> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.flush()?;
    Ok(file)
}

/// Installs the global subscriber. Later calls are ignored.
pub fn init(profile: LogProfile, log_file: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let env_value = std::env::var(LOG_ENV).ok();
    let filter = build_filter(profile, env_value.as_deref());
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(profile == LogProfile::Server);

    let installed = match log_file {
        Some(path) => {
            let file = open_log_file(path)?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => builder.with_writer(std::io::stderr).try_init(),
    };
    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
    Ok(())
}
