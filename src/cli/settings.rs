//! `set` / `unset`.
//!
//! Display preferences (language, theme, dark mode) live with the
//! conversation store in `settings.json`; everything else is `config.toml`.

use std::error::Error;
use std::path::PathBuf;

use crate::cli::Context;
use crate::core::builtin_backends::find_builtin_backend;
use crate::core::config::{path_display, BackendOverride, Config};
use crate::core::conversation::{Language, Settings, ThemeChoice};

/// Which file a key lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingScope {
    Store,
    Config,
}

pub const STORE_KEYS: &[&str] = &["language", "theme", "dark-mode"];

pub fn scope_of(key: &str) -> SettingScope {
    if STORE_KEYS.contains(&key) {
        SettingScope::Store
    } else {
        SettingScope::Config
    }
}

fn parse_bool(value: &str) -> Result<bool, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Ok(true),
        "off" | "false" | "no" | "0" => Ok(false),
        other => Err(format!("Expected on or off, got '{other}'")),
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, String> {
    value
        .trim()
        .parse()
        .map_err(|_| format!("{key} expects a whole number, got '{value}'"))
}

pub fn apply_store_setting(settings: &mut Settings, key: &str, value: &str) -> Result<(), String> {
    match key {
        "language" => settings.language = Language::try_from(value)?,
        "theme" => settings.theme = ThemeChoice::try_from(value)?,
        "dark-mode" => settings.dark_mode = parse_bool(value)?,
        other => return Err(format!("Unknown config key: {other}")),
    }
    Ok(())
}

/// `<backend>.base-url`
fn base_url_key(key: &str) -> Option<&str> {
    key.strip_suffix(".base-url")
        .filter(|id| find_builtin_backend(id).is_some())
}

pub fn apply_config_setting(config: &mut Config, key: &str, value: &str) -> Result<(), String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(format!("A value is required for {key}"));
    }
    match key {
        "bind" => config.bind = Some(value.to_string()),
        "default-backend" => {
            let backend = find_builtin_backend(value)
                .ok_or_else(|| format!("Unknown backend '{value}' (expected deepseek or groq)"))?;
            config.default_backend = Some(backend.id);
        }
        "data-dir" => config.data_dir = Some(PathBuf::from(value)),
        "max-retries" => config.retry.max_retries = Some(parse_number(key, value)?),
        "retry-delay" => config.retry.delay_ms = Some(parse_number(key, value)?),
        "typing-interval" => {
            let interval: u64 = parse_number(key, value)?;
            if interval == 0 {
                return Err(format!("{key} must be at least 1 millisecond"));
            }
            config.typing.interval_ms = Some(interval);
        }
        "syntax" => config.syntax = Some(parse_bool(value)?),
        "speech-command" => config.speech.command = Some(value.to_string()),
        other => match base_url_key(other) {
            Some(id) => {
                config.backends.insert(
                    id.to_ascii_lowercase(),
                    BackendOverride {
                        base_url: Some(value.to_string()),
                    },
                );
            }
            None => return Err(format!("Unknown config key: {other}")),
        },
    }
    Ok(())
}

pub fn clear_config_setting(config: &mut Config, key: &str) -> Result<(), String> {
    match key {
        "bind" => config.bind = None,
        "default-backend" => config.default_backend = None,
        "data-dir" => config.data_dir = None,
        "max-retries" => config.retry.max_retries = None,
        "retry-delay" => config.retry.delay_ms = None,
        "typing-interval" => config.typing.interval_ms = None,
        "syntax" => config.syntax = None,
        "speech-command" => config.speech.command = None,
        other => match base_url_key(other) {
            Some(id) => {
                config
                    .backends
                    .retain(|backend, _| !backend.eq_ignore_ascii_case(id));
            }
            None => return Err(format!("Unknown config key: {other}")),
        },
    }
    Ok(())
}

fn print_store_settings(settings: &Settings) {
    println!("  language: {}", settings.language.as_str());
    println!("  theme: {}", settings.theme.as_str());
    println!(
        "  dark-mode: {}",
        if settings.dark_mode { "on" } else { "off" }
    );
    if let Some(current) = &settings.current_conversation {
        println!("  current-conversation: {current}");
    }
}

pub fn set(ctx: &mut Context, key: Option<&str>, value: Option<&str>) -> Result<(), Box<dyn Error>> {
    let (Some(key), Some(value)) = (key, value.filter(|v| !v.trim().is_empty())) else {
        ctx.config.print_all();
        let store = ctx.open_store()?;
        print_store_settings(store.settings());
        println!("Config file: {}", path_display(&ctx.config_path));
        println!("Data directory: {}", path_display(&ctx.data_dir));
        return Ok(());
    };

    match scope_of(key) {
        SettingScope::Store => {
            let mut store = ctx.open_store()?;
            let mut settings = store.settings().clone();
            apply_store_setting(&mut settings, key, value)?;
            store.update_settings(|current| *current = settings);
        }
        SettingScope::Config => {
            apply_config_setting(&mut ctx.config, key, value)?;
            ctx.config.save_to_path(&ctx.config_path)?;
        }
    }
    println!("✅ Set {key} to: {}", value.trim());
    Ok(())
}

pub fn unset(ctx: &mut Context, key: &str) -> Result<(), Box<dyn Error>> {
    match scope_of(key) {
        SettingScope::Store => {
            let mut store = ctx.open_store()?;
            let defaults = Settings::default();
            store.update_settings(|settings| match key {
                "language" => settings.language = defaults.language,
                "theme" => settings.theme = defaults.theme,
                _ => settings.dark_mode = defaults.dark_mode,
            });
        }
        SettingScope::Config => {
            clear_config_setting(&mut ctx.config, key)?;
            ctx.config.save_to_path(&ctx.config_path)?;
        }
    }
    println!("✅ Unset {key}");
    Ok(())
}
