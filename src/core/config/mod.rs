pub mod data;
pub mod io;
pub mod printing;

pub use data::{path_display, BackendOverride, Config, RetryConfig, SpeechConfig, TypingConfig};
pub use io::ConfigError;

#[cfg(test)]
mod tests;
