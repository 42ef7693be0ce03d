//! duochat answers questions through DeepSeek or Groq and renders the
//! markdown + math replies in the terminal or as HTML.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns the backend adapters, retry policy, conversation store,
//!   typing animation, configuration and the chat session tying them together.
//! - [`server`] exposes the adapters as an HTTP proxy (`duochat serve`).
//! - [`ui`] parses answers into typed blocks and renders them for a terminal
//!   or an HTML page.
//! - [`api`] defines the proxy and vendor wire payloads.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`].

pub mod api;
pub mod cli;
pub mod core;
pub mod server;
pub mod ui;
pub mod utils;
