pub mod animator;
pub mod backend;
pub mod builtin_backends;
pub mod config;
pub mod conversation;
pub mod credentials;
pub mod i18n;
pub mod notice;
pub mod retry;
pub mod session;
pub mod speech;
pub mod store;
