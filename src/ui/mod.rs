//! Presentation layer for answers.
//!
//! - [`markdown`]: line-oriented markdown + math parsing into typed blocks,
//!   with HTML and terminal renderings.
//! - [`theme`] and [`builtin_themes`]: the dark/blue/green palettes in dark
//!   and light mode.
//! - [`ansi`]: printing rendered lines to a plain terminal.

pub mod ansi;
pub mod builtin_themes;
pub mod markdown;
pub mod theme;
