//! Core domain + application logic for the chat archivist.
//!
//! This crate is intentionally framework-agnostic. The Telegram Bot API lives
//! behind ports (traits) implemented in adapter crates.

pub mod archive;
pub mod command;
pub mod config;
pub mod dispatch;
pub mod domain;
pub mod engine;
pub mod errors;
pub mod logging;
pub mod messaging;
pub mod updates;

#[cfg(test)]
pub(crate) mod testing;

pub use errors::{Error, Result};
