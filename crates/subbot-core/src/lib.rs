//! Core of the multi-tenant media bot.
//!
//! This crate is framework-agnostic. Telegram and the media extraction tools
//! live behind ports (traits) implemented in adapter crates.

pub mod choice;
pub mod config;
pub mod domain;
pub mod errors;
pub mod formatting;
pub mod logging;
pub mod media;
pub mod messaging;
pub mod ports;
pub mod registry;
pub mod session;

pub use errors::{Error, Result};
