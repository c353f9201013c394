//! Core domain + application logic for the group-join application bot.
//!
//! This crate is intentionally framework-agnostic. Telegram lives behind
//! ports (traits) implemented in the adapter crate; the lifecycle manager,
//! record store, and notification fan-out only see those ports.

pub mod config;
pub mod domain;
pub mod errors;
pub mod fanout;
pub mod formatting;
pub mod lifecycle;
pub mod logging;
pub mod messaging;
pub mod ports;
pub mod store;

pub use errors::{Error, Result};
