//! Command-line adapter for parrot.
//!
//! `main.rs` parses arguments, calls [`bootstrap`] and dispatches to
//! [`handlers`]. Everything else is reachable from tests.

#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

#[cfg(test)]
use tempfile as _;

// Used by the binary only
use dotenvy as _;
use tracing_subscriber as _;

pub mod bootstrap;
pub mod commands;
pub mod content;
pub mod error;
pub mod handlers;
pub mod parser;
pub mod presentation;

// Re-export primary types for convenient access
pub use bootstrap::{CliConfig, CliContext, bootstrap};
pub use commands::{CacheCommand, Commands, SettingsArgs, SettingsCommand};
pub use error::{CliError, exit_code_for};
pub use parser::Cli;
