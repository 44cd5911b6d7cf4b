//! Command handlers.
//!
//! Handlers follow one pattern:
//! - Signature: `pub async fn execute(ctx: &CliContext, ...) -> Result<T>`
//! - Parse/validate CLI-specific input, call the services, print the result
//! - Return what they printed so tests can check it
//!
//! Handlers should NOT access the database or engines except through
//! [`CliContext`](crate::bootstrap::CliContext).

pub mod cache;
pub mod generate;
pub mod materials;
pub mod play;
pub mod settings;
pub mod transfer;
