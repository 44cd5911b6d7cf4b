//! Small shared helpers.

pub mod retry;

pub use retry::{ALIGNER_ATTEMPTS, ALIGNER_BACKOFF_STEP, retry_linear};
