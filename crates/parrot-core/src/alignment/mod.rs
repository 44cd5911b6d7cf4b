//! Word-to-chunk alignment and chunk boundary derivation.
//!
//! Both steps are synchronous, pure and reentrant; they hold no shared state
//! and can run on any thread.

pub mod boundaries;
pub mod engine;

pub use boundaries::{BoundaryReport, LEAD_IN_SECONDS, estimate_timestamps, recalculate_boundaries};
pub use engine::{AlignmentOutcome, AlignmentStats, LOOKAHEAD, align_words, normalize_token};
