//! Request orchestration.

pub mod pipeline;

// Re-export the main types for convenience
pub use pipeline::{Pipeline, RunState, StageTracker};
