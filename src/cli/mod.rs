//! Command-line workflow

pub mod orchestration;

pub use orchestration::{ReleaseRun, RunState, RunSummary, VERSION_COMMIT_MESSAGE};
