//! Download module.
//!
//! This module provides:
//! - Streaming media transfers with unique filenames
//! - Run statistics

pub mod engine;
pub mod state;

pub use engine::{DownloadEngine, DownloadOutcome, DownloadProgress};
pub use state::RunSummary;
