//! Filesystem module.
//!
//! Provides:
//! - Destination folder checks
//! - Filename sanitising and numbering

pub mod naming;
pub mod paths;

pub use naming::{base_name_from_title, numbered_filename, sanitize_filename, DEFAULT_BASE_NAME};
pub use paths::{ensure_dir, validate_destination};
