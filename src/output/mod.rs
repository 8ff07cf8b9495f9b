//! Output module for console output and progress.
//!
//! Provides:
//! - Colored console output
//! - Progress bars fed by queue events
//! - Run summary reporting

pub mod console;
pub mod progress;
pub mod stats;

pub use console::{
    print_banner, print_error, print_info, print_run_summary, print_success, print_warning,
};
pub use progress::{create_download_bar, create_item_bar, ProgressView};
pub use stats::{print_failures, print_summary};
