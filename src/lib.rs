//! Pinterest Downloader - original-quality media from Pinterest links.
//!
//! This library provides functionality for downloading the media behind
//! Pinterest pin and profile links.
//!
//! # Features
//!
//! - Pin, short-link and profile link classification
//! - Media resolution through an ordered chain of extraction strategies
//! - Cursor-paginated profile expansion with per-run deduplication
//! - Streaming downloads with unique filenames and no partial files
//! - A background queue with an event stream and cooperative cancellation
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use pinterest_downloader::{Config, QueueEvent, QueueOrchestrator};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load(Path::new("pinterest-downloader.toml"))?;
//!     let orchestrator = QueueOrchestrator::from_config(&config)?;
//!     let mut handle = orchestrator.start(
//!         vec!["https://www.pinterest.com/pin/123/".into()],
//!         Path::new("downloads"),
//!     )?;
//!
//!     while let Some(event) = handle.next_event().await {
//!         if let QueueEvent::Finished(summary) = event {
//!             println!("{} file(s) saved", summary.completed());
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cli;
pub mod collect;
pub mod config;
pub mod download;
pub mod error;
pub mod fs;
pub mod links;
pub mod media;
pub mod output;
pub mod queue;
pub mod resolve;

// Re-exports for convenience
pub use api::PinterestApi;
pub use collect::{ProfileCollection, ProfileCollector};
pub use config::Config;
pub use download::{DownloadEngine, RunSummary};
pub use error::{Error, ErrorKind, Result};
pub use links::{classify, InputLink, LinkKind, PinReference};
pub use media::{MediaDescriptor, MediaKind};
pub use queue::{CancelToken, QueueEvent, QueueHandle, QueueOrchestrator, QueueSnapshot};
pub use resolve::PinResolver;
