//! Queue Orchestrator.
//!
//! One background worker owns the queue for a run:
//! - [`QueueOrchestrator`] builds the worker and starts it
//! - [`QueueHandle`] receives [`QueueEvent`]s and can cancel the run
//! - [`QueueSnapshot`] is the ordered item list, rebuilt from events

pub mod events;
pub mod handle;
pub mod item;
pub mod worker;

pub use events::QueueEvent;
pub use handle::{CancelToken, QueueHandle, QueueOrchestrator};
pub use item::{DownloadItem, ItemError, ItemId, ItemState, QueueSnapshot};
pub use worker::QueueWorker;
