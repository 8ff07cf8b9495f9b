//! Events pushed from the queue worker to its consumer.

use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::download::RunSummary;
use crate::links::PinReference;
use crate::media::MediaDescriptor;
use crate::queue::item::{DownloadItem, ItemError, ItemId, ItemState};

/// A change to the queue, in the order the worker made it.
#[derive(Debug, Clone, PartialEq)]
pub enum QueueEvent {
    /// A new item at `position` in the queue; children of a profile are
    /// inserted right after the parent's already-discovered pins.
    ItemAdded { item: DownloadItem, position: usize },

    /// One state-machine step of one item.
    StateChanged {
        item_id: ItemId,
        from: ItemState,
        to: ItemState,
        timestamp: DateTime<Utc>,
        error: Option<ItemError>,
    },

    /// The pin behind an item became known, and later its media.
    Resolved {
        item_id: ItemId,
        pin: PinReference,
        descriptor: Option<MediaDescriptor>,
    },

    /// Bytes written for the item being downloaded.
    Progress {
        item_id: ItemId,
        bytes: u64,
        total: Option<u64>,
    },

    /// The file is complete on disk.
    Saved {
        item_id: ItemId,
        path: PathBuf,
        bytes: u64,
    },

    /// The run is over; nothing follows.
    Finished(RunSummary),
}
