//! Queue items, their lifecycle and the snapshot a consumer reads.

use std::fmt;
use std::path::PathBuf;

use crate::error::{Error, ErrorKind};
use crate::links::{InputLink, PinReference};
use crate::media::MediaDescriptor;
use crate::queue::events::QueueEvent;

/// Identifier of an item within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(pub u64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle state of a queue item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemState {
    /// Waiting to be processed.
    Queued,
    /// Profile pages are being collected into child items.
    Expanding,
    /// Looking up the media behind a pin.
    Resolving,
    /// Media is being written to disk.
    Downloading,
    Completed,
    Failed,
}

impl ItemState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Expanding => "expanding",
            Self::Resolving => "resolving",
            Self::Downloading => "downloading",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Whether `next` may follow `self`.
    pub fn can_transition_to(&self, next: ItemState) -> bool {
        use ItemState::*;
        matches!(
            (self, next),
            (Queued, Expanding | Resolving | Failed)
                | (Expanding, Completed | Failed)
                | (Resolving, Downloading | Failed)
                | (Downloading, Completed | Failed)
        )
    }
}

impl fmt::Display for ItemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why an item failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemError {
    pub kind: ErrorKind,
    pub reason: String,
}

impl ItemError {
    pub fn new(kind: ErrorKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
        }
    }

    pub fn cancelled() -> Self {
        Self::new(ErrorKind::Cancelled, "cancelled before it started")
    }
}

impl From<&Error> for ItemError {
    fn from(e: &Error) -> Self {
        Self::new(e.kind(), e.to_string())
    }
}

impl fmt::Display for ItemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.reason)
    }
}

/// One unit of work, tracked from input to file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadItem {
    pub id: ItemId,
    pub link: InputLink,
    /// The profile item this pin was discovered under.
    pub parent: Option<ItemId>,
    pub pin: Option<PinReference>,
    pub descriptor: Option<MediaDescriptor>,
    pub state: ItemState,
    pub error: Option<ItemError>,
    /// Final file, once saved.
    pub path: Option<PathBuf>,
    pub bytes: u64,
    pub total: Option<u64>,
}

impl DownloadItem {
    pub fn new(id: ItemId, link: InputLink, parent: Option<ItemId>, pin: Option<PinReference>) -> Self {
        Self {
            id,
            link,
            parent,
            pin,
            descriptor: None,
            state: ItemState::Queued,
            error: None,
            path: None,
            bytes: 0,
            total: None,
        }
    }

    /// Short label for display: the pin id when known, else the input.
    pub fn label(&self) -> String {
        match &self.pin {
            Some(pin) => pin.to_string(),
            None => self.link.raw.clone(),
        }
    }
}

/// Ordered view of every item in a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueSnapshot {
    pub items: Vec<DownloadItem>,
}

impl QueueSnapshot {
    pub fn get(&self, id: ItemId) -> Option<&DownloadItem> {
        self.items.iter().find(|item| item.id == id)
    }

    fn get_mut(&mut self, id: ItemId) -> Option<&mut DownloadItem> {
        self.items.iter_mut().find(|item| item.id == id)
    }

    /// Display position of an item.
    pub fn position(&self, id: ItemId) -> Option<usize> {
        self.items.iter().position(|item| item.id == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items in a given state, in queue order.
    pub fn in_state(&self, state: ItemState) -> impl Iterator<Item = &DownloadItem> {
        self.items.iter().filter(move |item| item.state == state)
    }

    /// Fold one event into the snapshot.
    ///
    /// Consumers that keep their own copy replay the event stream through
    /// this to stay identical to the worker's view.
    pub fn apply(&mut self, event: &QueueEvent) {
        match event {
            QueueEvent::ItemAdded { item, position } => {
                let at = (*position).min(self.items.len());
                self.items.insert(at, item.clone());
            }
            QueueEvent::StateChanged { item_id, to, error, .. } => {
                if let Some(item) = self.get_mut(*item_id) {
                    item.state = *to;
                    if error.is_some() {
                        item.error = error.clone();
                    }
                }
            }
            QueueEvent::Resolved {
                item_id,
                pin,
                descriptor,
            } => {
                if let Some(item) = self.get_mut(*item_id) {
                    item.pin = Some(pin.clone());
                    if descriptor.is_some() {
                        item.descriptor = descriptor.clone();
                    }
                }
            }
            QueueEvent::Progress {
                item_id,
                bytes,
                total,
            } => {
                if let Some(item) = self.get_mut(*item_id) {
                    item.bytes = *bytes;
                    item.total = *total;
                }
            }
            QueueEvent::Saved {
                item_id,
                path,
                bytes,
            } => {
                if let Some(item) = self.get_mut(*item_id) {
                    item.path = Some(path.clone());
                    item.bytes = *bytes;
                }
            }
            QueueEvent::Finished(_) => {}
        }
    }
}
