//! The background worker that drives one queue run.

use std::collections::HashSet;
use std::path::PathBuf;

use chrono::Utc;
use tokio::sync::mpsc;

use crate::collect::{CollectStep, ProfileCollector};
use crate::download::{DownloadEngine, RunSummary};
use crate::error::{Error, ErrorKind};
use crate::links::{classify, InputLink, LinkKind, PinReference};
use crate::queue::events::QueueEvent;
use crate::queue::handle::CancelToken;
use crate::queue::item::{DownloadItem, ItemError, ItemId, ItemState, QueueSnapshot};
use crate::resolve::PinResolver;

/// Owns the queue for one run and processes it item by item.
///
/// Every change goes through [`QueueWorker::emit`], which updates the
/// worker's own snapshot and then forwards the event to the consumer.
pub struct QueueWorker {
    resolver: PinResolver,
    collector: ProfileCollector,
    engine: DownloadEngine,
    destination: PathBuf,
    cancel: CancelToken,
    events: mpsc::UnboundedSender<QueueEvent>,
    snapshot: QueueSnapshot,
    summary: RunSummary,
    /// Pin ids already in the queue this run.
    queued_pins: HashSet<String>,
    next_id: u64,
}

impl QueueWorker {
    pub fn new(
        resolver: PinResolver,
        collector: ProfileCollector,
        engine: DownloadEngine,
        destination: PathBuf,
        cancel: CancelToken,
        events: mpsc::UnboundedSender<QueueEvent>,
    ) -> Self {
        Self {
            resolver,
            collector,
            engine,
            destination,
            cancel,
            events,
            snapshot: QueueSnapshot::default(),
            summary: RunSummary::default(),
            queued_pins: HashSet::new(),
            next_id: 1,
        }
    }

    /// Process `inputs` in order and return the final snapshot.
    pub async fn run(mut self, inputs: Vec<String>) -> QueueSnapshot {
        let mut runnable = Vec::with_capacity(inputs.len());

        for raw in inputs {
            match classify(&raw) {
                Ok(link) => {
                    if let Some(id) = link.pin_id() {
                        self.queued_pins.insert(id.to_string());
                    }
                    let at = self.snapshot.len();
                    runnable.push(self.add_item(link, None, None, at));
                }
                Err(e) => {
                    let at = self.snapshot.len();
                    let id = self.add_item(InputLink::invalid(&raw), None, None, at);
                    self.fail(id, &e);
                }
            }
        }

        for id in runnable {
            if self.cancel.is_cancelled() {
                tracing::info!("Run cancelled, skipping remaining items");
                break;
            }
            let kind = self.snapshot.get(id).map(|item| item.link.kind);
            match kind {
                Some(LinkKind::Profile) => self.process_profile(id).await,
                Some(_) => self.process_pin(id).await,
                None => {}
            }
        }

        self.cancel_remaining();
        let summary = self.summary.clone();
        self.emit(QueueEvent::Finished(summary));
        self.snapshot
    }

    fn add_item(
        &mut self,
        link: InputLink,
        parent: Option<ItemId>,
        pin: Option<PinReference>,
        position: usize,
    ) -> ItemId {
        let id = ItemId(self.next_id);
        self.next_id += 1;
        let item = DownloadItem::new(id, link, parent, pin);
        self.emit(QueueEvent::ItemAdded { item, position });
        id
    }

    /// Expand a profile, processing each page's new pins before the next page.
    async fn process_profile(&mut self, id: ItemId) {
        let Some(link) = self.snapshot.get(id).map(|item| item.link.clone()) else {
            return;
        };
        self.transition(id, ItemState::Expanding, None);

        let mut collection = match self.collector.collect(&link) {
            Ok(collection) => collection,
            Err(e) => return self.fail(id, &e),
        };
        let mut insert_at = self
            .snapshot
            .position(id)
            .map_or(self.snapshot.len(), |p| p + 1);
        let mut added: u64 = 0;

        let outcome = loop {
            let pins = match collection.next_page().await {
                Ok(CollectStep::Pins(pins)) => pins,
                Ok(CollectStep::Finished(reason)) => {
                    tracing::debug!("Profile {} finished: {}", link.normalized, reason);
                    break Ok(());
                }
                Err(e) => break Err(ItemError::from(&e)),
            };

            let mut children = Vec::with_capacity(pins.len());
            for pin in pins {
                if !self.queued_pins.insert(pin.id.clone()) {
                    tracing::debug!("{} already queued, not adding it again", pin);
                    continue;
                }
                let child = self.add_item(pin.to_link(), Some(id), Some(pin), insert_at);
                insert_at += 1;
                added += 1;
                children.push(child);
            }

            for child in children {
                if self.cancel.is_cancelled() {
                    break;
                }
                self.process_pin(child).await;
            }

            if self.cancel.is_cancelled() {
                break Err(ItemError::new(
                    ErrorKind::Cancelled,
                    "cancelled during profile expansion",
                ));
            }
        };

        self.summary.record_profile(added);
        tracing::info!(
            "Profile {} listed {} pin(s) over {} page(s)",
            link.normalized,
            collection.yielded(),
            collection.pages_fetched()
        );

        match outcome {
            Ok(()) if collection.yielded() == 0 => self.fail_with(
                id,
                ItemError::new(ErrorKind::ResolutionFailed, "no public pins found"),
            ),
            Ok(()) => self.transition(id, ItemState::Completed, None),
            Err(error) => self.fail_with(id, error),
        }
    }

    /// Resolve and download one pin item.
    async fn process_pin(&mut self, id: ItemId) {
        let Some((link, known)) = self
            .snapshot
            .get(id)
            .map(|item| (item.link.clone(), item.pin.clone()))
        else {
            return;
        };
        self.transition(id, ItemState::Resolving, None);

        let pin = match known {
            Some(pin) => pin,
            None => match self.resolver.reference_for(&link).await {
                Ok(pin) => {
                    self.queued_pins.insert(pin.id.clone());
                    self.emit(QueueEvent::Resolved {
                        item_id: id,
                        pin: pin.clone(),
                        descriptor: None,
                    });
                    pin
                }
                Err(e) => return self.fail(id, &e),
            },
        };

        let descriptor = match self.resolver.resolve(&pin).await {
            Ok(descriptor) => descriptor,
            Err(e) => return self.fail(id, &e),
        };
        self.emit(QueueEvent::Resolved {
            item_id: id,
            pin: pin.clone(),
            descriptor: Some(descriptor.clone()),
        });
        self.transition(id, ItemState::Downloading, None);

        // Progress goes straight to the consumer; the last one is folded into
        // the worker's snapshot afterwards so both views stay identical.
        let events = self.events.clone();
        let mut last_progress = None;
        let result = self
            .engine
            .download(&descriptor, &self.destination, |progress| {
                last_progress = Some(progress);
                let _ = events.send(QueueEvent::Progress {
                    item_id: id,
                    bytes: progress.bytes,
                    total: progress.total,
                });
            })
            .await;
        if let Some(progress) = last_progress {
            self.snapshot.apply(&QueueEvent::Progress {
                item_id: id,
                bytes: progress.bytes,
                total: progress.total,
            });
        }

        match result {
            Ok(outcome) => {
                tracing::info!(
                    "Saved {} ({} bytes) for {}",
                    outcome.path.display(),
                    outcome.bytes,
                    pin
                );
                self.summary.record_download(descriptor.kind, outcome.bytes);
                self.emit(QueueEvent::Saved {
                    item_id: id,
                    path: outcome.path,
                    bytes: outcome.bytes,
                });
                self.transition(id, ItemState::Completed, None);
            }
            Err(e) => self.fail(id, &e),
        }
    }

    /// Fail every item that never started.
    fn cancel_remaining(&mut self) {
        let pending: Vec<ItemId> = self
            .snapshot
            .in_state(ItemState::Queued)
            .map(|item| item.id)
            .collect();
        for id in pending {
            self.fail_with(id, ItemError::cancelled());
        }
    }

    fn fail(&mut self, id: ItemId, error: &Error) {
        self.fail_with(id, ItemError::from(error));
    }

    fn fail_with(&mut self, id: ItemId, error: ItemError) {
        if error.kind == ErrorKind::Cancelled {
            tracing::debug!("Item {} cancelled", id);
        } else {
            let label = self.snapshot.get(id).map(DownloadItem::label).unwrap_or_default();
            tracing::warn!("Item {} ({}) failed: {}", id, label, error);
        }
        self.summary.record_failure(error.kind);
        self.transition(id, ItemState::Failed, Some(error));
    }

    /// Move an item to `to`, refusing steps the state machine does not allow.
    fn transition(&mut self, id: ItemId, to: ItemState, error: Option<ItemError>) {
        let Some(from) = self.snapshot.get(id).map(|item| item.state) else {
            return;
        };
        if !from.can_transition_to(to) {
            tracing::warn!("Ignoring transition of item {} from {} to {}", id, from, to);
            return;
        }
        self.emit(QueueEvent::StateChanged {
            item_id: id,
            from,
            to,
            timestamp: Utc::now(),
            error,
        });
    }

    fn emit(&mut self, event: QueueEvent) {
        self.snapshot.apply(&event);
        // A dropped receiver only means nobody is watching.
        let _ = self.events.send(event);
    }
}
