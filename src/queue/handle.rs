//! Starting a queue run and talking to it while it works.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::api::PinterestApi;
use crate::collect::ProfileCollector;
use crate::config::Config;
use crate::download::DownloadEngine;
use crate::error::{Error, Result};
use crate::fs::validate_destination;
use crate::queue::events::QueueEvent;
use crate::queue::item::QueueSnapshot;
use crate::queue::worker::QueueWorker;
use crate::resolve::PinResolver;

/// Cooperative stop signal shared between a run and its callers.
///
/// The worker checks it before each item and after each profile page; an
/// in-flight request or transfer is never interrupted.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A running queue: its event stream, its stop signal and its result.
pub struct QueueHandle {
    events: mpsc::UnboundedReceiver<QueueEvent>,
    cancel: CancelToken,
    task: JoinHandle<QueueSnapshot>,
}

impl QueueHandle {
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Ask the run to stop after its current operation.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Next event, or `None` once the worker is done and the stream drained.
    pub async fn next_event(&mut self) -> Option<QueueEvent> {
        self.events.recv().await
    }

    /// Wait for the worker and return the final snapshot.
    pub async fn join(self) -> Result<QueueSnapshot> {
        self.task
            .await
            .map_err(|e| Error::Download(format!("queue worker stopped unexpectedly: {}", e)))
    }
}

/// Builds workers from configuration and starts runs.
pub struct QueueOrchestrator {
    api: Arc<PinterestApi>,
    config: Config,
}

impl QueueOrchestrator {
    pub fn from_config(config: &Config) -> Result<Self> {
        let api = PinterestApi::new(&config.network)?;
        Ok(Self {
            api: Arc::new(api),
            config: config.clone(),
        })
    }

    /// Use a preconfigured client, e.g. one pointed at other endpoints.
    pub fn with_api(mut self, api: Arc<PinterestApi>) -> Self {
        self.api = api;
        self
    }

    pub fn api(&self) -> &Arc<PinterestApi> {
        &self.api
    }

    /// Start processing `inputs` into `destination` on a background task.
    ///
    /// The destination must already exist and be writable.
    pub fn start(&self, inputs: Vec<String>, destination: &Path) -> Result<QueueHandle> {
        validate_destination(destination)?;

        let (sender, events) = mpsc::unbounded_channel();
        let cancel = CancelToken::new();
        let worker = QueueWorker::new(
            PinResolver::new(Arc::clone(&self.api), self.config.resolver.clone()),
            ProfileCollector::new(Arc::clone(&self.api), self.config.collector.clone()),
            DownloadEngine::new(Arc::clone(&self.api), self.config.download.progress_interval()),
            destination.to_path_buf(),
            cancel.clone(),
            sender,
        );

        tracing::debug!(
            "Starting queue run of {} input(s) into {}",
            inputs.len(),
            destination.display()
        );
        let task = tokio::spawn(worker.run(inputs));

        Ok(QueueHandle {
            events,
            cancel,
            task,
        })
    }
}
