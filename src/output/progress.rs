//! Progress bars driven by queue events.

use indicatif::{HumanBytes, MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::error::ErrorKind;
use crate::queue::{ItemState, QueueEvent, QueueSnapshot};

/// Create a progress bar for downloads.
pub fn create_download_bar(total: u64) -> ProgressBar {
    let bar = ProgressBar::new(total);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
            .unwrap()
            .progress_chars("#>-"),
    );
    bar
}

/// Create a progress bar for item counts.
pub fn create_item_bar(total: u64) -> ProgressBar {
    let bar = ProgressBar::new(total);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} Items [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );
    bar
}

/// Terminal view of a queue run: an item counter plus a bar for the
/// transfer in progress.
pub struct ProgressView {
    multi: MultiProgress,
    items: ProgressBar,
    transfer: Option<ProgressBar>,
}

impl ProgressView {
    pub fn new(quiet: bool) -> Self {
        let multi = if quiet {
            MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
        } else {
            MultiProgress::new()
        };
        let items = multi.add(create_item_bar(0));
        Self {
            multi,
            items,
            transfer: None,
        }
    }

    /// Update the bars for one event; `snapshot` already includes it.
    pub fn handle(&mut self, event: &QueueEvent, snapshot: &QueueSnapshot) {
        match event {
            QueueEvent::ItemAdded { .. } => self.items.set_length(snapshot.len() as u64),
            QueueEvent::StateChanged {
                item_id, to, error, ..
            } => {
                let Some(item) = snapshot.get(*item_id) else {
                    return;
                };
                match to {
                    ItemState::Expanding => {
                        self.items.set_message(format!("expanding {}", item.link.normalized))
                    }
                    ItemState::Resolving => self.items.set_message(format!("resolving {}", item.label())),
                    ItemState::Downloading => {
                        self.items.set_message(format!("downloading {}", item.label()))
                    }
                    ItemState::Completed => {
                        if let Some(path) = &item.path {
                            self.line(format!(
                                "{} {} ({})",
                                console::style("OK").green().bold(),
                                path.display(),
                                HumanBytes(item.bytes)
                            ));
                        }
                    }
                    ItemState::Failed => match error {
                        Some(error) if error.kind != ErrorKind::Cancelled => self.line(format!(
                            "{} {}: {}",
                            console::style("FAILED").red().bold(),
                            item.label(),
                            error
                        )),
                        _ => {}
                    },
                    ItemState::Queued => {}
                }
                if to.is_terminal() {
                    self.items.inc(1);
                    if let Some(bar) = self.transfer.take() {
                        bar.finish_and_clear();
                    }
                }
            }
            QueueEvent::Progress { bytes, total, .. } => {
                let bar = self
                    .transfer
                    .get_or_insert_with(|| self.multi.add(create_download_bar(0)));
                if let Some(total) = total {
                    bar.set_length(*total);
                }
                bar.set_position(*bytes);
            }
            QueueEvent::Resolved { .. } | QueueEvent::Saved { .. } => {}
            QueueEvent::Finished(_) => self.finish(),
        }
    }

    pub fn finish(&mut self) {
        if let Some(bar) = self.transfer.take() {
            bar.finish_and_clear();
        }
        self.items.finish_and_clear();
    }

    fn line(&self, message: String) {
        let _ = self.multi.println(message);
    }
}
