//! Run statistics.

use crate::error::ErrorKind;
use crate::media::MediaKind;

/// Totals for one queue run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub images: u64,
    pub videos: u64,
    /// Items that failed for any reason other than cancellation.
    pub failed: u64,
    /// Failed items whose failures were all network errors.
    pub network_failed: u64,
    pub cancelled: u64,
    pub bytes: u64,
    pub profiles_expanded: u64,
    pub pins_discovered: u64,
}

impl RunSummary {
    /// Count a saved file.
    pub fn record_download(&mut self, kind: MediaKind, bytes: u64) {
        match kind {
            MediaKind::Image => self.images += 1,
            MediaKind::Video => self.videos += 1,
        }
        self.bytes += bytes;
    }

    /// Count a terminal failure.
    pub fn record_failure(&mut self, kind: ErrorKind) {
        match kind {
            ErrorKind::Cancelled => self.cancelled += 1,
            ErrorKind::NetworkError => {
                self.failed += 1;
                self.network_failed += 1;
            }
            _ => self.failed += 1,
        }
    }

    /// Count a profile whose expansion finished, with the pins it added.
    pub fn record_profile(&mut self, pins: u64) {
        self.profiles_expanded += 1;
        self.pins_discovered += pins;
    }

    /// Files saved.
    pub fn completed(&self) -> u64 {
        self.images + self.videos
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    /// True when something failed and every failure was a network error.
    pub fn only_network_failures(&self) -> bool {
        self.failed > 0 && self.failed == self.network_failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts() {
        let mut summary = RunSummary::default();
        summary.record_download(MediaKind::Image, 100);
        summary.record_download(MediaKind::Video, 50);
        summary.record_failure(ErrorKind::Cancelled);
        summary.record_profile(4);

        assert_eq!(summary.completed(), 2);
        assert_eq!(summary.bytes, 150);
        assert_eq!(summary.cancelled, 1);
        assert!(!summary.has_failures());
        assert_eq!(summary.pins_discovered, 4);
    }

    #[test]
    fn test_network_only_failures() {
        let mut summary = RunSummary::default();
        summary.record_failure(ErrorKind::NetworkError);
        assert!(summary.only_network_failures());

        summary.record_failure(ErrorKind::ResolutionFailed);
        assert!(!summary.only_network_failures());
        assert_eq!(summary.failed, 2);
    }
}
