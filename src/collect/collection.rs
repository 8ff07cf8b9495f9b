//! Profile Collector: turns a profile link into a bounded, deduplicated
//! sequence of pin references.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use futures::stream::{self, Stream};

use crate::api::PinterestApi;
use crate::collect::source::{Cursor, PageSource, PinterestProfileSource};
use crate::config::CollectorConfig;
use crate::error::{Error, Result};
use crate::links::{InputLink, PinReference};

/// Why a collection ended. None of these is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Upstream said there are no more pages.
    Exhausted,
    /// A page brought no pin that was not already seen.
    NoNewPins,
    /// The next cursor was one already followed.
    CursorCycle,
    /// The configured page budget was used up.
    PageLimit,
    /// The configured pin budget was reached.
    PinLimit,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Exhausted => write!(f, "no more pages"),
            StopReason::NoNewPins => write!(f, "page had no new pins"),
            StopReason::CursorCycle => write!(f, "pagination cursor repeated"),
            StopReason::PageLimit => write!(f, "page limit reached"),
            StopReason::PinLimit => write!(f, "pin limit reached"),
        }
    }
}

/// Result of advancing a collection by one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectStep {
    /// New pins, in listing order. Never empty.
    Pins(Vec<PinReference>),
    /// The collection is over; further calls keep returning this.
    Finished(StopReason),
}

/// One pagination run over a page source.
///
/// Owns the cursor and the seen-id set; both die with the collection, so a
/// new collection always starts from the first page.
pub struct ProfileCollection<S> {
    source: S,
    cursor: Option<Cursor>,
    seen_ids: HashSet<String>,
    seen_cursors: HashSet<Cursor>,
    pages_fetched: u32,
    yielded: usize,
    max_pages: u32,
    max_pins: usize,
    finished: Option<StopReason>,
}

impl<S: PageSource> ProfileCollection<S> {
    pub fn new(source: S, config: &CollectorConfig) -> Self {
        Self {
            source,
            cursor: None,
            seen_ids: HashSet::new(),
            seen_cursors: HashSet::new(),
            pages_fetched: 0,
            yielded: 0,
            max_pages: config.max_pages.max(1),
            max_pins: config.max_pins,
            finished: None,
        }
    }

    pub fn pages_fetched(&self) -> u32 {
        self.pages_fetched
    }

    /// Number of distinct pins handed out so far.
    pub fn yielded(&self) -> usize {
        self.yielded
    }

    /// Fetch the next page and return the pins it adds.
    ///
    /// A fetch error ends the collection: the error is returned once and
    /// later calls report [`StopReason::Exhausted`].
    pub async fn next_page(&mut self) -> Result<CollectStep> {
        loop {
            if let Some(reason) = self.finished {
                return Ok(CollectStep::Finished(reason));
            }
            if self.pages_fetched >= self.max_pages {
                self.finished = Some(StopReason::PageLimit);
                continue;
            }

            let page = match self.source.fetch_page(self.cursor.as_ref()).await {
                Ok(page) => page,
                Err(e) => {
                    self.finished = Some(StopReason::Exhausted);
                    return Err(e);
                }
            };
            self.pages_fetched += 1;

            let listed = page.pins.len();
            let mut fresh: Vec<PinReference> = page
                .pins
                .into_iter()
                .filter(|pin| self.seen_ids.insert(pin.id.clone()))
                .collect();
            let had_new = !fresh.is_empty();

            if self.max_pins > 0 {
                fresh.truncate(self.max_pins.saturating_sub(self.yielded));
            }
            self.yielded += fresh.len();

            self.finished = if self.max_pins > 0 && self.yielded >= self.max_pins {
                Some(StopReason::PinLimit)
            } else {
                match page.next {
                    None => Some(StopReason::Exhausted),
                    Some(_) if !had_new => Some(StopReason::NoNewPins),
                    Some(next) if !self.seen_cursors.insert(next.clone()) => {
                        Some(StopReason::CursorCycle)
                    }
                    Some(next) => {
                        self.cursor = Some(next);
                        None
                    }
                }
            };

            tracing::debug!(
                page = self.pages_fetched,
                listed,
                new = fresh.len(),
                "Fetched listing page"
            );

            if !fresh.is_empty() {
                return Ok(CollectStep::Pins(fresh));
            }
        }
    }

    /// Flatten the collection into a stream of pins.
    ///
    /// The stream ends after the last pin, or after yielding a fetch error.
    pub fn into_stream(self) -> impl Stream<Item = Result<PinReference>> {
        stream::unfold(
            (self, Vec::<PinReference>::new().into_iter(), false),
            |(mut collection, mut buffered, failed)| async move {
                if failed {
                    return None;
                }
                loop {
                    if let Some(pin) = buffered.next() {
                        return Some((Ok(pin), (collection, buffered, false)));
                    }
                    match collection.next_page().await {
                        Ok(CollectStep::Pins(pins)) => buffered = pins.into_iter(),
                        Ok(CollectStep::Finished(_)) => return None,
                        Err(e) => return Some((Err(e), (collection, buffered, true))),
                    }
                }
            },
        )
    }
}

/// Starts profile collections against pinterest.com.
pub struct ProfileCollector {
    api: Arc<PinterestApi>,
    config: CollectorConfig,
}

impl ProfileCollector {
    pub fn new(api: Arc<PinterestApi>, config: CollectorConfig) -> Self {
        Self { api, config }
    }

    /// Begin a fresh collection for a profile link.
    pub fn collect(&self, link: &InputLink) -> Result<ProfileCollection<PinterestProfileSource>> {
        let username = link
            .username()
            .ok_or_else(|| Error::InvalidLink(link.raw.clone()))?;
        tracing::debug!("Collecting pins of profile {}", username);

        let source = PinterestProfileSource::new(Arc::clone(&self.api), username);
        Ok(ProfileCollection::new(source, &self.config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collect::source::Page;
    use crate::error::ErrorKind;
    use async_trait::async_trait;
    use futures::StreamExt;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Scripted listing: cursor -> (pin ids, next cursor).
    struct ScriptedSource {
        pages: HashMap<Option<String>, (Vec<&'static str>, Option<&'static str>)>,
        calls: AtomicU32,
    }

    impl ScriptedSource {
        fn new(pages: Vec<(Option<&'static str>, Vec<&'static str>, Option<&'static str>)>) -> Self {
            Self {
                pages: pages
                    .into_iter()
                    .map(|(cursor, ids, next)| (cursor.map(str::to_string), (ids, next)))
                    .collect(),
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl PageSource for ScriptedSource {
        async fn fetch_page(&self, cursor: Option<&Cursor>) -> Result<Page> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let key = cursor.map(|c| c.as_str().to_string());
            let (ids, next) = self
                .pages
                .get(&key)
                .cloned()
                .ok_or_else(|| Error::HttpStatus {
                    url: format!("page {:?}", key),
                    status: 404,
                })?;
            Ok(Page {
                pins: ids.into_iter().map(PinReference::from_id).collect(),
                next: Cursor::from_bookmark(next),
            })
        }
    }

    fn config(max_pages: u32, max_pins: usize) -> CollectorConfig {
        CollectorConfig { max_pages, max_pins }
    }

    async fn drain<S: PageSource>(collection: &mut ProfileCollection<S>) -> (Vec<String>, StopReason) {
        let mut ids = Vec::new();
        loop {
            match collection.next_page().await.unwrap() {
                CollectStep::Pins(pins) => ids.extend(pins.into_iter().map(|p| p.id)),
                CollectStep::Finished(reason) => return (ids, reason),
            }
        }
    }

    #[tokio::test]
    async fn test_duplicates_across_pages_are_dropped() {
        let source = ScriptedSource::new(vec![
            (None, vec!["A", "A"], Some("p2")),
            (Some("p2"), vec!["A", "B"], None),
        ]);
        let mut collection = ProfileCollection::new(source, &config(50, 0));
        let (ids, reason) = drain(&mut collection).await;
        assert_eq!(ids, vec!["A", "B"]);
        assert_eq!(reason, StopReason::Exhausted);
        assert_eq!(collection.pages_fetched(), 2);
    }

    #[tokio::test]
    async fn test_cycling_cursor_terminates() {
        let source = ScriptedSource::new(vec![
            (None, vec!["1"], Some("a")),
            (Some("a"), vec!["2"], Some("b")),
            (Some("b"), vec!["3"], Some("a")),
        ]);
        let mut collection = ProfileCollection::new(source, &config(50, 0));
        let (ids, reason) = drain(&mut collection).await;
        assert_eq!(ids, vec!["1", "2", "3"]);
        assert_eq!(reason, StopReason::CursorCycle);
    }

    #[tokio::test]
    async fn test_cycle_with_fresh_ids_still_respects_page_limit() {
        // Never repeats an id or a cursor; only the page budget stops it.
        struct Endless(AtomicU32);

        #[async_trait]
        impl PageSource for Endless {
            async fn fetch_page(&self, _cursor: Option<&Cursor>) -> Result<Page> {
                let n = self.0.fetch_add(1, Ordering::SeqCst);
                Ok(Page {
                    pins: vec![PinReference::from_id(n.to_string())],
                    next: Cursor::from_bookmark(Some(format!("c{}", n).as_str())),
                })
            }
        }

        let mut collection = ProfileCollection::new(Endless(AtomicU32::new(0)), &config(3, 0));
        let (ids, reason) = drain(&mut collection).await;
        assert_eq!(ids.len(), 3);
        assert_eq!(reason, StopReason::PageLimit);
        assert_eq!(collection.pages_fetched(), 3);
    }

    #[tokio::test]
    async fn test_page_without_new_pins_stops() {
        let source = ScriptedSource::new(vec![
            (None, vec!["1", "2"], Some("a")),
            (Some("a"), vec!["2", "1"], Some("b")),
            (Some("b"), vec!["3"], None),
        ]);
        let mut collection = ProfileCollection::new(source, &config(50, 0));
        let (ids, reason) = drain(&mut collection).await;
        assert_eq!(ids, vec!["1", "2"]);
        assert_eq!(reason, StopReason::NoNewPins);
    }

    #[tokio::test]
    async fn test_pin_limit() {
        let source = ScriptedSource::new(vec![
            (None, vec!["1", "2"], Some("a")),
            (Some("a"), vec!["3", "4"], None),
        ]);
        let mut collection = ProfileCollection::new(source, &config(50, 3));
        let (ids, reason) = drain(&mut collection).await;
        assert_eq!(ids, vec!["1", "2", "3"]);
        assert_eq!(reason, StopReason::PinLimit);
    }

    #[tokio::test]
    async fn test_fetch_error_is_surfaced_once() {
        let source = ScriptedSource::new(vec![(None, vec!["1"], Some("missing"))]);
        let mut collection = ProfileCollection::new(source, &config(50, 0));

        assert!(matches!(collection.next_page().await, Ok(CollectStep::Pins(_))));
        let err = collection.next_page().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NetworkError);
        assert!(matches!(
            collection.next_page().await,
            Ok(CollectStep::Finished(StopReason::Exhausted))
        ));
    }

    #[tokio::test]
    async fn test_stream_yields_in_listing_order() {
        let source = ScriptedSource::new(vec![
            (None, vec!["3", "1"], Some("a")),
            (Some("a"), vec!["2", "3"], None),
        ]);
        let stream = ProfileCollection::new(source, &config(50, 0)).into_stream();
        let ids: Vec<String> = stream.map(|r| r.unwrap().id).collect().await;
        assert_eq!(ids, vec!["3", "1", "2"]);
    }

    #[test]
    fn test_stream_ends_after_error() {
        let source = ScriptedSource::new(vec![(None, vec!["1"], Some("missing"))]);
        let results: Vec<Result<PinReference>> = tokio_test::block_on(
            ProfileCollection::new(source, &config(50, 0))
                .into_stream()
                .collect(),
        );
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
    }

    #[test]
    fn test_collect_rejects_non_profile_links() {
        let api = Arc::new(PinterestApi::new(&Default::default()).unwrap());
        let collector = ProfileCollector::new(api, CollectorConfig::default());
        let pin = crate::links::classify("https://www.pinterest.com/pin/1/").unwrap();
        assert!(collector.collect(&pin).is_err());

        let profile = crate::links::classify("https://www.pinterest.com/artist/").unwrap();
        assert!(collector.collect(&profile).is_ok());
    }
}
