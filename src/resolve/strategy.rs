//! Extraction strategy trait and the context every strategy reads from.

use async_trait::async_trait;
use scraper::{Html, Selector};
use serde_json::Value;

use crate::api::{FetchedPage, PinterestApi};
use crate::config::ResolverConfig;
use crate::error::{Error, Result};
use crate::fs::base_name_from_title;
use crate::links::PinReference;
use crate::media::{normalize_candidate, CandidateSet, MediaDescriptor};

/// One way of finding a pin's media.
///
/// Strategies are tried in priority order until one yields a descriptor.
/// `Ok(None)` means "nothing usable here"; errors are logged and the next
/// strategy runs, except [`Error::Rejected`] which ends resolution.
#[async_trait]
pub trait ExtractionStrategy: Send + Sync {
    /// Strategy name for logging and for `MediaDescriptor::source`.
    fn name(&self) -> &'static str;

    async fn extract(&self, ctx: &PinContext<'_>) -> Result<Option<MediaDescriptor>>;
}

/// Everything known about a pin while it is being resolved.
pub struct PinContext<'a> {
    pub pin: &'a PinReference,
    /// The pin's public HTML page.
    pub page: &'a FetchedPage,
    /// Title taken from the page head, used when a strategy has no better one.
    pub page_title: Option<String>,
    pub api: &'a PinterestApi,
    pub config: &'a ResolverConfig,
}

impl<'a> PinContext<'a> {
    pub fn new(
        pin: &'a PinReference,
        page: &'a FetchedPage,
        api: &'a PinterestApi,
        config: &'a ResolverConfig,
    ) -> Self {
        Self {
            pin,
            page,
            page_title: page_title(&page.body),
            api,
            config,
        }
    }

    /// Apply the selection policy to `candidates` and build a descriptor.
    pub fn describe(
        &self,
        candidates: &CandidateSet,
        title: Option<&str>,
        source: &'static str,
    ) -> Option<MediaDescriptor> {
        let selection = candidates.select(self.config.quality)?;
        let title = title.or(self.page_title.as_deref());

        Some(MediaDescriptor {
            pin_id: self.pin.id.clone(),
            kind: selection.best.kind,
            url: selection.best.url,
            alternates: selection.alternates,
            inferred_original: selection.inferred_only,
            size_hint: None,
            width: selection.best.width,
            height: selection.best.height,
            base_name: base_name_from_title(title),
            source,
        })
    }
}

/// Parse a CSS selector, reporting failures as resolution errors.
pub(crate) fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| Error::Resolution(format!("bad selector {}: {}", css, e)))
}

/// Text content of every `<script>` matching `css`.
pub(crate) fn script_bodies(html: &str, css: &str) -> Result<Vec<String>> {
    let document = Html::parse_document(html);
    let selector = selector(css)?;
    Ok(document
        .select(&selector)
        .map(|el| el.text().collect::<String>())
        .filter(|text| !text.trim().is_empty())
        .collect())
}

/// Pin title from `og:title`, else `<title>`, without the site suffix.
fn page_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);

    let og = Selector::parse(r#"meta[property="og:title"], meta[name="og:title"]"#).ok()?;
    let from_meta = document
        .select(&og)
        .find_map(|el| el.value().attr("content").map(str::to_string));

    let title = from_meta.or_else(|| {
        let sel = Selector::parse("title").ok()?;
        document
            .select(&sel)
            .next()
            .map(|el| el.text().collect::<String>())
    })?;

    let title = title.trim();
    let title = title
        .strip_suffix("| Pinterest")
        .or_else(|| title.strip_suffix("- Pinterest"))
        .unwrap_or(title)
        .trim();
    if title.is_empty() || title.eq_ignore_ascii_case("pinterest") {
        None
    } else {
        Some(title.to_string())
    }
}

/// Collect every media-looking URL string in a JSON value.
///
/// The key a string was found under is passed on as a size hint, so `orig`
/// entries score as originals.
pub(crate) fn collect_json_urls(value: &Value, key_hint: &str, base: &url::Url, out: &mut CandidateSet) {
    match value {
        Value::Object(map) => {
            for (key, nested) in map {
                collect_json_urls(nested, key, base, out);
            }
        }
        Value::Array(items) => {
            for nested in items {
                collect_json_urls(nested, key_hint, base, out);
            }
        }
        Value::String(s) if s.contains("http") || s.contains("\\/") => {
            if let Some(url) = normalize_candidate(s, base) {
                out.push_url(&url, key_hint, None);
            }
        }
        _ => {}
    }
}
