//! Strategies reading public page markup and the oEmbed endpoint.

use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use scraper::Html;
use serde_json::Value;
use url::Url;

use crate::error::Result;
use crate::links::canonical_pin_url;
use crate::media::{normalize_candidate, CandidateSet, MediaDescriptor};
use crate::resolve::strategy::{
    collect_json_urls, script_bodies, selector, ExtractionStrategy, PinContext,
};

const LD_JSON_SCRIPTS: &str = r#"script[type="application/ld+json"]"#;

const MEDIA_META_TAGS: &str = concat!(
    r#"meta[property="og:video"], meta[property="og:video:url"], "#,
    r#"meta[property="og:video:secure_url"], meta[property="og:image"], "#,
    r#"meta[name="og:image"], meta[name="twitter:image"], meta[name="twitter:image:src"]"#
);

/// pinimg URLs in raw markup, plain or with JSON-escaped slashes.
fn hosted_media_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"(?i)https?:\\/\\/(?:[a-z0-9-]+\.)?pinimg\.com[^"'<>\s)\]}]+|https?://(?:[a-z0-9-]+\.)?pinimg\.com[^"'<>\s)\]}]+"#,
        )
        .unwrap()
    })
}

/// schema.org JSON-LD blocks (`contentUrl`, `image`, `thumbnailUrl`, ...).
pub struct LdJsonStrategy;

#[async_trait]
impl ExtractionStrategy for LdJsonStrategy {
    fn name(&self) -> &'static str {
        "ld-json"
    }

    async fn extract(&self, ctx: &PinContext<'_>) -> Result<Option<MediaDescriptor>> {
        let mut candidates = CandidateSet::new();
        let mut title = None;

        for body in script_bodies(&ctx.page.body, LD_JSON_SCRIPTS)? {
            let Ok(value) = serde_json::from_str::<Value>(&body) else {
                continue;
            };
            if title.is_none() {
                title = value
                    .get("name")
                    .or_else(|| value.get("headline"))
                    .and_then(Value::as_str)
                    .map(str::to_string);
            }
            collect_json_urls(&value, "", &ctx.page.final_url, &mut candidates);
        }

        Ok(ctx.describe(&candidates, title.as_deref(), self.name()))
    }
}

/// `og:image`, `og:video` and `twitter:image` meta tags.
pub struct MetaTagStrategy;

impl MetaTagStrategy {
    fn candidates(html: &str, base: &Url) -> Result<CandidateSet> {
        let document = Html::parse_document(html);
        let tags = selector(MEDIA_META_TAGS)?;

        let mut candidates = CandidateSet::new();
        for element in document.select(&tags) {
            let Some(content) = element.value().attr("content") else {
                continue;
            };
            if let Some(url) = normalize_candidate(content, base) {
                candidates.push_url(&url, "meta", None);
            }
        }
        Ok(candidates)
    }
}

#[async_trait]
impl ExtractionStrategy for MetaTagStrategy {
    fn name(&self) -> &'static str {
        "meta-tags"
    }

    async fn extract(&self, ctx: &PinContext<'_>) -> Result<Option<MediaDescriptor>> {
        let candidates = Self::candidates(&ctx.page.body, &ctx.page.final_url)?;
        Ok(ctx.describe(&candidates, None, self.name()))
    }
}

/// Pinterest's oEmbed endpoint (`thumbnail_url` / `url`).
pub struct OembedStrategy;

#[async_trait]
impl ExtractionStrategy for OembedStrategy {
    fn name(&self) -> &'static str {
        "oembed"
    }

    async fn extract(&self, ctx: &PinContext<'_>) -> Result<Option<MediaDescriptor>> {
        let oembed = ctx.api.get_oembed(&canonical_pin_url(&ctx.pin.id)).await?;

        let mut candidates = CandidateSet::new();
        for (key, value) in [("thumbnail_url", &oembed.thumbnail_url), ("url", &oembed.url)] {
            if let Some(url) = value
                .as_deref()
                .and_then(|v| normalize_candidate(v, &ctx.page.final_url))
            {
                candidates.push_url(&url, key, None);
            }
        }

        Ok(ctx.describe(&candidates, oembed.title.as_deref(), self.name()))
    }
}

/// Last resort: every pinimg URL mentioned anywhere in the page.
pub struct PatternScanStrategy;

impl PatternScanStrategy {
    fn candidates(html: &str, base: &Url) -> CandidateSet {
        let mut candidates = CandidateSet::new();
        for found in hosted_media_re().find_iter(html) {
            if let Some(url) = normalize_candidate(found.as_str(), base) {
                candidates.push_url(&url, "", None);
            }
        }
        candidates
    }
}

#[async_trait]
impl ExtractionStrategy for PatternScanStrategy {
    fn name(&self) -> &'static str {
        "pattern-scan"
    }

    async fn extract(&self, ctx: &PinContext<'_>) -> Result<Option<MediaDescriptor>> {
        let candidates = Self::candidates(&ctx.page.body, &ctx.page.final_url);
        tracing::debug!(
            "Pattern scan found {} candidate(s) for pin {}",
            candidates.len(),
            ctx.pin.id
        );
        Ok(ctx.describe(&candidates, None, self.name()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::QualityFloor;
    use crate::media::MediaKind;

    fn base() -> Url {
        Url::parse("https://www.pinterest.com/pin/1/").unwrap()
    }

    #[test]
    fn test_meta_tags_upgrade_sized_images() {
        let html = r#"<html><head>
            <meta property="og:image" content="https://i.pinimg.com/736x/ab/cd/ef.jpg">
            <meta name="twitter:image" content="https://s.pinimg.com/images/facebook_share_image.png">
            <meta property="og:description" content="https://i.pinimg.com/236x/zz.jpg">
        </head></html>"#;
        let set = MetaTagStrategy::candidates(html, &base()).unwrap();
        let selection = set.select(QualityFloor::Original).unwrap();
        assert_eq!(selection.best.url, "https://i.pinimg.com/originals/ab/cd/ef.jpg");
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_meta_video_tag() {
        let html = r#"<html><head>
            <meta property="og:video" content="https://v1.pinimg.com/videos/mc/720p/a.mp4">
            <meta property="og:image" content="https://i.pinimg.com/originals/a.jpg">
        </head></html>"#;
        let set = MetaTagStrategy::candidates(html, &base()).unwrap();
        let selection = set.select(QualityFloor::Original).unwrap();
        assert_eq!(selection.best.kind, MediaKind::Video);
    }

    #[test]
    fn test_pattern_scan_finds_escaped_urls() {
        let html = r#"<script>window.x = {"u":"https:\/\/i.pinimg.com\/564x\/aa\/bb.jpg"};</script>
            <img src="https://i.pinimg.com/236x/aa/bb.jpg">
            <link href="https://s.pinimg.com/webapp/style.css">"#;
        let set = PatternScanStrategy::candidates(html, &base());
        let selection = set.select(QualityFloor::Original).unwrap();
        assert_eq!(selection.best.url, "https://i.pinimg.com/originals/aa/bb.jpg");
        assert!(set.iter().all(|c| c.kind == MediaKind::Image));
    }
}
