//! Media candidates, quality scoring and the selection policy.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use url::Url;

use crate::config::QualityFloor;
use crate::media::infer::{
    infer_media_kind_from_url, is_pinimg_host, is_placeholder_image, is_playable_video,
    size_segment_re,
};
use crate::media::item::MediaKind;

/// Base score that puts every video above every image.
const VIDEO_BASE_SCORE: i64 = 20_000;
const IMAGE_BASE_SCORE: i64 = 1_000;
const ORIGINAL_BONUS: i64 = 9_000;

fn video_resolution_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"/(\d{3,4})p(?:/|$)").unwrap())
}

/// One media URL found for a pin, with what is known about its quality.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaCandidate {
    pub url: String,
    pub kind: MediaKind,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub bitrate: Option<u64>,
    /// Full-resolution image (`orig` key, `/originals/` path or upgraded URL).
    pub original: bool,
    /// An `/originals/` address derived from a sized URL rather than listed upstream.
    pub inferred: bool,
    pub score: i64,
}

impl MediaCandidate {
    /// Image candidate; `size_hint` is the key it was listed under (`orig`, `736x`, ...).
    pub fn image(url: &str, size_hint: &str, width: Option<u32>, height: Option<u32>) -> Self {
        let path = url_path(url);
        let original =
            path.contains("/originals/") || matches!(size_hint, "orig" | "originals");

        let (path_w, path_h) = size_from_path(&path);
        let width = width.or(path_w);
        let height = height.or(path_h);

        let mut score = IMAGE_BASE_SCORE;
        if original {
            score += ORIGINAL_BONUS;
        }
        score += width.unwrap_or(0) as i64 + height.unwrap_or(0) as i64;
        if url_host(url).map(|h| is_pinimg_host(&h)).unwrap_or(false) {
            score += 300;
        }

        Self {
            url: url.to_string(),
            kind: MediaKind::Image,
            width,
            height,
            bitrate: None,
            original,
            inferred: false,
            score,
        }
    }

    /// Video candidate; `format_hint` is the rendition key (`V_720P`, `V_HLSV4`, ...).
    pub fn video(
        url: &str,
        format_hint: &str,
        width: Option<u32>,
        height: Option<u32>,
        bitrate: Option<u64>,
    ) -> Self {
        let path = url_path(url);

        let resolution = height
            .map(|h| h as i64)
            .or_else(|| {
                video_resolution_re()
                    .captures(&path)
                    .and_then(|c| c[1].parse().ok())
            })
            .or_else(|| {
                let digits: String = format_hint.chars().filter(char::is_ascii_digit).collect();
                format_hint
                    .to_lowercase()
                    .ends_with('p')
                    .then(|| digits.parse().ok())
                    .flatten()
            })
            .unwrap_or(0);

        let mut score = VIDEO_BASE_SCORE + resolution;
        score += bitrate.map(|b| (b / 100_000) as i64).unwrap_or(0);
        if path.ends_with(".mp4") {
            score += 500;
        }
        if path.ends_with(".m3u8") {
            score -= 300;
        }
        if path.contains("hls") || format_hint.to_lowercase().contains("hls") {
            score -= 150;
        }

        Self {
            url: url.to_string(),
            kind: MediaKind::Video,
            width,
            height,
            bitrate,
            original: false,
            inferred: false,
            score,
        }
    }
}

fn url_path(url: &str) -> String {
    Url::parse(url)
        .map(|u| u.path().to_lowercase())
        .unwrap_or_default()
}

fn url_host(url: &str) -> Option<String> {
    Url::parse(url).ok()?.host_str().map(str::to_string)
}

/// Width and height encoded in a pinimg size segment (`736x`, `474x474`).
fn size_from_path(path: &str) -> (Option<u32>, Option<u32>) {
    let Some(first) = path.split('/').find(|s| !s.is_empty()) else {
        return (None, None);
    };
    let Some(caps) = size_segment_re().captures(first) else {
        return (None, None);
    };
    let width = caps[1].parse().ok();
    let height = caps[2].parse().ok();
    (width, height)
}

/// The `/originals/` counterpart of a sized pinimg image URL.
pub fn pinimg_original_variant(url: &str) -> Option<String> {
    let mut parsed = Url::parse(url).ok()?;
    if !is_pinimg_host(parsed.host_str()?) {
        return None;
    }

    let segments: Vec<String> = parsed.path_segments()?.map(str::to_string).collect();
    let first = segments.iter().position(|s| !s.is_empty())?;
    if segments[first] == "originals" || !size_segment_re().is_match(&segments[first]) {
        return None;
    }

    let rest = segments[first + 1..].join("/");
    parsed.set_path(&format!("/originals/{}", rest));
    Some(parsed.to_string())
}

/// Deduplicating collection of candidates for one pin.
#[derive(Debug, Default)]
pub struct CandidateSet {
    candidates: Vec<MediaCandidate>,
    index: HashMap<(MediaKind, String), usize>,
}

impl CandidateSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Add a candidate, keeping the higher score for a repeated URL.
    ///
    /// A URL listed upstream is never treated as inferred, whichever copy wins.
    pub fn push(&mut self, candidate: MediaCandidate) {
        let key = (candidate.kind, candidate.url.clone());
        match self.index.get(&key) {
            Some(&i) => {
                let existing = &mut self.candidates[i];
                let inferred = existing.inferred && candidate.inferred;
                if candidate.score > existing.score {
                    *existing = candidate;
                }
                existing.inferred = inferred;
            }
            None => {
                self.index.insert(key, self.candidates.len());
                self.candidates.push(candidate);
            }
        }
    }

    /// Add an image URL and, for sized pinimg URLs, its `/originals/` upgrade.
    pub fn push_image(&mut self, url: &str, size_hint: &str, width: Option<u32>, height: Option<u32>) {
        if is_placeholder_image(url) {
            return;
        }
        if let Some(original) = pinimg_original_variant(url) {
            let mut upgrade = MediaCandidate::image(&original, "orig", None, None);
            upgrade.inferred = true;
            self.push(upgrade);
        }
        self.push(MediaCandidate::image(url, size_hint, width, height));
    }

    /// Add a URL whose kind is inferred from its shape; non-media URLs are ignored.
    pub fn push_url(&mut self, url: &str, key_hint: &str, kind_hint: Option<MediaKind>) {
        let Some(kind) = infer_media_kind_from_url(url) else {
            return;
        };
        if kind_hint.is_some_and(|hint| hint != kind) {
            return;
        }
        match kind {
            MediaKind::Image => self.push_image(url, key_hint, None, None),
            MediaKind::Video => self.push(MediaCandidate::video(url, key_hint, None, None, None)),
        }
    }

    pub fn extend(&mut self, other: CandidateSet) {
        for candidate in other.candidates {
            self.push(candidate);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &MediaCandidate> {
        self.candidates.iter()
    }

    /// Pick the media to download and rank the remaining usable URLs.
    ///
    /// A playable video beats any image. Images must be originals unless the
    /// floor is [`QualityFloor::BestAvailable`]. Playlists are never picked.
    pub fn select(&self, floor: QualityFloor) -> Option<Selection> {
        let mut videos: Vec<&MediaCandidate> = self
            .candidates
            .iter()
            .filter(|c| c.kind == MediaKind::Video && is_playable_video(&c.url))
            .collect();

        let ranked = if !videos.is_empty() {
            videos.sort_by(|a, b| b.score.cmp(&a.score));
            videos
        } else {
            let mut images: Vec<&MediaCandidate> = self
                .candidates
                .iter()
                .filter(|c| c.kind == MediaKind::Image)
                .filter(|c| floor == QualityFloor::BestAvailable || c.original)
                .collect();
            images.sort_by(|a, b| b.score.cmp(&a.score));
            images
        };

        let (best, rest) = ranked.split_first()?;
        Some(Selection {
            best: (*best).clone(),
            alternates: rest.iter().map(|c| c.url.clone()).collect(),
            inferred_only: ranked.iter().all(|c| c.inferred),
        })
    }
}

/// Outcome of [`CandidateSet::select`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub best: MediaCandidate,
    pub alternates: Vec<String>,
    /// Every selected URL is an inferred original.
    pub inferred_only: bool,
}
