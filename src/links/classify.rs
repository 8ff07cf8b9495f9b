//! Pinterest link classification and normalisation.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use url::Url;

use crate::error::{Error, Result};

/// Canonical web host used for normalised links.
pub const CANONICAL_HOST: &str = "www.pinterest.com";

/// Hosts that serve shortened pin links.
const SHORT_LINK_HOSTS: &[&str] = &["pin.it"];

/// First path segments that never name a profile.
const RESERVED_SEGMENTS: &[&str] = &[
    "pin",
    "pins",
    "search",
    "ideas",
    "explore",
    "discover",
    "categories",
    "business",
    "about",
    "help",
    "privacy",
    "settings",
    "login",
    "signup",
    "create",
    "shop",
    "today",
    "oembed.json",
    "resource",
];

fn pinterest_host_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)(?:^|\.)pinterest\.[a-z]{2,3}(?:\.[a-z]{2})?$").unwrap())
}

fn pin_path_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // `/pin/123/` and the slugged `/pin/some-title--123/`
    RE.get_or_init(|| Regex::new(r"(?i)^/pin/(?:[^/]*--)?(\d+)/?$").unwrap())
}

fn username_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z0-9][a-z0-9_.-]{0,59}$").unwrap())
}

/// Kind of a classified input link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkKind {
    Pin,
    Profile,
    Invalid,
}

impl fmt::Display for LinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkKind::Pin => write!(f, "pin"),
            LinkKind::Profile => write!(f, "profile"),
            LinkKind::Invalid => write!(f, "invalid"),
        }
    }
}

/// What a link points at once classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkTarget {
    /// Pin permalink with a known numeric id.
    Pin { id: String },
    /// Shortened pin link; the id is only known after following the redirect.
    ShortPin,
    /// Profile (or one of its boards) owned by `username`.
    Profile { username: String },
    /// Not a supported link.
    None,
}

/// A raw input line together with its classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputLink {
    /// The input exactly as supplied.
    pub raw: String,
    /// Canonical URL; empty for invalid input.
    pub normalized: String,
    pub kind: LinkKind,
    pub target: LinkTarget,
}

impl InputLink {
    /// Placeholder for input that failed classification.
    pub fn invalid(raw: &str) -> Self {
        Self {
            raw: raw.to_string(),
            normalized: String::new(),
            kind: LinkKind::Invalid,
            target: LinkTarget::None,
        }
    }

    /// The pin id, when the link names one directly.
    pub fn pin_id(&self) -> Option<&str> {
        match &self.target {
            LinkTarget::Pin { id } => Some(id),
            _ => None,
        }
    }

    /// The profile username, for profile links.
    pub fn username(&self) -> Option<&str> {
        match &self.target {
            LinkTarget::Profile { username } => Some(username),
            _ => None,
        }
    }
}

/// Canonical permalink for a pin id.
pub fn canonical_pin_url(pin_id: &str) -> String {
    format!("https://{}/pin/{}/", CANONICAL_HOST, pin_id)
}

/// Canonical profile URL for a username.
pub fn canonical_profile_url(username: &str) -> String {
    format!("https://{}/{}/", CANONICAL_HOST, username)
}

/// Extract a pin id from any text containing a `/pin/<id>` path.
pub fn extract_pin_id(text: &str) -> Option<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"/pin/(?:[^/\s]*--)?(\d+)").unwrap());
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Whether `host` belongs to Pinterest (any country domain or the short-link host).
pub fn is_pinterest_host(host: &str) -> bool {
    let host = host.trim().to_lowercase();
    if host.is_empty() {
        return false;
    }
    SHORT_LINK_HOSTS.contains(&host.as_str()) || pinterest_host_re().is_match(&host)
}

/// Classify a raw input string as a pin or profile link.
///
/// Pure: no I/O. Scheme-less input gets `https://`; the host is folded to
/// `www.pinterest.com` and trailing slashes, query and fragment are dropped.
pub fn classify(raw: &str) -> Result<InputLink> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidLink("empty input".to_string()));
    }
    if trimmed.chars().any(char::is_whitespace) {
        return Err(Error::InvalidLink(trimmed.to_string()));
    }

    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let url = Url::parse(&with_scheme).map_err(|_| Error::InvalidLink(trimmed.to_string()))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(Error::InvalidLink(trimmed.to_string()));
    }

    let host = url
        .host_str()
        .map(str::to_lowercase)
        .ok_or_else(|| Error::InvalidLink(trimmed.to_string()))?;
    if !is_pinterest_host(&host) {
        return Err(Error::InvalidLink(trimmed.to_string()));
    }

    if SHORT_LINK_HOSTS.contains(&host.as_str()) {
        let code = url.path().trim_matches('/');
        if code.is_empty() || code.contains('/') {
            return Err(Error::InvalidLink(trimmed.to_string()));
        }
        return Ok(InputLink {
            raw: raw.to_string(),
            normalized: format!("https://{}/{}", host, code),
            kind: LinkKind::Pin,
            target: LinkTarget::ShortPin,
        });
    }

    if let Some(id) = pin_path_re()
        .captures(url.path())
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
    {
        return Ok(InputLink {
            raw: raw.to_string(),
            normalized: canonical_pin_url(&id),
            kind: LinkKind::Pin,
            target: LinkTarget::Pin { id },
        });
    }

    let first_segment = url
        .path_segments()
        .and_then(|mut segments| segments.find(|s| !s.is_empty()))
        .map(str::to_lowercase);

    match first_segment {
        Some(username)
            if !username.starts_with('_')
                && !RESERVED_SEGMENTS.contains(&username.as_str())
                && username_re().is_match(&username) =>
        {
            Ok(InputLink {
                raw: raw.to_string(),
                normalized: canonical_profile_url(&username),
                kind: LinkKind::Profile,
                target: LinkTarget::Profile { username },
            })
        }
        _ => Err(Error::InvalidLink(trimmed.to_string())),
    }
}

/// Split newline-separated input into non-blank lines, preserving order.
pub fn parse_link_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_pin_variants() {
        for raw in [
            "https://pinterest.com/pin/123/",
            "https://www.pinterest.com/pin/123",
            "http://WWW.Pinterest.com/pin/123/?utm_source=x#frag",
            "pinterest.co.uk/pin/123/",
            "https://de.pinterest.com/pin/123/",
            "https://www.pinterest.com/pin/cozy-reading-nook--123/",
        ] {
            let link = classify(raw).unwrap();
            assert_eq!(link.kind, LinkKind::Pin, "{}", raw);
            assert_eq!(link.pin_id(), Some("123"), "{}", raw);
            assert_eq!(link.normalized, "https://www.pinterest.com/pin/123/");
            assert_eq!(link.raw, raw);
        }
    }

    #[test]
    fn test_classify_short_link() {
        let link = classify("https://pin.it/4AbCdEf/").unwrap();
        assert_eq!(link.kind, LinkKind::Pin);
        assert_eq!(link.target, LinkTarget::ShortPin);
        assert_eq!(link.normalized, "https://pin.it/4AbCdEf");
        assert_eq!(link.pin_id(), None);
    }

    #[test]
    fn test_classify_profile_and_board() {
        let link = classify("https://www.pinterest.com/SomeUser/").unwrap();
        assert_eq!(link.kind, LinkKind::Profile);
        assert_eq!(link.username(), Some("someuser"));
        assert_eq!(link.normalized, "https://www.pinterest.com/someuser/");

        let board = classify("pinterest.com/someuser/kitchen-ideas/").unwrap();
        assert_eq!(board.kind, LinkKind::Profile);
        assert_eq!(board.username(), Some("someuser"));
    }

    #[test]
    fn test_classify_invalid() {
        for raw in [
            "not a url",
            "",
            "   ",
            "https://example.com/pin/123/",
            "ftp://pinterest.com/pin/123/",
            "https://www.pinterest.com/",
            "https://www.pinterest.com/search/pins/?q=cats",
            "https://www.pinterest.com/ideas/",
            "https://www.pinterest.com/_tools/",
            "https://notpinterest.com/pin/1/",
        ] {
            let result = classify(raw);
            assert!(
                matches!(result, Err(Error::InvalidLink(_))),
                "{:?} should be invalid",
                raw
            );
        }
    }

    #[test]
    fn test_classification_is_idempotent() {
        for raw in [
            "https://pinterest.com/pin/123/",
            "pinterest.com/pin/slug--987654321",
            "https://pin.it/xyz",
            "https://www.pinterest.fr/Artist.Name/board/",
        ] {
            let first = classify(raw).unwrap();
            let second = classify(&first.normalized).unwrap();
            assert_eq!(first.kind, second.kind);
            assert_eq!(first.target, second.target);
            assert_eq!(first.normalized, second.normalized);
        }
    }

    #[test]
    fn test_extract_pin_id() {
        assert_eq!(
            extract_pin_id("https://www.pinterest.com/pin/4455/sent/"),
            Some("4455".to_string())
        );
        assert_eq!(extract_pin_id("\"seo_url\": \"/pin/77/\""), Some("77".to_string()));
        assert_eq!(extract_pin_id("https://www.pinterest.com/user/"), None);
    }

    #[test]
    fn test_parse_link_lines() {
        let lines = parse_link_lines(
            "https://pinterest.com/pin/1/\n\n   not a url  \n# comment\nhttps://pin.it/a\n",
        );
        assert_eq!(
            lines,
            vec!["https://pinterest.com/pin/1/", "not a url", "https://pin.it/a"]
        );
    }
}
