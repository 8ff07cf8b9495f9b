//! Paginated sources of a profile's pins.

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;

use crate::api::PinterestApi;
use crate::error::Result;
use crate::links::{extract_pin_id, PinReference};
use crate::resolve::strategy::script_bodies;

/// Bookmark value upstream uses to say there are no more pages.
pub const END_MARKER: &str = "-end-";

const STATE_SCRIPTS: &str = "script#__PWS_INITIAL_PROPS__, script#__PWS_DATA__";

/// Opaque continuation token for one profile collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cursor(String);

impl Cursor {
    /// Wrap an upstream bookmark; empty and end markers mean "no next page".
    pub fn from_bookmark(bookmark: Option<&str>) -> Option<Self> {
        match bookmark.map(str::trim) {
            Some(b) if !b.is_empty() && b != END_MARKER => Some(Self(b.to_string())),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One page of a listing.
#[derive(Debug, Clone, Default)]
pub struct Page {
    /// Pins in listing order; may overlap with earlier pages.
    pub pins: Vec<PinReference>,
    /// Where the next page starts, `None` when the listing is exhausted.
    pub next: Option<Cursor>,
}

/// A paginated listing of pins.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch the page at `cursor`, or the first page when `None`.
    async fn fetch_page(&self, cursor: Option<&Cursor>) -> Result<Page>;
}

/// A public profile's pins on pinterest.com.
///
/// The first page comes from the profile HTML's embedded state; later pages
/// come from the `UserPinsResource` endpoint.
pub struct PinterestProfileSource {
    api: Arc<PinterestApi>,
    username: String,
}

impl PinterestProfileSource {
    pub fn new(api: Arc<PinterestApi>, username: impl Into<String>) -> Self {
        Self {
            api,
            username: username.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    async fn first_page(&self) -> Result<Page> {
        let url = self.api.endpoints().profile_page(&self.username)?;
        let page = self.api.get_page(url.as_str()).await?;

        for body in script_bodies(&page.body, STATE_SCRIPTS)? {
            let Ok(state) = serde_json::from_str::<Value>(&body) else {
                continue;
            };
            if let Some(entry) = user_pins_entry(&state) {
                let pins = pins_from_rows(entry.get("data"));
                let next = Cursor::from_bookmark(entry.get("nextBookmark").and_then(Value::as_str));
                tracing::debug!(
                    "Profile {} initial state: {} pin(s), more: {}",
                    self.username,
                    pins.len(),
                    next.is_some()
                );
                return Ok(Page { pins, next });
            }
        }

        // No embedded listing: take whatever pin links the markup shows.
        let pins = pins_from_markup(&page.body);
        tracing::debug!(
            "Profile {} has no embedded listing, found {} pin link(s)",
            self.username,
            pins.len()
        );
        Ok(Page { pins, next: None })
    }
}

#[async_trait]
impl PageSource for PinterestProfileSource {
    async fn fetch_page(&self, cursor: Option<&Cursor>) -> Result<Page> {
        let Some(cursor) = cursor else {
            return self.first_page().await;
        };

        let response = self
            .api
            .get_user_pins_page(&self.username, cursor.as_str())
            .await?;
        Ok(Page {
            pins: pins_from_rows(response.data.as_ref()),
            next: Cursor::from_bookmark(response.bookmark.as_deref()),
        })
    }
}

/// `initialReduxState.resources.UserPinsResource.<first>` in page state.
fn user_pins_entry(state: &Value) -> Option<&Value> {
    let redux = state
        .get("initialReduxState")
        .or_else(|| state.get("props")?.get("initialReduxState"))?;
    let resource = redux.get("resources")?.get("UserPinsResource")?.as_object()?;
    resource.values().next().filter(|entry| entry.is_object())
}

/// Pin references from listing rows, using `seo_url` or a numeric `id`.
pub fn pins_from_rows(rows: Option<&Value>) -> Vec<PinReference> {
    let Some(rows) = rows.and_then(Value::as_array) else {
        return Vec::new();
    };

    rows.iter()
        .filter_map(|row| {
            let from_seo = row
                .get("seo_url")
                .and_then(Value::as_str)
                .and_then(extract_pin_id);
            let from_id = match row.get("id") {
                Some(Value::String(id)) if !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()) => {
                    Some(id.clone())
                }
                Some(Value::Number(id)) => Some(id.to_string()),
                _ => None,
            };
            from_seo.or(from_id).map(PinReference::from_id)
        })
        .collect()
}

/// Distinct `/pin/<id>/` links in raw markup, in document order.
fn pins_from_markup(html: &str) -> Vec<PinReference> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"(?i)/pin/(\d+)/").unwrap());

    let mut seen = HashSet::new();
    re.captures_iter(html)
        .map(|c| c[1].to_string())
        .filter(|id| seen.insert(id.clone()))
        .map(PinReference::from_id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Endpoints;
    use crate::config::NetworkConfig;
    use crate::error::{Error, ErrorKind};
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn ids(pins: &[PinReference]) -> Vec<&str> {
        pins.iter().map(|p| p.id.as_str()).collect()
    }

    fn source_for(server: &MockServer, username: &str) -> PinterestProfileSource {
        let config = NetworkConfig {
            max_retries: 0,
            ..NetworkConfig::default()
        };
        let api = PinterestApi::new(&config)
            .unwrap()
            .with_endpoints(Endpoints::single(&server.uri()).unwrap());
        PinterestProfileSource::new(Arc::new(api), username)
    }

    #[test]
    fn test_cursor_from_bookmark() {
        assert_eq!(Cursor::from_bookmark(Some("abc")).unwrap().as_str(), "abc");
        assert!(Cursor::from_bookmark(Some("-end-")).is_none());
        assert!(Cursor::from_bookmark(Some("  ")).is_none());
        assert!(Cursor::from_bookmark(None).is_none());
    }

    #[test]
    fn test_pins_from_rows() {
        let rows = json!([
            {"id": "1"},
            {"seo_url": "/pin/some-title--2/", "id": "ignored"},
            {"id": 3},
            {"id": "board-4"},
            "garbage",
            {"type": "story"}
        ]);
        assert_eq!(ids(&pins_from_rows(Some(&rows))), vec!["1", "2", "3"]);
        assert!(pins_from_rows(Some(&json!({"not": "a list"}))).is_empty());
        assert!(pins_from_rows(None).is_empty());
    }

    #[test]
    fn test_pins_from_markup_dedups_in_order() {
        let html = r#"<a href="/pin/9/">a</a><a href="/pin/8/">b</a><a href="/pin/9/">c</a>"#;
        assert_eq!(ids(&pins_from_markup(html)), vec!["9", "8"]);
    }

    #[tokio::test]
    async fn test_first_page_from_initial_state() {
        let server = MockServer::start().await;
        let state = json!({"initialReduxState": {"resources": {"UserPinsResource": {
            "first": {"data": [{"id": "10"}, {"id": "11"}], "nextBookmark": "bm-1"}
        }}}});
        let html = format!(
            r#"<html><script id="__PWS_INITIAL_PROPS__" type="application/json">{}</script></html>"#,
            state
        );
        Mock::given(method("GET"))
            .and(path("/artist/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(html))
            .mount(&server)
            .await;

        let source = source_for(&server, "artist");
        let page = source.fetch_page(None).await.unwrap();
        assert_eq!(ids(&page.pins), vec!["10", "11"]);
        assert_eq!(page.next.unwrap().as_str(), "bm-1");
    }

    #[tokio::test]
    async fn test_later_pages_from_resource_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/resource/UserPinsResource/get/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "resource_response": {"data": [{"id": "12"}], "bookmark": "-end-"}
            })))
            .mount(&server)
            .await;

        let source = source_for(&server, "artist");
        let cursor = Cursor::from_bookmark(Some("bm-1")).unwrap();
        let page = source.fetch_page(Some(&cursor)).await.unwrap();
        assert_eq!(ids(&page.pins), vec!["12"]);
        assert!(page.next.is_none());
    }

    #[tokio::test]
    async fn test_markup_only_profile() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/plain/"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(r#"<a href="/pin/5/">x</a>"#),
            )
            .mount(&server)
            .await;

        let page = source_for(&server, "plain").fetch_page(None).await.unwrap();
        assert_eq!(ids(&page.pins), vec!["5"]);
        assert!(page.next.is_none());
    }

    #[tokio::test]
    async fn test_missing_profile_is_permanent() {
        let server = MockServer::start().await;
        let err = source_for(&server, "ghost").fetch_page(None).await.unwrap_err();
        assert!(matches!(err, Error::HttpStatus { status: 404, .. }));
        assert_eq!(err.kind(), ErrorKind::NetworkError);
    }
}
