//! Pinterest HTTP client shared by the resolver, the collector and the engine.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use reqwest::cookie::{CookieStore, Jar};
use reqwest::{header, Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::json;
use tokio::time::{sleep, timeout};
use url::Url;

use crate::api::retry::{RetryDecision, RetryPolicy};
use crate::api::types::{OembedResponse, PinData, PinInfoResponse, ResourceEnvelope, ResourceResponse};
use crate::config::NetworkConfig;
use crate::error::{Error, Result};

/// Pinterest web base URL.
const WEB_BASE: &str = "https://www.pinterest.com/";

/// Pinterest public API base URL.
const API_BASE: &str = "https://api.pinterest.com/";

/// Connect timeout, independent of the whole-request timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Base URLs of the upstream services.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub web: Url,
    pub api: Url,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            web: Url::parse(WEB_BASE).expect("static web base URL"),
            api: Url::parse(API_BASE).expect("static api base URL"),
        }
    }
}

impl Endpoints {
    /// Point both services at one base (used against local mock servers).
    pub fn single(base: &str) -> Result<Self> {
        let base = if base.ends_with('/') {
            Url::parse(base)?
        } else {
            Url::parse(&format!("{}/", base))?
        };
        Ok(Self {
            web: base.clone(),
            api: base,
        })
    }

    pub fn pin_page(&self, pin_id: &str) -> Result<Url> {
        Ok(self.web.join(&format!("pin/{}/", pin_id))?)
    }

    pub fn profile_page(&self, username: &str) -> Result<Url> {
        Ok(self.web.join(&format!("{}/", username))?)
    }

    pub fn user_pins_resource(&self) -> Result<Url> {
        Ok(self.web.join("resource/UserPinsResource/get/")?)
    }

    pub fn oembed(&self) -> Result<Url> {
        Ok(self.web.join("oembed.json")?)
    }

    pub fn pin_info(&self) -> Result<Url> {
        Ok(self.api.join("v3/pidgets/pins/info/")?)
    }
}

/// A fetched HTML page and the URL it was finally served from.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub final_url: Url,
    pub body: String,
}

/// Pinterest API client with bounded retries.
pub struct PinterestApi {
    client: Client,
    cookies: Arc<Jar>,
    retry: RetryPolicy,
    request_timeout: Duration,
    endpoints: Endpoints,
}

impl PinterestApi {
    /// Create a new client from network settings.
    pub fn new(config: &NetworkConfig) -> Result<Self> {
        let cookies = Arc::new(Jar::default());

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT_LANGUAGE,
            header::HeaderValue::from_static("en-US,en;q=0.9"),
        );

        let client = Client::builder()
            .user_agent(&config.user_agent)
            .default_headers(headers)
            .cookie_provider(Arc::clone(&cookies))
            .connect_timeout(CONNECT_TIMEOUT.min(config.request_timeout()))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            cookies,
            retry: RetryPolicy::from_config(config),
            request_timeout: config.request_timeout(),
            endpoints: Endpoints::default(),
        })
    }

    /// Replace the upstream base URLs.
    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Upper bound for waiting on a response head or a single body chunk.
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Send a request, retrying transient failures per the retry policy.
    ///
    /// `build` is called once per attempt since request builders are consumed.
    /// The timeout covers the response head only, so media bodies can stream
    /// for longer than one request timeout.
    async fn send_with_retry<F>(&self, url: &str, build: F) -> Result<Response>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut attempt = 1;
        loop {
            let outcome = match timeout(self.request_timeout, build().send()).await {
                Ok(Ok(response)) if response.status().is_success() => return Ok(response),
                Ok(Ok(response)) => Error::HttpStatus {
                    url: url.to_string(),
                    status: response.status().as_u16(),
                },
                Ok(Err(e)) => Error::Http(e),
                Err(_) => Error::Timeout(url.to_string()),
            };

            let transient = outcome.is_transient();
            match self.retry.should_retry(transient, attempt) {
                RetryDecision::Retry {
                    delay,
                    attempt: next,
                } => {
                    tracing::warn!("Request to {} failed ({}), retrying", url, outcome);
                    sleep(delay).await;
                    attempt = next;
                }
                RetryDecision::GiveUp if transient => {
                    return Err(Error::Network {
                        url: url.to_string(),
                        attempts: attempt,
                        message: outcome.to_string(),
                    });
                }
                RetryDecision::GiveUp => return Err(outcome),
            }
        }
    }

    /// Fetch a page as text, following redirects.
    pub async fn get_page(&self, url: &str) -> Result<FetchedPage> {
        tracing::debug!("GET {}", url);
        let response = self.send_with_retry(url, || self.client.get(url)).await?;
        let final_url = response.url().clone();
        let body = self.read_text(url, response).await?;
        tracing::debug!("Fetched {} ({} bytes)", final_url, body.len());

        Ok(FetchedPage { final_url, body })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, query: &[(&str, String)]) -> Result<T> {
        let url_str = url.to_string();
        tracing::debug!("GET {}", url_str);

        let response = self
            .send_with_retry(&url_str, || {
                self.client
                    .get(url.clone())
                    .query(query)
                    .header(header::ACCEPT, "application/json")
            })
            .await?;
        let text = self.read_text(&url_str, response).await?;

        serde_json::from_str(&text).map_err(|e| {
            Error::Resolution(format!(
                "Failed to parse response from {}: {} - Response: {}",
                url_str,
                e,
                text.chars().take(200).collect::<String>()
            ))
        })
    }

    /// Fetch pin metadata from the public pin-info endpoint.
    pub async fn get_pin_info(&self, pin_id: &str) -> Result<Option<PinData>> {
        let url = self.endpoints.pin_info()?;
        let response: PinInfoResponse = self
            .get_json(url, &[("pin_ids", pin_id.to_string())])
            .await?;

        let Some(first) = response.data.and_then(|d| d.into_iter().next()) else {
            return Ok(None);
        };
        if !first.is_object() {
            return Ok(None);
        }

        Ok(Some(serde_json::from_value(first)?))
    }

    /// Fetch oEmbed metadata for a pin page.
    pub async fn get_oembed(&self, page_url: &str) -> Result<OembedResponse> {
        let url = self.endpoints.oembed()?;
        self.get_json(url, &[("url", page_url.to_string())]).await
    }

    /// Fetch one page of a user's pins from the resource endpoint.
    pub async fn get_user_pins_page(
        &self,
        username: &str,
        bookmark: &str,
    ) -> Result<ResourceResponse> {
        let url = self.endpoints.user_pins_resource()?;
        let profile_url = self.endpoints.profile_page(username)?;

        let data = json!({
            "options": {
                "add_vase": true,
                "field_set_key": "mobile_grid_item",
                "is_own_profile_pins": false,
                "username": username,
                "bookmarks": [bookmark],
            },
            "context": {},
        });
        let query = [
            ("source_url", format!("/{}/", username)),
            ("data", data.to_string()),
            ("_", unix_millis().to_string()),
        ];
        let csrf = self.csrf_token(&profile_url);
        let url_str = url.to_string();

        tracing::debug!("GET {} (bookmark {})", url_str, bookmark);
        let response = self
            .send_with_retry(&url_str, || {
                let mut request = self
                    .client
                    .get(url.clone())
                    .query(&query)
                    .header(header::REFERER, profile_url.as_str())
                    .header(header::ACCEPT, "application/json, text/javascript, */*; q=0.01")
                    .header("X-Requested-With", "XMLHttpRequest")
                    .header("X-Pinterest-AppState", "active");
                if let Some(token) = &csrf {
                    request = request.header("X-CSRFToken", token.as_str());
                }
                request
            })
            .await?;

        let text = self.read_text(&url_str, response).await?;
        let envelope: ResourceEnvelope = serde_json::from_str(&text)?;
        envelope
            .resource_response
            .ok_or_else(|| Error::Resolution("Pagination response had no resource_response".into()))
    }

    /// Open a streaming response for a media file.
    pub async fn open_media(&self, url: &str) -> Result<Response> {
        tracing::debug!("GET {} (media)", url);
        self.send_with_retry(url, || self.client.get(url)).await
    }

    async fn read_text(&self, url: &str, response: Response) -> Result<String> {
        timeout(self.request_timeout, response.text())
            .await
            .map_err(|_| Error::Timeout(url.to_string()))?
            .map_err(Error::from)
    }

    fn csrf_token(&self, url: &Url) -> Option<String> {
        let cookies = self.cookies.cookies(url)?;
        let cookies = cookies.to_str().ok()?;
        cookies
            .split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == "csrftoken")
            .map(|(_, value)| value.to_string())
    }
}

fn unix_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}
