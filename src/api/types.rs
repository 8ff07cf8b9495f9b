//! Wire types for the public Pinterest endpoints.
//!
//! Upstream payloads are semi-structured and change without notice, so every
//! field is optional and unknown fields are ignored.

use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

/// `/v3/pidgets/pins/info/` response.
#[derive(Debug, Deserialize)]
pub struct PinInfoResponse {
    #[serde(default)]
    pub data: Option<Vec<Value>>,
}

/// A pin object, as served by the pin-info endpoint or embedded page state.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PinData {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub grid_title: Option<String>,
    #[serde(default)]
    pub images: Option<HashMap<String, ImageVariant>>,
    #[serde(default)]
    pub videos: Option<VideoList>,
    #[serde(default)]
    pub story_pin_data: Option<StoryPinData>,
    #[serde(default)]
    pub is_video: Option<bool>,
}

impl PinData {
    /// Best human-readable title, if any.
    pub fn display_title(&self) -> Option<&str> {
        self.title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .or_else(|| self.grid_title.as_deref().filter(|t| !t.trim().is_empty()))
    }

    /// Pin id as a string, whether upstream sent a number or a string.
    pub fn id_string(&self) -> Option<String> {
        match self.id.as_ref()? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn is_story(&self) -> bool {
        self.story_pin_data
            .as_ref()
            .map(|s| !s.pages.is_empty())
            .unwrap_or(false)
    }

    pub fn has_top_level_media(&self) -> bool {
        self.images.as_ref().map(|i| !i.is_empty()).unwrap_or(false)
            || self
                .videos
                .as_ref()
                .map(|v| !v.video_list.is_empty())
                .unwrap_or(false)
    }
}

/// One image rendition keyed by size name (`orig`, `736x`, `236x`, ...).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImageVariant {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

/// Video renditions keyed by format name (`V_720P`, `V_HLSV4`, ...).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoList {
    #[serde(default)]
    pub video_list: HashMap<String, VideoVariant>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoVariant {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub bitrate: Option<u64>,
}

/// Multi-page story ("idea") pin content.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoryPinData {
    #[serde(default)]
    pub pages: Vec<StoryPage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoryPage {
    #[serde(default)]
    pub blocks: Vec<StoryBlock>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoryBlock {
    #[serde(default)]
    pub image: Option<StoryImage>,
    #[serde(default)]
    pub video: Option<VideoList>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoryImage {
    #[serde(default)]
    pub images: HashMap<String, ImageVariant>,
}

/// `/resource/UserPinsResource/get/` response envelope.
#[derive(Debug, Deserialize)]
pub struct ResourceEnvelope {
    #[serde(default)]
    pub resource_response: Option<ResourceResponse>,
}

#[derive(Debug, Deserialize)]
pub struct ResourceResponse {
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub bookmark: Option<String>,
}

/// `/oembed.json` response.
#[derive(Debug, Default, Deserialize)]
pub struct OembedResponse {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub html: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}
