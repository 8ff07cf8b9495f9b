//! Strategies reading Pinterest's own pin objects.

use async_trait::async_trait;
use serde_json::Value;

use crate::api::types::{ImageVariant, PinData, VideoList};
use crate::config::StoryPinPolicy;
use crate::error::{Error, Result};
use crate::media::{CandidateSet, MediaCandidate, MediaDescriptor};
use crate::resolve::strategy::{script_bodies, ExtractionStrategy, PinContext};

/// Script tags carrying the page's serialized application state.
const STATE_SCRIPTS: &str = "script#__PWS_DATA__, script#__PWS_INITIAL_PROPS__";

/// Build candidates from a pin object, applying the story pin policy.
///
/// Story pins without top-level media are represented by the first media
/// block of their first page that has one.
pub fn pin_candidates(pin: &PinData, policy: StoryPinPolicy) -> Result<CandidateSet> {
    let mut set = CandidateSet::new();

    if pin.is_story() && policy == StoryPinPolicy::Reject {
        return Err(Error::Rejected(format!(
            "pin {} is a story pin",
            pin.id_string().unwrap_or_default()
        )));
    }

    if pin.has_top_level_media() {
        if let Some(images) = &pin.images {
            push_images(&mut set, images.iter());
        }
        if let Some(videos) = &pin.videos {
            push_videos(&mut set, videos);
        }
        return Ok(set);
    }

    let cover = pin
        .story_pin_data
        .iter()
        .flat_map(|story| story.pages.iter())
        .flat_map(|page| page.blocks.iter())
        .find(|block| block.image.is_some() || block.video.is_some());

    if let Some(block) = cover {
        if let Some(image) = &block.image {
            push_images(&mut set, image.images.iter());
        }
        if let Some(video) = &block.video {
            push_videos(&mut set, video);
        }
    }

    Ok(set)
}

fn push_images<'a>(set: &mut CandidateSet, images: impl Iterator<Item = (&'a String, &'a ImageVariant)>) {
    for (key, variant) in images {
        if let Some(url) = &variant.url {
            set.push_image(url, key, variant.width, variant.height);
        }
    }
}

fn push_videos(set: &mut CandidateSet, videos: &VideoList) {
    for (key, variant) in &videos.video_list {
        if let Some(url) = &variant.url {
            set.push(MediaCandidate::video(
                url,
                key,
                variant.width,
                variant.height,
                variant.bitrate,
            ));
        }
    }
}

/// Public pin-info endpoint (`/v3/pidgets/pins/info/`).
pub struct PinApiStrategy;

#[async_trait]
impl ExtractionStrategy for PinApiStrategy {
    fn name(&self) -> &'static str {
        "pin-api"
    }

    async fn extract(&self, ctx: &PinContext<'_>) -> Result<Option<MediaDescriptor>> {
        let Some(pin) = ctx.api.get_pin_info(&ctx.pin.id).await? else {
            return Ok(None);
        };
        let candidates = pin_candidates(&pin, ctx.config.story_pins)?;
        Ok(ctx.describe(&candidates, pin.display_title(), self.name()))
    }
}

/// Pin object embedded in the page's serialized application state.
pub struct EmbeddedDataStrategy;

#[async_trait]
impl ExtractionStrategy for EmbeddedDataStrategy {
    fn name(&self) -> &'static str {
        "embedded-state"
    }

    async fn extract(&self, ctx: &PinContext<'_>) -> Result<Option<MediaDescriptor>> {
        for body in script_bodies(&ctx.page.body, STATE_SCRIPTS)? {
            let Ok(state) = serde_json::from_str::<Value>(&body) else {
                tracing::debug!("Unparsable page state for pin {}", ctx.pin.id);
                continue;
            };
            let Some(object) = find_pin_object(&state, &ctx.pin.id) else {
                continue;
            };

            let pin: PinData = serde_json::from_value(object.clone())?;
            let candidates = pin_candidates(&pin, ctx.config.story_pins)?;
            if let Some(descriptor) = ctx.describe(&candidates, pin.display_title(), self.name()) {
                return Ok(Some(descriptor));
            }
        }
        Ok(None)
    }
}

/// Find the object describing pin `pin_id` anywhere in the page state.
pub fn find_pin_object<'v>(value: &'v Value, pin_id: &str) -> Option<&'v Value> {
    match value {
        Value::Object(map) => {
            let id_matches = match map.get("id") {
                Some(Value::String(id)) => id == pin_id,
                Some(Value::Number(id)) => id.to_string() == pin_id,
                _ => false,
            };
            let has_media = ["images", "videos", "story_pin_data"]
                .iter()
                .any(|key| map.get(*key).is_some_and(|v| !v.is_null()));
            if id_matches && has_media {
                return Some(value);
            }
            map.values().find_map(|nested| find_pin_object(nested, pin_id))
        }
        Value::Array(items) => items.iter().find_map(|nested| find_pin_object(nested, pin_id)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::QualityFloor;
    use crate::media::MediaKind;
    use serde_json::json;

    fn pin(value: Value) -> PinData {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_video_and_image_pin_prefers_video() {
        let data = pin(json!({
            "id": "1",
            "images": {"orig": {"url": "https://i.pinimg.com/originals/a.jpg", "width": 2000, "height": 2000}},
            "videos": {"video_list": {
                "V_1080P": {"url": "https://v1.pinimg.com/videos/mc/1080p/a.mp4", "width": 1920, "height": 1080},
                "V_HLSV4": {"url": "https://v1.pinimg.com/videos/mc/hls/a.m3u8"}
            }}
        }));
        let set = pin_candidates(&data, StoryPinPolicy::Cover).unwrap();
        let selection = set.select(QualityFloor::Original).unwrap();
        assert_eq!(selection.best.kind, MediaKind::Video);
        assert!(selection.best.url.ends_with("1080p/a.mp4"));
    }

    #[test]
    fn test_story_pin_cover_uses_first_block_with_media() {
        let data = pin(json!({
            "id": "2",
            "story_pin_data": {"pages": [
                {"blocks": [{"type": "text"}]},
                {"blocks": [
                    {"image": {"images": {"originals": {"url": "https://i.pinimg.com/originals/first.jpg"}}}},
                    {"image": {"images": {"originals": {"url": "https://i.pinimg.com/originals/second.jpg"}}}}
                ]}
            ]}
        }));
        let set = pin_candidates(&data, StoryPinPolicy::Cover).unwrap();
        let selection = set.select(QualityFloor::Original).unwrap();
        assert_eq!(selection.best.url, "https://i.pinimg.com/originals/first.jpg");
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_story_pin_reject() {
        let data = pin(json!({
            "id": "3",
            "story_pin_data": {"pages": [{"blocks": [{"image": {"images": {"originals": {"url": "https://i.pinimg.com/originals/x.jpg"}}}}]}]}
        }));
        assert!(matches!(
            pin_candidates(&data, StoryPinPolicy::Reject),
            Err(Error::Rejected(_))
        ));
    }

    #[test]
    fn test_find_pin_object_in_nested_state() {
        let state = json!({
            "props": {"initialReduxState": {"pins": {
                "10": {"id": "10", "images": {"orig": {"url": "https://i.pinimg.com/originals/other.jpg"}}},
                "11": {"id": "11", "images": {"orig": {"url": "https://i.pinimg.com/originals/mine.jpg"}}}
            }, "users": [{"id": "11", "username": "not-a-pin"}]}}
        });
        let object = find_pin_object(&state, "11").unwrap();
        assert_eq!(object["images"]["orig"]["url"], "https://i.pinimg.com/originals/mine.jpg");
        assert!(find_pin_object(&state, "12").is_none());
    }
}
