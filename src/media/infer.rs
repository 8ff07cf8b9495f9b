//! URL and content-type inference helpers.

use std::sync::OnceLock;

use regex::Regex;
use url::Url;

use crate::media::item::MediaKind;

const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "webp", "gif", "bmp", "tif", "tiff", "avif",
];

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "webm", "m4v", "avi", "mkv", "3gp"];

/// Video containers that can be saved as a single progressive file.
const PROGRESSIVE_VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "mov", "m4v"];

const NON_MEDIA_EXTENSIONS: &[&str] = &["woff", "woff2", "ttf", "otf", "eot", "css", "js"];

/// Pinterest's image CDN host.
pub const PINIMG_HOST: &str = "i.pinimg.com";

/// `236x`, `736x`, `474x474` style size segments on pinimg paths.
pub(crate) fn size_segment_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d+)x(\d*)$").unwrap())
}

/// Whether `host` belongs to Pinterest's media CDN.
pub fn is_pinimg_host(host: &str) -> bool {
    let host = host.to_lowercase();
    host == PINIMG_HOST || host.ends_with(".pinimg.com")
}

/// Lowercased extension of the last path segment, without the dot.
fn path_extension(url: &Url) -> Option<String> {
    let filename = url.path_segments()?.next_back()?;
    let (_, ext) = filename.rsplit_once('.')?;

    // Validate it looks like an extension (1-10 chars, alphanumeric)
    if !ext.is_empty() && ext.len() <= 10 && ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        Some(ext.to_lowercase())
    } else {
        None
    }
}

/// Guess whether a URL points at an image or a video.
///
/// Known extensions win; extensionless pinimg paths under `originals/` or a
/// size segment are images, `/videos/` paths are videos. Anything else
/// (fonts, scripts, pages) is `None`.
pub fn infer_media_kind_from_url(url: &str) -> Option<MediaKind> {
    let parsed = Url::parse(url).ok()?;
    let path = parsed.path().to_lowercase();
    let ext = path_extension(&parsed);

    match ext.as_deref() {
        Some(e) if NON_MEDIA_EXTENSIONS.contains(&e) => return None,
        Some(e) if IMAGE_EXTENSIONS.contains(&e) => return Some(MediaKind::Image),
        Some(e) if VIDEO_EXTENSIONS.contains(&e) || e == "m3u8" => {
            return Some(MediaKind::Video)
        }
        _ => {}
    }
    if path.contains("/videos/") {
        return Some(MediaKind::Video);
    }

    if !parsed.host_str().map(is_pinimg_host).unwrap_or(false) {
        return None;
    }
    let first = path.split('/').find(|s| !s.is_empty())?;
    if first == "originals" || size_segment_re().is_match(first) {
        Some(MediaKind::Image)
    } else {
        None
    }
}

/// File extension carried by a media URL, if it is a known media extension.
///
/// `jpeg` is folded to `jpg`.
pub fn extension_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let ext = path_extension(&parsed)?;
    if ext == "jpeg" {
        return Some("jpg".to_string());
    }
    if IMAGE_EXTENSIONS.contains(&ext.as_str()) || VIDEO_EXTENSIONS.contains(&ext.as_str()) {
        Some(ext)
    } else {
        None
    }
}

/// File extension for a response `Content-Type`.
///
/// Playlists (`mpegurl`) and non-media types yield `None`.
pub fn extension_for_content_type(content_type: &str) -> Option<String> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_lowercase();

    let preferred = match essence.as_str() {
        "image/jpeg" | "image/jpg" | "image/pjpeg" => Some("jpg"),
        "video/mp4" => Some("mp4"),
        "video/quicktime" => Some("mov"),
        _ => None,
    };
    if let Some(ext) = preferred {
        return Some(ext.to_string());
    }

    if !(essence.starts_with("image/") || essence.starts_with("video/")) {
        return None;
    }
    mime_guess::get_mime_extensions_str(&essence)?
        .iter()
        .find(|ext| IMAGE_EXTENSIONS.contains(*ext) || VIDEO_EXTENSIONS.contains(*ext))
        .map(|ext| ext.to_string())
}

/// Whether a video URL is a single downloadable file rather than a playlist.
pub fn is_playable_video(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    match path_extension(&parsed).as_deref() {
        Some(ext) => PROGRESSIVE_VIDEO_EXTENSIONS.contains(&ext),
        None => !parsed.path().to_lowercase().contains("hls"),
    }
}

/// Share cards and static site assets that are never pin media.
pub fn is_placeholder_image(url: &str) -> bool {
    let path = Url::parse(url)
        .map(|u| u.path().to_lowercase())
        .unwrap_or_else(|_| url.to_lowercase());

    path.contains("facebook_share_image")
        || path.contains("75x75_rs")
        || (path.contains("/images/") && !path.contains("/originals/"))
}

/// Clean up a URL found in markup or JSON and make it absolute.
///
/// Handles JSON-escaped slashes, HTML entities, protocol-relative and
/// relative URLs, and trailing punctuation picked up by pattern scans.
pub fn normalize_candidate(value: &str, base: &Url) -> Option<String> {
    let unescaped = value
        .trim()
        .replace("\\/", "/")
        .replace("\\u002F", "/")
        .replace("\\u0026", "&")
        .replace("&amp;", "&")
        .replace("&quot;", "\"");
    let trimmed = unescaped.trim_matches(|c: char| matches!(c, '"' | '\'' | ' ' | ')' | ','));
    if trimmed.is_empty() {
        return None;
    }

    let absolute = if let Some(rest) = trimmed.strip_prefix("//") {
        format!("https://{}", rest)
    } else {
        trimmed.to_string()
    };
    let joined = base.join(&absolute).ok()?;
    if joined.scheme() != "http" && joined.scheme() != "https" {
        return None;
    }
    joined.host_str()?;

    let mut url = joined.to_string();
    while url.ends_with(['.', ',', ';']) {
        url.pop();
    }
    Some(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_media_kind() {
        assert_eq!(
            infer_media_kind_from_url("https://i.pinimg.com/originals/ab/cd/ef.jpg"),
            Some(MediaKind::Image)
        );
        assert_eq!(
            infer_media_kind_from_url("https://v1.pinimg.com/videos/mc/720p/ab/cd.mp4"),
            Some(MediaKind::Video)
        );
        assert_eq!(
            infer_media_kind_from_url("https://v1.pinimg.com/videos/mc/hls/ab/cd.m3u8"),
            Some(MediaKind::Video)
        );
        assert_eq!(
            infer_media_kind_from_url("https://i.pinimg.com/736x/ab/cd/ef"),
            Some(MediaKind::Image)
        );
        assert_eq!(
            infer_media_kind_from_url("https://s.pinimg.com/webapp/fonts/x.woff2"),
            None
        );
        assert_eq!(infer_media_kind_from_url("https://example.com/page"), None);
        assert_eq!(infer_media_kind_from_url("not a url"), None);
    }

    #[test]
    fn test_extension_from_url() {
        assert_eq!(
            extension_from_url("https://example.com/file.jpg"),
            Some("jpg".to_string())
        );
        assert_eq!(
            extension_from_url("https://example.com/file.JPEG?token=abc"),
            Some("jpg".to_string())
        );
        assert_eq!(
            extension_from_url("https://example.com/path/to/file.PNG"),
            Some("png".to_string())
        );
        assert_eq!(extension_from_url("https://example.com/noext"), None);
        assert_eq!(extension_from_url("https://example.com/list.m3u8"), None);
    }

    #[test]
    fn test_extension_for_content_type() {
        assert_eq!(
            extension_for_content_type("image/jpeg; charset=binary"),
            Some("jpg".to_string())
        );
        assert_eq!(extension_for_content_type("image/png"), Some("png".to_string()));
        assert_eq!(extension_for_content_type("video/mp4"), Some("mp4".to_string()));
        assert_eq!(extension_for_content_type("text/html"), None);
        assert_eq!(
            extension_for_content_type("application/vnd.apple.mpegurl"),
            None
        );
    }

    #[test]
    fn test_playable_video() {
        assert!(is_playable_video("https://v1.pinimg.com/videos/720p/a.mp4"));
        assert!(!is_playable_video("https://v1.pinimg.com/videos/hls/a.m3u8"));
        assert!(!is_playable_video("::"));
    }

    #[test]
    fn test_placeholder_images() {
        assert!(is_placeholder_image(
            "https://s.pinimg.com/images/facebook_share_image.png"
        ));
        assert!(is_placeholder_image("https://s.pinimg.com/images/logo.png"));
        assert!(is_placeholder_image("https://i.pinimg.com/75x75_rs/a/b/c.jpg"));
        assert!(!is_placeholder_image("https://i.pinimg.com/originals/a/b/c.jpg"));
    }

    #[test]
    fn test_normalize_candidate() {
        let base = Url::parse("https://www.pinterest.com/pin/1/").unwrap();
        assert_eq!(
            normalize_candidate(r"https:\/\/i.pinimg.com\/736x\/a.jpg", &base).as_deref(),
            Some("https://i.pinimg.com/736x/a.jpg")
        );
        assert_eq!(
            normalize_candidate("//i.pinimg.com/originals/a.jpg.", &base).as_deref(),
            Some("https://i.pinimg.com/originals/a.jpg")
        );
        assert_eq!(
            normalize_candidate("/static/a.png", &base).as_deref(),
            Some("https://www.pinterest.com/static/a.png")
        );
        assert_eq!(normalize_candidate("javascript:void(0)", &base), None);
        assert_eq!(normalize_candidate("  ", &base), None);
    }
}
