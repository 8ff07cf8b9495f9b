//! Resolved media representation.

use std::fmt;

/// Type of media content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Extension used when neither the URL nor the response says otherwise.
    pub fn default_extension(&self) -> &'static str {
        match self {
            MediaKind::Image => "jpg",
            MediaKind::Video => "mp4",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Image => write!(f, "image"),
            MediaKind::Video => write!(f, "video"),
        }
    }
}

/// The single media file chosen for a pin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaDescriptor {
    /// Pin the media belongs to.
    pub pin_id: String,

    pub kind: MediaKind,

    /// Direct media URL.
    pub url: String,

    /// Lower-ranked URLs of the same kind, tried when `url` cannot be opened.
    pub alternates: Vec<String>,

    /// Every URL is an `/originals/` address guessed from a sized image.
    pub inferred_original: bool,

    /// Expected byte size, when upstream reported one.
    pub size_hint: Option<u64>,

    /// Reported dimensions in pixels.
    pub width: Option<u32>,
    pub height: Option<u32>,

    /// Filesystem-safe stem suggested for the file, without the pin id.
    pub base_name: String,

    /// Name of the extraction strategy that produced this descriptor.
    pub source: &'static str,
}

impl MediaDescriptor {
    /// Every URL worth trying, best first.
    pub fn urls(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.url.as_str()).chain(self.alternates.iter().map(String::as_str))
    }

    /// Resolution (width * height), 0 when unknown.
    pub fn resolution(&self) -> u64 {
        self.width.unwrap_or(0) as u64 * self.height.unwrap_or(0) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_extensions() {
        assert_eq!(MediaKind::Image.default_extension(), "jpg");
        assert_eq!(MediaKind::Video.default_extension(), "mp4");
    }

    #[test]
    fn test_urls_put_primary_first() {
        let descriptor = MediaDescriptor {
            pin_id: "1".into(),
            kind: MediaKind::Image,
            url: "https://i.pinimg.com/originals/a.jpg".into(),
            alternates: vec!["https://i.pinimg.com/736x/a.jpg".into()],
            inferred_original: false,
            size_hint: None,
            width: Some(20),
            height: Some(10),
            base_name: "pin".into(),
            source: "test",
        };
        let urls: Vec<&str> = descriptor.urls().collect();
        assert_eq!(
            urls,
            vec![
                "https://i.pinimg.com/originals/a.jpg",
                "https://i.pinimg.com/736x/a.jpg"
            ]
        );
        assert_eq!(descriptor.resolution(), 200);
    }
}
