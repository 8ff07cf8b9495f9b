//! Media module: resolved media representation, URL inference and selection.

pub mod candidate;
pub mod infer;
pub mod item;

pub use candidate::{pinimg_original_variant, CandidateSet, MediaCandidate, Selection};
pub use infer::{
    extension_for_content_type, extension_from_url, infer_media_kind_from_url, is_pinimg_host,
    is_placeholder_image, is_playable_video, normalize_candidate,
};
pub use item::{MediaDescriptor, MediaKind};
