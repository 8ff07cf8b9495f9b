//! Link module for input classification.

pub mod classify;
pub mod pin;

pub use classify::{
    canonical_pin_url, canonical_profile_url, classify, extract_pin_id, is_pinterest_host,
    parse_link_lines, InputLink, LinkKind, LinkTarget,
};
pub use pin::PinReference;
