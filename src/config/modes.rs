//! Media selection policy definitions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How multi-page story pins are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoryPinPolicy {
    /// Download a single representative: the pin's own media, else the first page.
    #[default]
    Cover,
    /// Fail story pins with a resolution error.
    Reject,
}

impl fmt::Display for StoryPinPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoryPinPolicy::Cover => write!(f, "cover"),
            StoryPinPolicy::Reject => write!(f, "reject"),
        }
    }
}

impl FromStr for StoryPinPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cover" => Ok(StoryPinPolicy::Cover),
            "reject" => Ok(StoryPinPolicy::Reject),
            _ => Err(format!("Unknown story pin policy: {}", s)),
        }
    }
}

/// Lowest image quality the resolver accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QualityFloor {
    /// Only original-resolution images; thumbnail-only pins fail.
    #[default]
    Original,
    /// Largest image found, even when no original is exposed.
    BestAvailable,
}

impl fmt::Display for QualityFloor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QualityFloor::Original => write!(f, "original"),
            QualityFloor::BestAvailable => write!(f, "best-available"),
        }
    }
}

impl FromStr for QualityFloor {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "original" => Ok(QualityFloor::Original),
            "best-available" | "best" => Ok(QualityFloor::BestAvailable),
            _ => Err(format!("Unknown quality floor: {}", s)),
        }
    }
}
