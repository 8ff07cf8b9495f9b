//! Pin identity shared by the collector, the resolver and the queue.

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::links::classify::{canonical_pin_url, InputLink, LinkKind, LinkTarget};

/// A pin identified by its numeric id.
///
/// Two references with the same id name the same pin, whatever URL they were
/// discovered through.
#[derive(Debug, Clone)]
pub struct PinReference {
    pub id: String,
    /// URL the pin was discovered through (canonical permalink when unknown).
    pub source_url: String,
}

impl PartialEq for PinReference {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for PinReference {}

impl Hash for PinReference {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PinReference {
    /// Reference a pin by id, using its canonical permalink as the source.
    pub fn from_id(id: impl Into<String>) -> Self {
        let id = id.into();
        let source_url = canonical_pin_url(&id);
        Self { id, source_url }
    }

    pub fn with_source(id: impl Into<String>, source_url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source_url: source_url.into(),
        }
    }

    /// The pin as an already-classified input link.
    pub fn to_link(&self) -> InputLink {
        InputLink {
            raw: self.source_url.clone(),
            normalized: canonical_pin_url(&self.id),
            kind: LinkKind::Pin,
            target: LinkTarget::Pin {
                id: self.id.clone(),
            },
        }
    }
}

impl fmt::Display for PinReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pin {}", self.id)
    }
}
