//! Pin Resolver: an ordered chain of extraction strategies.
//!
//! Each strategy inspects one source of pin metadata (the pin-info endpoint,
//! embedded page state, JSON-LD, meta tags, oEmbed, a raw URL scan) and
//! either produces a [`MediaDescriptor`](crate::media::MediaDescriptor) or
//! passes to the next one.

pub mod markup;
pub mod pin_data;
pub mod resolver;
pub mod strategy;

pub use markup::{LdJsonStrategy, MetaTagStrategy, OembedStrategy, PatternScanStrategy};
pub use pin_data::{find_pin_object, pin_candidates, EmbeddedDataStrategy, PinApiStrategy};
pub use resolver::{default_strategies, PinResolver};
pub use strategy::{ExtractionStrategy, PinContext};
