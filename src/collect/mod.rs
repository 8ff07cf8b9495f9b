//! Profile Collector: cursor pagination over a profile's public pins.

pub mod collection;
pub mod source;

pub use collection::{CollectStep, ProfileCollection, ProfileCollector, StopReason};
pub use source::{pins_from_rows, Cursor, Page, PageSource, PinterestProfileSource, END_MARKER};
