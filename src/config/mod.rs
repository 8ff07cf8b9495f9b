//! Configuration module for the pinterest-downloader.
//!
//! This module handles:
//! - Loading configuration from TOML files
//! - Media selection policies
//! - Configuration validation

pub mod loader;
pub mod modes;
pub mod validation;

pub use loader::{CollectorConfig, Config, DownloadConfig, NetworkConfig, ResolverConfig};
pub use modes::{QualityFloor, StoryPinPolicy};
pub use validation::validate_config;
