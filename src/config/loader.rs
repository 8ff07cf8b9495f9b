//! Configuration structures and loading logic.

use crate::config::modes::{QualityFloor, StoryPinPolicy};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub collector: CollectorConfig,

    #[serde(default)]
    pub download: DownloadConfig,

    #[serde(default)]
    pub resolver: ResolverConfig,
}

/// HTTP behaviour shared by every fetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Browser user agent string.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub request_timeout_seconds: u64,

    /// Retries after the first attempt for transient failures.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base delay of the exponential backoff, in milliseconds.
    #[serde(default = "default_backoff_ms")]
    pub retry_backoff_ms: u64,
}

/// Profile pagination limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// Maximum number of pages fetched per profile.
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,

    /// Maximum number of pins taken from one profile (0 = unlimited).
    #[serde(default)]
    pub max_pins: usize,
}

/// Download behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Destination folder for downloaded media.
    #[serde(default)]
    pub directory: Option<PathBuf>,

    /// Minimum spacing between byte-progress events, in milliseconds.
    #[serde(default = "default_progress_interval")]
    pub progress_interval_ms: u64,
}

/// Media selection policy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// What to do with multi-page story pins.
    #[serde(default)]
    pub story_pins: StoryPinPolicy,

    /// Lowest image quality accepted.
    #[serde(default)]
    pub quality: QualityFloor,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            request_timeout_seconds: default_timeout(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_backoff_ms(),
        }
    }
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            max_pages: default_max_pages(),
            max_pins: 0,
        }
    }
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            directory: None,
            progress_interval_ms: default_progress_interval(),
        }
    }
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_backoff_ms() -> u64 {
    1000
}

fn default_max_pages() -> u32 {
    50
}

fn default_progress_interval() -> u64 {
    250
}

impl NetworkConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

impl DownloadConfig {
    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms)
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::Config(format!(
                    "Configuration file not found: {}",
                    path.display()
                ))
            } else {
                Error::Io(e)
            }
        })?;

        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Get the effective download directory.
    pub fn download_directory(&self) -> PathBuf {
        self.download
            .directory
            .clone()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_from_empty_file() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.network.request_timeout_seconds, 30);
        assert_eq!(config.network.max_retries, 3);
        assert_eq!(config.collector.max_pages, 50);
        assert_eq!(config.collector.max_pins, 0);
        assert_eq!(config.download.progress_interval_ms, 250);
        assert_eq!(config.resolver.story_pins, StoryPinPolicy::Cover);
        assert_eq!(config.resolver.quality, QualityFloor::Original);
    }

    #[test]
    fn test_partial_sections() {
        let config: Config = toml::from_str(
            r#"
            [network]
            max_retries = 5

            [collector]
            max_pages = 3

            [resolver]
            story_pins = "reject"
            quality = "best-available"
            "#,
        )
        .unwrap();
        assert_eq!(config.network.max_retries, 5);
        assert_eq!(config.network.retry_backoff_ms, 1000);
        assert_eq!(config.collector.max_pages, 3);
        assert_eq!(config.resolver.story_pins, StoryPinPolicy::Reject);
        assert_eq!(config.resolver.quality, QualityFloor::BestAvailable);
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.download.directory = Some(PathBuf::from("/tmp/pins"));
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.download.directory, Some(PathBuf::from("/tmp/pins")));
        assert_eq!(loaded.download_directory(), PathBuf::from("/tmp/pins"));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let result = Config::load(&dir.path().join("absent.toml"));
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
