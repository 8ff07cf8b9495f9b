//! Command-line argument definitions using clap.

use clap::{Parser, ValueEnum};
use std::io::Read;
use std::path::PathBuf;

use crate::config::{Config, QualityFloor, StoryPinPolicy};
use crate::error::Result;
use crate::links::parse_link_lines;

/// Pinterest media downloader CLI.
#[derive(Parser, Debug)]
#[command(
    name = "pinterest-downloader",
    version,
    about = "Download original-quality media from Pinterest pins and profiles",
    long_about = "A CLI tool to download the highest-quality image or video behind Pinterest links.\n\n\
                  Pin links download one file each; profile links are expanded into all of the\n\
                  profile's public pins."
)]
pub struct Args {
    /// Pin or profile links to download.
    pub urls: Vec<String>,

    /// Read additional links from a file, one per line ("-" for stdin).
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Destination directory for downloads.
    #[arg(short = 'd', long = "directory")]
    pub download_directory: Option<PathBuf>,

    /// Path to configuration file.
    #[arg(short, long, default_value = "pinterest-downloader.toml")]
    pub config: PathBuf,

    /// Browser user agent string.
    #[arg(short = 'a', long = "user-agent", env = "PINTEREST_USER_AGENT")]
    pub user_agent: Option<String>,

    /// Per-request timeout in seconds.
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Retries after the first attempt for transient failures.
    #[arg(long)]
    pub retries: Option<u32>,

    /// Base retry backoff in milliseconds.
    #[arg(long = "backoff-ms")]
    pub backoff_ms: Option<u64>,

    /// Maximum pagination pages per profile.
    #[arg(long = "max-pages")]
    pub max_pages: Option<u32>,

    /// Maximum pins taken from each profile (0 = unlimited).
    #[arg(long = "max-pins")]
    pub max_pins: Option<usize>,

    /// Minimum spacing of progress updates in milliseconds.
    #[arg(long = "progress-ms")]
    pub progress_ms: Option<u64>,

    /// How to handle multi-page story pins.
    #[arg(long = "story-pins", value_enum)]
    pub story_pins: Option<StoryPinArg>,

    /// Lowest image quality to accept.
    #[arg(long, value_enum)]
    pub quality: Option<QualityArg>,

    /// Hide progress bars.
    #[arg(long, short)]
    pub quiet: bool,

    /// Enable debug logging.
    #[arg(long)]
    pub debug: bool,
}

/// CLI story pin policy argument.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StoryPinArg {
    /// Download the pin's cover media.
    Cover,
    /// Fail story pins.
    Reject,
}

impl From<StoryPinArg> for StoryPinPolicy {
    fn from(arg: StoryPinArg) -> Self {
        match arg {
            StoryPinArg::Cover => StoryPinPolicy::Cover,
            StoryPinArg::Reject => StoryPinPolicy::Reject,
        }
    }
}

/// CLI quality floor argument.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum QualityArg {
    /// Original-resolution images only.
    Original,
    /// Largest image available.
    BestAvailable,
}

impl From<QualityArg> for QualityFloor {
    fn from(arg: QualityArg) -> Self {
        match arg {
            QualityArg::Original => QualityFloor::Original,
            QualityArg::BestAvailable => QualityFloor::BestAvailable,
        }
    }
}

impl Args {
    /// Positional links followed by the lines of `--input`, in order.
    pub fn collect_links(&self) -> Result<Vec<String>> {
        let mut links: Vec<String> = self
            .urls
            .iter()
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .collect();

        if let Some(input) = &self.input {
            let text = if input.as_os_str() == "-" {
                let mut buffer = String::new();
                std::io::stdin().read_to_string(&mut buffer)?;
                buffer
            } else {
                std::fs::read_to_string(input)?
            };
            links.extend(parse_link_lines(&text));
        }

        Ok(links)
    }

    /// Merge CLI arguments into an existing config, overriding where specified.
    pub fn merge_into_config(&self, config: &mut Config) {
        if let Some(dir) = &self.download_directory {
            config.download.directory = Some(dir.clone());
        }

        if let Some(user_agent) = &self.user_agent {
            config.network.user_agent = user_agent.clone();
        }

        if let Some(timeout) = self.timeout {
            config.network.request_timeout_seconds = timeout;
        }

        if let Some(retries) = self.retries {
            config.network.max_retries = retries;
        }

        if let Some(backoff) = self.backoff_ms {
            config.network.retry_backoff_ms = backoff;
        }

        if let Some(pages) = self.max_pages {
            config.collector.max_pages = pages;
        }

        if let Some(pins) = self.max_pins {
            config.collector.max_pins = pins;
        }

        if let Some(interval) = self.progress_ms {
            config.download.progress_interval_ms = interval;
        }

        if let Some(policy) = self.story_pins {
            config.resolver.story_pins = policy.into();
        }

        if let Some(quality) = self.quality {
            config.resolver.quality = quality.into();
        }
    }
}
