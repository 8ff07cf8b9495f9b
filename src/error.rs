//! Error types for the pinterest-downloader application.

use std::fmt;

use thiserror::Error;

/// Main error type for the application.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration value for '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // Input errors
    #[error("Not a Pinterest pin or profile link: {0}")]
    InvalidLink(String),

    // Network errors
    #[error("HTTP {status} fetching {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Timed out waiting for {0}")]
    Timeout(String),

    #[error("Request to {url} failed after {attempts} attempt(s): {message}")]
    Network {
        url: String,
        attempts: u32,
        message: String,
    },

    // Resolution errors
    #[error("Could not resolve media: {0}")]
    Resolution(String),

    #[error("Pin rejected: {0}")]
    Rejected(String),

    // Download errors
    #[error("Download failed: {0}")]
    Download(String),

    #[error("Size mismatch: expected {expected} bytes, wrote {actual}")]
    SizeMismatch { expected: u64, actual: u64 },

    #[error("Cancelled")]
    Cancelled,

    // File system errors
    #[error("Invalid filename (path traversal attempt): {0}")]
    InvalidFilename(String),

    #[error("Destination folder unusable: {0}")]
    Destination(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // HTTP errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    // URL parsing errors
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Failure categories surfaced on queue items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Input was not a recognisable pin or profile link. Never retried.
    InvalidLink,
    /// A fetch failed permanently or exhausted its retries.
    NetworkError,
    /// The pin page held no usable high-quality media.
    ResolutionFailed,
    /// Transfer or disk write failed; the partial file was removed.
    DownloadError,
    /// The run was cancelled before the item started.
    Cancelled,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::InvalidLink => write!(f, "invalid link"),
            ErrorKind::NetworkError => write!(f, "network error"),
            ErrorKind::ResolutionFailed => write!(f, "resolution failed"),
            ErrorKind::DownloadError => write!(f, "download error"),
            ErrorKind::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl Error {
    /// Map this error onto the item failure taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidLink(_) | Error::UrlParse(_) => ErrorKind::InvalidLink,
            Error::HttpStatus { .. }
            | Error::Network { .. }
            | Error::Timeout(_)
            | Error::Http(_) => ErrorKind::NetworkError,
            Error::Resolution(_) | Error::Rejected(_) | Error::Json(_) => {
                ErrorKind::ResolutionFailed
            }
            Error::Cancelled => ErrorKind::Cancelled,
            Error::Download(_)
            | Error::SizeMismatch { .. }
            | Error::InvalidFilename(_)
            | Error::Destination(_)
            | Error::Io(_)
            | Error::Config(_)
            | Error::ConfigValidation { .. }
            | Error::TomlParse(_) => ErrorKind::DownloadError,
        }
    }

    /// Whether the failure is worth retrying at the fetch layer.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::HttpStatus { status, .. } => is_transient_status(*status),
            Error::Timeout(_) => true,
            Error::Http(e) => e.is_timeout() || e.is_connect() || e.is_request() || e.is_body(),
            _ => false,
        }
    }
}

/// 5xx, 408 and 429 are worth another attempt; every other status is final.
pub fn is_transient_status(status: u16) -> bool {
    matches!(status, 408 | 429) || (500..600).contains(&status)
}

/// Exit codes for the CLI.
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const ABORT: i32 = 1;
    pub const NETWORK_ERROR: i32 = 2;
    pub const CONFIG_ERROR: i32 = 3;
    pub const DOWNLOAD_ERROR: i32 = 4;
    pub const UNEXPECTED_ERROR: i32 = 5;
}
