//! Pinterest API module.
//!
//! This module provides:
//! - HTTP client for the public Pinterest pages and endpoints
//! - Retry policy with exponential backoff
//! - API response types

pub mod client;
pub mod retry;
pub mod types;

pub use client::{Endpoints, FetchedPage, PinterestApi};
pub use retry::{RetryDecision, RetryPolicy};
pub use types::*;
