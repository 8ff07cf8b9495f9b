//! Configuration validation logic.

use crate::config::loader::Config;
use crate::error::{Error, Result};

/// Minimum length for user agent.
const MIN_USER_AGENT_LENGTH: usize = 10;

/// Upper bound for the retry backoff base.
const MAX_BACKOFF_MS: u64 = 60_000;

/// Upper bound for retries per fetch.
const MAX_RETRIES: u32 = 10;

/// Validate the entire configuration.
pub fn validate_config(config: &Config) -> Result<()> {
    validate_user_agent(&config.network.user_agent)?;
    validate_network(config)?;
    validate_collector(config)?;

    Ok(())
}

/// Validate the user agent string.
pub fn validate_user_agent(user_agent: &str) -> Result<()> {
    if user_agent.trim().is_empty() {
        return Err(Error::ConfigValidation {
            field: "network.user_agent".to_string(),
            message: "User agent cannot be empty".to_string(),
        });
    }

    if user_agent.len() < MIN_USER_AGENT_LENGTH {
        return Err(Error::ConfigValidation {
            field: "network.user_agent".to_string(),
            message: format!(
                "User agent must be at least {} characters (got {})",
                MIN_USER_AGENT_LENGTH,
                user_agent.len()
            ),
        });
    }

    Ok(())
}

fn validate_network(config: &Config) -> Result<()> {
    let network = &config.network;

    if network.request_timeout_seconds == 0 {
        return Err(Error::ConfigValidation {
            field: "network.request_timeout_seconds".to_string(),
            message: "Timeout must be at least 1 second".to_string(),
        });
    }

    if network.max_retries > MAX_RETRIES {
        return Err(Error::ConfigValidation {
            field: "network.max_retries".to_string(),
            message: format!(
                "At most {} retries are allowed (got {})",
                MAX_RETRIES, network.max_retries
            ),
        });
    }

    if network.retry_backoff_ms > MAX_BACKOFF_MS {
        return Err(Error::ConfigValidation {
            field: "network.retry_backoff_ms".to_string(),
            message: format!(
                "Backoff base must not exceed {} ms (got {})",
                MAX_BACKOFF_MS, network.retry_backoff_ms
            ),
        });
    }

    Ok(())
}

fn validate_collector(config: &Config) -> Result<()> {
    if config.collector.max_pages == 0 {
        return Err(Error::ConfigValidation {
            field: "collector.max_pages".to_string(),
            message: "At least one page must be allowed per profile".to_string(),
        });
    }

    Ok(())
}
