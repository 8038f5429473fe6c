use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Base URL is a non-empty http(s) URL
/// - Timeout and rate limit are positive
/// - Download pool has at least one worker
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let base_url = config.client.base_url.trim();
    if base_url.is_empty() {
        return Err(ConfigError::ValidationError(
            "client.base_url cannot be empty".to_string(),
        ));
    }
    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        return Err(ConfigError::ValidationError(format!(
            "client.base_url must be an http(s) URL, got {}",
            base_url
        )));
    }

    if config.client.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "client.timeout_secs cannot be 0".to_string(),
        ));
    }

    let rate = config.client.rate_limit_per_second;
    if rate.is_nan() || rate <= 0.0 {
        return Err(ConfigError::ValidationError(
            "client.rate_limit_per_second must be positive".to_string(),
        ));
    }

    if config.download.threads == 0 {
        return Err(ConfigError::ValidationError(
            "download.threads cannot be 0".to_string(),
        ));
    }

    Ok(())
}
