use super::{types::Config, AuthMethod, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Debrid API key is set
/// - Poll policy allows at least one attempt
/// - Scan interval and chunk size are not 0
/// - Library server port and credentials
/// - Feed identity fields
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.debrid.api_key.trim().is_empty() {
        return Err(invalid("debrid.api_key cannot be empty"));
    }

    if config.debrid.poll.max_attempts == 0 {
        return Err(invalid("debrid.poll.max_attempts cannot be 0"));
    }

    if config.pipeline.scan_interval_ms == 0 {
        return Err(invalid("pipeline.scan_interval_ms cannot be 0"));
    }

    if config.downloader.chunk_size == 0 {
        return Err(invalid("downloader.chunk_size cannot be 0"));
    }

    if let Some(server) = &config.library_server {
        if server.port == 0 {
            return Err(invalid("library_server.port cannot be 0"));
        }
        if server.auth.method == AuthMethod::Basic
            && (server.auth.username.is_none() || server.auth.password.is_none())
        {
            return Err(invalid(
                "library_server.auth requires username and password for basic auth",
            ));
        }
    }

    if let Some(feed) = &config.feed {
        if feed.url.is_empty() || feed.key.is_empty() || feed.id.is_empty() {
            return Err(invalid("feed requires url, key and id"));
        }
    }

    Ok(())
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::ValidationError(message.to_string())
}
