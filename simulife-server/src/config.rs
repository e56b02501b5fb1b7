//! Server configuration from environment variables.

use std::net::SocketAddr;
use thiserror::Error;

/// Errors reading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid listen address `{value}`: {source}")]
    InvalidAddr {
        value: String,
        source: std::net::AddrParseError,
    },
}

/// Runtime configuration for the backend.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen address.
    pub addr: SocketAddr,

    /// Story instance (the hosting platform's post id); scopes all
    /// persisted progress.
    pub story_instance: String,
}

impl ServerConfig {
    /// Read configuration from `SIMULIFE_ADDR` and `SIMULIFE_POST_ID`,
    /// with local-run defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw_addr =
            std::env::var("SIMULIFE_ADDR").unwrap_or_else(|_| "127.0.0.1:4000".to_string());
        let addr = raw_addr.parse().map_err(|source| ConfigError::InvalidAddr {
            value: raw_addr,
            source,
        })?;

        let story_instance =
            std::env::var("SIMULIFE_POST_ID").unwrap_or_else(|_| "local_post".to_string());

        Ok(Self {
            addr,
            story_instance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_local() {
        // Only meaningful when the env vars are unset, which is the normal
        // test environment.
        if std::env::var("SIMULIFE_ADDR").is_ok() || std::env::var("SIMULIFE_POST_ID").is_ok() {
            return;
        }
        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config.addr.port(), 4000);
        assert_eq!(config.story_instance, "local_post");
    }
}
