use std::collections::HashMap;
use std::env;
use std::time::Duration;

use newzotero_core::config::normalize_server_url;
use thiserror::Error;

/// Default cap on an upload request body (50 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    /// Backend origin every `/api/...` request is forwarded to.
    pub server_url: String,
    pub upstream_timeout: Duration,
    /// Largest multipart body accepted by `/api/upload`.
    pub max_upload_bytes: usize,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let values: HashMap<String, String> = env::vars().collect();
        Self::from_lookup(|name| values.get(name).cloned())
    }

    pub(crate) fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let bind_addr = value_or_default(&lookup, "NEWZOTERO_API_BIND_ADDR", "127.0.0.1:3000");

        let server_url = normalize_server_url(optional_trimmed(&lookup, "SERVER_URL").as_deref())
            .map_err(|err| ConfigError::Invalid(err.to_string()))?;

        let timeout_secs = value_or_default(&lookup, "UPSTREAM_TIMEOUT_SECS", "60")
            .parse::<u64>()
            .map_err(|_| {
                ConfigError::Invalid(
                    "UPSTREAM_TIMEOUT_SECS must be an integer in [1, 600]".to_string(),
                )
            })?;
        if !(1..=600).contains(&timeout_secs) {
            return Err(ConfigError::Invalid(
                "UPSTREAM_TIMEOUT_SECS must be in [1, 600]".to_string(),
            ));
        }

        let max_upload_bytes = match optional_trimmed(&lookup, "MAX_UPLOAD_BYTES") {
            Some(value) => value
                .parse::<usize>()
                .ok()
                .filter(|bytes| *bytes > 0)
                .ok_or_else(|| {
                    ConfigError::Invalid("MAX_UPLOAD_BYTES must be a positive integer".to_string())
                })?,
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };

        Ok(Self {
            bind_addr,
            server_url,
            upstream_timeout: Duration::from_secs(timeout_secs),
            max_upload_bytes,
        })
    }
}

fn value_or_default(lookup: impl Fn(&str) -> Option<String>, name: &str, default: &str) -> String {
    optional_trimmed(lookup, name).unwrap_or_else(|| default.to_string())
}

fn optional_trimmed(lookup: impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name).and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(map: &HashMap<&str, &str>) -> Result<AppConfig, ConfigError> {
        AppConfig::from_lookup(|key| map.get(key).map(|value| (*value).to_string()))
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config_from(&HashMap::new()).unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:3000");
        assert_eq!(config.server_url, "http://localhost:5000");
        assert_eq!(config.upstream_timeout, Duration::from_secs(60));
        assert_eq!(config.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
    }

    #[test]
    fn max_upload_bytes_is_configurable() {
        let mut map = HashMap::new();
        map.insert("MAX_UPLOAD_BYTES", " 1048576 ");
        assert_eq!(config_from(&map).unwrap().max_upload_bytes, 1_048_576);

        map.insert("MAX_UPLOAD_BYTES", "0");
        let err = config_from(&map).unwrap_err();
        assert!(err.to_string().contains("MAX_UPLOAD_BYTES"));

        map.insert("MAX_UPLOAD_BYTES", "lots");
        assert!(config_from(&map).is_err());
    }

    #[test]
    fn server_url_drops_trailing_slash() {
        let mut map = HashMap::new();
        map.insert("SERVER_URL", " http://backend:5000/ ");
        assert_eq!(config_from(&map).unwrap().server_url, "http://backend:5000");
    }

    #[test]
    fn timeout_out_of_range_is_rejected() {
        let mut map = HashMap::new();
        map.insert("UPSTREAM_TIMEOUT_SECS", "0");
        let err = config_from(&map).unwrap_err();
        assert!(err.to_string().contains("UPSTREAM_TIMEOUT_SECS"));

        map.insert("UPSTREAM_TIMEOUT_SECS", "soon");
        assert!(config_from(&map).is_err());
    }

    #[test]
    fn non_http_server_url_is_rejected() {
        let mut map = HashMap::new();
        map.insert("SERVER_URL", "localhost:5000");
        assert!(config_from(&map).is_err());
    }
}
