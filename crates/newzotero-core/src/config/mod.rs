//! Backend endpoint configuration shared by the CLI and the gateway.

use std::collections::HashMap;
use std::env;

use crate::error::{Error, Result};
use crate::util::{is_http_url, normalize_text_option};

/// Backend origin used when nothing else is configured.
pub const DEFAULT_SERVER_URL: &str = "http://localhost:5000";

/// Public bibliographic registry used for DOI lookups.
pub const DEFAULT_CROSSREF_URL: &str = "https://api.crossref.org";

/// Endpoints a client talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Backend origin; every resource lives under `{server_url}/api/...`.
    pub server_url: String,
    /// Crossref API origin.
    pub crossref_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            crossref_url: DEFAULT_CROSSREF_URL.to_string(),
        }
    }
}

impl ClientConfig {
    /// Read `SERVER_URL` and `CROSSREF_API_URL` from the environment.
    pub fn from_env() -> Result<Self> {
        let values: HashMap<String, String> = env::vars().collect();
        Self::from_lookup(|name| values.get(name).cloned())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let server_url = normalize_server_url(
            normalize_text_option(lookup("SERVER_URL")).as_deref(),
        )?;
        let crossref_url = match normalize_text_option(lookup("CROSSREF_API_URL")) {
            Some(url) => normalize_origin(&url, "CROSSREF_API_URL")?,
            None => DEFAULT_CROSSREF_URL.to_string(),
        };
        Ok(Self {
            server_url,
            crossref_url,
        })
    }

    /// Replace the backend origin, keeping the other endpoints.
    #[must_use]
    pub fn with_server_url(mut self, server_url: String) -> Self {
        self.server_url = server_url;
        self
    }
}

/// Trim a backend origin and drop trailing slashes; `None` yields the default.
pub fn normalize_server_url(value: Option<&str>) -> Result<String> {
    match value.map(str::trim).filter(|value| !value.is_empty()) {
        Some(url) => normalize_origin(url, "SERVER_URL"),
        None => Ok(DEFAULT_SERVER_URL.to_string()),
    }
}

fn normalize_origin(value: &str, name: &str) -> Result<String> {
    let trimmed = value.trim().trim_end_matches('/');
    if !is_http_url(trimmed) {
        return Err(Error::Config(format!(
            "{name} must start with http:// or https://"
        )));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn defaults_apply_when_unset() {
        let map: HashMap<&str, &str> = HashMap::new();
        let config =
            ClientConfig::from_lookup(|key| map.get(key).map(|value| (*value).to_string()))
                .unwrap();
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn server_url_is_trimmed() {
        let mut map = HashMap::new();
        map.insert("SERVER_URL", "  https://notes.example.com/  ");
        let config =
            ClientConfig::from_lookup(|key| map.get(key).map(|value| (*value).to_string()))
                .unwrap();
        assert_eq!(config.server_url, "https://notes.example.com");
    }

    #[test]
    fn invalid_scheme_is_rejected() {
        let mut map = HashMap::new();
        map.insert("CROSSREF_API_URL", "api.crossref.org");
        let err = ClientConfig::from_lookup(|key| map.get(key).map(|value| (*value).to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("CROSSREF_API_URL"));
    }

    #[test]
    fn blank_server_url_falls_back_to_default() {
        assert_eq!(normalize_server_url(Some("   ")).unwrap(), DEFAULT_SERVER_URL);
    }
}
