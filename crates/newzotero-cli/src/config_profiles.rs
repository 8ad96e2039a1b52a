//! Persistent CLI profile configuration.
//!
//! Each profile remembers the backend origin and the logged-in user ID.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use newzotero_core::session::{Session, SessionStore};
use newzotero_core::util::normalize_text_option;
use serde::{Deserialize, Serialize};

const CONFIG_FILE_NAME: &str = "cli-config.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CliProfilesConfig {
    #[serde(default = "default_config_version")]
    pub version: u32,
    #[serde(default)]
    pub active_profile: Option<String>,
    #[serde(default)]
    pub profiles: BTreeMap<String, CliProfile>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CliProfile {
    #[serde(default)]
    pub server_url: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

const fn default_config_version() -> u32 {
    1
}

pub fn default_config_path() -> Result<PathBuf, String> {
    dirs::config_dir()
        .map(|dir| dir.join("newzotero").join(CONFIG_FILE_NAME))
        .ok_or_else(|| "Failed to resolve CLI config directory".to_string())
}

pub fn normalize_profile_name(value: Option<&str>) -> Option<String> {
    let value = value?;
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

impl CliProfilesConfig {
    pub fn load_from_path(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|error| format!("Failed to read config at {}: {}", path.display(), error))?;
        let mut config = serde_json::from_str::<Self>(&raw)
            .map_err(|error| format!("Failed to parse config at {}: {}", path.display(), error))?;
        config.normalize();
        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|error| {
                format!(
                    "Failed to create config directory {}: {}",
                    parent.display(),
                    error
                )
            })?;
        }

        let mut normalized = self.clone();
        normalized.normalize();
        let serialized = serde_json::to_string_pretty(&normalized)
            .map_err(|error| format!("Failed to serialize config: {error}"))?;
        std::fs::write(path, serialized)
            .map_err(|error| format!("Failed to write config at {}: {}", path.display(), error))
    }

    pub fn resolve_profile_name(&self, explicit: Option<&str>) -> String {
        self.resolve_profile_name_with_env(
            explicit,
            std::env::var("NEWZOTERO_PROFILE").ok().as_deref(),
        )
    }

    fn resolve_profile_name_with_env(
        &self,
        explicit: Option<&str>,
        env_profile: Option<&str>,
    ) -> String {
        normalize_profile_name(explicit)
            .or_else(|| normalize_profile_name(env_profile))
            .or_else(|| normalize_profile_name(self.active_profile.as_deref()))
            .unwrap_or_else(|| "default".to_string())
    }

    pub fn profile(&self, name: &str) -> Option<&CliProfile> {
        self.profiles.get(name)
    }

    pub fn profile_mut_or_default(&mut self, name: &str) -> &mut CliProfile {
        self.profiles.entry(name.to_string()).or_default()
    }

    fn normalize(&mut self) {
        self.active_profile = normalize_profile_name(self.active_profile.as_deref());
        for profile in self.profiles.values_mut() {
            profile.normalize();
        }
    }
}

impl CliProfile {
    pub fn server_url(&self) -> Option<String> {
        normalize_text_option(self.server_url.clone())
    }

    fn normalize(&mut self) {
        self.server_url = normalize_text_option(self.server_url.clone());
        self.username = normalize_text_option(self.username.clone());
    }
}

/// Stores the session of one profile in the config file.
#[derive(Debug, Clone)]
pub struct ProfileSessionStore {
    path: PathBuf,
    profile: String,
}

impl ProfileSessionStore {
    pub fn new(path: PathBuf, profile: impl Into<String>) -> Self {
        Self {
            path,
            profile: profile.into(),
        }
    }

    fn load_config(&self) -> newzotero_core::Result<CliProfilesConfig> {
        CliProfilesConfig::load_from_path(&self.path).map_err(newzotero_core::Error::Config)
    }

    fn save_config(&self, config: &CliProfilesConfig) -> newzotero_core::Result<()> {
        config
            .save_to_path(&self.path)
            .map_err(newzotero_core::Error::Config)
    }
}

impl SessionStore for ProfileSessionStore {
    fn load_session(&self) -> newzotero_core::Result<Option<Session>> {
        let config = self.load_config()?;
        config
            .profile(&self.profile)
            .and_then(|profile| profile.username.as_deref())
            .map(Session::login)
            .transpose()
    }

    fn save_session(&self, session: &Session) -> newzotero_core::Result<()> {
        let mut config = self.load_config()?;
        config.profile_mut_or_default(&self.profile).username =
            Some(session.username().to_string());
        config.active_profile = Some(self.profile.clone());
        self.save_config(&config)
    }

    fn clear_session(&self) -> newzotero_core::Result<()> {
        let mut config = self.load_config()?;
        if let Some(profile) = config.profiles.get_mut(&self.profile) {
            profile.username = None;
            self.save_config(&config)?;
        }
        Ok(())
    }
}
