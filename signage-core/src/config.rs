use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, env, fs, path::PathBuf};

use crate::{model::Coordinate, provider::ProviderId, time::LocalTimeConversion};

/// Process environment variable holding the rainfall provider's API key.
pub const RAINFALL_API_KEY_ENV: &str = "YAHOO_CLIENT_ID";

/// Overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "SIGNAGE_CONFIG";

/// Proxy base URL baked in at build time, if any.
const BUILD_PROXY_URL: Option<&str> = option_env!("SIGNAGE_PROXY_URL");

const DEFAULT_PROXY_URL: &str = "http://127.0.0.1:8080";
const DEFAULT_BIND: &str = "0.0.0.0:8080";

/// Per-provider settings (API key, endpoint override).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Replaces the provider's public endpoint, e.g. to point at a mock.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProxySettings {
    /// Address `signage serve` listens on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind: Option<String>,

    /// Where the dashboard stores reach the proxy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SunSettings {
    /// Offset the sunrise/sunset times are shown in.
    pub utc_offset: String,
}

impl Default for SunSettings {
    fn default() -> Self {
        Self { utc_offset: "+09:00".to_string() }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// [location]
/// latitude = 35.72748611
/// longitude = 140.05344722
///
/// [providers.rainfall]
/// api_key = "..."
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub location: Coordinate,

    #[serde(default)]
    pub proxy: ProxySettings,

    #[serde(default)]
    pub sun: SunSettings,

    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

impl Config {
    /// Load config from disk (or defaults on first run), then apply the environment.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        let mut cfg = Self::load_from(&path)?;
        cfg.apply_env(|key| env::var(key).ok());
        Ok(cfg)
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file, honouring `SIGNAGE_CONFIG`.
    pub fn config_file_path() -> Result<PathBuf> {
        if let Ok(path) = env::var(CONFIG_PATH_ENV) {
            return Ok(PathBuf::from(path));
        }

        let dirs = ProjectDirs::from("dev", "signage", "signage")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Overlay values from the process environment. `lookup` is injectable for tests.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup(RAINFALL_API_KEY_ENV).filter(|k| !k.trim().is_empty()) {
            self.providers.entry(ProviderId::Rainfall.as_str().to_string()).or_default().api_key =
                Some(key);
        }
    }

    pub fn provider_config(&self, id: ProviderId) -> Option<&ProviderConfig> {
        self.providers.get(id.as_str())
    }

    /// Set or replace a provider's API key.
    pub fn upsert_provider_api_key(&mut self, id: ProviderId, api_key: String) {
        self.providers.entry(id.as_str().to_string()).or_default().api_key = Some(api_key);
    }

    /// Returns API key for a provider, if present.
    pub fn provider_api_key(&self, id: ProviderId) -> Option<&str> {
        self.provider_config(id).and_then(|cfg| cfg.api_key.as_deref())
    }

    pub fn provider_base_url(&self, id: ProviderId) -> Option<&str> {
        self.provider_config(id).and_then(|cfg| cfg.base_url.as_deref())
    }

    pub fn is_provider_configured(&self, id: ProviderId) -> bool {
        !id.requires_api_key() || self.provider_api_key(id).is_some()
    }

    pub fn bind_addr(&self) -> &str {
        self.proxy.bind.as_deref().unwrap_or(DEFAULT_BIND)
    }

    /// Proxy base URL: config file, then the build-time value, then localhost.
    pub fn proxy_base_url(&self) -> &str {
        self.proxy.base_url.as_deref().or(BUILD_PROXY_URL).unwrap_or(DEFAULT_PROXY_URL)
    }

    pub fn sun_conversion(&self) -> Result<LocalTimeConversion> {
        LocalTimeConversion::parse(&self.sun.utc_offset)
    }
}
