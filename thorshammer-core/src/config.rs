use anyhow::{Context, Result, anyhow, bail};
use chrono::NaiveTime;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fs, path::PathBuf};

use crate::{
    collection::FlushPolicy, geocode::DEFAULT_USER_AGENT, model::Units, provider::ProviderId,
};

/// Value shipped in sample `.env` files; never a usable key.
pub const PLACEHOLDER_API_KEY: &str = "YOUR_DEFAULT_KEY_HERE";

/// Configuration for a single provider (e.g., API key).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub api_key: String,
}

/// When and where the daily backup is written.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackupConfig {
    /// Local wall-clock time, `HH:MM`.
    #[serde(with = "time_of_day")]
    pub at: NaiveTime,
    pub dir: PathBuf,
    pub policy: FlushPolicy,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            at: NaiveTime::from_hms_opt(23, 59, 0).unwrap_or_default(),
            dir: PathBuf::from("."),
            policy: FlushPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocoderConfig {
    pub user_agent: String,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self { user_agent: DEFAULT_USER_AGENT.to_string() }
    }
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Optional default provider id, "weatherbit" or "stormglass".
    pub default_provider: Option<String>,

    /// Unit system requested from Weatherbit.
    pub units: Units,

    pub backup: BackupConfig,

    pub geocoder: GeocoderConfig,

    /// Example TOML:
    /// [providers.weatherbit]
    /// api_key = "..."
    pub providers: HashMap<String, ProviderConfig>,
}

impl Config {
    /// Return the default provider as a strongly-typed ProviderId.
    ///
    /// Falls back to Weatherbit so an environment-only setup works without a
    /// config file.
    pub fn default_provider_id(&self) -> Result<ProviderId> {
        match self.default_provider.as_deref() {
            Some(s) => ProviderId::try_from(s),
            None => Ok(ProviderId::Weatherbit),
        }
    }

    pub fn provider_config(&self, id: ProviderId) -> Option<&ProviderConfig> {
        self.providers.get(id.as_str())
    }

    /// Store default provider as string.
    pub fn set_default_provider(&mut self, id: ProviderId) {
        self.default_provider = Some(id.as_str().to_string());
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "thorshammer", "thorshammer")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Convenience helper: set/replace a provider API key and optionally set default provider.
    pub fn upsert_provider_api_key(&mut self, provider_id: ProviderId, api_key: String) {
        self.providers.insert(provider_id.as_str().to_string(), ProviderConfig { api_key });

        if self.default_provider.is_none() {
            self.default_provider = Some(provider_id.to_string());
        }
    }

    /// Returns the API key stored in the config file, if present.
    pub fn provider_api_key(&self, provider_id: ProviderId) -> Option<&str> {
        self.provider_config(provider_id).map(|cfg| cfg.api_key.as_str())
    }

    /// API key for `id`, from its environment variable or else the config file.
    pub fn resolve_api_key(&self, id: ProviderId) -> Result<String> {
        self.resolve_api_key_with(id, |name| std::env::var(name).ok())
    }

    pub fn resolve_api_key_with(
        &self,
        id: ProviderId,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<String> {
        let var = id.api_key_env();
        let key = env(var)
            .filter(|v| !v.trim().is_empty())
            .or_else(|| self.provider_api_key(id).map(str::to_string))
            .map(|k| k.trim().to_string())
            .unwrap_or_default();

        if key.is_empty() {
            bail!(
                "No API key configured for provider '{id}'.\n\
                 Hint: set {var} or run `thorshammer configure {id}`."
            );
        }
        if key == PLACEHOLDER_API_KEY {
            bail!(
                "API key for provider '{id}' is still the placeholder value.\n\
                 Hint: set {var} to your actual key."
            );
        }

        Ok(key)
    }
}

mod time_of_day {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(time: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(d)?;
        crate::schedule::parse_time_of_day(&raw)
            .map_err(|e| D::Error::custom(format!("invalid time of day '{raw}': {e}")))
    }
}
