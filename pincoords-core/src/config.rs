use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fs, path::PathBuf, time::Duration};

use crate::model::CoordinateEntry;
use crate::resolver::ResolverId;

/// Configuration for a single resolver (e.g., API key).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    pub api_key: String,
}

/// Fallback coordinate pair the lookup resolver substitutes when a pincode
/// is missing from its table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackConfig {
    pub latitude: f64,
    pub longitude: f64,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        // Mid-Atlantic, visibly outside the primary coverage area.
        Self { latitude: 35.0, longitude: -40.0 }
    }
}

impl FallbackConfig {
    pub fn coords(&self) -> CoordinateEntry {
        CoordinateEntry(self.latitude, self.longitude)
    }
}

/// Knobs for the remote geocoding service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocodingConfig {
    /// Base URL of the geocoding service.
    pub endpoint: String,

    /// Country filter applied to every query.
    pub countrycode: String,

    /// Pause between consecutive queries, in milliseconds.
    pub request_interval_ms: u64,
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.opencagedata.com".to_string(),
            countrycode: "in".to_string(),
            request_interval_ms: 1_000,
        }
    }
}

impl GeocodingConfig {
    pub fn request_interval(&self) -> Duration {
        Duration::from_millis(self.request_interval_ms)
    }
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Optional default resolver id, e.g. "lookup" or "remote".
    pub default_resolver: Option<String>,

    /// Example TOML:
    /// [resolvers.remote]
    /// api_key = "..."
    #[serde(default)]
    pub resolvers: HashMap<String, ResolverConfig>,

    #[serde(default)]
    pub geocoding: GeocodingConfig,

    #[serde(default)]
    pub fallback: FallbackConfig,
}

impl Config {
    /// Return the default resolver as a strongly-typed ResolverId.
    pub fn default_resolver_id(&self) -> Result<ResolverId> {
        let s = self.default_resolver.as_ref().ok_or_else(|| {
            anyhow!(
                "No default resolver configured.\n\
                 Hint: run `pincoords configure <resolver>` (e.g. `pincoords configure remote`) first."
            )
        })?;

        ResolverId::try_from(s.as_str())
    }

    /// Store default resolver as string.
    pub fn set_default_resolver(&mut self, id: ResolverId) {
        self.default_resolver = Some(id.as_str().to_string());
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

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
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
        let dirs = ProjectDirs::from("dev", "pincoords", "pincoords")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Convenience helper: set/replace a resolver API key and optionally set default resolver.
    pub fn upsert_resolver_api_key(&mut self, resolver_id: ResolverId, api_key: String) {
        self.resolvers.insert(resolver_id.as_str().to_string(), ResolverConfig { api_key });

        if self.default_resolver.is_none() {
            self.default_resolver = Some(resolver_id.to_string());
        }
    }

    /// Returns API key for a resolver, if present.
    pub fn resolver_api_key(&self, resolver_id: ResolverId) -> Option<&str> {
        self.resolvers.get(resolver_id.as_str()).map(|cfg| cfg.api_key.as_str())
    }

    pub fn is_resolver_configured(&self, resolver_id: ResolverId) -> bool {
        self.resolver_api_key(resolver_id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::ResolverId;

    #[test]
    fn default_knobs_cover_fallback_and_geocoding() {
        let cfg = Config::default();

        assert_eq!(cfg.fallback.coords(), CoordinateEntry(35.0, -40.0));
        assert_eq!(cfg.geocoding.countrycode, "in");
        assert_eq!(cfg.geocoding.request_interval(), Duration::from_millis(1_000));
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let cfg: Config = toml::from_str(
            "default_resolver = \"remote\"\n\n[resolvers.remote]\napi_key = \"KEY\"\n",
        )
        .expect("config should parse");

        let default = cfg.default_resolver_id().expect("default resolver must exist");
        assert_eq!(default, ResolverId::RemoteGeocode);
        assert_eq!(cfg.geocoding.endpoint, "https://api.opencagedata.com");
        assert_eq!(cfg.fallback.latitude, 35.0);
    }

    #[test]
    fn default_resolver_id_errors_when_not_set() {
        let cfg = Config::default();
        let err = cfg.default_resolver_id().unwrap_err();

        assert!(err.to_string().contains("No default resolver configured"));
    }

    #[test]
    fn set_api_key_and_default_for_resolver() {
        let mut cfg = Config::default();

        cfg.upsert_resolver_api_key(ResolverId::RemoteGeocode, "GEO_KEY".into());

        let default = cfg.default_resolver_id().expect("default resolver must exist");
        assert_eq!(default, ResolverId::RemoteGeocode);

        let key = cfg.resolver_api_key(ResolverId::RemoteGeocode);
        assert_eq!(key, Some("GEO_KEY"));
        assert!(cfg.is_resolver_configured(ResolverId::RemoteGeocode));
    }

    #[test]
    fn upsert_does_not_override_existing_default() {
        let mut cfg = Config::default();
        cfg.set_default_resolver(ResolverId::LocalLookup);

        cfg.upsert_resolver_api_key(ResolverId::RemoteGeocode, "GEO_KEY".into());

        let default = cfg.default_resolver_id().expect("default resolver must exist");
        assert_eq!(default, ResolverId::LocalLookup);
        assert!(cfg.is_resolver_configured(ResolverId::RemoteGeocode));
    }

    #[test]
    fn set_default_resolver_overrides_default() {
        let mut cfg = Config::default();

        cfg.upsert_resolver_api_key(ResolverId::RemoteGeocode, "GEO_KEY".into());
        let default = cfg.default_resolver_id().expect("default resolver must exist");
        assert_eq!(default, ResolverId::RemoteGeocode);

        cfg.set_default_resolver(ResolverId::LocalLookup);

        let default = cfg.default_resolver_id().expect("default resolver must exist");
        assert_eq!(default, ResolverId::LocalLookup);
    }
}
