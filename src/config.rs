//! Player configuration
//!
//! Timing and range settings for the playback coordinator, stored as YAML.
//! A missing or unreadable file falls back to defaults.

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Upper bounds keeping every derived `Instant` arithmetic in range.
const MAX_DELAY_MS: u64 = 60_000;
const MAX_TIMEOUT_SECS: u64 = 600;
const MAX_URL_TTL_SECS: u64 = 7 * 24 * 3600;

/// Playback coordinator settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Transport telemetry poll interval in milliseconds.
    /// Default: 50 ms
    pub poll_interval_ms: u64,

    /// Delay between a segment ending and the next one loading.
    /// Default: 500 ms
    pub auto_advance_delay_ms: u64,

    /// How long a handle may stay in the loading phase before it is failed.
    /// Default: 15 s
    pub load_timeout_secs: u64,

    /// Skip offset of the full player, in seconds
    pub skip_full_secs: f64,

    /// Skip offset of the compact editor player, in seconds
    pub skip_compact_secs: f64,

    pub min_playback_rate: f64,
    pub max_playback_rate: f64,

    /// Lifetime requested for freshly signed urls
    pub signed_url_ttl_secs: u64,

    /// Number of resolved signed urls kept in memory
    pub url_cache_capacity: usize,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 50,
            auto_advance_delay_ms: 500,
            load_timeout_secs: 15,
            skip_full_secs: 10.0,
            skip_compact_secs: 5.0,
            min_playback_rate: 0.5,
            max_playback_rate: 2.0,
            signed_url_ttl_secs: 3600,
            url_cache_capacity: 64,
        }
    }
}

impl PlayerConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn auto_advance_delay(&self) -> Duration {
        Duration::from_millis(self.auto_advance_delay_ms)
    }

    pub fn load_timeout(&self) -> Duration {
        Duration::from_secs(self.load_timeout_secs)
    }

    pub fn signed_url_ttl(&self) -> Duration {
        Duration::from_secs(self.signed_url_ttl_secs)
    }

    /// Rejects values the coordinator cannot work with.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.poll_interval_ms > 0 && self.poll_interval_ms <= MAX_DELAY_MS,
            "poll_interval_ms must be in 1..={}",
            MAX_DELAY_MS
        );
        ensure!(
            self.auto_advance_delay_ms <= MAX_DELAY_MS,
            "auto_advance_delay_ms must be at most {}",
            MAX_DELAY_MS
        );
        ensure!(
            self.load_timeout_secs > 0 && self.load_timeout_secs <= MAX_TIMEOUT_SECS,
            "load_timeout_secs must be in 1..={}",
            MAX_TIMEOUT_SECS
        );
        ensure!(
            self.signed_url_ttl_secs > 0 && self.signed_url_ttl_secs <= MAX_URL_TTL_SECS,
            "signed_url_ttl_secs must be in 1..={}",
            MAX_URL_TTL_SECS
        );
        for (name, secs) in [
            ("skip_full_secs", self.skip_full_secs),
            ("skip_compact_secs", self.skip_compact_secs),
        ] {
            ensure!(secs.is_finite() && secs > 0.0, "{} must be > 0", name);
        }
        ensure!(
            self.min_playback_rate.is_finite()
                && self.max_playback_rate.is_finite()
                && self.min_playback_rate > 0.0
                && self.min_playback_rate <= self.max_playback_rate,
            "playback rate range {}..{} is invalid",
            self.min_playback_rate,
            self.max_playback_rate
        );
        ensure!(self.url_cache_capacity > 0, "url_cache_capacity must be > 0");
        Ok(())
    }

    /// Returns `self` if valid, otherwise the defaults.
    pub fn or_default_if_invalid(self) -> Self {
        match self.validate() {
            Ok(()) => self,
            Err(e) => {
                log::warn!("PlayerConfig: {}, using defaults", e);
                Self::default()
            }
        }
    }

    /// Load the config from a YAML file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        log::info!("PlayerConfig::load: Loading from {:?}", path);

        if !path.exists() {
            log::info!("PlayerConfig::load: Config file doesn't exist, using defaults");
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_yaml::from_str::<Self>(&contents) {
                Ok(config) => config.or_default_if_invalid(),
                Err(e) => {
                    log::warn!("PlayerConfig::load: Failed to parse config: {}, using defaults", e);
                    Self::default()
                }
            },
            Err(e) => {
                log::warn!(
                    "PlayerConfig::load: Failed to read config file: {}, using defaults",
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the config as YAML, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }
        let yaml = serde_yaml::to_string(self).context("Failed to serialize config to YAML")?;
        std::fs::write(path, yaml)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_nonexistent_returns_default() {
        let config = PlayerConfig::load(Path::new("/nonexistent/path/player.yaml"));
        assert_eq!(config, PlayerConfig::default());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("player.yaml");
        std::fs::write(&path, "poll_interval_ms: 100\n").unwrap();

        let config = PlayerConfig::load(&path);
        assert_eq!(config.poll_interval_ms, 100);
        assert_eq!(config.skip_full_secs, 10.0);
        assert_eq!(config.max_playback_rate, 2.0);
    }

    #[test]
    fn test_invalid_yaml_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("player.yaml");
        std::fs::write(&path, "poll_interval_ms: [not a number").unwrap();

        assert_eq!(PlayerConfig::load(&path), PlayerConfig::default());
    }

    #[test]
    fn test_out_of_range_values_fall_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("player.yaml");
        std::fs::write(&path, "min_playback_rate: 3.0\nmax_playback_rate: 2.0\n").unwrap();
        assert_eq!(PlayerConfig::load(&path), PlayerConfig::default());

        std::fs::write(&path, "signed_url_ttl_secs: 18446744073709551615\n").unwrap();
        assert_eq!(PlayerConfig::load(&path), PlayerConfig::default());
    }

    #[test]
    fn test_validate() {
        assert!(PlayerConfig::default().validate().is_ok());
        let nan_rate = PlayerConfig {
            max_playback_rate: f64::NAN,
            ..PlayerConfig::default()
        };
        assert!(nan_rate.validate().is_err());
        let no_cache = PlayerConfig {
            url_cache_capacity: 0,
            ..PlayerConfig::default()
        };
        assert!(no_cache.validate().is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("player.yaml");
        let config = PlayerConfig {
            load_timeout_secs: 30,
            ..PlayerConfig::default()
        };

        config.save(&path).unwrap();
        assert_eq!(PlayerConfig::load(&path), config);
    }
}
