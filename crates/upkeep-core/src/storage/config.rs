//! TOML-based application configuration.
//!
//! Stores the reminder timing knobs, the background-notification
//! behavior, and update-source settings. Stored at
//! `~/.config/upkeep/config.toml`.
//!
//! User-facing suppression state (dismissed versions, snoozes, style)
//! lives in [`super::ReminderState`], not here: config describes how
//! the machine behaves, state describes what the user did.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::data_dir;
use crate::error::{ConfigError, CoreError};
use crate::notify::BackgroundBehavior;
use crate::reminder::ReminderTiming;

/// Background-channel configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackgroundConfig {
    #[serde(default)]
    pub behavior: BackgroundBehavior,
}

/// Update-source configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// URL of the remote update manifest. Unset disables the remote check.
    #[serde(default)]
    pub manifest_url: Option<String>,
    /// Whether the locally staged `UPDATE.txt` feed is consulted.
    #[serde(default)]
    pub feed_enabled: bool,
    /// How often the local feed is re-read.
    #[serde(default = "default_feed_refresh_ms")]
    pub feed_refresh_ms: u64,
    /// How often the remote manifest is re-checked.
    #[serde(default = "default_remote_check_ms")]
    pub remote_check_ms: u64,
}

fn default_feed_refresh_ms() -> u64 {
    60 * 1000
}
fn default_remote_check_ms() -> u64 {
    60 * 60 * 1000
}
fn default_true() -> bool {
    true
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            manifest_url: None,
            feed_enabled: false,
            feed_refresh_ms: default_feed_refresh_ms(),
            remote_check_ms: default_remote_check_ms(),
        }
    }
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/upkeep/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Whether the remote check runs at all.
    #[serde(default = "default_true")]
    pub auto_check: bool,
    #[serde(default)]
    pub timing: ReminderTiming,
    #[serde(default)]
    pub background: BackgroundConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            auto_check: true,
            timing: ReminderTiming::default(),
            background: BackgroundConfig::default(),
            sources: SourcesConfig::default(),
        }
    }
}

impl Config {
    fn path() -> Result<PathBuf, CoreError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or return default (writing the default file).
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, CoreError> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| {
                    CoreError::Config(ConfigError::LoadFailed {
                        path,
                        message: e.to_string(),
                    })
                })?;
                Ok(cfg)
            }
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written.
    pub fn save(&self) -> Result<(), CoreError> {
        let path = Self::path()?;
        let content = toml::to_string_pretty(self).map_err(|e| {
            CoreError::Config(ConfigError::SaveFailed {
                path: path.clone(),
                message: e.to_string(),
            })
        })?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    /// Load from disk, returning default on error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let mut current = &json;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        match current {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by dot-separated key and persist.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be
    /// parsed as the existing field's type, or the save fails.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), CoreError> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_path(&mut json, key, value)?;
        *self = serde_json::from_value(json)?;
        self.save()?;
        Ok(())
    }

    fn set_json_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let (parents, leaf) = match key.rsplit_once('.') {
            Some((p, l)) => (Some(p), l),
            None => (None, key),
        };
        if leaf.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        if let Some(parents) = parents {
            for part in parents.split('.') {
                current = current.get_mut(part).ok_or_else(unknown)?;
            }
        }
        let obj = current.as_object_mut().ok_or_else(unknown)?;
        let existing = obj.get(leaf).ok_or_else(unknown)?;

        let new_value = match existing {
            serde_json::Value::Bool(_) => serde_json::Value::Bool(
                value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
            ),
            serde_json::Value::Number(_) => {
                let n = value.parse::<u64>().map_err(|e| invalid(e.to_string()))?;
                serde_json::Value::Number(n.into())
            }
            serde_json::Value::Null | serde_json::Value::String(_) => {
                serde_json::Value::String(value.to_string())
            }
            _ => return Err(invalid("cannot set structured values".to_string())),
        };

        obj.insert(leaf.to_string(), new_value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
        assert_eq!(parsed.timing.first_delay_ms, 10 * 60 * 1000);
        assert_eq!(parsed.timing.cadence_ms, 24 * 60 * 60 * 1000);
        assert!(!parsed.sources.feed_enabled);
    }

    #[test]
    fn empty_file_parses_to_defaults() {
        let parsed: Config = toml::from_str("").unwrap();
        assert!(parsed.auto_check);
        assert_eq!(parsed.timing.min_reschedule_ms, 5_000);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("auto_check").as_deref(), Some("true"));
        assert_eq!(cfg.get("timing.cadence_ms").as_deref(), Some("86400000"));
        assert_eq!(cfg.get("background.behavior").as_deref(), Some("notification"));
        assert!(cfg.get("timing.missing").is_none());
    }

    #[test]
    fn set_json_path_updates_nested_number() {
        let mut json = serde_json::to_value(Config::default()).unwrap();
        Config::set_json_path(&mut json, "timing.cadence_ms", "1000").unwrap();
        let parsed: Config = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.timing.cadence_ms, 1000);
    }

    #[test]
    fn set_json_path_updates_top_level_bool() {
        let mut json = serde_json::to_value(Config::default()).unwrap();
        Config::set_json_path(&mut json, "auto_check", "false").unwrap();
        let parsed: Config = serde_json::from_value(json).unwrap();
        assert!(!parsed.auto_check);
    }

    #[test]
    fn set_json_path_fills_null_option_with_string() {
        let mut json = serde_json::to_value(Config::default()).unwrap();
        Config::set_json_path(&mut json, "sources.manifest_url", "https://example.com/u.json")
            .unwrap();
        let parsed: Config = serde_json::from_value(json).unwrap();
        assert_eq!(
            parsed.sources.manifest_url.as_deref(),
            Some("https://example.com/u.json")
        );
    }

    #[test]
    fn set_json_path_rejects_unknown_key() {
        let mut json = serde_json::to_value(Config::default()).unwrap();
        assert!(Config::set_json_path(&mut json, "timing.bogus", "1").is_err());
        assert!(Config::set_json_path(&mut json, "nope", "1").is_err());
    }

    #[test]
    fn set_json_path_rejects_invalid_type() {
        let mut json = serde_json::to_value(Config::default()).unwrap();
        assert!(Config::set_json_path(&mut json, "auto_check", "not_a_bool").is_err());
        assert!(Config::set_json_path(&mut json, "timing.cadence_ms", "soon").is_err());
    }
}
