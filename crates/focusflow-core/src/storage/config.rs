//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Default work and rest durations
//! - Tick granularity for the timer driver
//! - Whether notifications and app blocking are wanted
//! - Strict Mode settings (tone, challenge, enable/disable schedule)
//!
//! Configuration is stored at `~/.config/focusflow/config.toml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::ConfigError;
use crate::strict_mode::StrictModeSettings;

/// Timer defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerConfig {
    #[serde(default = "default_work_minutes")]
    pub work_minutes: u32,
    #[serde(default = "default_rest_minutes")]
    pub rest_minutes: u32,
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

/// Notification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// App blocking configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockingConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/focusflow/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub timer: TimerConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub blocking: BlockingConfig,
    #[serde(default)]
    pub strict_mode: StrictModeSettings,
    /// Fixed seed for challenge generation. Random when unset.
    #[serde(default)]
    pub rng_seed: Option<u64>,
}

/// `[strict_mode]` fields that are plain preferences. The rest (enabled,
/// enable time, scheduled disable) only move through the grace window and
/// delayed-disable rules.
const STRICT_MODE_PREFERENCES: [&str; 3] = ["tone", "challenge_type", "custom_phrase"];

// Default functions
fn default_work_minutes() -> u32 {
    25
}
fn default_rest_minutes() -> u32 {
    5
}
fn default_tick_interval_ms() -> u64 {
    100
}
fn default_true() -> bool {
    true
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            work_minutes: default_work_minutes(),
            rest_minutes: default_rest_minutes(),
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Default for BlockingConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        let n = value
                            .parse::<u64>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?;
                        serde_json::Value::Number(n.into())
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    // Optional fields (seed, custom phrase) are null until set.
                    serde_json::Value::Null => match value.parse::<u64>() {
                        Ok(n) => serde_json::Value::Number(n.into()),
                        Err(_) if value == "null" => serde_json::Value::Null,
                        Err(_) => serde_json::Value::String(value.into()),
                    },
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or return default (writing it out first).
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            Err(_) => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key in memory. Returns error if key is unknown,
    /// the value does not fit the field, or the key belongs to the Strict
    /// Mode lifecycle.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        if key == "strict_mode" {
            return Err(ConfigError::StrictModeManaged(key.to_string()));
        }
        if let Some(field) = key.strip_prefix("strict_mode.") {
            if !STRICT_MODE_PREFERENCES.contains(&field) {
                return Err(ConfigError::StrictModeManaged(key.to_string()));
            }
        }
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let mut json = serde_json::to_value(&*self).map_err(|e| invalid(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| invalid(e.to_string()))?;
        Ok(())
    }

    pub fn work_secs(&self) -> u64 {
        u64::from(self.timer.work_minutes) * 60
    }

    pub fn rest_secs(&self) -> u64 {
        u64::from(self.timer.rest_minutes) * 60
    }

    pub fn tick_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timer.tick_interval_ms.clamp(10, 1000))
    }

    /// Defaults for everything except `[strict_mode]`, which is carried over
    /// so a reset cannot skip the delayed disable.
    pub fn reset_keeping_strict_mode(&self) -> Self {
        Self {
            strict_mode: self.strict_mode.clone(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strict_mode::{ChallengeType, Tone};
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.timer.work_minutes, 25);
        assert!(!parsed.strict_mode.enabled);
    }

    #[test]
    fn empty_file_uses_defaults() {
        let parsed: Config = toml::from_str("").unwrap();
        assert_eq!(parsed.timer.rest_minutes, 5);
        assert_eq!(parsed.timer.tick_interval_ms, 100);
        assert!(parsed.notifications.enabled);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("timer.work_minutes").as_deref(), Some("25"));
        assert_eq!(cfg.get("strict_mode.tone").as_deref(), Some("neutral"));
        assert!(cfg.get("timer.missing_key").is_none());
    }

    #[test]
    fn set_updates_typed_fields() {
        let mut cfg = Config::default();
        cfg.set("timer.work_minutes", "50").unwrap();
        cfg.set("blocking.enabled", "false").unwrap();
        cfg.set("strict_mode.tone", "strict").unwrap();
        cfg.set("strict_mode.challenge_type", "holdButton").unwrap();
        assert_eq!(cfg.timer.work_minutes, 50);
        assert!(!cfg.blocking.enabled);
        assert_eq!(cfg.strict_mode.tone, Tone::Strict);
        assert_eq!(cfg.strict_mode.challenge_type, ChallengeType::HoldButton);
    }

    #[test]
    fn set_fills_optional_fields() {
        let mut cfg = Config::default();
        cfg.set("rng_seed", "42").unwrap();
        cfg.set("strict_mode.custom_phrase", "Back to work").unwrap();
        assert_eq!(cfg.rng_seed, Some(42));
        assert_eq!(cfg.strict_mode.custom_phrase.as_deref(), Some("Back to work"));
    }

    #[test]
    fn set_rejects_unknown_key_and_bad_value() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("timer.nonexistent", "1"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(cfg.set("timer.work_minutes", "soon").is_err());
        assert!(cfg.set("strict_mode.tone", "furious").is_err());
        assert_eq!(cfg.strict_mode.tone, Tone::Neutral);
    }

    #[test]
    fn set_refuses_strict_mode_lifecycle_fields() {
        let t0 = Utc.with_ymd_and_hms(2024, 6, 3, 8, 0, 0).unwrap();
        let mut cfg = Config::default();
        cfg.strict_mode.enable(t0);
        let later = t0 + Duration::hours(2);
        assert!(cfg.strict_mode.grace_remaining(later).is_none());

        for (key, value) in [
            ("strict_mode.enabled", "false"),
            ("strict_mode.enabled_at", "2024-06-03T10:00:00Z"),
            ("strict_mode.pending_disable", "true"),
            ("strict_mode.disable_at", "2024-06-03T10:00:00Z"),
            ("strict_mode", "{}"),
        ] {
            assert!(
                matches!(cfg.set(key, value), Err(ConfigError::StrictModeManaged(_))),
                "{key} should be refused"
            );
        }
        assert!(cfg.strict_mode.is_active(later));
        assert!(cfg.strict_mode.grace_remaining(later).is_none());
        assert_eq!(cfg.strict_mode.enabled_at, Some(t0));
    }

    #[test]
    fn reset_keeps_strict_mode_table() {
        let t0 = Utc.with_ymd_and_hms(2024, 6, 3, 8, 0, 0).unwrap();
        let mut cfg = Config::default();
        cfg.timer.work_minutes = 50;
        cfg.strict_mode.enable(t0);
        cfg.strict_mode.tone = Tone::Gentle;

        let reset = cfg.reset_keeping_strict_mode();
        assert_eq!(reset.timer.work_minutes, 25);
        assert!(reset.strict_mode.is_active(t0 + Duration::hours(2)));
        assert_eq!(reset.strict_mode.enabled_at, Some(t0));
        assert_eq!(reset.strict_mode.tone, Tone::Gentle);
    }

    #[test]
    fn load_from_missing_file_writes_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg.timer.work_minutes, 25);
        assert!(path.exists());

        let mut cfg = cfg;
        cfg.timer.rest_minutes = 10;
        cfg.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap().timer.rest_minutes, 10);
    }

    #[test]
    fn broken_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "timer = 3").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::LoadFailed { .. })
        ));
    }
}
