//! TOML-based engine configuration.
//!
//! Holds the tunables of the program engine:
//! - phase look-ahead and the subjects' UTC offset
//! - notification anti-spam limits
//! - recommender seed and per-phase mix policy overrides
//! - per-tier phase catalog overrides
//!
//! Configuration is stored at `<data_dir>/config.toml`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::{ConfigError, ValidationError};
use crate::notify::GatePolicy;
use crate::program::{PhaseCatalog, PhaseType, SegmentSpec, SubscriptionTier};
use crate::workout::{MixPolicy, MixPolicyTable};

/// Program lifecycle configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramConfig {
    /// Days ahead of a phase start that the "approaching" notice fires.
    #[serde(default = "default_horizon_days")]
    pub approaching_horizon_days: u32,
    /// Offset applied to UTC to get subject-local dates and times.
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

/// Notification anti-spam configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_daily_limit")]
    pub daily_limit: u32,
    #[serde(default = "default_window_hours")]
    pub window_hours: u32,
}

/// Workout recommender configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecommenderConfig {
    /// Fixed seed for reproducible draws; entropy when absent.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Per-phase replacements for the built-in mix policies.
    #[serde(default)]
    pub policies: BTreeMap<PhaseType, MixPolicy>,
}

/// Phase catalog overrides, keyed by tier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default)]
    pub tiers: BTreeMap<SubscriptionTier, Vec<SegmentSpec>>,
}

/// Engine configuration.
///
/// Serialized to/from TOML at `<data_dir>/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub program: ProgramConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub recommender: RecommenderConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    /// File this config was loaded from; `save` writes back there.
    #[serde(skip)]
    location: Option<PathBuf>,
}

// Default functions
/// Longest supported "approaching" look-ahead.
pub const MAX_HORIZON_DAYS: u32 = 365;
/// Longest supported anti-spam window.
pub const MAX_WINDOW_HOURS: u32 = 24 * 366;

fn default_horizon_days() -> u32 {
    2
}
fn default_daily_limit() -> u32 {
    8
}
fn default_window_hours() -> u32 {
    24
}

impl Default for ProgramConfig {
    fn default() -> Self {
        Self {
            approaching_horizon_days: default_horizon_days(),
            utc_offset_minutes: 0,
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            daily_limit: default_daily_limit(),
            window_hours: default_window_hours(),
        }
    }
}

impl EngineConfig {
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
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let unknown = || invalid("unknown config key".to_string());

        let mut parts = key.split('.').peekable();
        if parts.peek().is_none_or(|p| p.is_empty()) {
            return Err(invalid("config key is empty".to_string()));
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
                        if let Ok(n) = value.parse::<i64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<f64>() {
                            serde_json::Number::from_f64(n)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                        } else {
                            return Err(invalid(format!("cannot parse '{value}' as number")));
                        }
                    }
                    serde_json::Value::String(_) => serde_json::Value::String(value.into()),
                    // Objects, arrays and unset optionals take a JSON literal.
                    _ => serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?,
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    fn default_path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("config.toml"),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Load from `<data_dir>/config.toml`, writing the defaults there if the
    /// file does not exist yet.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be parsed or fails
    /// validation, or if the default config cannot be written.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            let mut cfg = Self::default();
            cfg.location = Some(path);
            cfg.save()?;
            Ok(cfg)
        }
    }

    /// Load from an explicit path. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let mut cfg = match std::fs::read_to_string(path) {
            Ok(content) => {
                toml::from_str::<Self>(&content).map_err(|e| ConfigError::ParseFailed(e.to_string()))?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(e) => {
                return Err(ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })
            }
        };
        cfg.validate()?;
        cfg.location = Some(path.to_path_buf());
        Ok(cfg)
    }

    /// Persist to the file this config came from (or the default location).
    ///
    /// # Errors
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = match &self.location {
            Some(path) => path.clone(),
            None => Self::default_path()?,
        };
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.clone(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(&path, content).map_err(|e| save_failed(e.to_string()))?;
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

    /// Set a config value by key, validate, and save.
    ///
    /// # Errors
    /// Returns an error if the key is unknown, the value cannot be parsed or
    /// is invalid, or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json =
            serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let mut updated: Self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        updated.validate()?;
        updated.location = self.location.take();
        *self = updated;
        self.save()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let as_config_error = |e: ValidationError| ConfigError::InvalidValue {
            key: "config".to_string(),
            message: e.to_string(),
        };
        self.phase_catalog().map_err(as_config_error)?;
        self.mix_policies().map_err(as_config_error)?;
        if !(1..=MAX_WINDOW_HOURS).contains(&self.notifications.window_hours) {
            return Err(ConfigError::InvalidValue {
                key: "notifications.window_hours".to_string(),
                message: format!("must be between 1 and {MAX_WINDOW_HOURS}"),
            });
        }
        if self.program.approaching_horizon_days > MAX_HORIZON_DAYS {
            return Err(ConfigError::InvalidValue {
                key: "program.approaching_horizon_days".to_string(),
                message: format!("must be at most {MAX_HORIZON_DAYS}"),
            });
        }
        Ok(())
    }

    /// Built-in phase catalog with `[catalog.tiers]` applied.
    pub fn phase_catalog(&self) -> Result<PhaseCatalog, ValidationError> {
        PhaseCatalog::with_overrides(&self.catalog.tiers)
    }

    /// Built-in mix policies with `[recommender.policies]` applied.
    pub fn mix_policies(&self) -> Result<MixPolicyTable, ValidationError> {
        MixPolicyTable::with_overrides(&self.recommender.policies)
    }

    pub fn gate_policy(&self) -> GatePolicy {
        GatePolicy {
            daily_limit: self.notifications.daily_limit,
            window_hours: self.notifications.window_hours,
            utc_offset_minutes: self.program.utc_offset_minutes,
        }
    }
}
