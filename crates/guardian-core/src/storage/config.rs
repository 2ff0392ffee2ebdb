//! TOML-based application configuration.
//!
//! Stores:
//! - SOS countdown length and the number dialled when it expires
//! - Journey location poll interval
//! - Share link templates (maps and message services)
//! - An optional fixed position for desktops without a position sensor
//! - The emergency number directory
//!
//! Configuration is stored at `~/.config/guardian/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::data_dir;
use crate::error::ConfigError;
use crate::location::Coordinates;

/// SOS alert configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertConfig {
    #[serde(default = "default_countdown_seconds")]
    pub countdown_seconds: u32,
    #[serde(default = "default_emergency_number")]
    pub emergency_number: String,
}

/// Journey tracking configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JourneyConfig {
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_duration_minutes")]
    pub default_duration_minutes: u32,
    /// Dialled by the journey screen's emergency button.
    #[serde(default = "default_emergency_number")]
    pub emergency_number: String,
}

/// Share link templates. The encoded message / coordinates are appended verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShareConfig {
    #[serde(default = "default_maps_url")]
    pub maps_url: String,
    #[serde(default = "default_message_url")]
    pub message_url: String,
}

/// Fixed position used when no device sensor exists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationConfig {
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

impl LocationConfig {
    pub fn position(&self) -> Option<Coordinates> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => Some(Coordinates::new(lat, lng)).filter(Coordinates::is_valid),
            _ => None,
        }
    }
}

/// One entry of the emergency number directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyNumber {
    pub name: String,
    pub number: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/guardian/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub alert: AlertConfig,
    #[serde(default)]
    pub journey: JourneyConfig,
    #[serde(default)]
    pub share: ShareConfig,
    #[serde(default)]
    pub location: LocationConfig,
    #[serde(default = "default_emergency_numbers")]
    pub emergency_numbers: Vec<EmergencyNumber>,
}

// Default functions
fn default_countdown_seconds() -> u32 {
    5
}
fn default_emergency_number() -> String {
    "100".into()
}
fn default_poll_interval_secs() -> u64 {
    30
}
fn default_duration_minutes() -> u32 {
    30
}
fn default_maps_url() -> String {
    "https://maps.google.com/?q=".into()
}
fn default_message_url() -> String {
    "https://wa.me/?text=".into()
}
fn default_emergency_numbers() -> Vec<EmergencyNumber> {
    [
        ("Police", "100"),
        ("Women Helpline", "1091"),
        ("Emergency Services", "108"),
    ]
    .into_iter()
    .map(|(name, number)| EmergencyNumber {
        name: name.into(),
        number: number.into(),
    })
    .collect()
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            countdown_seconds: default_countdown_seconds(),
            emergency_number: default_emergency_number(),
        }
    }
}

impl Default for JourneyConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            default_duration_minutes: default_duration_minutes(),
            emergency_number: default_emergency_number(),
        }
    }
}

impl JourneyConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

impl Default for ShareConfig {
    fn default() -> Self {
        Self {
            maps_url: default_maps_url(),
            message_url: default_message_url(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            alert: AlertConfig::default(),
            journey: JourneyConfig::default(),
            share: ShareConfig::default(),
            location: LocationConfig::default(),
            emergency_numbers: default_emergency_numbers(),
        }
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
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_some() {
                current = current.get_mut(part).ok_or_else(unknown)?;
                continue;
            }

            let obj = current.as_object_mut().ok_or_else(unknown)?;
            let existing = obj.get(part).ok_or_else(unknown)?;

            let new_value = match existing {
                serde_json::Value::Bool(_) => serde_json::Value::Bool(
                    value
                        .parse::<bool>()
                        .map_err(|e| invalid(e.to_string()))?,
                ),
                serde_json::Value::Number(_) => {
                    if let Ok(n) = value.parse::<u64>() {
                        serde_json::Value::Number(n.into())
                    } else if let Ok(n) = value.parse::<f64>() {
                        serde_json::Number::from_f64(n)
                            .map(serde_json::Value::Number)
                            .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                    } else {
                        return Err(invalid(format!("cannot parse '{value}' as number")));
                    }
                }
                // Unset optionals take whatever JSON the value parses as.
                serde_json::Value::Null => serde_json::from_str(value)
                    .unwrap_or_else(|_| serde_json::Value::String(value.into())),
                serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                    serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                }
                serde_json::Value::String(_) => serde_json::Value::String(value.into()),
            };

            obj.insert(part.to_string(), new_value);
            return Ok(());
        }

        Err(unknown())
    }

    /// `<data_dir>/config.toml`
    pub fn path() -> Result<PathBuf, ConfigError> {
        data_dir()
            .map(|dir| dir.join("config.toml"))
            .map_err(|e| ConfigError::LoadFailed {
                path: PathBuf::from("config.toml"),
                message: e.to_string(),
            })
    }

    /// Load from the default location, writing defaults if the file is missing.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path`, writing defaults there if the file is missing.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "falling back to default config");
            Self::default()
        })
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| save_failed(e.to_string()))?;
        }
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Reject values the engines cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |key: &str, message: &str| ConfigError::InvalidValue {
            key: key.to_string(),
            message: message.to_string(),
        };
        if self.alert.countdown_seconds == 0 {
            return Err(invalid("alert.countdown_seconds", "must be at least 1"));
        }
        if self.alert.emergency_number.trim().is_empty() {
            return Err(invalid("alert.emergency_number", "must not be empty"));
        }
        if self.journey.poll_interval_secs == 0 {
            return Err(invalid("journey.poll_interval_secs", "must be at least 1"));
        }
        if self.journey.default_duration_minutes == 0 {
            return Err(invalid("journey.default_duration_minutes", "must be at least 1"));
        }
        if self.journey.emergency_number.trim().is_empty() {
            return Err(invalid("journey.emergency_number", "must not be empty"));
        }
        let loc = &self.location;
        if loc.latitude.is_some() != loc.longitude.is_some() {
            return Err(invalid("location", "latitude and longitude must be set together"));
        }
        if loc.latitude.is_some() && loc.position().is_none() {
            return Err(invalid("location", "coordinates out of range"));
        }
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

    /// Set a config value by dot-separated key. The caller persists with [`Config::save`].
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value does not parse as the
    /// field's type, or the resulting config fails [`Config::validate`].
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config =
            serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }
}
