use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

pub const KEY_CLIENT_ID: &str = "client_id";
pub const KEY_SECRET: &str = "secret";
pub const KEY_SETTINGS: &str = "settings";

pub const SETTING_MODE: &str = "mode";
pub const SETTING_CONNECTION_TIMEOUT: &str = "http.ConnectionTimeOut";
pub const SETTING_LOG_ENABLED: &str = "log.LogEnabled";
pub const SETTING_LOG_FILE: &str = "log.FileName";
pub const SETTING_LOG_LEVEL: &str = "log.LogLevel";

/// Settings keys in the order they are checked.
pub const REQUIRED_SETTINGS: [&str; 5] = [
    SETTING_MODE,
    SETTING_CONNECTION_TIMEOUT,
    SETTING_LOG_ENABLED,
    SETTING_LOG_FILE,
    SETTING_LOG_LEVEL,
];

/// Which processor environment the client talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Sandbox,
    Live,
}

impl Mode {
    /// Base URL of the REST API for this environment.
    pub fn api_base(&self) -> &'static str {
        match self {
            Mode::Sandbox => "https://api-m.sandbox.paypal.com",
            Mode::Live => "https://api-m.paypal.com",
        }
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sandbox" => Ok(Mode::Sandbox),
            "live" => Ok(Mode::Live),
            other => Err(format!("expected `sandbox` or `live`, got `{other}`")),
        }
    }
}

/// Log verbosity, most verbose first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Fine,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// The matching `tracing` filter directive.
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Fine => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "FINE" => Ok(LogLevel::Fine),
            "INFO" => Ok(LogLevel::Info),
            "WARN" => Ok(LogLevel::Warn),
            "ERROR" => Ok(LogLevel::Error),
            other => Err(format!(
                "expected one of FINE, INFO, WARN, ERROR, got `{other}`"
            )),
        }
    }
}

/// Client context settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub mode: Mode,
    pub connection_timeout: Duration,
    pub log_enabled: bool,
    pub log_file: PathBuf,
    pub log_level: LogLevel,
}

/// A validated gateway configuration.
///
/// Only [`validate_config`] builds one, so holding a `GatewayConfig` means every
/// field was present and well-typed.
#[derive(Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    pub client_id: String,
    pub secret: String,
    pub settings: Settings,
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("client_id", &self.client_id)
            .field("secret", &"***")
            .field("settings", &self.settings)
            .finish()
    }
}

/// Checks a raw configuration mapping, stopping at the first problem.
///
/// Order: present, mapping, `client_id`, `secret`, `settings`, then each key of
/// [`REQUIRED_SETTINGS`]. Values are only type-checked once everything is present.
pub fn validate_config(raw: &Value) -> Result<GatewayConfig, ConfigError> {
    let root = match raw {
        Value::Null => return Err(ConfigError::Missing),
        Value::Object(map) if map.is_empty() => return Err(ConfigError::Missing),
        Value::Object(map) => map,
        _ => return Err(ConfigError::NotAMapping),
    };

    let client_id = present(root, KEY_CLIENT_ID).ok_or(ConfigError::MissingField(KEY_CLIENT_ID))?;
    let secret = present(root, KEY_SECRET).ok_or(ConfigError::MissingField(KEY_SECRET))?;
    let settings = present(root, KEY_SETTINGS).ok_or(ConfigError::MissingField(KEY_SETTINGS))?;

    let settings = settings.as_object().ok_or_else(|| ConfigError::InvalidValue {
        key: KEY_SETTINGS,
        reason: "expected a mapping".to_string(),
    })?;
    for key in REQUIRED_SETTINGS {
        if present(settings, key).is_none() {
            return Err(ConfigError::MissingSetting(key));
        }
    }

    Ok(GatewayConfig {
        client_id: string_value(client_id, KEY_CLIENT_ID)?,
        secret: string_value(secret, KEY_SECRET)?,
        settings: parse_settings(settings)?,
    })
}

/// Reads a configuration file as JSON without validating its shape.
pub fn load_config_file(path: impl AsRef<Path>) -> Result<Value, ConfigError> {
    let contents =
        std::fs::read_to_string(path).map_err(|e| ConfigError::Io(Arc::new(e)))?;
    serde_json::from_str(&contents).map_err(|e| ConfigError::Parse(Arc::new(e)))
}

fn present<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    map.get(key).filter(|v| !v.is_null())
}

fn string_value(value: &Value, key: &'static str) -> Result<String, ConfigError> {
    value
        .as_str()
        .map(ToString::to_string)
        .ok_or_else(|| ConfigError::InvalidValue {
            key,
            reason: "expected a string".to_string(),
        })
}

fn parse_settings(settings: &Map<String, Value>) -> Result<Settings, ConfigError> {
    let mode = string_value(&settings[SETTING_MODE], SETTING_MODE)?
        .parse::<Mode>()
        .map_err(|reason| ConfigError::InvalidValue {
            key: SETTING_MODE,
            reason,
        })?;

    let timeout_ms = settings[SETTING_CONNECTION_TIMEOUT].as_u64().ok_or_else(|| {
        ConfigError::InvalidValue {
            key: SETTING_CONNECTION_TIMEOUT,
            reason: "expected a non-negative whole number of milliseconds".to_string(),
        }
    })?;

    let log_enabled =
        settings[SETTING_LOG_ENABLED]
            .as_bool()
            .ok_or_else(|| ConfigError::InvalidValue {
                key: SETTING_LOG_ENABLED,
                reason: "expected a boolean".to_string(),
            })?;

    let log_file = PathBuf::from(string_value(&settings[SETTING_LOG_FILE], SETTING_LOG_FILE)?);

    let log_level = string_value(&settings[SETTING_LOG_LEVEL], SETTING_LOG_LEVEL)?
        .parse::<LogLevel>()
        .map_err(|reason| ConfigError::InvalidValue {
            key: SETTING_LOG_LEVEL,
            reason,
        })?;

    Ok(Settings {
        mode,
        connection_timeout: Duration::from_millis(timeout_ms),
        log_enabled,
        log_file,
        log_level,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "client_id": "PAYPAL_CLIENT_ID",
            "secret": "PAYPAL_CLIENT_SECRET",
            "settings": {
                "mode": "sandbox",
                "http.ConnectionTimeOut": 1000,
                "log.LogEnabled": true,
                "log.FileName": "/logs/paypal.log",
                "log.LogLevel": "FINE"
            }
        })
    }

    #[test]
    fn test_valid_config_parses_every_setting() {
        let config = validate_config(&sample()).unwrap();
        assert_eq!(config.client_id, "PAYPAL_CLIENT_ID");
        assert_eq!(config.settings.mode, Mode::Sandbox);
        assert_eq!(config.settings.connection_timeout, Duration::from_millis(1000));
        assert!(config.settings.log_enabled);
        assert_eq!(config.settings.log_file, PathBuf::from("/logs/paypal.log"));
        assert_eq!(config.settings.log_level, LogLevel::Fine);
    }

    #[test]
    fn test_null_and_empty_are_missing() {
        assert!(matches!(validate_config(&Value::Null), Err(ConfigError::Missing)));
        assert!(matches!(validate_config(&json!({})), Err(ConfigError::Missing)));
    }

    #[test]
    fn test_scalar_is_not_a_mapping() {
        assert!(matches!(
            validate_config(&json!("client_id")),
            Err(ConfigError::NotAMapping)
        ));
        assert!(matches!(
            validate_config(&json!([1, 2])),
            Err(ConfigError::NotAMapping)
        ));
    }

    #[test]
    fn test_null_field_counts_as_missing() {
        let mut config = sample();
        config["secret"] = Value::Null;
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::MissingField("secret"))
        ));
    }

    #[test]
    fn test_first_violation_wins() {
        // both client_id and a setting are missing; client_id is checked first
        let mut config = sample();
        config.as_object_mut().unwrap().remove("client_id");
        config["settings"].as_object_mut().unwrap().remove("mode");
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::MissingField("client_id"))
        ));
    }

    #[test]
    fn test_placeholder_mode_is_rejected() {
        let mut config = sample();
        config["settings"]["mode"] = json!("PAYPAL_CLIENT_MODE");
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::InvalidValue { key: "mode", .. })
        ));
    }

    #[test]
    fn test_wrong_types_are_reported_by_key() {
        let mut config = sample();
        config["settings"]["http.ConnectionTimeOut"] = json!("soon");
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::InvalidValue {
                key: "http.ConnectionTimeOut",
                ..
            })
        ));

        let mut config = sample();
        config["settings"]["log.LogLevel"] = json!("TRACE");
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::InvalidValue { key: "log.LogLevel", .. })
        ));
    }

    #[test]
    fn test_debug_hides_secret() {
        let config = validate_config(&sample()).unwrap();
        let printed = format!("{config:?}");
        assert!(!printed.contains("PAYPAL_CLIENT_SECRET"));
    }

    #[test]
    fn test_load_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("paypal.json");
        std::fs::write(&path, sample().to_string()).unwrap();

        let raw = load_config_file(&path).unwrap();
        assert_eq!(raw, sample());

        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(load_config_file(&path), Err(ConfigError::Parse(_))));
        assert!(matches!(
            load_config_file(dir.path().join("absent.json")),
            Err(ConfigError::Io(_))
        ));
    }
}
