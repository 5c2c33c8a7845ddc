//! Configuration file parsing and structures.
//!
//! iolited uses TOML for declarative configuration. Only `[hub]` is required;
//! the MQTT exporter and the HTTP API are enabled by the presence of their
//! sections.

use std::collections::HashMap;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;
use tracing_subscriber::filter::LevelFilter;

/// Top-level configuration structure
#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    pub hub: HubConfig,
    #[serde(default)]
    pub sensors: SensorsConfig,
    #[serde(default)]
    pub mqtt: Option<MqttConfig>,
    #[serde(default)]
    pub api: Option<ApiConfig>,
}

#[derive(Debug, Default, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default)]
    pub level: LogLevel,

    /// Per-target levels, e.g. `"iolited::mqtt" = "debug"`
    #[serde(default)]
    pub overrides: HashMap<String, LogLevel>,
}

fn default_poll_interval_secs() -> u64 {
    30
}

/// Where snapshots come from and how often to fetch them
#[derive(Debug, Deserialize)]
pub struct HubConfig {
    /// JSON snapshot written by the hub fetcher
    pub snapshot_path: PathBuf,

    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

impl HubConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

fn default_true() -> bool {
    true
}

/// Humidity/temperature sensor entities
#[derive(Debug, Deserialize)]
pub struct SensorsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for SensorsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

fn default_mqtt_port() -> u16 {
    1883
}

fn default_client_id() -> String {
    "iolited".to_string()
}

fn default_discovery_prefix() -> String {
    "homeassistant".to_string()
}

fn default_state_prefix() -> String {
    "iolite".to_string()
}

/// MQTT exporter publishing Home Assistant discovery and state
#[derive(Debug, Clone, Deserialize)]
pub struct MqttConfig {
    /// MQTT broker hostname or IP address
    pub broker: String,

    #[serde(default = "default_mqtt_port")]
    pub port: u16,

    #[serde(default = "default_client_id")]
    pub client_id: String,

    /// Home Assistant discovery prefix (default: "homeassistant")
    #[serde(default = "default_discovery_prefix")]
    pub discovery_prefix: String,

    /// Prefix for state and availability topics (default: "iolite")
    #[serde(default = "default_state_prefix")]
    pub state_prefix: String,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,
}

fn default_listen() -> String {
    "127.0.0.1".to_string()
}

fn default_api_port() -> u16 {
    8565
}

/// HTTP API configuration
#[derive(Debug, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default = "default_api_port")]
    pub port: u16,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(path.as_ref().to_path_buf(), e))?;

        let config: Self = toml::from_str(&contents).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.hub.poll_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "hub.poll_interval_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_config() {
        let toml = r#"
            [hub]
            snapshot_path = "/var/lib/iolited/snapshot.json"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.logging.level, LogLevel::Info);
        assert_eq!(config.hub.poll_interval(), Duration::from_secs(30));
        assert!(config.sensors.enabled);
        assert!(config.mqtt.is_none());
        assert!(config.api.is_none());
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
            [logging]
            level = "debug"

            [logging.overrides]
            "iolited::mqtt" = "trace"

            [hub]
            snapshot_path = "snapshot.json"
            poll_interval_secs = 10

            [sensors]
            enabled = false

            [mqtt]
            broker = "localhost"
            username = "iolited"
            password = "secret"

            [api]
            port = 9000
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.logging.overrides["iolited::mqtt"], LogLevel::Trace);
        assert_eq!(config.hub.poll_interval_secs, 10);
        assert!(!config.sensors.enabled);

        let mqtt = config.mqtt.unwrap();
        assert_eq!(mqtt.broker, "localhost");
        assert_eq!(mqtt.port, 1883);
        assert_eq!(mqtt.client_id, "iolited");
        assert_eq!(mqtt.discovery_prefix, "homeassistant");
        assert_eq!(mqtt.state_prefix, "iolite");
        assert_eq!(mqtt.username.as_deref(), Some("iolited"));

        let api = config.api.unwrap();
        assert_eq!(api.listen, "127.0.0.1");
        assert_eq!(api.port, 9000);
    }

    #[test]
    fn test_missing_hub_section() {
        let result: Result<Config, _> = toml::from_str("[logging]\nlevel = \"info\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_from_file_rejects_zero_interval() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("iolited.toml");
        std::fs::write(
            &path,
            "[hub]\nsnapshot_path = \"s.json\"\npoll_interval_secs = 0\n",
        )
        .unwrap();

        let err = Config::from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_from_file_missing() {
        let err = Config::from_file("/nonexistent/iolited.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(..)));
    }
}
