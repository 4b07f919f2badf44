//! Device configuration.
//!
//! Replaces the original firmware's compiled-in settings with a serde
//! structure; every field has a default so partial JSON documents work.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration load failure.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Topic names the bus machine publishes to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopicConfig {
    pub temperature: String,
    pub humidity: String,
    pub presence: String,
}

impl Default for TopicConfig {
    fn default() -> Self {
        Self {
            temperature: "home/temperature".to_string(),
            humidity: "home/humidity".to_string(),
            presence: "home/presence".to_string(),
        }
    }
}

/// Per-device settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Identity presented to the message bus.
    pub client_id: String,
    /// Calibration offset subtracted from valid temperature readings.
    pub temperature_offset: i32,
    pub topics: TopicConfig,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            client_id: "devloop".to_string(),
            temperature_offset: 0,
            topics: TopicConfig::default(),
        }
    }
}

impl DeviceConfig {
    /// Parse a JSON document; absent fields fall back to the defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_fills_in_defaults() {
        let config = DeviceConfig::from_json(r#"{"client_id": "livingroom"}"#).unwrap();

        assert_eq!(config.client_id, "livingroom");
        assert_eq!(config.temperature_offset, 0);
        assert_eq!(config.topics, TopicConfig::default());
    }

    #[test]
    fn full_document_round_trips() {
        let config = DeviceConfig {
            client_id: "bedroom".to_string(),
            temperature_offset: 3,
            topics: TopicConfig {
                temperature: "bedroom/temp".to_string(),
                humidity: "bedroom/hum".to_string(),
                presence: "bedroom/person".to_string(),
            },
        };

        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(DeviceConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(DeviceConfig::from_json("not json").is_err());
    }
}
