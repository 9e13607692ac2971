//! HostBlueprint - Config Loader output
//!
//! Describes the agent host and the periodic sensors it runs.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::DataType;

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete host blueprint
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct HostBlueprint {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Host settings
    #[serde(default)]
    #[validate(nested)]
    pub host: HostConfig,

    /// Periodic sensors
    #[serde(default)]
    #[validate(nested)]
    pub sensors: Vec<SensorConfig>,
}

/// Host settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct HostConfig {
    /// Agent name, used in logs only
    #[serde(default = "default_host_name")]
    #[validate(length(min = 1, max = 64))]
    pub name: String,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            name: default_host_name(),
        }
    }
}

fn default_host_name() -> String {
    "psensor-host".to_string()
}

/// One periodic sensor
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SensorConfig {
    /// Sensor name ("" = parent namespace)
    #[serde(default)]
    #[validate(length(max = 31))]
    pub name: String,

    /// Data type of the sensor's `value` resource
    pub data_type: DataType,

    /// Units of the `value` resource
    #[serde(default)]
    pub units: String,

    /// Demo sample generator used by the host binary
    #[serde(default)]
    pub source: SampleSource,

    /// Initial `enable` push
    #[serde(default)]
    pub enable: Option<bool>,

    /// Initial `period` push (seconds)
    #[serde(default)]
    #[validate(range(exclusive_min = 0.0, max = 2147483647.0))]
    pub period: Option<f64>,

    /// Example document, required for json sensors
    #[serde(default)]
    pub json_example: Option<String>,
}

/// Built-in sample generators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleSource {
    /// Monotonic sample counter (numeric)
    #[default]
    Counter,
    /// Bounded random walk (numeric)
    RandomWalk,
    /// Seconds since host start (numeric)
    Uptime,
    /// Alternating true/false (boolean)
    Heartbeat,
    /// Sequence label (string)
    Label,
    /// Small status document (json)
    JsonSnapshot,
}

impl SampleSource {
    /// Data type this generator produces
    pub fn data_type(&self) -> DataType {
        match self {
            Self::Counter | Self::RandomWalk | Self::Uptime => DataType::Numeric,
            Self::Heartbeat => DataType::Boolean,
            Self::Label => DataType::String,
            Self::JsonSnapshot => DataType::Json,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MAX_NAME_BYTES;

    #[test]
    fn test_source_types() {
        assert_eq!(SampleSource::RandomWalk.data_type(), DataType::Numeric);
        assert_eq!(SampleSource::Heartbeat.data_type(), DataType::Boolean);
        assert_eq!(SampleSource::JsonSnapshot.data_type(), DataType::Json);
    }

    #[test]
    fn test_field_validation() {
        let mut sensor = SensorConfig {
            name: "temp".into(),
            data_type: DataType::Numeric,
            units: "degC".into(),
            source: SampleSource::RandomWalk,
            enable: Some(true),
            period: Some(2.5),
            json_example: None,
        };
        assert!(sensor.validate().is_ok());

        sensor.period = Some(0.0);
        assert!(sensor.validate().is_err());

        sensor.period = Some(5.0);
        sensor.name = "x".repeat(MAX_NAME_BYTES + 1);
        assert!(sensor.validate().is_err());
    }

    #[test]
    fn test_deserialize_defaults() {
        let json = r#"{"sensors":[{"data_type":"boolean"}]}"#;
        let bp: HostBlueprint = serde_json::from_str(json).unwrap();
        assert_eq!(bp.version, ConfigVersion::V1);
        assert_eq!(bp.host.name, "psensor-host");
        assert_eq!(bp.sensors[0].name, "");
        assert_eq!(bp.sensors[0].source, SampleSource::Counter);
        assert!(bp.sensors[0].period.is_none());
    }
}
