//! Data types, values and timestamps exchanged with the control plane.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Data type of a control-plane resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    /// Zero-payload event
    Trigger,
    Boolean,
    Numeric,
    String,
    /// Structured JSON document
    Json,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Trigger => "trigger",
            Self::Boolean => "boolean",
            Self::Numeric => "numeric",
            Self::String => "string",
            Self::Json => "json",
        };
        f.write_str(s)
    }
}

/// Seconds since the Unix epoch.
///
/// [`Timestamp::NOW`] (`0.0`) asks the control plane to stamp the value with
/// the current time.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(pub f64);

impl Timestamp {
    /// "Use the current time"
    pub const NOW: Timestamp = Timestamp(0.0);

    #[inline]
    pub fn is_now(&self) -> bool {
        self.0 == 0.0
    }

    #[inline]
    pub fn as_secs_f64(&self) -> f64 {
        self.0
    }
}

impl From<f64> for Timestamp {
    fn from(secs: f64) -> Self {
        Self(secs)
    }
}

/// A sample published by a sensor to its `value` resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum SampleValue {
    Boolean(bool),
    Numeric(f64),
    String(String),
    /// Serialized JSON document
    Json(String),
}

impl SampleValue {
    /// Data type carried by this value
    pub fn data_type(&self) -> DataType {
        match self {
            Self::Boolean(_) => DataType::Boolean,
            Self::Numeric(_) => DataType::Numeric,
            Self::String(_) => DataType::String,
            Self::Json(_) => DataType::Json,
        }
    }
}

impl fmt::Display for SampleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(v) => write!(f, "{v}"),
            Self::Numeric(v) => write!(f, "{v}"),
            Self::String(v) => write!(f, "{v:?}"),
            Self::Json(v) => f.write_str(v),
        }
    }
}

/// A value pushed by the control plane into one of a sensor's control inputs
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ControlValue {
    Trigger,
    Boolean(bool),
    Numeric(f64),
}

impl ControlValue {
    /// Data type carried by this value
    pub fn data_type(&self) -> DataType {
        match self {
            Self::Trigger => DataType::Trigger,
            Self::Boolean(_) => DataType::Boolean,
            Self::Numeric(_) => DataType::Numeric,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_type_serde_names() {
        let json = serde_json::to_string(&DataType::Numeric).unwrap();
        assert_eq!(json, "\"numeric\"");
        let parsed: DataType = serde_json::from_str("\"json\"").unwrap();
        assert_eq!(parsed, DataType::Json);
    }

    #[test]
    fn test_value_types() {
        assert_eq!(SampleValue::Numeric(1.0).data_type(), DataType::Numeric);
        assert_eq!(SampleValue::Json("{}".into()).data_type(), DataType::Json);
        assert_eq!(ControlValue::Trigger.data_type(), DataType::Trigger);
        assert_eq!(ControlValue::Boolean(true).data_type(), DataType::Boolean);
    }

    #[test]
    fn test_timestamp_now_sentinel() {
        assert!(Timestamp::NOW.is_now());
        assert!(!Timestamp(12.5).is_now());
    }
}
