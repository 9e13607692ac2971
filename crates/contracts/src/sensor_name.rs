//! SensorName - Bounded, cheap-to-clone sensor identifier
//!
//! Uses Arc<str> internally for O(1) clone operations.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Borrow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::Arc;

use crate::ContractError;

/// Maximum number of bytes in a sensor name.
pub const MAX_NAME_BYTES: usize = 31;

/// Sensor name with cheap cloning.
///
/// The name is the namespace under which the sensor's resources live
/// (`<name>/value`, `<name>/enable`, ...). The empty name is valid and means
/// "use the parent namespace": the resources then sit directly at `value`,
/// `enable`, `period` and `trigger`.
///
/// # Examples
/// ```
/// use contracts::SensorName;
///
/// let name = SensorName::new("temp").unwrap();
/// assert_eq!(name.resource_path("value"), "temp/value");
///
/// let root = SensorName::new("").unwrap();
/// assert_eq!(root.resource_path("value"), "value");
/// ```
#[derive(Clone, Default)]
pub struct SensorName(Arc<str>);

impl SensorName {
    /// Create a new SensorName, checking the naming contract.
    ///
    /// # Errors
    /// - longer than [`MAX_NAME_BYTES`]
    /// - leading or trailing `/`, or an empty path segment
    /// - whitespace or control characters
    pub fn new(s: &str) -> Result<Self, ContractError> {
        Self::check(s)?;
        Ok(Self(Arc::from(s)))
    }

    /// Get the underlying string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for the "use parent namespace" name.
    #[inline]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Build the path of one of this sensor's resources.
    pub fn resource_path(&self, leaf: &str) -> String {
        if self.is_root() {
            leaf.to_string()
        } else {
            format!("{}/{}", self.0, leaf)
        }
    }

    fn check(s: &str) -> Result<(), ContractError> {
        if s.len() > MAX_NAME_BYTES {
            return Err(ContractError::invalid_name(
                s,
                format!("{} bytes exceeds the {MAX_NAME_BYTES} byte limit", s.len()),
            ));
        }
        if s.is_empty() {
            return Ok(());
        }
        if s.split('/').any(str::is_empty) {
            return Err(ContractError::invalid_name(s, "empty path segment"));
        }
        if s.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(ContractError::invalid_name(
                s,
                "whitespace or control character",
            ));
        }
        Ok(())
    }
}

impl Deref for SensorName {
    type Target = str;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for SensorName {
    #[inline]
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for SensorName {
    #[inline]
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for SensorName {
    type Error = ContractError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl TryFrom<String> for SensorName {
    type Error = ContractError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::check(&s)?;
        Ok(Self(Arc::from(s)))
    }
}

impl fmt::Display for SensorName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for SensorName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SensorName({:?})", self.0)
    }
}

impl PartialEq for SensorName {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
    }
}

impl Eq for SensorName {}

impl PartialEq<str> for SensorName {
    #[inline]
    fn eq(&self, other: &str) -> bool {
        self.0.as_ref() == other
    }
}

impl PartialEq<&str> for SensorName {
    #[inline]
    fn eq(&self, other: &&str) -> bool {
        self.0.as_ref() == *other
    }
}

// Same hash as str so HashMap<SensorName, _> can be queried with &str
impl Hash for SensorName {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state)
    }
}

impl Serialize for SensorName {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for SensorName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::try_from(s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_clone_is_cheap() {
        let a = SensorName::new("temp").unwrap();
        let b = a.clone();
        assert_eq!(a.as_str().as_ptr(), b.as_str().as_ptr());
    }

    #[test]
    fn test_resource_paths() {
        let name = SensorName::new("env/temp").unwrap();
        assert_eq!(name.resource_path("enable"), "env/temp/enable");
        assert_eq!(name.resource_path("period"), "env/temp/period");

        let root = SensorName::new("").unwrap();
        assert!(root.is_root());
        assert_eq!(root.resource_path("trigger"), "trigger");
    }

    #[test]
    fn test_length_limit() {
        let max = "a".repeat(MAX_NAME_BYTES);
        assert!(SensorName::new(&max).is_ok());

        let too_long = "a".repeat(MAX_NAME_BYTES + 1);
        let err = SensorName::new(&too_long).unwrap_err();
        assert!(err.to_string().contains("byte limit"));
    }

    #[test]
    fn test_rejects_malformed_paths() {
        assert!(SensorName::new("/temp").is_err());
        assert!(SensorName::new("temp/").is_err());
        assert!(SensorName::new("a//b").is_err());
        assert!(SensorName::new("my temp").is_err());
    }

    #[test]
    fn test_hashmap_key() {
        let mut map: HashMap<SensorName, i32> = HashMap::new();
        map.insert(SensorName::new("temp").unwrap(), 1);
        assert_eq!(map.get("temp"), Some(&1));
    }

    #[test]
    fn test_serde() {
        let name = SensorName::new("temp").unwrap();
        let json = serde_json::to_string(&name).unwrap();
        assert_eq!(json, "\"temp\"");

        let parsed: SensorName = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, name);

        let bad: Result<SensorName, _> = serde_json::from_str("\"/bad\"");
        assert!(bad.is_err());
    }
}
