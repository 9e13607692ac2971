//! ControlPlane trait - the external push-based data hub
//!
//! Sensors create resources on the control plane, register push handlers on
//! their control inputs and publish samples to their `value` resource.

use std::fmt;

use crate::{ContractError, DataType, SampleValue, Timestamp};

/// Handler for boolean pushes: `(timestamp, value)`
pub type BooleanPushHandler = Box<dyn Fn(Timestamp, bool) + Send + Sync>;

/// Handler for numeric pushes: `(timestamp, value)`
pub type NumericPushHandler = Box<dyn Fn(Timestamp, f64) + Send + Sync>;

/// Handler for zero-payload trigger pushes: `(timestamp)`
pub type TriggerPushHandler = Box<dyn Fn(Timestamp) + Send + Sync>;

/// A typed push handler
pub enum PushHandler {
    Boolean(BooleanPushHandler),
    Numeric(NumericPushHandler),
    Trigger(TriggerPushHandler),
}

impl PushHandler {
    /// Data type this handler accepts
    pub fn data_type(&self) -> DataType {
        match self {
            Self::Boolean(_) => DataType::Boolean,
            Self::Numeric(_) => DataType::Numeric,
            Self::Trigger(_) => DataType::Trigger,
        }
    }
}

impl fmt::Debug for PushHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PushHandler({})", self.data_type())
    }
}

/// Token identifying a registered push handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerToken(pub u64);

impl fmt::Display for HandlerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Control plane / data hub abstraction
///
/// Naming follows the sensor's point of view turned around: an *input* is a
/// resource the sensor feeds data into (its `value`), an *output* is a
/// resource the hub drives and the sensor listens to (`enable`, `period`,
/// `trigger`).
///
/// Implementations must not invoke push handlers re-entrantly from inside
/// [`ControlPlane::push`].
pub trait ControlPlane: Send + Sync {
    /// Create an input resource
    fn create_input(
        &self,
        path: &str,
        data_type: DataType,
        units: &str,
    ) -> Result<(), ContractError>;

    /// Create an output resource
    fn create_output(
        &self,
        path: &str,
        data_type: DataType,
        units: &str,
    ) -> Result<(), ContractError>;

    /// Delete a resource and every push handler still attached to it
    fn delete_resource(&self, path: &str);

    /// Mark an output as optional (absence of a producer is not an error)
    fn mark_optional(&self, path: &str);

    /// Attach an example document to a JSON resource
    fn set_json_example(&self, path: &str, example: &str) -> Result<(), ContractError>;

    /// Register a push handler on an output
    fn add_push_handler(
        &self,
        path: &str,
        handler: PushHandler,
    ) -> Result<HandlerToken, ContractError>;

    /// Remove a previously registered push handler
    fn remove_push_handler(&self, token: HandlerToken) -> Result<(), ContractError>;

    /// Publish a value to an input (timestamp [`Timestamp::NOW`] = now)
    fn push(
        &self,
        path: &str,
        timestamp: Timestamp,
        value: SampleValue,
    ) -> Result<(), ContractError>;

    /// Register a boolean push handler
    fn add_boolean_push_handler(
        &self,
        path: &str,
        handler: BooleanPushHandler,
    ) -> Result<HandlerToken, ContractError> {
        self.add_push_handler(path, PushHandler::Boolean(handler))
    }

    /// Register a numeric push handler
    fn add_numeric_push_handler(
        &self,
        path: &str,
        handler: NumericPushHandler,
    ) -> Result<HandlerToken, ContractError> {
        self.add_push_handler(path, PushHandler::Numeric(handler))
    }

    /// Register a trigger push handler
    fn add_trigger_push_handler(
        &self,
        path: &str,
        handler: TriggerPushHandler,
    ) -> Result<HandlerToken, ContractError> {
        self.add_push_handler(path, PushHandler::Trigger(handler))
    }

    /// Publish a boolean sample
    fn push_boolean(
        &self,
        path: &str,
        timestamp: Timestamp,
        value: bool,
    ) -> Result<(), ContractError> {
        self.push(path, timestamp, SampleValue::Boolean(value))
    }

    /// Publish a numeric sample
    fn push_numeric(
        &self,
        path: &str,
        timestamp: Timestamp,
        value: f64,
    ) -> Result<(), ContractError> {
        self.push(path, timestamp, SampleValue::Numeric(value))
    }

    /// Publish a string sample
    fn push_string(
        &self,
        path: &str,
        timestamp: Timestamp,
        value: &str,
    ) -> Result<(), ContractError> {
        self.push(path, timestamp, SampleValue::String(value.to_string()))
    }

    /// Publish a JSON sample
    fn push_json(
        &self,
        path: &str,
        timestamp: Timestamp,
        value: &str,
    ) -> Result<(), ContractError> {
        self.push(path, timestamp, SampleValue::Json(value.to_string()))
    }
}
