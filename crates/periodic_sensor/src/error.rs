//! Periodic sensor error types

use contracts::{ContractError, SensorHandle};
use thiserror::Error;

/// Periodic sensor errors
#[derive(Debug, Error)]
pub enum SensorError {
    /// Handle does not resolve (never issued, or the sensor was destroyed)
    #[error("sensor handle {0} not found")]
    NotFound(SensorHandle),

    /// Name violates the naming contract
    #[error(transparent)]
    InvalidName(ContractError),

    /// The value resource cannot carry this data type
    #[error("sensor '{name}' cannot publish {data_type} values")]
    UnsupportedType {
        name: String,
        data_type: contracts::DataType,
    },

    /// A resource or push handler could not be created
    #[error("failed to create '{path}': {source}")]
    ResourceCreation {
        path: String,
        #[source]
        source: ContractError,
    },

    /// The timer service could not create a timer
    #[error("failed to create timer for sensor '{name}': {source}")]
    Timer {
        name: String,
        #[source]
        source: ContractError,
    },
}

impl SensorError {
    /// Create a resource creation error
    pub fn resource_creation(path: impl Into<String>, source: ContractError) -> Self {
        Self::ResourceCreation {
            path: path.into(),
            source,
        }
    }

    /// Create a timer creation error
    pub fn timer(name: impl Into<String>, source: ContractError) -> Self {
        Self::Timer {
            name: name.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, SensorError>;
