//! Control channel adapter
//!
//! Creates a sensor's four resources and its three push handlers, and turns
//! every push into a [`SensorEvent`] on the dispatch queue.

use contracts::{
    ControlPlane, DataType, HandlerToken, SensorEvent, SensorEventKind, SensorHandle, SensorName,
    Timestamp,
};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::{Result, SensorError};

/// Sender half of the dispatch queue
pub type EventSender = mpsc::UnboundedSender<SensorEvent>;

/// Resource leaf names
pub const VALUE: &str = "value";
pub const ENABLE: &str = "enable";
pub const PERIOD: &str = "period";
pub const TRIGGER: &str = "trigger";

/// Full paths of one sensor's resources
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourcePaths {
    pub value: String,
    pub enable: String,
    pub period: String,
    pub trigger: String,
}

impl ResourcePaths {
    pub fn new(name: &SensorName) -> Self {
        Self {
            value: name.resource_path(VALUE),
            enable: name.resource_path(ENABLE),
            period: name.resource_path(PERIOD),
            trigger: name.resource_path(TRIGGER),
        }
    }
}

/// What the `value` resource carries
#[derive(Debug, Clone, Copy)]
pub enum ValueKind<'a> {
    /// Plain typed value with units
    Typed { data_type: DataType, units: &'a str },
    /// JSON document with an example value
    Json { example: &'a str },
}

impl ValueKind<'_> {
    pub fn data_type(&self) -> DataType {
        match self {
            Self::Typed { data_type, .. } => *data_type,
            Self::Json { .. } => DataType::Json,
        }
    }
}

/// Live resources and handlers of one sensor
#[derive(Debug)]
pub struct ControlChannel {
    paths: ResourcePaths,
    enable_handler: HandlerToken,
    period_handler: HandlerToken,
    trigger_handler: HandlerToken,
}

impl ControlChannel {
    /// Create the resources and register the push handlers.
    ///
    /// On failure everything created so far is removed again, in reverse
    /// order, before the error is returned.
    pub fn open(
        plane: &dyn ControlPlane,
        name: &SensorName,
        value: ValueKind<'_>,
        handle: SensorHandle,
        events: &EventSender,
    ) -> Result<Self> {
        let paths = ResourcePaths::new(name);
        let mut undo = Rollback::new(plane);

        // <name>/value
        match value {
            ValueKind::Typed { data_type, units } => {
                plane
                    .create_input(&paths.value, data_type, units)
                    .map_err(|e| SensorError::resource_creation(&paths.value, e))?;
                undo.resource(&paths.value);
            }
            ValueKind::Json { example } => {
                plane
                    .create_input(&paths.value, DataType::Json, "")
                    .map_err(|e| SensorError::resource_creation(&paths.value, e))?;
                undo.resource(&paths.value);
                plane
                    .set_json_example(&paths.value, example)
                    .map_err(|e| SensorError::resource_creation(&paths.value, e))?;
            }
        }

        // <name>/enable
        plane
            .create_output(&paths.enable, DataType::Boolean, "")
            .map_err(|e| SensorError::resource_creation(&paths.enable, e))?;
        undo.resource(&paths.enable);
        let tx = events.clone();
        let enable_handler = plane
            .add_boolean_push_handler(
                &paths.enable,
                Box::new(move |timestamp: Timestamp, enable: bool| {
                    forward(&tx, handle, timestamp, SensorEventKind::Enable(enable))
                }),
            )
            .map_err(|e| SensorError::resource_creation(&paths.enable, e))?;
        undo.handler(enable_handler);

        // <name>/period
        plane
            .create_output(&paths.period, DataType::Numeric, "s")
            .map_err(|e| SensorError::resource_creation(&paths.period, e))?;
        undo.resource(&paths.period);
        let tx = events.clone();
        let period_handler = plane
            .add_numeric_push_handler(
                &paths.period,
                Box::new(move |timestamp: Timestamp, period: f64| {
                    forward(&tx, handle, timestamp, SensorEventKind::Period(period))
                }),
            )
            .map_err(|e| SensorError::resource_creation(&paths.period, e))?;
        undo.handler(period_handler);

        // <name>/trigger, optional so nobody has to drive it
        plane
            .create_output(&paths.trigger, DataType::Trigger, "")
            .map_err(|e| SensorError::resource_creation(&paths.trigger, e))?;
        undo.resource(&paths.trigger);
        let tx = events.clone();
        let trigger_handler = plane
            .add_trigger_push_handler(
                &paths.trigger,
                Box::new(move |timestamp: Timestamp| {
                    forward(&tx, handle, timestamp, SensorEventKind::Trigger)
                }),
            )
            .map_err(|e| SensorError::resource_creation(&paths.trigger, e))?;
        undo.handler(trigger_handler);
        plane.mark_optional(&paths.trigger);

        undo.commit();
        Ok(Self {
            paths,
            enable_handler,
            period_handler,
            trigger_handler,
        })
    }

    pub fn paths(&self) -> &ResourcePaths {
        &self.paths
    }

    /// Remove handlers, then delete resources (trigger, period, enable, value)
    pub fn close(self, plane: &dyn ControlPlane) {
        for token in [
            self.trigger_handler,
            self.period_handler,
            self.enable_handler,
        ] {
            if let Err(e) = plane.remove_push_handler(token) {
                warn!(token = %token, error = %e, "failed to remove push handler");
            }
        }
        for path in [
            &self.paths.trigger,
            &self.paths.period,
            &self.paths.enable,
            &self.paths.value,
        ] {
            plane.delete_resource(path);
        }
    }
}

fn forward(
    events: &EventSender,
    handle: SensorHandle,
    timestamp: Timestamp,
    kind: SensorEventKind,
) {
    if events.send(SensorEvent::new(handle, timestamp, kind)).is_err() {
        debug!(handle = %handle, kind = kind.label(), "dispatch queue closed, push dropped");
    }
}

/// Undo log for a partially opened channel
struct Rollback<'a> {
    plane: &'a dyn ControlPlane,
    resources: Vec<String>,
    handlers: Vec<HandlerToken>,
    armed: bool,
}

impl<'a> Rollback<'a> {
    fn new(plane: &'a dyn ControlPlane) -> Self {
        Self {
            plane,
            resources: Vec::with_capacity(4),
            handlers: Vec::with_capacity(3),
            armed: true,
        }
    }

    fn resource(&mut self, path: &str) {
        self.resources.push(path.to_string());
    }

    fn handler(&mut self, token: HandlerToken) {
        self.handlers.push(token);
    }

    fn commit(mut self) {
        self.armed = false;
    }
}

impl Drop for Rollback<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        for token in self.handlers.drain(..).rev() {
            if let Err(e) = self.plane.remove_push_handler(token) {
                warn!(token = %token, error = %e, "rollback: failed to remove push handler");
            }
        }
        for path in self.resources.drain(..).rev() {
            debug!(path = %path, "rollback: deleting resource");
            self.plane.delete_resource(&path);
        }
    }
}
