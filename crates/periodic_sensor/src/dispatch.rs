//! Sample dispatch
//!
//! Typed publication of one sample to a sensor's `value` resource.

use contracts::{ControlPlane, SampleValue, SensorHandle, SensorName, Timestamp};
use tracing::{error, trace};

use crate::metrics::SensorMetrics;

/// Publishing context handed to a sample callback.
///
/// Every push goes to the sensor's own `<name>/value` resource (plain `value`
/// for the root name). Failures are logged and counted, never returned: a
/// sample callback has nobody to report them to.
pub struct SampleDispatch<'a> {
    handle: SensorHandle,
    name: &'a SensorName,
    value_path: &'a str,
    plane: &'a dyn ControlPlane,
    metrics: &'a SensorMetrics,
}

impl<'a> SampleDispatch<'a> {
    pub(crate) fn new(
        handle: SensorHandle,
        name: &'a SensorName,
        value_path: &'a str,
        plane: &'a dyn ControlPlane,
        metrics: &'a SensorMetrics,
    ) -> Self {
        Self {
            handle,
            name,
            value_path,
            plane,
            metrics,
        }
    }

    /// Handle of the sensor being sampled
    pub fn handle(&self) -> SensorHandle {
        self.handle
    }

    /// Name of the sensor being sampled
    pub fn name(&self) -> &SensorName {
        self.name
    }

    /// Path samples are published to
    pub fn value_path(&self) -> &str {
        self.value_path
    }

    pub fn push_boolean(&mut self, timestamp: Timestamp, value: bool) {
        self.push(timestamp, SampleValue::Boolean(value));
    }

    pub fn push_numeric(&mut self, timestamp: Timestamp, value: f64) {
        self.push(timestamp, SampleValue::Numeric(value));
    }

    pub fn push_string(&mut self, timestamp: Timestamp, value: &str) {
        self.push(timestamp, SampleValue::String(value.to_string()));
    }

    /// Push a JSON document (must parse as JSON)
    pub fn push_json(&mut self, timestamp: Timestamp, value: &str) {
        self.push(timestamp, SampleValue::Json(value.to_string()));
    }

    /// Push an already typed value
    pub fn push(&mut self, timestamp: Timestamp, value: SampleValue) {
        trace!(
            sensor = %self.name,
            path = self.value_path,
            timestamp = timestamp.as_secs_f64(),
            value = %value,
            "publishing sample"
        );

        match self.plane.push(self.value_path, timestamp, value) {
            Ok(()) => {
                self.metrics.inc_samples_published();
                observability::metrics::record_sample(self.name);
            }
            Err(e) => {
                error!(
                    sensor = %self.name,
                    path = self.value_path,
                    error = %e,
                    "failed to publish sample"
                );
                self.metrics.inc_publish_failures();
                observability::metrics::record_publish_failure(self.name);
            }
        }
    }
}
