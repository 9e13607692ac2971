//! SensorEvent - unit of work on the serialized dispatch queue

use crate::{SensorHandle, Timestamp};

/// What happened to a sensor
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SensorEventKind {
    /// `<name>/enable` received a value
    Enable(bool),
    /// `<name>/period` received a value (seconds)
    Period(f64),
    /// `<name>/trigger` fired
    Trigger,
    /// The sensor's timer expired during timer run `run`
    TimerExpired { run: u64 },
}

impl SensorEventKind {
    /// Short label for logs and metrics
    pub fn label(&self) -> &'static str {
        match self {
            Self::Enable(_) => "enable",
            Self::Period(_) => "period",
            Self::Trigger => "trigger",
            Self::TimerExpired { .. } => "timer",
        }
    }
}

/// An event addressed to one sensor.
///
/// Push handlers and timer expiry handlers never touch sensor state directly;
/// they enqueue one of these and the owner of the sensors drains the queue.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorEvent {
    pub handle: SensorHandle,
    /// Delivery timestamp from the control plane (unused by the state machine)
    pub timestamp: Timestamp,
    pub kind: SensorEventKind,
}

impl SensorEvent {
    pub fn new(handle: SensorHandle, timestamp: Timestamp, kind: SensorEventKind) -> Self {
        Self {
            handle,
            timestamp,
            kind,
        }
    }

    /// Timer expiry event (stamped "now") raised by timer run `run`
    pub fn timer_expired(handle: SensorHandle, run: u64) -> Self {
        Self::new(handle, Timestamp::NOW, SensorEventKind::TimerExpired { run })
    }
}
