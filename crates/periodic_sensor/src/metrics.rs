//! Per-scaffold sensor metrics

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Counters for one [`crate::PeriodicSensors`] scaffold.
///
/// Process-wide Prometheus metrics are recorded alongside through
/// `observability::metrics`; these stay local so tests and the host's
/// `info` output can read them back.
#[derive(Debug, Default)]
pub struct SensorMetrics {
    /// Sample callback invocations
    samples_taken: AtomicU64,
    /// Values accepted by the control plane
    samples_published: AtomicU64,
    /// Values the control plane refused
    publish_failures: AtomicU64,
    /// Control events dispatched to a live sensor
    control_events: AtomicU64,
    /// Events addressed to a destroyed sensor
    stale_events: AtomicU64,
    /// Timer expiries dropped because the sensor was no longer armed
    dropped_expiries: AtomicU64,
    /// Out-of-range periods
    periods_rejected: AtomicU64,
}

impl SensorMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn samples_taken(&self) -> u64 {
        self.samples_taken.load(Ordering::Relaxed)
    }

    pub fn inc_samples_taken(&self) {
        self.samples_taken.fetch_add(1, Ordering::Relaxed);
    }

    pub fn samples_published(&self) -> u64 {
        self.samples_published.load(Ordering::Relaxed)
    }

    pub fn inc_samples_published(&self) {
        self.samples_published.fetch_add(1, Ordering::Relaxed);
    }

    pub fn publish_failures(&self) -> u64 {
        self.publish_failures.load(Ordering::Relaxed)
    }

    pub fn inc_publish_failures(&self) {
        self.publish_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn control_events(&self) -> u64 {
        self.control_events.load(Ordering::Relaxed)
    }

    pub fn inc_control_events(&self) {
        self.control_events.fetch_add(1, Ordering::Relaxed);
    }

    pub fn stale_events(&self) -> u64 {
        self.stale_events.load(Ordering::Relaxed)
    }

    pub fn inc_stale_events(&self) {
        self.stale_events.fetch_add(1, Ordering::Relaxed);
    }

    pub fn dropped_expiries(&self) -> u64 {
        self.dropped_expiries.load(Ordering::Relaxed)
    }

    pub fn inc_dropped_expiries(&self) {
        self.dropped_expiries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn periods_rejected(&self) -> u64 {
        self.periods_rejected.load(Ordering::Relaxed)
    }

    pub fn inc_periods_rejected(&self) {
        self.periods_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            samples_taken: self.samples_taken(),
            samples_published: self.samples_published(),
            publish_failures: self.publish_failures(),
            control_events: self.control_events(),
            stale_events: self.stale_events(),
            dropped_expiries: self.dropped_expiries(),
            periods_rejected: self.periods_rejected(),
        }
    }
}

/// Snapshot of sensor metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub samples_taken: u64,
    pub samples_published: u64,
    pub publish_failures: u64,
    pub control_events: u64,
    pub stale_events: u64,
    pub dropped_expiries: u64,
    pub periods_rejected: u64,
}
