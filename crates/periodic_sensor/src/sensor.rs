//! Sensor instance
//!
//! One live sensor: control state, timer, control channel and sample callback.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use contracts::{ControlPlane, DataType, SensorEventKind, SensorHandle, SensorName, Timer};
use serde::Serialize;
use tracing::{debug, error};

use crate::control::{ControlChannel, ResourcePaths};
use crate::dispatch::SampleDispatch;
use crate::metrics::SensorMetrics;
use crate::state::{ControlState, SensorMode, TimerAction, Transition};

/// Produces one sample per invocation.
///
/// Runs on the dispatch context, never concurrently with itself.
pub type SampleCallback = Box<dyn FnMut(&mut SampleDispatch<'_>) + Send>;

/// Counts timer reconfigurations.
///
/// Shared with the timer's expiry handler, which stamps every expiry with
/// the run it belongs to. An expiry whose run is no longer current came from
/// a timer that has since been stopped, restarted or re-timed.
#[derive(Debug, Clone, Default)]
pub(crate) struct TimerRun(Arc<AtomicU64>);

impl TimerRun {
    pub(crate) fn current(&self) -> u64 {
        self.0.load(Ordering::Acquire)
    }

    fn advance(&self) {
        self.0.fetch_add(1, Ordering::AcqRel);
    }
}

/// Point-in-time view of a sensor
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorStatus {
    pub name: String,
    pub data_type: DataType,
    pub value_path: String,
    pub mode: SensorMode,
    pub enabled: bool,
    /// Seconds, `0.0` = unset
    pub period: f64,
    pub timer_running: bool,
}

pub struct SensorInstance {
    name: SensorName,
    data_type: DataType,
    state: ControlState,
    timer: Box<dyn Timer>,
    timer_run: TimerRun,
    channel: ControlChannel,
    callback: SampleCallback,
}

impl SensorInstance {
    pub(crate) fn new(
        name: SensorName,
        data_type: DataType,
        timer: Box<dyn Timer>,
        timer_run: TimerRun,
        channel: ControlChannel,
        callback: SampleCallback,
    ) -> Self {
        Self {
            name,
            data_type,
            state: ControlState::new(),
            timer,
            timer_run,
            channel,
            callback,
        }
    }

    pub fn name(&self) -> &SensorName {
        &self.name
    }

    pub fn paths(&self) -> &ResourcePaths {
        self.channel.paths()
    }

    pub fn state(&self) -> &ControlState {
        &self.state
    }

    pub fn status(&self) -> SensorStatus {
        SensorStatus {
            name: self.name.to_string(),
            data_type: self.data_type,
            value_path: self.channel.paths().value.clone(),
            mode: self.state.mode(),
            enabled: self.state.enabled(),
            period: self.state.period(),
            timer_running: self.timer.is_running(),
        }
    }

    /// Run one event through the state machine and execute its effects
    pub(crate) fn handle_event(
        &mut self,
        handle: SensorHandle,
        kind: SensorEventKind,
        plane: &dyn ControlPlane,
        metrics: &SensorMetrics,
    ) {
        let before = self.state.mode();
        let transition = match kind {
            SensorEventKind::Enable(enable) => self.state.set_enabled(enable),
            SensorEventKind::Period(period) => self.state.set_period(period),
            SensorEventKind::Trigger => self.state.trigger(),
            SensorEventKind::TimerExpired { run } if run != self.timer_run.current() => {
                debug!(
                    sensor = %self.name,
                    run,
                    current = self.timer_run.current(),
                    "dropping expiry from a previous timer run"
                );
                metrics.inc_dropped_expiries();
                return;
            }
            SensorEventKind::TimerExpired { .. } => {
                let t = self.state.timer_expired();
                if !t.sample {
                    debug!(sensor = %self.name, "dropping expiry for disarmed sensor");
                    metrics.inc_dropped_expiries();
                }
                t
            }
        };

        if before != self.state.mode() {
            debug!(
                sensor = %self.name,
                from = %before,
                to = %self.state.mode(),
                period = self.state.period(),
                "sensor mode changed"
            );
        }

        self.apply(handle, &transition, plane, metrics);
    }

    /// Current timer run, for expiries raised outside the timer
    pub(crate) fn timer_run(&self) -> u64 {
        self.timer_run.current()
    }

    /// Execute effects in order: set interval, sample, start/stop timer.
    ///
    /// Every timer reconfiguration opens a new run, after the timer call
    /// returns, so expiries already queued by the old run are dropped.
    fn apply(
        &mut self,
        handle: SensorHandle,
        transition: &Transition,
        plane: &dyn ControlPlane,
        metrics: &SensorMetrics,
    ) {
        if let Some(period) = transition.rejected_period {
            error!(
                sensor = %self.name,
                period,
                max = contracts::MAX_PERIOD_SECS,
                "sample period out of range, sensor disarmed"
            );
            metrics.inc_periods_rejected();
            observability::metrics::record_period_rejected(&self.name);
        }

        if let Some(interval) = transition.set_interval {
            self.timer.set_interval(interval);
            self.timer_run.advance();
        }

        if transition.sample {
            self.sample(handle, plane, metrics);
        }

        match transition.timer {
            TimerAction::Keep => {}
            TimerAction::Start => {
                self.timer.start();
                self.timer_run.advance();
            }
            TimerAction::Stop => {
                self.timer.stop();
                self.timer_run.advance();
            }
        }

        debug_assert_eq!(
            self.timer.is_running(),
            self.state.is_armed(),
            "timer out of step with control state"
        );
    }

    /// Invoke the sample callback once
    pub(crate) fn sample(
        &mut self,
        handle: SensorHandle,
        plane: &dyn ControlPlane,
        metrics: &SensorMetrics,
    ) {
        metrics.inc_samples_taken();
        let mut dispatch = SampleDispatch::new(
            handle,
            &self.name,
            &self.channel.paths().value,
            plane,
            metrics,
        );
        (self.callback)(&mut dispatch);
    }

    /// Dispatch context for a sample produced outside the callback
    pub(crate) fn dispatch<'a>(
        &'a self,
        handle: SensorHandle,
        plane: &'a dyn ControlPlane,
        metrics: &'a SensorMetrics,
    ) -> SampleDispatch<'a> {
        SampleDispatch::new(
            handle,
            &self.name,
            &self.channel.paths().value,
            plane,
            metrics,
        )
    }

    /// Stop and delete the timer, then close the control channel.
    ///
    /// The handle must already be unregistered.
    pub(crate) fn teardown(mut self, plane: &dyn ControlPlane) {
        self.timer.stop();
        drop(self.timer);
        self.channel.close(plane);
    }
}
