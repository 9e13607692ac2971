//! Tokio-backed timers
//!
//! Each running timer is a spawned task ticking a `tokio::time::interval`.
//! The task only calls the expiry handler; stopping aborts the task.

use std::sync::Arc;
use std::time::Duration;

use contracts::{ContractError, ExpiryHandler, Interval, Timer, TimerService};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, trace, warn};

/// Shortest interval a tokio timer will tick at
const MIN_TICK: Duration = Duration::from_millis(1);

/// Creates [`TokioTimer`]s on a tokio runtime
#[derive(Debug, Clone)]
pub struct TokioTimerService {
    runtime: Handle,
}

impl TokioTimerService {
    /// Use the runtime of the calling context
    pub fn current() -> Result<Self, ContractError> {
        let runtime = Handle::try_current()
            .map_err(|e| ContractError::timer("<service>", e.to_string()))?;
        Ok(Self { runtime })
    }

    pub fn with_handle(runtime: Handle) -> Self {
        Self { runtime }
    }
}

impl TimerService for TokioTimerService {
    fn create(&self, name: &str) -> Result<Box<dyn Timer>, ContractError> {
        debug!(timer = name, "creating tokio timer");
        Ok(Box::new(TokioTimer {
            name: name.to_string(),
            runtime: self.runtime.clone(),
            interval: Interval::default(),
            repeat: false,
            handler: None,
            task: None,
        }))
    }
}

pub struct TokioTimer {
    name: String,
    runtime: Handle,
    interval: Interval,
    repeat: bool,
    handler: Option<Arc<ExpiryHandler>>,
    task: Option<JoinHandle<()>>,
}

impl TokioTimer {
    fn spawn(&mut self) {
        let Some(handler) = self.handler.clone() else {
            warn!(timer = %self.name, "timer started without expiry handler");
            return;
        };
        let period = self.interval.as_duration().max(MIN_TICK);
        let repeat = self.repeat;
        let name = self.name.clone();

        self.task = Some(self.runtime.spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                trace!(timer = %name, "timer expired");
                handler();
                if !repeat {
                    break;
                }
            }
        }));
    }

    fn abort(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Timer for TokioTimer {
    fn set_repeat_infinite(&mut self) {
        self.repeat = true;
    }

    fn set_expiry_handler(&mut self, handler: ExpiryHandler) {
        self.handler = Some(Arc::new(handler));
    }

    fn set_interval(&mut self, interval: Interval) {
        self.interval = interval;
        if self.is_running() {
            // Restart so the new interval applies from now
            self.abort();
            self.spawn();
        }
    }

    fn start(&mut self) {
        if self.is_running() {
            return;
        }
        debug!(timer = %self.name, interval = self.interval.as_secs_f64(), "timer started");
        self.spawn();
    }

    fn stop(&mut self) {
        if self.task.is_some() {
            debug!(timer = %self.name, "timer stopped");
        }
        self.abort();
    }

    fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    fn interval(&self) -> Interval {
        self.interval
    }
}

impl Drop for TokioTimer {
    fn drop(&mut self) {
        self.abort();
    }
}
