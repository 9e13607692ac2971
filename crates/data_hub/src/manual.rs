//! Deterministic timers for tests and simulations
//!
//! Nothing fires on its own: time moves only through
//! [`ManualTimerService::advance`], and single expiries can be forced with
//! [`ManualTimerProbe::fire`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use contracts::{ContractError, ExpiryHandler, Interval, Timer, TimerService};

#[derive(Default)]
struct TimerState {
    name: String,
    interval: Interval,
    repeat: bool,
    running: bool,
    elapsed: Duration,
    starts: u32,
    deleted: bool,
    handler: Option<Arc<ExpiryHandler>>,
}

type Shared = Arc<Mutex<TimerState>>;

fn lock(state: &Shared) -> MutexGuard<'_, TimerState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Creates [`ManualTimer`]s and keeps a probe on each of them
#[derive(Default)]
pub struct ManualTimerService {
    timers: Mutex<Vec<Shared>>,
}

impl ManualTimerService {
    pub fn new() -> Self {
        Self::default()
    }

    fn live(&self) -> Vec<Shared> {
        let mut timers = self.timers.lock().unwrap_or_else(PoisonError::into_inner);
        timers.retain(|t| !lock(t).deleted);
        timers.clone()
    }

    /// Probe on the first live timer named `name`
    pub fn timer(&self, name: &str) -> Option<ManualTimerProbe> {
        self.live()
            .into_iter()
            .find(|t| lock(t).name == name)
            .map(ManualTimerProbe)
    }

    /// Probes on every live timer, in creation order
    pub fn timers(&self) -> Vec<ManualTimerProbe> {
        self.live().into_iter().map(ManualTimerProbe).collect()
    }

    /// Timers created and not yet dropped
    pub fn live_count(&self) -> usize {
        self.live().len()
    }

    pub fn running_count(&self) -> usize {
        self.live().iter().filter(|t| lock(t).running).count()
    }

    /// Let `by` pass on every running timer and fire what falls due.
    ///
    /// Returns the number of expiries fired.
    pub fn advance(&self, by: Duration) -> usize {
        let mut fired = 0;
        for timer in self.live() {
            let (handler, due) = {
                let mut state = lock(&timer);
                let period = state.interval.as_duration();
                if !state.running || period.is_zero() {
                    continue;
                }
                state.elapsed += by;
                let mut due = 0;
                while state.elapsed >= period {
                    state.elapsed -= period;
                    due += 1;
                    if !state.repeat {
                        state.running = false;
                        state.elapsed = Duration::ZERO;
                        break;
                    }
                }
                (state.handler.clone(), due)
            };
            if let Some(handler) = handler {
                for _ in 0..due {
                    handler();
                }
                fired += due;
            }
        }
        fired
    }

    /// Fire every running timer once
    pub fn fire_all(&self) -> usize {
        self.timers().iter().filter(|probe| probe.fire()).count()
    }
}

impl TimerService for ManualTimerService {
    fn create(&self, name: &str) -> Result<Box<dyn Timer>, ContractError> {
        let state = Arc::new(Mutex::new(TimerState {
            name: name.to_string(),
            ..TimerState::default()
        }));
        self.timers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::clone(&state));
        Ok(Box::new(ManualTimer(state)))
    }
}

/// Timer driven by its [`ManualTimerService`]
pub struct ManualTimer(Shared);

impl Timer for ManualTimer {
    fn set_repeat_infinite(&mut self) {
        lock(&self.0).repeat = true;
    }

    fn set_expiry_handler(&mut self, handler: ExpiryHandler) {
        lock(&self.0).handler = Some(Arc::new(handler));
    }

    fn set_interval(&mut self, interval: Interval) {
        let mut state = lock(&self.0);
        state.interval = interval;
        state.elapsed = Duration::ZERO;
    }

    fn start(&mut self) {
        let mut state = lock(&self.0);
        if !state.running {
            state.running = true;
            state.elapsed = Duration::ZERO;
            state.starts += 1;
        }
    }

    fn stop(&mut self) {
        let mut state = lock(&self.0);
        state.running = false;
        state.elapsed = Duration::ZERO;
    }

    fn is_running(&self) -> bool {
        lock(&self.0).running
    }

    fn interval(&self) -> Interval {
        lock(&self.0).interval
    }
}

impl Drop for ManualTimer {
    fn drop(&mut self) {
        let mut state = lock(&self.0);
        state.running = false;
        state.deleted = true;
        state.handler = None;
    }
}

/// Read-only view of a manual timer, plus forced expiry
#[derive(Clone)]
pub struct ManualTimerProbe(Shared);

impl ManualTimerProbe {
    pub fn name(&self) -> String {
        lock(&self.0).name.clone()
    }

    pub fn is_running(&self) -> bool {
        lock(&self.0).running
    }

    pub fn interval(&self) -> Interval {
        lock(&self.0).interval
    }

    /// How many times the timer went from stopped to running
    pub fn start_count(&self) -> u32 {
        lock(&self.0).starts
    }

    pub fn is_deleted(&self) -> bool {
        lock(&self.0).deleted
    }

    /// Fire one expiry if the timer is running
    pub fn fire(&self) -> bool {
        let handler = {
            let state = lock(&self.0);
            if !state.running {
                return false;
            }
            state.handler.clone()
        };
        match handler {
            Some(handler) => {
                handler();
                true
            }
            None => false,
        }
    }
}
