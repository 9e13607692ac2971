//! Timer traits - host-supplied repeating timers

use crate::{ContractError, Interval};

/// Called on every timer expiry
pub type ExpiryHandler = Box<dyn Fn() + Send + Sync>;

/// A single host timer.
///
/// Dropping the timer deletes it; a dropped timer never fires again.
pub trait Timer: Send {
    /// Repeat forever once started
    fn set_repeat_infinite(&mut self);

    /// Install the expiry handler
    fn set_expiry_handler(&mut self, handler: ExpiryHandler);

    /// Set the firing interval.
    ///
    /// A running timer keeps running at the new interval.
    fn set_interval(&mut self, interval: Interval);

    /// Start the timer (no-op if already running)
    fn start(&mut self);

    /// Stop the timer (no-op if already stopped)
    fn stop(&mut self);

    /// True while started and not stopped
    fn is_running(&self) -> bool;

    /// Currently configured interval
    fn interval(&self) -> Interval;
}

/// Creates timers
pub trait TimerService: Send + Sync {
    /// Create a stopped timer with the given diagnostic name
    fn create(&self, name: &str) -> Result<Box<dyn Timer>, ContractError>;
}
