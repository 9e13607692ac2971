//! # Data Hub
//!
//! Host-side collaborators for periodic sensors:
//!
//! - [`DataHub`]: in-memory control plane (resources, push handlers, samples)
//! - [`TokioTimerService`]: timers backed by tokio tasks
//! - [`ManualTimerService`]: timers that only fire when told to

mod hub;
mod manual;
mod timer;

pub use hub::{DataHub, Direction, Observer, Publication, ResourceInfo, DEFAULT_HISTORY};
pub use manual::{ManualTimer, ManualTimerProbe, ManualTimerService};
pub use timer::{TokioTimer, TokioTimerService};
