//! # Contracts
//!
//! Frozen interface contracts shared by every crate in the workspace.
//! Business crates depend only on this crate, reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Control-plane timestamps are seconds since the Unix epoch (f64)
//! - A timestamp of `0.0` means "now" and is resolved by the control plane
//! - Sampling periods are seconds (f64); `0.0` means "not set"

mod blueprint;
mod control_plane;
mod error;
mod event;
mod handle;
mod interval;
mod sensor_name;
mod timer;
mod value;

pub use blueprint::*;
pub use control_plane::*;
pub use error::*;
pub use event::*;
pub use handle::SensorHandle;
pub use interval::{Interval, MAX_PERIOD_SECS};
pub use sensor_name::{SensorName, MAX_NAME_BYTES};
pub use timer::*;
pub use value::*;
