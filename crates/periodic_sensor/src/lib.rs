//! # Periodic Sensor
//!
//! 周期性传感器脚手架：把一个采样回调变成一个可以通过数据中心控制的传感器。
//!
//! 每个传感器在控制平面上拥有四个资源：
//!
//! | 资源 | 方向 | 类型 |
//! |---|---|---|
//! | `<name>/value` | input | 传感器数据类型 |
//! | `<name>/enable` | output | boolean |
//! | `<name>/period` | output | numeric (秒) |
//! | `<name>/trigger` | output | trigger (可选) |
//!
//! 定时器运行当且仅当 `enable == true && period > 0`。
//! 所有控制事件和定时器到期事件先进入队列，再由 [`PeriodicSensors`] 串行处理，
//! 因此同一个传感器的采样回调不会并发执行。
//!
//! ## 使用示例
//!
//! ```ignore
//! let mut sensors = PeriodicSensors::new(hub.clone(), timers);
//! let temp = sensors.create("temp", DataType::Numeric, "degC", |sample| {
//!     sample.push_numeric(Timestamp::NOW, read_temperature());
//! })?;
//!
//! sensors.run(shutdown_signal()).await;
//! ```

pub mod control;
pub mod dispatch;
pub mod error;
pub mod metrics;
pub mod registry;
pub mod scaffold;
pub mod sensor;
pub mod state;

pub use control::{ControlChannel, EventSender, ResourcePaths, ValueKind};
pub use dispatch::SampleDispatch;
pub use error::{Result, SensorError};
pub use metrics::{MetricsSnapshot, SensorMetrics};
pub use registry::HandleRegistry;
pub use scaffold::PeriodicSensors;
pub use sensor::{SampleCallback, SensorInstance, SensorStatus};
pub use state::{ControlState, SensorMode, TimerAction, Transition};
