//! Control state machine
//!
//! 纯状态机：只计算状态转换和需要执行的副作用，不直接操作定时器或数据中心。
//! 副作用由 [`crate::SensorInstance`] 按固定顺序执行：
//! 设置间隔 → 采样 → 启动/停止定时器。

use std::fmt;

use contracts::Interval;
use serde::Serialize;

/// Externally visible sensor mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorMode {
    /// `enabled == false`, timer stopped
    Disabled,
    /// Enabled but no period set: samples only on trigger
    EnabledUnset,
    /// Enabled with a period: timer running
    EnabledArmed,
}

impl fmt::Display for SensorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Disabled => "disabled",
            Self::EnabledUnset => "enabled (no period)",
            Self::EnabledArmed => "armed",
        };
        f.write_str(s)
    }
}

/// What to do with the timer after sampling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimerAction {
    #[default]
    Keep,
    Start,
    Stop,
}

/// Effects of one control event
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Transition {
    /// New timer interval
    pub set_interval: Option<Interval>,
    /// Invoke the sample callback once
    pub sample: bool,
    pub timer: TimerAction,
    /// Out-of-range period that was rejected (for the error report)
    pub rejected_period: Option<f64>,
}

impl Transition {
    const NONE: Self = Self {
        set_interval: None,
        sample: false,
        timer: TimerAction::Keep,
        rejected_period: None,
    };

    fn sample_only() -> Self {
        Self {
            sample: true,
            ..Self::NONE
        }
    }

    /// True if nothing happens
    pub fn is_noop(&self) -> bool {
        *self == Self::NONE
    }
}

/// Control state of one sensor.
///
/// Invariant: the timer runs exactly when `enabled && period > 0`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ControlState {
    enabled: bool,
    period: f64,
}

impl ControlState {
    /// Disabled, no period
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Sampling period in seconds, `0.0` = unset
    pub fn period(&self) -> f64 {
        self.period
    }

    /// True when the timer should be running
    pub fn is_armed(&self) -> bool {
        self.enabled && self.period > 0.0
    }

    pub fn mode(&self) -> SensorMode {
        match (self.enabled, self.period > 0.0) {
            (false, _) => SensorMode::Disabled,
            (true, false) => SensorMode::EnabledUnset,
            (true, true) => SensorMode::EnabledArmed,
        }
    }

    /// `<name>/enable` received `enable`
    pub fn set_enabled(&mut self, enable: bool) -> Transition {
        if self.enabled == enable {
            return Transition::NONE;
        }
        self.enabled = enable;

        if !enable {
            return Transition {
                timer: TimerAction::Stop,
                ..Transition::NONE
            };
        }
        if self.period > 0.0 {
            // Sample immediately, then every period
            Transition {
                sample: true,
                timer: TimerAction::Start,
                ..Transition::NONE
            }
        } else {
            Transition::NONE
        }
    }

    /// `<name>/period` received `period` seconds
    pub fn set_period(&mut self, period: f64) -> Transition {
        // Exact comparison: any difference at all is a change
        if period == self.period {
            return Transition::NONE;
        }

        let Some(interval) = Interval::from_period(period) else {
            self.period = 0.0;
            return Transition {
                timer: TimerAction::Stop,
                rejected_period: Some(period),
                ..Transition::NONE
            };
        };

        let was_unset = self.period == 0.0;
        self.period = period;

        if was_unset && self.enabled {
            Transition {
                set_interval: Some(interval),
                sample: true,
                timer: TimerAction::Start,
                rejected_period: None,
            }
        } else {
            // A running timer keeps running at the new interval
            Transition {
                set_interval: Some(interval),
                ..Transition::NONE
            }
        }
    }

    /// `<name>/trigger` fired
    pub fn trigger(&self) -> Transition {
        if self.enabled {
            Transition::sample_only()
        } else {
            Transition::NONE
        }
    }

    /// The timer expired.
    ///
    /// An expiry that arrives after the sensor was disarmed is dropped.
    pub fn timer_expired(&self) -> Transition {
        if self.is_armed() {
            Transition::sample_only()
        } else {
            Transition::NONE
        }
    }
}
