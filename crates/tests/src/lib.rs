//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试
//! - 端到端控制场景（DataHub + 手动定时器，无需真实时间）
//! - 销毁安全性
//! - 配置文件驱动的流程与 tokio 定时器下的调度循环

#[cfg(test)]
mod contract_tests {
    use contracts::{Interval, SensorName, MAX_PERIOD_SECS};

    #[test]
    fn test_contracts_compile() {
        // 验证 contracts crate 可编译
        let _ = contracts::ConfigVersion::V1;
    }

    #[test]
    fn test_resource_naming_snapshot() {
        let temp = SensorName::new("temp").unwrap();
        assert_eq!(temp.resource_path("value"), "temp/value");
        assert_eq!(SensorName::new("").unwrap().resource_path("period"), "period");
        assert!(Interval::from_period(MAX_PERIOD_SECS).is_some());
        assert!(Interval::from_period(MAX_PERIOD_SECS + 1.0).is_none());
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::Arc;
    use std::time::Duration;

    use contracts::{ControlPlane, DataType, SampleValue, SensorHandle, Timestamp, TimerService};
    use data_hub::{DataHub, ManualTimerService};
    use periodic_sensor::{PeriodicSensors, SensorMode};

    struct Host {
        hub: Arc<DataHub>,
        timers: Arc<ManualTimerService>,
        sensors: PeriodicSensors,
    }

    impl Host {
        fn new() -> Self {
            let hub = Arc::new(DataHub::new());
            let timers = Arc::new(ManualTimerService::new());
            let plane: Arc<dyn ControlPlane> = hub.clone();
            let timer_service: Arc<dyn TimerService> = timers.clone();
            Self {
                sensors: PeriodicSensors::new(plane, timer_service),
                hub,
                timers,
            }
        }

        /// Numeric sensor publishing 1, 2, 3, ...
        fn counter(&mut self, name: &str) -> SensorHandle {
            let mut count = 0.0;
            self.sensors
                .create(name, DataType::Numeric, "", move |sample| {
                    count += 1.0;
                    sample.push_numeric(Timestamp::NOW, count);
                })
                .unwrap()
        }

        fn samples(&self, path: &str) -> usize {
            self.hub.published_count(path)
        }
    }

    /// Enable, then set a period: one immediate sample, timer armed
    #[test]
    fn test_scenario_enable_then_period() {
        let mut host = Host::new();
        let handle = host.counter("temp");

        host.hub.deliver_boolean("temp/enable", true).unwrap();
        host.sensors.process_pending();
        assert_eq!(host.samples("temp/value"), 0);
        assert_eq!(
            host.sensors.status(handle).unwrap().mode,
            SensorMode::EnabledUnset
        );

        host.hub.deliver_numeric("temp/period", 2.5).unwrap();
        host.sensors.process_pending();
        assert_eq!(host.samples("temp/value"), 1);

        let timer = host.timers.timer("temp").unwrap();
        assert!(timer.is_running());
        assert_eq!(timer.interval().micros, 2_500_000);

        // Two full periods
        host.timers.advance(Duration::from_secs(5));
        host.sensors.process_pending();
        assert_eq!(host.samples("temp/value"), 3);
        assert_eq!(
            host.hub.last_value("temp/value").unwrap().value,
            SampleValue::Numeric(3.0)
        );
    }

    /// Period while disabled is stored silently and used on enable
    #[test]
    fn test_scenario_period_then_enable() {
        let mut host = Host::new();
        host.counter("temp");

        host.hub.deliver_numeric("temp/period", 10.0).unwrap();
        host.sensors.process_pending();
        assert_eq!(host.samples("temp/value"), 0);
        assert!(!host.timers.timer("temp").unwrap().is_running());

        host.hub.deliver_boolean("temp/enable", true).unwrap();
        host.sensors.process_pending();
        assert_eq!(host.samples("temp/value"), 1);

        let timer = host.timers.timer("temp").unwrap();
        assert!(timer.is_running());
        assert_eq!(timer.interval().micros, 10_000_000);
    }

    /// Same period is a no-op, zero period disarms
    #[test]
    fn test_scenario_repeat_period_and_zero() {
        let mut host = Host::new();
        let handle = host.counter("temp");
        host.hub.deliver_numeric("temp/period", 4.0).unwrap();
        host.hub.deliver_boolean("temp/enable", true).unwrap();
        host.sensors.process_pending();
        assert_eq!(host.samples("temp/value"), 1);

        let timer = host.timers.timer("temp").unwrap();
        assert_eq!(timer.start_count(), 1);

        host.hub.deliver_numeric("temp/period", 4.0).unwrap();
        host.sensors.process_pending();
        assert_eq!(host.samples("temp/value"), 1);
        assert_eq!(timer.start_count(), 1);
        assert!(timer.is_running());

        host.hub.deliver_numeric("temp/period", 0.0).unwrap();
        host.sensors.process_pending();
        assert!(!timer.is_running());

        let status = host.sensors.status(handle).unwrap();
        assert_eq!(status.mode, SensorMode::EnabledUnset);
        assert_eq!(status.period, 0.0);
        assert!(status.enabled);
    }

    #[test]
    fn test_trigger_only_when_enabled() {
        let mut host = Host::new();
        host.counter("temp");

        host.hub.deliver_trigger("temp/trigger").unwrap();
        host.sensors.process_pending();
        assert_eq!(host.samples("temp/value"), 0);

        host.hub.deliver_boolean("temp/enable", true).unwrap();
        host.hub.deliver_trigger("temp/trigger").unwrap();
        host.hub.deliver_trigger("temp/trigger").unwrap();
        host.sensors.process_pending();
        assert_eq!(host.samples("temp/value"), 2);
        assert!(!host.timers.timer("temp").unwrap().is_running());
    }

    #[test]
    fn test_out_of_range_period_disarms() {
        let mut host = Host::new();
        host.counter("temp");
        host.hub.deliver_numeric("temp/period", 1.0).unwrap();
        host.hub.deliver_boolean("temp/enable", true).unwrap();
        host.sensors.process_pending();

        host.hub.deliver_numeric("temp/period", -3.0).unwrap();
        host.sensors.process_pending();

        assert!(!host.timers.timer("temp").unwrap().is_running());
        assert_eq!(host.sensors.metrics().periods_rejected(), 1);
        assert_eq!(host.samples("temp/value"), 1);
    }

    #[test]
    fn test_sensors_are_independent() {
        let mut host = Host::new();
        host.counter("a");
        host.counter("b");

        host.hub.deliver_numeric("a/period", 1.0).unwrap();
        host.hub.deliver_boolean("a/enable", true).unwrap();
        host.hub.deliver_numeric("b/period", 2.0).unwrap();
        host.sensors.process_pending();

        host.timers.advance(Duration::from_secs(4));
        host.sensors.process_pending();

        assert_eq!(host.samples("a/value"), 5);
        assert_eq!(host.samples("b/value"), 0);
        assert_eq!(host.timers.running_count(), 1);
    }

    #[test]
    fn test_mixed_value_types() {
        let mut host = Host::new();
        host.sensors
            .create("door", DataType::Boolean, "", |sample| {
                sample.push_boolean(Timestamp(5.0), true)
            })
            .unwrap();
        host.sensors
            .create("label", DataType::String, "", |sample| {
                sample.push_string(Timestamp(6.0), "ok")
            })
            .unwrap();
        host.sensors
            .create_json("pose", r#"{"x":0}"#, |sample| {
                sample.push_json(Timestamp(7.0), r#"{"x":1}"#)
            })
            .unwrap();

        for name in ["door", "label", "pose"] {
            host.hub
                .deliver_trigger(&format!("{name}/trigger"))
                .unwrap();
            host.hub
                .deliver_boolean(&format!("{name}/enable"), true)
                .unwrap();
            host.hub
                .deliver_trigger(&format!("{name}/trigger"))
                .unwrap();
        }
        host.sensors.process_pending();

        let door = host.hub.last_value("door/value").unwrap();
        assert_eq!(door.value, SampleValue::Boolean(true));
        assert_eq!(door.timestamp, Timestamp(5.0));
        assert_eq!(
            host.hub.last_value("label/value").unwrap().value,
            SampleValue::String("ok".into())
        );
        assert_eq!(
            host.hub.last_value("pose/value").unwrap().value,
            SampleValue::Json(r#"{"x":1}"#.into())
        );
        assert_eq!(host.sensors.metrics().samples_published(), 3);
    }
}

#[cfg(test)]
mod teardown_tests {
    use std::sync::Arc;
    use std::time::Duration;

    use contracts::{ContractError, ControlPlane, DataType, Timestamp, TimerService};
    use data_hub::{DataHub, ManualTimerService};
    use periodic_sensor::{PeriodicSensors, SensorError};

    fn setup() -> (Arc<DataHub>, Arc<ManualTimerService>, PeriodicSensors) {
        let hub = Arc::new(DataHub::new());
        let timers = Arc::new(ManualTimerService::new());
        let plane: Arc<dyn ControlPlane> = hub.clone();
        let timer_service: Arc<dyn TimerService> = timers.clone();
        let sensors = PeriodicSensors::new(plane, timer_service);
        (hub, timers, sensors)
    }

    #[test]
    fn test_destroy_armed_sensor() {
        let (hub, timers, mut sensors) = setup();
        let handle = sensors
            .create("temp", DataType::Numeric, "C", |sample| {
                sample.push_numeric(Timestamp::NOW, 1.0)
            })
            .unwrap();
        hub.deliver_numeric("temp/period", 1.0).unwrap();
        hub.deliver_boolean("temp/enable", true).unwrap();
        sensors.process_pending();
        let probe = timers.timer("temp").unwrap();
        assert!(probe.is_running());

        sensors.destroy(handle).unwrap();

        assert!(probe.is_deleted());
        assert_eq!(timers.live_count(), 0);
        assert_eq!(hub.total_handlers(), 0);
        assert!(hub.resources().is_empty());
        assert!(matches!(
            hub.deliver_boolean("temp/enable", false),
            Err(ContractError::ResourceNotFound { .. })
        ));

        // Second destroy hits a stale handle
        assert!(matches!(
            sensors.destroy(handle),
            Err(SensorError::NotFound(h)) if h == handle
        ));
    }

    #[test]
    fn test_queued_events_for_destroyed_sensor_are_dropped() {
        let (hub, timers, mut sensors) = setup();
        let handle = sensors
            .create("temp", DataType::Numeric, "", |sample| {
                sample.push_numeric(Timestamp::NOW, 1.0)
            })
            .unwrap();
        hub.deliver_numeric("temp/period", 1.0).unwrap();
        hub.deliver_boolean("temp/enable", true).unwrap();
        sensors.process_pending();

        // Expiries and a trigger are queued, then the sensor goes away
        timers.advance(Duration::from_secs(3));
        hub.deliver_trigger("temp/trigger").unwrap();
        sensors.destroy(handle).unwrap();

        assert_eq!(sensors.process_pending(), 4);
        assert_eq!(sensors.metrics().stale_events(), 4);
        assert_eq!(hub.published_count("temp/value"), 1);
    }

    #[test]
    fn test_slot_reuse_keeps_old_handle_stale() {
        let (hub, _timers, mut sensors) = setup();
        let old = sensors
            .create("a", DataType::Boolean, "", |sample| {
                sample.push_boolean(Timestamp::NOW, true)
            })
            .unwrap();
        sensors.destroy(old).unwrap();

        let new = sensors
            .create("b", DataType::Boolean, "", |sample| {
                sample.push_boolean(Timestamp::NOW, false)
            })
            .unwrap();
        assert_eq!(old.index(), new.index());
        assert_ne!(old, new);

        sensors.set_enabled(old, true);
        assert!(!sensors.status(new).unwrap().enabled);

        sensors.set_enabled(new, true);
        sensors.trigger(new);
        assert_eq!(hub.published_count("b/value"), 1);
        assert!(sensors.status(old).is_err());
    }

    #[test]
    fn test_drop_releases_everything() {
        let (hub, timers, mut sensors) = setup();
        for name in ["a", "b", "c"] {
            sensors
                .create(name, DataType::Numeric, "", |sample| {
                    sample.push_numeric(Timestamp::NOW, 0.0)
                })
                .unwrap();
        }
        assert_eq!(hub.resources().len(), 12);
        assert_eq!(hub.total_handlers(), 9);

        drop(sensors);

        assert!(hub.resources().is_empty());
        assert_eq!(hub.total_handlers(), 0);
        assert_eq!(timers.live_count(), 0);
    }
}

#[cfg(test)]
mod config_flow_tests {
    use std::io::Write;
    use std::sync::Arc;

    use config_loader::ConfigLoader;
    use contracts::{ControlPlane, DataType, SampleValue, Timestamp, TimerService};
    use data_hub::{DataHub, ManualTimerService};
    use periodic_sensor::PeriodicSensors;

    const CONFIG: &str = r#"
version = "V1"

[host]
name = "flow"

[[sensors]]
name = "temp"
data_type = "numeric"
units = "degC"
source = "random_walk"
enable = true
period = 2.5

[[sensors]]
name = "status"
data_type = "json"
source = "json_snapshot"
json_example = '{"ok":true}'
"#;

    #[test]
    fn test_config_file_to_running_sensors() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(CONFIG.as_bytes()).unwrap();
        let blueprint = ConfigLoader::load_from_path(file.path()).unwrap();

        let hub = Arc::new(DataHub::new());
        let timers = Arc::new(ManualTimerService::new());
        let plane: Arc<dyn ControlPlane> = hub.clone();
        let timer_service: Arc<dyn TimerService> = timers.clone();
        let mut sensors = PeriodicSensors::new(plane, timer_service);

        for config in &blueprint.sensors {
            match config.data_type {
                DataType::Json => {
                    let example = config.json_example.clone().unwrap();
                    sensors
                        .create_json(&config.name, &example, |sample| {
                            sample.push_json(Timestamp::NOW, r#"{"ok":false}"#)
                        })
                        .unwrap();
                }
                data_type => {
                    sensors
                        .create(&config.name, data_type, &config.units, |sample| {
                            sample.push_numeric(Timestamp::NOW, 21.5)
                        })
                        .unwrap();
                }
            }
        }

        for config in &blueprint.sensors {
            if let Some(period) = config.period {
                hub.deliver_numeric(&format!("{}/period", config.name), period)
                    .unwrap();
            }
            if let Some(enable) = config.enable {
                hub.deliver_boolean(&format!("{}/enable", config.name), enable)
                    .unwrap();
            }
        }
        sensors.process_pending();

        assert_eq!(hub.resource("temp/value").unwrap().units, "degC");
        assert_eq!(
            hub.resource("status/value").unwrap().json_example.as_deref(),
            Some(r#"{"ok":true}"#)
        );
        assert_eq!(
            hub.last_value("temp/value").unwrap().value,
            SampleValue::Numeric(21.5)
        );
        assert!(hub.last_value("status/value").is_none());
        assert_eq!(timers.running_count(), 1);
    }

    #[test]
    fn test_invalid_config_file_rejected() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(b"[[sensors]]\nname = \"a/b\"\ndata_type = \"numeric\"\n")
            .unwrap();
        assert!(ConfigLoader::load_from_path(file.path()).is_err());
    }
}

#[cfg(test)]
mod runtime_tests {
    use std::sync::Arc;
    use std::time::Duration;

    use contracts::{ControlPlane, DataType, Timestamp, TimerService};
    use data_hub::{DataHub, TokioTimerService};
    use periodic_sensor::PeriodicSensors;

    /// Dispatch loop against real tokio timers, with time paused
    #[tokio::test(start_paused = true)]
    async fn test_dispatch_loop_with_tokio_timers() {
        let hub = Arc::new(DataHub::new());
        let plane: Arc<dyn ControlPlane> = hub.clone();
        let timers: Arc<dyn TimerService> = Arc::new(TokioTimerService::current().unwrap());
        let mut sensors = PeriodicSensors::new(plane, timers);

        let mut count = 0.0;
        sensors
            .create("tick", DataType::Numeric, "", move |sample| {
                count += 1.0;
                sample.push_numeric(Timestamp::NOW, count);
            })
            .unwrap();

        hub.deliver_numeric("tick/period", 1.0).unwrap();
        hub.deliver_boolean("tick/enable", true).unwrap();

        // Immediate sample plus expiries at 1s, 2s and 3s
        sensors
            .run(tokio::time::sleep(Duration::from_millis(3500)))
            .await;
        assert_eq!(hub.published_count("tick/value"), 4);

        hub.deliver_boolean("tick/enable", false).unwrap();
        sensors
            .run(tokio::time::sleep(Duration::from_secs(5)))
            .await;
        assert_eq!(hub.published_count("tick/value"), 4);

        sensors.destroy_all();
        assert!(sensors.is_empty());
    }
}
