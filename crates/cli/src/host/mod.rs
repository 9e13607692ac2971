//! Agent host - wires configured sensors to the data hub.
//!
//! The agent owns the [`PeriodicSensors`] scaffold and an in-memory
//! [`DataHub`]. Control values reach the sensors through the hub's push
//! handlers, whether they come from the initial configuration or from the
//! console.

pub mod console;
pub mod sources;
pub mod stats;

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use anyhow::{Context, Result};
use contracts::{ControlPlane, DataType, HostBlueprint, SensorName, TimerService};
use data_hub::DataHub;
use observability::SampleStatsAggregator;
use periodic_sensor::PeriodicSensors;
use tracing::{debug, info, instrument};

pub use stats::RunStats;

/// A running set of periodic sensors
pub struct Agent {
    name: String,
    hub: Arc<DataHub>,
    sensors: PeriodicSensors,
    sample_stats: Arc<Mutex<SampleStatsAggregator>>,
}

impl Agent {
    /// Create every configured sensor (disabled, no period)
    #[instrument(name = "agent_build", skip_all, fields(host = %blueprint.host.name))]
    pub fn build(blueprint: &HostBlueprint, timers: Arc<dyn TimerService>) -> Result<Self> {
        let hub = Arc::new(DataHub::new());

        let sample_stats = Arc::new(Mutex::new(SampleStatsAggregator::new()));
        let observer_stats = Arc::clone(&sample_stats);
        hub.subscribe(move |publication| {
            observer_stats
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .update(&publication.path, publication.timestamp);
        });

        let plane: Arc<dyn ControlPlane> = hub.clone();
        let mut sensors = PeriodicSensors::new(plane, timers);
        let started = Instant::now();

        for config in &blueprint.sensors {
            let callback = sources::sample_callback(config.source, &config.name, started);
            let handle = match config.data_type {
                DataType::Json => {
                    let example = config
                        .json_example
                        .clone()
                        .unwrap_or_else(sources::default_json_example);
                    sensors.create_json(&config.name, &example, callback)
                }
                data_type => sensors.create(&config.name, data_type, &config.units, callback),
            }
            .with_context(|| format!("Failed to create sensor '{}'", config.name))?;

            debug!(
                sensor = %config.name,
                handle = %handle,
                source = ?config.source,
                "sensor ready"
            );
        }

        info!(sensors = sensors.len(), "agent built");
        Ok(Self {
            name: blueprint.host.name.clone(),
            hub,
            sensors,
            sample_stats,
        })
    }

    /// Push the configured initial `period` and `enable` values
    pub fn apply_initial_controls(&mut self, blueprint: &HostBlueprint) -> Result<()> {
        for config in &blueprint.sensors {
            let name = SensorName::new(&config.name)?;
            if let Some(period) = config.period {
                self.hub
                    .deliver_numeric(&name.resource_path("period"), period)
                    .with_context(|| format!("Failed to set period of '{name}'"))?;
            }
            if let Some(enable) = config.enable {
                self.hub
                    .deliver_boolean(&name.resource_path("enable"), enable)
                    .with_context(|| format!("Failed to set enable of '{name}'"))?;
            }
        }

        let handled = self.sensors.process_pending();
        debug!(handled, "initial controls applied");
        Ok(())
    }

    /// Log every published sample at info level
    pub fn echo_samples(&self) {
        self.hub.subscribe(|publication| {
            info!(
                path = %publication.path,
                timestamp = publication.timestamp.as_secs_f64(),
                value = %publication.value,
                "sample"
            );
        });
    }

    pub fn hub(&self) -> &Arc<DataHub> {
        &self.hub
    }

    pub fn sensors(&self) -> &PeriodicSensors {
        &self.sensors
    }

    /// Dispatch events until `shutdown` completes
    #[instrument(name = "agent_run", skip_all, fields(host = %self.name))]
    pub async fn run<F>(&mut self, shutdown: F) -> RunStats
    where
        F: Future<Output = ()>,
    {
        let started = Instant::now();
        self.sensors.run(shutdown).await;
        self.stats(started)
    }

    fn stats(&self, started: Instant) -> RunStats {
        let paths = self
            .sample_stats
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .summary();
        RunStats {
            duration: started.elapsed(),
            active_sensors: self.sensors.len(),
            metrics: self.sensors.metrics().snapshot(),
            paths,
        }
    }

    /// Destroy every sensor
    pub fn shutdown(mut self) {
        self.sensors.destroy_all();
        info!(host = %self.name, "agent stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::SampleValue;
    use data_hub::ManualTimerService;
    use std::time::Duration;

    const CONFIG: &str = r#"
[host]
name = "test-agent"

[[sensors]]
name = "count"
data_type = "numeric"
source = "counter"
enable = true
period = 2.0

[[sensors]]
name = "door"
data_type = "boolean"
source = "heartbeat"

[[sensors]]
name = "pose"
data_type = "json"
source = "json_snapshot"
json_example = '{"seq":0,"uptime":0.0}'
enable = true
"#;

    fn agent() -> (Agent, Arc<ManualTimerService>, HostBlueprint) {
        let blueprint =
            config_loader::ConfigLoader::load_from_str(CONFIG, config_loader::ConfigFormat::Toml)
                .unwrap();
        let timers = Arc::new(ManualTimerService::new());
        let agent = Agent::build(&blueprint, timers.clone()).unwrap();
        (agent, timers, blueprint)
    }

    #[test]
    fn test_build_creates_sensors() {
        let (agent, timers, _) = agent();
        assert_eq!(agent.sensors().len(), 3);
        assert_eq!(timers.live_count(), 3);
        assert!(agent.hub().contains("door/trigger"));
        assert_eq!(
            agent.hub().resource("pose/value").unwrap().json_example.as_deref(),
            Some(r#"{"seq":0,"uptime":0.0}"#)
        );
    }

    #[test]
    fn test_initial_controls() {
        let (mut agent, timers, blueprint) = agent();
        agent.apply_initial_controls(&blueprint).unwrap();

        // Armed sensor sampled once on enable
        assert_eq!(
            agent.hub().last_value("count/value").unwrap().value,
            SampleValue::Numeric(1.0)
        );
        assert!(timers.timer("count").unwrap().is_running());

        // Enabled without period: no sample, no timer
        assert!(agent.hub().last_value("pose/value").is_none());
        assert!(!timers.timer("pose").unwrap().is_running());

        timers.advance(Duration::from_secs(4));
        agent.sensors.process_pending();
        assert_eq!(agent.hub().published_count("count/value"), 3);
    }

    #[tokio::test]
    async fn test_run_until_shutdown() {
        let (mut agent, timers, blueprint) = agent();
        agent.apply_initial_controls(&blueprint).unwrap();
        agent.hub().deliver_trigger("pose/trigger").unwrap();
        timers.advance(Duration::from_secs(2));

        let stats = agent
            .run(tokio::time::sleep(Duration::from_millis(50)))
            .await;

        assert_eq!(stats.active_sensors, 3);
        assert_eq!(stats.metrics.samples_published, 3);
        assert_eq!(stats.paths.len(), 2);
        agent.shutdown();
        assert!(timers.timers().is_empty());
    }
}
