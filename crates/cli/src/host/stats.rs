//! Run statistics.

use std::time::Duration;

use observability::PathSummary;
use periodic_sensor::MetricsSnapshot;

/// Statistics from one agent run
#[derive(Debug, Clone, Default)]
pub struct RunStats {
    /// Total duration of the run
    pub duration: Duration,

    /// Number of sensors that were created
    pub active_sensors: usize,

    /// Scaffold counters
    pub metrics: MetricsSnapshot,

    /// Per value path sample counts and spacing
    pub paths: Vec<PathSummary>,
}

impl RunStats {
    /// Published samples per second
    pub fn samples_per_sec(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.metrics.samples_published as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Share of sample pushes the hub refused, as percentage
    pub fn failure_rate(&self) -> f64 {
        let total = self.metrics.samples_published + self.metrics.publish_failures;
        if total > 0 {
            (self.metrics.publish_failures as f64 / total as f64) * 100.0
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n=== Run Statistics ===\n");

        println!("Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Sensors: {}", self.active_sensors);
        println!("   ├─ Samples taken: {}", self.metrics.samples_taken);
        println!("   ├─ Samples published: {}", self.metrics.samples_published);
        println!(
            "   ├─ Publish failures: {} ({:.2}%)",
            self.metrics.publish_failures,
            self.failure_rate()
        );
        println!("   └─ Samples/s: {:.2}", self.samples_per_sec());

        println!("\nControl");
        println!("   ├─ Control events: {}", self.metrics.control_events);
        println!("   ├─ Rejected periods: {}", self.metrics.periods_rejected);
        println!("   ├─ Stale events: {}", self.metrics.stale_events);
        println!("   └─ Dropped expiries: {}", self.metrics.dropped_expiries);

        if !self.paths.is_empty() {
            println!("\nSample spacing (s)");
            for path in &self.paths {
                println!("   ├─ {}", path);
            }
        }

        println!();
    }
}
