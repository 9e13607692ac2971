//! Demo sample generators
//!
//! Each configured sensor gets one of these as its sample callback.

use std::time::Instant;

use contracts::{SampleSource, Timestamp};
use periodic_sensor::{SampleCallback, SampleDispatch};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Random walk stays inside this band
const WALK_BOUND: f64 = 100.0;
const WALK_STEP: f64 = 0.5;

/// Build the sample callback for `source`
pub fn sample_callback(source: SampleSource, label: &str, started: Instant) -> SampleCallback {
    match source {
        SampleSource::Counter => {
            let mut count = 0u64;
            Box::new(move |sample: &mut SampleDispatch<'_>| {
                count += 1;
                sample.push_numeric(Timestamp::NOW, count as f64);
            })
        }
        SampleSource::RandomWalk => {
            let mut rng = StdRng::from_os_rng();
            let mut value = 0.0f64;
            Box::new(move |sample: &mut SampleDispatch<'_>| {
                value = (value + rng.random_range(-WALK_STEP..=WALK_STEP))
                    .clamp(-WALK_BOUND, WALK_BOUND);
                sample.push_numeric(Timestamp::NOW, value);
            })
        }
        SampleSource::Uptime => Box::new(move |sample: &mut SampleDispatch<'_>| {
            sample.push_numeric(Timestamp::NOW, started.elapsed().as_secs_f64());
        }),
        SampleSource::Heartbeat => {
            let mut beat = false;
            Box::new(move |sample: &mut SampleDispatch<'_>| {
                beat = !beat;
                sample.push_boolean(Timestamp::NOW, beat);
            })
        }
        SampleSource::Label => {
            let prefix = if label.is_empty() { "sample" } else { label }.to_string();
            let mut seq = 0u64;
            Box::new(move |sample: &mut SampleDispatch<'_>| {
                seq += 1;
                sample.push_string(Timestamp::NOW, &format!("{prefix}-{seq}"));
            })
        }
        SampleSource::JsonSnapshot => {
            let mut seq = 0u64;
            Box::new(move |sample: &mut SampleDispatch<'_>| {
                seq += 1;
                let doc = serde_json::json!({
                    "seq": seq,
                    "uptime": started.elapsed().as_secs_f64(),
                });
                sample.push_json(Timestamp::NOW, &doc.to_string());
            })
        }
    }
}

/// Example document advertised for a json sensor without one
pub fn default_json_example() -> String {
    serde_json::json!({ "seq": 0, "uptime": 0.0 }).to_string()
}
