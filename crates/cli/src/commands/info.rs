//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::{HostBlueprint, SensorConfig, SensorName};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    host: String,
    sensors: Vec<SensorInfo>,
}

#[derive(Serialize)]
struct SensorInfo {
    name: String,
    data_type: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    units: String,
    source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    enable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    period: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    resources: Option<ResourceInfo>,
}

#[derive(Serialize)]
struct ResourceInfo {
    value: String,
    enable: String,
    period: String,
    trigger: String,
}

impl ResourceInfo {
    fn new(name: &str) -> Result<Self> {
        let name = SensorName::new(name)?;
        Ok(Self {
            value: name.resource_path("value"),
            enable: name.resource_path("enable"),
            period: name.resource_path("period"),
            trigger: name.resource_path("trigger"),
        })
    }
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    let info = build_config_info(&blueprint, args.resources)?;
    if args.json {
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&info);
    }

    Ok(())
}

fn build_config_info(blueprint: &HostBlueprint, resources: bool) -> Result<ConfigInfo> {
    let sensors = blueprint
        .sensors
        .iter()
        .map(|sensor| sensor_info(sensor, resources))
        .collect::<Result<Vec<_>>>()?;

    Ok(ConfigInfo {
        version: format!("{:?}", blueprint.version),
        host: blueprint.host.name.clone(),
        sensors,
    })
}

fn sensor_info(sensor: &SensorConfig, resources: bool) -> Result<SensorInfo> {
    Ok(SensorInfo {
        name: sensor.name.clone(),
        data_type: sensor.data_type.to_string(),
        units: sensor.units.clone(),
        source: format!("{:?}", sensor.source),
        enable: sensor.enable,
        period: sensor.period,
        resources: if resources {
            Some(ResourceInfo::new(&sensor.name)?)
        } else {
            None
        },
    })
}

fn print_config_info(info: &ConfigInfo) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║               Periodic Sensor Host Configuration             ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("🖥  Host");
    println!("   ├─ Version: {}", info.version);
    println!("   └─ Name: {}", info.host);

    println!("\n📡 Sensors ({})", info.sensors.len());
    for (i, sensor) in info.sensors.iter().enumerate() {
        let is_last = i == info.sensors.len() - 1;
        let prefix = if is_last { "└─" } else { "├─" };
        let child_prefix = if is_last { "   " } else { "│  " };

        let name = if sensor.name.is_empty() {
            "<root>"
        } else {
            sensor.name.as_str()
        };
        let units = if sensor.units.is_empty() {
            String::new()
        } else {
            format!(" [{}]", sensor.units)
        };
        let enable = match sensor.enable {
            Some(true) => "enabled",
            Some(false) | None => "disabled",
        };
        let period = match sensor.period {
            Some(period) => format!("every {period}s"),
            None => "no period".to_string(),
        };

        println!(
            "   {} {} ({}{}, {}) {}, {}",
            prefix, name, sensor.data_type, units, sensor.source, enable, period
        );

        if let Some(ref resources) = sensor.resources {
            println!("   {}  ├─ {}", child_prefix, resources.value);
            println!("   {}  ├─ {}", child_prefix, resources.enable);
            println!("   {}  ├─ {}", child_prefix, resources.period);
            println!("   {}  └─ {}", child_prefix, resources.trigger);
        }
    }

    println!();
}
