//! `validate` command implementation.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use contracts::HostBlueprint;
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    host: String,
    sensor_count: usize,
    /// Sensors per sample data type
    data_types: BTreeMap<String, usize>,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    // Check file exists
    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    // Try to load and validate
    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(summarize(&blueprint)),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

fn summarize(blueprint: &HostBlueprint) -> ConfigSummary {
    let mut data_types = BTreeMap::new();
    for sensor in &blueprint.sensors {
        *data_types.entry(sensor.data_type.to_string()).or_insert(0) += 1;
    }

    ConfigSummary {
        version: format!("{:?}", blueprint.version),
        host: blueprint.host.name.clone(),
        sensor_count: blueprint.sensors.len(),
        data_types,
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &HostBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    if blueprint.sensors.is_empty() {
        warnings.push("No sensors configured - the host will publish nothing".to_string());
    }

    for sensor in &blueprint.sensors {
        let label = if sensor.name.is_empty() {
            "<root>"
        } else {
            sensor.name.as_str()
        };

        if sensor.name.is_empty() {
            warnings.push(
                "Sensor with an empty name publishes at the root path 'value'".to_string(),
            );
        }

        match (sensor.enable, sensor.period) {
            (Some(true), None) => warnings.push(format!(
                "Sensor '{label}' is enabled without a period - it samples only on trigger"
            )),
            (None | Some(false), Some(_)) => warnings.push(format!(
                "Sensor '{label}' has a period but starts disabled"
            )),
            (None, None) => warnings.push(format!(
                "Sensor '{label}' has no initial enable or period - it stays idle until controlled"
            )),
            _ => {}
        }
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Host: {}", summary.host);
            println!("  Sensors: {}", summary.sensor_count);
            for (data_type, count) in &summary.data_types {
                println!("    {}: {}", data_type, count);
            }
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
