//! 配置校验模块
//!
//! 校验规则：
//! - 字段级约束 (validator derive)：名称长度、period 范围
//! - sensor name 合法且唯一
//! - period 必须在 (0, 2^31-1] 之内
//! - source 产生的数据类型与 data_type 一致
//! - json 传感器必须提供可解析的 json_example

use std::collections::HashSet;

use contracts::{ContractError, DataType, HostBlueprint, Interval, SensorName};
use validator::Validate;

/// 校验 HostBlueprint 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(blueprint: &HostBlueprint) -> Result<(), ContractError> {
    validate_fields(blueprint)?;
    validate_sensor_names(blueprint)?;
    validate_periods(blueprint)?;
    validate_sources(blueprint)?;
    validate_json_examples(blueprint)?;
    Ok(())
}

/// 字段级校验
fn validate_fields(blueprint: &HostBlueprint) -> Result<(), ContractError> {
    blueprint
        .validate()
        .map_err(|e| ContractError::config_validation("fields", e.to_string()))
}

/// 校验 sensor name 合法性与唯一性
fn validate_sensor_names(blueprint: &HostBlueprint) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (idx, sensor) in blueprint.sensors.iter().enumerate() {
        SensorName::new(&sensor.name).map_err(|e| {
            ContractError::config_validation(format!("sensors[{idx}].name"), e.to_string())
        })?;
        if !seen.insert(sensor.name.as_str()) {
            return Err(ContractError::config_validation(
                format!("sensors[name={}]", sensor.name),
                "duplicate sensor name",
            ));
        }
    }
    Ok(())
}

/// 校验初始 period
fn validate_periods(blueprint: &HostBlueprint) -> Result<(), ContractError> {
    for sensor in &blueprint.sensors {
        if let Some(period) = sensor.period {
            if !Interval::is_valid_period(period) {
                return Err(ContractError::config_validation(
                    format!("sensors[{}].period", sensor.name),
                    format!("period must be in (0, 2147483647], got {period}"),
                ));
            }
        }
    }
    Ok(())
}

/// 校验 source 与 data_type 一致
fn validate_sources(blueprint: &HostBlueprint) -> Result<(), ContractError> {
    for sensor in &blueprint.sensors {
        if sensor.data_type == DataType::Trigger {
            return Err(ContractError::config_validation(
                format!("sensors[{}].data_type", sensor.name),
                "trigger is not a sample data type",
            ));
        }
        if sensor.source.data_type() != sensor.data_type {
            return Err(ContractError::config_validation(
                format!("sensors[{}].source", sensor.name),
                format!(
                    "source {:?} produces {} samples, sensor declares {}",
                    sensor.source,
                    sensor.source.data_type(),
                    sensor.data_type
                ),
            ));
        }
    }
    Ok(())
}

/// 校验 json_example
fn validate_json_examples(blueprint: &HostBlueprint) -> Result<(), ContractError> {
    for sensor in &blueprint.sensors {
        let field = format!("sensors[{}].json_example", sensor.name);
        match (sensor.data_type, sensor.json_example.as_deref()) {
            (DataType::Json, None) => {
                return Err(ContractError::config_validation(
                    field,
                    "json sensors require json_example",
                ));
            }
            (DataType::Json, Some(example)) => {
                serde_json::from_str::<serde_json::Value>(example).map_err(|e| {
                    ContractError::config_validation(&field, format!("invalid json: {e}"))
                })?;
            }
            (_, Some(_)) => {
                return Err(ContractError::config_validation(
                    field,
                    "json_example is only allowed on json sensors",
                ));
            }
            (_, None) => {}
        }
    }
    Ok(())
}
