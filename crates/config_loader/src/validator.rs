//! 配置校验模块
//!
//! 校验规则：
//! - 字段范围 (validator derive): capacity / timeout / period / workers > 0
//! - 调度并发上限 (max_concurrent_tasks / max_workers) <= 65536
//! - hub.role 不能是 unknown
//! - device code 唯一且非空
//! - device identify 非空
//! - topic_template 必须包含 `{device}`

use std::collections::HashSet;

use contracts::{ContractError, HubConfig, SourceType};
use validator::Validate;

/// 校验 HubConfig 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(config: &HubConfig) -> Result<(), ContractError> {
    validate_fields(config)?;
    validate_role(config)?;
    validate_devices(config)?;
    validate_topic_template(config)?;
    Ok(())
}

/// 派生规则 (range / length)
fn validate_fields(config: &HubConfig) -> Result<(), ContractError> {
    config.validate().map_err(|errors| {
        let field = errors
            .errors()
            .keys()
            .next()
            .map(|k| k.to_string())
            .unwrap_or_else(|| "config".to_string());
        ContractError::config_validation(field, errors.to_string())
    })
}

/// 本地角色必须是 cloud 或 edge
fn validate_role(config: &HubConfig) -> Result<(), ContractError> {
    if config.hub.role == SourceType::Unknown {
        return Err(ContractError::config_validation(
            "hub.role",
            "local role must be 'cloud' or 'edge'",
        ));
    }
    Ok(())
}

/// 校验 device code 唯一性与 identify
fn validate_devices(config: &HubConfig) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (idx, device) in config.devices.iter().enumerate() {
        if device.code.is_empty() {
            return Err(ContractError::config_validation(
                format!("devices[{idx}].code"),
                "device code cannot be empty",
            ));
        }
        if !seen.insert(&device.code) {
            return Err(ContractError::config_validation(
                format!("devices[code={}]", device.code),
                "duplicate device code",
            ));
        }
        if device.identify.is_empty() {
            return Err(ContractError::config_validation(
                format!("devices[{}].identify", device.code),
                "device identify cannot be empty",
            ));
        }
    }
    Ok(())
}

/// 发布 topic 必须能区分设备
fn validate_topic_template(config: &HubConfig) -> Result<(), ContractError> {
    if !config.publisher.topic_template.contains("{device}") {
        return Err(ContractError::config_validation(
            "publisher.topic_template",
            format!(
                "template '{}' must contain '{{device}}'",
                config.publisher.topic_template
            ),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{
        ConfigVersion, ConnectorSettings, Device, DispatcherSettings, HubSettings,
        PublisherConfig, QueueConfig, SchedulerConfig,
    };

    fn minimal_config() -> HubConfig {
        HubConfig {
            version: ConfigVersion::V1,
            hub: HubSettings {
                name: "edge-01".into(),
                role: SourceType::Edge,
            },
            queue: QueueConfig::default(),
            dispatcher: DispatcherSettings::default(),
            scheduler: SchedulerConfig::default(),
            connector: ConnectorSettings::default(),
            publisher: PublisherConfig::default(),
            devices: vec![Device::new("dev-1", "custom")],
        }
    }

    #[test]
    fn test_valid_config() {
        let config = minimal_config();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_unknown_role() {
        let mut config = minimal_config();
        config.hub.role = SourceType::Unknown;
        let err = validate(&config).unwrap_err();
        assert!(matches!(err, ContractError::ConfigValidation { ref field, .. } if field == "hub.role"));
    }

    #[test]
    fn test_duplicate_device_code() {
        let mut config = minimal_config();
        config.devices.push(Device::new("dev-1", "other"));
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("duplicate device code"));
    }

    #[test]
    fn test_empty_identify() {
        let mut config = minimal_config();
        config.devices[0].identify.clear();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_capacity() {
        let mut config = minimal_config();
        config.queue.capacity = 0;
        let err = validate(&config).unwrap_err();
        assert!(matches!(err, ContractError::ConfigValidation { ref field, .. } if field == "queue"));
    }

    #[test]
    fn test_zero_worker_limit() {
        let mut config = minimal_config();
        config.scheduler.event.max_workers = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_admission_limit_above_semaphore_ceiling() {
        let mut config = minimal_config();
        config.scheduler.property.max_concurrent_tasks = usize::MAX;
        let err = validate(&config).unwrap_err();
        assert!(matches!(err, ContractError::ConfigValidation { ref field, .. } if field == "scheduler"));
    }

    #[test]
    fn test_template_without_device() {
        let mut config = minimal_config();
        config.publisher.topic_template = "/{type}".into();
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("{device}"));
    }
}
