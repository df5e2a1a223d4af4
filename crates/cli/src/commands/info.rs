//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::HubConfig;
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    hub: HubInfo,
    queue: QueueInfo,
    scheduler: SchedulerInfo,
    topic_template: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    status_ttl_ms: Option<u64>,
    device_count: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    devices: Vec<DeviceInfo>,
}

#[derive(Serialize)]
struct HubInfo {
    name: String,
    role: String,
}

#[derive(Serialize)]
struct QueueInfo {
    capacity: usize,
    poll_timeout_ms: u64,
    process_timeout_ms: u64,
}

#[derive(Serialize)]
struct SchedulerInfo {
    enabled: bool,
    eligibility: String,
    admission_wait_ms: u64,
    lanes: Vec<LaneInfo>,
}

#[derive(Serialize)]
struct LaneInfo {
    kind: &'static str,
    period_ms: u64,
    max_concurrent_tasks: usize,
    max_workers: usize,
}

#[derive(Serialize)]
struct DeviceInfo {
    code: String,
    identify: String,
    active: bool,
    offline: bool,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let config = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let info = build_config_info(&config, args);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&config, args);
    }

    Ok(())
}

fn build_config_info(config: &HubConfig, args: &InfoArgs) -> ConfigInfo {
    let devices = if args.devices {
        config
            .devices
            .iter()
            .map(|d| DeviceInfo {
                code: d.code.clone(),
                identify: d.identify.clone(),
                active: d.active,
                offline: d.offline,
            })
            .collect()
    } else {
        Vec::new()
    };

    let scheduler = &config.scheduler;
    ConfigInfo {
        version: format!("{:?}", config.version),
        hub: HubInfo {
            name: config.hub.name.clone(),
            role: config.hub.role.to_string(),
        },
        queue: QueueInfo {
            capacity: config.queue.capacity,
            poll_timeout_ms: config.queue.poll_timeout_ms,
            process_timeout_ms: config.dispatcher.process_timeout_ms,
        },
        scheduler: SchedulerInfo {
            enabled: scheduler.enabled,
            eligibility: format!("{:?}", scheduler.eligibility),
            admission_wait_ms: scheduler.admission_wait_ms,
            lanes: [("property", &scheduler.property), ("event", &scheduler.event)]
                .into_iter()
                .map(|(kind, lane)| LaneInfo {
                    kind,
                    period_ms: lane.period_ms,
                    max_concurrent_tasks: lane.max_concurrent_tasks,
                    max_workers: lane.max_workers,
                })
                .collect(),
        },
        topic_template: config.publisher.topic_template.clone(),
        status_ttl_ms: config.connector.status_ttl_ms,
        device_count: config.devices.len(),
        devices,
    }
}

fn print_config_info(config: &HubConfig, args: &InfoArgs) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                   IoT Hub Configuration                      ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("📍 Hub");
    println!("   ├─ Version: {:?}", config.version);
    println!("   ├─ Name: {}", config.hub.name);
    println!("   └─ Role: {}", config.hub.role);

    println!("\n📥 Queue & Dispatch");
    println!("   ├─ Capacity: {}", config.queue.capacity);
    println!("   ├─ Poll timeout: {} ms", config.queue.poll_timeout_ms);
    println!("   └─ Processing deadline: {} ms", config.dispatcher.process_timeout_ms);

    let scheduler = &config.scheduler;
    println!("\n⏱️  Scheduler");
    if scheduler.enabled {
        println!("   ├─ Eligibility: {:?}", scheduler.eligibility);
        println!("   ├─ Admission wait: {} ms", scheduler.admission_wait_ms);
        println!(
            "   ├─ Property: every {} ms ({} in flight, {} workers)",
            scheduler.property.period_ms,
            scheduler.property.max_concurrent_tasks,
            scheduler.property.max_workers
        );
        println!(
            "   └─ Event: every {} ms ({} in flight, {} workers)",
            scheduler.event.period_ms,
            scheduler.event.max_concurrent_tasks,
            scheduler.event.max_workers
        );
    } else {
        println!("   └─ Disabled");
    }

    println!("\n📤 Publishing");
    println!("   ├─ Topic template: {}", config.publisher.topic_template);
    match config.connector.status_ttl_ms {
        Some(ttl) => println!("   └─ Status cache TTL: {} ms", ttl),
        None => println!("   └─ Status cache TTL: until cleared"),
    }

    println!("\n📟 Devices ({})", config.devices.len());
    if args.devices {
        for (i, device) in config.devices.iter().enumerate() {
            let is_last = i == config.devices.len() - 1;
            let prefix = if is_last { "└─" } else { "├─" };
            let state = match (device.active, device.offline) {
                (false, _) => "inactive",
                (true, true) => "offline",
                (true, false) => "online",
            };
            println!("   {} {} ({}, {})", prefix, device.code, device.identify, state);
        }
    }

    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_info_lists_devices_on_request() {
        let config = config_loader::ConfigLoader::load_from_str(
            r#"{
                "hub": {"name": "cloud-01", "role": "cloud"},
                "devices": [{"code": "d1", "identify": "custom", "offline": true}]
            }"#,
            config_loader::ConfigFormat::Json,
        )
        .unwrap();

        let mut args = InfoArgs {
            config: "hub.json".into(),
            json: true,
            devices: false,
        };
        let info = build_config_info(&config, &args);
        assert_eq!(info.device_count, 1);
        assert!(info.devices.is_empty());
        assert_eq!(info.scheduler.lanes.len(), 2);

        args.devices = true;
        let info = build_config_info(&config, &args);
        assert_eq!(info.devices[0].code, "d1");
        assert!(info.devices[0].offline);
        assert_eq!(info.hub.role, "cloud");
    }
}
