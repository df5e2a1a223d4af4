//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{EligibilityPolicy, HubConfig};
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
    hub: String,
    role: String,
    device_count: usize,
    scheduler_enabled: bool,
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

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(config) => {
            let warnings = collect_warnings(&config);

            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", config.version),
                    hub: config.hub.name.clone(),
                    role: config.hub.role.to_string(),
                    device_count: config.devices.len(),
                    scheduler_enabled: config.scheduler.enabled,
                }),
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

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &HubConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.devices.is_empty() {
        warnings.push("No devices seeded - the directory starts empty".to_string());
    }

    for lane in [&config.scheduler.property, &config.scheduler.event] {
        if lane.max_workers > lane.max_concurrent_tasks {
            warnings.push(format!(
                "max_workers ({}) exceeds max_concurrent_tasks ({}) - extra workers stay idle",
                lane.max_workers, lane.max_concurrent_tasks
            ));
        }
    }

    if config.scheduler.eligibility == EligibilityPolicy::ActiveOffline {
        warnings.push(
            "scheduler.eligibility = active_offline - only offline devices will report".to_string(),
        );
    }

    if config.dispatcher.process_timeout_ms > config.queue.poll_timeout_ms {
        warnings.push(format!(
            "dispatcher.process_timeout_ms ({}) exceeds queue.poll_timeout_ms ({})",
            config.dispatcher.process_timeout_ms, config.queue.poll_timeout_ms
        ));
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Hub: {} ({})", summary.hub, summary.role);
            println!("  Devices: {}", summary.device_count);
            println!("  Scheduler: {}", if summary.scheduler_enabled { "enabled" } else { "disabled" });
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
