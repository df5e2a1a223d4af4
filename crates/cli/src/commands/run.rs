//! `run` command implementation.

use anyhow::{Context, Result};
use contracts::{HubConfig, SourceType};
use std::time::Duration;
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::hub::{Hub, HubOptions};

/// Execute the `run` command
pub async fn run_hub(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        return Err(CliError::config_not_found(args.config.display().to_string()).into());
    }

    let mut config = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    apply_overrides(&mut config, args)?;

    info!(
        hub = %config.hub.name,
        role = %config.hub.role,
        devices = config.devices.len(),
        queue_capacity = config.queue.capacity,
        scheduler = config.scheduler.enabled && !args.no_scheduler,
        "Configuration loaded"
    );

    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&config);
        return Ok(());
    }

    if args.metrics_port != 0 {
        observability::install_metrics_exporter(args.metrics_port)?;
        info!("Metrics endpoint available on port {}", args.metrics_port);
    }

    if args.simulate && !(args.simulate_hz > 0.0 && args.simulate_hz.is_finite()) {
        return Err(CliError::invalid_override(
            "simulate_hz",
            format!("rate must be positive, got {}", args.simulate_hz),
        )
        .into());
    }

    let options = HubOptions {
        duration: (args.duration != 0).then(|| Duration::from_secs(args.duration)),
        simulate: args.simulate,
        simulate_hz: args.simulate_hz,
        scheduler: !args.no_scheduler,
    };

    let hub = Hub::build(config, options).map_err(|e| CliError::startup(format!("{e:#}")))?;

    info!("Starting hub...");
    let stats = hub
        .run(shutdown_signal())
        .await
        .context("Hub execution failed")?;

    info!(
        messages = stats.dispatch.total,
        completed = stats.dispatch.completed,
        duration_secs = stats.duration.as_secs_f64(),
        throughput = format!("{:.2}", stats.throughput()),
        "Hub stopped"
    );
    stats.print_summary();

    info!("IoT Hub finished");
    Ok(())
}

/// Apply command-line overrides and re-validate the result
fn apply_overrides(config: &mut HubConfig, args: &RunArgs) -> Result<()> {
    if let Some(ref role) = args.role {
        let parsed = SourceType::match_header(Some(role));
        if parsed == SourceType::Unknown {
            return Err(CliError::invalid_override("role", format!("unknown role '{role}'")).into());
        }
        info!(role = %parsed, "Overriding hub role from CLI");
        config.hub.role = parsed;
    }

    if let Some(capacity) = args.queue_capacity {
        info!(capacity, "Overriding queue capacity from CLI");
        config.queue.capacity = capacity;
    }

    config_loader::validate(config).context("Configuration invalid after CLI overrides")?;
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(config: &HubConfig) {
    println!("\n=== Configuration Summary ===\n");
    println!("Hub:");
    println!("  Name: {}", config.hub.name);
    println!("  Role: {}", config.hub.role);
    println!(
        "\nQueue: capacity {}, poll {} ms",
        config.queue.capacity, config.queue.poll_timeout_ms
    );
    println!(
        "Dispatcher: deadline {} ms",
        config.dispatcher.process_timeout_ms
    );

    if config.scheduler.enabled {
        println!("\nScheduler ({:?}):", config.scheduler.eligibility);
        println!(
            "  Property: every {} ms, {} in flight, {} workers",
            config.scheduler.property.period_ms,
            config.scheduler.property.max_concurrent_tasks,
            config.scheduler.property.max_workers
        );
        println!(
            "  Event: every {} ms, {} in flight, {} workers",
            config.scheduler.event.period_ms,
            config.scheduler.event.max_concurrent_tasks,
            config.scheduler.event.max_workers
        );
    } else {
        println!("\nScheduler: disabled");
    }

    println!("\nDevices ({}):", config.devices.len());
    for device in &config.devices {
        println!("  - {} ({})", device.code, device.identify);
    }

    println!();
}
