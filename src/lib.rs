// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod protocol;
pub mod result;
pub mod scheduler;
pub mod service;

use std::sync::Arc;

use anyhow::{bail, Result};
use tracing::{info, warn};

use crate::cli::CliArgs;
use crate::config::{default_config_path, load_and_validate, ConfigFile};
use crate::exec::ProcessExecutor;
use crate::service::TestExecutor;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the process executor
/// - either a single execution (`--once`) or the background runner
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = args.config.clone().unwrap_or_else(default_config_path);
    info!(path = %config_path.display(), "loading config");
    let mut cfg = load_and_validate(&config_path)?;
    if let Some(command) = args.command {
        cfg.override_command(command)?;
    }

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let executor = Arc::new(ProcessExecutor::default());
    let service =
        TestExecutor::new(cfg.executor.clone(), executor).with_default_pause(cfg.schedule.pause);

    if args.once {
        let response = service.execute_now().await;
        println!("{}", serde_json::to_string_pretty(&response)?);
        if !response.is_success() {
            bail!("test run was unsuccessful (status {})", response.status);
        }
        return Ok(());
    }

    if !cfg.schedule.enabled {
        warn!("[schedule].enabled = false and --once not given; nothing to do");
        return Ok(());
    }

    service.start_async_runner(cfg.schedule.time_options)?;
    let mut results = service.subscribe()?;

    loop {
        tokio::select! {
            changed = results.changed() => {
                if changed.is_err() {
                    info!("async runner finished");
                    break;
                }
                let result = results.borrow_and_update().clone();
                let response = service.respond(&result);
                info!(
                    status = response.status,
                    start = ?response.test_start,
                    end = ?response.test_end,
                    "new test result available"
                );
            }
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    warn!(error = %e, "failed to listen for Ctrl+C");
                }
                info!("shutdown requested");
                break;
            }
        }
    }

    service.stop()?;
    Ok(())
}

/// Simple dry-run output: print the effective configuration.
fn print_dry_run(cfg: &ConfigFile) {
    println!("test-executor dry-run");
    println!("  executor.command = {}", cfg.executor.command);
    println!(
        "  executor.execution_timeout = {:?}",
        cfg.executor.execution_timeout
    );
    println!("  executor.content_type = {}", cfg.executor.content_type);
    println!();
    println!("  schedule.enabled = {}", cfg.schedule.enabled);
    println!(
        "  schedule.timeout = {:?}",
        cfg.schedule.time_options.effective_timeout()
    );
    println!("  schedule.success = {:?}", cfg.schedule.time_options.success);
    println!("  schedule.error = {:?}", cfg.schedule.time_options.error);
    println!("  schedule.pause = {:?}", cfg.schedule.pause);
}
