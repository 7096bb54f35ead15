//! svcrun - foreground host for the service worker
//!
//! Plays the host side of the lifecycle contract: starts the run loop on
//! the main thread and delivers the stop notification from the Ctrl+C
//! handler thread.

use anyhow::Result;
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use svcrun::config::{Args, Command};
use svcrun::service::ServiceConfig;
use svcrun::worker::{CounterWorkload, ServiceWorker};

fn main() -> Result<()> {
    let mut args = Args::parse();

    // Execute command
    match args.command.take().unwrap_or_default() {
        Command::Run {
            config,
            pace,
            limit,
            args: service_args,
        } => cmd_run(&args, config, pace, limit, service_args),
        Command::SampleConfig => cmd_sample_config(),
    }
}

fn init_logging(args: &Args, config: &ServiceConfig) -> Result<()> {
    // CLI flags win over the config file; RUST_LOG wins over both
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if args.quiet || args.verbose > 0 {
            EnvFilter::new(args.log_level().to_string())
        } else {
            EnvFilter::new(&config.log_level)
        }
    });

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    let log_file = args
        .log
        .clone()
        .or_else(|| (!config.log_file.is_empty()).then(|| config.log_file.clone()));

    if let Some(path) = log_file {
        let file = std::fs::File::create(path)?;
        subscriber.with_writer(file).with_ansi(false).init();
    } else {
        subscriber.init();
    }

    Ok(())
}

/// Run the worker in the foreground
fn cmd_run(
    args: &Args,
    config_path: Option<String>,
    pace: Option<u64>,
    limit: Option<u64>,
    service_args: Vec<String>,
) -> Result<()> {
    let mut config = match &config_path {
        Some(path) => ServiceConfig::load(path)?,
        None => ServiceConfig::load_default().unwrap_or_else(|e| {
            eprintln!("Warning: failed to load config: {}, using defaults", e);
            ServiceConfig::default()
        }),
    };

    // CLI overrides
    if let Some(pace) = pace {
        config.pace_ms = pace;
    }
    if let Some(limit) = limit {
        config.max_iterations = limit;
    }
    if !service_args.is_empty() {
        config.arguments = service_args;
    }

    init_logging(args, &config)?;

    println!("svcrun - service worker host\n");

    let worker = ServiceWorker::new(config.to_worker_config());

    // Deliver the stop notification from the signal handler thread
    let handle = worker.stop_handle();
    let _ = ctrlc::set_handler(move || {
        println!("\nReceived Ctrl+C, stopping...");
        handle.request_stop();
    });

    let mut workload = match config.iteration_limit() {
        Some(limit) => CounterWorkload::with_limit(limit),
        None => CounterWorkload::unbounded(),
    };

    println!("Worker running. Press Ctrl+C to stop.\n");

    match worker.run(&config.arguments, &mut workload) {
        Ok(iterations) => {
            println!("Stopped after {} iterations.", iterations);
            Ok(())
        }
        Err(e) => {
            error!("worker terminated abnormally: {}", e);
            Err(e.into())
        }
    }
}

/// Print a commented sample configuration file
fn cmd_sample_config() -> Result<()> {
    print!("{}", ServiceConfig::sample_config());
    Ok(())
}
