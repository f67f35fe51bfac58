// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! rtde-record - Record robot controller telemetry to file.
//!
//! Usage:
//!   rtde-record --host 192.168.1.10
//!   rtde-record --host 192.168.1.10 --samples 5000 --frequency 500 --buffered
//!   rtde-record --host 192.168.1.10 --binary --output robot_data.rtde

use anyhow::Context;
use clap::Parser;
use rtde::{ClientConfig, ConfigFile, RtdeClient};
use rtde_recording::{
    format::OutputFormat,
    progress::Progress,
    recorder::{Recorder, RecorderConfig, Termination},
    session::{start_recording, OutputConfig},
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "rtde-record")]
#[command(about = "Record robot controller RTDE telemetry to file")]
#[command(version)]
struct Args {
    /// Controller host name or address
    #[arg(long, default_value = "localhost")]
    host: String,

    /// RTDE port
    #[arg(long, default_value = "30004")]
    port: u16,

    /// Samples to record (0 = until Ctrl+C)
    #[arg(long, default_value = "0")]
    samples: u64,

    /// Sampling frequency in Hz
    #[arg(long, default_value = "125", value_parser = clap::value_parser!(u64).range(1..))]
    frequency: u64,

    /// Keep every sample instead of only the latest one
    #[arg(long)]
    buffered: bool,

    /// Recipe configuration file
    #[arg(long, default_value = "record_configuration.xml")]
    config: PathBuf,

    /// Recipe key in the configuration file
    #[arg(long, default_value = "out")]
    recipe: String,

    /// Output file path
    #[arg(short, long, default_value = "robot_data.csv")]
    output: PathBuf,

    /// Write binary records instead of CSV
    #[arg(long)]
    binary: bool,

    /// CSV column delimiter
    #[arg(long, default_value = " ")]
    delimiter: char,

    /// Field compared between consecutive samples
    #[arg(long, default_value = "actual_q")]
    field: String,

    /// Minimum change of the tracked field for a sample to be written
    #[arg(long, default_value = "0.001")]
    threshold: f64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Quiet mode (no progress output)
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Setup logging
    let filter = args.log_level.parse().unwrap_or(tracing::Level::INFO);
    tracing_subscriber::fmt()
        .with_max_level(filter)
        .with_target(false)
        .init();

    let recipe = ConfigFile::load(&args.config)
        .and_then(|config| config.get_recipe(&args.recipe))
        .with_context(|| format!("Unable to load recipe '{}'", args.recipe))?;

    if !args.quiet {
        info!("RTDE Recording v{}", env!("CARGO_PKG_VERSION"));
        info!("Controller: {}:{}", args.host, args.port);
        info!("Recipe: {} ({} fields)", args.recipe, recipe.len());
        info!("Output: {}", args.output.display());
    }

    let config = RecorderConfig::new(args.frequency)
        .target_count(args.samples)
        .buffered(args.buffered)
        .threshold(args.threshold)
        .tracked_field(args.field.as_str());
    config
        .validate(&recipe)
        .context("Invalid recording settings")?;

    let mut output = OutputConfig::new(&args.output).delimiter(args.delimiter);
    if args.binary {
        output = output.format(OutputFormat::Binary);
    }

    let stop = Arc::new(AtomicBool::new(false));
    let s = Arc::clone(&stop);
    ctrlc::set_handler(move || {
        s.store(true, Ordering::SeqCst);
    })?;

    let mut client = RtdeClient::new(ClientConfig::new(&args.host).port(args.port));
    client
        .connect()
        .with_context(|| format!("Unable to connect to {}:{}", args.host, args.port))?;
    let writer = start_recording(&mut client, &recipe, args.frequency, &output)?;

    let progress = if args.quiet {
        Progress::disabled()
    } else {
        Progress::stdout(args.frequency, args.samples)
    };

    let recorder = match Recorder::new(config, &mut client, writer, &recipe) {
        Ok(recorder) => recorder,
        Err(e) => {
            if let Err(pause) = client.send_pause() {
                warn!("Unable to pause synchronization: {}", pause);
            }
            client.disconnect();
            return Err(e).context("Recording failed");
        }
    };
    let report = recorder.with_progress(progress).run(&stop);
    let stats = report.stats;

    let termination = match report.termination {
        Termination::Failed(e) => return Err(e).context("Recording failed"),
        termination => termination,
    };

    if !args.quiet {
        info!("Recording stopped ({})", termination);
        info!("  Samples: {}", stats.attempts);
        info!("  Rows: {}", stats.rows_written);
        info!("  Unchanged: {}", stats.skipped);
        info!("  Dropped packages: {}", client.skipped_packages());
        info!("  Duration: {:.1}s", stats.duration_secs);
        info!("  Throughput: {:.1} samples/s", stats.samples_per_second);
        info!("  File: {}", args.output.display());
    }

    Ok(())
}
