//! CLI entry point for resistance-daq.
//!
//! Headless frontend for the measurement session controller:
//! - `run` starts one measurement run, streams worker output to the
//!   terminal, and turns Ctrl+C into a graceful stop token.
//! - `import` loads a historical CSV and prints the resulting series.
//!
//! # Usage
//!
//! ```bash
//! resistance_daq run --output-folder /data/runs --output-name sample_a
//! resistance_daq import /data/runs/sample_a.csv
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use resistance_daq::config::Settings;
use resistance_daq::console::ConsoleBuffer;
use resistance_daq::error::AppResult;
use resistance_daq::import;
use resistance_daq::series::SeriesStore;
use resistance_daq::session::{SessionController, SessionEvent, StartParams};
use resistance_daq::worker;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "resistance-daq")]
#[command(about = "Headless controller for the Keithley resistance measurement worker", long_about = None)]
struct Cli {
    /// Configuration name under config/ (without extension)
    #[arg(long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start one measurement run and stream worker output until it ends
    Run {
        /// Applied voltage in volts
        #[arg(long)]
        voltage: Option<String>,

        /// Application time in seconds
        #[arg(long)]
        time: Option<String>,

        /// Sample interval in seconds, or AUTO
        #[arg(long)]
        sample_interval: Option<String>,

        /// Current range in amperes, or AUTO
        #[arg(long)]
        current_range: Option<String>,

        /// Integration time in power line cycles
        #[arg(long)]
        nplc: Option<String>,

        /// Compliance current in amperes
        #[arg(long)]
        compliance_current: Option<String>,

        /// Folder the worker writes its CSV/plot into
        #[arg(long)]
        output_folder: String,

        /// Base name (no extension) for the worker's output files
        #[arg(long)]
        output_name: String,
    },

    /// Load a historical CSV and print the resulting series
    Import {
        /// Path to a previous run's CSV file
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::new(cli.config.as_deref())?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(settings.log_level.clone())),
        )
        .init();

    match cli.command {
        Commands::Run {
            voltage,
            time,
            sample_interval,
            current_range,
            nplc,
            compliance_current,
            output_folder,
            output_name,
        } => {
            let defaults = settings.defaults.clone();
            let params = StartParams {
                voltage: voltage.unwrap_or(defaults.voltage),
                time_s: time.unwrap_or(defaults.time_s),
                sample_interval: sample_interval.unwrap_or(defaults.sample_interval),
                current_range: current_range.unwrap_or(defaults.current_range),
                nplc: nplc.unwrap_or(defaults.nplc),
                compliance_current: compliance_current.unwrap_or(defaults.compliance_current),
                output_folder,
                output_base_name: output_name,
            };
            run_measurement(&settings, params).await
        }
        Commands::Import { file } => {
            run_import(&file)?;
            Ok(())
        }
    }
}

async fn run_measurement(settings: &Settings, params: StartParams) -> Result<()> {
    match worker::probe(&settings.worker.executable).await {
        Ok(version) => tracing::info!(%version, "worker environment verified"),
        Err(err) => tracing::warn!(%err, "worker environment probe failed; starting anyway"),
    }

    let store = SeriesStore::new();
    let (mut controller, mut events) = SessionController::new(store.clone());
    let console = ConsoleBuffer::new();

    let output_path = controller.start(&settings.worker, &params)?;
    println!("Measurement started; worker output goes to {}", output_path.display());
    println!("Press Ctrl+C to request a graceful stop");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("stop requested from terminal");
                // Already-idle just means the worker beat us to the exit.
                let _ = controller.stop_requested().await;
            }
            event = events.recv() => match event {
                Some(SessionEvent::Log(line)) => {
                    console.push(line.clone());
                    println!("{line}");
                }
                Some(SessionEvent::SampleAppended { .. }) => {}
                Some(SessionEvent::Ended) | None => break,
            }
        }
    }

    let collected = controller
        .live_series()
        .and_then(|name| store.get(name))
        .map_or(0, |series| series.len());
    println!(
        "Session ended; {collected} samples collected, {} worker lines logged",
        console.len()
    );
    Ok(())
}

fn run_import(file: &PathBuf) -> AppResult<()> {
    let store = SeriesStore::new();
    let name = import::load_csv(file, &store)?;
    if let Some(series) = store.get(&name) {
        println!("Loaded series '{name}' with {} points", series.len());
        if let (Some(first), Some(last)) = (series.points().first(), series.points().last()) {
            println!("  first: ({}, {})", first.x, first.y);
            println!("  last:  ({}, {})", last.x, last.y);
        }
    }
    Ok(())
}
