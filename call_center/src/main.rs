//! Call center simulation - command line driver
//!
//! Runs the two-day baseline (or a TOML config) and prints the call summary,
//! the first rows of the call log and the day-one hourly call counts.

use std::path::PathBuf;

use anyhow::Context;
use call_center::output::{
    format_head, format_hourly, format_summary, save_calls_csv, save_summary_json,
};
use call_center::{InterArrival, Simulation, SimulationConfig, run_sweep};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "call_center")]
#[command(about = "Discrete-event simulation of a call center", long_about = None)]
struct Cli {
    /// TOML config; the two-day baseline is used when absent
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(long)]
    queue_slots: Option<usize>,

    #[arg(long)]
    telemarketers: Option<usize>,

    /// Customers calling at t=0
    #[arg(long)]
    burst: Option<usize>,

    /// Simulation horizon in minutes
    #[arg(long)]
    horizon: Option<f64>,

    #[arg(long)]
    seed: Option<u64>,

    /// Draw exponential inter-arrival delays around the schedule
    #[arg(long)]
    exponential: bool,

    /// Write the call log to this CSV file
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Write the run summary to this JSON file
    #[arg(long)]
    json: Option<PathBuf>,

    /// Compare telemarketer counts, e.g. `--sweep 1,2,3`
    #[arg(long, value_delimiter = ',', conflicts_with_all = ["csv", "json"])]
    sweep: Vec<usize>,
}

impl Cli {
    fn simulation_config(&self) -> anyhow::Result<SimulationConfig> {
        let mut config = match &self.config {
            Some(path) => SimulationConfig::load(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => SimulationConfig::two_day_baseline(),
        };
        if let Some(n) = self.queue_slots {
            config.num_queue_slots = n;
        }
        if let Some(n) = self.telemarketers {
            config.num_telemarketers = n;
        }
        if let Some(n) = self.burst {
            config.num_customers_start = n;
        }
        if let Some(minutes) = self.horizon {
            config.simulation_time = minutes;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if self.exponential {
            config.inter_arrival = InterArrival::Exponential;
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let config = cli.simulation_config()?;

    if !cli.sweep.is_empty() {
        let reports = run_sweep(&config, &cli.sweep)?;
        for (&num_telemarketers, report) in cli.sweep.iter().zip(reports) {
            let report = report?;
            let swept = SimulationConfig {
                num_telemarketers,
                ..config.clone()
            };
            println!("\n{}", format_summary(&swept, &report.summary));
        }
        return Ok(());
    }

    let mut simulation = Simulation::new(config)?;
    let report = simulation.run()?;
    let config = simulation.config();

    println!("\n{}", format_summary(config, &report.summary));
    println!("\n{}", format_head(&report.calls, 10));
    println!("\nCalls per hour, day 1:\n{}", format_hourly(&report, 1));

    if let Some(path) = &cli.csv {
        save_calls_csv(path, &report.calls)
            .with_context(|| format!("writing {}", path.display()))?;
        tracing::info!(path = %path.display(), rows = report.calls.len(), "call log written");
    }
    if let Some(path) = &cli.json {
        save_summary_json(path, config, &report)
            .with_context(|| format!("writing {}", path.display()))?;
        tracing::info!(path = %path.display(), "summary written");
    }

    Ok(())
}
