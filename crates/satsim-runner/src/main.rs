//! # satsim
//!
//! Command line entry point for the satellite link simulator.
//!
//! Samples are written to stdout as JSON lines; logs go to stderr and are
//! filtered with `RUST_LOG`.

use clap::{Parser, Subcommand};
use satsim_frame::BbFrameType;
use satsim_model::{Model, SimConfig};
use satsim_runner::{fill_frames, RunnerError, Scenario, ScenarioRunner};
use serde::Serialize;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// ============================================================================
// CLI Configuration
// ============================================================================

/// satsim - satellite link fading and framing simulator
#[derive(Parser, Debug)]
#[command(name = "satsim")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the built-in Markov logic walkthrough (45° to 55° to 75°)
    MarkovLogic(ModelArgs),
    /// Run a scenario from a YAML file
    Run(RunConfig),
    /// Fill one frame per MODCOD with fixed-size packets
    Frames(FramesConfig),
    /// List all metrics with descriptions and labels
    Metrics,
}

/// Model selection shared by every simulation command.
#[derive(Parser, Debug)]
pub struct ModelArgs {
    /// Path to a YAML model configuration (built-in defaults when omitted)
    #[arg(short, long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Override the configured seed
    #[arg(short, long)]
    pub seed: Option<u64>,
}

/// Configuration for `run`
#[derive(Parser, Debug)]
pub struct RunConfig {
    /// Path to the scenario YAML file
    pub scenario: PathBuf,

    #[command(flatten)]
    pub model: ModelArgs,
}

/// Configuration for `frames`
#[derive(Parser, Debug)]
pub struct FramesConfig {
    /// Packet size in bytes
    #[arg(long, default_value = "512")]
    pub packet_size: usize,

    /// Frame types to fill (SHORT_FRAME, NORMAL_FRAME, DUMMY_FRAME); all when omitted
    #[arg(long = "frame-type", value_name = "TYPE")]
    pub frame_types: Vec<BbFrameType>,

    #[command(flatten)]
    pub model: ModelArgs,
}

impl ModelArgs {
    fn load(&self) -> Result<Model, RunnerError> {
        let mut config = match &self.config {
            Some(path) => SimConfig::from_file(path)?,
            None => SimConfig::default(),
        };
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        Ok(config.build()?)
    }
}

// ============================================================================
// Commands
// ============================================================================

fn run_scenario(model: &Model, scenario: &Scenario) -> Result<(), RunnerError> {
    let mut runner = ScenarioRunner::new(model, scenario)?;
    runner.run()?;
    write_json_lines(runner.records())
}

fn run_frames(config: &FramesConfig) -> Result<(), RunnerError> {
    let model = config.model.load()?;
    let frame_types = if config.frame_types.is_empty() {
        BbFrameType::ALL.to_vec()
    } else {
        config.frame_types.clone()
    };
    let fills = fill_frames(&model.frame, config.packet_size, &frame_types)?;
    write_json_lines(&fills)
}

fn write_json_lines<T: Serialize>(records: &[T]) -> Result<(), RunnerError> {
    let mut out = BufWriter::new(io::stdout().lock());
    for record in records {
        serde_json::to_writer(&mut out, record)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}

/// Print information about all available metrics
fn print_metrics_info() {
    use satsim_metrics::metric_defs;

    println!("satsim Available Metrics");
    println!("========================\n");

    for metric in metric_defs::ALL {
        println!("{} ({})", metric.name, metric.kind.as_str());
        println!("  {}", metric.description);
        if let Some(unit) = metric.unit {
            println!("  unit: {}", unit.as_str());
        }
        if !metric.labels.is_empty() {
            println!("  labels: {}", metric.labels.join(", "));
        }
        println!();
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> Result<(), RunnerError> {
    // RUST_LOG wins; otherwise show info so samples are visible on stderr
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    satsim_metrics::describe_metrics();

    let cli = Cli::parse();

    match cli.command {
        Commands::MarkovLogic(args) => {
            let model = args.load()?;
            info!(seed = model.seed, "Running Markov logic walkthrough");
            run_scenario(&model, &Scenario::markov_logic())?;
        }
        Commands::Run(config) => {
            let model = config.model.load()?;
            let scenario = Scenario::from_file(&config.scenario)?;
            info!(scenario = %config.scenario.display(), seed = model.seed, "Running scenario");
            run_scenario(&model, &scenario)?;
        }
        Commands::Frames(config) => {
            run_frames(&config)?;
        }
        Commands::Metrics => {
            print_metrics_info();
        }
    }

    Ok(())
}
