//! Reservation reconciliation CLI
//!
//! Reads a point-in-time inventory snapshot and reports how running EC2 and
//! RDS capacity compares with purchased savings plans and reserved instances.

mod commands;
mod config;
mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use commands::{ec2, rds, savings_plans};
use reservation_lib::database::EngineMapping;
use reservation_lib::source::{SnapshotOptions, SnapshotSource};
use reservation_lib::StructuredLogger;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Reservation reconciliation CLI
#[derive(Parser)]
#[command(name = "rsv")]
#[command(author, version, about = "Reconcile running capacity against Savings Plans and Reserved Instances", long_about = None)]
pub struct Cli {
    /// Inventory snapshot (JSON) to reconcile
    #[arg(long, short)]
    pub snapshot: Option<PathBuf>,

    /// Region offerings are priced in (falls back to config, then AWS_REGION)
    #[arg(long)]
    pub region: Option<String>,

    /// Configuration file (default: ~/.config/rsv/config.json)
    #[arg(long, env = "RSV_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, short)]
    pub format: Option<output::OutputFormat>,

    /// Log output format
    #[arg(long, default_value = "text")]
    pub log_format: LogFormat,

    /// Enable verbose logging
    #[arg(long, short)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// EC2 capacity reports
    #[command(subcommand)]
    Ec2(Ec2Commands),

    /// Reserved DB instance reconciliation
    Rds,
}

#[derive(Subcommand)]
pub enum Ec2Commands {
    /// List every running resource grouped by purchase method
    All,

    /// Group EC2 Instance Savings Plans resources by instance family
    InstanceSavingsPlans,

    /// Compare running capacity with active Compute Savings Plans
    ComputeSavingsPlans,
}

impl Commands {
    fn report_name(&self) -> &'static str {
        match self {
            Commands::Ec2(Ec2Commands::All) => "ec2-all",
            Commands::Ec2(Ec2Commands::InstanceSavingsPlans) => "ec2-instance-savings-plans",
            Commands::Ec2(Ec2Commands::ComputeSavingsPlans) => "compute-savings-plans",
            Commands::Rds => "rds",
        }
    }
}

fn init_tracing(format: LogFormat, verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let registry = tracing_subscriber::registry().with(filter);

    // Logs go to stderr so reports on stdout stay machine-readable
    match format {
        LogFormat::Text => registry.with(fmt::layer().with_writer(std::io::stderr)).init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format, cli.verbose);

    let config = config::Config::load(cli.config.as_deref())?;
    let format = cli.format.unwrap_or_else(|| config.output_format());
    let region = cli.region.clone().or_else(|| config.region.clone());
    let snapshot = cli
        .snapshot
        .clone()
        .or_else(|| config.snapshot.clone())
        .context("No inventory snapshot given: pass --snapshot or set `snapshot` in the config file")?;

    tracing::debug!(snapshot = %snapshot.display(), region = ?region, "Resolved configuration");

    let source = SnapshotSource::open(
        &snapshot,
        SnapshotOptions {
            region: region.clone(),
            cluster_selector: config.cluster_selector.clone(),
        },
    )
    .await
    .with_context(|| format!("Failed to open snapshot {}", snapshot.display()))?;

    let logger = StructuredLogger::new(region.as_deref().unwrap_or("unknown"));
    let report = cli.command.report_name();
    logger.log_run_start(report, VERSION);

    let result = match cli.command {
        Commands::Ec2(Ec2Commands::All) => ec2::show_all(&source, &logger, format).await,
        Commands::Ec2(Ec2Commands::InstanceSavingsPlans) => {
            ec2::show_instance_savings_plans(&source, &logger, format).await
        }
        Commands::Ec2(Ec2Commands::ComputeSavingsPlans) => {
            savings_plans::show_compute_savings_plans(&source, &logger, format).await
        }
        Commands::Rds => {
            let mapping = EngineMapping::from(config.engine_aliases.clone());
            rds::show_reserved_instances(&source, &mapping, &logger, format).await
        }
    };

    if let Err(err) = &result {
        logger.log_failure(report, &**err);
    }
    result
}
