//! eksimport - import EKS nodegroups as Cluster API machine pools

use std::path::PathBuf;

use clap::Parser;
use tracing::{info, warn};

use eksimport::telemetry::{self, LogFormat};
use eksimport::{
    render, run, CompositionRequest, ConfigOverrides, ImportConfig, Inventory, OutputFormat,
};
use eksimport_aws::Snapshot;

/// Describe the managed nodegroups of an EKS cluster and print matching
/// AWSManagedMachinePool and MachinePool objects
#[derive(Parser, Debug)]
#[command(name = "eksimport", version, about, long_about = None)]
struct Cli {
    /// Import configuration file (YAML)
    #[arg(short = 'f', long = "config", env = "EKSIMPORT_CONFIG")]
    config_file: Option<PathBuf>,

    /// Crossplane composition request (YAML or JSON) instead of a config file
    #[arg(long, conflicts_with = "config_file")]
    composite: Option<PathBuf>,

    /// Read AWS state from a snapshot file instead of the AWS APIs
    #[arg(long, env = "EKSIMPORT_SNAPSHOT")]
    snapshot: Option<PathBuf>,

    #[command(flatten)]
    overrides: ConfigOverrides,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value_t = OutputFormat::Yaml)]
    output: OutputFormat,

    /// Log level used when RUST_LOG is unset
    #[arg(long, env = "EKSIMPORT_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Log line format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    telemetry::init(&cli.log_level, cli.log_format);

    let mut config = match (&cli.config_file, &cli.composite) {
        (Some(path), _) => ImportConfig::load(path)?,
        (None, Some(path)) => {
            let request = CompositionRequest::load(path)?;
            if !request.cluster_observed() {
                info!(
                    cluster_ref = request.cluster_ref.as_deref().unwrap_or_default(),
                    "Waiting for resource"
                );
                return Ok(());
            }
            ImportConfig::from(&request.composite)
        }
        (None, None) => ImportConfig::default(),
    };
    config.apply(cli.overrides);

    let inventory = match &cli.snapshot {
        Some(path) => Inventory::Snapshot(Snapshot::load(path)?),
        None => Inventory::Live,
    };

    let outcome = run(&config, inventory).await?;
    for failure in &outcome.failures {
        warn!(nodegroup = %failure.nodegroup, error = %failure.error, "Nodegroup was not imported");
    }

    print!("{}", render(&outcome.desired, cli.output)?);
    info!(objects = outcome.desired.len(), "Successful run");
    Ok(())
}
