//! CLI argument definitions

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Vigilar: layer-statistics training monitor
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "vigilar")]
#[command(author = "PAIML")]
#[command(version)]
#[command(about = "Per-layer weight/bias/gradient statistics monitoring and plotting")]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Run a synthetic monitored training loop and write a statistics log
    Demo(DemoArgs),

    /// Render a statistics log as a percentile-band grid image
    Plot(PlotArgs),

    /// Summarize the contents of a statistics log
    Info(InfoArgs),
}

/// Arguments for the demo command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct DemoArgs {
    /// Number of epochs to simulate
    #[arg(short, long, default_value_t = 100)]
    pub epochs: usize,

    /// Synthetic steps per epoch
    #[arg(short, long, default_value_t = 10)]
    pub steps_per_epoch: usize,

    /// Output directory for the statistics log
    #[arg(short, long, default_value = "result")]
    pub out_dir: PathBuf,

    /// Optional YAML monitor configuration
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Random seed for reproducibility
    #[arg(long, default_value_t = 0)]
    pub seed: u64,
}

/// Arguments for the plot command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct PlotArgs {
    /// Path to the statistics log
    #[arg(short, long, default_value = "result/log")]
    pub log: PathBuf,

    /// Output image path
    #[arg(short, long, default_value = "plot.png")]
    pub out: PathBuf,

    /// Layers to plot, one grid row each
    #[arg(long, num_args = 1.., default_values_t = ["conv1", "conv2", "conv3", "fc1", "fc2"].map(String::from))]
    pub layers: Vec<String>,

    /// Scope prefix the monitor wrote keys under
    #[arg(long, default_value = "predictor")]
    pub scope: String,

    /// Pixel size of one grid cell
    #[arg(long, default_value_t = 512)]
    pub cell_size: u32,
}

/// Arguments for the info command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct InfoArgs {
    /// Path to the statistics log
    #[arg(value_name = "LOG")]
    pub log: PathBuf,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

/// Output format for machine-readable commands
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Parse CLI arguments from a string slice (for testing)
pub fn parse_args<I, T>(args: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(args)
}
