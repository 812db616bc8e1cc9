//! CLI command implementations

mod demo;
mod info;
mod plot;

use crate::cli::args::{Cli, Command};
use crate::cli::LogLevel;

/// Execute a CLI command based on the parsed arguments
pub fn run_command(cli: Cli) -> Result<(), String> {
    // Configure output based on verbose/quiet flags
    let log_level = if cli.quiet {
        LogLevel::Quiet
    } else if cli.verbose {
        LogLevel::Verbose
    } else {
        LogLevel::Normal
    };

    match cli.command {
        Command::Demo(args) => demo::run_demo(args, log_level),
        Command::Plot(args) => plot::run_plot(args, log_level),
        Command::Info(args) => info::run_info(args, log_level),
    }
}
