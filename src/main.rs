//! Vigilar CLI
//!
//! Layer-statistics monitoring entry point.
//!
//! # Usage
//!
//! ```bash
//! # Run the synthetic monitored demo and write result/log
//! vigilar demo --epochs 100
//!
//! # Render the log as a percentile-band grid
//! vigilar plot --log result/log --out plot.png --layers conv1 conv2 conv3 fc1 fc2
//!
//! # Summarize a log
//! vigilar info result/log
//! ```

use clap::Parser;
use std::process::ExitCode;
use vigilar::cli::{run_command, Cli};

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run_command(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
