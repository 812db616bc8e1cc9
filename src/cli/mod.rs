//! CLI module for vigilar
//!
//! This module contains all CLI command handlers and utilities.

pub mod args;
mod commands;
mod logging;

pub use args::{parse_args, Cli, Command, DemoArgs, InfoArgs, OutputFormat, PlotArgs};
pub use commands::run_command;
pub use logging::LogLevel;
