//! Plot command implementation

use crate::cli::args::PlotArgs;
use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::plot::{render_grid, PlotSpec};
use crate::report::load_log;

pub fn run_plot(args: PlotArgs, level: LogLevel) -> Result<(), String> {
    log(level, LogLevel::Normal, &format!("Plotting: {}", args.log.display()));

    let series = load_log(&args.log).map_err(|e| e.to_string())?;
    log(
        level,
        LogLevel::Verbose,
        &format!("  {} keys, {} layers requested", series.len(), args.layers.len()),
    );

    let spec = PlotSpec {
        layers: args.layers.clone(),
        scope: if args.scope.is_empty() { None } else { Some(args.scope.clone()) },
        cell_size: args.cell_size,
    };
    render_grid(&series, &spec, &args.out).map_err(|e| e.to_string())?;

    log(level, LogLevel::Normal, &format!("Wrote {}", args.out.display()));
    Ok(())
}
