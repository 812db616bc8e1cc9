//! Info command implementation

use crate::cli::args::{InfoArgs, OutputFormat};
use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::report::{load_log, LogSeries};

pub fn run_info(args: InfoArgs, level: LogLevel) -> Result<(), String> {
    let series = load_log(&args.log).map_err(|e| e.to_string())?;

    let triggers = series.values().map(Vec::len).max().unwrap_or(0);
    let layers = detect_layers(&series);

    match args.format {
        OutputFormat::Text => {
            log(level, LogLevel::Normal, &format!("Log: {}", args.log.display()));
            log(level, LogLevel::Normal, &format!("  Triggers recorded: {triggers}"));
            log(level, LogLevel::Normal, &format!("  Statistic keys: {}", series.len()));
            log(level, LogLevel::Normal, &format!("  Layers: {}", layers.join(", ")));
        }
        OutputFormat::Json => {
            let value = serde_json::json!({
                "log": args.log.display().to_string(),
                "triggers": triggers,
                "keys": series.len(),
                "layers": layers,
            });
            let text = serde_json::to_string_pretty(&value).map_err(|e| e.to_string())?;
            println!("{text}");
        }
    }
    Ok(())
}

/// Layer names appearing in the log's keys: the segment preceding the
/// parameter-class segment (`W`, `b`, or `Wb`).
fn detect_layers(series: &LogSeries) -> Vec<String> {
    let mut layers: Vec<String> = Vec::new();
    for key in series.keys() {
        let segments: Vec<&str> = key.split('/').collect();
        for pair in segments.windows(2) {
            if matches!(pair[1], "W" | "b" | "Wb") && !layers.iter().any(|l| l == pair[0]) {
                layers.push(pair[0].to_string());
            }
        }
    }
    layers
}
