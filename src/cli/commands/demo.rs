//! Demo command implementation

use std::fs;

use crate::cli::args::DemoArgs;
use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::model::ConvClassifier;
use crate::monitor::{ExtensionContext, LayerMonitor, MonitorConfig, MonitorExtension, TrainerExtension};
use crate::report::LogReport;

pub fn run_demo(args: DemoArgs, level: LogLevel) -> Result<(), String> {
    let config = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
            serde_yaml::from_str(&text)
                .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))?
        }
        None => MonitorConfig { prefix: Some("predictor".to_string()), ..MonitorConfig::default() },
    };

    let mut model = ConvClassifier::new(args.seed);
    let log_path = args.out_dir.join("log");

    log(level, LogLevel::Normal, &format!("Monitoring demo run: {} epochs", args.epochs));
    log(level, LogLevel::Verbose, &format!("  Log: {}", log_path.display()));
    log(level, LogLevel::Verbose, &format!("  Seed: {}", args.seed));

    let monitor = LayerMonitor::new(config);
    let report = LogReport::create(&log_path).map_err(|e| e.to_string())?;
    let mut extension = MonitorExtension::new(monitor, report);

    // Pre-training snapshot: gradients are still unset here, so the first
    // log element carries NaN placeholders for every gradient key.
    extension
        .on_train_begin(&ExtensionContext::default(), model.source())
        .map_err(|e| e.to_string())?;

    let mut iteration = 0;
    for epoch in 0..args.epochs {
        for _ in 0..args.steps_per_epoch {
            model.step();
            iteration += 1;
        }
        let ctx = ExtensionContext { epoch, iteration };
        extension.on_epoch_end(&ctx, model.source()).map_err(|e| e.to_string())?;

        if (epoch + 1) % 10 == 0 {
            log(level, LogLevel::Verbose, &format!("  Epoch {}/{}", epoch + 1, args.epochs));
        }
    }

    let report = extension.finish().map_err(|e| e.to_string())?;
    log(
        level,
        LogLevel::Normal,
        &format!("Wrote {} records to {}", report.len(), report.path().display()),
    );
    Ok(())
}
