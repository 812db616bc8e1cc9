//! Trainer extension hook
//!
//! The host training loop drives monitoring through the [`TrainerExtension`]
//! trait: once before training starts and once at the end of every epoch,
//! between steps, so no tensor is read mid-mutation. [`MonitorExtension`] is
//! the standard implementation: it observes the tensor source, folds the
//! record into a running mean, and flushes the averaged record to the log on
//! the configured trigger.

use crate::monitor::{LayerMonitor, RecordSummary};
use crate::report::LogReport;
use crate::source::TensorSource;
use crate::Result;

/// Training progress handed to extensions.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtensionContext {
    /// Current epoch (0-indexed)
    pub epoch: usize,
    /// Global iteration count
    pub iteration: usize,
}

/// Hook invoked by a host training loop at well-defined boundaries.
///
/// Both methods default to no-ops, so implementations only override the
/// events they care about.
pub trait TrainerExtension {
    /// Called once before the first training step. Parameters may still be
    /// uninitialized at this point; statistics taken here record the NaN
    /// placeholders that keep the log schema uniform from the start.
    fn on_train_begin(
        &mut self,
        _ctx: &ExtensionContext,
        _source: &dyn TensorSource,
    ) -> Result<()> {
        Ok(())
    }

    /// Called after each epoch, between training steps.
    fn on_epoch_end(&mut self, _ctx: &ExtensionContext, _source: &dyn TensorSource) -> Result<()> {
        Ok(())
    }

    /// Extension name for log output.
    fn name(&self) -> &'static str {
        "TrainerExtension"
    }
}

/// Monitors layer statistics and reports them to a persisted log.
#[derive(Debug)]
pub struct MonitorExtension {
    monitor: LayerMonitor,
    summary: RecordSummary,
    report: LogReport,
    epochs_since_flush: usize,
}

impl MonitorExtension {
    pub fn new(monitor: LayerMonitor, report: LogReport) -> Self {
        Self { monitor, summary: RecordSummary::new(), report, epochs_since_flush: 0 }
    }

    pub fn report(&self) -> &LogReport {
        &self.report
    }

    /// Flush any partially accumulated window and return the report.
    ///
    /// Call once after the training loop so a final window shorter than the
    /// trigger interval still reaches the log.
    pub fn finish(mut self) -> Result<LogReport> {
        if !self.summary.is_empty() {
            self.report.append(self.summary.mean())?;
            self.summary.reset();
        }
        Ok(self.report)
    }
}

impl TrainerExtension for MonitorExtension {
    fn on_train_begin(&mut self, _ctx: &ExtensionContext, source: &dyn TensorSource) -> Result<()> {
        // Pre-training snapshot bypasses the running mean: it is flushed
        // immediately as the log's first element.
        let record = self.monitor.observe(source)?;
        self.report.append(record)
    }

    fn on_epoch_end(&mut self, _ctx: &ExtensionContext, source: &dyn TensorSource) -> Result<()> {
        let record = self.monitor.observe(source)?;
        self.summary.add(&record);
        self.epochs_since_flush += 1;

        if self.epochs_since_flush >= self.monitor.config().trigger_epochs.max(1) {
            self.report.append(self.summary.mean())?;
            self.summary.reset();
            self.epochs_since_flush = 0;
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "layer_monitor"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::MonitorConfig;
    use crate::source::{InMemorySource, ParamEntry, ParamName, ParamTensor};
    use ndarray::Array1;

    fn tensor(values: &[f32]) -> ParamTensor {
        ParamTensor::host(Array1::from_vec(values.to_vec()).into_dyn())
    }

    fn source_with_weight(values: &[f32]) -> InMemorySource {
        let mut source = InMemorySource::new();
        source.push(ParamEntry::new("conv1", ParamName::Weight, tensor(values)));
        source
    }

    fn extension(trigger_epochs: usize, dir: &std::path::Path) -> MonitorExtension {
        let monitor =
            LayerMonitor::new(MonitorConfig { trigger_epochs, ..MonitorConfig::default() });
        let report = LogReport::create(dir.join("log")).expect("create report");
        MonitorExtension::new(monitor, report)
    }

    #[test]
    fn test_flushes_every_epoch_with_default_trigger() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = source_with_weight(&[1.0, 2.0]);
        let mut ext = extension(1, dir.path());

        for epoch in 0..3 {
            let ctx = ExtensionContext { epoch, iteration: epoch * 10 };
            ext.on_epoch_end(&ctx, &source).expect("epoch end");
        }
        assert_eq!(ext.report().len(), 3);
    }

    #[test]
    fn test_trigger_averages_window() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut source = source_with_weight(&[1.0]);
        let mut ext = extension(2, dir.path());

        ext.on_epoch_end(&ExtensionContext::default(), &source).expect("epoch end");
        assert_eq!(ext.report().len(), 0);

        source.entry_mut("conv1", ParamName::Weight).expect("entry").set_value(tensor(&[3.0]));
        ext.on_epoch_end(&ExtensionContext { epoch: 1, iteration: 0 }, &source)
            .expect("epoch end");

        assert_eq!(ext.report().len(), 1);
        // Mean of the two per-epoch means: (1 + 3) / 2
        assert_eq!(ext.report().entries()[0]["conv1/W/data/mean"], 2.0);
    }

    #[test]
    fn test_finish_flushes_partial_window() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = source_with_weight(&[5.0]);
        let mut ext = extension(10, dir.path());

        ext.on_epoch_end(&ExtensionContext::default(), &source).expect("epoch end");
        assert_eq!(ext.report().len(), 0);

        let report = ext.finish().expect("finish");
        assert_eq!(report.len(), 1);
        assert_eq!(report.entries()[0]["conv1/W/data/mean"], 5.0);
    }

    #[test]
    fn test_finish_without_pending_window_appends_nothing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = source_with_weight(&[5.0]);
        let mut ext = extension(1, dir.path());

        ext.on_epoch_end(&ExtensionContext::default(), &source).expect("epoch end");
        let report = ext.finish().expect("finish");
        assert_eq!(report.len(), 1);
    }

    #[test]
    fn test_train_begin_records_uninitialized_snapshot() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut source = InMemorySource::new();
        source.push(ParamEntry::uninitialized("fc1", ParamName::Weight));
        let mut ext = extension(1, dir.path());

        ext.on_train_begin(&ExtensionContext::default(), &source).expect("train begin");
        assert_eq!(ext.report().len(), 1);
        assert!(ext.report().entries()[0]["fc1/W/data/mean"].is_nan());
    }

    #[test]
    fn test_extension_name() {
        let dir = tempfile::tempdir().expect("tempdir");
        let ext = extension(1, dir.path());
        assert_eq!(ext.name(), "layer_monitor");
    }

    #[test]
    fn test_default_trait_methods_are_no_ops() {
        struct Inert;
        impl TrainerExtension for Inert {}

        let source = source_with_weight(&[1.0]);
        let mut ext = Inert;
        ext.on_train_begin(&ExtensionContext::default(), &source).expect("no-op");
        ext.on_epoch_end(&ExtensionContext::default(), &source).expect("no-op");
        assert_eq!(ext.name(), "TrainerExtension");
    }
}
