//! Vigilar: per-layer statistics monitoring for neural network training
//!
//! Samples weight/bias/gradient statistics from a host training loop at
//! epoch boundaries, accumulates them into flat keyed records, persists the
//! records as a JSON log, and renders percentile-band grid plots from that
//! log.
//!
//! The crate deliberately owns no training machinery. The host framework is
//! reached through two seams:
//!
//! - [`source::TensorSource`] enumerates the model's parameter hierarchy as
//!   `(layer, param, value, gradient)` entries with an explicit host-transfer
//!   step for accelerator-resident buffers.
//! - [`monitor::TrainerExtension`] is the hook the training loop invokes at
//!   epoch boundaries, between steps.
//!
//! # Example
//!
//! ```
//! use ndarray::Array1;
//! use vigilar::monitor::{LayerMonitor, MonitorConfig};
//! use vigilar::source::{InMemorySource, ParamEntry, ParamName, ParamTensor};
//!
//! let mut source = InMemorySource::new();
//! source.push(ParamEntry::new(
//!     "conv1",
//!     ParamName::Weight,
//!     ParamTensor::host(Array1::from_vec(vec![0.0_f32, 1.0, -1.0]).into_dyn()),
//! ));
//!
//! let monitor = LayerMonitor::new(MonitorConfig::default());
//! let record = monitor.observe(&source).unwrap();
//! assert_eq!(record["conv1/W/data/max"], 1.0);
//! ```

pub mod cli;
pub mod error;
pub mod model;
pub mod monitor;
pub mod plot;
pub mod report;
pub mod source;
pub mod stats;

pub use error::{Error, Result};
pub use monitor::{LayerMonitor, MonitorConfig, MonitorExtension, RecordSummary, TrainerExtension};
pub use report::{load_log, LogReport, LogSeries};
pub use source::{InMemorySource, ParamAttr, ParamEntry, ParamName, ParamTensor, TensorSource};
pub use stats::{
    compute_sparsity, compute_statistics, LayerSelect, Record, StatisticsConfig, SummaryStat,
    TensorSelector, SIGMA_PERCENTILES,
};
