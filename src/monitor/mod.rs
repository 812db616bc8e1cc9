//! Layer monitoring
//!
//! A [`LayerMonitor`] turns one pass over a tensor source into a single
//! record covering a fixed set of layer/parameter/attribute combinations:
//! summary statistics and percentile bands per target, plus a sparsity count
//! per layer. The key set is identical on every invocation, so a sequence of
//! records forms a uniform schema suitable for time-series plotting.
//!
//! [`MonitorExtension`] packages a monitor with a running-mean summary and a
//! log report into a [`TrainerExtension`] the host training loop invokes at
//! epoch boundaries.

mod extension;
mod summary;

pub use extension::{ExtensionContext, MonitorExtension, TrainerExtension};
pub use summary::RecordSummary;

use serde::{Deserialize, Serialize};

use crate::source::{ParamAttr, ParamName, TensorSource};
use crate::stats::{
    compute_sparsity, compute_statistics, key, LayerSelect, Record, StatisticsConfig,
    TensorSelector,
};
use crate::Result;

/// One monitored parameter/attribute combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorTarget {
    pub param: ParamName,
    pub attr: ParamAttr,
}

/// Weights and biases, values and gradients.
pub fn default_targets() -> Vec<MonitorTarget> {
    vec![
        MonitorTarget { param: ParamName::Weight, attr: ParamAttr::Data },
        MonitorTarget { param: ParamName::Weight, attr: ParamAttr::Grad },
        MonitorTarget { param: ParamName::Bias, attr: ParamAttr::Data },
        MonitorTarget { param: ParamName::Bias, attr: ParamAttr::Grad },
    ]
}

fn default_true() -> bool {
    true
}

fn default_trigger() -> usize {
    1
}

/// Monitor configuration, loadable from YAML.
///
/// ```yaml
/// layers: [conv1, conv2, fc1]
/// targets:
///   - { param: W, attr: data }
///   - { param: W, attr: grad }
/// sparsity: true
/// sparsity_include_bias: true
/// prefix: predictor
/// trigger_epochs: 1
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Layers to monitor. Empty means every layer the source enumerates;
    /// the enumerated set must then stay stable across epochs to keep the
    /// report schema uniform.
    #[serde(default)]
    pub layers: Vec<String>,

    /// Parameter/attribute combinations to cover per layer.
    #[serde(default = "default_targets")]
    pub targets: Vec<MonitorTarget>,

    /// Emit per-layer exact-zero counts.
    #[serde(default = "default_true")]
    pub sparsity: bool,

    /// Count bias zeros alongside weight zeros (`Wb` key class).
    #[serde(default = "default_true")]
    pub sparsity_include_bias: bool,

    /// Also emit wildcard-keyed statistics aggregated across all monitored
    /// layers, one extra record group per target.
    #[serde(default)]
    pub aggregate: bool,

    /// Optional scope prefix prepended to every key, e.g. `predictor`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,

    /// Flush the averaged record to the log every this many epochs.
    #[serde(default = "default_trigger")]
    pub trigger_epochs: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            layers: Vec::new(),
            targets: default_targets(),
            sparsity: true,
            sparsity_include_bias: true,
            aggregate: false,
            prefix: None,
            trigger_epochs: 1,
        }
    }
}

/// Collects per-layer statistics into one record per invocation.
#[derive(Debug, Clone)]
pub struct LayerMonitor {
    config: MonitorConfig,
    stats: StatisticsConfig,
}

impl LayerMonitor {
    pub fn new(config: MonitorConfig) -> Self {
        Self { config, stats: StatisticsConfig::default() }
    }

    /// Override which statistics and percentile points are computed.
    pub fn with_statistics(mut self, stats: StatisticsConfig) -> Self {
        self.stats = stats;
        self
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// One pass over the source: the union record of every monitored
    /// layer/target combination plus per-layer sparsity.
    ///
    /// # Errors
    ///
    /// Fails on a configured layer name the source does not carry, or on a
    /// device-transfer failure; a record is either fully produced or the
    /// call fails entirely.
    pub fn observe(&self, source: &dyn TensorSource) -> Result<Record> {
        let layers = if self.config.layers.is_empty() {
            source.layer_names()
        } else {
            self.config.layers.clone()
        };

        let mut record = Record::new();
        for layer in &layers {
            let select = LayerSelect::One(layer.clone());
            for target in &self.config.targets {
                let selector = TensorSelector {
                    layers: select.clone(),
                    param: target.param,
                    attr: target.attr,
                };
                record.extend(compute_statistics(source, &selector, &self.stats)?);
            }
            if self.config.sparsity {
                record.extend(compute_sparsity(
                    source,
                    &select,
                    self.config.sparsity_include_bias,
                )?);
            }
        }

        if self.config.aggregate {
            for target in &self.config.targets {
                let selector = TensorSelector {
                    layers: LayerSelect::All,
                    param: target.param,
                    attr: target.attr,
                };
                record.extend(compute_statistics(source, &selector, &self.stats)?);
            }
            if self.config.sparsity {
                record.extend(compute_sparsity(
                    source,
                    &LayerSelect::All,
                    self.config.sparsity_include_bias,
                )?);
            }
        }

        if let Some(prefix) = &self.config.prefix {
            record = record.into_iter().map(|(k, v)| (key::prefixed(prefix, &k), v)).collect();
        }
        Ok(record)
    }
}
