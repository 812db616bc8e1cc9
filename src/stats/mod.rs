//! Statistics engine
//!
//! Converts a group of parameter tensors into a flat, stably-keyed mapping of
//! summary scalars: extrema, mean, population standard deviation, percentile
//! bands at standard-normal sigma points, and exact-zero sparsity counts.
//!
//! Each call is stateless and read-only: the matching buffers are flattened,
//! concatenated on host, and reduced. Uninitialized data never fails a call;
//! it yields NaN placeholders so the per-report key set stays constant across
//! epochs. Only malformed input (a layer name absent from the hierarchy) is
//! an error.
//!
//! # Example
//!
//! ```
//! use ndarray::arr2;
//! use vigilar::source::{InMemorySource, ParamAttr, ParamEntry, ParamName, ParamTensor};
//! use vigilar::stats::{compute_statistics, LayerSelect, StatisticsConfig, TensorSelector};
//!
//! let mut source = InMemorySource::new();
//! source.push(ParamEntry::new(
//!     "conv1",
//!     ParamName::Weight,
//!     ParamTensor::host(arr2(&[[0.0_f32, 0.0], [1.0, -1.0]]).into_dyn()),
//! ));
//!
//! let selector = TensorSelector {
//!     layers: LayerSelect::One("conv1".to_string()),
//!     param: ParamName::Weight,
//!     attr: ParamAttr::Data,
//! };
//! let record = compute_statistics(&source, &selector, &StatisticsConfig::default()).unwrap();
//! assert_eq!(record["conv1/W/data/mean"], 0.0);
//! assert_eq!(record["conv1/W/data/max"], 1.0);
//! ```

pub mod key;

use std::collections::BTreeMap;

use crate::source::{ParamAttr, ParamName, TensorSource};
use crate::{Error, Result};

/// Flat mapping from statistic key to scalar, produced fresh per invocation.
///
/// A `BTreeMap` keeps key order deterministic for serialization.
pub type Record = BTreeMap<String, f64>;

/// Quantile points corresponding to the standard-normal ±1σ/±2σ/±3σ bands
/// and the median, lowest first.
pub const SIGMA_PERCENTILES: [f64; 7] = [0.13, 2.28, 15.87, 50.0, 84.13, 97.72, 99.87];

// =============================================================================
// Selection
// =============================================================================

/// Which layers a tensor group spans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayerSelect {
    /// A single concrete layer; its name becomes the key's layer segment.
    One(String),
    /// Aggregate across every layer in the source; keyed with the wildcard.
    All,
}

impl LayerSelect {
    /// The key segment this selection produces.
    pub fn label(&self) -> &str {
        match self {
            LayerSelect::One(name) => name,
            LayerSelect::All => key::WILDCARD,
        }
    }
}

/// Names one tensor group: the layers, parameter kind, and attribute whose
/// buffers are concatenated into a single flattened view.
#[derive(Debug, Clone)]
pub struct TensorSelector {
    pub layers: LayerSelect,
    pub param: ParamName,
    pub attr: ParamAttr,
}

// =============================================================================
// Configuration
// =============================================================================

/// A requested summary statistic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryStat {
    Min,
    Max,
    Mean,
    /// Population standard deviation
    Std,
}

impl SummaryStat {
    /// Key segment for this statistic.
    pub fn as_str(self) -> &'static str {
        match self {
            SummaryStat::Min => "min",
            SummaryStat::Max => "max",
            SummaryStat::Mean => "mean",
            SummaryStat::Std => "std",
        }
    }
}

/// Which statistics and percentile points to compute.
#[derive(Debug, Clone)]
pub struct StatisticsConfig {
    pub statistics: Vec<SummaryStat>,
    /// Percentile points in `[0, 100]`; empty disables percentiles.
    pub percentile_sigmas: Vec<f64>,
}

impl Default for StatisticsConfig {
    fn default() -> Self {
        Self {
            statistics: vec![
                SummaryStat::Min,
                SummaryStat::Max,
                SummaryStat::Mean,
                SummaryStat::Std,
            ],
            percentile_sigmas: SIGMA_PERCENTILES.to_vec(),
        }
    }
}

// =============================================================================
// Engine
// =============================================================================

/// Compute summary statistics over one tensor group.
///
/// All matching buffers are flattened and concatenated, then each requested
/// statistic and percentile is computed over the combined view. An empty view
/// (uninitialized parameters or gradients) yields NaN for every requested key
/// rather than failing or omitting keys.
///
/// # Errors
///
/// [`Error::UnknownLayer`] if the selector names a layer absent from the
/// source hierarchy; [`Error::DeviceTransfer`] if moving a buffer to host
/// fails.
pub fn compute_statistics(
    source: &dyn TensorSource,
    selector: &TensorSelector,
    config: &StatisticsConfig,
) -> Result<Record> {
    let flat = flatten_group(source, selector)?;
    let layer = selector.layers.label();
    let mut record = Record::new();

    if !config.percentile_sigmas.is_empty() {
        let values = percentiles(&flat, &config.percentile_sigmas);
        for (i, value) in values.into_iter().enumerate() {
            record.insert(key::percentile_key(layer, selector.param, selector.attr, i), value);
        }
    }

    for stat in &config.statistics {
        record.insert(
            key::statistic_key(layer, selector.param, selector.attr, stat.as_str()),
            summarize(&flat, *stat),
        );
    }

    Ok(record)
}

/// Count exactly-zero elements across a tensor group's value buffers.
///
/// The count is absolute, not a ratio; callers divide by total size if a
/// fraction is wanted. An empty group has a well-defined count of zero, so
/// unlike the summary statistics no NaN placeholder is needed.
///
/// # Errors
///
/// Same failure classes as [`compute_statistics`].
pub fn compute_sparsity(
    source: &dyn TensorSource,
    layers: &LayerSelect,
    include_bias: bool,
) -> Result<Record> {
    validate_layer(source, layers)?;

    let mut zeros = 0u64;
    for entry in source.entries() {
        if let LayerSelect::One(name) = layers {
            if entry.layer() != name {
                continue;
            }
        }
        if entry.name() == ParamName::Bias && !include_bias {
            continue;
        }
        if let Some(tensor) = entry.tensor(ParamAttr::Data) {
            let flat = source.to_host(tensor)?;
            zeros += flat.iter().filter(|v| **v == 0.0).count() as u64;
        }
    }

    let mut record = Record::new();
    record.insert(key::sparsity_key(layers.label(), include_bias), zeros as f64);
    Ok(record)
}

/// Flatten and concatenate every buffer the selector matches.
fn flatten_group(source: &dyn TensorSource, selector: &TensorSelector) -> Result<Vec<f32>> {
    validate_layer(source, &selector.layers)?;

    let mut flat = Vec::new();
    for entry in source.entries() {
        if let LayerSelect::One(name) = &selector.layers {
            if entry.layer() != name {
                continue;
            }
        }
        if entry.name() != selector.param {
            continue;
        }
        if let Some(tensor) = entry.tensor(selector.attr) {
            let host = source.to_host(tensor)?;
            flat.extend(host.iter().copied());
        }
    }
    Ok(flat)
}

/// A concrete layer name must exist somewhere in the hierarchy; the engine
/// does not guess at spelling.
fn validate_layer(source: &dyn TensorSource, layers: &LayerSelect) -> Result<()> {
    if let LayerSelect::One(name) = layers {
        if !source.entries().iter().any(|e| e.layer() == name) {
            return Err(Error::UnknownLayer(name.clone()));
        }
    }
    Ok(())
}

/// Reduce a flattened view to one summary scalar. Empty views and views
/// containing NaN (the uninitialized-gradient sentinel) both reduce to NaN.
fn summarize(data: &[f32], stat: SummaryStat) -> f64 {
    if data.is_empty() || data.iter().any(|v| v.is_nan()) {
        return f64::NAN;
    }
    let n = data.len() as f64;
    match stat {
        SummaryStat::Min => data.iter().map(|v| f64::from(*v)).fold(f64::INFINITY, f64::min),
        SummaryStat::Max => data.iter().map(|v| f64::from(*v)).fold(f64::NEG_INFINITY, f64::max),
        SummaryStat::Mean => data.iter().map(|v| f64::from(*v)).sum::<f64>() / n,
        SummaryStat::Std => {
            let mean = data.iter().map(|v| f64::from(*v)).sum::<f64>() / n;
            let var = data.iter().map(|v| (f64::from(*v) - mean).powi(2)).sum::<f64>() / n;
            var.sqrt()
        }
    }
}

/// Linear-interpolated percentiles at the given points, one output per point.
///
/// Empty or NaN-bearing input yields an all-NaN result of the same length.
pub(crate) fn percentiles(data: &[f32], sigmas: &[f64]) -> Vec<f64> {
    if data.is_empty() || data.iter().any(|v| v.is_nan()) {
        return vec![f64::NAN; sigmas.len()];
    }

    let mut sorted: Vec<f64> = data.iter().map(|v| f64::from(*v)).collect();
    sorted.sort_by(f64::total_cmp);
    let last = sorted.len() - 1;

    sigmas
        .iter()
        .map(|sigma| {
            let rank = sigma / 100.0 * last as f64;
            let lo = rank.floor() as usize;
            let hi = rank.ceil() as usize;
            let frac = rank - lo as f64;
            sorted[lo] + (sorted[hi.min(last)] - sorted[lo]) * frac
        })
        .collect()
}

// =============================================================================
// Tests
// =============================================================================
