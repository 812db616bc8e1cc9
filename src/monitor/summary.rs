//! Running mean over records
//!
//! The statistics engine is stateless; any averaging across invocations lives
//! here, on the reporting side. A summary accumulates per-key sums and counts
//! and produces the mean record on demand.

use std::collections::BTreeMap;

use crate::stats::Record;

/// Per-key running mean across [`add`](RecordSummary::add) calls.
#[derive(Debug, Clone, Default)]
pub struct RecordSummary {
    sums: BTreeMap<String, (f64, u64)>,
}

impl RecordSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one record into the accumulator. NaN values poison their key's
    /// mean for the current window, mirroring how the engine reports
    /// uninitialized data.
    pub fn add(&mut self, record: &Record) {
        for (key, value) in record {
            let slot = self.sums.entry(key.clone()).or_insert((0.0, 0));
            slot.0 += value;
            slot.1 += 1;
        }
    }

    /// Mean record over everything added since the last reset.
    pub fn mean(&self) -> Record {
        self.sums.iter().map(|(key, (sum, count))| (key.clone(), sum / *count as f64)).collect()
    }

    /// Drop all accumulated state.
    pub fn reset(&mut self) {
        self.sums.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.sums.is_empty()
    }

    /// Number of distinct keys accumulated.
    pub fn len(&self) -> usize {
        self.sums.len()
    }
}
