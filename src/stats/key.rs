//! Statistic key composition
//!
//! Every record entry is keyed `{layer}/{param}/{attr}/{statistic}`, with
//! percentiles keyed `{layer}/{param}/{attr}/percentile/{index}` (numeric
//! indices 0..=6, lowest sigma first) and sparsity counts keyed
//! `{layer}/{W|Wb}/zeros`. In aggregated mode the layer segment is the
//! wildcard `*`. Downstream plotting indexes by exact key string, so the
//! template is a fixed contract.

use crate::source::{ParamAttr, ParamName};

/// Layer segment used when aggregating across all layers.
pub const WILDCARD: &str = "*";

/// Key for a summary statistic, e.g. `conv1/W/data/mean`.
pub fn statistic_key(layer: &str, param: ParamName, attr: ParamAttr, statistic: &str) -> String {
    format!("{layer}/{param}/{attr}/{statistic}")
}

/// Key for the percentile at the given sigma index, e.g.
/// `conv1/W/data/percentile/3` for the median.
pub fn percentile_key(layer: &str, param: ParamName, attr: ParamAttr, index: usize) -> String {
    format!("{layer}/{param}/{attr}/percentile/{index}")
}

/// Key for a sparsity count, naming the parameter class it covers:
/// `W` for weights only, `Wb` when biases are included.
pub fn sparsity_key(layer: &str, include_bias: bool) -> String {
    let class = if include_bias { "Wb" } else { "W" };
    format!("{layer}/{class}/zeros")
}

/// Prepend a scope prefix, e.g. `predictor` + `conv1/W/data/mean`.
pub fn prefixed(prefix: &str, key: &str) -> String {
    format!("{prefix}/{key}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statistic_key_template() {
        let key = statistic_key("conv1", ParamName::Weight, ParamAttr::Data, "mean");
        assert_eq!(key, "conv1/W/data/mean");

        let key = statistic_key("fc2", ParamName::Bias, ParamAttr::Grad, "std");
        assert_eq!(key, "fc2/b/grad/std");
    }

    #[test]
    fn test_percentile_key_uses_numeric_index() {
        let key = percentile_key("conv1", ParamName::Weight, ParamAttr::Data, 3);
        assert_eq!(key, "conv1/W/data/percentile/3");
    }

    #[test]
    fn test_sparsity_key_names_param_class() {
        assert_eq!(sparsity_key("conv1", false), "conv1/W/zeros");
        assert_eq!(sparsity_key("conv1", true), "conv1/Wb/zeros");
    }

    #[test]
    fn test_wildcard_layer_segment() {
        let key = statistic_key(WILDCARD, ParamName::Weight, ParamAttr::Data, "min");
        assert_eq!(key, "*/W/data/min");
    }

    #[test]
    fn test_prefix_composition() {
        let key = statistic_key("conv1", ParamName::Weight, ParamAttr::Data, "mean");
        assert_eq!(prefixed("predictor", &key), "predictor/conv1/W/data/mean");
    }
}
