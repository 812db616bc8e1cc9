//! Tensor source contract
//!
//! A [`TensorSource`] exposes the parameter hierarchy of a model as a flat
//! sequence of [`ParamEntry`] values: one entry per `(layer, parameter)` pair,
//! carrying the current value buffer and, once a backward pass has run, the
//! gradient buffer. The statistics engine filters this sequence instead of
//! reflecting into live model objects.
//!
//! Buffers may live on an accelerator; [`TensorSource::to_host`] is the
//! explicit transfer step the engine calls before computing statistics, so the
//! statistic code itself is written once against host-resident data.

use ndarray::{Array1, ArrayD};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::Result;

/// Parameter kind within a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParamName {
    /// Weight tensor, keyed as `W`
    #[serde(rename = "W")]
    Weight,
    /// Bias tensor, keyed as `b`
    #[serde(rename = "b")]
    Bias,
}

impl ParamName {
    /// Key segment for this parameter kind.
    pub fn as_str(self) -> &'static str {
        match self {
            ParamName::Weight => "W",
            ParamName::Bias => "b",
        }
    }
}

impl fmt::Display for ParamName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which buffer of a parameter to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamAttr {
    /// Current parameter values
    Data,
    /// Most recently computed gradient
    Grad,
}

impl ParamAttr {
    /// Key segment for this attribute.
    pub fn as_str(self) -> &'static str {
        match self {
            ParamAttr::Data => "data",
            ParamAttr::Grad => "grad",
        }
    }
}

impl fmt::Display for ParamAttr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a tensor's buffer currently resides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Device {
    /// Host (CPU) memory
    #[default]
    Host,
    /// Accelerator memory; requires an explicit transfer before statistics
    Accelerator,
}

/// A multi-dimensional parameter buffer with a device tag.
#[derive(Debug, Clone)]
pub struct ParamTensor {
    values: ArrayD<f32>,
    device: Device,
}

impl ParamTensor {
    /// Wrap a host-resident buffer.
    pub fn host(values: ArrayD<f32>) -> Self {
        Self { values, device: Device::Host }
    }

    /// Wrap a buffer with an explicit device tag.
    pub fn on_device(values: ArrayD<f32>, device: Device) -> Self {
        Self { values, device }
    }

    /// The underlying buffer.
    pub fn values(&self) -> &ArrayD<f32> {
        &self.values
    }

    pub fn device(&self) -> Device {
        self.device
    }

    /// Total element count.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// One `(layer, parameter)` pair of the model hierarchy.
///
/// The value slot is `None` while the parameter is uninitialized (e.g. a
/// shape-inferred layer before its first forward pass); the gradient slot is
/// `None` until the first backward pass. Missing buffers contribute nothing
/// to a flattened view, which the statistics engine turns into NaN
/// placeholders rather than omitted keys.
#[derive(Debug, Clone)]
pub struct ParamEntry {
    layer: String,
    name: ParamName,
    value: Option<ParamTensor>,
    grad: Option<ParamTensor>,
}

impl ParamEntry {
    /// Entry with a known value and no gradient yet.
    pub fn new(layer: impl Into<String>, name: ParamName, value: ParamTensor) -> Self {
        Self { layer: layer.into(), name, value: Some(value), grad: None }
    }

    /// Entry whose value buffer is not yet populated.
    pub fn uninitialized(layer: impl Into<String>, name: ParamName) -> Self {
        Self { layer: layer.into(), name, value: None, grad: None }
    }

    /// Attach a gradient buffer.
    pub fn with_grad(mut self, grad: ParamTensor) -> Self {
        self.grad = Some(grad);
        self
    }

    pub fn layer(&self) -> &str {
        &self.layer
    }

    pub fn name(&self) -> ParamName {
        self.name
    }

    /// The buffer for the given attribute, if populated.
    pub fn tensor(&self, attr: ParamAttr) -> Option<&ParamTensor> {
        match attr {
            ParamAttr::Data => self.value.as_ref(),
            ParamAttr::Grad => self.grad.as_ref(),
        }
    }

    pub fn set_value(&mut self, value: ParamTensor) {
        self.value = Some(value);
    }

    pub fn set_grad(&mut self, grad: ParamTensor) {
        self.grad = Some(grad);
    }
}

/// Enumeration contract between a model and the statistics engine.
pub trait TensorSource {
    /// All parameter entries, in a stable layer-iteration order.
    ///
    /// Order only affects internal concatenation; every statistic the engine
    /// computes is order-independent.
    fn entries(&self) -> &[ParamEntry];

    /// Flatten a tensor to a host-resident 1-D buffer.
    ///
    /// The default implementation copies row-major, which is correct for
    /// host-resident sources. Sources backed by a real accelerator override
    /// this with their device-to-host transfer and surface failures as
    /// [`Error::DeviceTransfer`](crate::Error::DeviceTransfer).
    fn to_host(&self, tensor: &ParamTensor) -> Result<Array1<f32>> {
        Ok(Array1::from_iter(tensor.values().iter().copied()))
    }

    /// Unique layer names, in entry order.
    fn layer_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for entry in self.entries() {
            if !names.iter().any(|n| n == entry.layer()) {
                names.push(entry.layer().to_string());
            }
        }
        names
    }
}

/// Host-resident tensor source backed by a plain entry list.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    entries: Vec<ParamEntry>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry, preserving insertion order.
    pub fn push(&mut self, entry: ParamEntry) {
        self.entries.push(entry);
    }

    /// Mutable access to a specific `(layer, parameter)` entry.
    pub fn entry_mut(&mut self, layer: &str, name: ParamName) -> Option<&mut ParamEntry> {
        self.entries.iter_mut().find(|e| e.layer() == layer && e.name() == name)
    }

    /// Mutable iteration over all entries, for hosts updating buffers between
    /// monitoring passes.
    pub fn entries_mut(&mut self) -> impl Iterator<Item = &mut ParamEntry> {
        self.entries.iter_mut()
    }
}

impl TensorSource for InMemorySource {
    fn entries(&self) -> &[ParamEntry] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr2;

    fn tensor(values: &[f32]) -> ParamTensor {
        ParamTensor::host(Array1::from_vec(values.to_vec()).into_dyn())
    }

    #[test]
    fn test_param_name_segments() {
        assert_eq!(ParamName::Weight.as_str(), "W");
        assert_eq!(ParamName::Bias.as_str(), "b");
        assert_eq!(ParamAttr::Data.as_str(), "data");
        assert_eq!(ParamAttr::Grad.as_str(), "grad");
    }

    #[test]
    fn test_param_name_serde() {
        let w: ParamName = serde_json::from_str("\"W\"").expect("deserialize");
        assert_eq!(w, ParamName::Weight);
        assert_eq!(serde_json::to_string(&ParamName::Bias).expect("serialize"), "\"b\"");

        let attr: ParamAttr = serde_json::from_str("\"grad\"").expect("deserialize");
        assert_eq!(attr, ParamAttr::Grad);
    }

    #[test]
    fn test_entry_tensor_access() {
        let entry = ParamEntry::new("conv1", ParamName::Weight, tensor(&[1.0, 2.0]))
            .with_grad(tensor(&[0.1, 0.2]));

        assert_eq!(entry.layer(), "conv1");
        assert_eq!(entry.name(), ParamName::Weight);
        assert_eq!(entry.tensor(ParamAttr::Data).map(ParamTensor::len), Some(2));
        assert_eq!(entry.tensor(ParamAttr::Grad).map(ParamTensor::len), Some(2));
    }

    #[test]
    fn test_uninitialized_entry_has_no_buffers() {
        let entry = ParamEntry::uninitialized("fc1", ParamName::Weight);
        assert!(entry.tensor(ParamAttr::Data).is_none());
        assert!(entry.tensor(ParamAttr::Grad).is_none());
    }

    #[test]
    fn test_to_host_flattens_row_major() {
        let source = InMemorySource::new();
        let t = ParamTensor::host(arr2(&[[1.0_f32, 2.0], [3.0, 4.0]]).into_dyn());
        let flat = source.to_host(&t).expect("host transfer");
        assert_eq!(flat.to_vec(), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_accelerator_tag_round_trips_through_default_transfer() {
        let source = InMemorySource::new();
        let t = ParamTensor::on_device(
            Array1::from_vec(vec![5.0_f32, 6.0]).into_dyn(),
            Device::Accelerator,
        );
        assert_eq!(t.device(), Device::Accelerator);
        let flat = source.to_host(&t).expect("host transfer");
        assert_eq!(flat.to_vec(), vec![5.0, 6.0]);
    }

    #[test]
    fn test_layer_names_unique_in_order() {
        let mut source = InMemorySource::new();
        source.push(ParamEntry::new("conv1", ParamName::Weight, tensor(&[1.0])));
        source.push(ParamEntry::new("conv1", ParamName::Bias, tensor(&[0.0])));
        source.push(ParamEntry::new("fc1", ParamName::Weight, tensor(&[2.0])));

        assert_eq!(source.layer_names(), vec!["conv1".to_string(), "fc1".to_string()]);
    }

    #[test]
    fn test_entry_mut_updates_buffers() {
        let mut source = InMemorySource::new();
        source.push(ParamEntry::uninitialized("fc1", ParamName::Weight));

        let entry = source.entry_mut("fc1", ParamName::Weight).expect("entry exists");
        entry.set_value(tensor(&[1.0, 2.0, 3.0]));
        entry.set_grad(tensor(&[0.0, 0.0, 0.0]));

        let entry = &source.entries()[0];
        assert_eq!(entry.tensor(ParamAttr::Data).map(ParamTensor::len), Some(3));
        assert!(entry.tensor(ParamAttr::Grad).is_some());
        assert!(source.entry_mut("fc2", ParamName::Weight).is_none());
    }
}
