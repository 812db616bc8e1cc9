//! Demo convolutional classifier
//!
//! A small MNIST-shaped convolutional classifier expressed purely as a
//! parameter hierarchy: three strided convolution stages feeding two fully
//! connected layers. The host framework owns forward/backward computation;
//! for the demo command a synthetic step routine stands in for it, random-
//! walking the weights and resampling gradients so the monitored statistics
//! evolve the way a real run's do.

use ndarray::{ArrayD, IxDyn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::source::{InMemorySource, ParamEntry, ParamName, ParamTensor};

/// Layer names in forward order.
pub const LAYER_NAMES: [&str; 5] = ["conv1", "conv2", "conv3", "fc1", "fc2"];

/// Weights below this magnitude are clamped to exactly zero on each step,
/// standing in for dead weights so the sparsity series carries signal.
const PRUNE_THRESHOLD: f32 = 1e-3;

// Parameter shapes for 1x28x28 input, kernel 4, stride 2, pad 1:
// feature maps shrink 28 -> 14 -> 7 -> 3, so fc1 sees 128*3*3 inputs.
fn layer_shapes() -> Vec<(&'static str, Vec<usize>, Vec<usize>)> {
    vec![
        ("conv1", vec![32, 1, 4, 4], vec![32]),
        ("conv2", vec![64, 32, 4, 4], vec![64]),
        ("conv3", vec![128, 64, 4, 4], vec![128]),
        ("fc1", vec![1024, 128 * 3 * 3], vec![1024]),
        ("fc2", vec![10, 1024], vec![10]),
    ]
}

/// The demo model: an in-memory parameter hierarchy plus the RNG driving
/// its synthetic steps.
#[derive(Debug)]
pub struct ConvClassifier {
    source: InMemorySource,
    rng: StdRng,
}

impl ConvClassifier {
    /// Build the hierarchy with uniformly initialized weights and zero
    /// biases. Gradients stay unset until the first [`step`](Self::step),
    /// like a real model before its first backward pass.
    pub fn new(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut source = InMemorySource::new();

        for (layer, w_shape, b_shape) in layer_shapes() {
            let fan_in: usize = w_shape.iter().skip(1).product();
            let scale = 1.0 / (fan_in as f32).sqrt();
            let weights =
                ArrayD::from_shape_fn(IxDyn(&w_shape), |_| rng.gen_range(-scale..scale));
            source.push(ParamEntry::new(layer, ParamName::Weight, ParamTensor::host(weights)));
            source.push(ParamEntry::new(
                layer,
                ParamName::Bias,
                ParamTensor::host(ArrayD::zeros(IxDyn(&b_shape))),
            ));
        }

        Self { source, rng }
    }

    pub fn source(&self) -> &InMemorySource {
        &self.source
    }

    pub fn layer_names(&self) -> Vec<String> {
        LAYER_NAMES.iter().map(|n| (*n).to_string()).collect()
    }

    /// One synthetic training step: resample gradients, apply them as a
    /// scaled random walk, and prune near-zero weights.
    pub fn step(&mut self) {
        let rng = &mut self.rng;
        for entry in self.source.entries_mut() {
            let Some(value) = entry.tensor(crate::source::ParamAttr::Data) else {
                continue;
            };
            let shape = value.values().shape().to_vec();
            let grad = ArrayD::from_shape_fn(IxDyn(&shape), |_| rng.gen_range(-0.01_f32..0.01));
            let mut updated = value.values() - &grad;
            if entry.name() == ParamName::Weight {
                updated.mapv_inplace(|v| if v.abs() < PRUNE_THRESHOLD { 0.0 } else { v });
            }
            entry.set_value(ParamTensor::host(updated));
            entry.set_grad(ParamTensor::host(grad));
        }
    }
}
