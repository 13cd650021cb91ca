use ndarray::{Array, Array1, Array2, ArrayView, ArrayView1, ArrayView2, Axis, Dimension, Zip};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::activations::Activation;
use crate::error::{DdpgError, Result};
use crate::layers::{DenseLayer, LayerTrait, WeightInit};

/// Execution mode of a network.
///
/// `Eval` is inference only: forward passes cache nothing, so no gradient
/// can be computed from them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Mode {
    #[default]
    Train,
    Eval,
}

/// A feed-forward network of dense layers with gradient accumulation.
///
/// A network is either trainable (a live network) or detached (a target
/// network). Detached networks never cache activations and refuse
/// `backward_batch`, so they can only change through [`NeuralNetwork::soft_update`].
#[derive(Clone, Debug)]
pub struct NeuralNetwork {
    pub layers: Vec<DenseLayer>,
    mode: Mode,
    trainable: bool,
}

impl NeuralNetwork {
    /// Build a network from layer sizes and one activation per layer.
    ///
    /// Hidden layers use `hidden_init`, the output layer uses `output_init`.
    pub fn new<R: Rng + ?Sized>(
        layer_sizes: &[usize],
        activations: &[Activation],
        hidden_init: WeightInit,
        output_init: WeightInit,
        rng: &mut R,
    ) -> Result<Self> {
        if layer_sizes.len() < 2 {
            return Err(DdpgError::invalid_parameter(
                "layer_sizes".to_string(),
                format!("need at least input and output sizes, got {}", layer_sizes.len()),
            ));
        }
        if layer_sizes.len() - 1 != activations.len() {
            return Err(DdpgError::dimension_mismatch(
                format!("{} activations", layer_sizes.len() - 1),
                format!("{} activations", activations.len()),
            ));
        }
        if layer_sizes.iter().any(|&s| s == 0) {
            return Err(DdpgError::invalid_parameter(
                "layer_sizes".to_string(),
                "layer sizes must be positive".to_string(),
            ));
        }

        let last = activations.len() - 1;
        let layers = layer_sizes
            .windows(2)
            .zip(activations.iter())
            .enumerate()
            .map(|(i, (window, &activation))| {
                let init = if i == last { output_init } else { hidden_init };
                DenseLayer::new(window[0], window[1], activation, init, &mut *rng)
            })
            .collect();

        Ok(NeuralNetwork {
            layers,
            mode: Mode::Train,
            trainable: true,
        })
    }

    pub fn with_layers(layers: Vec<DenseLayer>) -> Self {
        NeuralNetwork {
            layers,
            mode: Mode::Train,
            trainable: true,
        }
    }

    pub fn input_size(&self) -> usize {
        self.layers.first().map_or(0, |l| l.input_size())
    }

    pub fn output_size(&self) -> usize {
        self.layers.last().map_or(0, |l| l.output_size())
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
        if mode == Mode::Eval {
            self.layers.iter_mut().for_each(|l| l.clear_cache());
        }
    }

    pub fn is_trainable(&self) -> bool {
        self.trainable
    }

    /// Mark the network as a target: no caching, no gradients, no optimizer steps.
    pub fn detach(&mut self) {
        self.trainable = false;
        for layer in &mut self.layers {
            layer.clear_cache();
            layer.zero_grad();
        }
    }

    fn tracks_gradients(&self) -> bool {
        self.trainable && self.mode == Mode::Train
    }

    /// Forward pass for a single input vector.
    pub fn forward(&mut self, input: ArrayView1<f32>) -> Result<Array1<f32>> {
        let output = self.forward_batch(input.insert_axis(Axis(0)))?;
        Ok(output.index_axis_move(Axis(0), 0))
    }

    /// Forward pass for a `[B, input_size]` batch.
    pub fn forward_batch(&mut self, inputs: ArrayView2<f32>) -> Result<Array2<f32>> {
        if inputs.ncols() != self.input_size() {
            return Err(DdpgError::dimension_mismatch(
                format!("[*, {}]", self.input_size()),
                format!("{:?}", inputs.dim()),
            ));
        }
        let track = self.tracks_gradients();
        let mut current_output = inputs.to_owned();
        for layer in &mut self.layers {
            current_output = layer.forward_batch(current_output.view(), track);
        }
        Ok(current_output)
    }

    /// Backpropagate `output_errors` (dLoss/dOutput) through the last tracked forward pass.
    ///
    /// Parameter gradients are added to the accumulators; the return value is
    /// dLoss/dInput.
    pub fn backward_batch(&mut self, output_errors: ArrayView2<f32>) -> Result<Array2<f32>> {
        if !self.trainable {
            return Err(DdpgError::TrainingError(
                "cannot backpropagate through a detached network".to_string(),
            ));
        }
        let mut current_error = output_errors.to_owned();
        for layer in self.layers.iter_mut().rev() {
            current_error = layer.backward_batch(current_error.view())?;
        }
        Ok(current_error)
    }

    pub fn zero_grad(&mut self) {
        self.layers.iter_mut().for_each(|l| l.zero_grad());
    }

    /// L2 norm over every accumulated gradient of the network.
    pub fn gradient_norm(&self) -> f32 {
        self.layers
            .iter()
            .map(|l| {
                l.weight_gradients().iter().map(|&g| g * g).sum::<f32>()
                    + l.bias_gradients().iter().map(|&g| g * g).sum::<f32>()
            })
            .sum::<f32>()
            .sqrt()
    }

    pub fn parameter_count(&self) -> usize {
        self.layers.iter().map(|l| l.weights.len() + l.biases.len()).sum()
    }

    /// Check that `other` has the same layer count and parameter shapes.
    pub fn same_topology(&self, other: &NeuralNetwork) -> bool {
        self.layers.len() == other.layers.len()
            && self
                .layers
                .iter()
                .zip(other.layers.iter())
                .all(|(a, b)| a.weights.dim() == b.weights.dim() && a.biases.dim() == b.biases.dim())
    }

    /// `θ_self := τ·θ_source + (1 - τ)·θ_self` for every parameter.
    ///
    /// `tau = 1.0` is a hard copy.
    pub fn soft_update(&mut self, source: &NeuralNetwork, tau: f32) -> Result<()> {
        if !(0.0..=1.0).contains(&tau) {
            return Err(DdpgError::invalid_parameter(
                "tau".to_string(),
                format!("must lie in [0, 1], got {}", tau),
            ));
        }
        if !self.same_topology(source) {
            return Err(DdpgError::dimension_mismatch(
                format!("{} layers", source.layers.len()),
                format!("{} layers with different shapes", self.layers.len()),
            ));
        }
        for (target, local) in self.layers.iter_mut().zip(source.layers.iter()) {
            target.weights = interpolate(local.weights.view(), target.weights.view(), tau);
            target.biases = interpolate(local.biases.view(), target.biases.view(), tau);
        }
        Ok(())
    }
}

/// Pure soft-update rule: returns `tau * local + (1 - tau) * target`.
///
/// Shapes must match; callers check topology first.
pub fn interpolate<D: Dimension>(
    local: ArrayView<f32, D>,
    target: ArrayView<f32, D>,
    tau: f32,
) -> Array<f32, D> {
    Zip::from(local)
        .and(target)
        .map_collect(|&l, &t| tau * l + (1.0 - tau) * t)
}
