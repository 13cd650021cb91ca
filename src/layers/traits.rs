use ndarray::{Array1, Array2, ArrayView2};

use crate::error::Result;

/// Trait defining the interface for trainable layers
pub trait Layer {
    /// Forward propagation for a batch of inputs.
    ///
    /// When `track` is false nothing is cached and a following
    /// [`Layer::backward_batch`] call fails.
    fn forward_batch(&mut self, inputs: ArrayView2<f32>, track: bool) -> Array2<f32>;

    /// Backward propagation for a batch of output errors.
    ///
    /// Accumulates parameter gradients and returns the error w.r.t. the layer input.
    fn backward_batch(&mut self, output_errors: ArrayView2<f32>) -> Result<Array2<f32>>;

    /// Reset accumulated gradients to zero
    fn zero_grad(&mut self);

    /// Drop cached forward activations
    fn clear_cache(&mut self);

    fn weights(&self) -> &Array2<f32>;

    fn biases(&self) -> &Array1<f32>;

    fn weight_gradients(&self) -> &Array2<f32>;

    fn bias_gradients(&self) -> &Array1<f32>;

    /// Get the output size of the layer
    fn output_size(&self) -> usize;

    /// Get the input size of the layer
    fn input_size(&self) -> usize;
}
