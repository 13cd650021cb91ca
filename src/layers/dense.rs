use ndarray::{Array1, Array2, ArrayView2, Axis};
use rand::Rng;

use super::initialization::WeightInit;
use super::traits::Layer as LayerTrait;
use crate::activations::Activation;
use crate::error::{DdpgError, Result};

/// A fully connected (dense) layer in a neural network
#[derive(Clone, Debug)]
pub struct DenseLayer {
    pub weights: Array2<f32>,
    pub biases: Array1<f32>,
    pub activation: Activation,
    weight_grad: Array2<f32>,
    bias_grad: Array1<f32>,
    pre_activation_output: Option<Array2<f32>>,
    inputs: Option<Array2<f32>>,
}

impl DenseLayer {
    /// Create a new dense layer, drawing weights and biases from `init`.
    pub fn new<R: Rng + ?Sized>(
        input_size: usize,
        output_size: usize,
        activation: Activation,
        init: WeightInit,
        rng: &mut R,
    ) -> Self {
        let weights = init.initialize_weights((input_size, output_size), rng);
        let biases = init.initialize_biases(output_size, input_size, rng);
        DenseLayer {
            weight_grad: Array2::zeros(weights.dim()),
            bias_grad: Array1::zeros(biases.dim()),
            weights,
            biases,
            activation,
            pre_activation_output: None,
            inputs: None,
        }
    }

    pub fn with_weights(mut self, weights: Array2<f32>) -> Self {
        assert_eq!(weights.dim(), self.weights.dim());
        self.weights = weights;
        self
    }

    pub fn with_biases(mut self, biases: Array1<f32>) -> Self {
        assert_eq!(biases.dim(), self.biases.dim());
        self.biases = biases;
        self
    }

    /// Split borrow used by optimizers: mutable parameters next to their gradients.
    pub(crate) fn parameters_and_gradients(
        &mut self,
    ) -> (&mut Array2<f32>, &mut Array1<f32>, &Array2<f32>, &Array1<f32>) {
        (&mut self.weights, &mut self.biases, &self.weight_grad, &self.bias_grad)
    }

    pub(crate) fn gradients_mut(&mut self) -> (&mut Array2<f32>, &mut Array1<f32>) {
        (&mut self.weight_grad, &mut self.bias_grad)
    }
}

impl LayerTrait for DenseLayer {
    fn forward_batch(&mut self, inputs: ArrayView2<f32>, track: bool) -> Array2<f32> {
        let mut outputs = inputs.dot(&self.weights) + &self.biases.view().insert_axis(Axis(0));
        if track {
            self.inputs = Some(inputs.to_owned());
            self.pre_activation_output = Some(outputs.clone());
        } else {
            self.clear_cache();
        }
        self.activation.apply_batch(&mut outputs);
        outputs
    }

    fn backward_batch(&mut self, output_errors: ArrayView2<f32>) -> Result<Array2<f32>> {
        let (inputs, pre_activation_output) = match (&self.inputs, &self.pre_activation_output) {
            (Some(inputs), Some(pre)) => (inputs, pre),
            _ => {
                return Err(DdpgError::TrainingError(
                    "no tracked forward pass; forward_batch(track = true) must precede backward_batch".to_string(),
                ))
            }
        };
        if output_errors.dim() != pre_activation_output.dim() {
            return Err(DdpgError::dimension_mismatch(
                format!("{:?}", pre_activation_output.dim()),
                format!("{:?}", output_errors.dim()),
            ));
        }

        let activation_deriv = self.activation.derivative_batch(pre_activation_output.view());
        let adjusted_error = &output_errors * &activation_deriv;
        self.weight_grad += &inputs.t().dot(&adjusted_error);
        self.bias_grad += &adjusted_error.sum_axis(Axis(0));

        Ok(adjusted_error.dot(&self.weights.t()))
    }

    fn zero_grad(&mut self) {
        self.weight_grad.fill(0.0);
        self.bias_grad.fill(0.0);
    }

    fn clear_cache(&mut self) {
        self.inputs = None;
        self.pre_activation_output = None;
    }

    fn weights(&self) -> &Array2<f32> {
        &self.weights
    }

    fn biases(&self) -> &Array1<f32> {
        &self.biases
    }

    fn weight_gradients(&self) -> &Array2<f32> {
        &self.weight_grad
    }

    fn bias_gradients(&self) -> &Array1<f32> {
        &self.bias_grad
    }

    fn output_size(&self) -> usize {
        self.weights.shape()[1]
    }

    fn input_size(&self) -> usize {
        self.weights.shape()[0]
    }
}
