use serde::{Deserialize, Serialize};

use crate::network::NeuralNetwork;

/// Gradient clipping applied to the accumulated gradients of a network
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum GradientClipper {
    /// Clip every gradient element into `[min, max]`
    ClipByValue { min: f32, max: f32 },

    /// Rescale all gradients so their joint L2 norm is at most `max_norm`
    ClipByGlobalNorm { max_norm: f32 },

    /// No clipping
    None,
}

impl Default for GradientClipper {
    fn default() -> Self {
        GradientClipper::ClipByGlobalNorm { max_norm: 1.0 }
    }
}

impl GradientClipper {
    /// Clip the gradients accumulated in `network` in place.
    ///
    /// Returns the global gradient norm measured before clipping.
    pub fn clip(&self, network: &mut NeuralNetwork) -> f32 {
        let global_norm = network.gradient_norm();

        match self {
            GradientClipper::ClipByValue { min, max } => {
                let (min, max) = (*min, *max);
                for layer in &mut network.layers {
                    let (weight_grad, bias_grad) = layer.gradients_mut();
                    weight_grad.mapv_inplace(|g| g.max(min).min(max));
                    bias_grad.mapv_inplace(|g| g.max(min).min(max));
                }
            }

            GradientClipper::ClipByGlobalNorm { max_norm } => {
                if global_norm > *max_norm {
                    let scale = max_norm / (global_norm + 1e-6);
                    for layer in &mut network.layers {
                        let (weight_grad, bias_grad) = layer.gradients_mut();
                        weight_grad.mapv_inplace(|g| g * scale);
                        bias_grad.mapv_inplace(|g| g * scale);
                    }
                }
            }

            GradientClipper::None => {}
        }

        global_norm
    }
}
