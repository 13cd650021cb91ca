use ndarray::{concatenate, s, Array2, ArrayView2, Axis};
use rand::Rng;

use super::actor::OUTPUT_INIT;
use super::traits::{CriticModel, Parameterized};
use crate::activations::Activation;
use crate::error::{DdpgError, Result};
use crate::layers::WeightInit;
use crate::network::NeuralNetwork;

/// MLP Q-function over the concatenated `[state, action]` input.
#[derive(Clone, Debug)]
pub struct Critic {
    network: NeuralNetwork,
    state_size: usize,
    action_size: usize,
}

impl Critic {
    pub fn new<R: Rng + ?Sized>(
        state_size: usize,
        action_size: usize,
        hidden_sizes: &[usize],
        hidden_activation: Activation,
        rng: &mut R,
    ) -> Result<Self> {
        let mut sizes = vec![state_size + action_size];
        sizes.extend_from_slice(hidden_sizes);
        sizes.push(1);

        let activations = vec![hidden_activation; hidden_sizes.len()]
            .into_iter()
            .chain(std::iter::once(Activation::Linear))
            .collect::<Vec<_>>();

        let network = NeuralNetwork::new(&sizes, &activations, WeightInit::FanIn, OUTPUT_INIT, rng)?;
        Ok(Critic {
            network,
            state_size,
            action_size,
        })
    }

    /// Wrap an existing network taking `state_size + action_size` inputs and producing one value.
    pub fn from_network(network: NeuralNetwork, state_size: usize) -> Result<Self> {
        let input = network.input_size();
        if state_size > input || network.output_size() != 1 {
            return Err(DdpgError::dimension_mismatch(
                format!("input >= {} and 1 output", state_size),
                format!("input {} and {} outputs", input, network.output_size()),
            ));
        }
        Ok(Critic {
            action_size: input - state_size,
            network,
            state_size,
        })
    }
}

impl Parameterized for Critic {
    fn network(&self) -> &NeuralNetwork {
        &self.network
    }

    fn network_mut(&mut self) -> &mut NeuralNetwork {
        &mut self.network
    }
}

impl CriticModel for Critic {
    fn state_size(&self) -> usize {
        self.state_size
    }

    fn action_size(&self) -> usize {
        self.action_size
    }

    fn forward(&mut self, states: ArrayView2<f32>, actions: ArrayView2<f32>) -> Result<Array2<f32>> {
        if states.nrows() != actions.nrows()
            || states.ncols() != self.state_size
            || actions.ncols() != self.action_size
        {
            return Err(DdpgError::dimension_mismatch(
                format!("[B, {}] states and [B, {}] actions", self.state_size, self.action_size),
                format!("{:?} states and {:?} actions", states.dim(), actions.dim()),
            ));
        }
        let inputs = concatenate(Axis(1), &[states.view(), actions.view()])
            .map_err(|e| DdpgError::dimension_mismatch("concatenable batches".to_string(), e.to_string()))?;
        self.network.forward_batch(inputs.view())
    }

    fn backward(&mut self, value_grad: ArrayView2<f32>) -> Result<(Array2<f32>, Array2<f32>)> {
        let input_grad = self.network.backward_batch(value_grad)?;
        let state_grad = input_grad.slice(s![.., ..self.state_size]).to_owned();
        let action_grad = input_grad.slice(s![.., self.state_size..]).to_owned();
        Ok((state_grad, action_grad))
    }
}
