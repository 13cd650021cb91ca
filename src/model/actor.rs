use ndarray::{Array2, ArrayView2};
use rand::Rng;

use super::traits::{ActorModel, Parameterized};
use crate::activations::Activation;
use crate::error::Result;
use crate::layers::WeightInit;
use crate::network::NeuralNetwork;

/// Final-layer weights start in `[-3e-3, 3e-3]` so initial actions sit near zero.
pub(crate) const OUTPUT_INIT: WeightInit = WeightInit::Uniform { min: -3e-3, max: 3e-3 };

/// MLP policy with a tanh head, so raw actions already lie in (-1, 1).
#[derive(Clone, Debug)]
pub struct Actor {
    network: NeuralNetwork,
}

impl Actor {
    pub fn new<R: Rng + ?Sized>(
        state_size: usize,
        action_size: usize,
        hidden_sizes: &[usize],
        hidden_activation: Activation,
        rng: &mut R,
    ) -> Result<Self> {
        let mut sizes = vec![state_size];
        sizes.extend_from_slice(hidden_sizes);
        sizes.push(action_size);

        let activations = vec![hidden_activation; hidden_sizes.len()]
            .into_iter()
            .chain(std::iter::once(Activation::Tanh))
            .collect::<Vec<_>>();

        let network = NeuralNetwork::new(&sizes, &activations, WeightInit::FanIn, OUTPUT_INIT, rng)?;
        Ok(Actor { network })
    }

    /// Wrap an existing network; its output width is the action size.
    pub fn from_network(network: NeuralNetwork) -> Self {
        Actor { network }
    }
}

impl Parameterized for Actor {
    fn network(&self) -> &NeuralNetwork {
        &self.network
    }

    fn network_mut(&mut self) -> &mut NeuralNetwork {
        &mut self.network
    }
}

impl ActorModel for Actor {
    fn state_size(&self) -> usize {
        self.network.input_size()
    }

    fn action_size(&self) -> usize {
        self.network.output_size()
    }

    fn forward(&mut self, states: ArrayView2<f32>) -> Result<Array2<f32>> {
        self.network.forward_batch(states)
    }

    fn backward(&mut self, action_grad: ArrayView2<f32>) -> Result<Array2<f32>> {
        self.network.backward_batch(action_grad)
    }
}
