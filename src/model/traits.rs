use ndarray::{Array2, ArrayView2};

use crate::error::Result;
use crate::network::{Mode, NeuralNetwork};

/// Access to the trainable parameters behind a model.
pub trait Parameterized {
    fn network(&self) -> &NeuralNetwork;

    fn network_mut(&mut self) -> &mut NeuralNetwork;

    fn mode(&self) -> Mode {
        self.network().mode()
    }

    fn set_mode(&mut self, mode: Mode) {
        self.network_mut().set_mode(mode);
    }

    fn zero_grad(&mut self) {
        self.network_mut().zero_grad();
    }

    /// Soft update: θ′ ← τθ + (1 − τ)θ′
    fn soft_update(&mut self, source: &Self, tau: f32) -> Result<()>
    where
        Self: Sized,
    {
        self.network_mut().soft_update(source.network(), tau)
    }

    /// A non-trainable copy, used as a target network.
    fn detached(&self) -> Self
    where
        Self: Sized + Clone,
    {
        let mut copy = self.clone();
        copy.network_mut().detach();
        copy
    }
}

/// Deterministic policy: states -> actions.
pub trait ActorModel: Parameterized + Clone {
    fn state_size(&self) -> usize;

    fn action_size(&self) -> usize;

    /// `[B, state_size]` -> `[B, action_size]`
    fn forward(&mut self, states: ArrayView2<f32>) -> Result<Array2<f32>>;

    /// Accumulate parameter gradients for dLoss/dAction; returns dLoss/dState.
    fn backward(&mut self, action_grad: ArrayView2<f32>) -> Result<Array2<f32>>;
}

/// Action-value function: (states, actions) -> Q.
pub trait CriticModel: Parameterized + Clone {
    fn state_size(&self) -> usize;

    fn action_size(&self) -> usize;

    /// `[B, state_size]`, `[B, action_size]` -> `[B, 1]`
    fn forward(&mut self, states: ArrayView2<f32>, actions: ArrayView2<f32>) -> Result<Array2<f32>>;

    /// Accumulate parameter gradients for dLoss/dQ; returns (dLoss/dState, dLoss/dAction).
    fn backward(&mut self, value_grad: ArrayView2<f32>) -> Result<(Array2<f32>, Array2<f32>)>;
}
