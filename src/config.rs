//! Construction parameters for [`crate::agent::DdpgAgent`].
//!
//! Every value is fixed when the agent is built. The config is plain data,
//! so it can be kept in a JSON file next to an experiment:
//!
//! ```rust
//! use ddpg::config::DdpgConfig;
//!
//! let config = DdpgConfig::from_json_str(r#"{ "state_size": 33, "action_size": 4, "batch_size": 128 }"#).unwrap();
//! assert_eq!(config.batch_size, 128);
//! assert_eq!(config.update_every, 4);
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::activations::Activation;
use crate::error::{DdpgError, Result};
use crate::noise::OuNoiseConfig;
use crate::optimizer::GradientClipper;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DdpgConfig {
    pub state_size: usize,
    pub action_size: usize,
    /// Hidden layer widths of the actor
    pub actor_hidden: Vec<usize>,
    /// Hidden layer widths of the critic
    pub critic_hidden: Vec<usize>,
    pub hidden_activation: Activation,
    /// Replay buffer capacity
    pub buffer_size: usize,
    /// Minibatch size
    pub batch_size: usize,
    /// Discount factor
    pub gamma: f32,
    /// Soft update coefficient for target networks
    pub tau: f32,
    pub actor_lr: f32,
    pub critic_lr: f32,
    /// Run a learning step every `update_every` calls to `step`
    pub update_every: usize,
    /// Clipping applied to accumulated critic gradients between backward and the optimizer step.
    /// `GradientClipper::None` gives the unclipped update of clip-before-backward implementations.
    pub critic_grad_clip: GradientClipper,
    pub noise: OuNoiseConfig,
    /// Master seed for network initialisation, noise and sampling
    pub seed: u64,
    /// Number of learning steps kept in the loss histories
    pub metrics_history: usize,
}

impl Default for DdpgConfig {
    fn default() -> Self {
        DdpgConfig {
            state_size: 1,
            action_size: 1,
            actor_hidden: vec![400, 300],
            critic_hidden: vec![400, 300],
            hidden_activation: Activation::Relu,
            buffer_size: 1_000_000,
            batch_size: 256,
            gamma: 0.99,
            tau: 1e-3,
            actor_lr: 1e-4,
            critic_lr: 1e-3,
            update_every: 4,
            critic_grad_clip: GradientClipper::ClipByGlobalNorm { max_norm: 1.0 },
            noise: OuNoiseConfig::default(),
            seed: 5,
            metrics_history: 1000,
        }
    }
}

impl DdpgConfig {
    pub fn new(state_size: usize, action_size: usize) -> Self {
        DdpgConfig {
            state_size,
            action_size,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.state_size == 0 {
            return Err(DdpgError::invalid_parameter("state_size", "must be positive"));
        }
        if self.action_size == 0 {
            return Err(DdpgError::invalid_parameter("action_size", "must be positive"));
        }
        if self.actor_hidden.iter().chain(self.critic_hidden.iter()).any(|&h| h == 0) {
            return Err(DdpgError::invalid_parameter("hidden sizes", "layer widths must be positive"));
        }
        if self.batch_size == 0 {
            return Err(DdpgError::invalid_parameter("batch_size", "must be positive"));
        }
        if self.batch_size > self.buffer_size {
            return Err(DdpgError::invalid_parameter(
                "batch_size".to_string(),
                format!("{} exceeds buffer_size {}", self.batch_size, self.buffer_size),
            ));
        }
        if !(0.0..=1.0).contains(&self.gamma) {
            return Err(DdpgError::invalid_parameter("gamma", "must lie in [0, 1]"));
        }
        if !(self.tau > 0.0 && self.tau <= 1.0) {
            return Err(DdpgError::invalid_parameter("tau", "must lie in (0, 1]"));
        }
        if !(self.actor_lr > 0.0 && self.actor_lr.is_finite()) {
            return Err(DdpgError::invalid_parameter("actor_lr", "must be positive"));
        }
        if !(self.critic_lr > 0.0 && self.critic_lr.is_finite()) {
            return Err(DdpgError::invalid_parameter("critic_lr", "must be positive"));
        }
        if self.update_every == 0 {
            return Err(DdpgError::invalid_parameter("update_every", "must be positive"));
        }
        match self.critic_grad_clip {
            GradientClipper::ClipByGlobalNorm { max_norm } if !(max_norm > 0.0) => {
                return Err(DdpgError::invalid_parameter("critic_grad_clip", "max_norm must be positive"));
            }
            GradientClipper::ClipByValue { min, max } if !(min < max) => {
                return Err(DdpgError::invalid_parameter("critic_grad_clip", "min must be below max"));
            }
            _ => {}
        }
        self.noise.validate()
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: DdpgConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
