//! # DDPG - Deep Deterministic Policy Gradient on ndarray
//!
//! An actor-critic agent that learns a continuous-action control policy from
//! environment interaction. The learning core is a replay buffer, an
//! Ornstein-Uhlenbeck exploration process and the DDPG update rule with
//! soft-updated target networks.
//!
//! ## Key Features
//!
//! - **Agent**: `act` / `step` / `learn` with a configurable update cadence
//! - **Replay Buffer**: fixed-capacity FIFO store with uniform sampling without replacement
//! - **Exploration**: temporally correlated Ornstein-Uhlenbeck noise
//! - **Networks**: small reverse-mode MLP stack with Adam and gradient clipping
//! - **Reproducibility**: every stochastic component owns a seeded generator
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ddpg::agent::DdpgBuilder;
//! use ndarray::array;
//!
//! let mut agent = DdpgBuilder::new(3, 1)
//!     .hidden_sizes(vec![64, 64], vec![64, 64])
//!     .seed(7)
//!     .build()
//!     .unwrap();
//!
//! let state = array![0.0, 1.0, 0.0];
//! let action = agent.act(state.view(), true).unwrap();
//! ```
//!
//! ## Module Organization
//!
//! - [`activations`] - Activation functions
//! - [`agent`] - The DDPG agent and its builder
//! - [`config`] - Construction parameters and JSON loading
//! - [`error`] - Error types and result handling
//! - [`layers`] - Dense layers and weight initialisation
//! - [`loss`] - Loss functions
//! - [`metrics`] - Learning-step metrics
//! - [`model`] - Actor and critic models and their traits
//! - [`network`] - Feed-forward network and the soft-update rule
//! - [`noise`] - Ornstein-Uhlenbeck process
//! - [`optimizer`] - SGD, Adam and gradient clipping
//! - [`replay_buffer`] - Experience replay

pub mod activations;
pub mod agent;
pub mod config;
pub mod error;
pub mod layers;
pub mod loss;
pub mod metrics;
pub mod model;
pub mod network;
pub mod noise;
pub mod optimizer;
pub mod replay_buffer;

pub use agent::{DdpgAgent, DdpgBuilder};
pub use config::DdpgConfig;
pub use error::{DdpgError, Result};

#[cfg(test)]
mod tests;
