//! # Function Approximators
//!
//! The agent only talks to its networks through [`ActorModel`] and
//! [`CriticModel`]. [`Actor`] and [`Critic`] are the MLP implementations used
//! by default; any other model exposing the same capabilities (forward pass,
//! backward pass, parameters, train/eval mode) can be plugged into
//! [`crate::agent::DdpgAgent::with_models`].

pub mod actor;
pub mod critic;
pub mod traits;

pub use actor::Actor;
pub use critic::Critic;
pub use traits::{ActorModel, CriticModel, Parameterized};
