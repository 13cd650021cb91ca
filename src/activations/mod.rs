//! # Activation Functions Module
//!
//! Element-wise non-linearities applied by [`crate::layers::DenseLayer`].
//!
//! ## Available Activations
//!
//! - **ReLU**: `max(0, x)`, the default for hidden layers
//! - **Tanh**: outputs in (-1, 1), used on the actor head so actions start inside the action bounds
//! - **Linear**: identity, used on the critic head
//! - **Sigmoid**: `1 / (1 + e^(-x))`
//! - **LeakyReLU**: ReLU with a small negative slope
//!
//! ```rust
//! use ddpg::activations::Activation;
//! use ndarray::array;
//!
//! let mut data = array![[1.0, -0.5, 0.0, 2.0]];
//! Activation::Relu.apply_batch(&mut data);
//! assert_eq!(data, array![[1.0, 0.0, 0.0, 2.0]]);
//! ```

pub mod functions;

pub use functions::Activation;
