//! # DDPG Agent
//!
//! [`DdpgAgent`] ties the learning core together:
//!
//! - **act**: actor forward pass in evaluation mode, plus Ornstein-Uhlenbeck
//!   noise, clipped to `[-1, 1]`
//! - **step**: stores the transition and runs [`DdpgAgent::learn`] every
//!   `update_every` calls once the buffer holds more than one batch
//! - **learn**: critic regression on `r + γ·Q'(s', μ'(s'))·(1 - done)`,
//!   actor ascent on `Q(s, μ(s))`, then soft updates of both targets
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use ddpg::agent::DdpgBuilder;
//! use ndarray::Array1;
//!
//! let mut agent = DdpgBuilder::new(33, 4).build().unwrap();
//! let mut state = Array1::<f32>::zeros(33);
//!
//! for _episode in 0..10 {
//!     agent.reset();
//!     for _t in 0..1000 {
//!         let action = agent.act(state.view(), true).unwrap();
//!         // let (next_state, reward, done) = env.step(&action);
//!         # let (next_state, reward, done) = (state.clone(), 0.0, false);
//!         agent.step(state.view(), action.view(), reward, next_state.view(), done).unwrap();
//!         state = next_state;
//!         if done {
//!             break;
//!         }
//!     }
//! }
//! ```

mod ddpg;

pub use ddpg::{bellman_targets, DdpgAgent, DdpgBuilder, ACTION_HIGH, ACTION_LOW};
