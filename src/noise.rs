//! Ornstein-Uhlenbeck exploration noise.
//!
//! Each call to [`OuNoise::sample`] applies
//! `dx = θ(μ - x) + σ·u` with `u` drawn uniformly from `[0, 1)` per dimension,
//! so consecutive samples are correlated and drift back toward `μ`.

use ndarray::Array1;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::Uniform;
use serde::{Deserialize, Serialize};

use crate::error::{DdpgError, Result};

/// Parameters of the Ornstein-Uhlenbeck process
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OuNoiseConfig {
    /// Long-run mean, broadcast to every action dimension
    pub mu: f32,
    /// Mean-reversion rate
    pub theta: f32,
    /// Volatility
    pub sigma: f32,
}

impl Default for OuNoiseConfig {
    fn default() -> Self {
        OuNoiseConfig {
            mu: 0.01,
            theta: 0.15,
            sigma: 0.1,
        }
    }
}

impl OuNoiseConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.mu.is_finite() {
            return Err(DdpgError::invalid_parameter("noise.mu", "must be finite"));
        }
        if !(self.theta >= 0.0 && self.theta.is_finite()) {
            return Err(DdpgError::invalid_parameter("noise.theta", "must be finite and non-negative"));
        }
        if !(self.sigma >= 0.0 && self.sigma.is_finite()) {
            return Err(DdpgError::invalid_parameter("noise.sigma", "must be finite and non-negative"));
        }
        Ok(())
    }
}

/// Temporally correlated noise process owning its own generator.
#[derive(Clone, Debug)]
pub struct OuNoise {
    mu: Array1<f32>,
    theta: f32,
    sigma: f32,
    state: Array1<f32>,
    rng: StdRng,
    unit: Uniform<f32>,
}

impl OuNoise {
    pub fn new(size: usize, config: OuNoiseConfig, seed: u64) -> Self {
        let mu = Array1::from_elem(size, config.mu);
        OuNoise {
            state: mu.clone(),
            mu,
            theta: config.theta,
            sigma: config.sigma,
            rng: StdRng::seed_from_u64(seed),
            unit: Uniform::new(0.0, 1.0),
        }
    }

    /// Reset the internal state to the mean.
    pub fn reset(&mut self) {
        self.state.assign(&self.mu);
        tracing::trace!("noise process reset to mean");
    }

    /// Advance the process one step and return the new state.
    pub fn sample(&mut self) -> Array1<f32> {
        let (theta, sigma) = (self.theta, self.sigma);
        let rng = &mut self.rng;
        let unit = self.unit;
        ndarray::Zip::from(&mut self.state)
            .and(&self.mu)
            .for_each(|x, &mu| {
                let dx = theta * (mu - *x) + sigma * rng.sample(unit);
                *x += dx;
            });
        self.state.clone()
    }

    pub fn state(&self) -> &Array1<f32> {
        &self.state
    }

    pub fn mu(&self) -> &Array1<f32> {
        &self.mu
    }

    pub fn len(&self) -> usize {
        self.state.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }
}
