use ndarray::{Array1, Array2};
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use rand::Rng;

/// Weight initialization strategies
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WeightInit {
    /// Uniform in `[-1/sqrt(fan_in), 1/sqrt(fan_in)]`, used for DDPG hidden layers
    FanIn,

    /// Xavier/Glorot uniform initialization
    XavierUniform,

    /// Uniform distribution with custom range
    Uniform { min: f32, max: f32 },

    /// All zeros
    Zeros,
}

impl WeightInit {
    /// Initialize a `(fan_in, fan_out)` weight matrix from the given generator.
    pub fn initialize_weights<R: Rng + ?Sized>(&self, shape: (usize, usize), rng: &mut R) -> Array2<f32> {
        let (fan_in, fan_out) = shape;

        match self {
            WeightInit::FanIn => {
                let limit = 1.0 / (fan_in.max(1) as f32).sqrt();
                Array2::random_using(shape, Uniform::new_inclusive(-limit, limit), rng)
            }

            WeightInit::XavierUniform => {
                let limit = (6.0 / (fan_in + fan_out).max(1) as f32).sqrt();
                Array2::random_using(shape, Uniform::new_inclusive(-limit, limit), rng)
            }

            WeightInit::Uniform { min, max } => {
                if min >= max {
                    // degenerate range
                    return Array2::from_elem(shape, *min);
                }
                Array2::random_using(shape, Uniform::new(*min, *max), rng)
            }

            WeightInit::Zeros => Array2::zeros(shape),
        }
    }

    /// Initialize a bias vector of length `size`.
    pub fn initialize_biases<R: Rng + ?Sized>(&self, size: usize, fan_in: usize, rng: &mut R) -> Array1<f32> {
        match self {
            WeightInit::FanIn => {
                let limit = 1.0 / (fan_in.max(1) as f32).sqrt();
                Array1::random_using(size, Uniform::new_inclusive(-limit, limit), rng)
            }

            WeightInit::Uniform { min, max } if min < max => {
                Array1::random_using(size, Uniform::new(*min, *max), rng)
            }

            WeightInit::Uniform { min, .. } => Array1::from_elem(size, *min),

            WeightInit::XavierUniform | WeightInit::Zeros => Array1::zeros(size),
        }
    }
}
