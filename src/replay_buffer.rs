use ndarray::{Array1, Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::VecDeque;

use crate::error::{DdpgError, Result};

/// One environment step, owned by the buffer once added.
#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
    pub state: Array1<f32>,
    pub action: Array1<f32>,
    pub reward: f32,
    pub next_state: Array1<f32>,
    pub done: bool,
}

/// Row-aligned minibatch: `[B, state_size]`, `[B, action_size]`, `[B, 1]`,
/// `[B, state_size]`, `[B, 1]` with dones as 0.0 / 1.0.
#[derive(Clone, Debug, PartialEq)]
pub struct Batch {
    pub states: Array2<f32>,
    pub actions: Array2<f32>,
    pub rewards: Array2<f32>,
    pub next_states: Array2<f32>,
    pub dones: Array2<f32>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.states.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.states.nrows() == 0
    }

    /// Stack transitions into a batch, checking that every row has the same widths.
    pub fn from_transitions<'a, I>(transitions: I) -> Result<Batch>
    where
        I: IntoIterator<Item = &'a Transition>,
        I::IntoIter: ExactSizeIterator,
    {
        let mut iter = transitions.into_iter().peekable();
        let rows = iter.len();
        let (state_dim, action_dim) = match iter.peek() {
            Some(first) => (first.state.len(), first.action.len()),
            None => return Err(DdpgError::InsufficientSamples { required: 1, available: 0 }),
        };

        let mut batch = Batch {
            states: Array2::zeros((rows, state_dim)),
            actions: Array2::zeros((rows, action_dim)),
            rewards: Array2::zeros((rows, 1)),
            next_states: Array2::zeros((rows, state_dim)),
            dones: Array2::zeros((rows, 1)),
        };

        for (row, transition) in iter.enumerate() {
            check_width("state", transition.state.view(), state_dim)?;
            check_width("next_state", transition.next_state.view(), state_dim)?;
            check_width("action", transition.action.view(), action_dim)?;

            batch.states.row_mut(row).assign(&transition.state);
            batch.actions.row_mut(row).assign(&transition.action);
            batch.next_states.row_mut(row).assign(&transition.next_state);
            batch.rewards[[row, 0]] = transition.reward;
            batch.dones[[row, 0]] = if transition.done { 1.0 } else { 0.0 };
        }

        Ok(batch)
    }
}

fn check_width(name: &str, values: ArrayView1<f32>, expected: usize) -> Result<()> {
    if values.len() != expected {
        return Err(DdpgError::dimension_mismatch(
            format!("{} of length {}", name, expected),
            format!("{} of length {}", name, values.len()),
        ));
    }
    Ok(())
}

/// Fixed-capacity FIFO store of transitions with uniform sampling.
#[derive(Clone, Debug)]
pub struct ReplayBuffer {
    buffer: VecDeque<Transition>,
    capacity: usize,
    batch_size: usize,
    rng: StdRng,
}

impl ReplayBuffer {
    pub fn new(capacity: usize, batch_size: usize, seed: u64) -> Self {
        ReplayBuffer {
            // capacity may be in the millions; grow on demand
            buffer: VecDeque::new(),
            capacity,
            batch_size,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Append a transition, evicting the oldest one when full.
    pub fn add(
        &mut self,
        state: Array1<f32>,
        action: Array1<f32>,
        reward: f32,
        next_state: Array1<f32>,
        done: bool,
    ) {
        self.push(Transition {
            state,
            action,
            reward,
            next_state,
            done,
        });
    }

    pub fn push(&mut self, transition: Transition) {
        if self.capacity == 0 {
            return;
        }
        if self.buffer.len() == self.capacity {
            self.buffer.pop_front();
            tracing::trace!(capacity = self.capacity, "replay buffer full, evicted oldest transition");
        }
        self.buffer.push_back(transition);
    }

    /// Draw `batch_size` distinct transitions uniformly at random.
    ///
    /// Fails with [`DdpgError::InsufficientSamples`] while fewer than
    /// `batch_size` transitions are stored.
    pub fn sample(&mut self) -> Result<Batch> {
        if self.buffer.len() < self.batch_size {
            return Err(DdpgError::InsufficientSamples {
                required: self.batch_size,
                available: self.buffer.len(),
            });
        }
        let indices = rand::seq::index::sample(&mut self.rng, self.buffer.len(), self.batch_size);
        let buffer = &self.buffer;
        let picked: Vec<&Transition> = indices.iter().map(|i| &buffer[i]).collect();
        Batch::from_transitions(picked)
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Stored transitions, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Transition> {
        self.buffer.iter()
    }
}
