use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis, Zip};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::DdpgConfig;
use crate::error::{DdpgError, Result};
use crate::loss::{Loss, Mse};
use crate::metrics::{LearnStats, MetricsTracker};
use crate::model::{Actor, ActorModel, Critic, CriticModel};
use crate::network::Mode;
use crate::noise::{OuNoise, OuNoiseConfig};
use crate::optimizer::{Adam, GradientClipper, Optimizer, OptimizerWrapper};
use crate::replay_buffer::{Batch, ReplayBuffer};

/// Lower bound of every action component
pub const ACTION_LOW: f32 = -1.0;
/// Upper bound of every action component
pub const ACTION_HIGH: f32 = 1.0;

/// Deep Deterministic Policy Gradient agent
///
/// Owns a live actor and critic, their detached target copies, one Adam
/// optimizer per live network, the replay buffer and the exploration noise.
/// The step counter decides when `step` triggers a learning update.
///
/// # Example
///
/// ```rust
/// use ddpg::agent::DdpgBuilder;
/// use ndarray::array;
///
/// let mut agent = DdpgBuilder::new(3, 1)
///     .hidden_sizes(vec![32, 32], vec![32, 32])
///     .buffer_size(10_000)
///     .batch_size(16)
///     .build()
///     .unwrap();
///
/// let state = array![0.1, -0.2, 0.3];
/// let action = agent.act(state.view(), true).unwrap();
/// assert!(action.iter().all(|a| (-1.0..=1.0).contains(a)));
///
/// let next_state = array![0.15, -0.1, 0.25];
/// agent.step(state.view(), action.view(), 0.5, next_state.view(), false).unwrap();
/// ```
#[derive(Clone, Debug)]
pub struct DdpgAgent<A: ActorModel = Actor, C: CriticModel = Critic> {
    config: DdpgConfig,
    actor: A,
    actor_target: A,
    critic: C,
    critic_target: C,
    actor_optimizer: OptimizerWrapper,
    critic_optimizer: OptimizerWrapper,
    memory: ReplayBuffer,
    noise: OuNoise,
    t_step: usize,
    metrics: MetricsTracker,
}

impl DdpgAgent<Actor, Critic> {
    /// Build an agent with MLP actor and critic initialised from `config.seed`.
    pub fn new(config: DdpgConfig) -> Result<Self> {
        config.validate()?;
        let mut rng = StdRng::seed_from_u64(config.seed);
        let actor = Actor::new(
            config.state_size,
            config.action_size,
            &config.actor_hidden,
            config.hidden_activation,
            &mut rng,
        )?;
        let critic = Critic::new(
            config.state_size,
            config.action_size,
            &config.critic_hidden,
            config.hidden_activation,
            &mut rng,
        )?;
        Self::from_parts(config, actor, critic, &mut rng)
    }
}

impl<A: ActorModel, C: CriticModel> DdpgAgent<A, C> {
    /// Build an agent around caller-supplied live networks.
    ///
    /// Target networks are detached copies of `actor` and `critic`.
    pub fn with_models(config: DdpgConfig, actor: A, critic: C) -> Result<Self> {
        config.validate()?;
        let mut rng = StdRng::seed_from_u64(config.seed);
        Self::from_parts(config, actor, critic, &mut rng)
    }

    /// Replace the default Adam optimizers.
    ///
    /// A layer layout mismatch surfaces as an error on the first learning step.
    pub fn with_optimizers(mut self, actor_optimizer: OptimizerWrapper, critic_optimizer: OptimizerWrapper) -> Self {
        self.actor_optimizer = actor_optimizer;
        self.critic_optimizer = critic_optimizer;
        self
    }

    fn from_parts(config: DdpgConfig, actor: A, critic: C, rng: &mut StdRng) -> Result<Self> {
        let sizes_match = actor.state_size() == config.state_size
            && actor.action_size() == config.action_size
            && critic.state_size() == config.state_size
            && critic.action_size() == config.action_size;
        if !sizes_match {
            return Err(DdpgError::dimension_mismatch(
                format!("state {} / action {}", config.state_size, config.action_size),
                format!(
                    "actor {}/{}, critic {}/{}",
                    actor.state_size(),
                    actor.action_size(),
                    critic.state_size(),
                    critic.action_size()
                ),
            ));
        }

        let mut actor_target = actor.detached();
        let mut critic_target = critic.detached();
        // hard update
        actor_target.soft_update(&actor, 1.0)?;
        critic_target.soft_update(&critic, 1.0)?;

        let actor_optimizer = OptimizerWrapper::Adam(Adam::default(&actor.network().layers));
        let critic_optimizer = OptimizerWrapper::Adam(Adam::default(&critic.network().layers));

        let noise = OuNoise::new(config.action_size, config.noise, rng.gen());
        let memory = ReplayBuffer::new(config.buffer_size, config.batch_size, rng.gen());
        let metrics = MetricsTracker::new(config.metrics_history);

        tracing::info!(
            state_size = config.state_size,
            action_size = config.action_size,
            actor_parameters = actor.network().parameter_count(),
            critic_parameters = critic.network().parameter_count(),
            "DDPG agent initialised"
        );

        Ok(DdpgAgent {
            config,
            actor,
            actor_target,
            critic,
            critic_target,
            actor_optimizer,
            critic_optimizer,
            memory,
            noise,
            t_step: 0,
            metrics,
        })
    }

    /// Select an action for one state, clipped to `[ACTION_LOW, ACTION_HIGH]`.
    pub fn act(&mut self, state: ArrayView1<f32>, add_noise: bool) -> Result<Array1<f32>> {
        let actions = self.act_batch(state.insert_axis(Axis(0)), add_noise)?;
        Ok(actions.index_axis_move(Axis(0), 0))
    }

    /// Select actions for a `[N, state_size]` batch of states.
    ///
    /// A single noise sample is drawn per call and added to every row.
    pub fn act_batch(&mut self, states: ArrayView2<f32>, add_noise: bool) -> Result<Array2<f32>> {
        if states.ncols() != self.config.state_size {
            return Err(DdpgError::dimension_mismatch(
                format!("[N, {}]", self.config.state_size),
                format!("{:?}", states.dim()),
            ));
        }

        self.actor.set_mode(Mode::Eval);
        let output = self.actor.forward(states);
        self.actor.set_mode(Mode::Train);
        let mut actions = output?;

        if add_noise {
            let noise = self.noise.sample();
            actions += &noise.insert_axis(Axis(0));
        }

        actions.mapv_inplace(|a| a.clamp(ACTION_LOW, ACTION_HIGH));
        Ok(actions)
    }

    /// Store a transition and, every `update_every` calls once the buffer
    /// holds more than `batch_size` transitions, run one learning step.
    pub fn step(
        &mut self,
        state: ArrayView1<f32>,
        action: ArrayView1<f32>,
        reward: f32,
        next_state: ArrayView1<f32>,
        done: bool,
    ) -> Result<Option<LearnStats>> {
        let (state_size, action_size) = (self.config.state_size, self.config.action_size);
        check_len("state", state.len(), state_size)?;
        check_len("action", action.len(), action_size)?;
        check_len("next_state", next_state.len(), state_size)?;

        self.memory
            .add(state.to_owned(), action.to_owned(), reward, next_state.to_owned(), done);
        self.t_step += 1;

        if self.t_step % self.config.update_every == 0 && self.memory.len() > self.config.batch_size {
            let batch = self.memory.sample()?;
            let stats = self.learn(&batch, self.config.gamma)?;
            return Ok(Some(stats));
        }
        Ok(None)
    }

    /// One DDPG update: critic first, then actor, then both target networks.
    pub fn learn(&mut self, batch: &Batch, gamma: f32) -> Result<LearnStats> {
        self.check_batch(batch)?;

        // Bellman targets from the target networks; nothing here is tracked
        let next_actions = self.actor_target.forward(batch.next_states.view())?;
        let q_next = self.critic_target.forward(batch.next_states.view(), next_actions.view())?;
        if q_next.dim() != batch.rewards.dim() {
            return Err(DdpgError::dimension_mismatch(
                format!("critic output {:?}", batch.rewards.dim()),
                format!("critic output {:?}", q_next.dim()),
            ));
        }
        let q_targets = bellman_targets(batch.rewards.view(), q_next.view(), batch.dones.view(), gamma);

        let q_expected = self.critic.forward(batch.states.view(), batch.actions.view())?;
        let critic_loss = Mse.compute_batch(q_expected.view(), q_targets.view());
        ensure_finite("critic", critic_loss)?;

        self.critic.zero_grad();
        let value_grad = Mse.gradient_batch(q_expected.view(), q_targets.view());
        self.critic.backward(value_grad.view())?;
        let critic_grad_norm = self.config.critic_grad_clip.clip(self.critic.network_mut());
        self.critic_optimizer.step(self.critic.network_mut(), self.config.critic_lr)?;

        // actor loss under the freshly updated critic
        let predicted_actions = self.actor.forward(batch.states.view())?;
        let q_values = self.critic.forward(batch.states.view(), predicted_actions.view())?;
        let actor_loss = -q_values.mean().unwrap_or(0.0);
        ensure_finite("actor", actor_loss)?;

        self.actor.zero_grad();
        let loss_grad = Array2::from_elem(q_values.dim(), -1.0 / q_values.len() as f32);
        let (_, action_grad) = self.critic.backward(loss_grad.view())?;
        // the critic is not optimised on the actor loss
        self.critic.zero_grad();
        self.actor.backward(action_grad.view())?;
        self.actor_optimizer.step(self.actor.network_mut(), self.config.actor_lr)?;

        let tau = self.config.tau;
        self.actor_target.soft_update(&self.actor, tau)?;
        self.critic_target.soft_update(&self.critic, tau)?;

        let stats = LearnStats {
            actor_loss,
            critic_loss,
            critic_grad_norm,
        };
        self.metrics.record(stats);
        tracing::debug!(
            update = self.metrics.update_count(),
            actor_loss,
            critic_loss,
            critic_grad_norm,
            "learning step"
        );
        Ok(stats)
    }

    /// Reset the exploration noise to its mean.
    pub fn reset(&mut self) {
        self.noise.reset();
    }

    fn check_batch(&self, batch: &Batch) -> Result<()> {
        let rows = batch.states.nrows();
        let expected = [
            ("states", self.config.state_size),
            ("actions", self.config.action_size),
            ("rewards", 1),
            ("next_states", self.config.state_size),
            ("dones", 1),
        ];
        let actual = [
            batch.states.dim(),
            batch.actions.dim(),
            batch.rewards.dim(),
            batch.next_states.dim(),
            batch.dones.dim(),
        ];
        if rows == 0 {
            return Err(DdpgError::InsufficientSamples { required: 1, available: 0 });
        }
        for ((name, cols), dim) in expected.iter().zip(actual.iter()) {
            if *dim != (rows, *cols) {
                return Err(DdpgError::dimension_mismatch(
                    format!("{} of shape ({}, {})", name, rows, cols),
                    format!("{} of shape {:?}", name, dim),
                ));
            }
        }
        Ok(())
    }

    pub fn config(&self) -> &DdpgConfig {
        &self.config
    }

    pub fn actor(&self) -> &A {
        &self.actor
    }

    pub fn actor_target(&self) -> &A {
        &self.actor_target
    }

    pub fn critic(&self) -> &C {
        &self.critic
    }

    pub fn critic_target(&self) -> &C {
        &self.critic_target
    }

    pub fn memory(&self) -> &ReplayBuffer {
        &self.memory
    }

    pub fn noise(&self) -> &OuNoise {
        &self.noise
    }

    pub fn metrics(&self) -> &MetricsTracker {
        &self.metrics
    }

    /// Actor loss of the most recent learning step
    pub fn actor_loss(&self) -> Option<f32> {
        self.metrics.last().map(|s| s.actor_loss)
    }

    /// Critic loss of the most recent learning step
    pub fn critic_loss(&self) -> Option<f32> {
        self.metrics.last().map(|s| s.critic_loss)
    }

    /// Number of calls to `step` so far
    pub fn total_steps(&self) -> usize {
        self.t_step
    }

    /// Number of completed learning steps
    pub fn learn_steps(&self) -> usize {
        self.metrics.update_count()
    }
}

/// `rewards + gamma * q_next * (1 - dones)`, row by row.
pub fn bellman_targets(
    rewards: ArrayView2<f32>,
    q_next: ArrayView2<f32>,
    dones: ArrayView2<f32>,
    gamma: f32,
) -> Array2<f32> {
    Zip::from(rewards)
        .and(q_next)
        .and(dones)
        .map_collect(|&r, &q, &d| r + gamma * q * (1.0 - d))
}

fn check_len(name: &str, actual: usize, expected: usize) -> Result<()> {
    if actual != expected {
        return Err(DdpgError::dimension_mismatch(
            format!("{} of length {}", name, expected),
            format!("{} of length {}", name, actual),
        ));
    }
    Ok(())
}

fn ensure_finite(name: &str, loss: f32) -> Result<()> {
    if !loss.is_finite() {
        tracing::warn!(network = name, loss, "non-finite loss, skipping update");
        return Err(DdpgError::NumericalError(format!("{} loss is {}", name, loss)));
    }
    Ok(())
}

/// Builder for DdpgAgent
pub struct DdpgBuilder {
    config: DdpgConfig,
}

impl DdpgBuilder {
    pub fn new(state_size: usize, action_size: usize) -> Self {
        DdpgBuilder {
            config: DdpgConfig::new(state_size, action_size),
        }
    }

    pub fn from_config(config: DdpgConfig) -> Self {
        DdpgBuilder { config }
    }

    pub fn hidden_sizes(mut self, actor: Vec<usize>, critic: Vec<usize>) -> Self {
        self.config.actor_hidden = actor;
        self.config.critic_hidden = critic;
        self
    }

    pub fn buffer_size(mut self, size: usize) -> Self {
        self.config.buffer_size = size;
        self
    }

    pub fn batch_size(mut self, size: usize) -> Self {
        self.config.batch_size = size;
        self
    }

    pub fn gamma(mut self, gamma: f32) -> Self {
        self.config.gamma = gamma;
        self
    }

    pub fn tau(mut self, tau: f32) -> Self {
        self.config.tau = tau;
        self
    }

    pub fn learning_rates(mut self, actor_lr: f32, critic_lr: f32) -> Self {
        self.config.actor_lr = actor_lr;
        self.config.critic_lr = critic_lr;
        self
    }

    pub fn update_every(mut self, steps: usize) -> Self {
        self.config.update_every = steps;
        self
    }

    pub fn noise_params(mut self, mu: f32, theta: f32, sigma: f32) -> Self {
        self.config.noise = OuNoiseConfig { mu, theta, sigma };
        self
    }

    pub fn critic_grad_clip(mut self, clipper: GradientClipper) -> Self {
        self.config.critic_grad_clip = clipper;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    pub fn config(&self) -> &DdpgConfig {
        &self.config
    }

    pub fn build(self) -> Result<DdpgAgent> {
        DdpgAgent::new(self.config)
    }
}
