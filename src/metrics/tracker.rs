use std::collections::VecDeque;
use serde::{Serialize, Deserialize};

/// Scalars produced by one learning step
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LearnStats {
    /// `-mean(Q(s, actor(s)))`
    pub actor_loss: f32,
    /// MSE between `Q(s, a)` and the Bellman target
    pub critic_loss: f32,
    /// Critic gradient norm before clipping
    pub critic_grad_norm: f32,
}

/// Stores learning-step metrics over time
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrainingMetrics {
    pub actor_losses: VecDeque<f32>,
    pub critic_losses: VecDeque<f32>,
    pub critic_grad_norms: VecDeque<f32>,
}

impl TrainingMetrics {
    pub fn new(history_size: usize) -> Self {
        // bounded by history_size, which is small compared to the replay buffer
        TrainingMetrics {
            actor_losses: VecDeque::with_capacity(history_size),
            critic_losses: VecDeque::with_capacity(history_size),
            critic_grad_norms: VecDeque::with_capacity(history_size),
        }
    }
}

/// Tracks metrics across learning steps
#[derive(Debug, Clone)]
pub struct MetricsTracker {
    metrics: TrainingMetrics,
    history_size: usize,
    update_count: usize,
    last: Option<LearnStats>,
}

fn push_bounded(values: &mut VecDeque<f32>, value: f32, history_size: usize) {
    if history_size == 0 {
        return;
    }
    if values.len() >= history_size {
        values.pop_front();
    }
    values.push_back(value);
}

fn mean(values: &VecDeque<f32>) -> Option<f32> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f32>() / values.len() as f32)
}

impl MetricsTracker {
    pub fn new(history_size: usize) -> Self {
        MetricsTracker {
            metrics: TrainingMetrics::new(history_size),
            history_size,
            update_count: 0,
            last: None,
        }
    }

    /// Record the outcome of one learning step
    pub fn record(&mut self, stats: LearnStats) {
        push_bounded(&mut self.metrics.actor_losses, stats.actor_loss, self.history_size);
        push_bounded(&mut self.metrics.critic_losses, stats.critic_loss, self.history_size);
        push_bounded(&mut self.metrics.critic_grad_norms, stats.critic_grad_norm, self.history_size);
        self.update_count += 1;
        self.last = Some(stats);
    }

    pub fn metrics(&self) -> &TrainingMetrics {
        &self.metrics
    }

    /// Total learning steps recorded, including those dropped from the window
    pub fn update_count(&self) -> usize {
        self.update_count
    }

    pub fn last(&self) -> Option<LearnStats> {
        self.last
    }

    pub fn mean_actor_loss(&self) -> Option<f32> {
        mean(&self.metrics.actor_losses)
    }

    pub fn mean_critic_loss(&self) -> Option<f32> {
        mean(&self.metrics.critic_losses)
    }

    pub fn mean_critic_grad_norm(&self) -> Option<f32> {
        mean(&self.metrics.critic_grad_norms)
    }

    pub fn to_json_string(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string_pretty(&self.metrics)?)
    }

    pub fn clear(&mut self) {
        self.metrics = TrainingMetrics::new(self.history_size);
        self.update_count = 0;
        self.last = None;
    }
}

impl Default for MetricsTracker {
    fn default() -> Self {
        Self::new(1000)
    }
}
