use std::cell::{Cell, RefCell};
use std::rc::Rc;

use ndarray::{array, Array1, Array2, ArrayView2};
use ndarray_rand::RandomExt;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::Uniform;

use crate::activations::Activation;
use crate::agent::{bellman_targets, DdpgAgent, DdpgBuilder};
use crate::config::DdpgConfig;
use crate::error::{DdpgError, Result};
use crate::layers::{DenseLayer, WeightInit};
use crate::model::{Actor, ActorModel, Critic, CriticModel, Parameterized};
use crate::network::{interpolate, Mode, NeuralNetwork};
use crate::optimizer::{GradientClipper, OptimizerWrapper, SGD};
use crate::replay_buffer::Batch;

fn small_config() -> DdpgConfig {
    DdpgConfig {
        state_size: 2,
        action_size: 1,
        actor_hidden: vec![16, 16],
        critic_hidden: vec![16, 16],
        buffer_size: 100,
        batch_size: 4,
        ..DdpgConfig::default()
    }
}

fn random_batch(rows: usize, seed: u64) -> Batch {
    let mut rng = StdRng::seed_from_u64(seed);
    let unit = Uniform::new(-1.0f32, 1.0);
    Batch {
        states: Array2::random_using((rows, 2), unit, &mut rng),
        actions: Array2::random_using((rows, 1), unit, &mut rng),
        rewards: Array2::random_using((rows, 1), unit, &mut rng),
        next_states: Array2::random_using((rows, 2), unit, &mut rng),
        dones: Array2::zeros((rows, 1)),
    }
}

/// Linear actor whose raw output is `scale * (s0 + s1)`.
fn saturating_actor(scale: f32) -> Actor {
    let mut rng = StdRng::seed_from_u64(0);
    let layer = DenseLayer::new(2, 1, Activation::Linear, WeightInit::Zeros, &mut rng)
        .with_weights(Array2::from_elem((2, 1), scale));
    Actor::from_network(NeuralNetwork::with_layers(vec![layer]))
}

fn small_critic() -> Critic {
    let mut rng = StdRng::seed_from_u64(1);
    Critic::new(2, 1, &[8], Activation::Relu, &mut rng).unwrap()
}

fn assert_same_parameters(a: &NeuralNetwork, b: &NeuralNetwork) {
    assert_eq!(a.layers.len(), b.layers.len());
    for (x, y) in a.layers.iter().zip(b.layers.iter()) {
        assert_eq!(x.weights, y.weights);
        assert_eq!(x.biases, y.biases);
    }
}

/// Actor wrapper counting backward passes; one backward pass happens per learning step.
#[derive(Clone, Debug)]
struct CountingActor {
    inner: Actor,
    backward_calls: Rc<Cell<usize>>,
}

impl Parameterized for CountingActor {
    fn network(&self) -> &NeuralNetwork {
        self.inner.network()
    }

    fn network_mut(&mut self) -> &mut NeuralNetwork {
        self.inner.network_mut()
    }
}

impl ActorModel for CountingActor {
    fn state_size(&self) -> usize {
        self.inner.state_size()
    }

    fn action_size(&self) -> usize {
        self.inner.action_size()
    }

    fn forward(&mut self, states: ArrayView2<f32>) -> Result<Array2<f32>> {
        self.inner.forward(states)
    }

    fn backward(&mut self, action_grad: ArrayView2<f32>) -> Result<Array2<f32>> {
        self.backward_calls.set(self.backward_calls.get() + 1);
        self.inner.backward(action_grad)
    }
}

/// Critic wrapper recording the accumulated gradient norm at every live forward pass.
#[derive(Clone, Debug)]
struct InspectingCritic {
    inner: Critic,
    grad_norms: Rc<RefCell<Vec<f32>>>,
}

impl Parameterized for InspectingCritic {
    fn network(&self) -> &NeuralNetwork {
        self.inner.network()
    }

    fn network_mut(&mut self) -> &mut NeuralNetwork {
        self.inner.network_mut()
    }
}

impl CriticModel for InspectingCritic {
    fn state_size(&self) -> usize {
        self.inner.state_size()
    }

    fn action_size(&self) -> usize {
        self.inner.action_size()
    }

    fn forward(&mut self, states: ArrayView2<f32>, actions: ArrayView2<f32>) -> Result<Array2<f32>> {
        if self.inner.network().is_trainable() {
            self.grad_norms.borrow_mut().push(self.inner.network().gradient_norm());
        }
        self.inner.forward(states, actions)
    }

    fn backward(&mut self, value_grad: ArrayView2<f32>) -> Result<(Array2<f32>, Array2<f32>)> {
        self.inner.backward(value_grad)
    }
}

#[test]
fn test_targets_start_as_exact_copies() {
    let agent = DdpgAgent::new(small_config()).unwrap();
    assert_same_parameters(agent.actor().network(), agent.actor_target().network());
    assert_same_parameters(agent.critic().network(), agent.critic_target().network());

    assert!(agent.actor().network().is_trainable());
    assert!(agent.critic().network().is_trainable());
    assert!(!agent.actor_target().network().is_trainable());
    assert!(!agent.critic_target().network().is_trainable());
}

#[test]
fn test_default_architecture() {
    let agent = DdpgAgent::new(DdpgConfig::new(33, 4)).unwrap();
    let actor_sizes: Vec<usize> = agent.actor().network().layers.iter().map(|l| l.biases.len()).collect();
    assert_eq!(actor_sizes, vec![400, 300, 4]);
    assert_eq!(agent.critic().network().input_size(), 37);
    assert_eq!(agent.critic().network().output_size(), 1);
    assert_eq!(agent.actor().network().layers[2].activation, Activation::Tanh);
}

#[test]
fn test_same_seed_same_agent() {
    let mut a = DdpgAgent::new(small_config()).unwrap();
    let mut b = DdpgAgent::new(small_config()).unwrap();
    assert_same_parameters(a.actor().network(), b.actor().network());
    let state = array![0.3, -0.4];
    for _ in 0..5 {
        assert_eq!(a.act(state.view(), true).unwrap(), b.act(state.view(), true).unwrap());
    }
}

#[test]
fn test_act_output_in_range() {
    let mut agent = DdpgAgent::new(small_config()).unwrap();
    let state = array![0.5, -0.5];
    for _ in 0..100 {
        let action = agent.act(state.view(), true).unwrap();
        assert_eq!(action.len(), 1);
        assert!(action.iter().all(|a| (-1.0..=1.0).contains(a)));
    }
}

#[test]
fn test_act_clips_saturated_actions() {
    let mut agent = DdpgAgent::with_models(small_config(), saturating_actor(100.0), small_critic()).unwrap();
    assert_eq!(agent.act(array![1.0, 1.0].view(), false).unwrap(), array![1.0]);
    assert_eq!(agent.act(array![-1.0, -1.0].view(), false).unwrap(), array![-1.0]);
    assert_eq!(agent.act(array![1.0, 1.0].view(), true).unwrap(), array![1.0]);
    assert_eq!(agent.act(array![-1.0, -1.0].view(), true).unwrap(), array![-1.0]);
}

#[test]
fn test_act_without_noise_is_pure_policy() {
    let mut agent = DdpgAgent::with_models(small_config(), saturating_actor(0.25), small_critic()).unwrap();
    let action = agent.act(array![0.4, 0.4].view(), false).unwrap();
    assert!((action[0] - 0.2).abs() < 1e-6);
    assert_eq!(agent.noise().state(), agent.noise().mu());
}

#[test]
fn test_act_adds_noise_sample() {
    let mut agent = DdpgAgent::with_models(small_config(), saturating_actor(0.0), small_critic()).unwrap();
    let action = agent.act(array![0.4, 0.4].view(), true).unwrap();
    assert_eq!(&action, agent.noise().state());
}

#[test]
fn test_act_batch_shares_one_noise_sample() {
    let mut agent = DdpgAgent::with_models(small_config(), saturating_actor(0.0), small_critic()).unwrap();
    let actions = agent.act_batch(Array2::zeros((5, 2)).view(), true).unwrap();
    assert_eq!(actions.dim(), (5, 1));
    assert!(actions.iter().all(|&a| a == actions[[0, 0]]));
}

#[test]
fn test_act_leaves_actor_in_train_mode() {
    let mut agent = DdpgAgent::new(small_config()).unwrap();
    agent.act(array![0.1, 0.2].view(), true).unwrap();
    assert_eq!(agent.actor().mode(), Mode::Train);

    let result = agent.act(array![0.1, 0.2, 0.3].view(), true);
    assert!(matches!(result, Err(DdpgError::DimensionMismatch { .. })));
    assert_eq!(agent.actor().mode(), Mode::Train);
}

#[test]
fn test_reset_restores_noise_mean() {
    let mut agent = DdpgAgent::new(small_config()).unwrap();
    for _ in 0..10 {
        agent.act(array![0.1, 0.2].view(), true).unwrap();
    }
    assert_ne!(agent.noise().state(), agent.noise().mu());
    agent.reset();
    assert_eq!(agent.noise().state(), &Array1::from_elem(1, 0.01f32));
}

#[test]
fn test_bellman_targets_mask_terminal_transitions() {
    let rewards = array![[1.0], [2.0], [-1.0]];
    let q_next = array![[10.0], [1e6], [4.0]];
    let dones = array![[0.0], [1.0], [0.0]];
    let targets = bellman_targets(rewards.view(), q_next.view(), dones.view(), 0.5);
    assert_eq!(targets, array![[6.0], [2.0], [1.0]]);
}

#[test]
fn test_step_learns_on_cadence() {
    let mut agent = DdpgAgent::new(small_config()).unwrap();
    let mut learned_at = Vec::new();
    for t in 1..=40 {
        let x = t as f32 / 40.0;
        let stats = agent
            .step(array![x, -x].view(), array![x].view(), x, array![x, x].view(), t % 10 == 0)
            .unwrap();
        if stats.is_some() {
            learned_at.push(t);
        }
    }
    // at t = 4 the buffer holds exactly batch_size transitions, which is not enough
    assert_eq!(learned_at, vec![8, 12, 16, 20, 24, 28, 32, 36, 40]);
    assert_eq!(agent.learn_steps(), 9);
    assert_eq!(agent.total_steps(), 40);
    assert_eq!(agent.memory().len(), 40);
}

#[test]
fn test_step_cadence_counts_learning_calls() {
    let calls = Rc::new(Cell::new(0));
    let mut rng = StdRng::seed_from_u64(3);
    let actor = CountingActor {
        inner: Actor::new(2, 1, &[8], Activation::Relu, &mut rng).unwrap(),
        backward_calls: Rc::clone(&calls),
    };
    let config = DdpgConfig { batch_size: 32, ..small_config() };
    let mut agent = DdpgAgent::with_models(config, actor, small_critic()).unwrap();

    for t in 0..40 {
        let x = t as f32 / 40.0;
        agent.step(array![x, x].view(), array![0.0].view(), 0.0, array![x, x].view(), false).unwrap();
        // learning needs len > batch_size and t_step % 4 == 0
        let steps = t + 1;
        let expected = (33..=steps).filter(|s| s % 4 == 0).count();
        assert_eq!(calls.get(), expected);
    }
    assert_eq!(calls.get(), 2);
}

#[test]
fn test_step_rejects_wrong_lengths() {
    let mut agent = DdpgAgent::new(small_config()).unwrap();
    let result = agent.step(array![0.0].view(), array![0.0].view(), 0.0, array![0.0, 0.0].view(), false);
    assert!(matches!(result, Err(DdpgError::DimensionMismatch { .. })));
    let result = agent.step(array![0.0, 0.0].view(), array![0.0, 1.0].view(), 0.0, array![0.0, 0.0].view(), false);
    assert!(result.is_err());
    assert_eq!(agent.memory().len(), 0);
    assert_eq!(agent.total_steps(), 0);
}

#[test]
fn test_learn_soft_updates_targets() {
    let mut agent = DdpgAgent::new(small_config()).unwrap();
    let tau = agent.config().tau;
    let actor_target_before = agent.actor_target().network().clone();
    let critic_target_before = agent.critic_target().network().clone();
    let actor_before = agent.actor().network().clone();

    agent.learn(&random_batch(8, 0), 0.99).unwrap();

    let actor = agent.actor().network();
    assert!(actor
        .layers
        .iter()
        .zip(actor_before.layers.iter())
        .any(|(a, b)| a.weights != b.weights));

    for ((target, before), local) in agent
        .actor_target()
        .network()
        .layers
        .iter()
        .zip(actor_target_before.layers.iter())
        .zip(actor.layers.iter())
    {
        assert_eq!(target.weights, interpolate(local.weights.view(), before.weights.view(), tau));
        assert_eq!(target.biases, interpolate(local.biases.view(), before.biases.view(), tau));
    }

    let critic = agent.critic().network();
    for ((target, before), local) in agent
        .critic_target()
        .network()
        .layers
        .iter()
        .zip(critic_target_before.layers.iter())
        .zip(critic.layers.iter())
    {
        assert_eq!(target.weights, interpolate(local.weights.view(), before.weights.view(), tau));
    }
}

#[test]
fn test_learn_records_losses() {
    let mut agent = DdpgAgent::new(small_config()).unwrap();
    assert_eq!(agent.actor_loss(), None);
    assert_eq!(agent.critic_loss(), None);

    let stats = agent.learn(&random_batch(8, 5), 0.99).unwrap();
    assert_eq!(agent.actor_loss(), Some(stats.actor_loss));
    assert_eq!(agent.critic_loss(), Some(stats.critic_loss));
    assert!(stats.critic_loss >= 0.0);
    assert!(stats.critic_grad_norm >= 0.0);
    assert_eq!(agent.learn_steps(), 1);
}

#[test]
fn test_learn_fits_critic_on_fixed_batch() {
    let mut agent = DdpgAgent::new(small_config()).unwrap();
    let batch = random_batch(16, 7);
    let first = agent.learn(&batch, 0.0).unwrap().critic_loss;
    let mut last = first;
    for _ in 0..300 {
        last = agent.learn(&batch, 0.0).unwrap().critic_loss;
    }
    assert!(last < first, "critic loss went from {} to {}", first, last);
}

#[test]
fn test_learn_clips_critic_gradients_before_optimizer_step() {
    let grad_norms = Rc::new(RefCell::new(Vec::new()));
    let critic = InspectingCritic {
        inner: small_critic(),
        grad_norms: Rc::clone(&grad_norms),
    };
    let mut rng = StdRng::seed_from_u64(3);
    let actor = Actor::new(2, 1, &[8], Activation::Relu, &mut rng).unwrap();
    let mut agent = DdpgAgent::with_models(small_config(), actor, critic).unwrap();

    let mut batch = random_batch(8, 4);
    batch.rewards.mapv_inplace(|r| 100.0 * r);
    let stats = agent.learn(&batch, 0.99).unwrap();

    // live critic passes: Q(s, a) before backward, then Q(s, actor(s)) after the critic step
    let norms = grad_norms.borrow();
    assert_eq!(norms.len(), 2);
    assert_eq!(norms[0], 0.0);
    assert!(stats.critic_grad_norm > 1.0, "pre-clip norm {}", stats.critic_grad_norm);
    assert!((norms[1] - 1.0).abs() < 1e-3, "applied gradient norm {}", norms[1]);
}

#[test]
fn test_actor_update_uses_freshly_updated_critic() {
    let mut rng = StdRng::seed_from_u64(0);
    let actor_layer = DenseLayer::new(2, 1, Activation::Linear, WeightInit::Zeros, &mut rng)
        .with_weights(array![[0.5], [-0.5]]);
    let critic_layer = DenseLayer::new(3, 1, Activation::Linear, WeightInit::Zeros, &mut rng)
        .with_weights(array![[1.0], [1.0], [2.0]]);
    let actor = Actor::from_network(NeuralNetwork::with_layers(vec![actor_layer]));
    let critic = Critic::from_network(NeuralNetwork::with_layers(vec![critic_layer]), 2).unwrap();
    let config = DdpgConfig {
        actor_lr: 0.1,
        critic_lr: 0.1,
        critic_grad_clip: GradientClipper::None,
        ..small_config()
    };
    let mut agent = DdpgAgent::with_models(config, actor, critic)
        .unwrap()
        .with_optimizers(OptimizerWrapper::SGD(SGD::new()), OptimizerWrapper::SGD(SGD::new()));

    let batch = Batch {
        states: array![[1.0, 0.0], [0.0, 1.0]],
        actions: array![[1.0], [0.5]],
        rewards: array![[1.0], [-1.0]],
        next_states: array![[0.0, 0.0], [0.0, 0.0]],
        dones: array![[1.0], [1.0]],
    };
    agent.learn(&batch, 0.99).unwrap();

    // a linear critic has dQ/da equal to its action weight, which the critic step moved from 2.0
    let action_weight = agent.critic().network().layers[0].weights[[2, 0]];
    assert!((action_weight - 1.65).abs() < 1e-5);

    let n = batch.len() as f32;
    let actor = &agent.actor().network().layers[0];
    let initial = [0.5f32, -0.5];
    for j in 0..2 {
        let grad = -action_weight / n * batch.states.column(j).sum();
        let expected = initial[j] - 0.1 * grad;
        assert!((actor.weights[[j, 0]] - expected).abs() < 1e-6);
    }
    assert!((actor.biases[0] - 0.1 * action_weight).abs() < 1e-6);
}

#[test]
fn test_learn_rejects_non_finite_loss() {
    let mut agent = DdpgAgent::new(small_config()).unwrap();
    let mut batch = random_batch(8, 2);
    batch.rewards[[0, 0]] = f32::NAN;
    let critic_before = agent.critic().network().clone();

    let result = agent.learn(&batch, 0.99);
    assert!(matches!(result, Err(DdpgError::NumericalError(_))));
    assert_same_parameters(agent.critic().network(), &critic_before);
    assert_eq!(agent.learn_steps(), 0);
}

#[test]
fn test_learn_rejects_malformed_batch() {
    let mut agent = DdpgAgent::new(small_config()).unwrap();
    let mut batch = random_batch(8, 2);
    batch.actions = Array2::zeros((8, 3));
    assert!(matches!(
        agent.learn(&batch, 0.99),
        Err(DdpgError::DimensionMismatch { .. })
    ));
}

#[test]
fn test_with_models_checks_sizes() {
    let mut rng = StdRng::seed_from_u64(0);
    let actor = Actor::new(3, 1, &[8], Activation::Relu, &mut rng).unwrap();
    let result = DdpgAgent::with_models(small_config(), actor, small_critic());
    assert!(matches!(result, Err(DdpgError::DimensionMismatch { .. })));
}

#[test]
fn test_builder_validates() {
    let result = DdpgBuilder::new(2, 1).buffer_size(8).batch_size(16).build();
    assert!(matches!(result, Err(DdpgError::InvalidParameter { .. })));

    let agent = DdpgBuilder::new(2, 1)
        .hidden_sizes(vec![8], vec![8])
        .tau(0.01)
        .noise_params(0.0, 0.2, 0.05)
        .build()
        .unwrap();
    assert_eq!(agent.config().tau, 0.01);
    assert_eq!(agent.noise().mu(), &Array1::<f32>::zeros(1));
}
