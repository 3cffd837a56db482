//! Neural actor-critic using tch-rs (PyTorch bindings).
//!
//! Provides MLP actor and critic networks whose parameters are exchanged
//! with a [`SharedParameters`] store as flat vectors.
//! This module is only available with the `nn` feature.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tch::{nn, nn::Module, Device, Kind, Tensor};

use super::sampling::{sample_categorical, DistributionCheck};
use super::trait_::{ActorCritic, GradientBatch};
use crate::config::A2CConfig;
use crate::error::A2CError;
use crate::optim::{GradientApplier, SharedParameters};

/// MLP actor network that outputs action log-probabilities.
///
/// Architecture: `obs_dim → 128 → 64 → action_dim` with ReLU activations
/// and log-softmax output.
pub struct ActorNetwork {
    vs: nn::VarStore,
    net: nn::Sequential,
}

impl ActorNetwork {
    /// Creates a new actor network.
    pub fn new(obs_dim: usize, action_dim: usize, device: Device) -> Self {
        let vs = nn::VarStore::new(device);
        let p = &vs.root();
        let net = nn::seq()
            .add(nn::linear(p / "l1", obs_dim as i64, 128, Default::default()))
            .add_fn(|x| x.relu())
            .add(nn::linear(p / "l2", 128, 64, Default::default()))
            .add_fn(|x| x.relu())
            .add(nn::linear(p / "l3", 64, action_dim as i64, Default::default()));

        Self { vs, net }
    }

    /// Forward pass: returns log-probabilities over actions.
    pub fn forward(&self, obs: &Tensor) -> Tensor {
        self.net.forward(obs).log_softmax(-1, Kind::Float)
    }

    /// Returns a reference to the variable store.
    pub fn var_store(&self) -> &nn::VarStore {
        &self.vs
    }
}

/// MLP critic network.
///
/// Architecture: `obs_dim → 128 → 64 → 1` with ReLU activations.
pub struct CriticNetwork {
    vs: nn::VarStore,
    net: nn::Sequential,
}

impl CriticNetwork {
    /// Creates a new critic network.
    pub fn new(obs_dim: usize, device: Device) -> Self {
        let vs = nn::VarStore::new(device);
        let p = &vs.root();
        let net = nn::seq()
            .add(nn::linear(p / "l1", obs_dim as i64, 128, Default::default()))
            .add_fn(|x| x.relu())
            .add(nn::linear(p / "l2", 128, 64, Default::default()))
            .add_fn(|x| x.relu())
            .add(nn::linear(p / "l3", 64, 1, Default::default()));

        Self { vs, net }
    }

    /// Forward pass: returns the state value estimate.
    pub fn forward(&self, state: &Tensor) -> Tensor {
        self.net.forward(state).squeeze_dim(-1)
    }

    /// Returns a reference to the variable store.
    pub fn var_store(&self) -> &nn::VarStore {
        &self.vs
    }
}

/// Variables of a store in name order, so flattening is stable across workers.
fn ordered_variables(vs: &nn::VarStore) -> Vec<Tensor> {
    let mut named: Vec<(String, Tensor)> = vs.variables().into_iter().collect();
    named.sort_by(|a, b| a.0.cmp(&b.0));
    named.into_iter().map(|(_, t)| t).collect()
}

fn to_vec(t: &Tensor) -> Result<Vec<f64>, A2CError> {
    let flat = t.flatten(0, -1).to_kind(Kind::Double);
    Vec::<f64>::try_from(&flat).map_err(|e| A2CError::Approximator(e.to_string()))
}

fn flatten(tensors: &[Tensor]) -> Result<Vec<f64>, A2CError> {
    let mut out = Vec::new();
    for t in tensors {
        out.extend(to_vec(t)?);
    }
    Ok(out)
}

/// Actor and critic networks behind the [`ActorCritic`] trait.
///
/// The local variable stores act as a snapshot of the shared store: they are
/// loaded from it at construction and after every gradient application.
pub struct NeuralActorCritic {
    actor: ActorNetwork,
    critic: CriticNetwork,
    obs_dim: usize,
    entropy_beta: f64,
    value_loss_coef: f64,
    check: DistributionCheck,
    shared: Arc<SharedParameters>,
    applier: Arc<dyn GradientApplier>,
    rng: StdRng,
}

impl NeuralActorCritic {
    /// Flattened parameters of freshly initialized networks.
    pub fn initial_parameters(obs_dim: usize, action_dim: usize) -> Result<Vec<f64>, A2CError> {
        let actor = ActorNetwork::new(obs_dim, action_dim, Device::Cpu);
        let critic = CriticNetwork::new(obs_dim, Device::Cpu);
        let mut vars = ordered_variables(actor.var_store());
        vars.extend(ordered_variables(critic.var_store()));
        flatten(&vars)
    }

    /// Creates networks on `device` and loads them from `shared`.
    pub fn new(
        obs_dim: usize,
        action_dim: usize,
        config: &A2CConfig,
        shared: Arc<SharedParameters>,
        applier: Arc<dyn GradientApplier>,
        device: Device,
        seed: u64,
    ) -> Result<Self, A2CError> {
        let mut model = Self {
            actor: ActorNetwork::new(obs_dim, action_dim, device),
            critic: CriticNetwork::new(obs_dim, device),
            obs_dim,
            entropy_beta: config.entropy_beta,
            value_loss_coef: config.value_loss_coef,
            check: DistributionCheck::default(),
            shared,
            applier,
            rng: StdRng::seed_from_u64(seed),
        };
        model.sync()?;
        Ok(model)
    }

    /// Sets how malformed action distributions are handled.
    pub fn with_distribution_check(mut self, check: DistributionCheck) -> Self {
        self.check = check;
        self
    }

    fn variables(&self) -> Vec<Tensor> {
        let mut vars = ordered_variables(self.actor.var_store());
        vars.extend(ordered_variables(self.critic.var_store()));
        vars
    }

    /// Copies the shared parameters into the local networks.
    pub fn sync(&mut self) -> Result<(), A2CError> {
        let params = self.shared.snapshot();
        let vars = self.variables();
        let expected: usize = vars.iter().map(|v| v.numel()).sum();
        if params.len() != expected {
            return Err(A2CError::Approximator(format!(
                "shared store holds {} parameters, expected {}",
                params.len(),
                expected
            )));
        }
        tch::no_grad(|| {
            let mut offset = 0;
            for mut var in vars {
                let n = var.numel();
                let src = Tensor::from_slice(&params[offset..offset + n])
                    .reshape(var.size().as_slice())
                    .to_kind(var.kind())
                    .to_device(var.device());
                var.copy_(&src);
                offset += n;
            }
        });
        Ok(())
    }

    fn obs_tensor(&self, states: &[&[f64]]) -> Result<Tensor, A2CError> {
        let mut flat = Vec::with_capacity(states.len() * self.obs_dim);
        for s in states {
            if s.len() != self.obs_dim {
                return Err(A2CError::StateShape {
                    expected: self.obs_dim,
                    actual: s.len(),
                });
            }
            flat.extend_from_slice(s);
        }
        Ok(Tensor::from_slice(&flat)
            .reshape([states.len() as i64, self.obs_dim as i64])
            .to_kind(Kind::Float)
            .to_device(self.actor.var_store().device()))
    }
}

impl ActorCritic<Vec<f64>> for NeuralActorCritic {
    fn sample_action_and_value(&mut self, state: &Vec<f64>) -> Result<(usize, f64), A2CError> {
        let obs = self.obs_tensor(&[state.as_slice()])?;
        let (probs, value) = tch::no_grad(|| {
            let probs = self.actor.forward(&obs).exp().squeeze_dim(0);
            let value = self.critic.forward(&obs).double_value(&[0]);
            (probs, value)
        });
        let probs = to_vec(&probs)?;
        let action = sample_categorical(&probs, &mut self.rng, self.check)?;
        Ok((action, value))
    }

    fn value_of(&mut self, state: &Vec<f64>) -> Result<f64, A2CError> {
        let obs = self.obs_tensor(&[state.as_slice()])?;
        Ok(tch::no_grad(|| self.critic.forward(&obs).double_value(&[0])))
    }

    fn apply_gradient(&mut self, batch: GradientBatch<Vec<f64>>) -> Result<(), A2CError> {
        let states: Vec<&[f64]> = batch.states.iter().map(|s| s.as_slice()).collect();
        let obs = self.obs_tensor(&states)?;
        let device = self.actor.var_store().device();
        let actions: Vec<i64> = batch.actions.iter().map(|&a| a as i64).collect();
        let actions = Tensor::from_slice(&actions).to_device(device);
        let advantages = Tensor::from_slice(&batch.advantages)
            .to_kind(Kind::Float)
            .to_device(device);
        let returns = Tensor::from_slice(&batch.returns)
            .to_kind(Kind::Float)
            .to_device(device);

        let log_probs = self.actor.forward(&obs);
        let probs = log_probs.exp();
        let entropy = -(&probs * &log_probs).sum_dim_intlist([-1].as_slice(), false, Kind::Float);
        let chosen = log_probs
            .gather(-1, &actions.unsqueeze(-1), false)
            .squeeze_dim(-1);
        let policy_loss = -(chosen * &advantages + entropy * self.entropy_beta).sum(Kind::Float);

        let values = self.critic.forward(&obs);
        let value_loss =
            (returns - values).pow_tensor_scalar(2).sum(Kind::Float) * (0.5 * self.value_loss_coef);

        let vars = self.variables();
        for mut v in vars.iter().map(|v| v.shallow_clone()) {
            v.zero_grad();
        }
        (policy_loss + value_loss).backward();

        let grads: Vec<Tensor> = vars
            .iter()
            .map(|v| {
                let g = v.grad();
                if g.defined() {
                    g
                } else {
                    v.zeros_like()
                }
            })
            .collect();
        let grads = flatten(&grads)?;

        self.applier.apply(&self.shared, &grads, batch.learning_rate)?;
        self.sync()
    }

    fn name(&self) -> &str {
        "neural"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optim::SgdApplier;

    fn model(shared: Arc<SharedParameters>) -> NeuralActorCritic {
        NeuralActorCritic::new(
            4,
            3,
            &A2CConfig::default(),
            shared,
            Arc::new(SgdApplier::new()),
            Device::Cpu,
            0,
        )
        .unwrap()
    }

    #[test]
    fn actor_forward_shape() {
        let actor = ActorNetwork::new(55, 6, Device::Cpu);
        let obs = Tensor::randn([4, 55], (Kind::Float, Device::Cpu));
        assert_eq!(actor.forward(&obs).size(), &[4, 6]);
    }

    #[test]
    fn critic_forward_shape() {
        let critic = CriticNetwork::new(100, Device::Cpu);
        let state = Tensor::randn([4, 100], (Kind::Float, Device::Cpu));
        assert_eq!(critic.forward(&state).size(), &[4]);
    }

    #[test]
    fn sampled_actions_in_range() {
        let shared = Arc::new(SharedParameters::new(
            NeuralActorCritic::initial_parameters(4, 3).unwrap(),
        ));
        let mut m = model(shared);
        for _ in 0..20 {
            let (a, v) = m.sample_action_and_value(&vec![0.1, 0.2, 0.3, 0.4]).unwrap();
            assert!(a < 3);
            assert!(v.is_finite());
        }
    }

    #[test]
    fn apply_gradient_updates_shared_store() {
        let shared = Arc::new(SharedParameters::new(
            NeuralActorCritic::initial_parameters(4, 3).unwrap(),
        ));
        let before = shared.snapshot();
        let mut m = model(Arc::clone(&shared));
        m.apply_gradient(GradientBatch {
            states: vec![vec![0.5; 4], vec![-0.5; 4]],
            actions: vec![0, 2],
            advantages: vec![1.0, -1.0],
            returns: vec![1.0, 0.0],
            learning_rate: 0.01,
            recurrent: None,
        })
        .unwrap();
        assert_eq!(shared.version(), 1);
        assert_ne!(shared.snapshot(), before);
    }

    #[test]
    fn wrong_state_width_rejected() {
        let shared = Arc::new(SharedParameters::new(
            NeuralActorCritic::initial_parameters(4, 3).unwrap(),
        ));
        let mut m = model(shared);
        assert!(matches!(
            m.value_of(&vec![1.0]),
            Err(A2CError::StateShape { .. })
        ));
    }
}
