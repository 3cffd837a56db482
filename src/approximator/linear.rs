//! Linear actor-critic over flat feature vectors.
//!
//! Policy head: `softmax(W_π x + b_π)`. Value head: `w_v · x + b_v`.
//! Parameters are stored flat in that order so they can live in a
//! [`SharedParameters`] store.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::sampling::{sample_categorical, DistributionCheck};
use super::trait_::{ActorCritic, GradientBatch};
use crate::config::A2CConfig;
use crate::error::A2CError;
use crate::optim::{GradientApplier, SharedParameters};

/// Lower bound applied to probabilities before taking logarithms.
const LOG_EPSILON: f64 = 1e-20;

/// Stateless linear actor-critic backed by shared parameters.
///
/// Holds a local snapshot of the shared store; the snapshot is refreshed
/// after every gradient application, picking up updates made by other
/// workers in the meantime.
pub struct LinearActorCritic {
    obs_dim: usize,
    action_dim: usize,
    entropy_beta: f64,
    value_loss_coef: f64,
    check: DistributionCheck,
    params: Vec<f64>,
    shared: Arc<SharedParameters>,
    applier: Arc<dyn GradientApplier>,
    rng: StdRng,
}

impl LinearActorCritic {
    /// Number of scalar parameters for the given dimensions.
    pub fn parameter_count(obs_dim: usize, action_dim: usize) -> usize {
        action_dim * obs_dim + action_dim + obs_dim + 1
    }

    /// Small random weights and zero biases, suitable for seeding a shared store.
    pub fn initial_parameters<R: Rng>(obs_dim: usize, action_dim: usize, rng: &mut R) -> Vec<f64> {
        let scale = 1.0 / (obs_dim.max(1) as f64).sqrt();
        let mut params = vec![0.0; Self::parameter_count(obs_dim, action_dim)];
        for w in &mut params[..action_dim * obs_dim] {
            *w = rng.gen_range(-scale..scale);
        }
        let value_start = action_dim * obs_dim + action_dim;
        for w in &mut params[value_start..value_start + obs_dim] {
            *w = rng.gen_range(-scale..scale);
        }
        params
    }

    /// Creates an approximator reading from and updating `shared`.
    ///
    /// # Arguments
    ///
    /// * `obs_dim` - Length of every state feature vector
    /// * `action_dim` - Number of discrete actions
    /// * `config` - Supplies the entropy and value-loss weights
    /// * `shared` - Parameter store, sized by [`LinearActorCritic::parameter_count`]
    /// * `applier` - Update rule used on `shared`
    /// * `seed` - Seed for action sampling
    pub fn new(
        obs_dim: usize,
        action_dim: usize,
        config: &A2CConfig,
        shared: Arc<SharedParameters>,
        applier: Arc<dyn GradientApplier>,
        seed: u64,
    ) -> Result<Self, A2CError> {
        if action_dim == 0 {
            return Err(A2CError::Approximator("action space is empty".into()));
        }
        let expected = Self::parameter_count(obs_dim, action_dim);
        if shared.len() != expected {
            return Err(A2CError::Approximator(format!(
                "shared store holds {} parameters, expected {}",
                shared.len(),
                expected
            )));
        }
        let params = shared.snapshot();
        Ok(Self {
            obs_dim,
            action_dim,
            entropy_beta: config.entropy_beta,
            value_loss_coef: config.value_loss_coef,
            check: DistributionCheck::default(),
            params,
            shared,
            applier,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    /// Sets how malformed action distributions are handled.
    pub fn with_distribution_check(mut self, check: DistributionCheck) -> Self {
        self.check = check;
        self
    }

    /// Local parameter snapshot.
    pub fn parameters(&self) -> &[f64] {
        &self.params
    }

    /// Re-reads the shared store into the local snapshot.
    pub fn sync(&mut self) {
        self.shared.snapshot_into(&mut self.params);
    }

    fn features<'a>(&self, state: &'a [f64]) -> Result<&'a [f64], A2CError> {
        if state.len() != self.obs_dim {
            return Err(A2CError::StateShape {
                expected: self.obs_dim,
                actual: state.len(),
            });
        }
        Ok(state)
    }

    fn policy_bias_start(&self) -> usize {
        self.action_dim * self.obs_dim
    }

    fn value_start(&self) -> usize {
        self.policy_bias_start() + self.action_dim
    }

    /// Action probabilities for `state`.
    pub fn probabilities(&self, state: &[f64]) -> Result<Vec<f64>, A2CError> {
        let x = self.features(state)?;
        let bias = &self.params[self.policy_bias_start()..self.value_start()];
        let logits: Vec<f64> = (0..self.action_dim)
            .map(|k| {
                let row = &self.params[k * self.obs_dim..(k + 1) * self.obs_dim];
                row.iter().zip(x).map(|(w, xi)| w * xi).sum::<f64>() + bias[k]
            })
            .collect();
        Ok(softmax(&logits))
    }

    fn value(&self, state: &[f64]) -> Result<f64, A2CError> {
        let x = self.features(state)?;
        let start = self.value_start();
        let weights = &self.params[start..start + self.obs_dim];
        let bias = self.params[start + self.obs_dim];
        Ok(weights.iter().zip(x).map(|(w, xi)| w * xi).sum::<f64>() + bias)
    }

    /// Gradient of the summed A2C loss over `batch` with respect to the local parameters.
    ///
    /// Per step: `-(log π(a|s) · A + β H(π(·|s))) + c_v · ½ (R − V(s))²`.
    fn loss_gradient<S: AsRef<[f64]>>(&self, batch: &GradientBatch<S>) -> Result<Vec<f64>, A2CError> {
        let mut grad = vec![0.0; self.params.len()];
        let bias_start = self.policy_bias_start();
        let value_start = self.value_start();

        for i in 0..batch.len() {
            let x = self.features(batch.states[i].as_ref())?;
            let action = batch.actions[i];
            if action >= self.action_dim {
                return Err(A2CError::Approximator(format!(
                    "action {} outside [0, {})",
                    action, self.action_dim
                )));
            }
            let advantage = batch.advantages[i];

            let probs = self.probabilities(x)?;
            let log_probs: Vec<f64> = probs.iter().map(|p| p.max(LOG_EPSILON).ln()).collect();
            let entropy: f64 = -probs.iter().zip(&log_probs).map(|(p, lp)| p * lp).sum::<f64>();

            for k in 0..self.action_dim {
                let indicator = if k == action { 1.0 } else { 0.0 };
                let d_logit = -advantage * (indicator - probs[k])
                    + self.entropy_beta * probs[k] * (log_probs[k] + entropy);
                let row = &mut grad[k * self.obs_dim..(k + 1) * self.obs_dim];
                for (g, xi) in row.iter_mut().zip(x) {
                    *g += d_logit * xi;
                }
                grad[bias_start + k] += d_logit;
            }

            let d_value = -self.value_loss_coef * (batch.returns[i] - self.value(x)?);
            for (g, xi) in grad[value_start..value_start + self.obs_dim]
                .iter_mut()
                .zip(x)
            {
                *g += d_value * xi;
            }
            grad[value_start + self.obs_dim] += d_value;
        }

        Ok(grad)
    }
}

fn softmax(logits: &[f64]) -> Vec<f64> {
    let max = logits.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = logits.iter().map(|z| (z - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}

impl<S: AsRef<[f64]>> ActorCritic<S> for LinearActorCritic {
    fn sample_action_and_value(&mut self, state: &S) -> Result<(usize, f64), A2CError> {
        let probs = self.probabilities(state.as_ref())?;
        let action = sample_categorical(&probs, &mut self.rng, self.check)?;
        Ok((action, self.value(state.as_ref())?))
    }

    fn value_of(&mut self, state: &S) -> Result<f64, A2CError> {
        self.value(state.as_ref())
    }

    fn apply_gradient(&mut self, batch: GradientBatch<S>) -> Result<(), A2CError> {
        let n = batch.len();
        if batch.actions.len() != n || batch.advantages.len() != n || batch.returns.len() != n {
            return Err(A2CError::Approximator(
                "gradient batch sequences differ in length".into(),
            ));
        }
        let grad = self.loss_gradient(&batch)?;
        self.applier.apply(&self.shared, &grad, batch.learning_rate)?;
        self.sync();
        Ok(())
    }

    fn name(&self) -> &str {
        "linear"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optim::SgdApplier;

    fn zero_model(obs_dim: usize, action_dim: usize) -> LinearActorCritic {
        let n = LinearActorCritic::parameter_count(obs_dim, action_dim);
        let shared = Arc::new(SharedParameters::new(vec![0.0; n]));
        LinearActorCritic::new(
            obs_dim,
            action_dim,
            &A2CConfig::default(),
            shared,
            Arc::new(SgdApplier::new()),
            1,
        )
        .unwrap()
    }

    fn batch(state: Vec<f64>, action: usize, advantage: f64, ret: f64) -> GradientBatch<Vec<f64>> {
        GradientBatch {
            states: vec![state],
            actions: vec![action],
            advantages: vec![advantage],
            returns: vec![ret],
            learning_rate: 0.5,
            recurrent: None,
        }
    }

    #[test]
    fn parameter_count_layout() {
        // 3x2 policy weights + 3 biases + 2 value weights + 1 bias
        assert_eq!(LinearActorCritic::parameter_count(2, 3), 12);
    }

    #[test]
    fn zero_parameters_give_uniform_policy() {
        let model = zero_model(2, 4);
        let probs = model.probabilities(&[1.0, -1.0]).unwrap();
        for p in &probs {
            assert!((p - 0.25).abs() < 1e-12);
        }
        let sum: f64 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-12);
    }

    #[test]
    fn wrong_state_width_rejected() {
        let mut model = zero_model(3, 2);
        let err = model.value_of(&vec![1.0, 2.0]).unwrap_err();
        assert_eq!(
            err,
            A2CError::StateShape {
                expected: 3,
                actual: 2
            }
        );
    }

    #[test]
    fn mismatched_store_rejected() {
        let shared = Arc::new(SharedParameters::new(vec![0.0; 3]));
        let result = LinearActorCritic::new(
            2,
            2,
            &A2CConfig::default(),
            shared,
            Arc::new(SgdApplier::new()),
            0,
        );
        assert!(matches!(result, Err(A2CError::Approximator(_))));
    }

    #[test]
    fn positive_advantage_raises_action_probability() {
        let mut model = zero_model(2, 2);
        let state = vec![1.0, 0.5];
        let before = model.probabilities(&state).unwrap()[1];
        model.apply_gradient(batch(state.clone(), 1, 1.0, 0.0)).unwrap();
        let after = model.probabilities(&state).unwrap()[1];
        assert!(after > before);
    }

    #[test]
    fn value_moves_toward_return() {
        let mut model = zero_model(1, 2);
        let state = vec![1.0];
        model.apply_gradient(batch(state.clone(), 0, 0.0, 2.0)).unwrap();
        let v = model.value_of(&state).unwrap();
        assert!(v > 0.0 && v < 2.0);
    }

    #[test]
    fn apply_gradient_updates_shared_store_and_snapshot() {
        let n = LinearActorCritic::parameter_count(1, 2);
        let shared = Arc::new(SharedParameters::new(vec![0.0; n]));
        let mut model = LinearActorCritic::new(
            1,
            2,
            &A2CConfig::default(),
            Arc::clone(&shared),
            Arc::new(SgdApplier::new()),
            9,
        )
        .unwrap();
        model.apply_gradient(batch(vec![1.0], 0, 1.0, 1.0)).unwrap();
        assert_eq!(shared.version(), 1);
        assert_eq!(model.parameters(), shared.snapshot().as_slice());
    }

    #[test]
    fn zero_learning_rate_is_a_no_op() {
        let mut model = zero_model(2, 2);
        let mut b = batch(vec![1.0, 1.0], 0, 5.0, 5.0);
        b.learning_rate = 0.0;
        model.apply_gradient(b).unwrap();
        assert!(model.parameters().iter().all(|p| *p == 0.0));
    }

    #[test]
    fn initial_parameters_have_zero_biases() {
        let mut rng = StdRng::seed_from_u64(5);
        let params = LinearActorCritic::initial_parameters(3, 2, &mut rng);
        assert_eq!(params.len(), LinearActorCritic::parameter_count(3, 2));
        assert_eq!(&params[6..8], &[0.0, 0.0]);
        assert_eq!(params[params.len() - 1], 0.0);
    }
}
