//! Actor-critic contract used by the rollout engine.

use crate::error::A2CError;

/// Internal memory of one recurrent branch (e.g. an LSTM's cell and hidden vectors).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecurrentState {
    pub cell: Vec<f64>,
    pub hidden: Vec<f64>,
}

impl RecurrentState {
    /// A zeroed state of the given width.
    pub fn zeros(width: usize) -> Self {
        Self {
            cell: vec![0.0; width],
            hidden: vec![0.0; width],
        }
    }
}

/// Recurrent state of both branches, captured before a rollout starts.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecurrentSnapshot {
    pub policy: RecurrentState,
    pub value: RecurrentState,
}

/// Recurrent inputs replayed to gradient application.
#[derive(Debug, Clone, PartialEq)]
pub struct RecurrentReplay {
    /// State both branches held before the first rollout step.
    pub snapshot: RecurrentSnapshot,
    /// Number of steps the policy branch unrolls over.
    pub policy_window: usize,
    /// Number of steps the value branch unrolls over.
    pub value_window: usize,
}

/// Everything one gradient application needs, in chronological order.
#[derive(Debug, Clone)]
pub struct GradientBatch<S> {
    pub states: Vec<S>,
    pub actions: Vec<usize>,
    /// `returns[i] - value_estimate[i]`.
    pub advantages: Vec<f64>,
    /// Bootstrapped n-step returns.
    pub returns: Vec<f64>,
    /// Annealed learning rate for this update.
    pub learning_rate: f64,
    /// Present only for stateful approximators.
    pub recurrent: Option<RecurrentReplay>,
}

impl<S> GradientBatch<S> {
    /// Number of steps in the batch.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Returns true if the batch holds no steps.
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

/// A policy/value approximator backed by shared learnable parameters.
///
/// Implementations own their sampling RNG and their local parameter
/// snapshot; [`ActorCritic::apply_gradient`] is the only path through which
/// shared parameters change.
pub trait ActorCritic<S> {
    /// Samples an action from the policy head and returns it with the value estimate.
    fn sample_action_and_value(&mut self, state: &S) -> Result<(usize, f64), A2CError>;

    /// Value estimate of `state`.
    fn value_of(&mut self, state: &S) -> Result<f64, A2CError>;

    /// Whether this approximator carries recurrent state.
    fn is_recurrent(&self) -> bool {
        false
    }

    /// Returns the recurrent state to its initial value.
    fn reset_recurrent_state(&mut self) {}

    /// Current recurrent state of both branches; `None` when stateless.
    fn recurrent_state_snapshot(&self) -> Option<RecurrentSnapshot> {
        None
    }

    /// Computes the loss gradient over `batch` and applies it to the shared parameters.
    fn apply_gradient(&mut self, batch: GradientBatch<S>) -> Result<(), A2CError>;

    /// Returns a human-readable name for this approximator.
    fn name(&self) -> &str;
}
