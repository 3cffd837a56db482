//! Per-call trajectory buffer.

/// Steps collected during one `process` call.
///
/// The four sequences always have equal length; pushing is the only way in.
#[derive(Debug, Clone)]
pub struct Trajectory<S> {
    states: Vec<S>,
    actions: Vec<usize>,
    /// Clipped rewards.
    rewards: Vec<f64>,
    values: Vec<f64>,
    /// Whether the episode ended inside this trajectory.
    terminated: bool,
}

impl<S> Trajectory<S> {
    /// Creates an empty trajectory with room for `horizon` steps.
    pub fn with_capacity(horizon: usize) -> Self {
        Self {
            states: Vec::with_capacity(horizon),
            actions: Vec::with_capacity(horizon),
            rewards: Vec::with_capacity(horizon),
            values: Vec::with_capacity(horizon),
            terminated: false,
        }
    }

    /// Records the state the action was chosen from, with the action and value estimate.
    ///
    /// Must be followed by [`Trajectory::record_reward`] before the next push.
    pub fn push_decision(&mut self, state: S, action: usize, value: f64) {
        debug_assert_eq!(self.states.len(), self.rewards.len());
        self.states.push(state);
        self.actions.push(action);
        self.values.push(value);
    }

    /// Records the (clipped) reward of the most recent decision.
    pub fn record_reward(&mut self, reward: f64) {
        debug_assert_eq!(self.rewards.len() + 1, self.states.len());
        self.rewards.push(reward);
    }

    /// Marks the trajectory as ended by a terminal step.
    pub fn mark_terminated(&mut self) {
        self.terminated = true;
    }

    /// Returns true if the episode ended inside this trajectory.
    pub fn terminated(&self) -> bool {
        self.terminated
    }

    /// Returns the number of completed steps.
    pub fn len(&self) -> usize {
        self.rewards.len()
    }

    /// Returns true if no step has been completed.
    pub fn is_empty(&self) -> bool {
        self.rewards.is_empty()
    }

    pub fn states(&self) -> &[S] {
        &self.states
    }

    pub fn actions(&self) -> &[usize] {
        &self.actions
    }

    pub fn rewards(&self) -> &[f64] {
        &self.rewards
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Splits into `(states, actions, rewards, values)`.
    pub fn into_parts(self) -> (Vec<S>, Vec<usize>, Vec<f64>, Vec<f64>) {
        (self.states, self.actions, self.rewards, self.values)
    }
}
