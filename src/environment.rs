//! Environment contract consumed by the rollout engine.
//!
//! The worker never inspects states itself; it only clones them into the
//! trajectory and hands them to the approximator.

use crate::error::A2CError;

/// Result of advancing the environment by one action.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepResult {
    /// Raw (unclipped) reward for the transition.
    pub reward: f64,
    /// Whether the episode ended with this transition.
    pub terminal: bool,
}

impl StepResult {
    /// Creates a new step result.
    pub fn new(reward: f64, terminal: bool) -> Self {
        Self { reward, terminal }
    }
}

/// A simulator positioned at a current state.
///
/// # Lifecycle
///
/// 1. [`Environment::reset`] starts a fresh episode.
/// 2. [`Environment::advance`] applies an action; afterwards
///    [`Environment::current_state`] is the post-action observation.
/// 3. After a terminal step the caller resets before advancing again.
pub trait Environment {
    /// Observation type handed to the approximator.
    type State: Clone;

    /// Applies `action` and moves the current state to the resulting observation.
    fn advance(&mut self, action: usize) -> Result<StepResult, A2CError>;

    /// The observation the next action will be chosen from.
    fn current_state(&self) -> &Self::State;

    /// Starts a fresh episode and returns its initial state.
    fn reset(&mut self) -> Result<Self::State, A2CError>;

    /// Divisor turning an accumulated raw episode reward into a reported score.
    fn score_normalization(&self) -> f64;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Countdown {
        remaining: u32,
        state: u32,
    }

    impl Environment for Countdown {
        type State = u32;

        fn advance(&mut self, _action: usize) -> Result<StepResult, A2CError> {
            self.remaining -= 1;
            self.state += 1;
            Ok(StepResult::new(1.0, self.remaining == 0))
        }

        fn current_state(&self) -> &u32 {
            &self.state
        }

        fn reset(&mut self) -> Result<u32, A2CError> {
            self.remaining = 2;
            self.state = 0;
            Ok(self.state)
        }

        fn score_normalization(&self) -> f64 {
            1.0
        }
    }

    #[test]
    fn advance_moves_current_state() {
        let mut env = Countdown {
            remaining: 0,
            state: 7,
        };
        assert_eq!(env.reset().unwrap(), 0);
        let first = env.advance(0).unwrap();
        assert!(!first.terminal);
        assert_eq!(*env.current_state(), 1);
        let second = env.advance(0).unwrap();
        assert!(second.terminal);
        assert_eq!(*env.current_state(), 2);
    }
}
