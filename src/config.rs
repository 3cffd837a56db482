//! Configuration for the A2C rollout worker.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Hyperparameters shared by the rollout engine and the approximators it drives.
///
/// Passed by value at construction; nothing here is read from global state.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct A2CConfig {
    // --- Rollout ---
    /// Maximum number of environment steps collected per `process` call (T).
    pub horizon: usize,
    /// Discount factor γ for the n-step return recursion.
    pub gamma: f64,
    /// Rewards are clipped to `[-reward_clip, reward_clip]` before they enter the returns.
    pub reward_clip: f64,

    // --- Loss ---
    /// Weight of the entropy bonus in the policy loss.
    pub entropy_beta: f64,
    /// Weight of the squared value error in the total loss.
    pub value_loss_coef: f64,

    // --- Approximator mode ---
    /// Whether the approximator carries recurrent state that must be
    /// snapshotted before each rollout and replayed to gradient application.
    pub recurrent: bool,

    // --- Learning-rate schedule ---
    /// Learning rate at global step 0.
    pub initial_learning_rate: f64,
    /// Global step at which the annealed learning rate reaches zero.
    pub max_global_step: u64,

    // --- Logging ---
    /// Number of global steps between throughput log lines.
    pub performance_log_interval: u64,
}

impl A2CConfig {
    /// Checks every field, returning the first violation found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.horizon == 0 {
            return Err(ConfigError::ZeroHorizon);
        }
        if !(0.0..=1.0).contains(&self.gamma) {
            return Err(ConfigError::InvalidDiscount(self.gamma));
        }
        if !self.initial_learning_rate.is_finite() || self.initial_learning_rate < 0.0 {
            return Err(ConfigError::InvalidLearningRate(self.initial_learning_rate));
        }
        if self.max_global_step == 0 {
            return Err(ConfigError::NonPositiveMaxGlobalStep);
        }
        if self.performance_log_interval == 0 {
            return Err(ConfigError::ZeroLogInterval);
        }
        if !self.reward_clip.is_finite() || self.reward_clip <= 0.0 {
            return Err(ConfigError::InvalidRewardClip(self.reward_clip));
        }
        Ok(())
    }

    /// Clips a raw reward into `[-reward_clip, reward_clip]`.
    pub fn clip_reward(&self, reward: f64) -> f64 {
        reward.clamp(-self.reward_clip, self.reward_clip)
    }
}

impl Default for A2CConfig {
    fn default() -> Self {
        Self {
            horizon: 20,
            gamma: 0.99,
            reward_clip: 1.0,
            entropy_beta: 0.01,
            value_loss_coef: 0.5,
            recurrent: false,
            initial_learning_rate: 7e-4,
            max_global_step: 10_000_000,
            performance_log_interval: 1000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = A2CConfig::default();
        assert!(cfg.validate().is_ok());
        assert!(cfg.horizon > 0);
        assert!(!cfg.recurrent);
    }

    #[test]
    fn zero_horizon_rejected() {
        let cfg = A2CConfig {
            horizon: 0,
            ..A2CConfig::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroHorizon));
    }

    #[test]
    fn discount_out_of_range_rejected() {
        let cfg = A2CConfig {
            gamma: 1.5,
            ..A2CConfig::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::InvalidDiscount(1.5)));
    }

    #[test]
    fn zero_max_global_step_rejected() {
        let cfg = A2CConfig {
            max_global_step: 0,
            ..A2CConfig::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::NonPositiveMaxGlobalStep));
    }

    #[test]
    fn negative_learning_rate_rejected() {
        let cfg = A2CConfig {
            initial_learning_rate: -1e-3,
            ..A2CConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidLearningRate(_))
        ));
    }

    #[test]
    fn clip_reward_bounds() {
        let cfg = A2CConfig::default();
        assert_eq!(cfg.clip_reward(5.0), 1.0);
        assert_eq!(cfg.clip_reward(-3.2), -1.0);
        assert_eq!(cfg.clip_reward(0.25), 0.25);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn partial_json_fills_defaults() {
        let cfg: A2CConfig = serde_json::from_str(r#"{"horizon": 5, "recurrent": true}"#).unwrap();
        assert_eq!(cfg.horizon, 5);
        assert!(cfg.recurrent);
        assert_eq!(cfg.gamma, A2CConfig::default().gamma);
    }
}
