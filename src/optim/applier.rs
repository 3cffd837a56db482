//! Gradient appliers that mutate the shared parameter store.

use parking_lot::Mutex;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::shared::SharedParameters;
use crate::error::A2CError;

/// Turns a gradient and a learning rate into an update of shared parameters.
///
/// Implementations must be safe to call from many workers at once.
pub trait GradientApplier: Send + Sync {
    /// Applies one descent step with `gradients` (same layout as `params`).
    fn apply(
        &self,
        params: &SharedParameters,
        gradients: &[f64],
        learning_rate: f64,
    ) -> Result<(), A2CError>;

    /// Returns a human-readable name for this applier.
    fn name(&self) -> &str;
}

fn check_shape(params: &SharedParameters, gradients: &[f64]) -> Result<(), A2CError> {
    let expected = params.len();
    if gradients.len() != expected {
        return Err(A2CError::GradientShape {
            expected,
            actual: gradients.len(),
        });
    }
    Ok(())
}

/// Scale factor bringing the gradient's global L2 norm down to `max_norm`.
fn clip_scale(gradients: &[f64], max_norm: Option<f64>) -> f64 {
    let Some(max_norm) = max_norm else {
        return 1.0;
    };
    let norm = gradients.iter().map(|g| g * g).sum::<f64>().sqrt();
    if norm > max_norm && norm > 0.0 {
        max_norm / norm
    } else {
        1.0
    }
}

/// Plain stochastic gradient descent.
#[derive(Debug, Default)]
pub struct SgdApplier {
    max_grad_norm: Option<f64>,
}

impl SgdApplier {
    /// Creates an SGD applier without gradient clipping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clips gradients to a global L2 norm of `max_norm` before stepping.
    pub fn with_max_grad_norm(max_norm: f64) -> Self {
        Self {
            max_grad_norm: Some(max_norm),
        }
    }
}

impl GradientApplier for SgdApplier {
    fn apply(
        &self,
        params: &SharedParameters,
        gradients: &[f64],
        learning_rate: f64,
    ) -> Result<(), A2CError> {
        check_shape(params, gradients)?;
        let scale = clip_scale(gradients, self.max_grad_norm) * learning_rate;
        params.update(|p| {
            for (w, g) in p.iter_mut().zip(gradients) {
                *w -= scale * g;
            }
        });
        Ok(())
    }

    fn name(&self) -> &str {
        "sgd"
    }
}

/// RMSProp hyperparameters.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RmsPropConfig {
    /// Decay of the running mean of squared gradients.
    pub decay: f64,
    /// Momentum coefficient (0 disables momentum).
    pub momentum: f64,
    /// Added to the root-mean-square before dividing.
    pub epsilon: f64,
    /// Global L2 norm the gradient is clipped to, if any.
    pub max_grad_norm: Option<f64>,
}

impl Default for RmsPropConfig {
    fn default() -> Self {
        Self {
            decay: 0.99,
            momentum: 0.0,
            epsilon: 0.1,
            max_grad_norm: Some(40.0),
        }
    }
}

#[derive(Debug, Default)]
struct RmsPropSlots {
    mean_square: Vec<f64>,
    momentum: Vec<f64>,
}

/// RMSProp whose running statistics are shared by every worker, like the
/// parameters themselves.
#[derive(Debug)]
pub struct RmsPropApplier {
    config: RmsPropConfig,
    slots: Mutex<RmsPropSlots>,
}

impl RmsPropApplier {
    /// Creates an applier; statistics are sized lazily on the first update.
    pub fn new(config: RmsPropConfig) -> Self {
        Self {
            config,
            slots: Mutex::new(RmsPropSlots::default()),
        }
    }

    /// Returns the hyperparameters.
    pub fn config(&self) -> &RmsPropConfig {
        &self.config
    }
}

impl Default for RmsPropApplier {
    fn default() -> Self {
        Self::new(RmsPropConfig::default())
    }
}

impl GradientApplier for RmsPropApplier {
    fn apply(
        &self,
        params: &SharedParameters,
        gradients: &[f64],
        learning_rate: f64,
    ) -> Result<(), A2CError> {
        check_shape(params, gradients)?;
        let n = gradients.len();
        let scale = clip_scale(gradients, self.config.max_grad_norm);
        let RmsPropConfig {
            decay,
            momentum,
            epsilon,
            ..
        } = self.config;

        // Slots lock is taken before the parameter lock; nothing takes them
        // in the opposite order.
        let mut slots = self.slots.lock();
        if slots.mean_square.len() != n {
            slots.mean_square = vec![0.0; n];
            slots.momentum = vec![0.0; n];
        }
        let RmsPropSlots {
            mean_square,
            momentum: mom,
        } = &mut *slots;

        params.update(|p| {
            for i in 0..n {
                let g = gradients[i] * scale;
                mean_square[i] = decay * mean_square[i] + (1.0 - decay) * g * g;
                mom[i] = momentum * mom[i] + learning_rate * g / (mean_square[i] + epsilon).sqrt();
                p[i] -= mom[i];
            }
        });
        Ok(())
    }

    fn name(&self) -> &str {
        "rmsprop"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sgd_descends_along_gradient() {
        let params = SharedParameters::new(vec![1.0, -1.0]);
        SgdApplier::new().apply(&params, &[2.0, -4.0], 0.5).unwrap();
        assert_eq!(params.snapshot(), vec![0.0, 1.0]);
    }

    #[test]
    fn zero_learning_rate_leaves_parameters() {
        let params = SharedParameters::new(vec![0.3, 0.7]);
        RmsPropApplier::default()
            .apply(&params, &[1.0, 1.0], 0.0)
            .unwrap();
        assert_eq!(params.snapshot(), vec![0.3, 0.7]);
        // The update still counts as applied.
        assert_eq!(params.version(), 1);
    }

    #[test]
    fn gradient_length_mismatch_rejected() {
        let params = SharedParameters::new(vec![0.0; 3]);
        let err = SgdApplier::new().apply(&params, &[1.0], 0.1).unwrap_err();
        assert_eq!(
            err,
            A2CError::GradientShape {
                expected: 3,
                actual: 1
            }
        );
        assert_eq!(params.version(), 0);
    }

    #[test]
    fn sgd_clips_global_norm() {
        let params = SharedParameters::new(vec![0.0, 0.0]);
        // Norm 5 clipped to 1 → unit step along (0.6, 0.8).
        SgdApplier::with_max_grad_norm(1.0)
            .apply(&params, &[3.0, 4.0], 1.0)
            .unwrap();
        let p = params.snapshot();
        assert!((p[0] + 0.6).abs() < 1e-12);
        assert!((p[1] + 0.8).abs() < 1e-12);
    }

    #[test]
    fn rmsprop_first_step_matches_formula() {
        let config = RmsPropConfig {
            max_grad_norm: None,
            ..RmsPropConfig::default()
        };
        let params = SharedParameters::new(vec![0.0]);
        RmsPropApplier::new(config)
            .apply(&params, &[2.0], 0.1)
            .unwrap();
        // ms = 0.01 * 4 = 0.04; step = 0.1 * 2 / sqrt(0.04 + 0.1)
        let expected = -(0.1 * 2.0 / (0.14f64).sqrt());
        assert!((params.snapshot()[0] - expected).abs() < 1e-12);
    }

    #[test]
    fn rmsprop_statistics_shared_across_calls() {
        let config = RmsPropConfig {
            max_grad_norm: None,
            ..RmsPropConfig::default()
        };
        let applier = RmsPropApplier::new(config);
        let params = SharedParameters::new(vec![0.0]);
        applier.apply(&params, &[1.0], 0.1).unwrap();
        let first = -params.snapshot()[0];
        applier.apply(&params, &[1.0], 0.1).unwrap();
        let second = -params.snapshot()[0] - first;
        // Growing mean square shrinks the second step.
        assert!(second < first);
    }
}
