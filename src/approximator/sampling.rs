//! Categorical sampling over a policy head's probability vector.

use rand::Rng;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::A2CError;

/// Allowed deviation of a distribution's sum from 1.
pub const SUM_TOLERANCE: f64 = 1e-6;

/// What to do with a distribution whose sum is off by more than [`SUM_TOLERANCE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum DistributionCheck {
    /// Divide by the sum and sample anyway.
    Renormalize,
    /// Fail with [`A2CError::MalformedDistribution`].
    #[default]
    Reject,
}

/// Draws an index from `probs`.
///
/// Empty, negative, non-finite or all-zero vectors are always rejected; a
/// vector summing to something other than 1 is handled according to `check`.
pub fn sample_categorical<R: Rng>(
    probs: &[f64],
    rng: &mut R,
    check: DistributionCheck,
) -> Result<usize, A2CError> {
    if probs.is_empty() {
        return Err(A2CError::MalformedDistribution(
            "empty probability vector".into(),
        ));
    }
    if let Some(p) = probs.iter().find(|p| !p.is_finite() || **p < 0.0) {
        return Err(A2CError::MalformedDistribution(format!(
            "invalid probability {}",
            p
        )));
    }

    let total: f64 = probs.iter().sum();
    if total <= 0.0 {
        return Err(A2CError::MalformedDistribution(
            "probabilities sum to zero".into(),
        ));
    }
    if (total - 1.0).abs() > SUM_TOLERANCE {
        match check {
            DistributionCheck::Reject => {
                return Err(A2CError::MalformedDistribution(format!(
                    "probabilities sum to {}",
                    total
                )));
            }
            DistributionCheck::Renormalize => {
                log::warn!("Renormalizing action distribution summing to {}", total);
            }
        }
    }

    // Scaling the draw by the total renormalizes without allocating.
    let u = rng.gen::<f64>() * total;
    let mut cumulative = 0.0;
    for (i, p) in probs.iter().enumerate() {
        cumulative += p;
        if u < cumulative {
            return Ok(i);
        }
    }
    // Rounding can leave u just above the final cumulative sum.
    Ok(probs.iter().rposition(|p| *p > 0.0).unwrap_or(probs.len() - 1))
}
