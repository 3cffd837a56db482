//! Bootstrapped n-step returns and advantages.
//!
//! `R_i = r_i + γ R_{i+1}`, seeded with the bootstrap value past the last
//! step (0 if the episode terminated), and `A_i = R_i − V(s_i)`.

/// Computes n-step advantages and discounted returns.
///
/// # Arguments
///
/// * `rewards` - Per-step (clipped) rewards, chronological
/// * `values` - Per-step value estimates taken during the rollout
/// * `bootstrap` - Value of the state after the last step; 0 when terminal
/// * `gamma` - Discount factor
///
/// # Returns
///
/// `(advantages, returns)`, both in chronological order.
pub fn compute_returns(
    rewards: &[f64],
    values: &[f64],
    bootstrap: f64,
    gamma: f64,
) -> (Vec<f64>, Vec<f64>) {
    let n = rewards.len();
    assert_eq!(values.len(), n);

    let mut advantages = vec![0.0; n];
    let mut returns = vec![0.0; n];
    let mut running = bootstrap;

    for t in (0..n).rev() {
        running = rewards[t] + gamma * running;
        returns[t] = running;
        advantages[t] = running - values[t];
    }

    (advantages, returns)
}
