//! Linear learning-rate annealing against the shared global step.

/// `max(0, initial × (max_global_step − global_step) / max_global_step)`.
///
/// Recomputed from the global step on every call; nothing is advanced locally,
/// so all workers agree on the rate at a given global step.
pub fn anneal_learning_rate(initial: f64, global_step: u64, max_global_step: u64) -> f64 {
    debug_assert!(max_global_step > 0);
    let remaining = max_global_step as f64 - global_step as f64;
    let rate = initial * remaining / max_global_step as f64;
    rate.max(0.0)
}
