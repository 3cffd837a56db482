//! Parameter vector shared by every worker.
//!
//! Workers read snapshots and request updates; they never hold the lock
//! across a rollout. Updates from different workers may interleave in any
//! order and are computed against stale snapshots.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

/// Flat, thread-safe parameter store.
///
/// Wrap in an `Arc` to hand one store to many workers.
#[derive(Debug)]
pub struct SharedParameters {
    values: RwLock<Vec<f64>>,
    /// Number of updates applied so far.
    version: AtomicU64,
}

impl SharedParameters {
    /// Creates a store holding `initial`.
    pub fn new(initial: Vec<f64>) -> Self {
        Self {
            values: RwLock::new(initial),
            version: AtomicU64::new(0),
        }
    }

    /// Number of scalar parameters.
    pub fn len(&self) -> usize {
        self.values.read().len()
    }

    /// Returns true if the store holds no parameters.
    pub fn is_empty(&self) -> bool {
        self.values.read().is_empty()
    }

    /// Number of updates applied since construction.
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    /// Copies the current parameters into a new vector.
    pub fn snapshot(&self) -> Vec<f64> {
        self.values.read().clone()
    }

    /// Copies the current parameters into `out`, reusing its allocation.
    pub fn snapshot_into(&self, out: &mut Vec<f64>) {
        let guard = self.values.read();
        out.clear();
        out.extend_from_slice(&guard);
    }

    /// Mutates the parameters under the write lock and bumps the version.
    pub fn update<R>(&self, f: impl FnOnce(&mut [f64]) -> R) -> R {
        let mut guard = self.values.write();
        let result = f(&mut guard);
        self.version.fetch_add(1, Ordering::Release);
        result
    }
}
