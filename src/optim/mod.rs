//! Shared parameters and the appliers that update them.

pub mod applier;
pub mod shared;

pub use applier::{GradientApplier, RmsPropApplier, RmsPropConfig, SgdApplier};
pub use shared::SharedParameters;
