//! Policy/value approximators driven by the rollout engine.
//!
//! [`LinearActorCritic`] is always available. The tch-backed
//! [`NeuralActorCritic`] requires the `nn` feature flag.

pub mod linear;
pub mod sampling;
pub mod trait_;

#[cfg(feature = "nn")]
pub mod network;

pub use linear::LinearActorCritic;
pub use sampling::{sample_categorical, DistributionCheck};
pub use trait_::{
    ActorCritic, GradientBatch, RecurrentReplay, RecurrentSnapshot, RecurrentState,
};

#[cfg(feature = "nn")]
pub use network::NeuralActorCritic;
