//! a2c_worker - one worker of an asynchronous Advantage Actor-Critic trainer.
//!
//! Collects fixed-horizon rollouts, computes bootstrapped n-step returns and
//! advantages, anneals the learning rate from a shared global step, and
//! applies one gradient update per call to parameters shared by all workers.

pub mod approximator;
pub mod config;
pub mod environment;
pub mod error;
pub mod metrics;
pub mod optim;
pub mod sink;
pub mod training;

pub use approximator::{ActorCritic, DistributionCheck, GradientBatch, LinearActorCritic};
pub use config::A2CConfig;
pub use environment::{Environment, StepResult};
pub use error::{A2CError, ConfigError};
pub use optim::{GradientApplier, RmsPropApplier, SgdApplier, SharedParameters};
pub use sink::{ScalarFeed, ScoreSink, SummarySink, SummaryWriter};
pub use training::A2CWorker;

/// Identifier type used for workers.
pub type Id = String;

/// Generates a new unique identifier (UUID v4).
pub fn generate_id() -> Id {
    uuid::Uuid::new_v4().to_string()
}
