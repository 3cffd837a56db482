//! Rollout collection, return computation and the worker that ties them together.

pub mod returns;
pub mod schedule;
pub mod trajectory;
pub mod worker;


pub use returns::compute_returns;
pub use schedule::anneal_learning_rate;
pub use trajectory::Trajectory;
pub use worker::A2CWorker;
