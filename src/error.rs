use thiserror::Error;

/// Faults in the worker's configuration or its collaborators' fixed parameters.
///
/// These are fatal: a worker with a bad configuration cannot produce
/// meaningful returns, so they surface before (or instead of) a rollout.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Rollout horizon must be at least 1")]
    ZeroHorizon,

    #[error("Discount factor must lie in [0, 1], got {0}")]
    InvalidDiscount(f64),

    #[error("Initial learning rate must be finite and non-negative, got {0}")]
    InvalidLearningRate(f64),

    #[error("Maximum global step must be positive")]
    NonPositiveMaxGlobalStep,

    #[error("Performance log interval must be positive")]
    ZeroLogInterval,

    #[error("Reward clip bound must be finite and positive, got {0}")]
    InvalidRewardClip(f64),

    #[error("Score normalization constant must be finite and non-zero, got {0}")]
    InvalidScoreNormalization(f64),

    #[error("Recurrent mode is {configured} in the config but the approximator reports {approximator}")]
    RecurrentMismatch { configured: bool, approximator: bool },
}

/// Crate-wide error type.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum A2CError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Malformed action distribution: {0}")]
    MalformedDistribution(String),

    #[error("State has {actual} features, expected {expected}")]
    StateShape { expected: usize, actual: usize },

    #[error("Gradient has {actual} entries but the parameter store holds {expected}")]
    GradientShape { expected: usize, actual: usize },

    #[error("Stateful approximator returned no recurrent state snapshot")]
    MissingRecurrentState,

    #[error("Environment failure: {0}")]
    Environment(String),

    #[error("Approximator failure: {0}")]
    Approximator(String),
}
