//! The rollout-return engine: one asynchronous A2C worker.

use std::time::Instant;

use crate::approximator::{ActorCritic, GradientBatch, RecurrentReplay};
use crate::config::A2CConfig;
use crate::environment::{Environment, StepResult};
use crate::error::{A2CError, ConfigError};
use crate::metrics::PerformanceMonitor;
use crate::sink::ScoreSink;
use crate::{generate_id, Id};

use super::returns::compute_returns;
use super::schedule::anneal_learning_rate;
use super::trajectory::Trajectory;

fn check_normalization(constant: f64) -> Result<f64, ConfigError> {
    if constant == 0.0 || !constant.is_finite() {
        return Err(ConfigError::InvalidScoreNormalization(constant));
    }
    Ok(constant)
}

/// One worker of an asynchronous A2C trainer.
///
/// Owns an environment and a local approximator whose gradient updates land
/// in parameters shared with other workers. A driver calls
/// [`A2CWorker::process`] repeatedly and advances the global step by the
/// returned step count.
///
/// # Lifecycle
///
/// 1. [`A2CWorker::new`] validates the configuration and resets the environment.
/// 2. Optionally [`A2CWorker::set_start_time`] aligns throughput reports with the driver.
/// 3. Each [`A2CWorker::process`] call collects at most `horizon` steps and
///    applies exactly one gradient update.
pub struct A2CWorker<E, N> {
    id: Id,
    config: A2CConfig,
    env: E,
    network: N,
    /// Raw reward accumulated since the last episode reset.
    episode_reward: f64,
    /// Steps taken by this worker, never reset.
    local_t: u64,
    performance: PerformanceMonitor,
}

impl<E, N> A2CWorker<E, N>
where
    E: Environment,
    N: ActorCritic<E::State>,
{
    /// Creates a worker and resets `env` to a fresh episode.
    ///
    /// # Errors
    ///
    /// Returns [`A2CError::Config`] if the configuration is invalid, the
    /// environment's score normalization constant is zero or non-finite, or
    /// the configured recurrent mode disagrees with the approximator.
    pub fn new(config: A2CConfig, mut env: E, network: N) -> Result<Self, A2CError> {
        config.validate()?;
        if config.recurrent != network.is_recurrent() {
            return Err(ConfigError::RecurrentMismatch {
                configured: config.recurrent,
                approximator: network.is_recurrent(),
            }
            .into());
        }
        check_normalization(env.score_normalization())?;
        env.reset()?;

        let performance = PerformanceMonitor::new(config.performance_log_interval);
        Ok(Self {
            id: generate_id(),
            config,
            env,
            network,
            episode_reward: 0.0,
            local_t: 0,
            performance,
        })
    }

    /// Sets the instant throughput reports measure from.
    pub fn set_start_time(&mut self, start: Instant) {
        self.performance.set_start_time(start);
    }

    /// Runs one rollout and one gradient update.
    ///
    /// `global_step` is the shared step counter at call time; it drives the
    /// learning-rate schedule and log gating and is never modified here.
    ///
    /// # Returns
    ///
    /// The number of environment steps taken, between 1 and `horizon`.
    pub fn process(
        &mut self,
        global_step: u64,
        sink: &mut dyn ScoreSink,
    ) -> Result<usize, A2CError> {
        // Gradients are computed against the state the rollout started from.
        let start_state = if self.config.recurrent {
            Some(
                self.network
                    .recurrent_state_snapshot()
                    .ok_or(A2CError::MissingRecurrentState)?,
            )
        } else {
            None
        };

        let mut trajectory = Trajectory::with_capacity(self.config.horizon);
        for _ in 0..self.config.horizon {
            let state = self.env.current_state().clone();
            let (action, value) = self.network.sample_action_and_value(&state)?;
            trajectory.push_decision(state, action, value);

            let StepResult { reward, terminal } = self.env.advance(action)?;
            self.episode_reward += reward;
            trajectory.record_reward(self.config.clip_reward(reward));
            self.local_t += 1;

            if terminal {
                trajectory.mark_terminated();
                self.finish_episode(global_step, sink)?;
                break;
            }
        }

        let bootstrap = if trajectory.terminated() {
            0.0
        } else {
            self.network.value_of(self.env.current_state())?
        };

        let steps = trajectory.len();
        let terminated = trajectory.terminated();
        let (states, actions, rewards, values) = trajectory.into_parts();
        let (advantages, returns) = compute_returns(&rewards, &values, bootstrap, self.config.gamma);
        let learning_rate = anneal_learning_rate(
            self.config.initial_learning_rate,
            global_step,
            self.config.max_global_step,
        );

        self.network.apply_gradient(GradientBatch {
            states,
            actions,
            advantages,
            returns,
            learning_rate,
            recurrent: start_state.map(|snapshot| RecurrentReplay {
                snapshot,
                policy_window: steps,
                value_window: steps,
            }),
        })?;

        log::debug!(
            "[worker {}] rollout steps={} terminal={} bootstrap={:.4} lr={:.3e}",
            self.id,
            steps,
            terminated,
            bootstrap,
            learning_rate
        );

        if let Some(report) = self.performance.observe(global_step) {
            log::info!("[worker {}] {}", self.id, report);
        }

        Ok(steps)
    }

    /// Reports the finished episode and starts a new one.
    fn finish_episode(&mut self, global_step: u64, sink: &mut dyn ScoreSink) -> Result<(), A2CError> {
        let normalization = check_normalization(self.env.score_normalization())?;
        let score = self.episode_reward / normalization;
        log::info!(
            "[worker {}] episode: {}, score={}",
            self.id,
            global_step + 1,
            score
        );
        sink.record_episode_score(score, global_step);

        self.episode_reward = 0.0;
        self.env.reset()?;
        if self.config.recurrent {
            self.network.reset_recurrent_state();
        }
        Ok(())
    }

    /// Unique identifier of this worker.
    pub fn id(&self) -> &Id {
        &self.id
    }

    /// Returns the worker configuration.
    pub fn config(&self) -> &A2CConfig {
        &self.config
    }

    /// Total environment steps taken by this worker.
    pub fn local_steps(&self) -> u64 {
        self.local_t
    }

    /// Raw reward accumulated in the current episode.
    pub fn episode_reward(&self) -> f64 {
        self.episode_reward
    }

    /// Global step of the last throughput checkpoint.
    pub fn last_logged_step(&self) -> u64 {
        self.performance.last_logged_step()
    }

    /// Returns a reference to the environment.
    pub fn environment(&self) -> &E {
        &self.env
    }

    /// Returns a reference to the approximator.
    pub fn network(&self) -> &N {
        &self.network
    }
}
