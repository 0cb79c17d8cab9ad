//! Top-level error type for a training run.

use std::fmt;
use std::io;

use crate::buffers::RolloutError;
use crate::checkpoint::CheckpointError;
use crate::environment::EnvError;
use crate::runners::ConfigError;

/// Anything that halts training.
///
/// Worker-side failures carry the worker index and the worker's step count
/// so the run can be diagnosed from the last log line.
#[derive(Debug)]
pub enum TrainError {
    /// Configuration rejected at startup.
    Config(ConfigError),
    /// Game or preprocessing failure outside a worker thread.
    Env(EnvError),
    /// A worker thread could not be started.
    Spawn { worker: usize, source: io::Error },
    /// The game inside a worker failed.
    WorkerFailed {
        worker: usize,
        step: usize,
        message: String,
    },
    /// A worker thread died or dropped its channel.
    WorkerDisconnected { worker: usize, step: usize },
    /// Number of actions does not match the number of workers.
    ActionCount { expected: usize, got: usize },
    /// Action id outside `[0, n_actions)`.
    InvalidAction { action: usize, n_actions: usize },
    /// Loss became NaN or infinite during optimization.
    NumericalInstability {
        epoch: usize,
        minibatch: usize,
        loss: f32,
    },
    /// Tensor data could not be read back.
    Tensor(String),
    /// Rollout shapes inconsistent.
    Rollout(RolloutError),
    /// Saving or loading the model failed.
    Checkpoint(CheckpointError),
}

impl fmt::Display for TrainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrainError::Config(e) => write!(f, "invalid configuration: {}", e),
            TrainError::Env(e) => write!(f, "environment error: {}", e),
            TrainError::Spawn { worker, source } => {
                write!(f, "failed to spawn worker {}: {}", worker, source)
            }
            TrainError::WorkerFailed {
                worker,
                step,
                message,
            } => write!(f, "worker {} failed at step {}: {}", worker, step, message),
            TrainError::WorkerDisconnected { worker, step } => {
                write!(f, "worker {} disconnected at step {}", worker, step)
            }
            TrainError::ActionCount { expected, got } => {
                write!(f, "expected {} actions, got {}", expected, got)
            }
            TrainError::InvalidAction { action, n_actions } => {
                write!(f, "action {} out of range [0, {})", action, n_actions)
            }
            TrainError::NumericalInstability {
                epoch,
                minibatch,
                loss,
            } => write!(
                f,
                "non-finite loss {} at epoch {} minibatch {}",
                loss, epoch, minibatch
            ),
            TrainError::Tensor(msg) => write!(f, "tensor data error: {}", msg),
            TrainError::Rollout(e) => write!(f, "rollout error: {}", e),
            TrainError::Checkpoint(e) => write!(f, "checkpoint error: {}", e),
        }
    }
}

impl std::error::Error for TrainError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TrainError::Config(e) => Some(e),
            TrainError::Env(e) => Some(e),
            TrainError::Spawn { source, .. } => Some(source),
            TrainError::Rollout(e) => Some(e),
            TrainError::Checkpoint(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for TrainError {
    fn from(e: ConfigError) -> Self {
        TrainError::Config(e)
    }
}

impl From<EnvError> for TrainError {
    fn from(e: EnvError) -> Self {
        TrainError::Env(e)
    }
}

impl From<RolloutError> for TrainError {
    fn from(e: RolloutError) -> Self {
        TrainError::Rollout(e)
    }
}

impl From<CheckpointError> for TrainError {
    fn from(e: CheckpointError) -> Self {
        TrainError::Checkpoint(e)
    }
}
