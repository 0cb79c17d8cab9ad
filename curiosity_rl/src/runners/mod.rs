//! Run configuration and the training loop.
//!
//! - [`TrainingConfig`]: hyperparameters, validation, derived strategies
//! - [`Trainer`]: workers → rollout → targets → update, one iteration at a time

pub mod train_config;
pub mod trainer;

#[cfg(test)]
mod tests;

pub use train_config::{ConfigError, TrainingConfig};
pub use trainer::{IterationSummary, SampleEpisode, Trainer};
