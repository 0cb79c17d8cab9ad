//! The learner side of the pipeline: action selection, intrinsic reward,
//! value evaluation and the PPO/ICM optimization step.

mod agent;

#[cfg(test)]
mod tests;

pub use agent::{Agent, AgentConfig, TrainBatch, TrainStats, TransitionValues};

pub(crate) use agent::mean_max_prob;
