//! Running statistics shared by the training loop.

pub mod running_stats;

pub use running_stats::{batch_moments, RewardForwardFilter, RunningMeanStd};
