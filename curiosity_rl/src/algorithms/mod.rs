//! Return estimation and the PPO/ICM loss terms.

pub mod gae;
pub mod policy_loss;

#[cfg(test)]
mod tests;

pub use gae::{make_train_data, make_train_data_batch, standardize, ReturnEstimator, TrainTargets};
pub use policy_loss::{
    action_indices, action_probs, categorical_entropy, categorical_log_prob, cross_entropy,
    curiosity_reward, mse_loss, one_hot, ppo_clip_loss, sample_categorical, LossMode,
    CRITIC_COEF,
};
