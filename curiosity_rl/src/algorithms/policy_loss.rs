//! Categorical policy helpers and the PPO/ICM loss terms.
//!
//! Sampling works on plain probability rows so it can be driven by explicit
//! uniform draws; the loss terms are tensor functions usable on any backend.

use burn::tensor::activation::{log_softmax, softmax};
use burn::tensor::backend::Backend;
use burn::tensor::{Int, Tensor};

/// Maximum log ratio before exp() to prevent overflow.
/// exp(20) ≈ 485 million, far beyond any meaningful importance ratio.
const MAX_LOG_RATIO: f32 = 20.0;

/// Inverse-CDF categorical sampling, one uniform draw per row.
///
/// `probs` is row-major `[draws.len(), n_actions]`. Row `i` picks the first
/// action whose cumulative probability exceeds `draws[i]`; if rounding leaves
/// the total short of the draw, the last action is taken.
pub fn sample_categorical(probs: &[f32], n_actions: usize, draws: &[f32]) -> Vec<usize> {
    assert!(n_actions > 0, "need at least one action");
    assert_eq!(probs.len(), draws.len() * n_actions);

    probs
        .chunks_exact(n_actions)
        .zip(draws)
        .map(|(row, &r)| {
            let mut cumsum = 0.0f32;
            for (a, &p) in row.iter().enumerate() {
                cumsum += p;
                if cumsum > r {
                    return a;
                }
            }
            n_actions - 1
        })
        .collect()
}

/// Softmax over the action axis.
pub fn action_probs<B: Backend>(logits: Tensor<B, 2>) -> Tensor<B, 2> {
    softmax(logits, 1)
}

/// Build `[batch, 1]` gather indices from action ids.
pub fn action_indices<B: Backend>(actions: &[usize], device: &B::Device) -> Tensor<B, 2, Int> {
    let ids: Vec<i32> = actions.iter().map(|&a| a as i32).collect();
    Tensor::<B, 1, Int>::from_ints(ids.as_slice(), device).reshape([actions.len(), 1])
}

/// One-hot rows `[batch, n_actions]`.
pub fn one_hot<B: Backend>(actions: &[usize], n_actions: usize, device: &B::Device) -> Tensor<B, 2> {
    let mut data = vec![0.0f32; actions.len() * n_actions];
    for (i, &a) in actions.iter().enumerate() {
        data[i * n_actions + a] = 1.0;
    }
    Tensor::<B, 1>::from_floats(data.as_slice(), device).reshape([actions.len(), n_actions])
}

/// `log π(a|s)` for the taken actions: [batch].
pub fn categorical_log_prob<B: Backend>(
    logits: Tensor<B, 2>,
    actions: Tensor<B, 2, Int>,
) -> Tensor<B, 1> {
    log_softmax(logits, 1).gather(1, actions).flatten(0, 1)
}

/// Entropy of each row's categorical distribution: [batch].
pub fn categorical_entropy<B: Backend>(logits: Tensor<B, 2>) -> Tensor<B, 1> {
    let log_probs = log_softmax(logits, 1);
    let probs = log_probs.clone().exp();
    // H = -sum(p * log(p))
    let neg_entropy: Tensor<B, 2> = (probs * log_probs).sum_dim(1);
    -neg_entropy.flatten(0, 1)
}

/// Mean cross-entropy between logits and target classes.
pub fn cross_entropy<B: Backend>(logits: Tensor<B, 2>, targets: Tensor<B, 2, Int>) -> Tensor<B, 1> {
    -categorical_log_prob(logits, targets).mean()
}

/// PPO clipped surrogate loss.
///
/// `-mean(min(r A, clip(r, 1-ε, 1+ε) A))` with `r = exp(log π - log π_old)`.
pub fn ppo_clip_loss<B: Backend>(
    log_probs: Tensor<B, 1>,
    old_log_probs: Tensor<B, 1>,
    advantages: Tensor<B, 1>,
    clip_ratio: f32,
) -> Tensor<B, 1> {
    let log_ratio = (log_probs - old_log_probs).clamp(-MAX_LOG_RATIO, MAX_LOG_RATIO);
    let ratio = log_ratio.exp();

    let surr1 = ratio.clone() * advantages.clone();
    let surr2 = ratio.clamp(1.0 - clip_ratio, 1.0 + clip_ratio) * advantages;

    -surr1.min_pair(surr2).mean()
}

/// Mean squared error between two equally shaped tensors.
pub fn mse_loss<B: Backend, const D: usize>(
    prediction: Tensor<B, D>,
    target: Tensor<B, D>,
) -> Tensor<B, 1> {
    (prediction - target).powf_scalar(2.0).mean()
}

/// Curiosity reward: `eta * 0.5 * ||real - pred||²` per row, unclipped.
pub fn curiosity_reward<B: Backend>(
    real_next_feature: Tensor<B, 2>,
    pred_next_feature: Tensor<B, 2>,
    eta: f32,
) -> Tensor<B, 1> {
    (real_next_feature - pred_next_feature)
        .powf_scalar(2.0)
        .sum_dim(1)
        .flatten(0, 1)
        .mul_scalar(0.5 * eta)
}

/// Combined loss weights, picked from the configuration once.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LossMode {
    /// `actor + 0.5 critic + icm_scale ((1-β) inverse + β forward)`
    Curiosity { icm_scale: f32, beta: f32 },
    /// `actor + 0.5 critic - entropy_coef * entropy`
    Entropy { entropy_coef: f32 },
}

/// Weight of the critic term in both modes.
pub const CRITIC_COEF: f32 = 0.5;
