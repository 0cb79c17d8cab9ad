//! Return and advantage estimation for one worker's trajectory.
//!
//! Two estimators are supported, chosen once at construction:
//!
//! - [`ReturnEstimator::Gae`]: Generalized Advantage Estimation,
//!   `A_t = Σ_l (γλ)^l δ_{t+l}` with `δ_t = r_t + γ V(s_{t+1})(1 - d_t) - V(s_t)`
//! - [`ReturnEstimator::NStep`]: one-step bootstrapped return,
//!   `R_t = r_t + γ V(s_{t+1})(1 - d_t)`
//!
//! Every `next_value` is the critic's estimate for the state actually observed
//! after step `t`, so the `(1 - d_t)` mask is the only thing standing between
//! an episode boundary and a value leaking across a reset.
//!
//! ## References
//!
//! - Schulman et al., "High-Dimensional Continuous Control Using
//!   Generalized Advantage Estimation" (2016)

/// How returns are bootstrapped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReturnEstimator {
    Gae { lambda: f32 },
    NStep,
}

impl ReturnEstimator {
    pub fn from_config(use_gae: bool, lambda: f32) -> Self {
        if use_gae {
            ReturnEstimator::Gae { lambda }
        } else {
            ReturnEstimator::NStep
        }
    }
}

/// Discounted returns and advantages, aligned with the input steps.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TrainTargets {
    pub returns: Vec<f32>,
    pub advantages: Vec<f32>,
}

/// Compute targets for a single worker's `num_step` slice.
///
/// # Arguments
///
/// * `reward` - rewards received [T]
/// * `done` - trajectory-end flags [T]
/// * `value` - V(s_t) [T]
/// * `next_value` - V(s_{t+1}) [T]
/// * `gamma` - discount factor
/// * `estimator` - GAE or plain bootstrapped return
pub fn make_train_data(
    reward: &[f32],
    done: &[bool],
    value: &[f32],
    next_value: &[f32],
    gamma: f32,
    estimator: ReturnEstimator,
) -> TrainTargets {
    let n = reward.len();
    assert_eq!(done.len(), n);
    assert_eq!(value.len(), n);
    assert_eq!(next_value.len(), n);

    let mut returns = vec![0.0f32; n];

    match estimator {
        ReturnEstimator::Gae { lambda } => {
            let mut gae = 0.0f32;
            for t in (0..n).rev() {
                let not_done = if done[t] { 0.0 } else { 1.0 };
                let delta = reward[t] + gamma * next_value[t] * not_done - value[t];
                gae = delta + gamma * lambda * not_done * gae;
                returns[t] = gae + value[t];
            }
        }
        ReturnEstimator::NStep => {
            for t in 0..n {
                let not_done = if done[t] { 0.0 } else { 1.0 };
                returns[t] = reward[t] + gamma * next_value[t] * not_done;
            }
        }
    }

    let advantages = returns.iter().zip(value).map(|(r, v)| r - v).collect();
    TrainTargets {
        returns,
        advantages,
    }
}

/// Apply [`make_train_data`] to every worker of a worker-major batch and
/// concatenate the results in the same order.
#[allow(clippy::too_many_arguments)]
pub fn make_train_data_batch(
    reward: &[f32],
    done: &[bool],
    value: &[f32],
    next_value: &[f32],
    num_worker: usize,
    num_step: usize,
    gamma: f32,
    estimator: ReturnEstimator,
) -> TrainTargets {
    let total = num_worker * num_step;
    assert_eq!(reward.len(), total);

    let mut out = TrainTargets {
        returns: Vec::with_capacity(total),
        advantages: Vec::with_capacity(total),
    };
    for w in 0..num_worker {
        let range = w * num_step..(w + 1) * num_step;
        let targets = make_train_data(
            &reward[range.clone()],
            &done[range.clone()],
            &value[range.clone()],
            &next_value[range],
            gamma,
            estimator,
        );
        out.returns.extend(targets.returns);
        out.advantages.extend(targets.advantages);
    }
    out
}

/// Standardize in place: `(x - mean) / (std + eps)`, population std.
pub fn standardize(values: &mut [f32], eps: f32) {
    if values.is_empty() {
        return;
    }
    let n = values.len() as f32;
    let mean = values.iter().sum::<f32>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / n;
    let std = var.sqrt() + eps;
    for v in values.iter_mut() {
        *v = (*v - mean) / std;
    }
}
