use burn::module::AutodiffModule;
use burn::optim::{GradientsParams, Optimizer};
use burn::tensor::backend::{AutodiffBackend, Backend};
use burn::tensor::{ElementConversion, Tensor};
use rand::seq::SliceRandom;

use crate::algorithms::policy_loss::{
    action_indices, action_probs, categorical_entropy, categorical_log_prob, cross_entropy,
    curiosity_reward, mse_loss, one_hot, ppo_clip_loss, sample_categorical, LossMode, CRITIC_COEF,
};
use crate::error::TrainError;
use crate::nn::{clip_grad_norm, IcmPpoNetwork};
use crate::runners::{ConfigError, TrainingConfig};

/// Optimization settings the agent needs from the run configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentConfig {
    /// Observation shape `[history, height, width]`.
    pub state_shape: [usize; 3],
    pub ppo_eps: f32,
    pub epoch: usize,
    pub batch_size: usize,
    pub clip_grad_norm: f32,
    pub eta: f32,
    pub loss_mode: LossMode,
}

impl AgentConfig {
    pub fn from_training(config: &TrainingConfig) -> Self {
        Self {
            state_shape: [config.history, config.frame_height, config.frame_width],
            ppo_eps: config.ppo_eps,
            epoch: config.epoch,
            batch_size: config.batch_size,
            clip_grad_norm: config.clip_grad_norm,
            eta: config.eta,
            loss_mode: config.loss_mode(),
        }
    }

    pub fn state_len(&self) -> usize {
        self.state_shape.iter().product()
    }
}

/// Critic values for both ends of each transition plus the current policy
/// scores, all flattened row-major.
#[derive(Debug, Clone, Default)]
pub struct TransitionValues {
    pub value: Vec<f32>,
    pub next_value: Vec<f32>,
    /// `[N, n_actions]`
    pub logits: Vec<f32>,
}

/// One rollout's training inputs in worker-major order.
#[derive(Debug, Clone, Default)]
pub struct TrainBatch {
    pub states: Vec<f32>,
    pub next_states: Vec<f32>,
    pub actions: Vec<usize>,
    pub returns: Vec<f32>,
    pub advantages: Vec<f32>,
}

impl TrainBatch {
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

/// Summary of one `train_model` call.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TrainStats {
    pub updates: usize,
    pub mean_loss: f32,
    pub mean_grad_norm: f32,
    /// Updates whose gradient norm exceeded the cap.
    pub clipped: usize,
}

/// PPO agent with an optional intrinsic curiosity module.
///
/// Rollout-time evaluation runs on the inner (non-autodiff) copy of the
/// model; only [`Agent::train_model`] records gradients.
pub struct Agent<B, M, O>
where
    B: AutodiffBackend,
    M: AutodiffModule<B> + IcmPpoNetwork<B>,
    M::InnerModule: IcmPpoNetwork<B::InnerBackend>,
    O: Optimizer<M, B>,
{
    model: M,
    optimizer: O,
    config: AgentConfig,
    n_actions: usize,
    device: B::Device,
}

impl<B, M, O> Agent<B, M, O>
where
    B: AutodiffBackend,
    M: AutodiffModule<B> + IcmPpoNetwork<B>,
    M::InnerModule: IcmPpoNetwork<B::InnerBackend>,
    O: Optimizer<M, B>,
{
    pub fn new(model: M, optimizer: O, config: AgentConfig, device: B::Device) -> Result<Self, TrainError> {
        if matches!(config.loss_mode, LossMode::Curiosity { .. }) && !model.has_curiosity() {
            return Err(ConfigError::MissingCuriosity.into());
        }
        if config.batch_size == 0 {
            return Err(ConfigError::InvalidCount {
                field: "batch_size",
                value: 0,
            }
            .into());
        }
        let n_actions = model.n_actions();
        Ok(Self {
            model,
            optimizer,
            config,
            n_actions,
            device,
        })
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn n_actions(&self) -> usize {
        self.n_actions
    }

    pub fn device(&self) -> &B::Device {
        &self.device
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn into_model(self) -> M {
        self.model
    }

    pub fn set_model(&mut self, model: M) {
        self.model = model;
    }

    /// Sample one action per observation with a fresh uniform draw each.
    pub fn get_action(&self, states: &[f32]) -> Result<Vec<usize>, TrainError> {
        let rows = self.rows(states, "states")?;
        let draws: Vec<f32> = (0..rows).map(|_| fastrand::f32()).collect();
        self.get_action_with_draws(states, &draws)
    }

    /// Inverse-CDF sampling against caller-provided draws in `[0, 1)`.
    pub fn get_action_with_draws(&self, states: &[f32], draws: &[f32]) -> Result<Vec<usize>, TrainError> {
        let rows = self.rows(states, "states")?;
        if draws.len() != rows {
            return Err(TrainError::ActionCount {
                expected: rows,
                got: draws.len(),
            });
        }
        let probs = self.action_probabilities(states)?;
        Ok(sample_categorical(&probs, self.n_actions, draws))
    }

    /// Softmax policy `[N, n_actions]`, flattened.
    pub fn action_probabilities(&self, states: &[f32]) -> Result<Vec<f32>, TrainError> {
        let model = self.model.valid();
        let mut probs = Vec::with_capacity(self.rows(states, "states")? * self.n_actions);
        for chunk in states.chunks(self.config.batch_size * self.config.state_len()) {
            let (logits, _) = model.policy_value(self.obs_tensor::<B::InnerBackend>(chunk));
            probs.extend(to_vec(action_probs(logits))?);
        }
        Ok(probs)
    }

    /// Curiosity bonus `eta * 0.5 * ||phi(s') - f(phi(s), a)||²` per sample.
    ///
    /// All zeros when the network has no curiosity module.
    pub fn compute_intrinsic_reward(
        &self,
        states: &[f32],
        next_states: &[f32],
        actions: &[usize],
    ) -> Result<Vec<f32>, TrainError> {
        let rows = self.rows(states, "states")?;
        self.expect_rows(next_states, rows, "next_states")?;
        if actions.len() != rows {
            return Err(TrainError::ActionCount {
                expected: rows,
                got: actions.len(),
            });
        }
        self.check_actions(actions)?;

        let model = self.model.valid();
        if !model.has_curiosity() {
            return Ok(vec![0.0; rows]);
        }

        let state_len = self.config.state_len();
        let chunk_rows = self.config.batch_size;
        let mut rewards = Vec::with_capacity(rows);
        for start in (0..rows).step_by(chunk_rows) {
            let end = (start + chunk_rows).min(rows);
            let state = self.obs_tensor::<B::InnerBackend>(&states[start * state_len..end * state_len]);
            let next = self.obs_tensor::<B::InnerBackend>(&next_states[start * state_len..end * state_len]);
            let action = one_hot::<B::InnerBackend>(&actions[start..end], self.n_actions, &self.device);
            if let Some(out) = model.curiosity(state, next, action) {
                rewards.extend(to_vec(curiosity_reward(
                    out.real_next_feature,
                    out.pred_next_feature,
                    self.config.eta,
                ))?);
            }
        }
        Ok(rewards)
    }

    /// Values of both states and the policy scores of the current state.
    pub fn forward_transition(&self, states: &[f32], next_states: &[f32]) -> Result<TransitionValues, TrainError> {
        let rows = self.rows(states, "states")?;
        self.expect_rows(next_states, rows, "next_states")?;

        let model = self.model.valid();
        let chunk = self.config.batch_size * self.config.state_len();
        let mut out = TransitionValues {
            value: Vec::with_capacity(rows),
            next_value: Vec::with_capacity(rows),
            logits: Vec::with_capacity(rows * self.n_actions),
        };
        for (state, next) in states.chunks(chunk).zip(next_states.chunks(chunk)) {
            let (logits, value) = model.policy_value(self.obs_tensor::<B::InnerBackend>(state));
            let (_, next_value) = model.policy_value(self.obs_tensor::<B::InnerBackend>(next));
            out.logits.extend(to_vec(logits)?);
            out.value.extend(to_vec(value)?);
            out.next_value.extend(to_vec(next_value)?);
        }
        Ok(out)
    }

    /// Run `epoch` passes of minibatch PPO (plus ICM) over one rollout.
    ///
    /// Old log-probabilities are taken once before the first update and held
    /// fixed for every epoch.
    pub fn train_model(&mut self, batch: &TrainBatch, lr: f64) -> Result<TrainStats, TrainError> {
        let n = batch.len();
        self.expect_rows(&batch.states, n, "states")?;
        self.expect_rows(&batch.next_states, n, "next_states")?;
        if batch.returns.len() != n || batch.advantages.len() != n {
            return Err(TrainError::ActionCount {
                expected: n,
                got: batch.returns.len().min(batch.advantages.len()),
            });
        }
        self.check_actions(&batch.actions)?;

        let old_log_probs = self.log_probs(&batch.states, &batch.actions)?;

        let bs = self.config.batch_size;
        let state_len = self.config.state_len();
        let n_minibatches = n / bs;
        let mut indices: Vec<usize> = (0..n).collect();
        let mut model = self.model.clone();
        let mut stats = TrainStats::default();
        let mut loss_sum = 0.0f32;
        let mut norm_sum = 0.0f32;

        for epoch in 0..self.config.epoch {
            indices.shuffle(&mut rand::thread_rng());

            for minibatch in 0..n_minibatches {
                let idx = &indices[minibatch * bs..(minibatch + 1) * bs];

                let states = gather_rows(&batch.states, idx, state_len);
                let next_states = gather_rows(&batch.next_states, idx, state_len);
                let actions: Vec<usize> = idx.iter().map(|&i| batch.actions[i]).collect();
                let returns: Vec<f32> = idx.iter().map(|&i| batch.returns[i]).collect();
                let advantages: Vec<f32> = idx.iter().map(|&i| batch.advantages[i]).collect();
                let old: Vec<f32> = idx.iter().map(|&i| old_log_probs[i]).collect();

                let obs = self.obs_tensor::<B>(&states);
                let action_idx = action_indices::<B>(&actions, &self.device);
                let (logits, value) = model.policy_value(obs.clone());

                let log_probs = categorical_log_prob(logits.clone(), action_idx.clone());
                let actor_loss = ppo_clip_loss(
                    log_probs,
                    Tensor::from_floats(old.as_slice(), &self.device),
                    Tensor::from_floats(advantages.as_slice(), &self.device),
                    self.config.ppo_eps,
                );
                let critic_loss = mse_loss(
                    value.sum_dim(1).flatten::<1>(0, 1),
                    Tensor::from_floats(returns.as_slice(), &self.device),
                );
                let base = actor_loss + critic_loss.mul_scalar(CRITIC_COEF);

                let loss = match self.config.loss_mode {
                    LossMode::Curiosity { icm_scale, beta } => {
                        let next_obs = self.obs_tensor::<B>(&next_states);
                        let action_one_hot = one_hot::<B>(&actions, self.n_actions, &self.device);
                        match model.curiosity(obs, next_obs, action_one_hot) {
                            Some(out) => {
                                let inverse_loss = cross_entropy(out.pred_action_logits, action_idx);
                                let forward_loss =
                                    mse_loss(out.pred_next_feature, out.real_next_feature.detach());
                                base + (inverse_loss.mul_scalar(1.0 - beta)
                                    + forward_loss.mul_scalar(beta))
                                .mul_scalar(icm_scale)
                            }
                            None => base,
                        }
                    }
                    LossMode::Entropy { entropy_coef } => {
                        base - categorical_entropy(logits).mean().mul_scalar(entropy_coef)
                    }
                };

                let loss_value: f32 = loss.clone().into_scalar().elem();
                if !loss_value.is_finite() {
                    log::error!(
                        "non-finite loss {} at epoch {} minibatch {}",
                        loss_value,
                        epoch,
                        minibatch
                    );
                    return Err(TrainError::NumericalInstability {
                        epoch,
                        minibatch,
                        loss: loss_value,
                    });
                }

                let grads = loss.backward();
                let mut grads = GradientsParams::from_grads(grads, &model);
                let (clipped_model, norm) =
                    clip_grad_norm::<B, M>(model, &mut grads, self.config.clip_grad_norm);
                if norm > self.config.clip_grad_norm {
                    stats.clipped += 1;
                }
                if !norm.is_finite() || norm > 10.0 * self.config.clip_grad_norm {
                    log::warn!(
                        "gradient norm {:.3} clipped to {} (epoch {} minibatch {})",
                        norm,
                        self.config.clip_grad_norm,
                        epoch,
                        minibatch
                    );
                }
                model = self.optimizer.step(lr, clipped_model, grads);

                log::debug!(
                    "epoch {} minibatch {}: loss={:.5} grad_norm={:.4}",
                    epoch,
                    minibatch,
                    loss_value,
                    norm
                );
                stats.updates += 1;
                loss_sum += loss_value;
                norm_sum += norm;
            }
        }

        self.model = model;
        if stats.updates > 0 {
            stats.mean_loss = loss_sum / stats.updates as f32;
            stats.mean_grad_norm = norm_sum / stats.updates as f32;
        }
        Ok(stats)
    }

    /// `log π_old(a|s)` for every sample, without gradient.
    fn log_probs(&self, states: &[f32], actions: &[usize]) -> Result<Vec<f32>, TrainError> {
        let model = self.model.valid();
        let state_len = self.config.state_len();
        let chunk_rows = self.config.batch_size;
        let mut out = Vec::with_capacity(actions.len());
        for start in (0..actions.len()).step_by(chunk_rows) {
            let end = (start + chunk_rows).min(actions.len());
            let obs = self.obs_tensor::<B::InnerBackend>(&states[start * state_len..end * state_len]);
            let (logits, _) = model.policy_value(obs);
            let idx = action_indices::<B::InnerBackend>(&actions[start..end], &self.device);
            out.extend(to_vec(categorical_log_prob(logits, idx))?);
        }
        Ok(out)
    }

    fn check_actions(&self, actions: &[usize]) -> Result<(), TrainError> {
        match actions.iter().find(|&&a| a >= self.n_actions) {
            Some(&action) => Err(TrainError::InvalidAction {
                action,
                n_actions: self.n_actions,
            }),
            None => Ok(()),
        }
    }

    fn obs_tensor<BB: Backend<Device = B::Device>>(&self, flat: &[f32]) -> Tensor<BB, 4> {
        let [h, height, width] = self.config.state_shape;
        let rows = flat.len() / self.config.state_len();
        Tensor::<BB, 1>::from_floats(flat, &self.device).reshape([rows, h, height, width])
    }

    fn rows(&self, flat: &[f32], field: &'static str) -> Result<usize, TrainError> {
        let state_len = self.config.state_len();
        if flat.len() % state_len != 0 {
            return Err(TrainError::Rollout(crate::buffers::RolloutError::ShapeMismatch {
                field,
                expected: (flat.len() / state_len + 1) * state_len,
                got: flat.len(),
            }));
        }
        Ok(flat.len() / state_len)
    }

    fn expect_rows(&self, flat: &[f32], rows: usize, field: &'static str) -> Result<(), TrainError> {
        let expected = rows * self.config.state_len();
        if flat.len() != expected {
            return Err(TrainError::Rollout(crate::buffers::RolloutError::ShapeMismatch {
                field,
                expected,
                got: flat.len(),
            }));
        }
        Ok(())
    }
}

/// Mean over rows of the largest action probability.
pub(crate) fn mean_max_prob(logits: &[f32], n_actions: usize) -> f32 {
    if n_actions == 0 || logits.is_empty() {
        return 0.0;
    }
    let rows = logits.chunks_exact(n_actions);
    let count = rows.len();
    let total: f32 = rows
        .map(|row| {
            let max = row.iter().copied().fold(f32::NEG_INFINITY, f32::max);
            let denom: f32 = row.iter().map(|&l| (l - max).exp()).sum();
            1.0 / denom
        })
        .sum();
    total / count as f32
}

fn gather_rows(data: &[f32], idx: &[usize], row_len: usize) -> Vec<f32> {
    idx.iter()
        .flat_map(|&i| &data[i * row_len..(i + 1) * row_len])
        .copied()
        .collect()
}

fn to_vec<BB: Backend, const D: usize>(tensor: Tensor<BB, D>) -> Result<Vec<f32>, TrainError> {
    tensor
        .into_data()
        .to_vec::<f32>()
        .map_err(|e| TrainError::Tensor(format!("{:?}", e)))
}
