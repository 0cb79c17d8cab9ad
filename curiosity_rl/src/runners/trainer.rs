//! The synchronous collect-then-train loop.
//!
//! One iteration: `num_step` lock-step rounds across every worker, then a
//! single PPO/ICM update on the whole rollout. The agent and the reward
//! statistics are only touched from this thread.

use std::collections::VecDeque;

use burn::module::AutodiffModule;
use burn::optim::Optimizer;
use burn::tensor::backend::AutodiffBackend;

use crate::agent::{mean_max_prob, Agent, TrainBatch, TrainStats};
use crate::algorithms::gae::{make_train_data_batch, standardize, ReturnEstimator};
use crate::buffers::{RolloutBatch, RolloutBuffer, RolloutBufferConfig};
use crate::checkpoint::{Checkpointer, CheckpointerConfig};
use crate::core::{RewardForwardFilter, RunningMeanStd};
use crate::environment::{Game, WorkerPool};
use crate::error::TrainError;
use crate::metrics::{self, MetricsSink, MultiSink};
use crate::nn::IcmPpoNetwork;
use crate::scheduling::{scheduler_for, LRScheduler};

use super::train_config::{ConfigError, TrainingConfig};

/// Window of iterations averaged for `data/max_prob`.
const RECENT_PROB_WINDOW: usize = 10;

/// Running totals of the sample worker's current episode.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SampleEpisode {
    /// Completed episodes so far; also the metric index.
    pub episode: usize,
    pub reward: f32,
    pub intrinsic_reward: f32,
    pub steps: usize,
}

/// What one iteration did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IterationSummary {
    pub iteration: usize,
    pub global_step: usize,
    pub learning_rate: f64,
    /// Mean over the last iterations of the mean max action probability.
    pub max_prob: f32,
    pub mean_reward: f32,
    pub mean_intrinsic_reward: f32,
    pub train: TrainStats,
    pub sample_episodes: usize,
    pub checkpoint_saved: bool,
}

/// Owns the worker pool, the agent, and every piece of cross-iteration state.
pub struct Trainer<B, M, O>
where
    B: AutodiffBackend,
    M: AutodiffModule<B> + IcmPpoNetwork<B>,
    M::InnerModule: IcmPpoNetwork<B::InnerBackend>,
    O: Optimizer<M, B>,
{
    config: TrainingConfig,
    agent: Agent<B, M, O>,
    pool: WorkerPool,
    buffer: RolloutBuffer,
    states: Vec<f32>,
    estimator: ReturnEstimator,
    reward_rms: RunningMeanStd,
    reward_filter: RewardForwardFilter,
    scheduler: Box<dyn LRScheduler>,
    learning_rate: f64,
    checkpointer: Option<Checkpointer>,
    sinks: MultiSink,
    recent_prob: VecDeque<f32>,
    sample: SampleEpisode,
    global_step: usize,
    iteration: usize,
}

impl<B, M, O> Trainer<B, M, O>
where
    B: AutodiffBackend,
    M: AutodiffModule<B> + IcmPpoNetwork<B>,
    M::InnerModule: IcmPpoNetwork<B::InnerBackend>,
    O: Optimizer<M, B>,
{
    /// Validate the configuration against the agent and games, then start
    /// one worker thread per game.
    pub fn new<G: Game>(
        config: TrainingConfig,
        agent: Agent<B, M, O>,
        games: Vec<G>,
        sinks: MultiSink,
    ) -> Result<Self, TrainError> {
        config.validate()?;
        if games.len() != config.num_worker {
            return Err(ConfigError::WorkerCount {
                expected: config.num_worker,
                got: games.len(),
            }
            .into());
        }

        let pool = WorkerPool::spawn(games, config.worker_config())?;
        if pool.n_actions() != agent.n_actions() {
            return Err(ConfigError::ShapeMismatch {
                what: "action count",
                model: agent.n_actions(),
                env: pool.n_actions(),
            }
            .into());
        }
        if pool.state_len() != agent.config().state_len() {
            return Err(ConfigError::ShapeMismatch {
                what: "observation size",
                model: agent.config().state_len(),
                env: pool.state_len(),
            }
            .into());
        }

        let checkpointer = match &config.save_dir {
            Some(dir) => Some(Checkpointer::new(
                CheckpointerConfig::new(dir, config.env_id.clone())
                    .with_save_interval(config.save_interval_iterations),
            )?),
            None => None,
        };

        log::info!(
            "training {} with {} workers x {} steps, curiosity {}, life done {}",
            config.env_id,
            config.num_worker,
            config.num_step,
            if config.use_icm { "on" } else { "off" },
            if config.life_done { "on" } else { "off" },
        );

        Ok(Self {
            buffer: RolloutBuffer::new(RolloutBufferConfig {
                num_worker: config.num_worker,
                num_step: config.num_step,
                state_len: pool.state_len(),
            }),
            states: pool.initial_states().to_vec(),
            estimator: config.return_estimator(),
            reward_rms: RunningMeanStd::new(),
            reward_filter: RewardForwardFilter::new(config.gamma),
            scheduler: scheduler_for(&config),
            learning_rate: config.learning_rate,
            checkpointer,
            sinks,
            recent_prob: VecDeque::with_capacity(RECENT_PROB_WINDOW),
            sample: SampleEpisode::default(),
            global_step: 0,
            iteration: 0,
            pool,
            agent,
            config,
        })
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    pub fn agent(&self) -> &Agent<B, M, O> {
        &self.agent
    }

    pub fn global_step(&self) -> usize {
        self.global_step
    }

    pub fn iteration(&self) -> usize {
        self.iteration
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    pub fn reward_rms(&self) -> &RunningMeanStd {
        &self.reward_rms
    }

    pub fn sample_episode(&self) -> SampleEpisode {
        self.sample
    }

    /// Stop the workers and hand back the agent.
    pub fn into_agent(mut self) -> Agent<B, M, O> {
        self.pool.shutdown();
        self.sinks.flush();
        self.agent
    }

    /// Collect one rollout and train on it.
    pub fn run_iteration(&mut self) -> Result<IterationSummary, TrainError> {
        self.global_step += self.config.samples_per_iteration();

        let (mean_reward, mean_intrinsic) = self.collect_rollout()?;
        let batch = self.buffer.take_batch()?;

        let values = self.agent.forward_transition(&batch.states, &batch.next_states)?;
        let rewards = if self.config.use_icm {
            self.normalize_rewards(&batch)
        } else {
            batch.rewards.clone()
        };

        if self.recent_prob.len() == RECENT_PROB_WINDOW {
            self.recent_prob.pop_front();
        }
        self.recent_prob
            .push_back(mean_max_prob(&values.logits, self.agent.n_actions()));
        let max_prob = self.recent_prob.iter().sum::<f32>() / self.recent_prob.len() as f32;
        self.sinks
            .record(metrics::MAX_PROB, max_prob as f64, self.sample.episode);

        let mut targets = make_train_data_batch(
            &rewards,
            &batch.dones,
            &values.value,
            &values.next_value,
            batch.num_worker,
            batch.num_step,
            self.config.gamma,
            self.estimator,
        );
        if self.config.use_standardization {
            standardize(&mut targets.advantages, self.config.stable_eps);
        }

        let RolloutBatch {
            states,
            next_states,
            actions,
            ..
        } = batch;
        let train = self.agent.train_model(
            &TrainBatch {
                states,
                next_states,
                actions,
                returns: targets.returns,
                advantages: targets.advantages,
            },
            self.learning_rate,
        )?;

        if self.config.lr_schedule {
            self.learning_rate = self.scheduler.get_lr(self.global_step);
            self.sinks
                .record(metrics::LEARNING_RATE, self.learning_rate, self.sample.episode);
        }

        self.iteration += 1;
        let checkpoint_saved = self.maybe_checkpoint()?;
        self.sinks.flush();

        let summary = IterationSummary {
            iteration: self.iteration,
            global_step: self.global_step,
            learning_rate: self.learning_rate,
            max_prob,
            mean_reward,
            mean_intrinsic_reward: mean_intrinsic,
            train,
            sample_episodes: self.sample.episode,
            checkpoint_saved,
        };
        log::info!(
            "iteration {} | step {} | reward {:.4} | i-reward {:.4} | max_prob {:.3} | loss {:.4} | grad {:.3} | lr {:.2e}",
            summary.iteration,
            summary.global_step,
            summary.mean_reward,
            summary.mean_intrinsic_reward,
            summary.max_prob,
            summary.train.mean_loss,
            summary.train.mean_grad_norm,
            summary.learning_rate,
        );
        Ok(summary)
    }

    /// Loop until the step budget is spent or `max_iterations` have run.
    pub fn run(&mut self, max_iterations: Option<usize>) -> Result<Vec<IterationSummary>, TrainError> {
        let mut summaries = Vec::new();
        while self.global_step < self.config.max_step {
            if max_iterations.is_some_and(|n| summaries.len() >= n) {
                break;
            }
            summaries.push(self.run_iteration()?);
        }
        Ok(summaries)
    }

    /// `num_step` synchronous rounds into the rollout buffer.
    ///
    /// Returns the mean extrinsic and intrinsic reward per sample.
    fn collect_rollout(&mut self) -> Result<(f32, f32), TrainError> {
        let mut reward_sum = 0.0f32;
        let mut intrinsic_sum = 0.0f32;

        for _ in 0..self.config.num_step {
            let actions = self.agent.get_action(&self.states)?;
            let step = self.pool.step_all(&actions)?;

            let mut rewards: Vec<f32> = step
                .rewards
                .iter()
                .map(|r| r * self.config.reward_scale)
                .collect();
            reward_sum += rewards.iter().sum::<f32>();

            let intrinsic = if self.config.use_icm {
                let bonus = self
                    .agent
                    .compute_intrinsic_reward(&self.states, &step.next_states, &actions)?;
                for (r, i) in rewards.iter_mut().zip(&bonus) {
                    *r += i;
                }
                intrinsic_sum += bonus.iter().sum::<f32>();
                Some(bonus)
            } else {
                None
            };

            self.buffer.push_step(
                &self.states,
                &step.next_states,
                &actions,
                &rewards,
                &step.dones,
                &step.log_rewards,
            )?;

            self.track_sample(
                step.log_rewards[0],
                intrinsic.as_ref().map(|i| i[0]),
                step.natural_dones[0],
            );
            self.states = step.next_states;
        }

        let n = self.config.samples_per_iteration() as f32;
        Ok((reward_sum / n, intrinsic_sum / n))
    }

    /// Episodes of the sample worker end on game over only, not on life loss.
    fn track_sample(&mut self, log_reward: f32, intrinsic: Option<f32>, game_over: bool) {
        self.sample.reward += log_reward;
        if let Some(i) = intrinsic {
            self.sample.intrinsic_reward += i;
        }
        self.sample.steps += 1;

        if game_over {
            self.sample.episode += 1;
            let index = self.sample.episode;
            self.sinks
                .record(metrics::EPISODE_REWARD, self.sample.reward as f64, index);
            if intrinsic.is_some() {
                self.sinks.record(
                    metrics::INTRINSIC_REWARD,
                    self.sample.intrinsic_reward as f64,
                    index,
                );
            }
            self.sinks
                .record(metrics::EPISODE_STEP, self.sample.steps as f64, index);
            self.sample = SampleEpisode {
                episode: index,
                ..SampleEpisode::default()
            };
        }
    }

    /// Filter each worker's reward stream, fold the filtered values into the
    /// running moments, and divide the raw rewards by the running std.
    fn normalize_rewards(&mut self, batch: &RolloutBatch) -> Vec<f32> {
        let mut filtered = Vec::with_capacity(batch.len());
        for step_rewards in batch.rewards_time_major() {
            filtered.extend(self.reward_filter.update(&step_rewards));
        }
        self.reward_rms.update(&filtered);

        let std = self.reward_rms.var().sqrt() as f32;
        if std > 0.0 && std.is_finite() {
            batch.rewards.iter().map(|r| r / std).collect()
        } else {
            batch.rewards.clone()
        }
    }

    fn maybe_checkpoint(&self) -> Result<bool, TrainError> {
        match &self.checkpointer {
            Some(checkpointer) if checkpointer.should_save(self.iteration) => {
                checkpointer.save::<B, M>(self.agent.model())?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
