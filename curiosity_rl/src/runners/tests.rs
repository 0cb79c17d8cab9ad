//! Trainer behavior against a small deterministic corridor game.

use burn::backend::{Autodiff, NdArray};
use burn::optim::{AdamConfig, Optimizer};
use tempfile::tempdir;

use super::*;
use crate::agent::{Agent, AgentConfig};
use crate::environment::{EnvError, Game, GameInfo, GameStep, RgbFrame};
use crate::error::TrainError;
use crate::metrics::{self, MemorySink, MultiSink};
use crate::nn::IcmPpoModel;

type B = Autodiff<NdArray<f32>>;

/// Walks right by the action index; the episode ends after `episode_len` steps.
/// With `lose_life_at` set, a life is lost from that step on.
struct CorridorGame {
    pos: i32,
    steps: usize,
    episode_len: usize,
    n_actions: usize,
    lose_life_at: Option<usize>,
}

impl CorridorGame {
    fn new(episode_len: usize) -> Self {
        Self {
            pos: 0,
            steps: 0,
            episode_len,
            n_actions: 3,
            lose_life_at: None,
        }
    }

    fn frame(&self) -> RgbFrame {
        let level = ((self.pos * 20) % 255) as u8;
        RgbFrame::solid(36, 36, [level, level / 2, 255 - level])
    }
}

impl Game for CorridorGame {
    fn reset(&mut self) -> Result<RgbFrame, EnvError> {
        self.pos = 0;
        self.steps = 0;
        Ok(self.frame())
    }

    fn step(&mut self, action: usize) -> Result<GameStep, EnvError> {
        self.pos += action as i32;
        self.steps += 1;
        let life = match self.lose_life_at {
            Some(at) if self.steps >= at => 2,
            _ => 3,
        };
        Ok(GameStep {
            frame: self.frame(),
            reward: action as f32,
            done: self.steps >= self.episode_len,
            info: GameInfo {
                life,
                stage: 1,
                x_pos: self.pos * 10,
                flag_get: false,
            },
        })
    }

    fn n_actions(&self) -> usize {
        self.n_actions
    }

    fn id(&self) -> &str {
        "corridor"
    }
}

fn small_config() -> TrainingConfig {
    TrainingConfig::new()
        .with_env_id("Corridor-v0")
        .with_num_worker(2)
        .with_num_step(4)
        .with_batch_size(4)
        .with_epoch(2)
        .with_history(2)
        .with_frame_size(36, 36)
        .with_network(16, 8)
}

fn agent_for(
    config: &TrainingConfig,
    n_actions: usize,
) -> Agent<B, IcmPpoModel<B>, impl Optimizer<IcmPpoModel<B>, B>> {
    let device = Default::default();
    let model = config.model_config(n_actions).init::<B>(&device);
    Agent::new(
        model,
        AdamConfig::new().init(),
        AgentConfig::from_training(config),
        device,
    )
    .unwrap()
}

fn games(n: usize, episode_len: usize) -> Vec<CorridorGame> {
    (0..n).map(|_| CorridorGame::new(episode_len)).collect()
}

fn spawn_trainer(
    config: TrainingConfig,
    episode_len: usize,
) -> (Trainer<B, IcmPpoModel<B>, impl Optimizer<IcmPpoModel<B>, B>>, MemorySink) {
    let memory = MemorySink::new();
    let agent = agent_for(&config, 3);
    let n = config.num_worker;
    let trainer = Trainer::new(
        config,
        agent,
        games(n, episode_len),
        MultiSink::new().add(memory.clone()),
    )
    .unwrap();
    (trainer, memory)
}

#[test]
fn test_rejects_wrong_number_of_games() {
    let config = small_config();
    let agent = agent_for(&config, 3);
    let result = Trainer::new(config, agent, games(3, 5), MultiSink::new());
    assert!(matches!(
        result,
        Err(TrainError::Config(ConfigError::WorkerCount {
            expected: 2,
            got: 3
        }))
    ));
}

#[test]
fn test_rejects_action_space_mismatch() {
    let config = small_config();
    let agent = agent_for(&config, 4);
    let result = Trainer::new(config, agent, games(2, 5), MultiSink::new());
    assert!(matches!(
        result,
        Err(TrainError::Config(ConfigError::ShapeMismatch {
            what: "action count",
            ..
        }))
    ));
}

#[test]
fn test_rejects_invalid_config() {
    let config = small_config().with_batch_size(64);
    let agent = agent_for(&small_config(), 3);
    let result = Trainer::new(config, agent, games(2, 5), MultiSink::new());
    assert!(matches!(
        result,
        Err(TrainError::Config(ConfigError::InvalidMinibatch { .. }))
    ));
}

#[test]
fn test_iteration_with_curiosity() {
    let (mut trainer, memory) = spawn_trainer(small_config(), 5);
    let summary = trainer.run_iteration().unwrap();

    assert_eq!(summary.iteration, 1);
    assert_eq!(summary.global_step, 8);
    // 8 samples / batch 4 = 2 minibatches, 2 epochs
    assert_eq!(summary.train.updates, 4);
    assert!(summary.max_prob > 0.0 && summary.max_prob <= 1.0);
    assert!(summary.mean_intrinsic_reward >= 0.0);
    assert!(trainer.reward_rms().count() > 1.0);
    assert_eq!(memory.series(metrics::MAX_PROB).len(), 1);
}

#[test]
fn test_iteration_without_curiosity() {
    let config = small_config().with_icm(false).with_life_done(false);
    let (mut trainer, memory) = spawn_trainer(config, 5);
    let summary = trainer.run_iteration().unwrap();

    assert_eq!(summary.mean_intrinsic_reward, 0.0);
    assert!(trainer.reward_rms().count() < 1.0);
    assert!(memory.series(metrics::INTRINSIC_REWARD).is_empty());
}

#[test]
fn test_sample_worker_episode_metrics() {
    let config = small_config().with_icm(false).with_num_step(4);
    let (mut trainer, memory) = spawn_trainer(config, 3);
    trainer.run_iteration().unwrap();

    // Episodes of 3 steps: one finished within 4 rounds, one step into the next.
    assert_eq!(memory.series(metrics::EPISODE_STEP), vec![(1, 3.0)]);
    assert_eq!(memory.series(metrics::EPISODE_REWARD).len(), 1);
    let sample = trainer.sample_episode();
    assert_eq!(sample.episode, 1);
    assert_eq!(sample.steps, 1);
}

#[test]
fn test_life_loss_does_not_end_sample_episode() {
    let config = small_config()
        .with_icm(false)
        .with_life_done(true)
        .with_num_step(4);
    let memory = MemorySink::new();
    let agent = agent_for(&config, 3);
    let corridors: Vec<CorridorGame> = (0..config.num_worker)
        .map(|_| CorridorGame {
            lose_life_at: Some(2),
            ..CorridorGame::new(5)
        })
        .collect();
    let mut trainer =
        Trainer::new(config, agent, corridors, MultiSink::new().add(memory.clone())).unwrap();
    trainer.run_iteration().unwrap();

    // Two life losses per worker, no game over.
    assert!(memory.series(metrics::EPISODE_STEP).is_empty());
    assert!(memory.series(metrics::EPISODE_REWARD).is_empty());
    let sample = trainer.sample_episode();
    assert_eq!(sample.episode, 0);
    assert_eq!(sample.steps, 4);
}

#[test]
fn test_run_stops_at_iteration_limit_and_step_budget() {
    let (mut trainer, memory) = spawn_trainer(small_config(), 5);
    let summaries = trainer.run(Some(2)).unwrap();
    assert_eq!(summaries.len(), 2);
    assert_eq!(trainer.global_step(), 16);
    assert_eq!(memory.series(metrics::MAX_PROB).len(), 2);

    let (mut trainer, _) = trainer_with_budget(24);
    let summaries = trainer.run(None).unwrap();
    assert_eq!(summaries.len(), 3);
    assert_eq!(trainer.iteration(), 3);
}

fn trainer_with_budget(
    max_step: usize,
) -> (Trainer<B, IcmPpoModel<B>, impl Optimizer<IcmPpoModel<B>, B>>, MemorySink) {
    spawn_trainer(small_config().with_icm(false).with_max_step(max_step), 5)
}

#[test]
fn test_linear_lr_schedule() {
    let config = small_config()
        .with_icm(false)
        .with_lr_schedule(true)
        .with_learning_rate(1e-3)
        .with_max_step(80);
    let (mut trainer, memory) = spawn_trainer(config, 5);
    let summary = trainer.run_iteration().unwrap();

    // 8 of 80 steps spent
    assert!((summary.learning_rate - 9e-4).abs() < 1e-12);
    assert_eq!(memory.series(metrics::LEARNING_RATE).len(), 1);
}

#[test]
fn test_periodic_checkpoint() {
    let dir = tempdir().unwrap();
    let config = small_config()
        .with_icm(false)
        .with_save_dir(dir.path())
        .with_save_interval(2);
    let (mut trainer, _) = spawn_trainer(config, 5);

    assert!(!trainer.run_iteration().unwrap().checkpoint_saved);
    assert!(trainer.run_iteration().unwrap().checkpoint_saved);

    let saved: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
    assert_eq!(saved.len(), 1);
}
