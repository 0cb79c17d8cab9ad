//! # curiosity_rl: PPO with an Intrinsic Curiosity Module
//!
//! Trains a discrete-action agent on a side-scrolling platform game, using
//! PPO for the policy and an ICM prediction error as exploration bonus.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                          Trainer (1 thread)                       │
//! │                                                                   │
//! │   actions ──► WorkerPool ──► StepBatch ──► RolloutBuffer          │
//! │      ▲          │  │  │                        │ take_batch       │
//! │      │       worker threads (one game each)    ▼                  │
//! │    Agent ◄── train_model ◄── GAE ◄── reward filter + RMS          │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each round is a full barrier: every worker receives one action and the
//! trainer waits for every reply before the next round. Model parameters
//! and reward statistics are only mutated by the trainer thread.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use curiosity_rl::{Agent, AgentConfig, MultiSink, LogSink, Trainer, TrainingConfig};
//! use burn::optim::AdamConfig;
//!
//! let config = TrainingConfig::new().with_num_worker(8).build()?;
//! let model = config.model_config(n_actions).init(&device);
//! let agent = Agent::new(model, AdamConfig::new().init(), AgentConfig::from_training(&config), device)?;
//! let mut trainer = Trainer::new(config, agent, games, MultiSink::new().add(LogSink))?;
//! trainer.run(None)?;
//! ```

pub mod agent;
pub mod algorithms;
pub mod buffers;
pub mod checkpoint;
pub mod core;
pub mod environment;
pub mod error;
pub mod metrics;
pub mod nn;
pub mod runners;
pub mod scheduling;

pub use agent::{Agent, AgentConfig, TrainBatch, TrainStats, TransitionValues};
pub use algorithms::{make_train_data, LossMode, ReturnEstimator, TrainTargets};
pub use buffers::{RolloutBatch, RolloutBuffer, RolloutBufferConfig, RolloutError};
pub use checkpoint::{CheckpointError, Checkpointer, CheckpointerConfig};
pub use crate::core::{RewardForwardFilter, RunningMeanStd};
pub use environment::{
    EnvError, FramePreprocessor, Game, GameInfo, GameStep, ObservationHistory, RewardShaping,
    RgbFrame, TerminationPolicy, WorkerConfig, WorkerPool,
};
pub use error::TrainError;
pub use metrics::{CsvSink, LogSink, MemorySink, MetricsSink, MultiSink};
pub use nn::{IcmPpoModel, IcmPpoModelConfig, IcmPpoNetwork};
pub use runners::{ConfigError, IterationSummary, Trainer, TrainingConfig};
pub use scheduling::{ConstantLR, LRScheduler, LinearDecay};
