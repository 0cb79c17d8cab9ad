//! Environment workers: one thread per game, one reply per command.
//!
//! The orchestrator talks to each worker over a pair of bounded crossbeam
//! channels. A round is atomic: [`WorkerPool::step_all`] sends every action
//! first, then blocks until every worker has answered, in worker order.

use crossbeam_channel::{bounded, Receiver, Sender};
use std::thread::JoinHandle;

use super::preprocess::{FramePreprocessor, ObservationHistory};
use super::shaping::{EpisodeState, RewardShaping, StepOutcome, TerminationPolicy};
use super::{EnvError, Game};
use crate::error::TrainError;

/// Static per-worker settings.
#[derive(Debug, Clone, Copy)]
pub struct WorkerConfig {
    pub history_depth: usize,
    pub preprocessor: FramePreprocessor,
    pub termination: TerminationPolicy,
    pub shaping: RewardShaping,
    pub initial_lives: i32,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            history_depth: 4,
            preprocessor: FramePreprocessor::default(),
            termination: TerminationPolicy::LifeLoss,
            shaping: RewardShaping::curiosity(),
            initial_lives: 3,
        }
    }
}

/// Orchestrator → worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerCommand {
    Step(usize),
    Shutdown,
}

/// Worker → orchestrator.
#[derive(Debug, Clone)]
pub enum WorkerReply {
    Transition(WorkerTransition),
    Failed {
        worker: usize,
        step: usize,
        message: String,
    },
}

/// One step's result as sent over the wire.
#[derive(Debug, Clone)]
pub struct WorkerTransition {
    /// `[depth, height, width]` history after the step (or after the reset).
    pub history: Vec<f32>,
    pub shaped_reward: f32,
    /// Always `false`.
    pub placeholder: bool,
    /// The trajectory ended on this step and the worker has reset.
    pub done: bool,
    /// The game itself reported game over on this step.
    pub natural_done: bool,
    pub log_reward: f32,
}

/// Where a worker is in its step cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerPhase {
    AwaitingAction,
    Stepping,
    EpisodeContinues,
    EpisodeEnds,
}

/// A single game plus its observation history and episode bookkeeping.
pub struct EnvironmentWorker<G: Game> {
    index: usize,
    game: G,
    config: WorkerConfig,
    history: ObservationHistory,
    episode: EpisodeState,
    phase: WorkerPhase,
    total_steps: usize,
}

impl<G: Game> EnvironmentWorker<G> {
    /// Reset the game and fill the history with the first frame.
    pub fn new(index: usize, mut game: G, config: WorkerConfig) -> Result<Self, EnvError> {
        let raw = game.reset()?;
        let frame = config.preprocessor.process(&raw)?;
        Ok(Self {
            index,
            game,
            config,
            history: ObservationHistory::filled(&frame, config.history_depth),
            episode: EpisodeState::new(config.initial_lives),
            phase: WorkerPhase::AwaitingAction,
            total_steps: 0,
        })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn history(&self) -> &ObservationHistory {
        &self.history
    }

    pub fn episode(&self) -> &EpisodeState {
        &self.episode
    }

    pub fn phase(&self) -> WorkerPhase {
        self.phase
    }

    pub fn total_steps(&self) -> usize {
        self.total_steps
    }

    /// Advance the game by one action and build the reply.
    pub fn step(&mut self, action: usize) -> Result<WorkerTransition, EnvError> {
        let n_actions = self.game.n_actions();
        if action >= n_actions {
            return Err(EnvError::InvalidAction { action, n_actions });
        }

        self.phase = WorkerPhase::Stepping;
        let step = self.game.step(action)?;
        self.total_steps += 1;

        let outcome = self.episode.advance(
            step.reward,
            step.done,
            &step.info,
            self.config.termination,
            self.config.shaping,
        );

        let frame = self.config.preprocessor.process(&step.frame)?;
        self.history.push(&frame)?;

        if outcome.episode_ended() {
            self.phase = WorkerPhase::EpisodeEnds;
            self.log_episode(&outcome, step.info.stage, step.info.x_pos);
            self.episode.finish_episode();
            let raw = self.game.reset()?;
            let frame = self.config.preprocessor.process(&raw)?;
            self.history.reset(&frame);
        } else {
            self.phase = WorkerPhase::EpisodeContinues;
        }

        let reply = WorkerTransition {
            history: self.history.as_slice().to_vec(),
            shaped_reward: outcome.shaped_reward,
            placeholder: false,
            done: outcome.episode_ended(),
            natural_done: outcome.natural_done,
            log_reward: outcome.log_reward,
        };
        self.phase = WorkerPhase::AwaitingAction;
        Ok(reply)
    }

    fn log_episode(&self, outcome: &StepOutcome, stage: u32, x_pos: i32) {
        log::info!(
            "[Episode {}({})] Step: {}  Reward: {:.3}  Recent Reward: {:.3}  Stage: {}  current x: {}  max x: {}{}",
            self.episode.episode,
            self.index,
            self.episode.steps,
            self.episode.total_log_reward,
            self.episode.recent_mean_return(),
            stage,
            x_pos,
            self.episode.max_pos,
            if outcome.natural_done { "" } else { "  (life lost)" },
        );
    }

    /// Serve commands until shutdown or until the orchestrator goes away.
    fn run(mut self, cmd_rx: Receiver<WorkerCommand>, reply_tx: Sender<WorkerReply>) {
        while let Ok(cmd) = cmd_rx.recv() {
            let action = match cmd {
                WorkerCommand::Step(action) => action,
                WorkerCommand::Shutdown => break,
            };

            let reply = match self.step(action) {
                Ok(transition) => WorkerReply::Transition(transition),
                Err(e) => {
                    log::error!(
                        "worker {} failed at step {}: {}",
                        self.index,
                        self.total_steps,
                        e
                    );
                    let _ = reply_tx.send(WorkerReply::Failed {
                        worker: self.index,
                        step: self.total_steps,
                        message: e.to_string(),
                    });
                    return;
                }
            };

            if reply_tx.send(reply).is_err() {
                break;
            }
        }
        log::debug!("worker {} stopped after {} steps", self.index, self.total_steps);
    }
}

/// Replies of one synchronous round, in worker order.
#[derive(Debug, Clone, Default)]
pub struct StepBatch {
    /// `[num_worker, depth, height, width]` flattened.
    pub next_states: Vec<f32>,
    pub rewards: Vec<f32>,
    pub placeholders: Vec<bool>,
    /// Forced or natural termination; masks bootstrapping.
    pub dones: Vec<bool>,
    /// Game over reported by the game only.
    pub natural_dones: Vec<bool>,
    pub log_rewards: Vec<f32>,
}

struct WorkerHandle {
    cmd_tx: Sender<WorkerCommand>,
    reply_rx: Receiver<WorkerReply>,
    thread: Option<JoinHandle<()>>,
}

/// The set of running workers.
pub struct WorkerPool {
    workers: Vec<WorkerHandle>,
    initial_states: Vec<f32>,
    state_len: usize,
    n_actions: usize,
    rounds: usize,
}

impl WorkerPool {
    /// Build one worker per game and start its thread.
    pub fn spawn<G: Game>(games: Vec<G>, config: WorkerConfig) -> Result<Self, TrainError> {
        let mut workers = Vec::with_capacity(games.len());
        let mut initial_states = Vec::new();
        let mut state_len = 0;
        let mut n_actions = 0;

        for (index, game) in games.into_iter().enumerate() {
            n_actions = game.n_actions();
            let worker = EnvironmentWorker::new(index, game, config).map_err(|e| {
                TrainError::WorkerFailed {
                    worker: index,
                    step: 0,
                    message: e.to_string(),
                }
            })?;
            state_len = worker.history().as_slice().len();
            initial_states.extend_from_slice(worker.history().as_slice());

            let (cmd_tx, cmd_rx) = bounded(1);
            let (reply_tx, reply_rx) = bounded(1);
            let thread = std::thread::Builder::new()
                .name(format!("env-worker-{}", index))
                .spawn(move || worker.run(cmd_rx, reply_tx))
                .map_err(|source| TrainError::Spawn {
                    worker: index,
                    source,
                })?;

            workers.push(WorkerHandle {
                cmd_tx,
                reply_rx,
                thread: Some(thread),
            });
        }

        Ok(Self {
            workers,
            initial_states,
            state_len,
            n_actions,
            rounds: 0,
        })
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    pub fn n_actions(&self) -> usize {
        self.n_actions
    }

    /// Length of one worker's flattened observation history.
    pub fn state_len(&self) -> usize {
        self.state_len
    }

    /// Histories produced by the initial resets, worker-ordered.
    pub fn initial_states(&self) -> &[f32] {
        &self.initial_states
    }

    /// Send one action to every worker and wait for every reply.
    pub fn step_all(&mut self, actions: &[usize]) -> Result<StepBatch, TrainError> {
        if actions.len() != self.workers.len() {
            return Err(TrainError::ActionCount {
                expected: self.workers.len(),
                got: actions.len(),
            });
        }

        let step = self.rounds;
        for (worker, (handle, &action)) in self.workers.iter().zip(actions).enumerate() {
            handle
                .cmd_tx
                .send(WorkerCommand::Step(action))
                .map_err(|_| TrainError::WorkerDisconnected { worker, step })?;
        }

        let n = self.workers.len();
        let mut batch = StepBatch {
            next_states: Vec::with_capacity(n * self.state_len),
            rewards: Vec::with_capacity(n),
            placeholders: Vec::with_capacity(n),
            dones: Vec::with_capacity(n),
            natural_dones: Vec::with_capacity(n),
            log_rewards: Vec::with_capacity(n),
        };

        for (worker, handle) in self.workers.iter().enumerate() {
            let reply = handle
                .reply_rx
                .recv()
                .map_err(|_| TrainError::WorkerDisconnected { worker, step })?;
            match reply {
                WorkerReply::Transition(t) => {
                    batch.next_states.extend_from_slice(&t.history);
                    batch.rewards.push(t.shaped_reward);
                    batch.placeholders.push(t.placeholder);
                    batch.dones.push(t.done);
                    batch.natural_dones.push(t.natural_done);
                    batch.log_rewards.push(t.log_reward);
                }
                WorkerReply::Failed {
                    worker,
                    step,
                    message,
                } => {
                    return Err(TrainError::WorkerFailed {
                        worker,
                        step,
                        message,
                    })
                }
            }
        }

        self.rounds += 1;
        Ok(batch)
    }

    /// Stop every worker and join its thread.
    pub fn shutdown(&mut self) {
        for handle in &self.workers {
            let _ = handle.cmd_tx.send(WorkerCommand::Shutdown);
        }
        for (index, handle) in self.workers.iter_mut().enumerate() {
            if let Some(thread) = handle.thread.take() {
                if thread.join().is_err() {
                    log::warn!("worker {} panicked", index);
                }
            }
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}
