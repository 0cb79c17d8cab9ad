//! Rollout buffer for the synchronous collect/update cycle.
//!
//! Key characteristics:
//! - Fixed shape: exactly `num_step` rounds of `num_worker` transitions
//! - Pushed from the single orchestrator thread, no locking
//! - Consumed whole by [`RolloutBuffer::take_batch`], which performs the
//!   time-major to worker-major reshape

use std::fmt;

/// Configuration for rollout buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RolloutBufferConfig {
    /// Number of parallel workers.
    pub num_worker: usize,
    /// Rounds per rollout.
    pub num_step: usize,
    /// Flattened length of one observation history.
    pub state_len: usize,
}

/// Shape errors when pushing or reshaping rollout data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RolloutError {
    /// A pushed column does not have the expected length.
    ShapeMismatch {
        field: &'static str,
        expected: usize,
        got: usize,
    },
    /// More rounds than `num_step` were pushed.
    Full { num_step: usize },
    /// The batch was requested before `num_step` rounds were pushed.
    Incomplete { pushed: usize, num_step: usize },
}

impl fmt::Display for RolloutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RolloutError::ShapeMismatch {
                field,
                expected,
                got,
            } => write!(f, "{}: expected {} values, got {}", field, expected, got),
            RolloutError::Full { num_step } => {
                write!(f, "rollout already holds {} steps", num_step)
            }
            RolloutError::Incomplete { pushed, num_step } => {
                write!(f, "rollout has {} of {} steps", pushed, num_step)
            }
        }
    }
}

impl std::error::Error for RolloutError {}

/// A complete rollout in worker-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct RolloutBatch {
    /// `[num_worker * num_step, state_len]`
    pub states: Vec<f32>,
    /// `[num_worker * num_step, state_len]`
    pub next_states: Vec<f32>,
    pub actions: Vec<usize>,
    /// Shaped (plus intrinsic) rewards.
    pub rewards: Vec<f32>,
    pub dones: Vec<bool>,
    pub log_rewards: Vec<f32>,
    pub num_worker: usize,
    pub num_step: usize,
    pub state_len: usize,
}

impl RolloutBatch {
    pub fn len(&self) -> usize {
        self.num_worker * self.num_step
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flat index range of one worker's trajectory.
    pub fn worker_range(&self, worker: usize) -> std::ops::Range<usize> {
        worker * self.num_step..(worker + 1) * self.num_step
    }

    /// Worker-major index of `(worker, step)`.
    #[inline]
    pub fn flat_index(&self, worker: usize, step: usize) -> usize {
        worker * self.num_step + step
    }

    /// Rewards reshaped as `[num_step][num_worker]` for per-step filtering.
    pub fn rewards_time_major(&self) -> Vec<Vec<f32>> {
        (0..self.num_step)
            .map(|t| {
                (0..self.num_worker)
                    .map(|w| self.rewards[self.flat_index(w, t)])
                    .collect()
            })
            .collect()
    }
}

/// Time-major rollout accumulator.
#[derive(Debug)]
pub struct RolloutBuffer {
    config: RolloutBufferConfig,
    states: Vec<f32>,
    next_states: Vec<f32>,
    actions: Vec<usize>,
    rewards: Vec<f32>,
    dones: Vec<bool>,
    log_rewards: Vec<f32>,
    pushed: usize,
}

impl RolloutBuffer {
    pub fn new(config: RolloutBufferConfig) -> Self {
        let n = config.num_worker * config.num_step;
        Self {
            config,
            states: Vec::with_capacity(n * config.state_len),
            next_states: Vec::with_capacity(n * config.state_len),
            actions: Vec::with_capacity(n),
            rewards: Vec::with_capacity(n),
            dones: Vec::with_capacity(n),
            log_rewards: Vec::with_capacity(n),
            pushed: 0,
        }
    }

    pub fn config(&self) -> &RolloutBufferConfig {
        &self.config
    }

    /// Rounds pushed since the last [`take_batch`](Self::take_batch).
    pub fn len(&self) -> usize {
        self.pushed
    }

    pub fn is_empty(&self) -> bool {
        self.pushed == 0
    }

    pub fn is_full(&self) -> bool {
        self.pushed == self.config.num_step
    }

    /// Append one synchronous round across all workers.
    pub fn push_step(
        &mut self,
        states: &[f32],
        next_states: &[f32],
        actions: &[usize],
        rewards: &[f32],
        dones: &[bool],
        log_rewards: &[f32],
    ) -> Result<(), RolloutError> {
        if self.is_full() {
            return Err(RolloutError::Full {
                num_step: self.config.num_step,
            });
        }

        let n = self.config.num_worker;
        let obs = n * self.config.state_len;
        check_len("states", obs, states.len())?;
        check_len("next_states", obs, next_states.len())?;
        check_len("actions", n, actions.len())?;
        check_len("rewards", n, rewards.len())?;
        check_len("dones", n, dones.len())?;
        check_len("log_rewards", n, log_rewards.len())?;

        self.states.extend_from_slice(states);
        self.next_states.extend_from_slice(next_states);
        self.actions.extend_from_slice(actions);
        self.rewards.extend_from_slice(rewards);
        self.dones.extend_from_slice(dones);
        self.log_rewards.extend_from_slice(log_rewards);
        self.pushed += 1;
        Ok(())
    }

    /// Reshape the full rollout to worker-major order and clear the buffer.
    pub fn take_batch(&mut self) -> Result<RolloutBatch, RolloutError> {
        if !self.is_full() {
            return Err(RolloutError::Incomplete {
                pushed: self.pushed,
                num_step: self.config.num_step,
            });
        }

        let RolloutBufferConfig {
            num_worker,
            num_step,
            state_len,
        } = self.config;

        let batch = RolloutBatch {
            states: time_major_to_worker_major(&self.states, num_step, num_worker, state_len)?,
            next_states: time_major_to_worker_major(
                &self.next_states,
                num_step,
                num_worker,
                state_len,
            )?,
            actions: time_major_to_worker_major(&self.actions, num_step, num_worker, 1)?,
            rewards: time_major_to_worker_major(&self.rewards, num_step, num_worker, 1)?,
            dones: time_major_to_worker_major(&self.dones, num_step, num_worker, 1)?,
            log_rewards: time_major_to_worker_major(&self.log_rewards, num_step, num_worker, 1)?,
            num_worker,
            num_step,
            state_len,
        };

        self.clear();
        Ok(batch)
    }

    pub fn clear(&mut self) {
        self.states.clear();
        self.next_states.clear();
        self.actions.clear();
        self.rewards.clear();
        self.dones.clear();
        self.log_rewards.clear();
        self.pushed = 0;
    }
}

fn check_len(field: &'static str, expected: usize, got: usize) -> Result<(), RolloutError> {
    if expected != got {
        return Err(RolloutError::ShapeMismatch {
            field,
            expected,
            got,
        });
    }
    Ok(())
}

/// `[num_step, num_worker, item]` → `[num_worker, num_step, item]`.
pub fn time_major_to_worker_major<T: Copy>(
    data: &[T],
    num_step: usize,
    num_worker: usize,
    item_len: usize,
) -> Result<Vec<T>, RolloutError> {
    transpose_blocks(data, num_step, num_worker, item_len)
}

/// `[num_worker, num_step, item]` → `[num_step, num_worker, item]`.
pub fn worker_major_to_time_major<T: Copy>(
    data: &[T],
    num_step: usize,
    num_worker: usize,
    item_len: usize,
) -> Result<Vec<T>, RolloutError> {
    transpose_blocks(data, num_worker, num_step, item_len)
}

/// Swap the two leading axes of a `[rows, cols, item]` array.
fn transpose_blocks<T: Copy>(
    data: &[T],
    rows: usize,
    cols: usize,
    item_len: usize,
) -> Result<Vec<T>, RolloutError> {
    check_len("rollout", rows * cols * item_len, data.len())?;
    let mut out = Vec::with_capacity(data.len());
    for c in 0..cols {
        for r in 0..rows {
            let start = (r * cols + c) * item_len;
            out.extend_from_slice(&data[start..start + item_len]);
        }
    }
    Ok(out)
}
