//! Rollout storage.
//!
//! Transitions arrive one synchronous round at a time (time-major) and are
//! handed to training as one worker-major batch, where worker `w`'s step `t`
//! lives at `w * num_step + t`.

pub mod rollout_buffer;

pub use rollout_buffer::{
    time_major_to_worker_major, worker_major_to_time_major, RolloutBatch, RolloutBuffer,
    RolloutBufferConfig, RolloutError,
};
