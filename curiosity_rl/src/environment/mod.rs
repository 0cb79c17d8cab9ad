//! Game abstraction and the per-worker simulation pipeline.
//!
//! The emulator itself is an external collaborator reached through the
//! [`Game`] trait. Everything between raw frames and the transition protocol
//! lives here:
//!
//! - [`preprocess`]: grayscale/resize/normalize and the rolling frame stack
//! - [`shaping`]: forced termination and shaped-reward strategies
//! - [`worker`]: one thread per game, driven over channels

pub mod preprocess;
pub mod shaping;
pub mod worker;

#[cfg(test)]
mod tests;

pub use preprocess::{Frame, FramePreprocessor, ObservationHistory};
pub use shaping::{EpisodeState, RewardShaping, StepOutcome, TerminationPolicy};
pub use worker::{
    EnvironmentWorker, StepBatch, WorkerCommand, WorkerConfig, WorkerPhase, WorkerPool,
    WorkerReply,
};

use std::fmt;

/// Raw RGB observation as produced by the emulator.
///
/// Pixels are stored row-major, three interleaved channels per pixel.
#[derive(Debug, Clone, PartialEq)]
pub struct RgbFrame {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl RgbFrame {
    /// Create a frame, checking that the buffer matches the dimensions.
    pub fn new(width: usize, height: usize, data: Vec<u8>) -> Result<Self, EnvError> {
        let frame = Self {
            width,
            height,
            data,
        };
        frame.check()?;
        Ok(frame)
    }

    /// Frame filled with a single colour.
    pub fn solid(width: usize, height: usize, rgb: [u8; 3]) -> Self {
        let data = rgb.iter().copied().cycle().take(width * height * 3).collect();
        Self {
            width,
            height,
            data,
        }
    }

    pub(crate) fn check(&self) -> Result<(), EnvError> {
        if self.width == 0 || self.height == 0 {
            return Err(EnvError::MalformedFrame {
                reason: format!("empty frame {}x{}", self.width, self.height),
            });
        }
        let expected = self.width * self.height * 3;
        if self.data.len() != expected {
            return Err(EnvError::MalformedFrame {
                reason: format!(
                    "{}x{} RGB frame needs {} bytes, got {}",
                    self.width,
                    self.height,
                    expected,
                    self.data.len()
                ),
            });
        }
        Ok(())
    }
}

/// Side information reported by the emulator after each step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GameInfo {
    /// Remaining lives.
    pub life: i32,
    /// Current stage, starting at 1.
    pub stage: u32,
    /// Horizontal position of the player in level coordinates.
    pub x_pos: i32,
    /// Whether the end-of-level flag was reached on this step.
    pub flag_get: bool,
}

/// Result of advancing the emulator by one action.
#[derive(Debug, Clone)]
pub struct GameStep {
    pub frame: RgbFrame,
    pub reward: f32,
    /// Game over as signalled by the emulator itself.
    pub done: bool,
    pub info: GameInfo,
}

/// A side-scrolling game with a discrete action set.
///
/// Implementations own all emulator state; each worker thread gets its own
/// instance so nothing here needs to be `Sync`.
pub trait Game: Send + 'static {
    /// Start a new game and return the first frame.
    fn reset(&mut self) -> Result<RgbFrame, EnvError>;

    /// Advance one frame-skip step with the given action index.
    fn step(&mut self, action: usize) -> Result<GameStep, EnvError>;

    /// Size of the discrete action set.
    fn n_actions(&self) -> usize;

    /// Identifier used in checkpoint names and logs.
    fn id(&self) -> &str;
}

impl<G: Game + ?Sized> Game for Box<G> {
    fn reset(&mut self) -> Result<RgbFrame, EnvError> {
        (**self).reset()
    }

    fn step(&mut self, action: usize) -> Result<GameStep, EnvError> {
        (**self).step(action)
    }

    fn n_actions(&self) -> usize {
        (**self).n_actions()
    }

    fn id(&self) -> &str {
        (**self).id()
    }
}

/// Errors raised by the game or the preprocessing pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum EnvError {
    /// Frame buffer does not match its declared dimensions.
    MalformedFrame { reason: String },
    /// Action index outside `[0, n_actions)`.
    InvalidAction { action: usize, n_actions: usize },
    /// The emulator failed internally.
    Simulation(String),
}

impl fmt::Display for EnvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvError::MalformedFrame { reason } => write!(f, "malformed frame: {}", reason),
            EnvError::InvalidAction { action, n_actions } => {
                write!(f, "action {} out of range [0, {})", action, n_actions)
            }
            EnvError::Simulation(msg) => write!(f, "simulation error: {}", msg),
        }
    }
}

impl std::error::Error for EnvError {}
