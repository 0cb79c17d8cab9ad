//! Hyperparameters for a curiosity-driven PPO run.
//!
//! The record is fixed at process start. Behavioral switches (`use_icm`,
//! `life_done`, `use_gae`) are turned into strategy enums once here so the
//! hot loops never branch on raw flags.

use std::fmt;
use std::path::PathBuf;

use crate::algorithms::gae::ReturnEstimator;
use crate::algorithms::policy_loss::LossMode;
use crate::environment::{FramePreprocessor, RewardShaping, TerminationPolicy, WorkerConfig};
use crate::nn::{conv_stack_output, IcmPpoModelConfig};

/// Configuration validation error.
///
/// Returned when configuration parameters are invalid or inconsistent.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A count parameter (num_worker, num_step, etc.) must be positive.
    InvalidCount { field: &'static str, value: usize },
    /// A parameter is outside its valid range.
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    /// The minibatch does not fit in one rollout.
    InvalidMinibatch { batch_size: usize, samples: usize },
    /// The observation is too small for the convolution stack.
    FrameTooSmall { height: usize, width: usize },
    /// Curiosity losses requested for a network without a curiosity module.
    MissingCuriosity,
    /// Number of games differs from `num_worker`.
    WorkerCount { expected: usize, got: usize },
    /// Model and game disagree on an observation or action dimension.
    ShapeMismatch {
        what: &'static str,
        model: usize,
        env: usize,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidCount { field, value } => {
                write!(f, "{} must be > 0, got {}", field, value)
            }
            ConfigError::OutOfRange {
                field,
                value,
                min,
                max,
            } => {
                write!(f, "{} must be in [{}, {}], got {}", field, min, max, value)
            }
            ConfigError::InvalidMinibatch {
                batch_size,
                samples,
            } => write!(
                f,
                "batch_size ({}) must be <= num_worker * num_step ({})",
                batch_size, samples
            ),
            ConfigError::FrameTooSmall { height, width } => write!(
                f,
                "frame {}x{} is too small for the convolution stack (need at least 36x36)",
                height, width
            ),
            ConfigError::MissingCuriosity => {
                write!(f, "curiosity loss requested but the network has no curiosity module")
            }
            ConfigError::WorkerCount { expected, got } => {
                write!(f, "expected {} games (num_worker), got {}", expected, got)
            }
            ConfigError::ShapeMismatch { what, model, env } => {
                write!(f, "{} mismatch: model has {}, environment has {}", what, model, env)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Configuration for PPO + ICM training.
#[derive(Debug, Clone)]
pub struct TrainingConfig {
    /// Environment identifier, used in checkpoint names.
    pub env_id: String,

    // Rollout shape
    pub num_worker: usize,
    pub num_step: usize,
    /// Frames stacked per observation.
    pub history: usize,
    pub frame_height: usize,
    pub frame_width: usize,

    // PPO
    pub ppo_eps: f32,
    pub epoch: usize,
    pub batch_size: usize,
    pub gamma: f32,
    pub lambda: f32,
    pub learning_rate: f64,
    /// Linear decay of the learning rate to 0 over `max_step`.
    pub lr_schedule: bool,
    /// Global step budget.
    pub max_step: usize,
    pub entropy_coef: f32,
    pub clip_grad_norm: f32,
    pub use_gae: bool,
    pub use_standardization: bool,
    /// Division guard for advantage standardization.
    pub stable_eps: f32,

    // Curiosity
    pub use_icm: bool,
    pub icm_scale: f32,
    /// Forward-loss weight; the inverse loss gets `1 - beta`.
    pub beta: f32,
    /// Intrinsic reward scale.
    pub eta: f32,
    /// Multiplier applied to extrinsic rewards before they are combined.
    pub reward_scale: f32,

    // Environment
    /// Losing a life ends the trajectory.
    pub life_done: bool,
    pub initial_lives: i32,

    // Network
    pub hidden: usize,
    pub feature_dim: usize,

    // Persistence
    /// Directory for periodic checkpoints; `None` disables saving.
    pub save_dir: Option<PathBuf>,
    pub save_interval_iterations: usize,
    /// Warm-start parameters.
    pub load_model_path: Option<PathBuf>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            env_id: "SideScroller-v0".to_string(),

            num_worker: 16,
            num_step: 128,
            history: 4,
            frame_height: 84,
            frame_width: 84,

            ppo_eps: 0.1,
            epoch: 3,
            batch_size: 256,
            gamma: 0.99,
            lambda: 0.95,
            learning_rate: 1e-4,
            lr_schedule: false,
            max_step: 115_000_000,
            entropy_coef: 0.02,
            clip_grad_norm: 0.5,
            use_gae: true,
            use_standardization: true,
            stable_eps: 1e-30,

            use_icm: true,
            icm_scale: 10.0,
            beta: 0.2,
            eta: 1.0,
            reward_scale: 1.0,

            life_done: true,
            initial_lives: 3,

            hidden: 512,
            feature_dim: 512,

            save_dir: None,
            save_interval_iterations: 100,
            load_model_path: None,
        }
    }
}

impl TrainingConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Samples collected per iteration.
    pub fn samples_per_iteration(&self) -> usize {
        self.num_worker * self.num_step
    }

    /// Minibatches per epoch; a trailing partial minibatch is dropped.
    pub fn minibatches_per_epoch(&self) -> usize {
        self.samples_per_iteration() / self.batch_size.max(1)
    }

    /// Returns `Ok(())` if the configuration is valid.
    ///
    /// # Validation Rules
    /// - Count parameters must be > 0
    /// - gamma, lambda, beta in [0, 1]; ppo_eps in (0, 1]
    /// - learning_rate and clip_grad_norm strictly positive
    /// - batch_size <= num_worker * num_step
    /// - frames at least 36x36
    pub fn validate(&self) -> Result<(), ConfigError> {
        let counts = [
            ("num_worker", self.num_worker),
            ("num_step", self.num_step),
            ("epoch", self.epoch),
            ("batch_size", self.batch_size),
            ("history", self.history),
            ("max_step", self.max_step),
            ("hidden", self.hidden),
            ("feature_dim", self.feature_dim),
            ("save_interval_iterations", self.save_interval_iterations),
        ];
        for (field, value) in counts {
            if value == 0 {
                return Err(ConfigError::InvalidCount { field, value });
            }
        }

        check_range("gamma", self.gamma as f64, 0.0, 1.0)?;
        check_range("lambda", self.lambda as f64, 0.0, 1.0)?;
        check_range("beta", self.beta as f64, 0.0, 1.0)?;
        if self.ppo_eps <= 0.0 || self.ppo_eps > 1.0 {
            return Err(ConfigError::OutOfRange {
                field: "ppo_eps",
                value: self.ppo_eps as f64,
                min: 0.0,
                max: 1.0,
            });
        }
        check_positive("learning_rate", self.learning_rate)?;
        check_positive("clip_grad_norm", self.clip_grad_norm as f64)?;
        check_positive("stable_eps", self.stable_eps as f64)?;

        let samples = self.samples_per_iteration();
        if self.batch_size > samples {
            return Err(ConfigError::InvalidMinibatch {
                batch_size: self.batch_size,
                samples,
            });
        }

        let [h, w] = conv_stack_output(self.frame_height, self.frame_width);
        if h == 0 || w == 0 {
            return Err(ConfigError::FrameTooSmall {
                height: self.frame_height,
                width: self.frame_width,
            });
        }

        Ok(())
    }

    /// Build and validate the configuration.
    pub fn build(self) -> Result<Self, ConfigError> {
        self.validate()?;
        Ok(self)
    }

    // Derived strategies

    pub fn termination(&self) -> TerminationPolicy {
        TerminationPolicy::from_life_done(self.life_done)
    }

    pub fn shaping(&self) -> RewardShaping {
        RewardShaping::for_icm(self.use_icm)
    }

    pub fn return_estimator(&self) -> ReturnEstimator {
        ReturnEstimator::from_config(self.use_gae, self.lambda)
    }

    pub fn loss_mode(&self) -> LossMode {
        if self.use_icm {
            LossMode::Curiosity {
                icm_scale: self.icm_scale,
                beta: self.beta,
            }
        } else {
            LossMode::Entropy {
                entropy_coef: self.entropy_coef,
            }
        }
    }

    pub fn worker_config(&self) -> WorkerConfig {
        WorkerConfig {
            history_depth: self.history,
            preprocessor: FramePreprocessor::new(self.frame_height, self.frame_width),
            termination: self.termination(),
            shaping: self.shaping(),
            initial_lives: self.initial_lives,
        }
    }

    pub fn model_config(&self, n_actions: usize) -> IcmPpoModelConfig {
        IcmPpoModelConfig::new(self.history, self.frame_height, self.frame_width, n_actions)
            .with_hidden(self.hidden)
            .with_feature_dim(self.feature_dim)
            .with_icm(self.use_icm)
    }

    // Builder methods

    pub fn with_env_id(mut self, env_id: impl Into<String>) -> Self {
        self.env_id = env_id.into();
        self
    }

    pub fn with_num_worker(mut self, num_worker: usize) -> Self {
        self.num_worker = num_worker;
        self
    }

    pub fn with_num_step(mut self, num_step: usize) -> Self {
        self.num_step = num_step;
        self
    }

    pub fn with_history(mut self, history: usize) -> Self {
        self.history = history;
        self
    }

    pub fn with_frame_size(mut self, height: usize, width: usize) -> Self {
        self.frame_height = height;
        self.frame_width = width;
        self
    }

    pub fn with_ppo_eps(mut self, eps: f32) -> Self {
        self.ppo_eps = eps;
        self
    }

    pub fn with_epoch(mut self, epoch: usize) -> Self {
        self.epoch = epoch;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_gamma(mut self, gamma: f32) -> Self {
        self.gamma = gamma;
        self
    }

    pub fn with_lambda(mut self, lambda: f32) -> Self {
        self.lambda = lambda;
        self
    }

    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    pub fn with_lr_schedule(mut self, enabled: bool) -> Self {
        self.lr_schedule = enabled;
        self
    }

    pub fn with_max_step(mut self, max_step: usize) -> Self {
        self.max_step = max_step;
        self
    }

    pub fn with_entropy_coef(mut self, coef: f32) -> Self {
        self.entropy_coef = coef;
        self
    }

    pub fn with_clip_grad_norm(mut self, norm: f32) -> Self {
        self.clip_grad_norm = norm;
        self
    }

    pub fn with_gae(mut self, use_gae: bool) -> Self {
        self.use_gae = use_gae;
        self
    }

    pub fn with_standardization(mut self, enabled: bool) -> Self {
        self.use_standardization = enabled;
        self
    }

    pub fn with_icm(mut self, use_icm: bool) -> Self {
        self.use_icm = use_icm;
        self
    }

    pub fn with_icm_scale(mut self, scale: f32) -> Self {
        self.icm_scale = scale;
        self
    }

    pub fn with_beta(mut self, beta: f32) -> Self {
        self.beta = beta;
        self
    }

    pub fn with_eta(mut self, eta: f32) -> Self {
        self.eta = eta;
        self
    }

    pub fn with_reward_scale(mut self, scale: f32) -> Self {
        self.reward_scale = scale;
        self
    }

    pub fn with_life_done(mut self, life_done: bool) -> Self {
        self.life_done = life_done;
        self
    }

    pub fn with_network(mut self, hidden: usize, feature_dim: usize) -> Self {
        self.hidden = hidden;
        self.feature_dim = feature_dim;
        self
    }

    pub fn with_save_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.save_dir = Some(dir.into());
        self
    }

    pub fn with_save_interval(mut self, iterations: usize) -> Self {
        self.save_interval_iterations = iterations;
        self
    }

    pub fn with_load_model_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.load_model_path = Some(path.into());
        self
    }
}

fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), ConfigError> {
    if value < min || value > max || value.is_nan() {
        return Err(ConfigError::OutOfRange {
            field,
            value,
            min,
            max,
        });
    }
    Ok(())
}

fn check_positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value <= 0.0 || value.is_nan() {
        return Err(ConfigError::OutOfRange {
            field,
            value,
            min: 0.0,
            max: f64::INFINITY,
        });
    }
    Ok(())
}
