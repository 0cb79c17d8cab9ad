//! Learning rate schedulers keyed by global environment step.
//!
//! Schedulers validate inputs in debug builds and sanitize them in release
//! builds so a bad value never turns into a NaN learning rate:
//!
//! - **Zero budget**: `total_steps = 0` keeps the start rate
//! - **Non-finite or negative rates**: replaced with 0.0

use crate::runners::TrainingConfig;

/// Learning rate scheduler trait.
pub trait LRScheduler: Send + Sync {
    /// Learning rate at global step `step`.
    fn get_lr(&self, step: usize) -> f64;
}

fn sanitize(lr: f64) -> f64 {
    if lr.is_finite() && lr >= 0.0 {
        lr
    } else {
        0.0
    }
}

/// Constant learning rate (no scheduling).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantLR {
    lr: f64,
}

impl ConstantLR {
    /// # Panics (debug only)
    ///
    /// Panics if `lr` is NaN, Inf, or negative.
    pub fn new(lr: f64) -> Self {
        debug_assert!(lr.is_finite(), "ConstantLR: lr must be finite, got {}", lr);
        debug_assert!(lr >= 0.0, "ConstantLR: lr must be non-negative, got {}", lr);
        Self { lr: sanitize(lr) }
    }

    pub fn lr(&self) -> f64 {
        self.lr
    }
}

impl LRScheduler for ConstantLR {
    fn get_lr(&self, _step: usize) -> f64 {
        self.lr
    }
}

/// Linear decay from `start_lr` to `end_lr` over `total_steps`.
///
/// Past `total_steps` the end rate is held.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearDecay {
    start_lr: f64,
    end_lr: f64,
    total_steps: usize,
}

impl LinearDecay {
    /// # Panics (debug only)
    ///
    /// Panics if `total_steps` is 0 or either rate is non-finite or negative.
    pub fn new(start_lr: f64, end_lr: f64, total_steps: usize) -> Self {
        debug_assert!(
            total_steps > 0,
            "LinearDecay: total_steps must be > 0, got {}",
            total_steps
        );
        debug_assert!(
            start_lr.is_finite() && start_lr >= 0.0,
            "LinearDecay: start_lr must be finite and non-negative, got {}",
            start_lr
        );
        debug_assert!(
            end_lr.is_finite() && end_lr >= 0.0,
            "LinearDecay: end_lr must be finite and non-negative, got {}",
            end_lr
        );

        Self {
            start_lr: sanitize(start_lr),
            end_lr: sanitize(end_lr),
            total_steps,
        }
    }

    /// `lr = start - (step / total) * start`, floored at 0.
    pub fn to_zero(start_lr: f64, total_steps: usize) -> Self {
        Self::new(start_lr, 0.0, total_steps)
    }

    pub fn start_lr(&self) -> f64 {
        self.start_lr
    }

    pub fn end_lr(&self) -> f64 {
        self.end_lr
    }

    pub fn total_steps(&self) -> usize {
        self.total_steps
    }
}

impl LRScheduler for LinearDecay {
    fn get_lr(&self, step: usize) -> f64 {
        if self.total_steps == 0 {
            return self.start_lr;
        }
        if step >= self.total_steps {
            return self.end_lr;
        }

        let progress = (step as f64 / self.total_steps as f64).min(1.0);
        let lr = self.start_lr + (self.end_lr - self.start_lr) * progress;
        if lr.is_finite() {
            lr.max(0.0)
        } else {
            self.end_lr
        }
    }
}

/// Decay to zero over `max_step` when `lr_schedule` is on, constant otherwise.
pub fn scheduler_for(config: &TrainingConfig) -> Box<dyn LRScheduler> {
    if config.lr_schedule {
        Box::new(LinearDecay::to_zero(config.learning_rate, config.max_step))
    } else {
        Box::new(ConstantLR::new(config.learning_rate))
    }
}
