//! Streaming reward statistics.
//!
//! [`RunningMeanStd`] tracks the mean and variance of every intrinsic reward
//! seen during the run, merged batch by batch with Chan et al.'s parallel
//! formula so the result does not depend on how the data was chunked.
//! [`RewardForwardFilter`] is the discounted running sum applied to each
//! worker's reward stream before those moments are taken.
//!
//! # Example
//! ```
//! use curiosity_rl::core::{RewardForwardFilter, RunningMeanStd};
//!
//! let mut filter = RewardForwardFilter::new(0.99);
//! let mut rms = RunningMeanStd::new();
//!
//! let filtered = filter.update(&[1.0, 0.5]);
//! rms.update(&filtered);
//! assert!(rms.std() > 0.0);
//! ```

use serde::{Deserialize, Serialize};

/// Initial pseudo-count; keeps the first merge from dividing by zero.
pub const DEFAULT_EPSILON: f64 = 1e-4;

/// Running mean and variance of a scalar stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunningMeanStd {
    mean: f64,
    var: f64,
    count: f64,
}

impl Default for RunningMeanStd {
    fn default() -> Self {
        Self::new()
    }
}

impl RunningMeanStd {
    /// Zero mean, unit variance, `count = 1e-4`.
    pub fn new() -> Self {
        Self::with_epsilon(DEFAULT_EPSILON)
    }

    pub fn with_epsilon(epsilon: f64) -> Self {
        Self {
            mean: 0.0,
            var: 1.0,
            count: epsilon,
        }
    }

    /// Fold a batch of samples into the statistics.
    ///
    /// Empty batches are ignored.
    pub fn update(&mut self, batch: &[f32]) {
        if batch.is_empty() {
            return;
        }
        let (mean, var) = batch_moments(batch);
        self.update_from_moments(mean, var, batch.len() as f64);
    }

    /// Merge a batch summarized by its mean, population variance and size.
    pub fn update_from_moments(&mut self, batch_mean: f64, batch_var: f64, batch_count: f64) {
        if batch_count <= 0.0 {
            return;
        }

        let delta = batch_mean - self.mean;
        let total = self.count + batch_count;

        let new_mean = self.mean + delta * batch_count / total;
        let m_a = self.var * self.count;
        let m_b = batch_var * batch_count;
        let m2 = m_a + m_b + delta * delta * self.count * batch_count / total;

        self.mean = new_mean;
        self.var = m2 / total;
        self.count = total;
    }

    /// Merge another estimator into this one.
    pub fn merge(&mut self, other: &RunningMeanStd) {
        self.update_from_moments(other.mean, other.var, other.count);
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn var(&self) -> f64 {
        self.var
    }

    pub fn std(&self) -> f64 {
        self.var.sqrt()
    }

    pub fn count(&self) -> f64 {
        self.count
    }
}

/// Mean and population variance of a batch, accumulated in f64.
pub fn batch_moments(batch: &[f32]) -> (f64, f64) {
    if batch.is_empty() {
        return (0.0, 0.0);
    }
    let n = batch.len() as f64;
    let mean = batch.iter().map(|&x| x as f64).sum::<f64>() / n;
    let var = batch
        .iter()
        .map(|&x| {
            let d = x as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / n;
    (mean, var)
}

/// Discounted running sum over a worker-indexed reward vector.
///
/// The first update copies the rewards; each later one computes
/// `rewems = rewems * gamma + rewards` elementwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardForwardFilter {
    gamma: f32,
    rewems: Option<Vec<f32>>,
}

impl RewardForwardFilter {
    pub fn new(gamma: f32) -> Self {
        Self {
            gamma,
            rewems: None,
        }
    }

    /// Advance the filter by one step and return the new running sums.
    pub fn update(&mut self, rewards: &[f32]) -> Vec<f32> {
        let gamma = self.gamma;
        match &mut self.rewems {
            Some(rewems) if rewems.len() == rewards.len() => {
                for (acc, &r) in rewems.iter_mut().zip(rewards) {
                    *acc = *acc * gamma + r;
                }
            }
            slot => {
                if let Some(old) = slot {
                    log::warn!(
                        "reward filter width changed from {} to {}, restarting",
                        old.len(),
                        rewards.len()
                    );
                }
                *slot = Some(rewards.to_vec());
            }
        }
        self.rewems.clone().unwrap_or_default()
    }

    pub fn rewems(&self) -> Option<&[f32]> {
        self.rewems.as_deref()
    }

    pub fn gamma(&self) -> f32 {
        self.gamma
    }

    pub fn reset(&mut self) {
        self.rewems = None;
    }
}
