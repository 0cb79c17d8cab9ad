//! Learning rate scheduling.
//!
//! - [`ConstantLR`]: fixed rate
//! - [`LinearDecay`]: linear interpolation from the start rate to an end
//!   rate over a global step budget
//!
//! ```rust
//! use curiosity_rl::scheduling::{LRScheduler, LinearDecay};
//!
//! let scheduler = LinearDecay::to_zero(1e-4, 1_000);
//! assert_eq!(scheduler.get_lr(0), 1e-4);
//! assert_eq!(scheduler.get_lr(1_000), 0.0);
//! ```

pub mod lr_scheduler;

#[cfg(test)]
mod tests;

pub use lr_scheduler::{scheduler_for, ConstantLR, LRScheduler, LinearDecay};
