//! Tests for return estimation and loss terms.
//!
//! - `gae_tests`: GAE and n-step targets, episode boundaries
//! - `policy_loss_tests`: sampling, log-probs, clipped surrogate, curiosity reward
