//! Tests for the side_scroller game.
//!
//! - `level_tests`: generation determinism and safe zones
//! - `physics_tests`: movement, jumping, landing and falling
//! - `game_tests`: the `Game` contract (rewards, lives, stages, frames)
//! - `training_tests`: a short end-to-end training run

pub mod game_tests;
pub mod level_tests;

use crate::{ActionSet, SideScroller, SideScrollerConfig};

/// Small frames so tests render quickly.
pub(crate) fn small_config() -> SideScrollerConfig {
    SideScrollerConfig::new()
        .with_seed(11)
        .with_frame_size(36, 36)
        .with_level_tiles(40)
        .with_action_set(ActionSet::RightOnly)
}

pub(crate) fn small_game() -> SideScroller {
    SideScroller::new(small_config()).unwrap()
}
