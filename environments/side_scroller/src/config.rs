//! Configuration for [`SideScroller`](crate::SideScroller).

use crate::actions::ActionSet;

/// Game parameters.
///
/// # Example
/// ```ignore
/// let config = SideScrollerConfig::new()
///     .with_seed(7)
///     .with_stages(2)
///     .with_action_set(ActionSet::RightOnly)
///     .with_frame_size(64, 60);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SideScrollerConfig {
    /// Identifier reported through `Game::id`.
    pub env_id: String,
    /// Seed for level generation.
    pub seed: u64,
    /// Number of stages in one game.
    pub stages: u32,
    /// Lives at the start of a game.
    pub lives: i32,
    /// Level length in tiles.
    pub level_tiles: usize,
    /// Steps allowed per life before the timer kills the player.
    pub time_limit: usize,
    /// Physics frames per agent step; the action is held for all of them.
    pub frame_skip: usize,
    pub action_set: ActionSet,
    /// Rendered frame width in pixels.
    pub width: usize,
    /// Rendered frame height in pixels.
    pub height: usize,
}

impl Default for SideScrollerConfig {
    fn default() -> Self {
        Self {
            env_id: "SideScroller-v0".to_string(),
            seed: 0,
            stages: 4,
            lives: 3,
            level_tiles: 160,
            time_limit: 1_000,
            frame_skip: 4,
            action_set: ActionSet::Simple,
            width: 256,
            height: 240,
        }
    }
}

impl SideScrollerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_env_id(mut self, env_id: impl Into<String>) -> Self {
        self.env_id = env_id.into();
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_stages(mut self, stages: u32) -> Self {
        self.stages = stages;
        self
    }

    pub fn with_lives(mut self, lives: i32) -> Self {
        self.lives = lives;
        self
    }

    pub fn with_level_tiles(mut self, tiles: usize) -> Self {
        self.level_tiles = tiles;
        self
    }

    pub fn with_time_limit(mut self, steps: usize) -> Self {
        self.time_limit = steps;
        self
    }

    pub fn with_frame_skip(mut self, frames: usize) -> Self {
        self.frame_skip = frames;
        self
    }

    pub fn with_action_set(mut self, action_set: ActionSet) -> Self {
        self.action_set = action_set;
        self
    }

    pub fn with_frame_size(mut self, width: usize, height: usize) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.stages == 0 {
            return Err("stages must be at least 1".to_string());
        }
        if self.lives <= 0 {
            return Err(format!("lives must be positive, got {}", self.lives));
        }
        if self.frame_skip == 0 {
            return Err("frame_skip must be at least 1".to_string());
        }
        if self.time_limit == 0 {
            return Err("time_limit must be at least 1".to_string());
        }
        if self.width < 16 || self.height < 16 {
            return Err(format!(
                "frame must be at least 16x16, got {}x{}",
                self.width, self.height
            ));
        }
        Ok(())
    }
}
