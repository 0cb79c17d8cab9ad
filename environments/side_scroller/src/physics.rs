//! Player kinematics against the tile columns.

use crate::actions::Buttons;
use crate::constants::{
    FALL_LIMIT, GRAVITY, JUMP_VELOCITY, PLAYER_WIDTH, RUN_SPEED, SPAWN_X, TILE, WALK_SPEED,
};
use crate::level::{column_of, Level};

/// Position is the bottom-left corner of the player's box; `y` is the height
/// of the feet above the bottom of the world.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Player {
    pub x: f32,
    pub y: f32,
    pub vy: f32,
    pub on_ground: bool,
}

impl Player {
    /// Standing on the column at the spawn point.
    pub fn spawn(level: &Level) -> Self {
        Self {
            x: SPAWN_X,
            y: level.height_px_at(SPAWN_X),
            vy: 0.0,
            on_ground: true,
        }
    }

    /// Columns overlapped when the left edge is at `x`.
    fn columns_at(x: f32) -> std::ops::RangeInclusive<i64> {
        column_of(x)..=column_of(x + PLAYER_WIDTH - 1.0)
    }

    fn blocked_at(level: &Level, x: f32, y: f32) -> bool {
        Self::columns_at(x).any(|c| level.height(c) as f32 * TILE > y + 1e-3)
    }

    /// Highest solid surface under the player, `None` over a pit.
    fn support_at(level: &Level, x: f32) -> Option<f32> {
        Self::columns_at(x)
            .map(|c| level.height(c))
            .filter(|&h| h > 0)
            .max()
            .map(|h| h as f32 * TILE)
    }
}

/// What happened during one physics frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameResult {
    /// Horizontal displacement actually applied.
    pub dx: f32,
    pub fell: bool,
}

/// Advance the player by one frame.
pub fn step_player(player: &mut Player, level: &Level, buttons: Buttons) -> FrameResult {
    let speed = if buttons.run { RUN_SPEED } else { WALK_SPEED };
    let target_x = (player.x + buttons.direction() * speed).max(0.0);
    let start_x = player.x;
    if !Player::blocked_at(level, target_x, player.y) {
        player.x = target_x;
    }

    if buttons.jump && player.on_ground {
        player.vy = JUMP_VELOCITY;
        player.on_ground = false;
    }

    player.vy -= GRAVITY;
    let next_y = player.y + player.vy;
    match Player::support_at(level, player.x) {
        Some(surface) if player.vy <= 0.0 && next_y <= surface && player.y >= surface - 1e-3 => {
            player.y = surface;
            player.vy = 0.0;
            player.on_ground = true;
        }
        _ => {
            player.y = next_y;
            player.on_ground = false;
        }
    }

    FrameResult {
        dx: player.x - start_x,
        fell: player.y < FALL_LIMIT,
    }
}
