//! World geometry, physics constants and palette.
//!
//! Distances are in pixels, velocities in pixels per frame.

/// Edge length of one level tile.
pub const TILE: f32 = 16.0;

/// Ground height of an ordinary column, in tiles.
pub const GROUND_TILES: u8 = 2;

/// Downward acceleration per frame.
pub const GRAVITY: f32 = 0.8;

/// Initial upward velocity of a jump.
pub const JUMP_VELOCITY: f32 = 9.0;

pub const WALK_SPEED: f32 = 2.0;
pub const RUN_SPEED: f32 = 3.5;

pub const PLAYER_WIDTH: f32 = 12.0;
pub const PLAYER_HEIGHT: f32 = 16.0;

/// Falling below this height means the player dropped into a pit.
pub const FALL_LIMIT: f32 = -48.0;

/// Spawn position at the start of every stage and after each death.
pub const SPAWN_X: f32 = 2.0 * TILE;

/// Flat tiles at the start and end of every generated level.
pub const SAFE_TILES: usize = 8;

/// Reward added on the step the player dies.
pub const DEATH_PENALTY: f32 = -15.0;

/// Per-step reward is clipped to `[-REWARD_LIMIT, REWARD_LIMIT]`.
pub const REWARD_LIMIT: f32 = 15.0;

/// Height of the flag pole, in tiles.
pub const FLAG_TILES: u8 = 9;

pub const SKY: [u8; 3] = [92, 148, 252];
pub const GROUND: [u8; 3] = [200, 76, 12];
pub const PIPE: [u8; 3] = [0, 168, 0];
pub const POLE: [u8; 3] = [240, 240, 240];
pub const PLAYER: [u8; 3] = [216, 40, 0];
