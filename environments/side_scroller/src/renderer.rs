//! Software rasterizer producing the RGB frames the agent sees.

use curiosity_rl::RgbFrame;

use crate::constants::{
    FLAG_TILES, GROUND, GROUND_TILES, PIPE, PLAYER, PLAYER_HEIGHT, PLAYER_WIDTH, POLE, SKY, TILE,
};
use crate::level::{column_of, Level};
use crate::physics::Player;

/// World pixels visible vertically; the frame height is scaled to this.
pub const VIEW_HEIGHT: f32 = 240.0;

/// Width of the flag pole in world pixels.
const POLE_WIDTH: f32 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Renderer {
    width: usize,
    height: usize,
    scale: f32,
}

impl Renderer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            scale: height as f32 / VIEW_HEIGHT,
        }
    }

    /// World width covered by one frame.
    pub fn view_width(&self) -> f32 {
        self.width as f32 / self.scale
    }

    /// Left edge of the view; the player sits a third of the way across.
    pub fn camera_x(&self, player: &Player) -> f32 {
        (player.x - self.view_width() / 3.0).max(0.0)
    }

    pub fn render(&self, level: &Level, player: &Player) -> RgbFrame {
        let camera = self.camera_x(player);
        let mut data = Vec::with_capacity(self.width * self.height * 3);

        for row in 0..self.height {
            let world_y = (self.height - 1 - row) as f32 / self.scale;
            for col in 0..self.width {
                let world_x = camera + col as f32 / self.scale;
                data.extend_from_slice(&self.colour_at(level, player, world_x, world_y));
            }
        }

        RgbFrame {
            width: self.width,
            height: self.height,
            data,
        }
    }

    fn colour_at(&self, level: &Level, player: &Player, x: f32, y: f32) -> [u8; 3] {
        if x >= player.x
            && x < player.x + PLAYER_WIDTH
            && y >= player.y
            && y < player.y + PLAYER_HEIGHT
        {
            return PLAYER;
        }

        let solid = level.height(column_of(x)) as f32 * TILE;
        if y < solid {
            return if y >= GROUND_TILES as f32 * TILE {
                PIPE
            } else {
                GROUND
            };
        }

        let pole_x = level.flag_x();
        if x >= pole_x && x < pole_x + POLE_WIDTH && y < (GROUND_TILES + FLAG_TILES) as f32 * TILE
        {
            return POLE;
        }

        SKY
    }
}
