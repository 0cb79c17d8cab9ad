//! Procedurally generated terrain.
//!
//! A level is a row of columns, each with a solid height in tiles. Height 0
//! is a pit. Generation is a pure function of `(seed, stage)`, so every
//! worker playing the same stage sees the same terrain.

use crate::constants::{GROUND_TILES, SAFE_TILES, TILE};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Level {
    columns: Vec<u8>,
    flag_column: usize,
}

impl Level {
    /// Flat ground of `length` columns with the flag near the end.
    pub fn flat(length: usize) -> Self {
        let length = length.max(2 * SAFE_TILES);
        Self {
            columns: vec![GROUND_TILES; length],
            flag_column: length - SAFE_TILES / 2,
        }
    }

    /// Build from explicit column heights; the flag sits `SAFE_TILES / 2`
    /// columns before the end.
    pub fn from_columns(columns: Vec<u8>) -> Self {
        let flag_column = columns.len().saturating_sub(SAFE_TILES / 2);
        Self {
            columns,
            flag_column,
        }
    }

    /// Pits get wider and pipes taller as the stage number grows.
    pub fn generate(seed: u64, stage: u32, length: usize) -> Self {
        let length = length.max(2 * SAFE_TILES);
        let mut rng = fastrand::Rng::with_seed(seed ^ (stage as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15));
        let difficulty = stage.min(4) as usize;
        let end = length - SAFE_TILES;

        let mut columns = vec![GROUND_TILES; SAFE_TILES];
        while columns.len() < end {
            match rng.usize(0..4) {
                0 => {
                    let run = rng.usize(3..9);
                    columns.extend(std::iter::repeat(GROUND_TILES).take(run));
                }
                1 => {
                    let width = rng.usize(1..=1 + difficulty.min(2));
                    columns.extend(std::iter::repeat(0).take(width));
                    columns.extend(std::iter::repeat(GROUND_TILES).take(2));
                }
                2 => {
                    let height = GROUND_TILES + rng.u8(1..=(1 + difficulty as u8).min(3));
                    columns.extend([height, height]);
                    columns.extend(std::iter::repeat(GROUND_TILES).take(2));
                }
                _ => {
                    let width = rng.usize(2..5);
                    columns.extend(std::iter::repeat(GROUND_TILES + 1).take(width));
                }
            }
        }
        columns.truncate(end);
        columns.extend(std::iter::repeat(GROUND_TILES).take(SAFE_TILES));

        Self::from_columns(columns)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Solid height of a column in tiles. Left of the level is a wall, right
    /// of it is ordinary ground.
    pub fn height(&self, column: i64) -> u8 {
        if column < 0 {
            return u8::MAX;
        }
        self.columns
            .get(column as usize)
            .copied()
            .unwrap_or(GROUND_TILES)
    }

    /// Solid height in pixels of the column containing world x `x`.
    pub fn height_px_at(&self, x: f32) -> f32 {
        self.height(column_of(x)) as f32 * TILE
    }

    pub fn is_pit(&self, column: i64) -> bool {
        self.height(column) == 0
    }

    pub fn flag_column(&self) -> usize {
        self.flag_column
    }

    /// World x of the flag pole.
    pub fn flag_x(&self) -> f32 {
        self.flag_column as f32 * TILE
    }

    pub fn columns(&self) -> &[u8] {
        &self.columns
    }
}

pub fn column_of(x: f32) -> i64 {
    (x / TILE).floor() as i64
}
