//! # side_scroller
//!
//! A small deterministic platformer implementing [`curiosity_rl::Game`].
//!
//! The player runs right across procedurally generated terrain (pits,
//! pipes and raised steps) towards a flag at the end of each stage. Levels
//! depend only on `(seed, stage)`, so runs are reproducible.
//!
//! ```rust,ignore
//! use curiosity_rl::Game;
//! use side_scroller::{SideScroller, SideScrollerConfig};
//!
//! let mut game = SideScroller::new(SideScrollerConfig::new().with_seed(3))?;
//! let frame = game.reset()?;
//! let step = game.step(1)?; // walk right
//! ```

pub mod actions;
pub mod config;
pub mod constants;
pub mod game;
pub mod level;
pub mod physics;
pub mod renderer;

#[cfg(test)]
mod tests;

pub use actions::{ActionSet, Buttons};
pub use config::SideScrollerConfig;
pub use game::{Death, SideScroller};
pub use level::Level;
pub use physics::{step_player, FrameResult, Player};
pub use renderer::Renderer;
