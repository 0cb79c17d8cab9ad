//! The [`Game`] implementation tying level, physics and renderer together.

use curiosity_rl::{EnvError, Game, GameInfo, GameStep, RgbFrame};
use log::debug;

use crate::actions::ActionSet;
use crate::config::SideScrollerConfig;
use crate::constants::{DEATH_PENALTY, REWARD_LIMIT};
use crate::level::Level;
use crate::physics::{step_player, Player};
use crate::renderer::Renderer;

/// Why a life ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Death {
    Pit,
    Timeout,
}

/// Deterministic side-scrolling platformer.
///
/// Reward per step is the horizontal progress made, plus
/// [`DEATH_PENALTY`] when a life is lost, clipped to `±REWARD_LIMIT`.
/// Reaching the flag moves on to the next stage; clearing the last stage or
/// losing the last life ends the game.
pub struct SideScroller {
    config: SideScrollerConfig,
    renderer: Renderer,
    level: Level,
    player: Player,
    stage: u32,
    lives: i32,
    steps_in_life: usize,
    game_over: bool,
}

impl SideScroller {
    pub fn new(config: SideScrollerConfig) -> Result<Self, String> {
        config.validate()?;
        let renderer = Renderer::new(config.width, config.height);
        let level = Level::generate(config.seed, 1, config.level_tiles);
        let player = Player::spawn(&level);
        Ok(Self {
            lives: config.lives,
            config,
            renderer,
            level,
            player,
            stage: 1,
            steps_in_life: 0,
            game_over: false,
        })
    }

    /// One game per worker, each with a distinct seed.
    pub fn for_workers(config: &SideScrollerConfig, count: usize) -> Result<Vec<Self>, String> {
        (0..count)
            .map(|i| Self::new(config.clone().with_seed(config.seed.wrapping_add(i as u64))))
            .collect()
    }

    pub fn config(&self) -> &SideScrollerConfig {
        &self.config
    }

    pub fn action_set(&self) -> ActionSet {
        self.config.action_set
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn stage(&self) -> u32 {
        self.stage
    }

    pub fn lives(&self) -> i32 {
        self.lives
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub fn render(&self) -> RgbFrame {
        self.renderer.render(&self.level, &self.player)
    }

    fn load_stage(&mut self, stage: u32) {
        self.stage = stage;
        self.level = Level::generate(self.config.seed, stage, self.config.level_tiles);
        self.respawn();
    }

    fn respawn(&mut self) {
        self.player = Player::spawn(&self.level);
        self.steps_in_life = 0;
    }

    fn info(&self, flag_get: bool) -> GameInfo {
        GameInfo {
            life: self.lives,
            stage: self.stage,
            x_pos: self.player.x as i32,
            flag_get,
        }
    }
}

impl Game for SideScroller {
    fn reset(&mut self) -> Result<RgbFrame, EnvError> {
        self.lives = self.config.lives;
        self.game_over = false;
        self.load_stage(1);
        Ok(self.render())
    }

    fn step(&mut self, action: usize) -> Result<GameStep, EnvError> {
        if self.game_over {
            return Err(EnvError::Simulation(
                "step called after game over, reset first".to_string(),
            ));
        }
        let buttons = *self
            .config
            .action_set
            .buttons()
            .get(action)
            .ok_or(EnvError::InvalidAction {
                action,
                n_actions: self.config.action_set.len(),
            })?;

        let mut reward = 0.0;
        let mut death = None;
        let mut flag_get = false;
        for _ in 0..self.config.frame_skip {
            let frame = step_player(&mut self.player, &self.level, buttons);
            reward += frame.dx;
            if frame.fell {
                death = Some(Death::Pit);
                break;
            }
            if self.player.x >= self.level.flag_x() {
                flag_get = true;
                break;
            }
        }

        self.steps_in_life += 1;
        if death.is_none() && !flag_get && self.steps_in_life >= self.config.time_limit {
            death = Some(Death::Timeout);
        }

        let mut done = false;
        if let Some(cause) = death {
            reward += DEATH_PENALTY;
            self.lives -= 1;
            debug!(
                "{}: life lost ({:?}) on stage {}, {} left",
                self.config.env_id, cause, self.stage, self.lives
            );
            if self.lives <= 0 {
                self.lives = 0;
                done = true;
            } else {
                self.respawn();
            }
        } else if flag_get {
            debug!("{}: stage {} cleared", self.config.env_id, self.stage);
            if self.stage >= self.config.stages {
                done = true;
            } else {
                self.load_stage(self.stage + 1);
            }
        }

        self.game_over = done;
        let info = self.info(flag_get);
        Ok(GameStep {
            frame: self.render(),
            reward: reward.clamp(-REWARD_LIMIT, REWARD_LIMIT),
            done,
            info,
        })
    }

    fn n_actions(&self) -> usize {
        self.config.action_set.len()
    }

    fn id(&self) -> &str {
        &self.config.env_id
    }
}
