//! Per-episode bookkeeping, forced termination and reward shaping.
//!
//! Both strategies are picked once when the worker is built, so each
//! worker's per-step contract is a single match arm rather than flags
//! checked all over the step loop.

use std::collections::VecDeque;

use super::GameInfo;

/// Raw rewards are divided by this to land roughly in `[-1, 1]`.
pub const REWARD_CLIP: f32 = 15.0;

/// How many finished episode returns are kept for the running average.
const RECENT_RETURNS: usize = 100;

/// Decides when a trajectory ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationPolicy {
    /// Losing a life ends the trajectory even if the game continues.
    LifeLoss,
    /// Only the emulator's own game-over ends the trajectory.
    GameOver,
}

impl TerminationPolicy {
    pub fn from_life_done(life_done: bool) -> Self {
        if life_done {
            TerminationPolicy::LifeLoss
        } else {
            TerminationPolicy::GameOver
        }
    }
}

/// Shaped reward used for policy learning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RewardShaping {
    /// Log-scaled game reward with stage and death overrides.
    Extrinsic {
        stage_bonus: f32,
        death_penalty: f32,
    },
    /// Sparse distance milestones; curiosity supplies the dense signal.
    Curiosity {
        distance_bonus: f32,
        distance_step: i32,
    },
}

impl RewardShaping {
    pub fn extrinsic() -> Self {
        RewardShaping::Extrinsic {
            stage_bonus: 5.0,
            death_penalty: -10.0,
        }
    }

    pub fn curiosity() -> Self {
        RewardShaping::Curiosity {
            distance_bonus: 1.0,
            distance_step: 100,
        }
    }

    pub fn for_icm(use_icm: bool) -> Self {
        if use_icm {
            Self::curiosity()
        } else {
            Self::extrinsic()
        }
    }
}

/// What one emulator step means for the learner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutcome {
    pub shaped_reward: f32,
    pub log_reward: f32,
    /// Trajectory cut by the termination policy.
    pub forced_done: bool,
    /// Game over reported by the emulator.
    pub natural_done: bool,
}

impl StepOutcome {
    /// The worker resets on either kind of termination.
    pub fn episode_ended(&self) -> bool {
        self.forced_done || self.natural_done
    }
}

/// Mutable state of the episode a worker is currently playing.
#[derive(Debug, Clone)]
pub struct EpisodeState {
    pub steps: usize,
    pub episode: usize,
    pub total_log_reward: f32,
    pub lives: i32,
    pub stage: u32,
    pub max_pos: i32,
    initial_lives: i32,
    recent_returns: VecDeque<f32>,
}

impl EpisodeState {
    pub fn new(initial_lives: i32) -> Self {
        Self {
            steps: 0,
            episode: 0,
            total_log_reward: 0.0,
            lives: initial_lives,
            stage: 1,
            max_pos: 0,
            initial_lives,
            recent_returns: VecDeque::with_capacity(RECENT_RETURNS),
        }
    }

    /// Apply one emulator step and compute the shaped reward.
    pub fn advance(
        &mut self,
        raw_reward: f32,
        natural_done: bool,
        info: &GameInfo,
        termination: TerminationPolicy,
        shaping: RewardShaping,
    ) -> StepOutcome {
        let forced_done = match termination {
            TerminationPolicy::LifeLoss => {
                let lost_life = self.lives > info.life && info.life > 0;
                self.lives = info.life;
                lost_life || natural_done
            }
            TerminationPolicy::GameOver => natural_done,
        };

        let log_reward = raw_reward / REWARD_CLIP;
        self.total_log_reward += log_reward;
        self.steps += 1;

        let stage_advanced = info.flag_get || self.stage < info.stage;
        if stage_advanced {
            self.stage = self.stage.max(info.stage);
        }

        let shaped_reward = match shaping {
            RewardShaping::Extrinsic {
                stage_bonus,
                death_penalty,
            } => {
                if forced_done {
                    death_penalty
                } else if stage_advanced {
                    stage_bonus
                } else {
                    log_reward
                }
            }
            RewardShaping::Curiosity {
                distance_bonus,
                distance_step,
            } => {
                let mut r = 0.0;
                if !stage_advanced {
                    if self.max_pos < info.x_pos {
                        let previous = self.max_pos;
                        self.max_pos = info.x_pos;
                        if crossed_milestone(previous, self.max_pos, distance_step) {
                            r = distance_bonus;
                        }
                    }
                    if forced_done {
                        self.max_pos = 0;
                    }
                }
                r
            }
        };

        StepOutcome {
            shaped_reward,
            log_reward,
            forced_done,
            natural_done,
        }
    }

    /// Record the finished episode and start a fresh one.
    pub fn finish_episode(&mut self) {
        if self.recent_returns.len() == RECENT_RETURNS {
            self.recent_returns.pop_front();
        }
        self.recent_returns.push_back(self.total_log_reward);

        self.steps = 0;
        self.episode += 1;
        self.total_log_reward = 0.0;
        self.lives = self.initial_lives;
        self.stage = 1;
        self.max_pos = 0;
    }

    /// Mean return over the last finished episodes.
    pub fn recent_mean_return(&self) -> f32 {
        if self.recent_returns.is_empty() {
            0.0
        } else {
            self.recent_returns.iter().sum::<f32>() / self.recent_returns.len() as f32
        }
    }
}

fn crossed_milestone(previous: i32, current: i32, step: i32) -> bool {
    if step <= 0 {
        return false;
    }
    current.div_euclid(step) > previous.div_euclid(step)
}
