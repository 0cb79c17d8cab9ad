use curiosity_rl::{EnvError, Game};

use super::{small_config, small_game};
use crate::constants::{DEATH_PENALTY, PLAYER, REWARD_LIMIT, SKY, TILE, WALK_SPEED};
use crate::{ActionSet, SideScroller, SideScrollerConfig};

const NOOP: usize = 0;
const RIGHT: usize = 1;

#[test]
fn test_invalid_config_is_rejected() {
    assert!(SideScroller::new(SideScrollerConfig::new().with_lives(0)).is_err());
    assert!(SideScroller::new(SideScrollerConfig::new().with_frame_skip(0)).is_err());
    assert!(SideScroller::new(SideScrollerConfig::new().with_frame_size(8, 8)).is_err());
}

#[test]
fn test_reset_returns_frame_of_configured_size() {
    let mut game = small_game();
    let frame = game.reset().unwrap();
    assert_eq!((frame.width, frame.height), (36, 36));
    assert_eq!(frame.data.len(), 36 * 36 * 3);
}

#[test]
fn test_frame_shows_sky_and_player() {
    let mut game = SideScroller::new(SideScrollerConfig::new()).unwrap();
    let frame = game.reset().unwrap();
    let pixels: Vec<[u8; 3]> = frame
        .data
        .chunks(3)
        .map(|p| [p[0], p[1], p[2]])
        .collect();
    assert_eq!(pixels[0], SKY);
    assert!(pixels.contains(&PLAYER));
}

#[test]
fn test_action_set_sizes() {
    for (set, n) in [
        (ActionSet::RightOnly, 5),
        (ActionSet::Simple, 7),
        (ActionSet::Complex, 12),
    ] {
        let game = SideScroller::new(small_config().with_action_set(set)).unwrap();
        assert_eq!(game.n_actions(), n);
    }
}

#[test]
fn test_invalid_action_is_an_error() {
    let mut game = small_game();
    game.reset().unwrap();
    let err = game.step(5).unwrap_err();
    assert_eq!(
        err,
        EnvError::InvalidAction {
            action: 5,
            n_actions: 5
        }
    );
}

#[test]
fn test_walking_right_is_rewarded_by_progress() {
    let mut game = small_game();
    game.reset().unwrap();
    let step = game.step(RIGHT).unwrap();
    assert_eq!(step.reward, WALK_SPEED * game.config().frame_skip as f32);
    assert!(!step.done);
    assert_eq!(step.info.life, 3);
    assert_eq!(step.info.stage, 1);
    assert!(step.info.x_pos > 2 * TILE as i32);
}

#[test]
fn test_timeout_costs_a_life() {
    let mut game = SideScroller::new(small_config().with_time_limit(3)).unwrap();
    game.reset().unwrap();
    game.step(NOOP).unwrap();
    game.step(NOOP).unwrap();
    let step = game.step(NOOP).unwrap();
    assert_eq!(step.reward, DEATH_PENALTY);
    assert_eq!(step.info.life, 2);
    assert!(!step.done);
    assert_eq!(game.player().x, crate::constants::SPAWN_X);
}

#[test]
fn test_losing_last_life_ends_game() {
    let mut game = SideScroller::new(small_config().with_time_limit(1).with_lives(2)).unwrap();
    game.reset().unwrap();
    assert!(!game.step(NOOP).unwrap().done);
    let last = game.step(NOOP).unwrap();
    assert!(last.done);
    assert_eq!(last.info.life, 0);
    assert!(game.is_game_over());
    assert!(matches!(game.step(NOOP), Err(EnvError::Simulation(_))));

    game.reset().unwrap();
    assert_eq!(game.lives(), 2);
    assert!(game.step(NOOP).is_ok());
}

#[test]
fn test_reward_is_clipped() {
    let mut game = SideScroller::new(small_config().with_frame_skip(20)).unwrap();
    game.reset().unwrap();
    let step = game.step(3).unwrap(); // right + run: 70 px of progress
    assert_eq!(step.reward, REWARD_LIMIT);
}

/// Flat levels let a walking agent reach the flag.
fn flat_game(stages: u32) -> SideScroller {
    let config = small_config()
        .with_stages(stages)
        .with_level_tiles(16)
        .with_time_limit(10_000);
    SideScroller::new(config).unwrap()
}

fn walk_to_flag(game: &mut SideScroller) -> curiosity_rl::GameStep {
    for _ in 0..1_000 {
        let step = game.step(RIGHT).unwrap();
        if step.info.flag_get {
            return step;
        }
    }
    panic!("flag never reached");
}

#[test]
fn test_flag_advances_stage() {
    let mut game = flat_game(2);
    game.reset().unwrap();
    let step = walk_to_flag(&mut game);
    assert!(!step.done);
    assert_eq!(step.info.stage, 2);
    assert_eq!(game.stage(), 2);
}

#[test]
fn test_clearing_final_stage_ends_game() {
    let mut game = flat_game(1);
    game.reset().unwrap();
    let step = walk_to_flag(&mut game);
    assert!(step.done);
    assert_eq!(step.info.stage, 1);
}

#[test]
fn test_same_seed_same_trajectory() {
    let actions = [1, 2, 1, 4, 0, 3, 1, 2, 2, 1];
    let run = |seed| {
        let mut game = SideScroller::new(small_config().with_seed(seed)).unwrap();
        game.reset().unwrap();
        actions
            .iter()
            .map(|&a| {
                let step = game.step(a).unwrap();
                (step.reward, step.info.x_pos, step.frame.data)
            })
            .collect::<Vec<_>>()
    };
    assert_eq!(run(4), run(4));
}

#[test]
fn test_for_workers_uses_distinct_seeds() {
    let games = SideScroller::for_workers(&small_config(), 3).unwrap();
    let seeds: Vec<u64> = games.iter().map(|g| g.config().seed).collect();
    assert_eq!(seeds, vec![11, 12, 13]);
}
