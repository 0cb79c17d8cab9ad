//! Worker and pool behaviour against scripted games.

use super::*;

/// Plays back a fixed list of steps; the frame brightness encodes the step.
struct ScriptedGame {
    script: Vec<(f32, bool, GameInfo)>,
    cursor: usize,
    fail_at: Option<usize>,
    panic_at: Option<usize>,
    fail_reset: bool,
}

impl ScriptedGame {
    fn new(script: Vec<(f32, bool, GameInfo)>) -> Self {
        Self {
            script,
            cursor: 0,
            fail_at: None,
            panic_at: None,
            fail_reset: false,
        }
    }

    fn walking(steps: usize) -> Self {
        let script = (0..steps)
            .map(|i| {
                (
                    1.5,
                    false,
                    GameInfo {
                        life: 3,
                        stage: 1,
                        x_pos: 10 * (i as i32 + 1),
                        flag_get: false,
                    },
                )
            })
            .collect();
        Self::new(script)
    }

    fn frame(level: u8) -> RgbFrame {
        RgbFrame::solid(8, 8, [level, level, level])
    }
}

impl Game for ScriptedGame {
    fn reset(&mut self) -> Result<RgbFrame, EnvError> {
        if self.fail_reset {
            return Err(EnvError::Simulation("no rom loaded".into()));
        }
        Ok(Self::frame(0))
    }

    fn step(&mut self, _action: usize) -> Result<GameStep, EnvError> {
        if self.panic_at == Some(self.cursor) {
            panic!("emulator crashed");
        }
        if self.fail_at == Some(self.cursor) {
            return Err(EnvError::Simulation("rom fault".into()));
        }
        let (reward, done, info) = self.script[self.cursor % self.script.len()];
        self.cursor += 1;
        Ok(GameStep {
            frame: Self::frame((self.cursor * 10).min(255) as u8),
            reward,
            done,
            info,
        })
    }

    fn n_actions(&self) -> usize {
        3
    }

    fn id(&self) -> &str {
        "scripted"
    }
}

fn small_config(shaping: RewardShaping, termination: TerminationPolicy) -> WorkerConfig {
    WorkerConfig {
        history_depth: 4,
        preprocessor: FramePreprocessor::new(4, 4),
        termination,
        shaping,
        initial_lives: 3,
    }
}

fn info(life: i32, x_pos: i32) -> GameInfo {
    GameInfo {
        life,
        stage: 1,
        x_pos,
        flag_get: false,
    }
}

#[test]
fn test_worker_fills_history_on_construction() {
    let config = small_config(RewardShaping::extrinsic(), TerminationPolicy::GameOver);
    let worker = EnvironmentWorker::new(0, ScriptedGame::walking(4), config).unwrap();
    assert_eq!(worker.history().as_slice().len(), 4 * 16);
    assert!(worker.history().as_slice().iter().all(|&v| v == 0.0));
    assert_eq!(worker.phase(), WorkerPhase::AwaitingAction);
}

#[test]
fn test_worker_history_holds_recent_frames_oldest_first() {
    let config = small_config(RewardShaping::extrinsic(), TerminationPolicy::GameOver);
    let mut worker = EnvironmentWorker::new(0, ScriptedGame::walking(8), config).unwrap();
    for _ in 0..4 {
        worker.step(0).unwrap();
    }
    let history = worker.history();
    for i in 0..4 {
        let expected = ((i + 1) * 10) as f32 / 255.0;
        assert!(history.frame(i).iter().all(|&v| (v - expected).abs() < 1e-4));
    }
}

#[test]
fn test_life_loss_forces_done_and_resets() {
    let script = vec![(0.0, false, info(3, 20)), (0.0, false, info(2, 30))];
    let game = ScriptedGame::new(script);
    let config = small_config(RewardShaping::extrinsic(), TerminationPolicy::LifeLoss);
    let mut worker = EnvironmentWorker::new(1, game, config).unwrap();

    let first = worker.step(1).unwrap();
    assert!(!first.done);

    let second = worker.step(1).unwrap();
    assert!(second.done);
    assert!(!second.natural_done);
    assert!(!second.placeholder);
    assert_eq!(second.shaped_reward, -10.0);
    assert_eq!(worker.episode().episode, 1);
    assert_eq!(worker.episode().lives, 3);
    // History rebuilt from the reset frame.
    assert!(second.history.iter().all(|&v| v == 0.0));
}

#[test]
fn test_life_loss_ignored_under_game_over_policy() {
    let script = vec![(0.0, false, info(2, 30))];
    let config = small_config(RewardShaping::extrinsic(), TerminationPolicy::GameOver);
    let mut worker = EnvironmentWorker::new(0, ScriptedGame::new(script), config).unwrap();
    let reply = worker.step(0).unwrap();
    assert!(!reply.done);
    assert_eq!(worker.episode().episode, 0);
}

#[test]
fn test_worker_rejects_out_of_range_action() {
    let config = WorkerConfig {
        preprocessor: FramePreprocessor::new(4, 4),
        ..WorkerConfig::default()
    };
    let mut worker = EnvironmentWorker::new(0, ScriptedGame::walking(2), config).unwrap();
    assert!(matches!(
        worker.step(7),
        Err(EnvError::InvalidAction {
            action: 7,
            n_actions: 3
        })
    ));
}

#[test]
fn test_pool_round_preserves_worker_order() {
    let config = small_config(RewardShaping::extrinsic(), TerminationPolicy::GameOver);
    let games = vec![
        ScriptedGame::new(vec![(15.0, false, info(3, 10))]),
        ScriptedGame::new(vec![(-15.0, false, info(3, 10))]),
        ScriptedGame::new(vec![(0.0, true, info(3, 10))]),
    ];
    let mut pool = WorkerPool::spawn(games, config).unwrap();
    assert_eq!(pool.len(), 3);
    assert_eq!(pool.state_len(), 64);
    assert_eq!(pool.initial_states().len(), 3 * 64);

    let batch = pool.step_all(&[0, 1, 2]).unwrap();
    assert_eq!(batch.next_states.len(), 3 * 64);
    assert_eq!(batch.log_rewards, vec![1.0, -1.0, 0.0]);
    assert_eq!(batch.dones, vec![false, false, true]);
    assert_eq!(batch.natural_dones, vec![false, false, true]);
    assert_eq!(batch.placeholders, vec![false; 3]);
    assert_eq!(batch.rewards[2], -10.0);

    pool.shutdown();
}

#[test]
fn test_pool_rejects_wrong_action_count() {
    let config = small_config(RewardShaping::extrinsic(), TerminationPolicy::GameOver);
    let mut pool = WorkerPool::spawn(vec![ScriptedGame::walking(2)], config).unwrap();
    assert!(matches!(
        pool.step_all(&[0, 0]),
        Err(crate::error::TrainError::ActionCount {
            expected: 1,
            got: 2
        })
    ));
}

#[test]
fn test_pool_reports_failing_worker() {
    let config = small_config(RewardShaping::extrinsic(), TerminationPolicy::GameOver);
    let mut failing = ScriptedGame::walking(4);
    failing.fail_at = Some(1);
    let mut pool = WorkerPool::spawn(vec![ScriptedGame::walking(4), failing], config).unwrap();

    pool.step_all(&[0, 0]).unwrap();
    match pool.step_all(&[0, 0]) {
        Err(crate::error::TrainError::WorkerFailed { worker, step, .. }) => {
            assert_eq!(worker, 1);
            assert_eq!(step, 1);
        }
        other => panic!("unexpected result: {:?}", other.map(|b| b.dones)),
    }
}

#[test]
fn test_pool_reports_worker_failing_on_reset() {
    let config = small_config(RewardShaping::extrinsic(), TerminationPolicy::GameOver);
    let mut broken = ScriptedGame::walking(4);
    broken.fail_reset = true;

    match WorkerPool::spawn(vec![ScriptedGame::walking(4), broken], config) {
        Err(crate::error::TrainError::WorkerFailed {
            worker,
            step,
            message,
        }) => {
            assert_eq!(worker, 1);
            assert_eq!(step, 0);
            assert!(message.contains("no rom loaded"));
        }
        Err(other) => panic!("unexpected error: {}", other),
        Ok(_) => panic!("spawn succeeded with a failing reset"),
    }
}

#[test]
fn test_pool_detects_panicked_worker() {
    let config = small_config(RewardShaping::extrinsic(), TerminationPolicy::GameOver);
    let mut crashing = ScriptedGame::walking(4);
    crashing.panic_at = Some(0);
    let mut pool = WorkerPool::spawn(vec![crashing], config).unwrap();

    match pool.step_all(&[0]) {
        Err(crate::error::TrainError::WorkerDisconnected { worker, step }) => {
            assert_eq!(worker, 0);
            assert_eq!(step, 0);
        }
        other => panic!("unexpected result: {:?}", other.map(|b| b.dones)),
    }
}
