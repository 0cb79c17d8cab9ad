use burn::backend::{Autodiff, NdArray};
use burn::optim::AdamConfig;

use super::*;
use crate::algorithms::policy_loss::LossMode;
use crate::error::TrainError;
use crate::nn::{IcmPpoModel, IcmPpoModelConfig};
use crate::runners::ConfigError;

type B = Autodiff<NdArray<f32>>;

const HISTORY: usize = 2;
const SIZE: usize = 36;
const N_ACTIONS: usize = 3;
const STATE_LEN: usize = HISTORY * SIZE * SIZE;

fn agent_config(loss_mode: LossMode, batch_size: usize) -> AgentConfig {
    AgentConfig {
        state_shape: [HISTORY, SIZE, SIZE],
        ppo_eps: 0.2,
        epoch: 2,
        batch_size,
        clip_grad_norm: 0.5,
        eta: 1.0,
        loss_mode,
    }
}

fn model(use_icm: bool) -> IcmPpoModel<B> {
    IcmPpoModelConfig::new(HISTORY, SIZE, SIZE, N_ACTIONS)
        .with_hidden(16)
        .with_feature_dim(8)
        .with_icm(use_icm)
        .init(&Default::default())
}

fn curiosity_mode() -> LossMode {
    LossMode::Curiosity {
        icm_scale: 10.0,
        beta: 0.2,
    }
}

fn states(rows: usize, seed: u64) -> Vec<f32> {
    let mut rng = fastrand::Rng::with_seed(seed);
    (0..rows * STATE_LEN).map(|_| rng.f32()).collect()
}

macro_rules! make_agent {
    ($use_icm:expr, $mode:expr, $bs:expr) => {
        Agent::new(
            model($use_icm),
            AdamConfig::new().init::<B, IcmPpoModel<B>>(),
            agent_config($mode, $bs),
            Default::default(),
        )
    };
}

#[test]
fn test_curiosity_mode_requires_curiosity_module() {
    let result = make_agent!(false, curiosity_mode(), 4);
    assert!(matches!(
        result,
        Err(TrainError::Config(ConfigError::MissingCuriosity))
    ));
}

#[test]
fn test_get_action_returns_valid_indices() {
    let agent = make_agent!(true, curiosity_mode(), 4).unwrap();
    let actions = agent.get_action(&states(5, 1)).unwrap();
    assert_eq!(actions.len(), 5);
    assert!(actions.iter().all(|&a| a < N_ACTIONS));
}

#[test]
fn test_zero_draw_selects_first_action() {
    let agent = make_agent!(true, curiosity_mode(), 4).unwrap();
    let actions = agent
        .get_action_with_draws(&states(3, 2), &[0.0, 0.0, 0.0])
        .unwrap();
    assert_eq!(actions, vec![0, 0, 0]);
}

#[test]
fn test_draw_count_must_match_rows() {
    let agent = make_agent!(true, curiosity_mode(), 4).unwrap();
    let result = agent.get_action_with_draws(&states(3, 2), &[0.5]);
    assert!(matches!(
        result,
        Err(TrainError::ActionCount {
            expected: 3,
            got: 1
        })
    ));
}

#[test]
fn test_probabilities_sum_to_one() {
    let agent = make_agent!(true, curiosity_mode(), 2).unwrap();
    let probs = agent.action_probabilities(&states(5, 3)).unwrap();
    assert_eq!(probs.len(), 5 * N_ACTIONS);
    for row in probs.chunks(N_ACTIONS) {
        assert!((row.iter().sum::<f32>() - 1.0).abs() < 1e-5);
    }
}

#[test]
fn test_intrinsic_reward_is_non_negative() {
    let agent = make_agent!(true, curiosity_mode(), 2).unwrap();
    let rewards = agent
        .compute_intrinsic_reward(&states(5, 4), &states(5, 5), &[0, 1, 2, 1, 0])
        .unwrap();
    assert_eq!(rewards.len(), 5);
    assert!(rewards.iter().all(|&r| r >= 0.0 && r.is_finite()));
}

#[test]
fn test_intrinsic_reward_rejects_out_of_range_action() {
    let agent = make_agent!(true, curiosity_mode(), 4).unwrap();
    let result = agent.compute_intrinsic_reward(&states(2, 4), &states(2, 5), &[N_ACTIONS, 0]);
    assert!(matches!(
        result,
        Err(TrainError::InvalidAction {
            action: N_ACTIONS,
            n_actions: N_ACTIONS
        })
    ));
}

#[test]
fn test_intrinsic_reward_zero_without_curiosity() {
    let agent = make_agent!(false, LossMode::Entropy { entropy_coef: 0.02 }, 2).unwrap();
    let rewards = agent
        .compute_intrinsic_reward(&states(3, 4), &states(3, 5), &[0, 1, 2])
        .unwrap();
    assert_eq!(rewards, vec![0.0; 3]);
}

#[test]
fn test_forward_transition_shapes() {
    let agent = make_agent!(true, curiosity_mode(), 2).unwrap();
    let values = agent.forward_transition(&states(5, 6), &states(5, 7)).unwrap();
    assert_eq!(values.value.len(), 5);
    assert_eq!(values.next_value.len(), 5);
    assert_eq!(values.logits.len(), 5 * N_ACTIONS);
}

#[test]
fn test_forward_transition_rejects_mismatched_rows() {
    let agent = make_agent!(true, curiosity_mode(), 2).unwrap();
    let result = agent.forward_transition(&states(5, 6), &states(4, 7));
    assert!(matches!(result, Err(TrainError::Rollout(_))));
}

#[test]
fn test_train_model_runs_every_minibatch() {
    let mut agent = make_agent!(true, curiosity_mode(), 3).unwrap();
    let n = 7;
    let batch = TrainBatch {
        states: states(n, 8),
        next_states: states(n, 9),
        actions: (0..n).map(|i| i % N_ACTIONS).collect(),
        returns: vec![0.5; n],
        advantages: (0..n).map(|i| i as f32 - 3.0).collect(),
    };
    let stats = agent.train_model(&batch, 1e-3).unwrap();
    // 7 samples / 3 per minibatch = 2 full minibatches, 2 epochs
    assert_eq!(stats.updates, 4);
    assert!(stats.mean_loss.is_finite());
    assert!(stats.mean_grad_norm > 0.0);
}

#[test]
fn test_train_model_rejects_out_of_range_action() {
    let mut agent = make_agent!(false, LossMode::Entropy { entropy_coef: 0.02 }, 2).unwrap();
    let n = 4;
    let batch = TrainBatch {
        states: states(n, 13),
        next_states: states(n, 14),
        actions: vec![0, 1, N_ACTIONS + 2, 2],
        returns: vec![0.0; n],
        advantages: vec![1.0; n],
    };
    let result = agent.train_model(&batch, 1e-3);
    assert!(matches!(
        result,
        Err(TrainError::InvalidAction { action, n_actions: N_ACTIONS }) if action == N_ACTIONS + 2
    ));
}

#[test]
fn test_positive_advantage_raises_action_probability() {
    let mut agent = make_agent!(false, LossMode::Entropy { entropy_coef: 0.0 }, 4).unwrap();
    let n = 8;
    let obs = states(n, 10);
    let values = agent.forward_transition(&obs, &obs).unwrap();
    let before = agent.action_probabilities(&obs).unwrap();

    let batch = TrainBatch {
        states: obs.clone(),
        next_states: obs.clone(),
        actions: vec![0; n],
        returns: values.value,
        advantages: vec![1.0; n],
    };
    agent.train_model(&batch, 1e-2).unwrap();

    let after = agent.action_probabilities(&obs).unwrap();
    let mean_first = |p: &[f32]| p.chunks(N_ACTIONS).map(|r| r[0]).sum::<f32>() / n as f32;
    assert!(mean_first(&after) > mean_first(&before));
}

#[test]
fn test_nan_advantage_is_numerical_instability() {
    let mut agent = make_agent!(false, LossMode::Entropy { entropy_coef: 0.02 }, 2).unwrap();
    let n = 4;
    let batch = TrainBatch {
        states: states(n, 11),
        next_states: states(n, 12),
        actions: vec![1; n],
        returns: vec![0.0; n],
        advantages: vec![f32::NAN; n],
    };
    let result = agent.train_model(&batch, 1e-3);
    assert!(matches!(
        result,
        Err(TrainError::NumericalInstability {
            epoch: 0,
            minibatch: 0,
            ..
        })
    ));
}

#[test]
fn test_mean_max_prob_uniform_logits() {
    let logits = vec![0.0; 4 * N_ACTIONS];
    assert!((mean_max_prob(&logits, N_ACTIONS) - 1.0 / N_ACTIONS as f32).abs() < 1e-6);
}

#[test]
fn test_mean_max_prob_peaked_logits() {
    let logits = vec![50.0, 0.0, 0.0];
    assert!((mean_max_prob(&logits, N_ACTIONS) - 1.0).abs() < 1e-6);
}
