//! Scheduler behavior at the boundaries of the step budget.

use super::*;
use crate::runners::TrainingConfig;

mod constant_lr_tests {
    use super::*;

    #[test]
    fn should_return_same_lr_for_any_step() {
        let sched = ConstantLR::new(1e-4);
        assert_eq!(sched.get_lr(0), 1e-4);
        assert_eq!(sched.get_lr(1_000_000), 1e-4);
        assert_eq!(sched.get_lr(usize::MAX), 1e-4);
    }

    #[test]
    #[cfg_attr(debug_assertions, should_panic(expected = "non-negative"))]
    fn should_reject_negative_lr_in_debug() {
        let sched = ConstantLR::new(-0.001);
        assert_eq!(sched.get_lr(0), 0.0);
    }

    #[test]
    #[cfg_attr(debug_assertions, should_panic(expected = "finite"))]
    fn should_reject_nan_lr_in_debug() {
        let sched = ConstantLR::new(f64::NAN);
        assert_eq!(sched.get_lr(0), 0.0);
    }
}

mod linear_decay_tests {
    use super::*;

    #[test]
    fn should_start_at_start_lr() {
        let sched = LinearDecay::to_zero(1e-4, 1000);
        assert_eq!(sched.get_lr(0), 1e-4);
    }

    #[test]
    fn should_follow_linear_formula() {
        let sched = LinearDecay::to_zero(1e-4, 1000);
        let expected = 1e-4 - (250.0 / 1000.0) * 1e-4;
        assert!((sched.get_lr(250) - expected).abs() < 1e-15);
        assert!((sched.get_lr(500) - 5e-5).abs() < 1e-15);
    }

    #[test]
    fn should_floor_at_zero_past_budget() {
        let sched = LinearDecay::to_zero(1e-4, 1000);
        assert_eq!(sched.get_lr(1000), 0.0);
        assert_eq!(sched.get_lr(5000), 0.0);
        assert_eq!(sched.get_lr(usize::MAX), 0.0);
    }

    #[test]
    fn should_hold_end_lr() {
        let sched = LinearDecay::new(1e-3, 1e-5, 100);
        assert_eq!(sched.get_lr(100), 1e-5);
        assert_eq!(sched.get_lr(200), 1e-5);
    }

    #[test]
    fn should_be_monotone_non_increasing() {
        let sched = LinearDecay::to_zero(3e-4, 97);
        let mut prev = f64::INFINITY;
        for step in 0..150 {
            let lr = sched.get_lr(step);
            assert!(lr <= prev);
            assert!(lr >= 0.0);
            prev = lr;
        }
    }

    #[test]
    #[cfg_attr(debug_assertions, should_panic(expected = "total_steps must be > 0"))]
    fn should_reject_zero_budget_in_debug() {
        let sched = LinearDecay::to_zero(1e-4, 0);
        assert_eq!(sched.get_lr(10), 1e-4);
    }
}

mod config_tests {
    use super::*;

    #[test]
    fn should_be_constant_without_schedule() {
        let config = TrainingConfig::new().with_learning_rate(2e-4);
        let sched = scheduler_for(&config);
        assert_eq!(sched.get_lr(0), 2e-4);
        assert_eq!(sched.get_lr(config.max_step), 2e-4);
    }

    #[test]
    fn should_decay_over_max_step_with_schedule() {
        let config = TrainingConfig::new()
            .with_learning_rate(2e-4)
            .with_lr_schedule(true)
            .with_max_step(1_000);
        let sched = scheduler_for(&config);
        assert_eq!(sched.get_lr(0), 2e-4);
        assert!((sched.get_lr(500) - 1e-4).abs() < 1e-15);
        assert_eq!(sched.get_lr(1_000), 0.0);
    }
}
