use proptest::prelude::*;

use crate::constants::{GROUND_TILES, SAFE_TILES};
use crate::level::{column_of, Level};

#[test]
fn test_generation_is_deterministic() {
    assert_eq!(Level::generate(5, 2, 120), Level::generate(5, 2, 120));
}

#[test]
fn test_stages_differ() {
    assert_ne!(
        Level::generate(5, 1, 120).columns(),
        Level::generate(5, 2, 120).columns()
    );
}

#[test]
fn test_short_levels_are_padded_to_safe_zones() {
    let level = Level::generate(0, 1, 3);
    assert_eq!(level.len(), 2 * SAFE_TILES);
    assert!(level.columns().iter().all(|&h| h == GROUND_TILES));
}

#[test]
fn test_out_of_range_columns() {
    let level = Level::flat(20);
    assert_eq!(level.height(-1), u8::MAX);
    assert_eq!(level.height(1_000), GROUND_TILES);
    assert!(!level.is_pit(1_000));
}

#[test]
fn test_flag_sits_inside_the_final_safe_zone() {
    let level = Level::generate(9, 3, 80);
    assert!(level.flag_column() >= level.len() - SAFE_TILES);
    assert!(level.flag_column() < level.len());
}

#[test]
fn test_column_of_floors_negative_positions() {
    assert_eq!(column_of(-0.5), -1);
    assert_eq!(column_of(15.9), 0);
    assert_eq!(column_of(16.0), 1);
}

proptest! {
    #[test]
    fn prop_generated_levels_have_safe_edges(seed in any::<u64>(), stage in 1u32..6, tiles in 16usize..200) {
        let level = Level::generate(seed, stage, tiles);
        prop_assert_eq!(level.len(), tiles);
        let cols = level.columns();
        prop_assert!(cols[..SAFE_TILES].iter().all(|&h| h == GROUND_TILES));
        prop_assert!(cols[tiles - SAFE_TILES..].iter().all(|&h| h == GROUND_TILES));
    }

    #[test]
    fn prop_pits_are_at_most_three_wide(seed in any::<u64>(), stage in 1u32..6) {
        let level = Level::generate(seed, stage, 160);
        let mut run = 0;
        for &h in level.columns() {
            run = if h == 0 { run + 1 } else { 0 };
            prop_assert!(run <= 3);
        }
    }
}
