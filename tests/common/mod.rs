#![allow(dead_code)]

use interval_damper::{DeckParams, ReviewData, ReviewState, SchedulingStates};

pub fn review(ease_factor: f64, scheduled_days: f64) -> ReviewState {
    ReviewState::Review(ReviewData {
        ease_factor,
        scheduled_days,
    })
}

/// A review card at 250% ease with the candidate spread used throughout the
/// scenario tests.
pub fn review_states(cur_ivl: f64) -> SchedulingStates {
    SchedulingStates {
        current: review(2.5, cur_ivl),
        again: review(2.5, 1.0),
        hard: review(2.5, 110.0),
        good: review(2.5, 220.0),
        easy: review(2.5, 280.0),
    }
}

/// Override table: a parent deck, one of its subtrees, and the global record.
pub fn deck_table() -> Vec<DeckParams> {
    vec![
        DeckParams::global(200.0, 0.0),
        DeckParams {
            deck_path_prefix: "A".to_string(),
            days_upper: Some(250.0),
            ..DeckParams::default()
        },
        DeckParams {
            deck_path_prefix: "A::B".to_string(),
            days_upper: Some(100.0),
            min_again_mult: Some(0.25),
        },
    ]
}
