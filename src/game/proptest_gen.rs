//! Property-based test generators for fighter input

use proptest::prelude::*;

use super::fighter::{Direction, FighterInput};
use super::FrameInput;

pub fn direction_strategy() -> impl Strategy<Value = Option<Direction>> {
    prop_oneof![Just(None), Just(Some(Direction::Left)), Just(Some(Direction::Right))]
}

pub fn fighter_input_strategy() -> impl Strategy<Value = FighterInput> {
    (
        any::<bool>(),
        any::<bool>(),
        direction_strategy(),
        any::<bool>(),
        // Attack presses are sparse so swings get to play out
        prop::bool::weighted(0.15),
    )
        .prop_map(|(left, right, last_pressed, jump_requested, attack_requested)| FighterInput {
            left,
            right,
            last_pressed,
            jump_requested,
            attack_requested,
        })
}

pub fn frame_input_strategy() -> impl Strategy<Value = FrameInput> {
    (fighter_input_strategy(), fighter_input_strategy())
        .prop_map(|(player, enemy)| FrameInput { player, enemy })
}

/// Up to ten seconds of frames
pub fn frame_sequence_strategy() -> impl Strategy<Value = Vec<FrameInput>> {
    prop::collection::vec(frame_input_strategy(), 1..600)
}
