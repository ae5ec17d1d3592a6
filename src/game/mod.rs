//! Game simulation modules

pub mod character;
pub mod clock;
pub mod combat;
pub mod fighter;
pub mod input;
pub mod r#match;
pub mod physics;
#[cfg(test)]
pub(crate) mod proptest_gen;
pub mod replay;
pub mod snapshot;
pub mod sprite;

pub use character::{AssetLoader, CharacterDef, CharacterError, Roster};
pub use clock::{MatchClock, Outcome};
pub use fighter::{Direction, Fighter, FighterInput};
pub use r#match::{HostEvent, MatchError, MatchHandle, MatchPhase, MatchRunner, MatchSession, TickReport};
pub use snapshot::MatchSnapshot;

use serde::{Deserialize, Serialize};

/// Which combatant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Player,
    Enemy,
}

impl Side {
    pub fn opponent(self) -> Self {
        match self {
            Side::Player => Side::Enemy,
            Side::Enemy => Side::Player,
        }
    }
}

/// Input state for a single tick, both sides
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameInput {
    pub player: FighterInput,
    pub enemy: FighterInput,
}
