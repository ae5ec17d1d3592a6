//! Match countdown and outcome decision

use serde::{Deserialize, Serialize};

/// Seconds on the clock at the start of a match
pub const DEFAULT_MATCH_SECONDS: u32 = 60;

/// How a match ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    #[default]
    None,
    Tie,
    PlayerWins,
    EnemyWins,
}

impl Outcome {
    pub fn is_decided(self) -> bool {
        self != Outcome::None
    }

    /// Banner shown on the game over screen
    pub fn display_text(self) -> &'static str {
        match self {
            Outcome::None => "",
            Outcome::Tie => "Tie",
            Outcome::PlayerWins => "Player 1 Wins",
            Outcome::EnemyWins => "Player 2 Wins",
        }
    }
}

/// Equal health ties; otherwise the healthier side wins
pub fn determine_winner(player_health: i32, enemy_health: i32) -> Outcome {
    use std::cmp::Ordering;

    match player_health.cmp(&enemy_health) {
        Ordering::Equal => Outcome::Tie,
        Ordering::Greater => Outcome::PlayerWins,
        Ordering::Less => Outcome::EnemyWins,
    }
}

/// Whole-second countdown
#[derive(Debug, Clone)]
pub struct MatchClock {
    initial: u32,
    remaining: u32,
}

impl MatchClock {
    pub fn new(seconds: u32) -> Self {
        Self {
            initial: seconds,
            remaining: seconds,
        }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn is_expired(&self) -> bool {
        self.remaining == 0
    }

    /// Count one second down. Returns true on the second that reaches zero.
    pub fn tick_second(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        self.remaining == 0
    }

    pub fn reset(&mut self) {
        self.remaining = self.initial;
    }
}

impl Default for MatchClock {
    fn default() -> Self {
        Self::new(DEFAULT_MATCH_SECONDS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_health_is_a_tie() {
        assert_eq!(determine_winner(100, 100), Outcome::Tie);
        assert_eq!(determine_winner(0, 0), Outcome::Tie);
    }

    #[test]
    fn healthier_side_wins() {
        assert_eq!(determine_winner(40, 60), Outcome::EnemyWins);
        assert_eq!(determine_winner(60, 40), Outcome::PlayerWins);
        assert_eq!(Outcome::EnemyWins.display_text(), "Player 2 Wins");
    }

    #[test]
    fn clock_reports_expiry_once() {
        let mut clock = MatchClock::new(2);
        assert!(!clock.tick_second());
        assert!(clock.tick_second());
        assert!(clock.is_expired());
        assert!(!clock.tick_second());
        assert_eq!(clock.remaining(), 0);

        clock.reset();
        assert_eq!(clock.remaining(), 2);
    }
}
