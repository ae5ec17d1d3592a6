//! Keyboard mapping: raw key events to per-side fighter input

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::fighter::{Direction, FighterInput};
use super::FrameInput;

/// Keys the game listens to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    A,
    D,
    W,
    Space,
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Escape,
}

impl FromStr for Key {
    type Err = UnknownKey;

    /// Accepts DOM `KeyboardEvent.key` names
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "a" | "A" => Ok(Key::A),
            "d" | "D" => Ok(Key::D),
            "w" | "W" => Ok(Key::W),
            " " | "Space" | "space" => Ok(Key::Space),
            "ArrowLeft" => Ok(Key::ArrowLeft),
            "ArrowRight" => Ok(Key::ArrowRight),
            "ArrowUp" => Ok(Key::ArrowUp),
            "ArrowDown" => Ok(Key::ArrowDown),
            "Escape" => Ok(Key::Escape),
            other => Err(UnknownKey(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unmapped key `{0}`")]
pub struct UnknownKey(pub String);

/// Non-movement actions a key can trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostAction {
    TogglePause,
}

/// Key bindings for one side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Controls {
    pub left: Key,
    pub right: Key,
    pub jump: Key,
    pub attack: Key,
}

impl Controls {
    pub const PLAYER: Controls = Controls {
        left: Key::A,
        right: Key::D,
        jump: Key::W,
        attack: Key::Space,
    };

    pub const ENEMY: Controls = Controls {
        left: Key::ArrowLeft,
        right: Key::ArrowRight,
        jump: Key::ArrowUp,
        attack: Key::ArrowDown,
    };
}

#[derive(Debug, Clone, Default)]
struct SideKeys {
    left_held: bool,
    right_held: bool,
    last_pressed: Option<Direction>,
    jump: bool,
    attack: bool,
}

impl SideKeys {
    fn key_down(&mut self, controls: &Controls, key: Key) {
        if key == controls.left {
            self.left_held = true;
            self.last_pressed = Some(Direction::Left);
        } else if key == controls.right {
            self.right_held = true;
            self.last_pressed = Some(Direction::Right);
        } else if key == controls.jump {
            self.jump = true;
        } else if key == controls.attack {
            self.attack = true;
        }
    }

    /// Release never touches the latch
    fn key_up(&mut self, controls: &Controls, key: Key) {
        if key == controls.left {
            self.left_held = false;
        } else if key == controls.right {
            self.right_held = false;
        }
    }

    fn take(&mut self) -> FighterInput {
        let input = FighterInput {
            left: self.left_held,
            right: self.right_held,
            last_pressed: self.last_pressed,
            jump_requested: self.jump,
            attack_requested: self.attack,
        };
        self.jump = false;
        self.attack = false;
        input
    }
}

/// Tracks both sides' keys between frames.
///
/// Held keys persist; jump and attack presses are one-shot and are consumed
/// by the next [`InputMapper::take_frame`].
#[derive(Debug, Clone)]
pub struct InputMapper {
    player_controls: Controls,
    enemy_controls: Controls,
    player: SideKeys,
    enemy: SideKeys,
}

impl InputMapper {
    pub fn new(player_controls: Controls, enemy_controls: Controls) -> Self {
        Self {
            player_controls,
            enemy_controls,
            player: SideKeys::default(),
            enemy: SideKeys::default(),
        }
    }

    pub fn key_down(&mut self, key: Key) -> Option<HostAction> {
        if key == Key::Escape {
            return Some(HostAction::TogglePause);
        }
        self.player.key_down(&self.player_controls, key);
        self.enemy.key_down(&self.enemy_controls, key);
        None
    }

    pub fn key_up(&mut self, key: Key) {
        self.player.key_up(&self.player_controls, key);
        self.enemy.key_up(&self.enemy_controls, key);
    }

    pub fn take_frame(&mut self) -> FrameInput {
        FrameInput {
            player: self.player.take(),
            enemy: self.enemy.take(),
        }
    }

    pub fn reset(&mut self) {
        self.player = SideKeys::default();
        self.enemy = SideKeys::default();
    }
}

impl Default for InputMapper {
    fn default() -> Self {
        Self::new(Controls::PLAYER, Controls::ENEMY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_pressed_key_latches() {
        let mut mapper = InputMapper::default();
        mapper.key_down(Key::A);
        mapper.key_down(Key::D);
        mapper.key_up(Key::D);

        let frame = mapper.take_frame();
        assert!(frame.player.left);
        assert!(!frame.player.right);
        assert_eq!(frame.player.last_pressed, Some(Direction::Right));
        assert_eq!(frame.enemy, FighterInput::default());

        // Repeated on later frames without a new press
        assert_eq!(mapper.take_frame().player.last_pressed, Some(Direction::Right));
    }

    #[test]
    fn jump_and_attack_are_one_shot() {
        let mut mapper = InputMapper::default();
        mapper.key_down(Key::ArrowUp);
        mapper.key_down(Key::ArrowDown);

        let first = mapper.take_frame();
        assert!(first.enemy.jump_requested);
        assert!(first.enemy.attack_requested);

        let second = mapper.take_frame();
        assert!(!second.enemy.jump_requested);
        assert!(!second.enemy.attack_requested);
    }

    #[test]
    fn escape_toggles_pause() {
        let mut mapper = InputMapper::default();
        assert_eq!(mapper.key_down(Key::Escape), Some(HostAction::TogglePause));
        assert_eq!(mapper.key_down(Key::Space), None);
        assert!(mapper.take_frame().player.attack_requested);
    }

    #[test]
    fn dom_key_names_parse() {
        assert_eq!(" ".parse::<Key>(), Ok(Key::Space));
        assert_eq!("ArrowLeft".parse::<Key>(), Ok(Key::ArrowLeft));
        assert_eq!("q".parse::<Key>(), Err(UnknownKey("q".into())));
    }

    #[test]
    fn reset_clears_latch() {
        let mut mapper = InputMapper::default();
        mapper.key_down(Key::ArrowRight);
        mapper.reset();
        assert_eq!(mapper.take_frame().enemy, FighterInput::default());
    }
}
