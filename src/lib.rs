//! Duel core - deterministic simulation for a two-player 2D fighting game
//!
//! The crate owns everything that happens inside a frame:
//! - Sprite-sheet animation and fighter clip selection
//! - Gravity, movement and attack-box hit detection
//! - The match clock, pause handling and win/tie resolution
//!
//! Drawing, menus and asset bundling belong to the host, which feeds key
//! events in and reads [`game::MatchSnapshot`]s out.

pub mod config;
pub mod game;
pub mod util;
