//! Snapshot building: the read-only view the renderer draws each frame

use serde::Serialize;

use super::clock::Outcome;
use super::fighter::Fighter;
use super::physics::Vector2;
use super::r#match::{MatchPhase, MatchState};
use super::sprite::Clip;

/// Everything needed to draw one fighter
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FighterSnapshot {
    pub name: String,
    pub position: Vector2,
    /// Top-left of the scaled sprite frame
    pub draw_origin: Vector2,
    pub scale: f32,
    pub source_id: String,
    pub clip: Clip,
    pub frame_index: u32,
    pub frame_count: u32,
    pub health: i32,
    pub dead: bool,
}

impl FighterSnapshot {
    pub fn capture(fighter: &Fighter) -> Self {
        let frame = fighter.current_frame();
        Self {
            name: fighter.name().to_string(),
            position: fighter.position(),
            draw_origin: fighter.sprite().draw_origin(),
            scale: fighter.sprite().scale,
            source_id: frame.source_id,
            clip: fighter.clip(),
            frame_index: frame.frame_index,
            frame_count: frame.frame_count,
            health: fighter.health(),
            dead: fighter.is_dead(),
        }
    }
}

/// Whole-match view: HUD values plus both fighters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchSnapshot {
    pub tick: u64,
    pub phase: MatchPhase,
    pub paused: bool,
    pub timer: u32,
    pub outcome: Outcome,
    pub display_text: &'static str,
    pub player: FighterSnapshot,
    pub enemy: FighterSnapshot,
}

impl MatchSnapshot {
    pub fn capture(state: &MatchState) -> Self {
        Self {
            tick: state.tick,
            phase: state.phase,
            paused: state.paused,
            timer: state.clock.remaining(),
            outcome: state.outcome,
            display_text: state.outcome.display_text(),
            player: FighterSnapshot::capture(&state.player),
            enemy: FighterSnapshot::capture(&state.enemy),
        }
    }
}

/// Decides which ticks produce a snapshot for subscribers
pub struct SnapshotBuilder {
    /// Tick counter since last snapshot
    ticks_since_snapshot: u32,
    /// Snapshot interval in ticks
    snapshot_interval: u32,
}

impl SnapshotBuilder {
    pub fn new(snapshot_interval: u32) -> Self {
        Self {
            ticks_since_snapshot: 0,
            snapshot_interval: snapshot_interval.max(1),
        }
    }

    /// Check if it's time to send a snapshot
    pub fn should_send(&mut self) -> bool {
        self.ticks_since_snapshot += 1;
        if self.ticks_since_snapshot >= self.snapshot_interval {
            self.ticks_since_snapshot = 0;
            true
        } else {
            false
        }
    }

    /// Force snapshot on next check (pause, clock and outcome changes)
    pub fn force_next(&mut self) {
        self.ticks_since_snapshot = self.snapshot_interval;
    }

    pub fn build(&self, state: &MatchState) -> MatchSnapshot {
        MatchSnapshot::capture(state)
    }
}
