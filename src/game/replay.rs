//! Deterministic replay of recorded key events

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::util::time::{seconds_for_ticks, SIMULATION_TPS};

use super::input::{HostAction, InputMapper, Key};
use super::r#match::{MatchError, MatchPhase, MatchSession};
use super::snapshot::MatchSnapshot;

fn default_tps() -> u32 {
    SIMULATION_TPS
}

/// What happened at a recorded tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReplayAction {
    KeyDown { key: Key },
    KeyUp { key: Key },
    TogglePause,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayEvent {
    /// Applied before this tick's frame is simulated
    pub tick: u64,
    #[serde(flatten)]
    pub action: ReplayAction,
}

/// A recorded session: key events stamped with frame numbers.
/// The clock advances one second every `ticks_per_second` simulated frames.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayScript {
    #[serde(default = "default_tps")]
    pub ticks_per_second: u32,
    pub total_ticks: u64,
    pub events: Vec<ReplayEvent>,
}

#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("failed to read replay: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse replay: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Match(#[from] MatchError),
}

impl ReplayScript {
    pub async fn load(path: &Path) -> Result<Self, ReplayError> {
        let json = tokio::fs::read_to_string(path).await?;
        let script: ReplayScript = serde_json::from_str(&json)?;
        info!(
            path = %path.display(),
            ticks = script.total_ticks,
            events = script.events.len(),
            "Loaded replay"
        );
        Ok(script)
    }

    /// Play the script against `session` from the start screen.
    /// Stops early once the match is over.
    pub fn play(&self, session: &mut MatchSession) -> Result<MatchSnapshot, ReplayError> {
        let mut events = self.events.clone();
        events.sort_by_key(|e| e.tick);
        let mut events = events.into_iter().peekable();

        let mut mapper = InputMapper::default();
        let mut live_ticks: u64 = 0;
        session.start();

        for tick in 0..self.total_ticks {
            while let Some(event) = events.next_if(|e| e.tick <= tick) {
                match event.action {
                    ReplayAction::KeyDown { key } => {
                        if let Some(HostAction::TogglePause) = mapper.key_down(key) {
                            session.toggle_pause();
                        }
                    }
                    ReplayAction::KeyUp { key } => mapper.key_up(key),
                    ReplayAction::TogglePause => {
                        session.toggle_pause();
                    }
                }
            }

            // Seconds follow simulated frames; paused frames do not count
            let input = mapper.take_frame();
            if session.tick(&input)?.advanced {
                live_ticks += 1;
                let tps = self.ticks_per_second;
                if seconds_for_ticks(live_ticks, tps) > seconds_for_ticks(live_ticks - 1, tps) {
                    session.on_second_elapsed();
                }
            }

            if session.phase() == MatchPhase::Over {
                debug!(tick, "Replay reached match end");
                break;
            }
        }

        Ok(session.snapshot())
    }
}
