//! Match state, per-frame combat resolution and the real-time tick loop

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc};
use tokio::time::{interval, interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info};
use uuid::Uuid;

use crate::util::time::{clock_period, tick_duration};

use super::character::{AssetLoader, CharacterDef, CharacterError};
use super::clock::{determine_winner, MatchClock, Outcome};
use super::combat::{CombatSystem, HitResult};
use super::fighter::Fighter;
use super::input::{HostAction, InputMapper, Key};
use super::physics::Vector2;
use super::snapshot::{MatchSnapshot, SnapshotBuilder};
use super::sprite::AnimationError;
use super::FrameInput;

pub const PLAYER_SPAWN: Vector2 = Vector2::new(0.0, 0.0);
pub const ENEMY_SPAWN: Vector2 = Vector2::new(400.0, 100.0);

/// Match phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPhase {
    /// Start screen, nothing simulated yet
    Start,
    /// Fight in progress
    Playing,
    /// Outcome decided; the simulation is frozen
    Over,
}

#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    #[error(transparent)]
    Animation(#[from] AnimationError),

    #[error(transparent)]
    Character(#[from] CharacterError),
}

/// Match state (owned by the session)
#[derive(Debug, Clone)]
pub struct MatchState {
    pub id: Uuid,
    pub phase: MatchPhase,
    pub tick: u64,
    pub clock: MatchClock,
    pub paused: bool,
    pub outcome: Outcome,
    pub player: Fighter,
    pub enemy: Fighter,
}

/// Result of one frame tick, as reported to the host
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickReport {
    pub tick: u64,
    /// False when the tick was ignored (not playing, paused, or over)
    pub advanced: bool,
    pub player_health: i32,
    pub enemy_health: i32,
    pub outcome: Outcome,
    pub hits: Vec<HitResult>,
}

/// One match between two fighters: the per-frame combat resolver plus
/// the countdown. Keeps pristine copies of both fighters for rematches.
pub struct MatchSession {
    state: MatchState,
    player_template: Fighter,
    enemy_template: Fighter,
}

impl MatchSession {
    pub fn new(player: Fighter, enemy: Fighter, match_seconds: u32) -> Self {
        let state = MatchState {
            id: Uuid::new_v4(),
            phase: MatchPhase::Start,
            tick: 0,
            clock: MatchClock::new(match_seconds),
            paused: false,
            outcome: Outcome::None,
            player: player.clone(),
            enemy: enemy.clone(),
        };

        Self {
            state,
            player_template: player,
            enemy_template: enemy,
        }
    }

    /// Resolve both characters' assets, then place them at their spawns
    pub async fn load(
        loader: &AssetLoader,
        player_def: &CharacterDef,
        enemy_def: &CharacterDef,
        match_seconds: u32,
    ) -> Result<Self, MatchError> {
        let player = loader.load_character(player_def, PLAYER_SPAWN).await?;
        let enemy = loader.load_character(enemy_def, ENEMY_SPAWN).await?;
        let session = Self::new(player, enemy, match_seconds);

        info!(
            match_id = %session.state.id,
            player = %player_def.name,
            enemy = %enemy_def.name,
            "Match loaded"
        );
        Ok(session)
    }

    pub fn id(&self) -> Uuid {
        self.state.id
    }

    pub fn state(&self) -> &MatchState {
        &self.state
    }

    pub fn phase(&self) -> MatchPhase {
        self.state.phase
    }

    pub fn outcome(&self) -> Outcome {
        self.state.outcome
    }

    pub fn is_paused(&self) -> bool {
        self.state.paused
    }

    pub fn snapshot(&self) -> MatchSnapshot {
        MatchSnapshot::capture(&self.state)
    }

    /// Leave the start screen. Returns whether the match began.
    pub fn start(&mut self) -> bool {
        if self.state.phase != MatchPhase::Start {
            return false;
        }
        self.state.phase = MatchPhase::Playing;
        info!(match_id = %self.state.id, "Match started");
        self.decide_if_expired();
        true
    }

    fn is_running(&self) -> bool {
        self.state.phase == MatchPhase::Playing && !self.state.paused
    }

    /// Advance the simulation by one frame
    pub fn tick(&mut self, input: &FrameInput) -> Result<TickReport, MatchError> {
        if !self.is_running() {
            return Ok(self.report(false, Vec::new()));
        }

        self.state.tick += 1;
        self.state.player.update(&input.player)?;
        self.state.enemy.update(&input.enemy)?;

        let hits = CombatSystem::resolve_hits(&mut self.state.player, &mut self.state.enemy)?;

        if self.state.player.is_knocked_out() || self.state.enemy.is_knocked_out() {
            self.decide();
        }

        Ok(self.report(true, hits))
    }

    /// External one-second timer callback
    pub fn on_second_elapsed(&mut self) -> Outcome {
        if !self.is_running() {
            return self.state.outcome;
        }

        let expired = self.state.clock.tick_second();
        debug!(
            match_id = %self.state.id,
            remaining = self.state.clock.remaining(),
            "Clock tick"
        );
        if expired {
            self.decide();
        }
        self.state.outcome
    }

    /// Returns whether the pause state changed
    pub fn set_paused(&mut self, paused: bool) -> bool {
        if self.state.phase != MatchPhase::Playing || self.state.paused == paused {
            return false;
        }
        self.state.paused = paused;
        info!(match_id = %self.state.id, paused, "Pause toggled");
        true
    }

    /// Returns the pause state after toggling
    pub fn toggle_pause(&mut self) -> bool {
        let paused = !self.state.paused;
        self.set_paused(paused);
        self.state.paused
    }

    /// Fresh fighters, full clock, straight back into play
    pub fn rematch(&mut self) {
        self.state.player = self.player_template.clone();
        self.state.enemy = self.enemy_template.clone();
        self.state.clock.reset();
        self.state.tick = 0;
        self.state.paused = false;
        self.state.outcome = Outcome::None;
        self.state.phase = MatchPhase::Playing;
        info!(match_id = %self.state.id, "Rematch started");
        self.decide_if_expired();
    }

    /// A zero-second clock has nothing to count down
    fn decide_if_expired(&mut self) {
        if self.state.clock.is_expired() {
            self.decide();
        }
    }

    fn decide(&mut self) {
        let outcome = determine_winner(self.state.player.health(), self.state.enemy.health());
        self.state.outcome = outcome;
        self.state.phase = MatchPhase::Over;
        info!(
            match_id = %self.state.id,
            tick = self.state.tick,
            player_health = self.state.player.health(),
            enemy_health = self.state.enemy.health(),
            outcome = outcome.display_text(),
            "Match over"
        );
    }

    fn report(&self, advanced: bool, hits: Vec<HitResult>) -> TickReport {
        TickReport {
            tick: self.state.tick,
            advanced,
            player_health: self.state.player.health(),
            enemy_health: self.state.enemy.health(),
            outcome: self.state.outcome,
            hits,
        }
    }

    #[cfg(test)]
    pub(crate) fn state_mut(&mut self) -> &mut MatchState {
        &mut self.state
    }
}

/// Events the host feeds into a running match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    KeyDown(Key),
    KeyUp(Key),
    Start,
    TogglePause,
    Rematch,
    Shutdown,
}

/// Handle to a running match
#[derive(Clone)]
pub struct MatchHandle {
    pub id: Uuid,
    pub event_tx: mpsc::Sender<HostEvent>,
    pub snapshot_tx: broadcast::Sender<MatchSnapshot>,
}

impl MatchHandle {
    pub fn subscribe(&self) -> broadcast::Receiver<MatchSnapshot> {
        self.snapshot_tx.subscribe()
    }
}

/// Real-time driver: frame ticks, the countdown and host events all run on
/// one task, so a clock second never lands in the middle of a frame.
pub struct MatchRunner {
    session: MatchSession,
    mapper: InputMapper,
    event_rx: mpsc::Receiver<HostEvent>,
    snapshot_tx: broadcast::Sender<MatchSnapshot>,
    snapshot_builder: SnapshotBuilder,
    tick_rate: u32,
}

impl MatchRunner {
    pub fn new(session: MatchSession, tick_rate: u32, snapshot_interval: u32) -> (Self, MatchHandle) {
        let (event_tx, event_rx) = mpsc::channel(256);
        let (snapshot_tx, _) = broadcast::channel(64);

        let handle = MatchHandle {
            id: session.id(),
            event_tx,
            snapshot_tx: snapshot_tx.clone(),
        };

        let runner = Self {
            session,
            mapper: InputMapper::default(),
            event_rx,
            snapshot_tx,
            snapshot_builder: SnapshotBuilder::new(snapshot_interval),
            tick_rate,
        };

        (runner, handle)
    }

    /// Run until the host shuts down or drops every handle. Returns the
    /// session in its final state.
    pub async fn run(mut self) -> Result<MatchSession, MatchError> {
        info!(match_id = %self.session.id(), tick_rate = self.tick_rate, "Match runner started");

        let mut frame_interval = interval(tick_duration(self.tick_rate));
        frame_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut clock_interval = interval_at(Instant::now() + clock_period(), clock_period());
        clock_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;

                event = self.event_rx.recv() => {
                    let Some(event) = event else {
                        info!(match_id = %self.session.id(), "All host handles dropped");
                        break;
                    };
                    if !self.handle_event(event, &mut clock_interval) {
                        break;
                    }
                }
                _ = frame_interval.tick() => self.run_frame()?,
                _ = clock_interval.tick() => self.run_clock(),
            }
        }

        info!(
            match_id = %self.session.id(),
            outcome = self.session.outcome().display_text(),
            "Match runner stopped"
        );
        Ok(self.session)
    }

    /// Returns false when the runner should stop
    fn handle_event(&mut self, event: HostEvent, clock_interval: &mut Interval) -> bool {
        match event {
            HostEvent::KeyDown(key) => {
                if let Some(HostAction::TogglePause) = self.mapper.key_down(key) {
                    self.toggle_pause(clock_interval);
                }
            }
            HostEvent::KeyUp(key) => self.mapper.key_up(key),
            HostEvent::Start => {
                if self.session.start() {
                    clock_interval.reset();
                    self.publish();
                }
            }
            HostEvent::TogglePause => self.toggle_pause(clock_interval),
            HostEvent::Rematch => {
                self.session.rematch();
                self.mapper.reset();
                clock_interval.reset();
                self.publish();
            }
            HostEvent::Shutdown => return false,
        }
        true
    }

    /// Resuming restarts the second in progress rather than catching up
    fn toggle_pause(&mut self, clock_interval: &mut Interval) {
        if !self.session.toggle_pause() {
            clock_interval.reset();
        }
        self.publish();
    }

    fn run_frame(&mut self) -> Result<(), MatchError> {
        let input = self.mapper.take_frame();
        let report = self.session.tick(&input)?;
        if !report.advanced {
            return Ok(());
        }

        if !report.hits.is_empty() || report.outcome.is_decided() {
            self.snapshot_builder.force_next();
        }
        if self.snapshot_builder.should_send() {
            self.publish();
        }
        Ok(())
    }

    fn run_clock(&mut self) {
        let before = self.session.state().clock.remaining();
        self.session.on_second_elapsed();
        if self.session.state().clock.remaining() != before {
            self.publish();
        }
    }

    fn publish(&self) {
        // No subscribers is fine; the renderer may attach later
        let _ = self.snapshot_tx.send(self.snapshot_builder.build(self.session.state()));
    }
}
