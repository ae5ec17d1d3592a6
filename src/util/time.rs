//! Time utilities for game simulation

use std::time::Duration;

/// Tick rate configuration
pub const SIMULATION_TPS: u32 = 60; // one tick per display refresh
pub const TICK_DURATION_MICROS: u64 = 1_000_000 / SIMULATION_TPS as u64;

/// Ticks a sprite frame stays visible before the cursor advances
pub const DEFAULT_FRAME_HOLD: u32 = 5;

/// Wall-clock duration of one simulation tick at the given rate
pub fn tick_duration(tps: u32) -> Duration {
    Duration::from_micros(1_000_000 / tps.max(1) as u64)
}

/// One countdown second of the match clock
pub fn clock_period() -> Duration {
    Duration::from_secs(1)
}

/// Number of whole countdown seconds covered by `ticks` frames at `tps`
pub fn seconds_for_ticks(ticks: u64, tps: u32) -> u64 {
    ticks / tps.max(1) as u64
}
