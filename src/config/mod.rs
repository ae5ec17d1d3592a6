//! Configuration module - environment variable parsing

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::game::character::{DEFAULT_ENEMY, DEFAULT_PLAYER};
use crate::game::clock::DEFAULT_MATCH_SECONDS;
use crate::util::time::SIMULATION_TPS;

/// Host configuration loaded from environment variables
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// JSON roster file; the built-in roster is used when unset
    pub roster_path: Option<PathBuf>,
    /// Directory sprite sheets are resolved against during preload
    pub asset_dir: Option<PathBuf>,
    /// Character the player side plays
    pub player_character: String,
    /// Character the enemy side plays
    pub enemy_character: String,

    /// Countdown length in seconds
    pub match_seconds: u32,
    /// Simulation ticks per second
    pub tick_rate: u32,
    /// Publish a snapshot every N simulated ticks
    pub snapshot_interval: u32,

    /// Replay script to run instead of the real-time loop
    pub replay_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let path = |key: &str| lookup(key).filter(|v| !v.is_empty()).map(PathBuf::from);

        Ok(Self {
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),

            roster_path: path("ROSTER_PATH"),
            asset_dir: path("ASSET_DIR"),
            player_character: lookup("PLAYER_CHARACTER")
                .unwrap_or_else(|| DEFAULT_PLAYER.to_string()),
            enemy_character: lookup("ENEMY_CHARACTER").unwrap_or_else(|| DEFAULT_ENEMY.to_string()),

            match_seconds: parse_positive(&lookup, "MATCH_SECONDS", DEFAULT_MATCH_SECONDS)?,
            tick_rate: parse_positive(&lookup, "TICK_RATE", SIMULATION_TPS)?,
            snapshot_interval: parse_positive(&lookup, "SNAPSHOT_INTERVAL", 1)?,

            replay_path: path("REPLAY_PATH"),
        })
    }
}

fn parse_positive<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + PartialOrd + Default,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => match raw.trim().parse::<T>() {
            Ok(value) if value > T::default() => Ok(value),
            _ => Err(ConfigError::Invalid { key, value: raw }),
        },
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_the_stock_game() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.log_level, "info");
        assert_eq!(config.match_seconds, 60);
        assert_eq!(config.tick_rate, 60);
        assert_eq!(config.player_character, "samurai_mack");
        assert_eq!(config.enemy_character, "kenji");
        assert!(config.roster_path.is_none());
        assert!(config.replay_path.is_none());
    }

    #[test]
    fn overrides_are_applied() {
        let config = Config::from_lookup(lookup(&[
            ("MATCH_SECONDS", "90"),
            ("TICK_RATE", "30"),
            ("ROSTER_PATH", "roster.json"),
            ("ENEMY_CHARACTER", "samurai_mack"),
        ]))
        .unwrap();
        assert_eq!(config.match_seconds, 90);
        assert_eq!(config.tick_rate, 30);
        assert_eq!(config.roster_path, Some(PathBuf::from("roster.json")));
        assert_eq!(config.enemy_character, "samurai_mack");
    }

    #[test]
    fn zero_or_garbage_numbers_are_rejected() {
        assert!(matches!(
            Config::from_lookup(lookup(&[("TICK_RATE", "0")])),
            Err(ConfigError::Invalid { key: "TICK_RATE", .. })
        ));
        assert!(Config::from_lookup(lookup(&[("MATCH_SECONDS", "soon")])).is_err());
    }

    #[test]
    fn empty_paths_are_unset() {
        let config = Config::from_lookup(lookup(&[("REPLAY_PATH", "")])).unwrap();
        assert!(config.replay_path.is_none());
    }
}
