//! Duel Host - headless driver for the fighting game simulation
//!
//! Loads the roster and both characters, then either:
//! - plays a recorded replay deterministically and prints the final snapshot, or
//! - runs the real-time match loop, reading host commands from stdin and
//!   writing one JSON snapshot per line to stdout for the renderer

use std::str::FromStr;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use duel_core::config::Config;
use duel_core::game::input::Key;
use duel_core::game::replay::ReplayScript;
use duel_core::game::{AssetLoader, HostEvent, MatchRunner, MatchSession, Roster};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    init_tracing(&config.log_level);

    info!("Starting Duel Host");

    let roster = match &config.roster_path {
        Some(path) => Roster::load(path).await?,
        None => Roster::builtin(),
    };
    let player_def = roster.get(&config.player_character)?;
    let enemy_def = roster.get(&config.enemy_character)?;

    // Every sheet is resolved before the first frame runs
    let loader = AssetLoader::new(config.asset_dir.clone());
    let mut session =
        MatchSession::load(&loader, player_def, enemy_def, config.match_seconds).await?;

    if let Some(path) = &config.replay_path {
        let script = ReplayScript::load(path).await?;
        let snapshot = script.play(&mut session)?;
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    run_realtime(session, &config).await
}

/// Initialize tracing/logging. Logs go to stderr; stdout carries snapshots.
fn init_tracing(log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .init();
}

async fn run_realtime(session: MatchSession, config: &Config) -> anyhow::Result<()> {
    let (runner, handle) = MatchRunner::new(session, config.tick_rate, config.snapshot_interval);
    let mut snapshots = handle.subscribe();
    let runner_task = tokio::spawn(runner.run());

    // Forward snapshots to the renderer
    tokio::spawn(async move {
        loop {
            match snapshots.recv().await {
                Ok(snapshot) => match serde_json::to_string(&snapshot) {
                    Ok(line) => println!("{line}"),
                    Err(e) => warn!(error = %e, "Failed to encode snapshot"),
                },
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Renderer fell behind, dropped snapshots");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let event = match line? {
                    Some(line) if line.trim().is_empty() => continue,
                    Some(line) => match line.parse::<HostCommand>() {
                        Ok(HostCommand(event)) => event,
                        Err(e) => {
                            warn!(error = %e, "Ignoring host command");
                            continue;
                        }
                    },
                    None => HostEvent::Shutdown,
                };
                if handle.event_tx.send(event).await.is_err() || event == HostEvent::Shutdown {
                    break;
                }
            }
            _ = &mut shutdown => {
                let _ = handle.event_tx.send(HostEvent::Shutdown).await;
                break;
            }
        }
    }

    let session = runner_task.await??;
    info!(
        outcome = session.outcome().display_text(),
        ticks = session.state().tick,
        "Duel Host shutdown complete"
    );
    Ok(())
}

/// One line of host input: `start`, `pause`, `rematch`, `quit`,
/// `down <key>` or `up <key>` with DOM key names
#[derive(Debug, PartialEq, Eq)]
struct HostCommand(HostEvent);

#[derive(Debug, thiserror::Error)]
enum CommandError {
    #[error("unknown command `{0}`")]
    Unknown(String),

    #[error(transparent)]
    Key(#[from] duel_core::game::input::UnknownKey),
}

impl FromStr for HostCommand {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let event = match line.split_once(' ') {
            Some(("down", key)) => HostEvent::KeyDown(Key::from_str(key.trim())?),
            Some(("up", key)) => HostEvent::KeyUp(Key::from_str(key.trim())?),
            _ => match line {
                "start" => HostEvent::Start,
                "pause" => HostEvent::TogglePause,
                "rematch" => HostEvent::Rematch,
                "quit" => HostEvent::Shutdown,
                other => return Err(CommandError::Unknown(other.to_string())),
            },
        };
        Ok(HostCommand(event))
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, stopping match");
        }
        _ = terminate => {
            info!("Received terminate signal, stopping match");
        }
    }
}
