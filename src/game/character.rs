//! Character definitions, roster loading and sprite asset preloading

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use super::fighter::Fighter;
use super::physics::Vector2;
use super::sprite::{AnimationError, Clip, SpriteSheetDef};

/// Name of the character the enemy side plays when none is chosen
pub const DEFAULT_ENEMY: &str = "kenji";
pub const DEFAULT_PLAYER: &str = "samurai_mack";

/// Attack reach rectangle, positioned relative to the body origin
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttackBoxDef {
    pub offset: Vector2,
    pub width: f32,
    pub height: f32,
}

/// Immutable description of a playable character
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterDef {
    pub name: String,
    pub sprites: BTreeMap<Clip, SpriteSheetDef>,
    pub draw_offset: Vector2,
    pub scale: f32,
    pub attack_box: AttackBoxDef,
    /// Frame of `attack1` on which a swing can connect
    pub attack_hit_frame: u32,
}

impl CharacterDef {
    /// Check the definition is complete and self-consistent
    pub fn validate(&self) -> Result<(), CharacterError> {
        for clip in Clip::ALL {
            let sheet = self.sprites.get(&clip).ok_or_else(|| CharacterError::MissingClip {
                character: self.name.clone(),
                clip,
            })?;
            if sheet.frame_count == 0 {
                return Err(CharacterError::EmptySheet {
                    character: self.name.clone(),
                    clip,
                });
            }
        }

        let attack_frames = self.sprites[&Clip::Attack1].frame_count;
        if self.attack_hit_frame >= attack_frames {
            return Err(CharacterError::HitFrameOutOfRange {
                character: self.name.clone(),
                hit_frame: self.attack_hit_frame,
                frame_count: attack_frames,
            });
        }

        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(CharacterError::InvalidScale {
                character: self.name.clone(),
                scale: self.scale,
            });
        }

        Ok(())
    }
}

/// Errors from loading character data
#[derive(Debug, thiserror::Error)]
pub enum CharacterError {
    #[error("character `{character}` has no `{clip}` sprite sheet")]
    MissingClip { character: String, clip: Clip },

    #[error("character `{character}` has an empty `{clip}` sprite sheet")]
    EmptySheet { character: String, clip: Clip },

    #[error("character `{character}` hit frame {hit_frame} is outside its {frame_count}-frame attack")]
    HitFrameOutOfRange {
        character: String,
        hit_frame: u32,
        frame_count: u32,
    },

    #[error("character `{character}` has invalid scale {scale}")]
    InvalidScale { character: String, scale: f32 },

    #[error("unknown character `{0}`")]
    Unknown(String),

    #[error("sprite sheet `{source_id}` for `{character}` could not be resolved at {}", .path.display())]
    AssetUnresolved {
        character: String,
        source_id: String,
        path: PathBuf,
    },

    #[error("asset preload task failed: {0}")]
    Preload(String),

    #[error(transparent)]
    Animation(#[from] AnimationError),

    #[error("failed to read roster: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse roster: {0}")]
    Parse(#[from] serde_json::Error),
}

/// The set of selectable characters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Roster {
    pub characters: Vec<CharacterDef>,
}

impl Roster {
    /// Parse and validate a JSON roster
    pub fn from_json(json: &str) -> Result<Self, CharacterError> {
        let roster: Roster = serde_json::from_str(json)?;
        for def in &roster.characters {
            def.validate()?;
        }
        Ok(roster)
    }

    pub async fn load(path: &Path) -> Result<Self, CharacterError> {
        let json = tokio::fs::read_to_string(path).await?;
        let roster = Self::from_json(&json)?;
        info!(
            path = %path.display(),
            characters = roster.characters.len(),
            "Loaded character roster"
        );
        Ok(roster)
    }

    pub fn get(&self, name: &str) -> Result<&CharacterDef, CharacterError> {
        self.characters
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| CharacterError::Unknown(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.characters.iter().map(|c| c.name.as_str())
    }

    /// The two stock samurai
    pub fn builtin() -> Self {
        Self {
            characters: vec![samurai_mack(), kenji()],
        }
    }
}

fn sheets(dir: &str, frames: [(Clip, &str, u32); 7]) -> BTreeMap<Clip, SpriteSheetDef> {
    frames
        .into_iter()
        .map(|(clip, file, count)| (clip, SpriteSheetDef::new(format!("{dir}/{file}"), count)))
        .collect()
}

fn samurai_mack() -> CharacterDef {
    CharacterDef {
        name: "samurai_mack".to_string(),
        sprites: sheets(
            "samuraiMack",
            [
                (Clip::Idle, "Idle.png", 8),
                (Clip::Run, "Run.png", 8),
                (Clip::Jump, "Jump.png", 2),
                (Clip::Fall, "Fall.png", 2),
                (Clip::Attack1, "Attack1.png", 6),
                (Clip::TakeHit, "Take Hit - white silhouette.png", 4),
                (Clip::Death, "Death.png", 6),
            ],
        ),
        draw_offset: Vector2::new(215.0, 157.0),
        scale: 2.5,
        attack_box: AttackBoxDef {
            offset: Vector2::new(100.0, 50.0),
            width: 160.0,
            height: 50.0,
        },
        attack_hit_frame: 4,
    }
}

fn kenji() -> CharacterDef {
    CharacterDef {
        name: "kenji".to_string(),
        sprites: sheets(
            "kenji",
            [
                (Clip::Idle, "Idle.png", 4),
                (Clip::Run, "Run.png", 8),
                (Clip::Jump, "Jump.png", 2),
                (Clip::Fall, "Fall.png", 2),
                (Clip::Attack1, "Attack1.png", 4),
                (Clip::TakeHit, "Take hit.png", 3),
                (Clip::Death, "Death.png", 7),
            ],
        ),
        draw_offset: Vector2::new(215.0, 167.0),
        scale: 2.5,
        attack_box: AttackBoxDef {
            offset: Vector2::new(-170.0, 50.0),
            width: 170.0,
            height: 50.0,
        },
        attack_hit_frame: 2,
    }
}

/// Resolves sprite sources before a match starts.
///
/// Without an asset directory every source counts as resolved (the renderer
/// embeds its images). With one, each sheet must exist as a file beneath it.
#[derive(Debug, Clone, Default)]
pub struct AssetLoader {
    asset_dir: Option<PathBuf>,
}

impl AssetLoader {
    pub fn new(asset_dir: Option<PathBuf>) -> Self {
        Self { asset_dir }
    }

    /// Resolve every sheet of `def` concurrently. Returns the clips that are
    /// ready to draw, or the first unresolved sheet.
    pub async fn preload(&self, def: &CharacterDef) -> Result<BTreeSet<Clip>, CharacterError> {
        let Some(dir) = &self.asset_dir else {
            return Ok(def.sprites.keys().copied().collect());
        };

        let mut tasks = JoinSet::new();
        for (clip, sheet) in &def.sprites {
            let clip = *clip;
            let source_id = sheet.source_id.clone();
            let path = dir.join(&source_id);
            tasks.spawn(async move {
                let found = tokio::fs::metadata(&path)
                    .await
                    .map(|meta| meta.is_file())
                    .unwrap_or(false);
                (clip, source_id, path, found)
            });
        }

        let mut ready = BTreeSet::new();
        while let Some(joined) = tasks.join_next().await {
            let (clip, source_id, path, found) =
                joined.map_err(|e| CharacterError::Preload(e.to_string()))?;
            if !found {
                warn!(character = %def.name, %source_id, "Sprite sheet missing");
                return Err(CharacterError::AssetUnresolved {
                    character: def.name.clone(),
                    source_id,
                    path,
                });
            }
            debug!(character = %def.name, %clip, "Sprite sheet resolved");
            ready.insert(clip);
        }

        Ok(ready)
    }

    /// Build a fighter whose every sheet has been resolved
    pub async fn load_character(
        &self,
        def: &CharacterDef,
        spawn: Vector2,
    ) -> Result<Fighter, CharacterError> {
        let mut fighter = Fighter::from_def(def, spawn)?;
        let ready = self.preload(def).await?;
        fighter.mark_ready(&ready)?;
        Ok(fighter)
    }
}
