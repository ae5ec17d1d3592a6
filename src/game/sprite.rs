//! Sprite-sheet frame animation

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::util::time::DEFAULT_FRAME_HOLD;

use super::physics::{Rect, Vector2};

/// Named animation clips a character provides
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Clip {
    Idle,
    Run,
    Jump,
    Fall,
    Attack1,
    TakeHit,
    Death,
}

impl Clip {
    pub const ALL: [Clip; 7] = [
        Clip::Idle,
        Clip::Run,
        Clip::Jump,
        Clip::Fall,
        Clip::Attack1,
        Clip::TakeHit,
        Clip::Death,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Clip::Idle => "idle",
            Clip::Run => "run",
            Clip::Jump => "jump",
            Clip::Fall => "fall",
            Clip::Attack1 => "attack1",
            Clip::TakeHit => "takeHit",
            Clip::Death => "death",
        }
    }
}

impl fmt::Display for Clip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Clip {
    type Err = AnimationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Clip::ALL
            .into_iter()
            .find(|clip| clip.name() == s)
            .ok_or_else(|| AnimationError::UnknownClipName(s.to_string()))
    }
}

/// Animation errors. These indicate bad character data, never a runtime race.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnimationError {
    #[error("clip `{0}` is not in this sprite's sheet set")]
    InvalidClip(Clip),

    #[error("unknown clip name `{0}`")]
    UnknownClipName(String),
}

fn default_frame_hold() -> u32 {
    DEFAULT_FRAME_HOLD
}

/// One sprite sheet: a horizontal strip of equally sized frames
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpriteSheetDef {
    pub source_id: String,
    pub frame_count: u32,
    #[serde(default = "default_frame_hold")]
    pub frame_hold_ticks: u32,
}

impl SpriteSheetDef {
    pub fn new(source_id: impl Into<String>, frame_count: u32) -> Self {
        Self {
            source_id: source_id.into(),
            frame_count,
            frame_hold_ticks: DEFAULT_FRAME_HOLD,
        }
    }

    pub fn last_frame(&self) -> u32 {
        self.frame_count.saturating_sub(1)
    }
}

/// The visible sub-frame of the active sheet
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameRect {
    pub source_id: String,
    pub frame_index: u32,
    pub frame_count: u32,
}

impl FrameRect {
    /// Source crop rectangle for a sheet image of the given pixel size
    pub fn crop(&self, image_width: f32, image_height: f32) -> Rect {
        let frame_width = image_width / self.frame_count.max(1) as f32;
        Rect {
            x: frame_width * self.frame_index as f32,
            y: 0.0,
            width: frame_width,
            height: image_height,
        }
    }
}

/// Capability set of anything drawn from a sprite sheet
pub trait Animate {
    /// Advance the frame cursor by one simulation tick
    fn advance_frame(&mut self);

    /// Request a clip change. Returns whether the visible clip changed.
    fn set_clip(&mut self, clip: Clip) -> Result<bool, AnimationError>;

    fn current_frame(&self) -> FrameRect;
}

/// Positioned, scaled frame cursor over a table of sprite sheets
#[derive(Debug, Clone)]
pub struct Sprite {
    pub position: Vector2,
    pub scale: f32,
    pub draw_offset: Vector2,
    sheets: BTreeMap<Clip, SpriteSheetDef>,
    ready: BTreeSet<Clip>,
    clip: Clip,
    frame_index: u32,
    frame_ticks: u32,
    frozen: bool,
}

impl Sprite {
    /// Create a sprite showing `initial`. No clip is ready yet; the initial
    /// clip is shown regardless since nothing else could be drawn.
    pub fn new(
        position: Vector2,
        scale: f32,
        draw_offset: Vector2,
        sheets: BTreeMap<Clip, SpriteSheetDef>,
        initial: Clip,
    ) -> Result<Self, AnimationError> {
        if !sheets.contains_key(&initial) {
            return Err(AnimationError::InvalidClip(initial));
        }
        Ok(Self {
            position,
            scale,
            draw_offset,
            sheets,
            ready: BTreeSet::new(),
            clip: initial,
            frame_index: 0,
            frame_ticks: 0,
            frozen: false,
        })
    }

    /// Single-sheet sprite (scenery), ready immediately
    pub fn single(position: Vector2, scale: f32, sheet: SpriteSheetDef) -> Self {
        let sheets = BTreeMap::from([(Clip::Idle, sheet)]);
        Self {
            position,
            scale,
            draw_offset: Vector2::ZERO,
            sheets,
            ready: BTreeSet::from([Clip::Idle]),
            clip: Clip::Idle,
            frame_index: 0,
            frame_ticks: 0,
            frozen: false,
        }
    }

    pub fn mark_ready(&mut self, clip: Clip) -> Result<(), AnimationError> {
        if !self.sheets.contains_key(&clip) {
            return Err(AnimationError::InvalidClip(clip));
        }
        self.ready.insert(clip);
        Ok(())
    }

    pub fn mark_all_ready(&mut self) {
        self.ready.extend(self.sheets.keys().copied());
    }

    pub fn clip(&self) -> Clip {
        self.clip
    }

    pub fn frame_index(&self) -> u32 {
        self.frame_index
    }

    fn active_sheet(&self) -> &SpriteSheetDef {
        // `clip` is only ever set to a key of `sheets`
        &self.sheets[&self.clip]
    }

    pub fn is_at_last_frame(&self) -> bool {
        self.frame_index >= self.active_sheet().last_frame()
    }

    /// Stop the cursor on the current frame for good (one-shot clip finished)
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    /// Top-left corner where the scaled frame is drawn
    pub fn draw_origin(&self) -> Vector2 {
        Vector2::new(
            self.position.x - self.draw_offset.x,
            self.position.y - self.draw_offset.y,
        )
    }
}

impl Animate for Sprite {
    fn advance_frame(&mut self) {
        if self.frozen {
            return;
        }
        let sheet = self.active_sheet();
        let hold = sheet.frame_hold_ticks.max(1);
        let count = sheet.frame_count.max(1);

        self.frame_ticks += 1;
        if self.frame_ticks >= hold {
            self.frame_ticks = 0;
            self.frame_index = (self.frame_index + 1) % count;
        }
    }

    fn set_clip(&mut self, clip: Clip) -> Result<bool, AnimationError> {
        if !self.sheets.contains_key(&clip) {
            return Err(AnimationError::InvalidClip(clip));
        }
        if clip == self.clip {
            return Ok(false);
        }
        if !self.ready.contains(&clip) {
            trace!(%clip, "clip requested before its sheet is ready");
            return Ok(false);
        }

        self.clip = clip;
        self.frame_index = 0;
        self.frame_ticks = 0;
        Ok(true)
    }

    fn current_frame(&self) -> FrameRect {
        let sheet = self.active_sheet();
        FrameRect {
            source_id: sheet.source_id.clone(),
            frame_index: self.frame_index,
            frame_count: sheet.frame_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_clip_sprite() -> Sprite {
        let sheets = BTreeMap::from([
            (Clip::Idle, SpriteSheetDef::new("idle.png", 4)),
            (Clip::Run, SpriteSheetDef::new("run.png", 8)),
        ]);
        Sprite::new(Vector2::ZERO, 2.5, Vector2::new(215.0, 157.0), sheets, Clip::Idle).unwrap()
    }

    #[test]
    fn frame_advances_after_hold_and_wraps() {
        let mut sprite = two_clip_sprite();

        for _ in 0..DEFAULT_FRAME_HOLD - 1 {
            sprite.advance_frame();
        }
        assert_eq!(sprite.frame_index(), 0);
        sprite.advance_frame();
        assert_eq!(sprite.frame_index(), 1);

        for _ in 0..DEFAULT_FRAME_HOLD * 3 {
            sprite.advance_frame();
        }
        assert_eq!(sprite.frame_index(), 0, "wraps after the last frame");
    }

    #[test]
    fn set_clip_ignored_until_sheet_ready() {
        let mut sprite = two_clip_sprite();

        assert_eq!(sprite.set_clip(Clip::Run), Ok(false));
        assert_eq!(sprite.clip(), Clip::Idle);

        sprite.mark_ready(Clip::Run).unwrap();
        assert_eq!(sprite.set_clip(Clip::Run), Ok(true));
        assert_eq!(sprite.clip(), Clip::Run);
    }

    #[test]
    fn accepted_switch_resets_cursor() {
        let mut sprite = two_clip_sprite();
        sprite.mark_all_ready();
        for _ in 0..DEFAULT_FRAME_HOLD * 2 + 2 {
            sprite.advance_frame();
        }
        assert_eq!(sprite.frame_index(), 2);

        // Same clip is a no-op and keeps the cursor
        assert_eq!(sprite.set_clip(Clip::Idle), Ok(false));
        assert_eq!(sprite.frame_index(), 2);

        sprite.set_clip(Clip::Run).unwrap();
        assert_eq!(sprite.frame_index(), 0);
        for _ in 0..DEFAULT_FRAME_HOLD - 1 {
            sprite.advance_frame();
        }
        assert_eq!(sprite.frame_index(), 0, "tick counter was reset too");
    }

    #[test]
    fn missing_clip_is_a_data_error() {
        let mut sprite = two_clip_sprite();
        assert_eq!(
            sprite.set_clip(Clip::Death),
            Err(AnimationError::InvalidClip(Clip::Death))
        );
        assert!(sprite.mark_ready(Clip::Death).is_err());
    }

    #[test]
    fn frozen_sprite_holds_its_frame() {
        let mut sprite = two_clip_sprite();
        for _ in 0..DEFAULT_FRAME_HOLD {
            sprite.advance_frame();
        }
        sprite.freeze();
        for _ in 0..DEFAULT_FRAME_HOLD * 4 {
            sprite.advance_frame();
        }
        assert_eq!(sprite.frame_index(), 1);
    }

    #[test]
    fn scenery_sprite_loops_forever() {
        let mut shop = Sprite::single(Vector2::new(600.0, 128.0), 2.75, SpriteSheetDef::new("shop.png", 6));
        for _ in 0..DEFAULT_FRAME_HOLD * 6 {
            shop.advance_frame();
        }
        assert_eq!(shop.frame_index(), 0);
        assert_eq!(shop.current_frame().source_id, "shop.png");
    }

    #[test]
    fn crop_selects_the_visible_frame() {
        let frame = FrameRect {
            source_id: "run.png".into(),
            frame_index: 3,
            frame_count: 8,
        };
        let crop = frame.crop(1600.0, 200.0);
        assert_eq!(crop, Rect { x: 600.0, y: 0.0, width: 200.0, height: 200.0 });
    }

    #[test]
    fn clip_names_round_trip_through_from_str() {
        assert_eq!("takeHit".parse::<Clip>(), Ok(Clip::TakeHit));
        assert_eq!(
            "attack2".parse::<Clip>(),
            Err(AnimationError::UnknownClipName("attack2".into()))
        );
    }
}
