//! Fighter state machine: movement, attack and hit reactions layered on a sprite

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::character::{CharacterDef, CharacterError};
use super::physics::{
    PhysicsSystem, Rect, Vector2, BODY_HEIGHT, BODY_WIDTH, JUMP_VELOCITY, RUN_SPEED,
};
use super::sprite::{Animate, AnimationError, Clip, FrameRect, Sprite};

pub const MAX_HEALTH: i32 = 100;

/// Horizontal direction key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Left,
    Right,
}

/// One side's controls for a single tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FighterInput {
    /// Left key currently held
    pub left: bool,
    /// Right key currently held
    pub right: bool,
    /// Most recently pressed horizontal key. The mapper repeats it every frame
    /// until the other direction is pressed.
    pub last_pressed: Option<Direction>,
    pub jump_requested: bool,
    pub attack_requested: bool,
}

/// Attack reach, following the body at a fixed offset
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttackBox {
    pub position: Vector2,
    pub offset: Vector2,
    pub width: f32,
    pub height: f32,
}

impl AttackBox {
    fn follow(&mut self, body: Vector2) {
        self.position = body.offset_by(self.offset);
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.position, self.width, self.height)
    }
}

/// A combatant. Owns its animation sprite; never references its opponent.
#[derive(Debug, Clone)]
pub struct Fighter {
    name: String,
    pub(crate) sprite: Sprite,
    pub(crate) velocity: Vector2,
    width: f32,
    height: f32,
    pub(crate) health: i32,
    pub(crate) is_attacking: bool,
    pub(crate) already_hit: bool,
    dead: bool,
    last_direction: Option<Direction>,
    attack_box: AttackBox,
    attack_hit_frame: u32,
}

impl Fighter {
    /// Build a fighter standing at `spawn`. Sheets start out not ready;
    /// see [`Fighter::mark_ready`].
    pub fn from_def(def: &CharacterDef, spawn: Vector2) -> Result<Self, CharacterError> {
        def.validate()?;
        let sprite = Sprite::new(spawn, def.scale, def.draw_offset, def.sprites.clone(), Clip::Idle)?;

        Ok(Self {
            name: def.name.clone(),
            sprite,
            velocity: Vector2::ZERO,
            width: BODY_WIDTH,
            height: BODY_HEIGHT,
            health: MAX_HEALTH,
            is_attacking: false,
            already_hit: false,
            dead: false,
            last_direction: None,
            attack_box: AttackBox {
                position: spawn.offset_by(def.attack_box.offset),
                offset: def.attack_box.offset,
                width: def.attack_box.width,
                height: def.attack_box.height,
            },
            attack_hit_frame: def.attack_hit_frame,
        })
    }

    pub fn mark_ready(&mut self, clips: &BTreeSet<Clip>) -> Result<(), AnimationError> {
        for clip in clips {
            self.sprite.mark_ready(*clip)?;
        }
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn position(&self) -> Vector2 {
        self.sprite.position
    }

    pub fn velocity(&self) -> Vector2 {
        self.velocity
    }

    pub fn health(&self) -> i32 {
        self.health
    }

    pub fn clip(&self) -> Clip {
        self.sprite.clip()
    }

    pub fn frame_index(&self) -> u32 {
        self.sprite.frame_index()
    }

    pub fn current_frame(&self) -> FrameRect {
        self.sprite.current_frame()
    }

    pub fn sprite(&self) -> &Sprite {
        &self.sprite
    }

    pub fn is_attacking(&self) -> bool {
        self.is_attacking
    }

    pub fn already_hit(&self) -> bool {
        self.already_hit
    }

    pub fn is_dead(&self) -> bool {
        self.dead
    }

    /// Out of health; the death clip may still be playing
    pub fn is_knocked_out(&self) -> bool {
        self.health <= 0
    }

    pub fn last_direction(&self) -> Option<Direction> {
        self.last_direction
    }

    pub fn attack_hit_frame(&self) -> u32 {
        self.attack_hit_frame
    }

    pub fn attack_box(&self) -> &AttackBox {
        &self.attack_box
    }

    pub fn body_rect(&self) -> Rect {
        Rect::new(self.sprite.position, self.width, self.height)
    }

    /// Swing is on the frame where it may connect and has not connected yet
    pub fn can_land_hit(&self) -> bool {
        self.is_attacking && !self.already_hit && self.sprite.frame_index() == self.attack_hit_frame
    }

    pub(crate) fn register_hit(&mut self) {
        self.already_hit = true;
    }

    /// Advance one tick: input edges, animation, physics, then clip selection
    pub fn update(&mut self, input: &FighterInput) -> Result<(), AnimationError> {
        self.handle_requests(input)?;

        if !self.dead {
            self.sprite.advance_frame();
        }

        self.attack_box.follow(self.sprite.position);
        PhysicsSystem::integrate(&mut self.sprite.position, &mut self.velocity, self.height);

        if self.is_knocked_out() {
            self.switch_sprite(Clip::Death)?;
        }

        match self.held_direction(input) {
            Some(Direction::Left) => {
                self.velocity.x = -RUN_SPEED;
                self.switch_sprite(Clip::Run)?;
            }
            Some(Direction::Right) => {
                self.velocity.x = RUN_SPEED;
                self.switch_sprite(Clip::Run)?;
            }
            None => {
                self.switch_sprite(Clip::Idle)?;
            }
        }

        if self.velocity.y < 0.0 {
            self.switch_sprite(Clip::Jump)?;
        } else if self.velocity.y > 0.0 {
            self.switch_sprite(Clip::Fall)?;
        }

        Ok(())
    }

    fn handle_requests(&mut self, input: &FighterInput) -> Result<(), AnimationError> {
        if self.dead {
            return Ok(());
        }
        if let Some(direction) = input.last_pressed {
            self.last_direction = Some(direction);
        }
        if input.jump_requested {
            self.jump();
        }
        if input.attack_requested {
            self.attack()?;
        }
        Ok(())
    }

    /// Held key only moves the fighter if it is also the last one pressed
    fn held_direction(&self, input: &FighterInput) -> Option<Direction> {
        if self.dead {
            return None;
        }
        match self.last_direction {
            Some(Direction::Left) if input.left => Some(Direction::Left),
            Some(Direction::Right) if input.right => Some(Direction::Right),
            _ => None,
        }
    }

    /// Leave the ground; ignored while airborne
    pub fn jump(&mut self) -> bool {
        if self.dead || !PhysicsSystem::is_grounded(&self.velocity) {
            return false;
        }
        self.velocity.y = JUMP_VELOCITY;
        true
    }

    /// Start a swing. Returns whether a new swing began. A knocked-out
    /// fighter is already on the death clip, so the gate refuses it.
    pub fn attack(&mut self) -> Result<bool, AnimationError> {
        if self.is_attacking || self.dead {
            return Ok(false);
        }
        if !self.switch_sprite(Clip::Attack1)? {
            return Ok(false);
        }
        self.is_attacking = true;
        self.already_hit = false;
        Ok(true)
    }

    /// Absorb one hit. Health is clamped at zero.
    pub fn take_hit(&mut self, damage: i32) -> Result<(), AnimationError> {
        self.health = (self.health - damage).max(0);

        if self.is_knocked_out() {
            debug!(fighter = %self.name, "Knocked out");
            self.switch_sprite(Clip::Death)?;
        } else {
            self.switch_sprite(Clip::TakeHit)?;
        }
        Ok(())
    }

    /// Clip-request gate. One-shot clips (attack, hit reaction) run to their
    /// last frame before anything replaces them; death is never replaced.
    pub fn switch_sprite(&mut self, clip: Clip) -> Result<bool, AnimationError> {
        match self.sprite.clip() {
            Clip::Death => {
                if !self.dead && self.sprite.is_at_last_frame() {
                    self.dead = true;
                    self.sprite.freeze();
                    debug!(fighter = %self.name, "Death animation finished");
                }
                return Ok(false);
            }
            Clip::Attack1 => {
                if !self.sprite.is_at_last_frame() {
                    return Ok(false);
                }
                self.is_attacking = false;
                self.already_hit = false;
            }
            Clip::TakeHit if !self.sprite.is_at_last_frame() => return Ok(false),
            _ => {}
        }

        self.sprite.set_clip(clip)
    }
}
