//! Body physics: vectors, rectangles and gravity integration

use serde::{Deserialize, Serialize};

/// Height of the drawing surface the arena is laid out on
pub const SURFACE_HEIGHT: f32 = 576.0;
/// Y coordinate of the floor line
pub const GROUND_LEVEL: f32 = SURFACE_HEIGHT - 96.0;
/// Downward acceleration applied each airborne tick
pub const GRAVITY: f32 = 0.7;
/// Fighter body hitbox
pub const BODY_WIDTH: f32 = 50.0;
pub const BODY_HEIGHT: f32 = 150.0;
/// Body top Y when standing on the floor
pub const STANDING_Y: f32 = 330.0;
/// Horizontal speed while a direction is held
pub const RUN_SPEED: f32 = 5.0;
/// Vertical velocity set by a jump
pub const JUMP_VELOCITY: f32 = -20.0;

/// 2D vector used for positions, velocities and offsets
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector2 {
    pub x: f32,
    pub y: f32,
}

impl Vector2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn offset_by(self, offset: Vector2) -> Self {
        Self::new(self.x + offset.x, self.y + offset.y)
    }
}

/// Axis-aligned rectangle
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(origin: Vector2, width: f32, height: f32) -> Self {
        Self {
            x: origin.x,
            y: origin.y,
            width,
            height,
        }
    }

    /// Inclusive-edge overlap test (touching edges count as overlap)
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x + self.width >= other.x
            && self.x <= other.x + other.width
            && self.y + self.height >= other.y
            && self.y <= other.y + other.height
    }
}

/// Physics system for fighter bodies
pub struct PhysicsSystem;

impl PhysicsSystem {
    /// Integrate one tick of motion.
    ///
    /// Applies velocity to position, then resolves the floor: a body that would
    /// reach the ground this tick is snapped to standing height with vertical
    /// velocity cleared, otherwise gravity accumulates. Horizontal velocity is
    /// zeroed afterwards and must be re-asserted from input every tick.
    pub fn integrate(position: &mut Vector2, velocity: &mut Vector2, body_height: f32) {
        position.x += velocity.x;
        position.y += velocity.y;

        if position.y + body_height + velocity.y >= GROUND_LEVEL {
            velocity.y = 0.0;
            position.y = STANDING_Y;
        } else {
            velocity.y += GRAVITY;
        }

        velocity.x = 0.0;
    }

    /// Grounded means no vertical motion at all
    pub fn is_grounded(velocity: &Vector2) -> bool {
        velocity.y == 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn airborne_body_accelerates_downward() {
        let mut pos = Vector2::new(0.0, 0.0);
        let mut vel = Vector2::ZERO;

        PhysicsSystem::integrate(&mut pos, &mut vel, BODY_HEIGHT);
        assert_eq!(pos, Vector2::ZERO);
        assert!((vel.y - GRAVITY).abs() < f32::EPSILON);

        PhysicsSystem::integrate(&mut pos, &mut vel, BODY_HEIGHT);
        assert!((pos.y - GRAVITY).abs() < f32::EPSILON);
    }

    #[test]
    fn body_snaps_to_standing_height() {
        let mut pos = Vector2::new(10.0, 320.0);
        let mut vel = Vector2::new(0.0, 12.0);

        PhysicsSystem::integrate(&mut pos, &mut vel, BODY_HEIGHT);
        assert_eq!(pos.y, STANDING_Y);
        assert_eq!(vel.y, 0.0);
        assert!(PhysicsSystem::is_grounded(&vel));
    }

    #[test]
    fn standing_body_stays_on_ground() {
        let mut pos = Vector2::new(0.0, STANDING_Y);
        let mut vel = Vector2::ZERO;
        for _ in 0..10 {
            PhysicsSystem::integrate(&mut pos, &mut vel, BODY_HEIGHT);
        }
        assert_eq!(pos.y, STANDING_Y);
        assert_eq!(vel.y, 0.0);
    }

    #[test]
    fn horizontal_velocity_is_not_persistent() {
        let mut pos = Vector2::new(100.0, STANDING_Y);
        let mut vel = Vector2::new(RUN_SPEED, 0.0);

        PhysicsSystem::integrate(&mut pos, &mut vel, BODY_HEIGHT);
        assert_eq!(pos.x, 105.0);
        assert_eq!(vel.x, 0.0);

        PhysicsSystem::integrate(&mut pos, &mut vel, BODY_HEIGHT);
        assert_eq!(pos.x, 105.0);
    }

    #[test]
    fn rect_overlap_counts_touching_edges() {
        let a = Rect::new(Vector2::new(0.0, 0.0), 10.0, 10.0);
        let touching = Rect::new(Vector2::new(10.0, 10.0), 5.0, 5.0);
        let apart = Rect::new(Vector2::new(10.5, 0.0), 5.0, 5.0);

        assert!(a.overlaps(&touching));
        assert!(!a.overlaps(&apart));
    }
}
