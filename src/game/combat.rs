//! Combat system - attack box collision and damage

use serde::Serialize;
use tracing::debug;

use super::fighter::Fighter;
use super::sprite::AnimationError;
use super::Side;

/// Damage dealt by one connecting swing
pub const HIT_DAMAGE: i32 = 20;

/// Attack-box versus body overlap test
pub struct CollisionDetector;

impl CollisionDetector {
    /// Whether `attacker`'s attack box touches `defender`'s body
    pub fn rectangular_collision(attacker: &Fighter, defender: &Fighter) -> bool {
        attacker.attack_box().rect().overlaps(&defender.body_rect())
    }
}

/// A swing that connected this tick
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HitResult {
    pub attacker: Side,
    pub defender: Side,
    pub damage: i32,
    pub defender_health: i32,
    pub knocked_out: bool,
}

/// Combat system for resolving swings between the two fighters
pub struct CombatSystem;

impl CombatSystem {
    /// Hit lands iff the boxes overlap and the swing is on its hit frame
    /// and has not connected yet
    pub fn lands(attacker: &Fighter, defender: &Fighter) -> bool {
        attacker.can_land_hit() && CollisionDetector::rectangular_collision(attacker, defender)
    }

    /// Resolve both directions. Eligibility is decided for both fighters before
    /// any damage is applied, so a trade on the same tick lands both ways.
    pub fn resolve_hits(
        player: &mut Fighter,
        enemy: &mut Fighter,
    ) -> Result<Vec<HitResult>, AnimationError> {
        let player_lands = Self::lands(player, enemy);
        let enemy_lands = Self::lands(enemy, player);

        let mut hits = Vec::new();
        if player_lands {
            hits.push(Self::apply_hit(player, enemy, Side::Player)?);
        }
        if enemy_lands {
            hits.push(Self::apply_hit(enemy, player, Side::Enemy)?);
        }
        Ok(hits)
    }

    fn apply_hit(
        attacker: &mut Fighter,
        defender: &mut Fighter,
        attacker_side: Side,
    ) -> Result<HitResult, AnimationError> {
        attacker.register_hit();
        defender.take_hit(HIT_DAMAGE)?;

        let hit = HitResult {
            attacker: attacker_side,
            defender: attacker_side.opponent(),
            damage: HIT_DAMAGE,
            defender_health: defender.health(),
            knocked_out: defender.is_knocked_out(),
        };
        debug!(
            attacker = %attacker.name(),
            defender = %defender.name(),
            damage = hit.damage,
            health = hit.defender_health,
            "Hit landed"
        );
        Ok(hit)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::game::character::Roster;
    use crate::game::fighter::MAX_HEALTH;
    use crate::game::physics::{Vector2, STANDING_Y};
    use crate::game::proptest_gen::frame_sequence_strategy;
    use crate::game::sprite::{Animate, Clip};
    use crate::util::time::DEFAULT_FRAME_HOLD;

    fn fighter(name: &str, x: f32) -> Fighter {
        let roster = Roster::builtin();
        let mut f = Fighter::from_def(roster.get(name).unwrap(), Vector2::new(x, STANDING_Y)).unwrap();
        f.sprite.mark_all_ready();
        f
    }

    /// Start a swing and advance it to the given frame
    fn swing_to_frame(f: &mut Fighter, frame: u32) {
        assert!(f.attack().unwrap());
        for _ in 0..frame * DEFAULT_FRAME_HOLD {
            f.sprite.advance_frame();
        }
        assert_eq!(f.frame_index(), frame);
    }

    #[test]
    fn overlap_uses_attack_box_against_body() {
        let mack = fighter("samurai_mack", 0.0);
        let near = fighter("kenji", 150.0);
        let far = fighter("kenji", 300.0);

        assert!(CollisionDetector::rectangular_collision(&mack, &near));
        assert!(!CollisionDetector::rectangular_collision(&mack, &far));
    }

    #[test]
    fn hit_on_hit_frame_deals_damage_once() {
        let mut player = fighter("samurai_mack", 0.0);
        let mut enemy = fighter("kenji", 150.0);
        let hit_frame = player.attack_hit_frame();
        swing_to_frame(&mut player, hit_frame);

        let hits = CombatSystem::resolve_hits(&mut player, &mut enemy).unwrap();
        assert_eq!(
            hits,
            vec![HitResult {
                attacker: Side::Player,
                defender: Side::Enemy,
                damage: 20,
                defender_health: 80,
                knocked_out: false,
            }]
        );
        assert!(player.already_hit());

        // Same frame again: nothing more
        let hits = CombatSystem::resolve_hits(&mut player, &mut enemy).unwrap();
        assert!(hits.is_empty());
        assert_eq!(enemy.health(), 80);
    }

    #[test]
    fn overlap_off_the_hit_frame_does_nothing() {
        let mut player = fighter("samurai_mack", 0.0);
        let mut enemy = fighter("kenji", 150.0);
        swing_to_frame(&mut player, 3);

        assert!(CombatSystem::resolve_hits(&mut player, &mut enemy).unwrap().is_empty());
        assert_eq!(enemy.health(), 100);
        assert!(!player.already_hit());
    }

    #[test]
    fn hit_frame_without_overlap_does_nothing() {
        let mut player = fighter("samurai_mack", 0.0);
        let mut enemy = fighter("kenji", 600.0);
        swing_to_frame(&mut player, 4);

        assert!(CombatSystem::resolve_hits(&mut player, &mut enemy).unwrap().is_empty());
        assert_eq!(enemy.health(), 100);
    }

    #[test]
    fn idle_fighter_never_hits() {
        let mut player = fighter("samurai_mack", 0.0);
        let mut enemy = fighter("kenji", 150.0);
        assert!(CombatSystem::resolve_hits(&mut player, &mut enemy).unwrap().is_empty());
    }

    #[test]
    fn both_directions_resolve_in_one_tick() {
        let mut player = fighter("samurai_mack", 0.0);
        let mut enemy = fighter("kenji", 150.0);
        swing_to_frame(&mut player, 4);
        swing_to_frame(&mut enemy, 2);

        let hits = CombatSystem::resolve_hits(&mut player, &mut enemy).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(player.health(), 80);
        assert_eq!(enemy.health(), 80);
    }

    #[test]
    fn lethal_hit_clamps_and_reports_knockout() {
        let mut player = fighter("samurai_mack", 0.0);
        let mut enemy = fighter("kenji", 150.0);
        enemy.health = 15;
        swing_to_frame(&mut player, 4);

        let hits = CombatSystem::resolve_hits(&mut player, &mut enemy).unwrap();
        assert_eq!(hits[0].defender_health, 0);
        assert!(hits[0].knocked_out);
        assert_eq!(enemy.health(), 0);
        assert!(!enemy.is_dead());
    }

    /// What one side looked like after the previous tick
    #[derive(Default)]
    struct Watch {
        was_attacking: bool,
        was_dead: bool,
        hit_this_swing: bool,
    }

    impl Watch {
        fn note_swing_start(&mut self, f: &Fighter) {
            if f.is_attacking() && !self.was_attacking {
                self.hit_this_swing = false;
            }
        }

        fn settle(&mut self, f: &Fighter) {
            self.was_attacking = f.is_attacking();
            self.was_dead = f.is_dead();
        }
    }

    proptest! {
        #[test]
        fn brawl_invariants_hold_for_any_input(
            inputs in frame_sequence_strategy(),
            player_health in 1..=MAX_HEALTH,
            enemy_health in 1..=MAX_HEALTH,
        ) {
            let mut player = fighter("samurai_mack", 150.0);
            let mut enemy = fighter("kenji", 400.0);
            player.health = player_health;
            enemy.health = enemy_health;
            let mut player_watch = Watch::default();
            let mut enemy_watch = Watch::default();

            for input in &inputs {
                player.update(&input.player).unwrap();
                enemy.update(&input.enemy).unwrap();
                player_watch.note_swing_start(&player);
                enemy_watch.note_swing_start(&enemy);

                for hit in CombatSystem::resolve_hits(&mut player, &mut enemy).unwrap() {
                    let watch = match hit.attacker {
                        Side::Player => &mut player_watch,
                        Side::Enemy => &mut enemy_watch,
                    };
                    prop_assert!(!watch.hit_this_swing, "one swing connected twice");
                    watch.hit_this_swing = true;
                    prop_assert_eq!(hit.damage, HIT_DAMAGE);
                }

                for (f, watch) in [(&player, &mut player_watch), (&enemy, &mut enemy_watch)] {
                    prop_assert!((0..=MAX_HEALTH).contains(&f.health()));
                    if watch.was_dead {
                        prop_assert!(f.is_dead(), "{} came back to life", f.name());
                    }
                    if f.is_dead() {
                        prop_assert_eq!(f.health(), 0);
                        prop_assert_eq!(f.clip(), Clip::Death);
                    }
                    watch.settle(f);
                }
            }
        }
    }
}
