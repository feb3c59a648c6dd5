//! Auto-aim and firing
//!
//! The player never aims. While standing still with the weapon ready, a volley
//! goes out toward the nearest enemy.

use std::f32::consts::TAU;

use super::collision::nearest;
use super::events::GameEvent;
use super::player::{Player, PlayerMode};
use super::state::GameState;
use crate::consts::*;
use crate::perks::ids;
use crate::{angle_between, direction};

/// Health fraction below which berserker kicks in
const BERSERKER_THRESHOLD: f32 = 0.3;
const BERSERKER_BONUS: f32 = 1.5;
const BLOODTHIRST_PER_STACK: f32 = 0.1;

/// Bearings of one volley aimed at `aim`
pub fn volley_bearings(player: &Player, aim: f32) -> Vec<f32> {
    if player.has_perk(ids::OMNI_SHOT) {
        (0..OMNI_SHOT_COUNT)
            .map(|i| aim + i as f32 / OMNI_SHOT_COUNT as f32 * TAU)
            .collect()
    } else if player.has_perk(ids::MULTISHOT) {
        vec![aim - MULTISHOT_SPREAD, aim, aim + MULTISHOT_SPREAD]
    } else {
        vec![aim]
    }
}

/// Damage carried by each projectile fired right now
pub fn shot_damage(player: &Player) -> f32 {
    let mut damage =
        player.stats.damage * (1.0 + player.bloodthirst_stacks as f32 * BLOODTHIRST_PER_STACK);
    if player.has_perk(ids::BERSERKER)
        && player.stats.health < player.stats.max_health * BERSERKER_THRESHOLD
    {
        damage *= BERSERKER_BONUS;
    }
    damage
}

/// Fire at the nearest enemy if standing still and off cooldown.
/// Returns the number of projectiles spawned.
pub fn fire(state: &mut GameState) -> usize {
    let player = &state.player;
    if player.mode != PlayerMode::Stationary || player.weapon_cooldown_ms > 0.0 {
        return 0;
    }
    let Some(target) = nearest(player.pos, state.enemies.iter().map(|e| e.pos)) else {
        return 0;
    };

    let origin = player.pos;
    let aim = angle_between(origin, state.enemies[target].pos);
    let bearings = volley_bearings(player, aim);
    let damage = shot_damage(player);
    let piercing = player.has_perk(ids::PIERCING) || player.has_perk(ids::INFINITE_PIERCE);
    let speed = state.tuning.controls.projectile_speed;

    for &bearing in &bearings {
        state.spawn_projectile(origin, direction(bearing) * speed, damage, piercing);
    }
    state.player.weapon_cooldown_ms = 1000.0 / state.player.stats.attack_speed;
    state.emit(GameEvent::Shot {
        projectiles: bearings.len(),
    });
    bearings.len()
}
