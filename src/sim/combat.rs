//! Combat resolver
//!
//! Runs once per tick after movement and AI, in three fixed phases:
//! player projectiles against enemies, enemy projectiles against the player,
//! then melee contact. Each player phase checks invulnerability once at its
//! start, so every overlap found in that phase lands.

use rand::Rng;

use super::collision::{melee_radius, within};
use super::events::GameEvent;
use super::state::{GamePhase, GameState, PickupKind};
use crate::consts::*;
use crate::perks::ids;

const LIFESTEAL_HEAL: f32 = 2.0;
const DODGE_CHANCE: f32 = 0.1;
const GUARDIAN_HEAL_FRACTION: f32 = 0.5;

/// Resolve every overlap for this tick
pub fn resolve_combat(state: &mut GameState) {
    projectiles_vs_enemies(state);
    enemy_projectiles_vs_player(state);
    melee_vs_player(state);
}

fn projectiles_vs_enemies(state: &mut GameState) {
    let mut hit = Vec::new();
    let GameState {
        projectiles,
        enemies,
        ..
    } = state;

    projectiles.retain(|proj| {
        for enemy in enemies.iter_mut().filter(|e| e.is_alive()) {
            if !within(proj.pos, enemy.pos, PROJECTILE_HIT_RADIUS) {
                continue;
            }
            enemy.health -= proj.damage;
            hit.push(enemy.id);
            if !proj.piercing {
                return false;
            }
        }
        true
    });

    for id in hit {
        if let Some(enemy) = state.enemies.iter().find(|e| e.id == id && e.is_alive()) {
            let kind = enemy.kind;
            state.emit(GameEvent::EnemyHit { id, kind });
        }
    }

    let dead: Vec<u32> = state
        .enemies
        .iter()
        .filter(|e| !e.is_alive())
        .map(|e| e.id)
        .collect();
    for id in dead {
        on_enemy_death(state, id);
    }
}

fn enemy_projectiles_vs_player(state: &mut GameState) {
    if state.phase != GamePhase::Playing || state.player.is_invulnerable() {
        return;
    }
    let player_pos = state.player.pos;
    let mut damages = Vec::new();
    state.enemy_projectiles.retain(|p| {
        if within(p.pos, player_pos, ENEMY_PROJECTILE_HIT_RADIUS) {
            damages.push(p.effective_damage());
            false
        } else {
            true
        }
    });

    for damage in damages {
        if state.phase != GamePhase::Playing {
            break;
        }
        hit_player(state, damage);
    }
}

fn melee_vs_player(state: &mut GameState) {
    if state.phase != GamePhase::Playing || state.player.is_invulnerable() {
        return;
    }
    let player_pos = state.player.pos;
    let ratio = state.tuning.controls.player_hitbox_ratio;
    // Every overlapping enemy lands its full damage; there is no per-pair debounce
    let damages: Vec<f32> = state
        .enemies
        .iter()
        .filter(|e| within(player_pos, e.pos, melee_radius(ratio, e.size)))
        .map(|e| e.damage)
        .collect();

    for damage in damages {
        if state.phase != GamePhase::Playing {
            break;
        }
        hit_player(state, damage);
    }
}

/// Remove a dead enemy and apply every kill side effect
pub fn on_enemy_death(state: &mut GameState, id: u32) {
    let Some(index) = state.enemies.iter().position(|e| e.id == id) else {
        return;
    };
    let enemy = state.enemies.remove(index);
    let boss = enemy.kind.is_boss();
    let outcome = state.progression.record_kill(enemy.kind, &state.tuning);
    state.emit(GameEvent::EnemyKilled {
        id,
        kind: enemy.kind,
        pos: enemy.pos,
    });

    let g = &state.tuning.progression;
    let (xp, boss_tokens, token, rate) = (
        if boss { g.boss_xp_drop } else { g.xp_drop },
        g.boss_token_drop,
        g.token_drop,
        g.token_drop_rate,
    );
    state.spawn_pickup(PickupKind::Xp, enemy.pos, xp);

    if boss {
        state.spawn_pickup(PickupKind::Token, enemy.pos, boss_tokens);
    } else {
        let mut chance = rate;
        if state.player.has_perk(ids::TOKEN_MULTIPLIER) {
            chance *= 2.0;
        }
        if state.player.has_perk(ids::TOKEN_RAIN) {
            chance *= 3.0;
        }
        if state.rng.random::<f32>() < chance {
            state.spawn_pickup(PickupKind::Token, enemy.pos, token);
        }
    }

    if state.player.has_perk(ids::BLOODTHIRST) {
        state.player.bloodthirst_stacks += 1;
    }
    if state.player.has_perk(ids::LIFESTEAL) {
        state.player.heal(LIFESTEAL_HEAL);
    }

    if let Some(stage) = outcome.stage_completed {
        log::info!(
            "Stage {} complete (dungeon {}, {} kills)",
            stage,
            state.progression.current_dungeon,
            state.progression.kill_count
        );
        state.emit(GameEvent::StageComplete { stage });
    }
    if outcome.dungeon_cleared {
        let dungeon = state.progression.current_dungeon;
        log::info!("Dungeon {} cleared, score {}", dungeon, state.progression.score);
        state.phase = GamePhase::Cleared;
        state.emit(GameEvent::DungeonCleared { dungeon });
    }
}

/// Apply one incoming hit to the player
pub fn hit_player(state: &mut GameState, damage: f32) {
    if state.player.has_perk(ids::DODGE_CHANCE) && state.rng.random::<f32>() < DODGE_CHANCE {
        state.emit(GameEvent::PlayerDodged);
        return;
    }

    let player = &mut state.player;
    if player.stats.health - damage <= 0.0 && player.guardian_charges > 0 {
        player.guardian_charges -= 1;
        player.stats.health = player.stats.max_health * GUARDIAN_HEAL_FRACTION;
        player.invulnerable_ms = state.tuning.timings.guardian_invulnerability_ms;
        let health = player.stats.health;
        log::info!("Fatal hit absorbed, {} save charges left", player.guardian_charges);
        state.emit(GameEvent::PlayerSaved { health });
        return;
    }

    player.take_damage(damage);
    player.invulnerable_ms = state.tuning.timings.invulnerability_ms;
    let health = player.stats.health;
    state.emit(GameEvent::PlayerHit { damage, health });

    if !state.player.is_alive() {
        log::info!(
            "Player died on stage {} of dungeon {}",
            state.progression.current_stage,
            state.progression.current_dungeon
        );
        state.phase = GamePhase::Dead;
        state.emit(GameEvent::PlayerDied);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuning::EnemyKind;
    use glam::Vec2;

    /// Enemy far from the player so melee never interferes
    fn setup(enemy_health: f32) -> (GameState, u32) {
        let mut state = GameState::new(7);
        state.player.pos = Vec2::ZERO;
        let id = state.spawn_enemy(EnemyKind::Bat, Vec2::new(400.0, 400.0));
        state.enemies[0].health = enemy_health;
        (state, id)
    }

    #[test]
    fn test_projectile_wounds_enemy() {
        let (mut state, id) = setup(20.0);
        state.spawn_projectile(Vec2::new(425.0, 400.0), Vec2::ZERO, 10.0, false);
        resolve_combat(&mut state);

        assert_eq!(state.enemies.len(), 1);
        assert_eq!(state.enemies[0].health, 10.0);
        assert!(state.projectiles.is_empty());
        assert_eq!(
            state.drain_events(),
            vec![GameEvent::EnemyHit {
                id,
                kind: EnemyKind::Bat
            }]
        );
    }

    #[test]
    fn test_projectile_kills_enemy() {
        let (mut state, _) = setup(20.0);
        state.spawn_projectile(Vec2::new(425.0, 400.0), Vec2::ZERO, 25.0, false);
        resolve_combat(&mut state);

        assert!(state.enemies.is_empty());
        assert!(state.projectiles.is_empty());
        let xp: Vec<_> = state
            .pickups
            .iter()
            .filter(|p| p.kind == PickupKind::Xp)
            .collect();
        assert_eq!(xp.len(), 1);
        assert_eq!(xp[0].value, 10);
        assert!(state.pickups.len() <= 2);
        for p in &state.pickups {
            assert_eq!(p.pos, Vec2::new(400.0, 400.0));
        }
        assert_eq!(state.progression.kill_count, 1);
        assert_eq!(state.progression.score, 100);
    }

    #[test]
    fn test_piercing_hits_every_enemy() {
        let (mut state, _) = setup(20.0);
        state.spawn_enemy(EnemyKind::Bat, Vec2::new(410.0, 400.0));
        state.spawn_projectile(Vec2::new(405.0, 400.0), Vec2::ZERO, 5.0, true);
        resolve_combat(&mut state);
        assert_eq!(state.projectiles.len(), 1);
        assert_eq!(state.enemies[0].health, 15.0);
        assert_eq!(state.enemies[1].health, 15.0);
    }

    #[test]
    fn test_non_piercing_stops_at_first_enemy() {
        let (mut state, _) = setup(20.0);
        state.spawn_enemy(EnemyKind::Bat, Vec2::new(410.0, 400.0));
        state.spawn_projectile(Vec2::new(405.0, 400.0), Vec2::ZERO, 5.0, false);
        resolve_combat(&mut state);
        assert_eq!(state.enemies[0].health, 15.0);
        assert_eq!(state.enemies[1].health, 20.0);
    }

    #[test]
    fn test_boss_drops() {
        let mut state = GameState::new(7);
        state.player.pos = Vec2::ZERO;
        state.spawn_enemy(EnemyKind::Dragon, Vec2::new(300.0, 300.0));
        state.enemies[0].health = 1.0;
        state.spawn_projectile(Vec2::new(300.0, 300.0), Vec2::ZERO, 5.0, false);
        resolve_combat(&mut state);

        let xp = state.pickups.iter().find(|p| p.kind == PickupKind::Xp).unwrap();
        let token = state.pickups.iter().find(|p| p.kind == PickupKind::Token).unwrap();
        assert_eq!(xp.value, 100);
        assert_eq!(token.value, 10);
    }

    #[test]
    fn test_final_boss_clears_dungeon() {
        let mut state = GameState::new(7);
        state.player.pos = Vec2::ZERO;
        state.progression.current_stage = 5;
        state.spawn_enemy(EnemyKind::Dragon, Vec2::new(300.0, 300.0));
        state.enemies[0].health = 1.0;
        state.spawn_projectile(Vec2::new(300.0, 300.0), Vec2::ZERO, 5.0, false);
        // Would hit the player if the phase stayed open
        state.spawn_enemy_projectile(Vec2::ZERO, Vec2::ZERO, 10.0);
        resolve_combat(&mut state);

        assert_eq!(state.phase, GamePhase::Cleared);
        assert_eq!(state.player.stats.health, 100.0);
        let events = state.drain_events();
        assert!(events.contains(&GameEvent::StageComplete { stage: 5 }));
        assert!(events.contains(&GameEvent::DungeonCleared { dungeon: 1 }));
    }

    #[test]
    fn test_kill_perks() {
        let (mut state, _) = setup(5.0);
        state.player.applied_perks.insert(ids::BLOODTHIRST);
        state.player.applied_perks.insert(ids::LIFESTEAL);
        state.player.stats.health = 50.0;
        state.spawn_projectile(Vec2::new(400.0, 400.0), Vec2::ZERO, 10.0, false);
        resolve_combat(&mut state);
        assert_eq!(state.player.bloodthirst_stacks, 1);
        assert_eq!(state.player.stats.health, 52.0);
    }

    #[test]
    fn test_enemy_projectile_hits_player() {
        let mut state = GameState::new(7);
        let p = state.player.pos;
        state.spawn_enemy_projectile(p + Vec2::new(10.0, 0.0), Vec2::ZERO, 6.0);
        state.spawn_enemy_projectile(p + Vec2::new(50.0, 0.0), Vec2::ZERO, 6.0);
        resolve_combat(&mut state);
        assert_eq!(state.player.stats.health, 94.0);
        assert_eq!(state.player.invulnerable_ms, 1000.0);
        assert_eq!(state.enemy_projectiles.len(), 1);
    }

    #[test]
    fn test_invulnerable_player_ignores_hits() {
        let mut state = GameState::new(7);
        let p = state.player.pos;
        state.player.invulnerable_ms = 500.0;
        state.spawn_enemy_projectile(p, Vec2::ZERO, 6.0);
        state.spawn_enemy(EnemyKind::Orc, p);
        resolve_combat(&mut state);
        assert_eq!(state.player.stats.health, 100.0);
        assert_eq!(state.enemy_projectiles.len(), 1);
    }

    #[test]
    fn test_melee_stacks_per_enemy() {
        let mut state = GameState::new(7);
        let p = state.player.pos;
        state.spawn_enemy(EnemyKind::Bat, p + Vec2::new(5.0, 0.0));
        state.spawn_enemy(EnemyKind::Bat, p + Vec2::new(-5.0, 0.0));
        state.spawn_enemy(EnemyKind::Bat, p + Vec2::new(200.0, 0.0));
        resolve_combat(&mut state);
        assert_eq!(state.player.stats.health, 84.0);
        assert_eq!(state.player.invulnerable_ms, 1000.0);
    }

    #[test]
    fn test_guardian_angel_save() {
        let mut state = GameState::new(7);
        state.player.stats.health = 5.0;
        state.player.applied_perks.insert(ids::GUARDIAN_ANGEL);
        state.player.guardian_charges = 1;

        hit_player(&mut state, 20.0);
        assert_eq!(state.player.stats.health, 50.0);
        assert_eq!(state.player.invulnerable_ms, 3000.0);
        assert_eq!(state.player.guardian_charges, 0);
        assert_eq!(state.phase, GamePhase::Playing);

        // Charge is spent
        state.player.stats.health = 5.0;
        hit_player(&mut state, 20.0);
        assert_eq!(state.phase, GamePhase::Dead);
        assert_eq!(state.player.stats.health, 0.0);
    }

    #[test]
    fn test_death_is_terminal() {
        let mut state = GameState::new(7);
        hit_player(&mut state, 150.0);
        assert_eq!(state.player.stats.health, 0.0);
        assert_eq!(state.phase, GamePhase::Dead);
        assert!(state.drain_events().contains(&GameEvent::PlayerDied));
    }

    /// Fraction of `kills` bat deaths that dropped a token
    fn token_drop_rate(perks: &[&'static str], kills: usize) -> f32 {
        let mut state = GameState::new(99);
        state.player.pos = Vec2::ZERO;
        for &perk in perks {
            state.player.applied_perks.insert(perk);
        }
        let mut drops = 0;
        for _ in 0..kills {
            let id = state.spawn_enemy(EnemyKind::Bat, Vec2::new(400.0, 400.0));
            on_enemy_death(&mut state, id);
            drops += state
                .pickups
                .iter()
                .filter(|p| p.kind == PickupKind::Token)
                .count();
            state.pickups.clear();
        }
        drops as f32 / kills as f32
    }

    #[test]
    fn test_token_drop_rates() {
        let kills = 20_000;
        let cases: [(&[&'static str], f32); 4] = [
            (&[], 0.15),
            (&[ids::TOKEN_MULTIPLIER], 0.30),
            (&[ids::TOKEN_RAIN], 0.45),
            (&[ids::TOKEN_MULTIPLIER, ids::TOKEN_RAIN], 0.90),
        ];
        for (perks, expected) in cases {
            let rate = token_drop_rate(perks, kills);
            assert!(
                (rate - expected).abs() < 0.02,
                "perks {:?}: rate {} expected {}",
                perks,
                rate,
                expected
            );
        }
    }

    #[test]
    fn test_dodge_sometimes_ignores_hits() {
        let mut state = GameState::new(7);
        state.player.applied_perks.insert(ids::DODGE_CHANCE);
        let mut dodged = 0;
        for _ in 0..500 {
            state.player.stats.health = 100.0;
            hit_player(&mut state, 1.0);
            if state.player.stats.health == 100.0 {
                dodged += 1;
            }
        }
        assert!(dodged > 10 && dodged < 120, "dodged {} of 500", dodged);
    }
}
