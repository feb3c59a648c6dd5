//! Per-frame simulation step
//!
//! One call per rendered frame with the elapsed time since the previous one.
//! Every timer is a remaining duration decremented here, so a frame that is
//! not ticked (draft open, run over) never consumes time.

use glam::Vec2;

use super::ai::{AiContext, step_enemy};
use super::collision::{in_arena, within};
use super::combat::resolve_combat;
use super::events::GameEvent;
use super::progression::maybe_start_draft;
use super::spawn::spawn_tick;
use super::state::{GamePhase, GameState, PickupKind};
use super::weapon::fire;
use crate::consts::*;
use crate::perks::ids;

const XP_BOOST: f32 = 1.25;

/// Input for a single step
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickInput {
    /// Normalized stick vector, magnitude in [0, 1]
    pub movement: Vec2,
}

impl TickInput {
    pub fn still() -> Self {
        Self::default()
    }

    pub fn moving(movement: Vec2) -> Self {
        Self { movement }
    }
}

/// Advance the run by `dt_ms` of wall-clock time
pub fn tick(state: &mut GameState, input: &TickInput, dt_ms: f32) {
    // Drafting and terminal phases do not tick
    if state.phase != GamePhase::Playing {
        return;
    }

    state.time_ms += dt_ms as f64;
    state.player.tick_timers(dt_ms);
    state.director.advance(dt_ms, state.tuning.spawn.budget_per_second);
    state.player.tick_regen(dt_ms, state.tuning.timings.regen_interval_ms);

    let dt_secs = dt_ms / 1000.0;
    state
        .player
        .apply_movement(input.movement, state.tuning.controls.joystick_deadzone, dt_secs);
    fire(state);

    step_enemies(state, dt_ms);
    move_projectiles(state, dt_secs);
    state.trim_pools();

    resolve_combat(state);
    if state.phase.is_terminal() {
        state.end_run();
        return;
    }

    if state.director.spawn_due(state.tuning.timings.spawn_interval_ms) {
        spawn_tick(state);
    }

    collect_pickups(state);
    maybe_start_draft(state);
}

fn step_enemies(state: &mut GameState, dt_ms: f32) {
    let ctx = AiContext {
        player_pos: state.player.pos,
        dt_ms,
        time_secs: (state.time_ms / 1000.0) as f32,
        timings: &state.tuning.timings,
    };

    let mut shots = Vec::new();
    let mut fired = Vec::new();
    for enemy in state.enemies.iter_mut() {
        let before = shots.len();
        step_enemy(enemy, &ctx, &mut shots);
        if shots.len() > before {
            fired.push((enemy.id, shots.len() - before));
        }
    }

    for shot in shots {
        state.spawn_enemy_projectile(shot.pos, shot.vel, shot.damage);
    }
    for (id, projectiles) in fired {
        state.emit(GameEvent::EnemyFired { id, projectiles });
    }
}

fn move_projectiles(state: &mut GameState, dt_secs: f32) {
    for p in state.projectiles.iter_mut() {
        p.pos += p.vel * dt_secs;
    }
    state.projectiles.retain(|p| in_arena(p.pos, 0.0));

    for p in state.enemy_projectiles.iter_mut() {
        p.pos += p.vel * dt_secs;
    }
    state
        .enemy_projectiles
        .retain(|p| in_arena(p.pos, ENEMY_PROJECTILE_MARGIN));
}

/// Consume every pickup inside the player's pickup radius
fn collect_pickups(state: &mut GameState) {
    let player_pos = state.player.pos;
    let radius = state.player.stats.pickup_radius;
    let mut collected = Vec::new();
    state.pickups.retain(|p| {
        if within(player_pos, p.pos, radius) {
            collected.push((p.kind, p.value));
            false
        } else {
            true
        }
    });
    if collected.is_empty() {
        return;
    }

    let theme = state.dungeon();
    let mut xp_scale = theme.xp_multiplier;
    if state.player.has_perk(ids::XP_BOOST) {
        xp_scale *= XP_BOOST;
    }

    for (kind, value) in collected {
        match kind {
            PickupKind::Xp => {
                let xp = (value as f32 * xp_scale).round() as u32;
                state.emit(GameEvent::PickupCollected { xp, tokens: 0 });
                if state.progression.add_xp(xp, &state.tuning) {
                    let level = state.progression.level;
                    log::info!("Level up: {}", level);
                    state.emit(GameEvent::LevelUp { level });
                }
            }
            PickupKind::Token => {
                let tokens = (value as f32 * theme.token_multiplier).round() as u32;
                state.progression.add_tokens(tokens);
                state.emit(GameEvent::PickupCollected { xp: 0, tokens });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::perks::PerkCatalog;
    use crate::tuning::{EnemyKind, Tuning};

    const FRAME: f32 = 1000.0 / 60.0;

    #[test]
    fn test_drafting_freezes_clock() {
        let mut state = GameState::new(1);
        state.spawn_enemy(EnemyKind::Bat, Vec2::ZERO);
        state.phase = GamePhase::Drafting;
        let before = state.enemies[0].pos;
        for _ in 0..120 {
            tick(&mut state, &TickInput::still(), FRAME);
        }
        assert_eq!(state.time_ms, 0.0);
        assert_eq!(state.director.difficulty_budget, 0.0);
        assert_eq!(state.enemies[0].pos, before);
    }

    #[test]
    fn test_first_spawn_after_interval() {
        let mut state = GameState::new(4);
        // Budget 1/s and interval 2 s: first attempt has 2 units
        let mut t = 0.0;
        while state.enemies.is_empty() && t < 10_000.0 {
            tick(&mut state, &TickInput::still(), FRAME);
            t += FRAME;
        }
        assert!(t >= 2000.0 - FRAME);
        assert_eq!(state.enemies.len(), 1);
        let cost = state.tuning.enemies.get(state.enemies[0].kind).cost;
        assert!(cost <= state.director.difficulty_budget);
    }

    #[test]
    fn test_moving_player_holds_fire() {
        let mut state = GameState::new(1);
        let p = state.player.pos;
        state.spawn_enemy(EnemyKind::Orc, p + Vec2::new(200.0, 0.0));

        tick(&mut state, &TickInput::moving(Vec2::new(0.0, 1.0)), FRAME);
        assert!(state.projectiles.is_empty());
        assert!(state.player.pos.y > p.y);

        tick(&mut state, &TickInput::still(), FRAME);
        assert_eq!(state.projectiles.len(), 1);
    }

    #[test]
    fn test_projectiles_culled_outside_arena() {
        let mut state = GameState::new(1);
        state.spawn_projectile(Vec2::new(5.0, 5.0), Vec2::new(-600.0, 0.0), 1.0, false);
        state.spawn_enemy_projectile(Vec2::new(5.0, 640.0), Vec2::new(-600.0, 0.0), 1.0);
        tick(&mut state, &TickInput::still(), FRAME);
        assert!(state.projectiles.is_empty());
        // Enemy shots get a 50 px grace margin
        assert_eq!(state.enemy_projectiles.len(), 1);
    }

    #[test]
    fn test_pickups_collected_in_radius() {
        let mut state = GameState::new(1);
        let p = state.player.pos;
        state.spawn_pickup(PickupKind::Xp, p + Vec2::new(50.0, 0.0), 10);
        state.spawn_pickup(PickupKind::Token, p + Vec2::new(0.0, 30.0), 1);
        state.spawn_pickup(PickupKind::Xp, p + Vec2::new(300.0, 0.0), 10);
        tick(&mut state, &TickInput::still(), FRAME);

        assert_eq!(state.pickups.len(), 1);
        assert_eq!(state.progression.xp, 10);
        assert_eq!(state.progression.pending_tokens, 1);
    }

    #[test]
    fn test_dungeon_reward_multipliers() {
        let mut state = GameState::with_config(1, Tuning::default(), PerkCatalog::standard(), 2);
        state.player.applied_perks.insert(ids::XP_BOOST);
        let p = state.player.pos;
        state.spawn_pickup(PickupKind::Xp, p, 10);
        state.spawn_pickup(PickupKind::Token, p, 10);
        tick(&mut state, &TickInput::still(), FRAME);

        // 10 * 1.2 * 1.25
        assert_eq!(state.progression.xp, 15);
        assert_eq!(state.progression.pending_tokens, 13);
    }

    #[test]
    fn test_level_up_opens_one_draft() {
        let mut state = GameState::new(1);
        let p = state.player.pos;
        for _ in 0..30 {
            state.spawn_pickup(PickupKind::Xp, p, 10);
        }
        tick(&mut state, &TickInput::still(), FRAME);

        // 300 XP: level 2 at 100, level 3 at 144 more, 50 left over
        assert_eq!(state.progression.level, 3);
        assert_eq!(state.phase, GamePhase::Drafting);
        assert_eq!(state.draft_choices.len(), DRAFT_SIZE);
        let drafts = state
            .drain_events()
            .into_iter()
            .filter(|e| *e == GameEvent::DraftStarted)
            .count();
        assert_eq!(drafts, 1);

        state.select_perk(0).unwrap();
        assert_eq!(state.phase, GamePhase::Drafting);
        state.select_perk(0).unwrap();
        assert_eq!(state.phase, GamePhase::Playing);
    }

    #[test]
    fn test_death_discards_pools() {
        let mut state = GameState::new(1);
        state.player.stats.health = 1.0;
        let p = state.player.pos;
        state.spawn_enemy(EnemyKind::Orc, p);
        state.spawn_pickup(PickupKind::Xp, Vec2::ZERO, 10);
        tick(&mut state, &TickInput::still(), FRAME);

        assert_eq!(state.phase, GamePhase::Dead);
        assert!(state.enemies.is_empty());
        assert!(state.pickups.is_empty());
        assert!(state.projectiles.is_empty());

        let t = state.time_ms;
        tick(&mut state, &TickInput::still(), FRAME);
        assert_eq!(state.time_ms, t);
    }

    #[test]
    fn test_goblin_shots_become_enemy_projectiles() {
        let mut state = GameState::new(1);
        let id = state.spawn_enemy(EnemyKind::Goblin, Vec2::new(100.0, 100.0));
        tick(&mut state, &TickInput::moving(Vec2::X), FRAME);
        assert_eq!(state.enemy_projectiles.len(), 1);
        assert!(
            state
                .drain_events()
                .contains(&GameEvent::EnemyFired { id, projectiles: 1 })
        );
    }
}
