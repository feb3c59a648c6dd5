//! Spawn director
//!
//! A difficulty budget accrues with unpaused time. Every live enemy holds one
//! unit of it, whatever its type; a spawn only happens when the chosen type's
//! cost fits in what is left. Nothing is carried over from skipped ticks beyond
//! the continuous accrual.

use glam::Vec2;
use rand::Rng;

use super::events::GameEvent;
use super::state::GameState;
use crate::consts::*;
use crate::tuning::{EnemyKind, EnemyTable};

/// Budget and interval bookkeeping
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpawnDirector {
    /// Accrued difficulty budget
    pub difficulty_budget: f32,
    /// Time since the last spawn attempt (ms)
    pub spawn_timer_ms: f32,
}

/// A decided spawn
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnPlan {
    pub kind: EnemyKind,
    pub pos: Vec2,
}

/// World facts the director decides on
#[derive(Debug, Clone, Copy)]
pub struct SpawnContext<'a> {
    pub stage: u32,
    /// Boss stage number
    pub final_stage: u32,
    pub live_enemies: usize,
    pub boss_alive: bool,
    pub enemies: &'a EnemyTable,
}

impl SpawnDirector {
    /// Accrue budget and interval time
    pub fn advance(&mut self, dt_ms: f32, budget_per_second: f32) {
        self.difficulty_budget += dt_ms / 1000.0 * budget_per_second;
        self.spawn_timer_ms += dt_ms;
    }

    /// True once per elapsed interval; the timer restarts from zero
    pub fn spawn_due(&mut self, interval_ms: f32) -> bool {
        if self.spawn_timer_ms >= interval_ms {
            self.spawn_timer_ms = 0.0;
            true
        } else {
            false
        }
    }

    /// Budget left after every live enemy takes its unit
    pub fn available_budget(&self, live_enemies: usize) -> f32 {
        self.difficulty_budget - live_enemies as f32
    }

    /// Decide what (if anything) to spawn this interval
    pub fn plan<R: Rng>(&self, ctx: &SpawnContext, rng: &mut R) -> Option<SpawnPlan> {
        let available = self.available_budget(ctx.live_enemies);

        let dragon_cost = ctx.enemies.get(EnemyKind::Dragon).cost;
        if ctx.stage == ctx.final_stage && !ctx.boss_alive && available >= dragon_cost {
            return Some(SpawnPlan {
                kind: EnemyKind::Dragon,
                pos: Vec2::new(ARENA_WIDTH / 2.0, BOSS_SPAWN_Y),
            });
        }

        let kind = EnemyKind::REGULAR[rng.random_range(0..EnemyKind::REGULAR.len())];
        if ctx.enemies.get(kind).cost > available {
            return None;
        }
        Some(SpawnPlan {
            kind,
            pos: edge_position(rng),
        })
    }
}

/// Random point just outside one of the four arena edges
pub fn edge_position<R: Rng>(rng: &mut R) -> Vec2 {
    match rng.random_range(0..4) {
        0 => Vec2::new(rng.random::<f32>() * ARENA_WIDTH, -SPAWN_EDGE_OFFSET),
        1 => Vec2::new(ARENA_WIDTH + SPAWN_EDGE_OFFSET, rng.random::<f32>() * ARENA_HEIGHT),
        2 => Vec2::new(rng.random::<f32>() * ARENA_WIDTH, ARENA_HEIGHT + SPAWN_EDGE_OFFSET),
        _ => Vec2::new(-SPAWN_EDGE_OFFSET, rng.random::<f32>() * ARENA_HEIGHT),
    }
}

/// Run one spawn interval against the live state
pub fn spawn_tick(state: &mut GameState) -> Option<u32> {
    let ctx = SpawnContext {
        stage: state.progression.current_stage,
        final_stage: state.tuning.progression.stages_per_dungeon,
        live_enemies: state.enemies.len(),
        boss_alive: state.boss_alive(),
        enemies: &state.tuning.enemies,
    };
    let plan = state.director.plan(&ctx, &mut state.rng)?;
    let id = state.spawn_enemy(plan.kind, plan.pos);
    if plan.kind.is_boss() {
        log::info!("Boss spawned (dungeon {}, id {})", state.progression.current_dungeon, id);
        state.emit(GameEvent::BossSpawned { id });
    }
    Some(id)
}
