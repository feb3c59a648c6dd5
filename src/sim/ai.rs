//! Enemy AI
//!
//! One stepper per archetype. Each variant carries its own timers so the
//! behavior state travels with the enemy. Positions move by
//! `speed (px/s) * dt (s)`; the only term tied to absolute time is the bat's
//! wobble.

use std::f32::consts::TAU;

use glam::Vec2;

use super::state::Enemy;
use crate::consts::*;
use crate::tuning::{AiPattern, Timings};
use crate::{angle_between, arena_center, direction, polar_to_cartesian};

/// Per-enemy behavior state
#[derive(Debug, Clone, PartialEq)]
pub enum Behavior {
    /// Direct approach with a vertical sine wobble
    Zigzag,
    /// Approach and fire an aimed shot whenever the cooldown expires
    Shoot { cooldown_ms: f32 },
    /// Direct approach, facing the heading
    Charge { facing: f32 },
    /// Orbit the arena center and breathe a ring of fire
    Boss { timer_ms: f32, cooldown_ms: f32 },
}

impl Behavior {
    /// Fresh state for an archetype. Cooldowns start expired, so shooters
    /// fire on their first tick.
    pub fn for_pattern(pattern: AiPattern) -> Self {
        match pattern {
            AiPattern::Zigzag => Behavior::Zigzag,
            AiPattern::Shoot => Behavior::Shoot { cooldown_ms: 0.0 },
            AiPattern::Charge => Behavior::Charge { facing: 0.0 },
            AiPattern::Boss => Behavior::Boss {
                timer_ms: 0.0,
                cooldown_ms: 0.0,
            },
        }
    }
}

/// What an enemy sees this tick
#[derive(Debug, Clone, Copy)]
pub struct AiContext<'a> {
    pub player_pos: Vec2,
    pub dt_ms: f32,
    /// Absolute unpaused simulation time (seconds)
    pub time_secs: f32,
    pub timings: &'a Timings,
}

impl AiContext<'_> {
    fn dt_secs(&self) -> f32 {
        self.dt_ms / 1000.0
    }
}

/// A projectile an enemy wants to fire
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemyShot {
    pub pos: Vec2,
    pub vel: Vec2,
    pub damage: f32,
}

/// Advance one enemy by one tick. Shots fired are appended to `shots`.
pub fn step_enemy(enemy: &mut Enemy, ctx: &AiContext, shots: &mut Vec<EnemyShot>) {
    let Enemy {
        pos,
        speed,
        damage,
        behavior,
        ..
    } = enemy;

    match behavior {
        Behavior::Zigzag => step_zigzag(pos, *speed, ctx),
        Behavior::Shoot { cooldown_ms } => {
            step_pursue(pos, *speed, ctx);
            *cooldown_ms -= ctx.dt_ms;
            if *cooldown_ms <= 0.0 {
                *cooldown_ms = ctx.timings.goblin_cooldown_ms;
                let aim = angle_between(*pos, ctx.player_pos);
                shots.push(EnemyShot {
                    pos: *pos,
                    vel: direction(aim) * GOBLIN_SHOT_SPEED,
                    damage: *damage * GOBLIN_SHOT_DAMAGE_RATIO,
                });
            }
        }
        Behavior::Charge { facing } => {
            *facing = step_pursue(pos, *speed, ctx);
        }
        Behavior::Boss {
            timer_ms,
            cooldown_ms,
        } => {
            *timer_ms += ctx.dt_ms;
            let theta = *timer_ms / 1000.0 * DRAGON_ORBIT_SPEED;
            *pos = arena_center() + polar_to_cartesian(DRAGON_ORBIT_RADIUS, theta);

            *cooldown_ms -= ctx.dt_ms;
            if *cooldown_ms <= 0.0 {
                *cooldown_ms = ctx.timings.dragon_cooldown_ms;
                for i in 0..DRAGON_BREATH_COUNT {
                    let angle = i as f32 / DRAGON_BREATH_COUNT as f32 * TAU;
                    shots.push(EnemyShot {
                        pos: *pos,
                        vel: direction(angle) * DRAGON_BREATH_SPEED,
                        damage: *damage * DRAGON_BREATH_DAMAGE_RATIO,
                    });
                }
            }
        }
    }
}

/// Move straight at the player. Returns the heading used.
fn step_pursue(pos: &mut Vec2, speed: f32, ctx: &AiContext) -> f32 {
    let heading = angle_between(*pos, ctx.player_pos);
    *pos += direction(heading) * speed * ctx.dt_secs();
    heading
}

/// Approach with a lateral wobble added to vertical motion only
fn step_zigzag(pos: &mut Vec2, speed: f32, ctx: &AiContext) {
    let heading = angle_between(*pos, ctx.player_pos);
    let wobble = (ctx.time_secs * BAT_WOBBLE_FREQ + pos.x).sin() * BAT_WOBBLE_AMPLITUDE;
    let dt = ctx.dt_secs();
    pos.x += heading.cos() * speed * dt;
    pos.y += (heading.sin() * speed + wobble) * dt;
}
