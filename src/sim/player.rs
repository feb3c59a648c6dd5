//! Player state: stats, position, movement mode and perk bookkeeping

use std::collections::HashSet;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::arena_center;
use crate::consts::*;

/// Mutable player stats
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerStats {
    pub health: f32,
    pub max_health: f32,
    /// Pixels per second at full stick deflection
    pub base_move_speed: f32,
    /// Shots per second
    pub attack_speed: f32,
    pub damage: f32,
    pub pickup_radius: f32,
    /// 0..1, capped at 0.75 by the crit perk
    pub crit_rate: f32,
}

impl Default for PlayerStats {
    fn default() -> Self {
        Self {
            health: 100.0,
            max_health: 100.0,
            base_move_speed: 200.0,
            attack_speed: 1.5,
            damage: 10.0,
            pickup_radius: 80.0,
            crit_rate: 0.05,
        }
    }
}

/// Moving and firing are mutually exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlayerMode {
    /// Input above the deadzone: moving, cannot fire
    Moving,
    /// Standing still: auto-fires at the nearest enemy
    #[default]
    Stationary,
}

/// The player character
#[derive(Debug, Clone)]
pub struct Player {
    pub stats: PlayerStats,
    pub pos: Vec2,
    pub mode: PlayerMode,
    /// Remaining invulnerability (ms)
    pub invulnerable_ms: f32,
    /// Remaining weapon cooldown (ms)
    pub weapon_cooldown_ms: f32,
    /// Ids of every perk picked this run
    pub applied_perks: HashSet<&'static str>,
    /// Bloodthirst damage stacks (+10% each)
    pub bloodthirst_stacks: u32,
    /// Fatal-hit saves left (guardian angel, resurrection)
    pub guardian_charges: u8,
    /// Time accumulated toward the next regen tick (ms)
    pub regen_ms: f32,
}

impl Player {
    pub fn new(stats: PlayerStats) -> Self {
        Self {
            stats,
            pos: arena_center(),
            mode: PlayerMode::Stationary,
            invulnerable_ms: 0.0,
            weapon_cooldown_ms: 0.0,
            applied_perks: HashSet::new(),
            bloodthirst_stacks: 0,
            guardian_charges: 0,
            regen_ms: 0.0,
        }
    }

    pub fn has_perk(&self, id: &str) -> bool {
        self.applied_perks.contains(id)
    }

    pub fn is_invulnerable(&self) -> bool {
        self.invulnerable_ms > 0.0
    }

    pub fn is_alive(&self) -> bool {
        self.stats.health > 0.0
    }

    /// Reduce health, never below zero
    pub fn take_damage(&mut self, amount: f32) {
        self.stats.health = (self.stats.health - amount).max(0.0);
    }

    /// Restore health, never above max
    pub fn heal(&mut self, amount: f32) {
        self.stats.health = (self.stats.health + amount).min(self.stats.max_health);
    }

    /// Count down timers by `dt_ms` of unpaused time
    pub fn tick_timers(&mut self, dt_ms: f32) {
        self.invulnerable_ms = (self.invulnerable_ms - dt_ms).max(0.0);
        self.weapon_cooldown_ms = (self.weapon_cooldown_ms - dt_ms).max(0.0);
    }

    /// Apply normalized stick input. Returns the resulting mode.
    ///
    /// Input below the deadzone leaves the player standing (and able to fire);
    /// anything above moves at `base_move_speed`, direction only.
    pub fn apply_movement(&mut self, input: Vec2, deadzone: f32, dt_secs: f32) -> PlayerMode {
        let magnitude = input.length();
        if magnitude > deadzone {
            let vel = input / magnitude * self.stats.base_move_speed;
            let next = self.pos + vel * dt_secs;
            self.pos = Vec2::new(
                next.x.clamp(PLAYER_EDGE_MARGIN, ARENA_WIDTH - PLAYER_EDGE_MARGIN),
                next.y.clamp(PLAYER_EDGE_MARGIN, ARENA_HEIGHT - PLAYER_EDGE_MARGIN),
            );
            self.mode = PlayerMode::Moving;
        } else {
            self.mode = PlayerMode::Stationary;
        }
        self.mode
    }

    /// Regeneration perk: 1 HP per `interval_ms` of unpaused time
    pub fn tick_regen(&mut self, dt_ms: f32, interval_ms: f32) {
        if !self.has_perk(crate::perks::ids::REGEN) {
            return;
        }
        self.regen_ms += dt_ms;
        while self.regen_ms >= interval_ms {
            self.regen_ms -= interval_ms;
            self.heal(1.0);
        }
    }
}
