//! Cosmic Archer - combat simulation and progression core
//!
//! Core modules:
//! - `sim`: Simulation step (movement, enemy AI, spawning, combat, progression)
//! - `tuning`: Data-driven game balance (player, enemies, timings)
//! - `perks`: Perk catalog and weighted draft selector
//! - `dungeons`: Dungeon themes and their difficulty modifiers
//! - `session`: Orchestrator wiring input, event sinks and persistence around the sim
//! - `persistence`: Per-dungeon progress storage

pub mod dungeons;
pub mod perks;
pub mod persistence;
pub mod session;
pub mod sim;
pub mod tuning;

pub use perks::{Perk, PerkCatalog, Rarity};
pub use session::Session;
pub use tuning::{ConfigError, Tuning};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Arena dimensions (portrait)
    pub const ARENA_WIDTH: f32 = 720.0;
    pub const ARENA_HEIGHT: f32 = 1280.0;
    /// Player is kept this far from the arena edges
    pub const PLAYER_EDGE_MARGIN: f32 = 20.0;

    /// Player hitbox base radius (scaled by the tuning hitbox ratio)
    pub const PLAYER_HITBOX_BASE: f32 = 15.0;
    /// Player projectile vs enemy hit radius
    pub const PROJECTILE_HIT_RADIUS: f32 = 30.0;
    /// Enemy projectile vs player hit radius
    pub const ENEMY_PROJECTILE_HIT_RADIUS: f32 = 20.0;
    /// Damage used when an enemy projectile carries none
    pub const DEFAULT_ENEMY_PROJECTILE_DAMAGE: f32 = 10.0;

    /// Non-boss enemies spawn this far outside the arena edge
    pub const SPAWN_EDGE_OFFSET: f32 = 20.0;
    /// Boss spawn slot (top center)
    pub const BOSS_SPAWN_Y: f32 = 100.0;

    /// Pool safety valves: when a pool grows past the cap, the oldest
    /// `*_TRIM` entries are dropped
    pub const MAX_PROJECTILES: usize = 200;
    pub const PROJECTILE_TRIM: usize = 100;
    pub const MAX_ENEMY_PROJECTILES: usize = 150;
    pub const ENEMY_PROJECTILE_TRIM: usize = 75;
    /// Enemy projectiles survive this far past the arena edge
    pub const ENEMY_PROJECTILE_MARGIN: f32 = 50.0;

    /// Goblin shot
    pub const GOBLIN_SHOT_SPEED: f32 = 300.0;
    pub const GOBLIN_SHOT_DAMAGE_RATIO: f32 = 0.5;

    /// Dragon orbit and fire breath
    pub const DRAGON_ORBIT_RADIUS: f32 = 200.0;
    pub const DRAGON_ORBIT_SPEED: f32 = 0.5; // rad/s
    pub const DRAGON_BREATH_COUNT: usize = 8;
    pub const DRAGON_BREATH_SPEED: f32 = 250.0;
    pub const DRAGON_BREATH_DAMAGE_RATIO: f32 = 0.7;

    /// Bat wobble: sin(t * FREQ + x) * AMPLITUDE px/s on the vertical axis
    pub const BAT_WOBBLE_FREQ: f32 = 5.0;
    pub const BAT_WOBBLE_AMPLITUDE: f32 = 50.0;

    /// Multishot spread between adjacent projectiles (radians)
    pub const MULTISHOT_SPREAD: f32 = 0.3;
    /// Omni shot fires this many projectiles evenly around the player
    pub const OMNI_SHOT_COUNT: usize = 8;

    /// Drafts always offer this many perks
    pub const DRAFT_SIZE: usize = 3;
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}

/// Bearing from `from` to `to` in radians
#[inline]
pub fn angle_between(from: Vec2, to: Vec2) -> f32 {
    let d = to - from;
    d.y.atan2(d.x)
}

/// Unit vector pointing along `theta`
#[inline]
pub fn direction(theta: f32) -> Vec2 {
    polar_to_cartesian(1.0, theta)
}

/// Center of the arena
#[inline]
pub fn arena_center() -> Vec2 {
    Vec2::new(consts::ARENA_WIDTH / 2.0, consts::ARENA_HEIGHT / 2.0)
}
