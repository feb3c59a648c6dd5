//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Variable timestep, every timer a remaining duration
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering, audio or storage dependencies

pub mod ai;
pub mod collision;
pub mod combat;
pub mod events;
pub mod player;
pub mod progression;
pub mod spawn;
pub mod state;
pub mod tick;
pub mod weapon;

pub use ai::{AiContext, Behavior, EnemyShot, step_enemy};
pub use combat::{hit_player, on_enemy_death, resolve_combat};
pub use events::{EventLog, EventSink, GameEvent, LogSink};
pub use player::{Player, PlayerMode, PlayerStats};
pub use progression::{KillOutcome, Progression, SelectPerkError, maybe_start_draft, select_perk};
pub use spawn::{SpawnContext, SpawnDirector, SpawnPlan, spawn_tick};
pub use state::{
    Enemy, EnemyProjectile, EntityKind, EntityView, GamePhase, GameState, Pickup, PickupKind,
    Projectile,
};
pub use tick::{TickInput, tick};
pub use weapon::{fire, shot_damage, volley_bearings};
