//! Game state and core simulation types
//!
//! Entity pools are plain vectors kept in id order: new entities are pushed at
//! the back, so the front of each pool is always the oldest entry.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::ai::Behavior;
use super::events::GameEvent;
use super::player::Player;
use super::progression::Progression;
use super::spawn::SpawnDirector;
use crate::consts::*;
use crate::dungeons::{DungeonTheme, dungeon_theme};
use crate::perks::{Perk, PerkCatalog};
use crate::tuning::{EnemyKind, Tuning};

/// Current phase of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Simulation advancing
    Playing,
    /// Level-up draft open; the clock is stopped until a perk is picked
    Drafting,
    /// Player died
    Dead,
    /// Final stage boss defeated
    Cleared,
}

impl GamePhase {
    /// Run has ended and will never tick again
    pub fn is_terminal(&self) -> bool {
        matches!(self, GamePhase::Dead | GamePhase::Cleared)
    }
}

/// An enemy entity
#[derive(Debug, Clone)]
pub struct Enemy {
    pub id: u32,
    pub kind: EnemyKind,
    pub pos: Vec2,
    pub health: f32,
    pub max_health: f32,
    pub damage: f32,
    pub speed: f32,
    /// Body radius for melee contact
    pub size: f32,
    /// Per-archetype AI state (cooldowns, facing, orbit timer)
    pub behavior: Behavior,
}

impl Enemy {
    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }
}

/// A player-owned projectile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub damage: f32,
    /// Passes through enemies instead of being consumed on the first hit
    pub piercing: bool,
}

/// An enemy-owned projectile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnemyProjectile {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub damage: f32,
}

impl EnemyProjectile {
    /// Damage dealt on contact; a projectile carrying none falls back to the default
    pub fn effective_damage(&self) -> f32 {
        if self.damage > 0.0 {
            self.damage
        } else {
            DEFAULT_ENEMY_PROJECTILE_DAMAGE
        }
    }
}

/// Pickup types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PickupKind {
    Xp,
    Token,
}

/// A pickup entity. Never expires; consumed when the player gets close.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pickup {
    pub id: u32,
    pub kind: PickupKind,
    pub pos: Vec2,
    pub value: u32,
}

/// What an entity is, for presentation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Enemy(EnemyKind),
    Projectile,
    EnemyProjectile,
    Pickup(PickupKind),
}

/// Read-only view of one live entity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntityView {
    pub id: u32,
    pub pos: Vec2,
    pub kind: EntityKind,
}

/// Complete run state
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    pub tuning: Tuning,
    pub catalog: PerkCatalog,
    pub phase: GamePhase,
    /// Unpaused simulation time (ms)
    pub time_ms: f64,
    pub player: Player,
    pub enemies: Vec<Enemy>,
    pub projectiles: Vec<Projectile>,
    pub enemy_projectiles: Vec<EnemyProjectile>,
    pub pickups: Vec<Pickup>,
    pub director: SpawnDirector,
    pub progression: Progression,
    /// Perks offered by the open draft
    pub draft_choices: Vec<Perk>,
    /// Events recorded since the last drain
    pub events: Vec<GameEvent>,
    /// Next entity ID
    next_id: u32,
}

impl GameState {
    /// New run in dungeon 1 with shipped balance
    pub fn new(seed: u64) -> Self {
        Self::with_config(seed, Tuning::default(), PerkCatalog::standard(), 1)
    }

    /// New run with explicit balance, catalog and dungeon
    pub fn with_config(seed: u64, tuning: Tuning, catalog: PerkCatalog, dungeon: u32) -> Self {
        let player = Player::new(tuning.player);
        let progression = Progression::new(dungeon, &tuning);
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            tuning,
            catalog,
            phase: GamePhase::Playing,
            time_ms: 0.0,
            player,
            enemies: Vec::new(),
            projectiles: Vec::new(),
            enemy_projectiles: Vec::new(),
            pickups: Vec::new(),
            director: SpawnDirector::default(),
            progression,
            draft_choices: Vec::new(),
            events: Vec::new(),
            next_id: 1,
        }
    }

    /// Start over, keeping balance, catalog and the selected dungeon
    pub fn reset(&mut self) {
        let dungeon = self.progression.current_dungeon;
        let tuning = std::mem::take(&mut self.tuning);
        let catalog = self.catalog.clone();
        *self = Self::with_config(self.seed, tuning, catalog, dungeon);
        log::info!("Run reset (dungeon {}, seed {})", dungeon, self.seed);
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Theme of the dungeon being played
    pub fn dungeon(&self) -> &'static DungeonTheme {
        dungeon_theme(self.progression.current_dungeon)
    }

    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Take every event recorded so far
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Spawn an enemy with table stats scaled by the dungeon modifier
    pub fn spawn_enemy(&mut self, kind: EnemyKind, pos: Vec2) -> u32 {
        let id = self.next_entity_id();
        let config = self.tuning.enemies.get(kind);
        let modifier = self.dungeon().enemy_modifier;
        let health = config.health * modifier;
        self.enemies.push(Enemy {
            id,
            kind,
            pos,
            health,
            max_health: health,
            damage: config.damage * modifier,
            speed: config.speed,
            size: config.size,
            behavior: Behavior::for_pattern(config.ai_pattern),
        });
        id
    }

    pub fn spawn_projectile(&mut self, pos: Vec2, vel: Vec2, damage: f32, piercing: bool) -> u32 {
        let id = self.next_entity_id();
        self.projectiles.push(Projectile {
            id,
            pos,
            vel,
            damage,
            piercing,
        });
        id
    }

    pub fn spawn_enemy_projectile(&mut self, pos: Vec2, vel: Vec2, damage: f32) -> u32 {
        let id = self.next_entity_id();
        self.enemy_projectiles.push(EnemyProjectile { id, pos, vel, damage });
        id
    }

    pub fn spawn_pickup(&mut self, kind: PickupKind, pos: Vec2, value: u32) -> u32 {
        let id = self.next_entity_id();
        self.pickups.push(Pickup { id, kind, pos, value });
        id
    }

    /// Is a dragon currently alive
    pub fn boss_alive(&self) -> bool {
        self.enemies.iter().any(|e| e.kind.is_boss())
    }

    /// Drop the oldest projectiles once a pool passes its cap
    pub fn trim_pools(&mut self) {
        if self.projectiles.len() > MAX_PROJECTILES {
            self.projectiles.drain(..PROJECTILE_TRIM);
        }
        if self.enemy_projectiles.len() > MAX_ENEMY_PROJECTILES {
            self.enemy_projectiles.drain(..ENEMY_PROJECTILE_TRIM);
        }
    }

    /// Stop the run: discard every pool and any open draft
    pub fn end_run(&mut self) {
        self.enemies.clear();
        self.projectiles.clear();
        self.enemy_projectiles.clear();
        self.pickups.clear();
        self.draft_choices.clear();
    }

    /// Seconds of unpaused play
    pub fn duration_secs(&self) -> f64 {
        self.time_ms / 1000.0
    }

    /// Every live entity, for presentation
    pub fn entities(&self) -> impl Iterator<Item = EntityView> + '_ {
        let enemies = self.enemies.iter().map(|e| EntityView {
            id: e.id,
            pos: e.pos,
            kind: EntityKind::Enemy(e.kind),
        });
        let projectiles = self.projectiles.iter().map(|p| EntityView {
            id: p.id,
            pos: p.pos,
            kind: EntityKind::Projectile,
        });
        let enemy_projectiles = self.enemy_projectiles.iter().map(|p| EntityView {
            id: p.id,
            pos: p.pos,
            kind: EntityKind::EnemyProjectile,
        });
        let pickups = self.pickups.iter().map(|p| EntityView {
            id: p.id,
            pos: p.pos,
            kind: EntityKind::Pickup(p.kind),
        });
        enemies.chain(projectiles).chain(enemy_projectiles).chain(pickups)
    }
}
