//! Core events and the sink interface presentation collaborators implement
//!
//! The simulation only records events; audio, camera shake and HUD layers
//! consume them after the step. Sinks return nothing and must not fail.

use glam::Vec2;

use crate::tuning::EnemyKind;

/// Something gameplay-relevant that happened during a tick
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    /// Player fired (one event per volley)
    Shot { projectiles: usize },
    /// A player projectile damaged an enemy without killing it
    EnemyHit { id: u32, kind: EnemyKind },
    EnemyKilled { id: u32, kind: EnemyKind, pos: Vec2 },
    /// Player took damage
    PlayerHit { damage: f32, health: f32 },
    /// A hit was dodged by the agility perk
    PlayerDodged,
    /// A fatal hit was absorbed by a save charge
    PlayerSaved { health: f32 },
    PlayerDied,
    PickupCollected { xp: u32, tokens: u32 },
    LevelUp { level: u32 },
    /// A draft opened; the simulation is paused until a perk is picked
    DraftStarted,
    PerkSelected { id: &'static str },
    BossSpawned { id: u32 },
    /// Enemy fired (goblin shot or dragon breath)
    EnemyFired { id: u32, projectiles: usize },
    StageComplete { stage: u32 },
    /// Final stage boss defeated
    DungeonCleared { dungeon: u32 },
}

/// Receives events after each simulation step
pub trait EventSink {
    fn emit(&mut self, event: &GameEvent);
}

/// Writes every event to the log
#[derive(Debug, Default)]
pub struct LogSink;

impl EventSink for LogSink {
    fn emit(&mut self, event: &GameEvent) {
        match event {
            GameEvent::Shot { .. } | GameEvent::EnemyHit { .. } | GameEvent::EnemyFired { .. } => {
                log::trace!("{:?}", event)
            }
            GameEvent::PickupCollected { .. } | GameEvent::EnemyKilled { .. } => {
                log::debug!("{:?}", event)
            }
            _ => log::info!("{:?}", event),
        }
    }
}

/// Collects events in memory (HUD polling, tests)
#[derive(Debug, Default)]
pub struct EventLog {
    pub events: Vec<GameEvent>,
}

impl EventSink for EventLog {
    fn emit(&mut self, event: &GameEvent) {
        self.events.push(event.clone());
    }
}
