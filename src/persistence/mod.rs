//! Persisted progress
//!
//! Per-dungeon bests plus global totals, stored as JSON. The simulation never
//! touches a store directly: the session hands a finished run over once, and
//! any failure is logged there and goes no further.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::dungeons::DUNGEON_COUNT;

/// Stages a dungeon has to clear to unlock the next one
pub const STAGES_TO_UNLOCK: u32 = 5;

/// Errors from reading or writing progress
#[derive(Debug)]
pub enum PersistenceError {
    Io(std::io::Error),
    Serde(serde_json::Error),
}

impl std::fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "Progress I/O error: {}", e),
            Self::Serde(e) => write!(f, "Progress format error: {}", e),
        }
    }
}

impl std::error::Error for PersistenceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Serde(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for PersistenceError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serde(e)
    }
}

/// Bests for one dungeon
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DungeonProgress {
    /// 0..=5
    pub completed_stages: u32,
    /// 0..=5
    pub stars: u32,
    /// Longest run (seconds)
    pub best_time: f64,
    pub best_score: u64,
    pub unlocked: bool,
}

/// Everything persisted between runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameProgress {
    pub current_dungeon: u32,
    pub dungeons: BTreeMap<u32, DungeonProgress>,
    pub total_tokens: u64,
    pub total_kills: u64,
    pub highest_stage: u32,
    pub highest_dungeon: u32,
}

impl Default for GameProgress {
    fn default() -> Self {
        let dungeons = (1..=DUNGEON_COUNT)
            .map(|id| {
                let progress = DungeonProgress {
                    unlocked: id == 1,
                    ..Default::default()
                };
                (id, progress)
            })
            .collect();
        Self {
            current_dungeon: 1,
            dungeons,
            total_tokens: 0,
            total_kills: 0,
            highest_stage: 0,
            highest_dungeon: 1,
        }
    }
}

/// Snapshot of a finished run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    pub dungeon: u32,
    pub stages_completed: u32,
    pub score: u64,
    pub duration_secs: f64,
    pub kills: u32,
    pub tokens: u32,
}

impl GameProgress {
    /// Make sure every dungeon has an entry (older saves may lack some)
    pub fn fill_missing(&mut self) {
        for id in 1..=DUNGEON_COUNT {
            self.dungeons.entry(id).or_insert_with(|| DungeonProgress {
                unlocked: id == 1,
                ..Default::default()
            });
        }
    }

    pub fn is_unlocked(&self, dungeon: u32) -> bool {
        self.dungeons.get(&dungeon).is_some_and(|d| d.unlocked)
    }

    /// Fold one result into the bests. Nothing ever regresses.
    /// Returns false for an unknown dungeon.
    pub fn update_dungeon_progress(
        &mut self,
        dungeon: u32,
        stages: u32,
        score: u64,
        duration_secs: f64,
    ) -> bool {
        let Some(entry) = self.dungeons.get_mut(&dungeon) else {
            log::warn!("Progress update for unknown dungeon {}", dungeon);
            return false;
        };
        entry.completed_stages = entry.completed_stages.max(stages);
        entry.stars = entry.stars.max(stages);
        entry.best_score = entry.best_score.max(score);
        entry.best_time = entry.best_time.max(duration_secs);

        if stages >= STAGES_TO_UNLOCK {
            if let Some(next) = self.dungeons.get_mut(&(dungeon + 1)) {
                if !next.unlocked {
                    next.unlocked = true;
                    log::info!("Dungeon {} unlocked", dungeon + 1);
                }
            }
        }

        self.highest_stage = self.highest_stage.max(stages);
        self.highest_dungeon = self.highest_dungeon.max(dungeon);
        true
    }

    /// Record a finished run: bests plus global totals
    pub fn record_run(&mut self, run: &RunSummary) {
        self.update_dungeon_progress(
            run.dungeon,
            run.stages_completed,
            run.score,
            run.duration_secs,
        );
        self.total_kills += run.kills as u64;
        self.total_tokens += run.tokens as u64;
    }
}

/// Somewhere progress lives between runs
pub trait ProgressStore {
    fn load(&mut self) -> Result<GameProgress, PersistenceError>;
    fn save(&mut self, progress: &GameProgress) -> Result<(), PersistenceError>;
}

/// Progress in a JSON file. A missing file reads as fresh progress.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ProgressStore for JsonFileStore {
    fn load(&mut self) -> Result<GameProgress, PersistenceError> {
        let json = match std::fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No progress at {}, starting fresh", self.path.display());
                return Ok(GameProgress::default());
            }
            Err(e) => return Err(e.into()),
        };
        let mut progress: GameProgress = serde_json::from_str(&json)?;
        progress.fill_missing();
        log::debug!("Loaded progress from {}", self.path.display());
        Ok(progress)
    }

    fn save(&mut self, progress: &GameProgress) -> Result<(), PersistenceError> {
        let json = serde_json::to_string_pretty(progress)?;
        // Write beside the target, then swap in
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        log::debug!("Saved progress to {}", self.path.display());
        Ok(())
    }
}

/// Progress held in memory only
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    pub progress: Option<GameProgress>,
}

impl ProgressStore for MemoryStore {
    fn load(&mut self) -> Result<GameProgress, PersistenceError> {
        Ok(self.progress.clone().unwrap_or_default())
    }

    fn save(&mut self, progress: &GameProgress) -> Result<(), PersistenceError> {
        self.progress = Some(progress.clone());
        Ok(())
    }
}
