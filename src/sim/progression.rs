//! Progression state machine
//!
//! Kill credit drives stage advancement; XP drives levels. A level gained only
//! bumps `level` here. Opening the draft is a separate step the tick takes
//! afterwards, once per level, so several XP pickups in one tick can never
//! skip or double a draft.

use serde::{Deserialize, Serialize};

use super::events::GameEvent;
use super::state::{GamePhase, GameState};
use crate::consts::DRAFT_SIZE;
use crate::tuning::{EnemyKind, Tuning};

/// Errors from picking a perk
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectPerkError {
    /// No draft is open
    NotDrafting,
    /// Index outside the offered choices
    InvalidChoice(usize),
}

impl std::fmt::Display for SelectPerkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotDrafting => write!(f, "No draft is open"),
            Self::InvalidChoice(i) => write!(f, "Draft has no choice {}", i),
        }
    }
}

impl std::error::Error for SelectPerkError {}

/// Run progression counters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Progression {
    pub current_dungeon: u32,
    /// 1..=stages_per_dungeon
    pub current_stage: u32,
    /// Kills toward the next stage, always below kills_per_stage
    pub stage_kills: u32,
    pub xp: u32,
    pub xp_required: u32,
    pub level: u32,
    pub score: u64,
    pub kill_count: u32,
    /// Tokens collected this run, waiting to be claimed
    pub pending_tokens: u32,
    /// Highest level a draft has been opened for
    pub drafted_level: u32,
    /// Final stage boss defeated
    pub dungeon_cleared: bool,
}

/// What a kill changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KillOutcome {
    /// Stage that was just completed through kill count
    pub stage_completed: Option<u32>,
    /// Final stage boss went down
    pub dungeon_cleared: bool,
}

impl Progression {
    pub fn new(dungeon: u32, tuning: &Tuning) -> Self {
        Self {
            current_dungeon: dungeon,
            current_stage: 1,
            stage_kills: 0,
            xp: 0,
            xp_required: tuning.progression.base_xp_required,
            level: 1,
            score: 0,
            kill_count: 0,
            pending_tokens: 0,
            drafted_level: 1,
            dungeon_cleared: false,
        }
    }

    /// Credit one kill
    ///
    /// Stages below the last advance every `kills_per_stage` kills. The last
    /// stage ignores the kill counter and clears only when its boss dies.
    pub fn record_kill(&mut self, kind: EnemyKind, tuning: &Tuning) -> KillOutcome {
        let g = &tuning.progression;
        let final_stage = g.stages_per_dungeon;
        let mut outcome = KillOutcome::default();

        self.kill_count += 1;
        self.score += g.score_per_kill;

        if self.current_stage < final_stage {
            self.stage_kills += 1;
            if self.stage_kills >= g.kills_per_stage {
                outcome.stage_completed = Some(self.current_stage);
                self.current_stage += 1;
                self.stage_kills = 0;
            }
        } else {
            // Counter saturates on the boss stage
            self.stage_kills = (self.stage_kills + 1).min(g.kills_per_stage - 1);
            if kind.is_boss() && !self.dungeon_cleared {
                self.dungeon_cleared = true;
                outcome.stage_completed = Some(self.current_stage);
                outcome.dungeon_cleared = true;
            }
        }

        outcome
    }

    /// Add XP. Returns true when a level was gained.
    pub fn add_xp(&mut self, amount: u32, tuning: &Tuning) -> bool {
        let xp = self.xp + amount;
        if xp >= self.xp_required {
            self.level += 1;
            self.xp = 0;
            self.xp_required = tuning.xp_required_for(self.level);
            true
        } else {
            self.xp = xp;
            false
        }
    }

    pub fn add_tokens(&mut self, amount: u32) {
        self.pending_tokens += amount;
    }

    /// A level was gained that has not had its draft yet
    pub fn draft_pending(&self) -> bool {
        self.level > self.drafted_level
    }

    /// Stages fully completed this run
    pub fn stages_completed(&self) -> u32 {
        if self.dungeon_cleared {
            self.current_stage
        } else {
            self.current_stage - 1
        }
    }
}

/// Open a draft if a level is waiting for one
pub fn maybe_start_draft(state: &mut GameState) -> bool {
    if state.phase != GamePhase::Playing || !state.progression.draft_pending() {
        return false;
    }
    state.progression.drafted_level += 1;
    state.draft_choices = state.catalog.random_perks(DRAFT_SIZE, &mut state.rng);
    state.phase = GamePhase::Drafting;
    log::info!(
        "Draft opened for level {}: {:?}",
        state.progression.drafted_level,
        state.draft_choices.iter().map(|p| p.id).collect::<Vec<_>>()
    );
    state.emit(GameEvent::DraftStarted);
    true
}

/// Pick one of the offered perks and resume
pub fn select_perk(state: &mut GameState, index: usize) -> Result<&'static str, SelectPerkError> {
    if state.phase != GamePhase::Drafting {
        return Err(SelectPerkError::NotDrafting);
    }
    let perk = *state
        .draft_choices
        .get(index)
        .ok_or(SelectPerkError::InvalidChoice(index))?;

    let player = &mut state.player;
    player.stats = (perk.apply)(player.stats);
    player.stats.health = player.stats.health.clamp(0.0, player.stats.max_health);
    player.applied_perks.insert(perk.id);
    if perk.id == crate::perks::ids::GUARDIAN_ANGEL || perk.id == crate::perks::ids::RESURRECTION {
        player.guardian_charges = player.guardian_charges.saturating_add(1);
    }

    state.draft_choices.clear();
    state.phase = GamePhase::Playing;
    log::info!("Perk selected: {} ({})", perk.name, perk.id);
    state.emit(GameEvent::PerkSelected { id: perk.id });

    // Several levels in one tick queue one draft each
    maybe_start_draft(state);
    Ok(perk.id)
}

impl GameState {
    /// Pick draft choice `index`
    pub fn select_perk(&mut self, index: usize) -> Result<&'static str, SelectPerkError> {
        select_perk(self, index)
    }
}
