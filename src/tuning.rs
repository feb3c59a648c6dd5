//! Data-driven game balance
//!
//! Every number the simulation consumes lives here. `Tuning::default()` is the
//! shipped balance; `Tuning::from_json` lets the runner load an override file.
//! A table that fails validation is fatal: the simulation never starts.

use serde::{Deserialize, Serialize};

use crate::sim::player::PlayerStats;

/// Configuration errors (malformed tables)
#[derive(Debug)]
pub enum ConfigError {
    /// Table could not be parsed
    Parse(String),
    /// A value is out of its allowed range
    Invalid { field: String, reason: String },
    /// Two perks share the same id
    DuplicatePerk(String),
    /// Draft fallback needs at least one common perk
    EmptyCommonPool,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(e) => write!(f, "Failed to parse tuning: {}", e),
            Self::Invalid { field, reason } => {
                write!(f, "Invalid tuning value {}: {}", field, reason)
            }
            Self::DuplicatePerk(id) => write!(f, "Duplicate perk id: {}", id),
            Self::EmptyCommonPool => write!(f, "Perk catalog has no common perks"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(e.to_string())
    }
}

/// Enemy archetypes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnemyKind {
    Bat,
    Goblin,
    Orc,
    Dragon,
}

impl EnemyKind {
    /// Regular spawn pool (the dragon only enters through the boss slot)
    pub const REGULAR: [EnemyKind; 3] = [EnemyKind::Bat, EnemyKind::Goblin, EnemyKind::Orc];

    pub fn as_str(&self) -> &'static str {
        match self {
            EnemyKind::Bat => "bat",
            EnemyKind::Goblin => "goblin",
            EnemyKind::Orc => "orc",
            EnemyKind::Dragon => "dragon",
        }
    }

    pub fn is_boss(&self) -> bool {
        matches!(self, EnemyKind::Dragon)
    }
}

/// Movement/attack pattern an archetype runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiPattern {
    /// Wavering approach
    Zigzag,
    /// Approach and fire aimed shots
    Shoot,
    /// Straight charge, faces its heading
    Charge,
    /// Orbit the arena and breathe fire in a ring
    Boss,
}

/// Static stats for one enemy archetype
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnemyConfig {
    pub health: f32,
    pub damage: f32,
    /// Pixels per second
    pub speed: f32,
    /// Spawn budget cost
    pub cost: f32,
    /// Body radius used for melee contact
    pub size: f32,
    pub ai_pattern: AiPattern,
}

/// The full enemy table
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyTable {
    pub bat: EnemyConfig,
    pub goblin: EnemyConfig,
    pub orc: EnemyConfig,
    pub dragon: EnemyConfig,
}

impl EnemyTable {
    pub fn get(&self, kind: EnemyKind) -> &EnemyConfig {
        match kind {
            EnemyKind::Bat => &self.bat,
            EnemyKind::Goblin => &self.goblin,
            EnemyKind::Orc => &self.orc,
            EnemyKind::Dragon => &self.dragon,
        }
    }
}

impl Default for EnemyTable {
    fn default() -> Self {
        Self {
            bat: EnemyConfig {
                health: 20.0,
                damage: 8.0,
                speed: 80.0,
                cost: 1.0,
                size: 18.0,
                ai_pattern: AiPattern::Zigzag,
            },
            goblin: EnemyConfig {
                health: 35.0,
                damage: 12.0,
                speed: 56.0,
                cost: 2.0,
                size: 22.0,
                ai_pattern: AiPattern::Shoot,
            },
            orc: EnemyConfig {
                health: 80.0,
                damage: 20.0,
                speed: 35.0,
                cost: 3.0,
                size: 28.0,
                ai_pattern: AiPattern::Charge,
            },
            dragon: EnemyConfig {
                health: 300.0,
                damage: 30.0,
                speed: 18.0,
                cost: 10.0,
                size: 45.0,
                ai_pattern: AiPattern::Boss,
            },
        }
    }
}

/// Timing windows (milliseconds)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Timings {
    pub invulnerability_ms: f32,
    /// Invulnerability granted by a fatal-hit save
    pub guardian_invulnerability_ms: f32,
    pub spawn_interval_ms: f32,
    pub goblin_cooldown_ms: f32,
    pub dragon_cooldown_ms: f32,
    /// Regen perk heals 1 HP per interval
    pub regen_interval_ms: f32,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            invulnerability_ms: 1000.0,
            guardian_invulnerability_ms: 3000.0,
            spawn_interval_ms: 2000.0,
            goblin_cooldown_ms: 2000.0,
            dragon_cooldown_ms: 3000.0,
            regen_interval_ms: 3000.0,
        }
    }
}

/// XP curve, drops and stage gating
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressionTuning {
    pub base_xp_required: u32,
    pub xp_growth_rate: f32,
    pub token_drop_rate: f32,
    pub kills_per_stage: u32,
    pub stages_per_dungeon: u32,
    pub score_per_kill: u64,
    pub xp_drop: u32,
    pub boss_xp_drop: u32,
    pub token_drop: u32,
    pub boss_token_drop: u32,
}

impl Default for ProgressionTuning {
    fn default() -> Self {
        Self {
            base_xp_required: 100,
            xp_growth_rate: 1.2,
            token_drop_rate: 0.15,
            kills_per_stage: 10,
            stages_per_dungeon: 5,
            score_per_kill: 100,
            xp_drop: 10,
            boss_xp_drop: 100,
            token_drop: 1,
            boss_token_drop: 10,
        }
    }
}

/// Difficulty budget accrual
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnTuning {
    /// Budget units gained per second of unpaused time
    pub budget_per_second: f32,
}

impl Default for SpawnTuning {
    fn default() -> Self {
        Self {
            budget_per_second: 1.0,
        }
    }
}

/// Player control constants
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlTuning {
    /// Movement magnitude below this counts as standing still
    pub joystick_deadzone: f32,
    pub player_hitbox_ratio: f32,
    pub projectile_speed: f32,
}

impl Default for ControlTuning {
    fn default() -> Self {
        Self {
            joystick_deadzone: 0.1,
            player_hitbox_ratio: 0.6,
            projectile_speed: 600.0,
        }
    }
}

/// Complete balance table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub player: PlayerStats,
    pub enemies: EnemyTable,
    pub timings: Timings,
    pub progression: ProgressionTuning,
    pub spawn: SpawnTuning,
    pub controls: ControlTuning,
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

fn require_positive(field: &str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, "must be a positive number"))
    }
}

impl Tuning {
    /// Parse and validate a JSON table. Missing sections keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Load a table from disk
    pub fn load(path: &std::path::Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Parse(format!("{}: {}", path.display(), e)))?;
        let tuning = Self::from_json(&json)?;
        log::info!("Loaded tuning from {}", path.display());
        Ok(tuning)
    }

    /// Reject tables the simulation cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.player;
        require_positive("player.max_health", p.max_health)?;
        if !(p.health > 0.0 && p.health <= p.max_health) {
            return Err(invalid("player.health", "must be in (0, max_health]"));
        }
        require_positive("player.base_move_speed", p.base_move_speed)?;
        require_positive("player.attack_speed", p.attack_speed)?;
        require_positive("player.damage", p.damage)?;
        require_positive("player.pickup_radius", p.pickup_radius)?;
        if !(0.0..=1.0).contains(&p.crit_rate) {
            return Err(invalid("player.crit_rate", "must be in [0, 1]"));
        }

        for kind in [EnemyKind::Bat, EnemyKind::Goblin, EnemyKind::Orc, EnemyKind::Dragon] {
            let e = self.enemies.get(kind);
            let name = kind.as_str();
            require_positive(&format!("enemies.{}.health", name), e.health)?;
            require_positive(&format!("enemies.{}.speed", name), e.speed)?;
            require_positive(&format!("enemies.{}.cost", name), e.cost)?;
            require_positive(&format!("enemies.{}.size", name), e.size)?;
            if !(e.damage.is_finite() && e.damage >= 0.0) {
                return Err(invalid(&format!("enemies.{}.damage", name), "must be >= 0"));
            }
        }

        let t = &self.timings;
        require_positive("timings.invulnerability_ms", t.invulnerability_ms)?;
        require_positive("timings.guardian_invulnerability_ms", t.guardian_invulnerability_ms)?;
        require_positive("timings.spawn_interval_ms", t.spawn_interval_ms)?;
        require_positive("timings.goblin_cooldown_ms", t.goblin_cooldown_ms)?;
        require_positive("timings.dragon_cooldown_ms", t.dragon_cooldown_ms)?;
        require_positive("timings.regen_interval_ms", t.regen_interval_ms)?;

        let g = &self.progression;
        if g.base_xp_required == 0 {
            return Err(invalid("progression.base_xp_required", "must be > 0"));
        }
        if !(g.xp_growth_rate.is_finite() && g.xp_growth_rate >= 1.0) {
            return Err(invalid("progression.xp_growth_rate", "must be >= 1"));
        }
        if !(0.0..=1.0).contains(&g.token_drop_rate) {
            return Err(invalid("progression.token_drop_rate", "must be in [0, 1]"));
        }
        if g.kills_per_stage == 0 {
            return Err(invalid("progression.kills_per_stage", "must be > 0"));
        }
        if g.stages_per_dungeon == 0 {
            return Err(invalid("progression.stages_per_dungeon", "must be > 0"));
        }

        require_positive("spawn.budget_per_second", self.spawn.budget_per_second)?;

        let c = &self.controls;
        if !(0.0..1.0).contains(&c.joystick_deadzone) {
            return Err(invalid("controls.joystick_deadzone", "must be in [0, 1)"));
        }
        require_positive("controls.player_hitbox_ratio", c.player_hitbox_ratio)?;
        require_positive("controls.projectile_speed", c.projectile_speed)?;

        Ok(())
    }

    /// XP needed to go from `level` to the next one
    pub fn xp_required_for(&self, level: u32) -> u32 {
        let g = &self.progression;
        (g.base_xp_required as f64 * (g.xp_growth_rate as f64).powi(level as i32)).floor() as u32
    }
}
