//! Perk catalog and draft selector
//!
//! Perks are static definitions. A draft rolls a rarity per slot, then picks a
//! perk of that rarity that hasn't been offered yet in the same draft. When the
//! rolled rarity is exhausted the slot falls back to the common pool.

use std::collections::HashSet;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::sim::player::PlayerStats;
use crate::tuning::ConfigError;

/// Perk ids the combat code branches on
pub mod ids {
    pub const MULTISHOT: &str = "multishot";
    pub const PIERCING: &str = "piercing";
    pub const LIFESTEAL: &str = "lifesteal";
    pub const BLOODTHIRST: &str = "bloodthirst";
    pub const TOKEN_MULTIPLIER: &str = "token_multiplier";
    pub const GUARDIAN_ANGEL: &str = "guardian_angel";
    pub const REGEN: &str = "regen";
    pub const DODGE_CHANCE: &str = "dodge_chance";
    pub const XP_BOOST: &str = "xp_boost";
    pub const BERSERKER: &str = "berserker";
    pub const RESURRECTION: &str = "resurrection";
    pub const OMNI_SHOT: &str = "omni_shot";
    pub const INFINITE_PIERCE: &str = "infinite_pierce";
    pub const TOKEN_RAIN: &str = "token_rain";
}

/// Perk rarity tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    Common,
    Rare,
    Epic,
    Legendary,
}

impl Rarity {
    /// Draft roll weights, rarest first (cumulative thresholds are built from these)
    pub const WEIGHTS: [(Rarity, f32); 4] = [
        (Rarity::Legendary, 0.02),
        (Rarity::Epic, 0.08),
        (Rarity::Rare, 0.25),
        (Rarity::Common, 0.65),
    ];

    /// Map a uniform roll in [0, 1) to a rarity
    pub fn from_roll(roll: f32) -> Rarity {
        let mut threshold = 0.0;
        for (rarity, weight) in Self::WEIGHTS {
            threshold += weight;
            if roll < threshold {
                return rarity;
            }
        }
        Rarity::Common
    }
}

/// What a perk touches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PerkKind {
    StatBoost,
    BehaviorMod,
    WeaponAugment,
}

/// An immutable catalog entry
#[derive(Debug, Clone, Copy)]
pub struct Perk {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub rarity: Rarity,
    pub kind: PerkKind,
    pub tags: &'static [&'static str],
    /// Stat transform applied once when the perk is picked
    pub apply: fn(PlayerStats) -> PlayerStats,
}

impl PartialEq for Perk {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

fn unchanged(stats: PlayerStats) -> PlayerStats {
    stats
}

use PerkKind::{BehaviorMod, StatBoost, WeaponAugment};
use Rarity::{Common, Epic, Legendary, Rare};

/// Every shipped perk
pub static PERK_POOL: &[Perk] = &[
    // Common
    Perk {
        id: "speed_boost",
        name: "Swift Steps",
        description: "Increase movement speed by 15%",
        rarity: Common,
        kind: StatBoost,
        tags: &["movement", "speed"],
        apply: |s| PlayerStats {
            base_move_speed: s.base_move_speed * 1.15,
            ..s
        },
    },
    Perk {
        id: "attack_speed",
        name: "Rapid Fire",
        description: "Increase attack speed by 20%",
        rarity: Common,
        kind: StatBoost,
        tags: &["attack", "speed"],
        apply: |s| PlayerStats {
            attack_speed: (s.attack_speed * 1.2).min(10.0),
            ..s
        },
    },
    Perk {
        id: "damage_boost",
        name: "Power Shot",
        description: "Increase damage by 25%",
        rarity: Common,
        kind: StatBoost,
        tags: &["damage"],
        apply: |s| PlayerStats {
            damage: s.damage * 1.25,
            ..s
        },
    },
    Perk {
        id: "health_boost",
        name: "Vitality",
        description: "Increase max health by 20",
        rarity: Common,
        kind: StatBoost,
        tags: &["health", "survival"],
        apply: |s| PlayerStats {
            max_health: s.max_health + 20.0,
            health: s.health + 20.0,
            ..s
        },
    },
    Perk {
        id: "pickup_radius",
        name: "Magnetism",
        description: "Increase pickup radius by 30%",
        rarity: Common,
        kind: StatBoost,
        tags: &["utility"],
        apply: |s| PlayerStats {
            pickup_radius: s.pickup_radius * 1.3,
            ..s
        },
    },
    Perk {
        id: "regen",
        name: "Regeneration",
        description: "Slowly regenerate 1 HP every 3 seconds",
        rarity: Common,
        kind: BehaviorMod,
        tags: &["health", "survival"],
        apply: unchanged,
    },
    Perk {
        id: "projectile_size",
        name: "Heavy Rounds",
        description: "Increase projectile size and impact",
        rarity: Common,
        kind: StatBoost,
        tags: &["projectile", "damage"],
        apply: |s| PlayerStats {
            damage: s.damage * 1.15,
            ..s
        },
    },
    Perk {
        id: "dodge_chance",
        name: "Agility",
        description: "10% chance to dodge enemy attacks",
        rarity: Common,
        kind: BehaviorMod,
        tags: &["survival", "defense"],
        apply: unchanged,
    },
    Perk {
        id: "xp_boost",
        name: "Wisdom",
        description: "Gain 25% more XP from kills",
        rarity: Common,
        kind: BehaviorMod,
        tags: &["progression", "xp"],
        apply: unchanged,
    },
    // Rare
    Perk {
        id: "multishot",
        name: "Triple Shot",
        description: "Fire 3 projectiles at once",
        rarity: Rare,
        kind: WeaponAugment,
        tags: &["projectile", "multishot"],
        apply: |s| PlayerStats {
            damage: s.damage * 0.7,
            ..s
        },
    },
    Perk {
        id: "piercing",
        name: "Piercing Rounds",
        description: "Projectiles pierce through enemies",
        rarity: Rare,
        kind: WeaponAugment,
        tags: &["projectile", "pierce"],
        apply: unchanged,
    },
    Perk {
        id: "crit_chance",
        name: "Critical Strike",
        description: "Increase critical hit chance by 15%",
        rarity: Rare,
        kind: StatBoost,
        tags: &["damage", "crit"],
        apply: |s| PlayerStats {
            crit_rate: (s.crit_rate + 0.15).min(0.75),
            ..s
        },
    },
    Perk {
        id: "lifesteal",
        name: "Vampiric Touch",
        description: "Restore 2 HP on kill",
        rarity: Rare,
        kind: BehaviorMod,
        tags: &["health", "survival"],
        apply: unchanged,
    },
    Perk {
        id: "bounce_shot",
        name: "Ricochet",
        description: "Projectiles bounce off walls once",
        rarity: Rare,
        kind: WeaponAugment,
        tags: &["projectile", "utility"],
        apply: unchanged,
    },
    Perk {
        id: "explosive_rounds",
        name: "Explosive Rounds",
        description: "Projectiles explode on impact",
        rarity: Rare,
        kind: WeaponAugment,
        tags: &["aoe", "damage"],
        apply: |s| PlayerStats {
            damage: s.damage * 0.8,
            ..s
        },
    },
    Perk {
        id: "berserker",
        name: "Berserker Rage",
        description: "Gain 50% damage when below 30% HP",
        rarity: Rare,
        kind: BehaviorMod,
        tags: &["damage", "risk"],
        apply: unchanged,
    },
    Perk {
        id: "shield_on_kill",
        name: "Battle Hardened",
        description: "Gain temporary shield on kill (5 HP, 3s)",
        rarity: Rare,
        kind: BehaviorMod,
        tags: &["shield", "survival"],
        apply: unchanged,
    },
    Perk {
        id: "homing_shots",
        name: "Tracking System",
        description: "Projectiles slightly home toward enemies",
        rarity: Rare,
        kind: WeaponAugment,
        tags: &["projectile", "accuracy"],
        apply: unchanged,
    },
    Perk {
        id: "cooldown_reduction",
        name: "Quick Reflexes",
        description: "Reduce attack cooldown by 25%",
        rarity: Rare,
        kind: StatBoost,
        tags: &["attack", "speed"],
        apply: |s| PlayerStats {
            attack_speed: s.attack_speed * 1.25,
            ..s
        },
    },
    // Epic
    Perk {
        id: "bloodthirst",
        name: "Bloodthirst",
        description: "Gain 10% damage for each kill (stacks)",
        rarity: Epic,
        kind: BehaviorMod,
        tags: &["damage", "scaling"],
        apply: unchanged,
    },
    Perk {
        id: "token_multiplier",
        name: "Fortune Seeker",
        description: "Double token drops",
        rarity: Epic,
        kind: BehaviorMod,
        tags: &["token", "reward"],
        apply: unchanged,
    },
    Perk {
        id: "guardian_angel",
        name: "Guardian Angel",
        description: "Survive a fatal hit once",
        rarity: Epic,
        kind: BehaviorMod,
        tags: &["survival"],
        apply: unchanged,
    },
    Perk {
        id: "chain_lightning",
        name: "Chain Reaction",
        description: "Kills cause chain explosions",
        rarity: Epic,
        kind: WeaponAugment,
        tags: &["aoe", "damage"],
        apply: unchanged,
    },
    Perk {
        id: "time_dilation",
        name: "Time Warp",
        description: "Slow time by 30% when below 20% HP",
        rarity: Epic,
        kind: BehaviorMod,
        tags: &["utility", "survival"],
        apply: unchanged,
    },
    Perk {
        id: "orbital_strike",
        name: "Orbital Strike",
        description: "Summon devastating strike every 30s",
        rarity: Epic,
        kind: WeaponAugment,
        tags: &["aoe", "special"],
        apply: unchanged,
    },
    Perk {
        id: "poison_aura",
        name: "Toxic Presence",
        description: "Enemies near you take damage over time",
        rarity: Epic,
        kind: BehaviorMod,
        tags: &["aoe", "damage"],
        apply: unchanged,
    },
    Perk {
        id: "resurrection",
        name: "Phoenix Rising",
        description: "Revive once with 50% HP (once per run)",
        rarity: Epic,
        kind: BehaviorMod,
        tags: &["survival", "revive"],
        apply: unchanged,
    },
    // Legendary
    Perk {
        id: "god_mode",
        name: "Divine Ascension",
        description: "Double all stats for 15 seconds after level up",
        rarity: Legendary,
        kind: BehaviorMod,
        tags: &["power", "ultimate"],
        apply: unchanged,
    },
    Perk {
        id: "omni_shot",
        name: "Omnidirectional Fury",
        description: "Fire in all 8 directions simultaneously",
        rarity: Legendary,
        kind: WeaponAugment,
        tags: &["projectile", "ultimate"],
        apply: |s| PlayerStats {
            damage: s.damage * 0.5,
            ..s
        },
    },
    Perk {
        id: "perfect_dodge",
        name: "Untouchable",
        description: "Become invincible while moving",
        rarity: Legendary,
        kind: BehaviorMod,
        tags: &["survival", "ultimate"],
        apply: unchanged,
    },
    Perk {
        id: "infinite_pierce",
        name: "Reality Slicer",
        description: "Projectiles pierce all enemies infinitely",
        rarity: Legendary,
        kind: WeaponAugment,
        tags: &["projectile", "ultimate"],
        apply: |s| PlayerStats {
            damage: s.damage * 1.5,
            ..s
        },
    },
    Perk {
        id: "token_rain",
        name: "Midas Touch",
        description: "Triple all token drops permanently",
        rarity: Legendary,
        kind: BehaviorMod,
        tags: &["token", "ultimate"],
        apply: unchanged,
    },
];

/// Validated set of perks a draft can offer
#[derive(Debug, Clone)]
pub struct PerkCatalog {
    perks: Vec<Perk>,
}

impl PerkCatalog {
    /// Build a catalog, rejecting duplicate ids and a missing common tier
    pub fn new(perks: Vec<Perk>) -> Result<Self, ConfigError> {
        let mut seen = HashSet::new();
        for p in &perks {
            if !seen.insert(p.id) {
                return Err(ConfigError::DuplicatePerk(p.id.to_string()));
            }
        }
        if !perks.iter().any(|p| p.rarity == Rarity::Common) {
            return Err(ConfigError::EmptyCommonPool);
        }
        Ok(Self { perks })
    }

    /// The shipped catalog (its validity is covered by tests)
    pub fn standard() -> Self {
        Self {
            perks: PERK_POOL.to_vec(),
        }
    }

    pub fn len(&self) -> usize {
        self.perks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.perks.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Perk> {
        self.perks.iter().find(|p| p.id == id)
    }

    /// Draw up to `count` distinct perks, weighted by rarity
    pub fn random_perks<R: Rng>(&self, count: usize, rng: &mut R) -> Vec<Perk> {
        let mut available: Vec<&Perk> = self.perks.iter().collect();
        let mut selected = Vec::with_capacity(count);

        for _ in 0..count {
            if available.is_empty() {
                break;
            }
            let rarity = Rarity::from_roll(rng.random::<f32>());

            let pick = Self::pick_of_rarity(&available, rarity, rng)
                .or_else(|| Self::pick_of_rarity(&available, Rarity::Common, rng));

            // Both the rolled tier and common are empty: the slot stays unfilled
            if let Some(index) = pick {
                selected.push(*available.remove(index));
            }
        }

        selected
    }

    /// Index into `available` of a random perk with the given rarity
    fn pick_of_rarity<R: Rng>(available: &[&Perk], rarity: Rarity, rng: &mut R) -> Option<usize> {
        let candidates: Vec<usize> = available
            .iter()
            .enumerate()
            .filter(|(_, p)| p.rarity == rarity)
            .map(|(i, _)| i)
            .collect();
        if candidates.is_empty() {
            return None;
        }
        Some(candidates[rng.random_range(0..candidates.len())])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_standard_catalog_is_valid() {
        let catalog = PerkCatalog::new(PERK_POOL.to_vec()).unwrap();
        assert_eq!(catalog.len(), PERK_POOL.len());
        assert!(catalog.get(ids::MULTISHOT).is_some());
        assert!(catalog.get(ids::GUARDIAN_ANGEL).is_some());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let p = PERK_POOL[0];
        let err = PerkCatalog::new(vec![p, p]).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicatePerk(id) if id == p.id));
    }

    #[test]
    fn test_missing_common_rejected() {
        let rares: Vec<Perk> = PERK_POOL
            .iter()
            .copied()
            .filter(|p| p.rarity == Rarity::Rare)
            .collect();
        assert!(matches!(
            PerkCatalog::new(rares),
            Err(ConfigError::EmptyCommonPool)
        ));
    }

    #[test]
    fn test_rarity_from_roll() {
        assert_eq!(Rarity::from_roll(0.0), Rarity::Legendary);
        assert_eq!(Rarity::from_roll(0.05), Rarity::Epic);
        assert_eq!(Rarity::from_roll(0.2), Rarity::Rare);
        assert_eq!(Rarity::from_roll(0.5), Rarity::Common);
        assert_eq!(Rarity::from_roll(0.9999), Rarity::Common);
    }

    #[test]
    fn test_random_perks_distinct() {
        let catalog = PerkCatalog::standard();
        let mut rng = Pcg32::seed_from_u64(7);
        for _ in 0..500 {
            let draft = catalog.random_perks(3, &mut rng);
            assert_eq!(draft.len(), 3);
            let ids: HashSet<_> = draft.iter().map(|p| p.id).collect();
            assert_eq!(ids.len(), 3);
        }
    }

    #[test]
    fn test_exhausted_rarity_falls_back_to_common() {
        // One legendary and two commons: any roll that misses must land on common
        let pool: Vec<Perk> = PERK_POOL
            .iter()
            .copied()
            .filter(|p| {
                p.id == ids::OMNI_SHOT || p.id == "speed_boost" || p.id == "damage_boost"
            })
            .collect();
        let catalog = PerkCatalog::new(pool).unwrap();
        let mut rng = Pcg32::seed_from_u64(42);
        for _ in 0..200 {
            let draft = catalog.random_perks(3, &mut rng);
            for p in &draft {
                assert!(matches!(p.rarity, Rarity::Common | Rarity::Legendary));
            }
        }
    }

    #[test]
    fn test_random_perks_stops_when_catalog_exhausted() {
        let commons: Vec<Perk> = PERK_POOL
            .iter()
            .copied()
            .filter(|p| p.rarity == Rarity::Common)
            .take(2)
            .collect();
        let catalog = PerkCatalog::new(commons).unwrap();
        let mut rng = Pcg32::seed_from_u64(1);
        assert_eq!(catalog.random_perks(3, &mut rng).len(), 2);
    }

    #[test]
    fn test_stat_transforms() {
        let base = PlayerStats::default();
        let crit = catalog_apply("crit_chance", base);
        assert!((crit.crit_rate - 0.2).abs() < 1e-6);

        let mut capped = base;
        for _ in 0..10 {
            capped = catalog_apply("crit_chance", capped);
        }
        assert_eq!(capped.crit_rate, 0.75);

        let vit = catalog_apply("health_boost", base);
        assert_eq!(vit.max_health, 120.0);
        assert_eq!(vit.health, 120.0);
    }

    fn catalog_apply(id: &str, stats: PlayerStats) -> PlayerStats {
        let perk = PERK_POOL.iter().find(|p| p.id == id).unwrap();
        (perk.apply)(stats)
    }
}
