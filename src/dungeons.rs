//! Dungeon themes
//!
//! Six dungeons of five stages each. Later dungeons field tougher enemies and
//! pay out more XP and tokens.

/// Number of dungeons
pub const DUNGEON_COUNT: u32 = 6;

/// Static description of one dungeon
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DungeonTheme {
    pub id: u32,
    pub name: &'static str,
    pub description: &'static str,
    pub stages: u32,
    /// Scales spawned enemy health and damage
    pub enemy_modifier: f32,
    /// Scales collected tokens
    pub token_multiplier: f32,
    /// Scales collected XP
    pub xp_multiplier: f32,
}

const fn theme(
    id: u32,
    name: &'static str,
    description: &'static str,
    enemy_modifier: f32,
    token_multiplier: f32,
    xp_multiplier: f32,
) -> DungeonTheme {
    DungeonTheme {
        id,
        name,
        description,
        stages: 5,
        enemy_modifier,
        token_multiplier,
        xp_multiplier,
    }
}

pub static DUNGEON_THEMES: [DungeonTheme; DUNGEON_COUNT as usize] = [
    theme(1, "Void Nexus", "The dark abyss where reality fractures", 1.0, 1.0, 1.0),
    theme(2, "Crimson Wasteland", "A desolate realm of blood and fire", 1.2, 1.3, 1.2),
    theme(3, "Frozen Citadel", "An icy fortress of eternal winter", 1.5, 1.6, 1.4),
    theme(4, "Toxic Swamp", "A poisonous marsh of decay", 1.8, 2.0, 1.6),
    theme(5, "Lightning Temple", "Ancient ruins crackling with energy", 2.2, 2.5, 1.8),
    theme(6, "Shadow Realm", "Where darkness itself comes alive", 2.6, 3.0, 2.0),
];

/// Theme for `id`, falling back to the first dungeon for unknown ids
pub fn dungeon_theme(id: u32) -> &'static DungeonTheme {
    id.checked_sub(1)
        .and_then(|i| DUNGEON_THEMES.get(i as usize))
        .unwrap_or(&DUNGEON_THEMES[0])
}
