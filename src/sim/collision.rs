//! Overlap tests
//!
//! Everything in the arena is a point with a contact radius; there is no
//! physics beyond "are these two points closer than r".

use glam::Vec2;

use crate::consts::*;

/// Strict point/radius overlap
#[inline]
pub fn within(a: Vec2, b: Vec2, radius: f32) -> bool {
    a.distance_squared(b) < radius * radius
}

/// Melee contact distance between the player and an enemy body
#[inline]
pub fn melee_radius(hitbox_ratio: f32, enemy_size: f32) -> f32 {
    PLAYER_HITBOX_BASE * hitbox_ratio + enemy_size
}

/// Is `pos` inside the arena grown by `margin` on every side
#[inline]
pub fn in_arena(pos: Vec2, margin: f32) -> bool {
    pos.x >= -margin
        && pos.x <= ARENA_WIDTH + margin
        && pos.y >= -margin
        && pos.y <= ARENA_HEIGHT + margin
}

/// Index of the point closest to `from` (first one wins ties)
pub fn nearest<I>(from: Vec2, points: I) -> Option<usize>
where
    I: IntoIterator<Item = Vec2>,
{
    let mut best: Option<(usize, f32)> = None;
    for (i, p) in points.into_iter().enumerate() {
        let d = from.distance_squared(p);
        match best {
            Some((_, best_d)) if d >= best_d => {}
            _ => best = Some((i, d)),
        }
    }
    best.map(|(i, _)| i)
}
