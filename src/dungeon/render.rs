//! Text map of what a session has discovered.

use std::collections::BTreeMap;

use super::grid::Tile;
use super::types::{Dungeon, GameState, Position};

pub const FOG: char = '#';
pub const PLAYER: char = '@';
pub const LOCKED_DOOR: char = 'D';
pub const CHEST: char = 'C';
pub const ENEMY: char = 'E';
pub const KEY: char = 'k';
pub const TREASURE: char = '$';
pub const SPRUNG_TRAP: char = '^';

/// One line per grid row. Undiscovered cells render as fog; hidden traps stay hidden
/// until this session has sprung them.
pub fn render_map(dungeon: &Dungeon, state: &GameState) -> String {
    let mut overlay: BTreeMap<Position, char> = BTreeMap::new();
    for trap in &dungeon.traps {
        if state.sprung_traps.contains(&trap.id) {
            overlay.insert(trap.position, SPRUNG_TRAP);
        }
    }
    for t in &dungeon.treasures {
        if !state.collected_treasures.contains(&t.id) {
            overlay.insert(t.position, TREASURE);
        }
    }
    for k in &dungeon.keys {
        if !state.collected_keys.contains(&k.id) {
            overlay.insert(k.position, KEY);
        }
    }
    for d in dungeon.doors.iter().filter(|d| d.locked) {
        overlay.insert(d.position, LOCKED_DOOR);
    }
    for c in &dungeon.chests {
        if !state.opened_chests.contains(&c.id) {
            overlay.insert(c.position, CHEST);
        }
    }
    for e in dungeon.enemies.iter().filter(|e| e.alive) {
        overlay.insert(e.position, ENEMY);
    }
    overlay.insert(state.position, PLAYER);

    let mut out = String::with_capacity((dungeon.width + 1) * dungeon.height);
    for (y, row) in dungeon.grid.rows().iter().enumerate() {
        for (x, tile) in row.iter().enumerate() {
            let pos = Position::new(x, y);
            let ch = if !state.is_discovered(pos) {
                FOG
            } else if let Some(c) = overlay.get(&pos) {
                *c
            } else if *tile == Tile::Chest {
                // Chest already looted by this session.
                Tile::Floor.glyph()
            } else {
                tile.glyph()
            };
            out.push(ch);
        }
        out.push('\n');
    }
    out
}

/// One-line status for the session.
pub fn status_line(state: &GameState) -> String {
    let combat = match &state.combat {
        Some(id) => format!(" | fighting {}", id),
        None => String::new(),
    };
    format!(
        "{} {} L{} | HP {}/{} ATK {} DEF {} | XP {} | moves {}{}",
        state.hero_gender.as_str(),
        state.hero_class.as_str(),
        state.level,
        state.stats.hp,
        state.stats.max_hp,
        state.stats.attack,
        state.stats.defense,
        state.experience,
        state.moves,
        combat
    )
}
