//! Combines the layout and resource placement into one dungeon record.

use chrono::Utc;
use log::info;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use super::catalog::{Catalog, THEMES};
use super::errors::DungeonError;
use super::layout;
use super::placer;
use super::types::{Dungeon, DUNGEON_SCHEMA_VERSION};
use crate::logutil::escape_log;
use crate::validation::sanitize_theme;

/// Caller input for a new dungeon.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DungeonRequest {
    pub difficulty: String,
    pub theme: Option<String>,
}

impl DungeonRequest {
    pub fn new(difficulty: impl Into<String>) -> Self {
        Self {
            difficulty: difficulty.into(),
            theme: None,
        }
    }

    pub fn with_theme(mut self, theme: impl Into<String>) -> Self {
        self.theme = Some(theme.into());
        self
    }
}

/// Generate a complete dungeon. The same `seed` and request always yield the same
/// layout and placements; only the record id differs.
pub fn assemble(
    catalog: &Catalog,
    request: &DungeonRequest,
    seed: u64,
) -> Result<Dungeon, DungeonError> {
    let difficulty = request.difficulty.trim().to_ascii_lowercase();
    let profile = catalog.difficulty(&difficulty).ok_or_else(|| {
        DungeonError::invalid(format!(
            "unknown difficulty '{}' (expected one of: {})",
            escape_log(&request.difficulty),
            catalog.difficulty_names().join(", ")
        ))
    })?;

    let mut rng = StdRng::seed_from_u64(seed);
    let theme = match request.theme.as_deref() {
        Some(raw) => sanitize_theme(raw).map_err(|e| DungeonError::invalid(e.to_string()))?,
        None => THEMES.choose(&mut rng).unwrap_or(&"cave").to_string(),
    };

    let mut lay = layout::generate(profile.width, profile.height, profile, &mut rng);
    let spawn = lay
        .rooms
        .first()
        .map(|r| r.center())
        .ok_or_else(|| DungeonError::Generation("no room could be placed".into()))?;

    let res = placer::place_resources(
        &mut lay.grid,
        &lay.rooms,
        &lay.doors,
        spawn,
        profile,
        catalog,
        &mut rng,
    );

    let dungeon = Dungeon {
        id: uuid::Uuid::new_v4().to_string(),
        seed,
        width: lay.grid.width(),
        height: lay.grid.height(),
        grid: lay.grid,
        difficulty,
        theme,
        spawn,
        rooms: lay.rooms,
        doors: lay.doors,
        chests: res.chests,
        keys: res.keys,
        treasures: res.treasures,
        enemies: res.enemies,
        traps: res.traps,
        created_at: Utc::now(),
        schema_version: DUNGEON_SCHEMA_VERSION,
    };
    info!(
        "generated dungeon {} ({} / {}) seed={} rooms={} enemies={}",
        dungeon.id,
        dungeon.difficulty,
        escape_log(&dungeon.theme),
        seed,
        dungeon.rooms.len(),
        dungeon.enemies.len()
    );
    Ok(dungeon)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dungeon::grid::Tile;

    #[test]
    fn easy_dungeon_dimensions_and_room_bounds() {
        let catalog = Catalog::standard();
        let mut full = 0;
        for seed in 0..20u64 {
            let d = assemble(&catalog, &DungeonRequest::new("easy"), seed).expect("dungeon");
            assert_eq!((d.width, d.height), (30, 20));
            assert_eq!((d.grid.width(), d.grid.height()), (30, 20));
            assert!(d.rooms.len() <= 8);
            if d.rooms.len() >= 5 {
                full += 1;
            }
        }
        assert!(full >= 17);
    }

    #[test]
    fn spawn_is_first_room_center_on_floor() {
        let catalog = Catalog::standard();
        let d = assemble(&catalog, &DungeonRequest::new("medium"), 8).expect("dungeon");
        assert_eq!(d.spawn, d.rooms[0].center());
        assert_eq!(d.grid.get(d.spawn), Some(Tile::Floor));
        assert!(d.living_enemy_at(d.spawn).is_none());
    }

    #[test]
    fn unknown_difficulty_is_invalid_request() {
        let catalog = Catalog::standard();
        let err = assemble(&catalog, &DungeonRequest::new("nightmare"), 1).unwrap_err();
        assert!(matches!(err, DungeonError::InvalidRequest(_)));
    }

    #[test]
    fn theme_defaults_to_known_theme_and_honours_request() {
        let catalog = Catalog::standard();
        let d = assemble(&catalog, &DungeonRequest::new("easy"), 4).expect("dungeon");
        assert!(THEMES.contains(&d.theme.as_str()));
        let d = assemble(&catalog, &DungeonRequest::new("easy").with_theme("  Swamp "), 4)
            .expect("dungeon");
        assert_eq!(d.theme, "Swamp");
        assert!(assemble(&catalog, &DungeonRequest::new("easy").with_theme("   "), 4).is_err());
    }

    #[test]
    fn same_seed_reproduces_world() {
        let catalog = Catalog::standard();
        let a = assemble(&catalog, &DungeonRequest::new("hard"), 77).expect("a");
        let b = assemble(&catalog, &DungeonRequest::new("hard"), 77).expect("b");
        assert_ne!(a.id, b.id);
        assert_eq!(a.grid, b.grid);
        assert_eq!(a.enemies, b.enemies);
        assert_eq!(a.keys, b.keys);
        assert_eq!(a.theme, b.theme);
    }
}
