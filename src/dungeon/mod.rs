//! Dungeon generation and the rules engine that plays sessions against it.
//! Generation runs layout, then resource placement, then assembly; play runs
//! movement and combat against persisted (dungeon, game-state) pairs.

pub mod assembly;
pub mod catalog;
pub mod combat;
pub mod engine;
pub mod errors;
pub mod grid;
pub mod items;
pub mod layout;
pub mod movement;
pub mod placer;
pub mod render;
pub mod storage;
pub mod types;

#[cfg(test)]
pub(crate) mod testutil;

pub use assembly::{assemble, DungeonRequest};
pub use catalog::{Catalog, DifficultyProfile, EnemyTemplate, HeroTemplate, ItemDef, THEMES};
pub use combat::{
    apply_item_effects, compute_damage, revert_item_effects, CombatAction, CombatOutcome,
    HitReport, FLEE_CHANCE, XP_PER_KILL,
};
pub use engine::DungeonEngine;
pub use errors::DungeonError;
pub use grid::{Grid, Tile};
pub use items::ActionOutcome;
pub use movement::{MoveOutcome, TrapHit};
pub use render::{render_map, status_line};
pub use storage::{DungeonStore, DungeonStoreBuilder};
pub use types::*;
