//! Movement and discovery: one cardinal step per call, with fog reveal and every
//! tile side effect resolved in the same move.

use log::debug;
use serde::{Deserialize, Serialize};

use super::catalog::Catalog;
use super::combat::revert_item_effects;
use super::grid::Tile;
use super::types::{Direction, Dungeon, GameState, InventoryItem, ItemCategory, Position};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrapHit {
    pub trap_id: String,
    pub damage: i32,
}

/// Result of a move. `success == false` is a soft rejection and the state is unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MoveOutcome {
    pub success: bool,
    pub position: Position,
    pub message: String,
    pub unlocked_door: Option<String>,
    pub picked_up: Vec<InventoryItem>,
    pub trap: Option<TrapHit>,
    /// Enemy id when the step started a fight.
    pub encounter: Option<String>,
    pub expired_effects: Vec<String>,
    pub player_defeated: bool,
}

impl MoveOutcome {
    fn rejected(state: &GameState, reason: impl Into<String>) -> Self {
        Self {
            success: false,
            position: state.position,
            message: reason.into(),
            unlocked_door: None,
            picked_up: Vec::new(),
            trap: None,
            encounter: None,
            expired_effects: Vec::new(),
            player_defeated: state.is_defeated(),
        }
    }
}

/// Count down timed effects by one move, reverting those that run out.
pub fn tick_effects(state: &mut GameState, catalog: &Catalog) -> Vec<String> {
    let mut expired = Vec::new();
    for effect in &mut state.active_effects {
        effect.remaining_moves = effect.remaining_moves.saturating_sub(1);
        if effect.remaining_moves == 0 {
            expired.push(effect.item_name.clone());
        }
    }
    state.active_effects.retain(|e| e.remaining_moves > 0);
    for name in &expired {
        if let Some(def) = catalog.item(ItemCategory::Potion, name) {
            revert_item_effects(&mut state.stats, &def.modifiers);
        }
    }
    expired
}

/// Attempt one step. Door unlocks mutate `dungeon`; everything else lands on `state`.
pub fn move_player(
    state: &mut GameState,
    dungeon: &mut Dungeon,
    catalog: &Catalog,
    direction: Direction,
) -> MoveOutcome {
    if state.in_combat() {
        return MoveOutcome::rejected(state, "in combat");
    }

    let target = dungeon.grid.step(state.position, direction);
    let mut messages = Vec::new();
    let mut unlocked_door = None;

    match dungeon.grid.get(target) {
        None | Some(Tile::Wall) => return MoveOutcome::rejected(state, "blocked"),
        Some(Tile::Door) => {
            if let Some(door) = dungeon.door_at_mut(target).filter(|d| d.locked) {
                if state.take_key(door.key_type).is_none() {
                    return MoveOutcome::rejected(
                        state,
                        format!("locked, need {} key", door.key_type),
                    );
                }
                door.locked = false;
                messages.push(format!("You unlock the door with your {} key.", door.key_type));
                unlocked_door = Some(door.id.clone());
            }
        }
        Some(Tile::Floor) | Some(Tile::Chest) => {}
    }

    state.position = target;
    state.moves += 1;
    state.reveal_around(target);
    let expired_effects = tick_effects(state, catalog);
    for name in &expired_effects {
        messages.push(format!("The {} wears off.", name));
    }

    let mut picked_up = Vec::new();
    for key in dungeon.keys_at(target) {
        if state.collected_keys.insert(key.id.clone()) {
            let item = InventoryItem::key(key.id.clone(), key.key_type);
            messages.push(format!("You pick up a {}.", item.name));
            state.inventory.push(item.clone());
            picked_up.push(item);
        }
    }
    for treasure in dungeon.treasures_at(target) {
        if state.collected_treasures.insert(treasure.id.clone()) {
            let item = InventoryItem::item(
                treasure.id.clone(),
                treasure.item_name.clone(),
                treasure.kind.item_category(),
            );
            messages.push(format!("You found {}!", item.name));
            state.inventory.push(item.clone());
            picked_up.push(item);
        }
    }
    if dungeon.grid.is(target, Tile::Chest) {
        messages.push("There is a chest here.".to_string());
    }

    let mut trap_hit = None;
    if let Some(trap) = dungeon.trap_at(target) {
        if state.sprung_traps.insert(trap.id.clone()) {
            state.stats.hp -= trap.damage;
            messages.push(format!(
                "A {} trap springs! You take {} damage.",
                trap.kind.as_str(),
                trap.damage
            ));
            trap_hit = Some(TrapHit {
                trap_id: trap.id.clone(),
                damage: trap.damage,
            });
        }
    }

    let mut encounter = None;
    if !state.is_defeated() {
        if let Some(enemy) = dungeon.living_enemy_at(target) {
            messages.push(format!(
                "A {} blocks your way! (hp {}/{})",
                enemy.species, enemy.hp, enemy.max_hp
            ));
            state.combat = Some(enemy.id.clone());
            encounter = Some(enemy.id.clone());
        }
    } else {
        messages.push("You have fallen.".to_string());
    }

    debug!(
        "move {} {:?} -> {} encounter={:?}",
        state.id, direction, target, encounter
    );
    MoveOutcome {
        success: true,
        position: target,
        message: crate::logutil::join_messages(&messages),
        unlocked_door,
        picked_up,
        trap: trap_hit,
        encounter,
        expired_effects,
        player_defeated: state.is_defeated(),
    }
}
