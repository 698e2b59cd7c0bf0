//! Inventory actions: opening chests, drinking potions and equipping gear.
//!
//! Like movement, a refused action is a soft rejection (`success == false`) that leaves
//! every record untouched.

use log::debug;
use serde::{Deserialize, Serialize};

use super::catalog::Catalog;
use super::combat::{apply_item_effects, revert_item_effects};
use super::types::{ActiveEffect, Dungeon, GameState, InventoryItem, ItemCategory, Stats};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActionOutcome {
    pub success: bool,
    pub message: String,
    pub gained: Vec<InventoryItem>,
    pub stats: Stats,
}

impl ActionOutcome {
    fn rejected(state: &GameState, reason: impl Into<String>) -> Self {
        Self {
            success: false,
            message: reason.into(),
            gained: Vec::new(),
            stats: state.stats,
        }
    }

    fn done(state: &GameState, message: impl Into<String>, gained: Vec<InventoryItem>) -> Self {
        Self {
            success: true,
            message: message.into(),
            gained,
            stats: state.stats,
        }
    }
}

fn find_in_inventory(state: &GameState, name: &str) -> Option<usize> {
    let name = name.trim();
    state
        .inventory
        .iter()
        .position(|i| i.name.eq_ignore_ascii_case(name))
}

/// Open the chest under the player. A locked chest consumes one matching key and
/// stays unlocked for every session; the loot is per session.
pub fn open_chest(state: &mut GameState, dungeon: &mut Dungeon) -> ActionOutcome {
    let pos = state.position;
    let Some(chest) = dungeon.chest_at_mut(pos) else {
        return ActionOutcome::rejected(state, "there is no chest here");
    };
    if state.opened_chests.contains(&chest.id) {
        return ActionOutcome::rejected(state, "you already emptied this chest");
    }

    let mut parts = Vec::new();
    if chest.locked {
        if state.take_key(chest.key_type).is_none() {
            return ActionOutcome::rejected(state, format!("locked, need {} key", chest.key_type));
        }
        chest.locked = false;
        parts.push(format!("You unlock the chest with your {} key.", chest.key_type));
    }

    let gained: Vec<InventoryItem> = chest
        .contents
        .iter()
        .enumerate()
        .map(|(n, c)| InventoryItem::item(format!("{}_item_{}", chest.id, n), c.name.clone(), c.category))
        .collect();
    if gained.is_empty() {
        parts.push("The chest is empty.".to_string());
    }
    for item in &gained {
        parts.push(format!("You take the {}.", item.name));
    }
    state.inventory.extend(gained.iter().cloned());
    state.opened_chests.insert(chest.id.clone());
    debug!("chest {} opened by {}", chest.id, state.id);

    ActionOutcome::done(state, crate::logutil::join_messages(&parts), gained)
}

/// Drink a potion from the inventory. Instant healing is capped at max hp; potions
/// with a duration become timed effects.
pub fn use_item(state: &mut GameState, catalog: &Catalog, name: &str) -> ActionOutcome {
    let Some(idx) = find_in_inventory(state, name) else {
        return ActionOutcome::rejected(state, format!("you have no {}", name.trim()));
    };
    let item = &state.inventory[idx];
    if item.category != ItemCategory::Potion {
        return ActionOutcome::rejected(state, format!("the {} cannot be used", item.name));
    }
    let Some(def) = catalog.item(ItemCategory::Potion, &item.name) else {
        return ActionOutcome::rejected(state, format!("nothing happens with the {}", item.name));
    };

    let item = state.inventory.remove(idx);
    let message = match def.duration {
        Some(moves) => {
            if let Some(active) = state
                .active_effects
                .iter_mut()
                .find(|e| e.item_name == def.name)
            {
                active.remaining_moves = moves;
            } else {
                apply_item_effects(&mut state.stats, &def.modifiers);
                state.active_effects.push(ActiveEffect {
                    item_name: def.name.clone(),
                    remaining_moves: moves,
                });
            }
            format!("You drink the {}. It lasts {} moves.", item.name, moves)
        }
        None => {
            apply_item_effects(&mut state.stats, &def.modifiers);
            state.stats.hp = state.stats.hp.min(state.stats.max_hp);
            format!(
                "You drink the {}. HP {}/{}.",
                item.name, state.stats.hp, state.stats.max_hp
            )
        }
    };
    ActionOutcome::done(state, message, Vec::new())
}

/// Move a weapon or armor from the inventory into its slot, swapping out the old one.
pub fn equip(state: &mut GameState, catalog: &Catalog, name: &str) -> ActionOutcome {
    let Some(idx) = find_in_inventory(state, name) else {
        return ActionOutcome::rejected(state, format!("you have no {}", name.trim()));
    };
    let category = state.inventory[idx].category;
    if !matches!(category, ItemCategory::Weapon | ItemCategory::Armor) {
        return ActionOutcome::rejected(
            state,
            format!("the {} cannot be equipped", state.inventory[idx].name),
        );
    }
    let Some(def) = catalog.item(category, &state.inventory[idx].name) else {
        return ActionOutcome::rejected(state, format!("unknown item {}", state.inventory[idx].name));
    };

    let item = state.inventory.remove(idx);
    let slot = match category {
        ItemCategory::Weapon => &mut state.equipped_weapon,
        _ => &mut state.equipped_armor,
    };
    let previous = slot.replace(item.clone());

    let mut parts = Vec::new();
    if let Some(old) = previous {
        if let Some(old_def) = catalog.item(category, &old.name) {
            revert_item_effects(&mut state.stats, &old_def.modifiers);
        }
        parts.push(format!("You stow the {}.", old.name));
        state.inventory.push(old);
    }
    apply_item_effects(&mut state.stats, &def.modifiers);
    parts.push(format!("You equip the {}.", item.name));
    ActionOutcome::done(state, crate::logutil::join_messages(&parts), Vec::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dungeon::grid::Tile;
    use crate::dungeon::testutil::arena;
    use crate::dungeon::types::{Chest, ChestItem, KeyType};

    fn with_chest(locked: bool, contents: Vec<ChestItem>) -> crate::dungeon::testutil::Arena {
        let mut a = arena();
        let pos = a.state.position;
        a.dungeon.grid.set(pos, Tile::Chest);
        a.dungeon.chests.push(Chest {
            id: "chest_0".into(),
            position: pos,
            key_type: KeyType::Bronze,
            locked,
            contents,
        });
        a
    }

    fn sword() -> Vec<ChestItem> {
        vec![ChestItem {
            category: ItemCategory::Weapon,
            name: "Iron Sword".into(),
        }]
    }

    #[test]
    fn locked_chest_needs_key() {
        let mut a = with_chest(true, sword());
        let before = a.state.clone();
        let out = open_chest(&mut a.state, &mut a.dungeon);
        assert!(!out.success);
        assert!(out.message.contains("locked"));
        assert_eq!(a.state, before);
        assert!(a.dungeon.chests[0].locked);
    }

    #[test]
    fn key_opens_chest_and_loots_once() {
        let mut a = with_chest(true, sword());
        a.state.inventory.push(InventoryItem::key("key_0", KeyType::Bronze));
        let out = open_chest(&mut a.state, &mut a.dungeon);
        assert!(out.success);
        assert_eq!(out.gained.len(), 1);
        assert!(!a.dungeon.chests[0].locked);
        assert!(!a.state.has_key(KeyType::Bronze));
        assert!(a.state.inventory.iter().any(|i| i.name == "Iron Sword"));

        let again = open_chest(&mut a.state, &mut a.dungeon);
        assert!(!again.success);
        assert_eq!(a.state.inventory.len(), 1);
    }

    #[test]
    fn unlocked_chest_opens_without_key() {
        let mut a = with_chest(false, Vec::new());
        let out = open_chest(&mut a.state, &mut a.dungeon);
        assert!(out.success);
        assert!(out.message.contains("empty"));
    }

    #[test]
    fn no_chest_is_soft_rejection() {
        let mut a = arena();
        assert!(!open_chest(&mut a.state, &mut a.dungeon).success);
    }

    #[test]
    fn health_potion_caps_at_max_hp() {
        let mut a = arena();
        a.state.stats.hp = a.state.stats.max_hp - 10;
        a.state
            .inventory
            .push(InventoryItem::item("p", "Health Potion", ItemCategory::Potion));
        let out = use_item(&mut a.state, &a.catalog, "health potion");
        assert!(out.success);
        assert_eq!(a.state.stats.hp, a.state.stats.max_hp);
        assert!(a.state.inventory.is_empty());
    }

    #[test]
    fn timed_potion_registers_effect() {
        let mut a = arena();
        let atk = a.state.stats.attack;
        a.state
            .inventory
            .push(InventoryItem::item("p", "Strength Potion", ItemCategory::Potion));
        let out = use_item(&mut a.state, &a.catalog, "Strength Potion");
        assert!(out.success);
        assert_eq!(a.state.stats.attack, atk + 5);
        assert_eq!(a.state.active_effects.len(), 1);
        assert_eq!(a.state.active_effects[0].remaining_moves, 10);
    }

    #[test]
    fn using_missing_or_wrong_item_is_rejected() {
        let mut a = arena();
        assert!(!use_item(&mut a.state, &a.catalog, "Elixir").success);
        a.state
            .inventory
            .push(InventoryItem::item("w", "Iron Sword", ItemCategory::Weapon));
        assert!(!use_item(&mut a.state, &a.catalog, "Iron Sword").success);
        assert!(!equip(&mut a.state, &a.catalog, "Elixir").success);
    }

    #[test]
    fn equip_swaps_and_reverts_modifiers() {
        let mut a = arena();
        let base = a.state.stats;
        a.state
            .inventory
            .push(InventoryItem::item("w1", "Iron Sword", ItemCategory::Weapon));
        a.state
            .inventory
            .push(InventoryItem::item("w2", "Battle Axe", ItemCategory::Weapon));

        assert!(equip(&mut a.state, &a.catalog, "Iron Sword").success);
        assert_eq!(a.state.stats.attack, base.attack + 5);

        assert!(equip(&mut a.state, &a.catalog, "battle axe").success);
        assert_eq!(a.state.stats.attack, base.attack + 8);
        assert_eq!(a.state.stats.agility, base.agility - 2);
        assert_eq!(
            a.state.equipped_weapon.as_ref().map(|i| i.name.as_str()),
            Some("Battle Axe")
        );
        assert!(a.state.inventory.iter().any(|i| i.name == "Iron Sword"));
    }
}
