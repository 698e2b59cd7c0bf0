//! Read-only reference data: hero templates, item catalogs, enemy species and
//! difficulty profiles. A [`Catalog`] is built once and handed to the engine; nothing
//! here is looked up from ambient scope.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::types::{DamageRoll, EnemySpecies, Gender, HeroClass, ItemCategory, Stats};

pub const THEMES: [&str; 6] = ["cave", "castle", "crypt", "forest", "ice", "fire"];

/// Name given to gold treasure pickups.
pub const GOLD_ITEM_NAME: &str = "Gold Coins";

/// Generation parameters for one named difficulty.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DifficultyProfile {
    pub min_rooms: usize,
    pub max_rooms: usize,
    pub min_room_size: usize,
    pub max_room_size: usize,
    pub enemy_density: f64,
    pub treasure_density: f64,
    pub door_chance: f64,
    pub width: usize,
    pub height: usize,
}

impl DifficultyProfile {
    pub fn easy() -> Self {
        Self {
            min_rooms: 5,
            max_rooms: 8,
            min_room_size: 4,
            max_room_size: 8,
            enemy_density: 0.02,
            treasure_density: 0.05,
            door_chance: 0.3,
            width: 30,
            height: 20,
        }
    }

    pub fn medium() -> Self {
        Self {
            min_rooms: 8,
            max_rooms: 12,
            min_room_size: 3,
            max_room_size: 7,
            enemy_density: 0.04,
            treasure_density: 0.03,
            door_chance: 0.5,
            width: 40,
            height: 30,
        }
    }

    pub fn hard() -> Self {
        Self {
            min_rooms: 10,
            max_rooms: 15,
            min_room_size: 3,
            max_room_size: 6,
            enemy_density: 0.06,
            treasure_density: 0.02,
            door_chance: 0.7,
            width: 50,
            height: 35,
        }
    }

    /// The three built-in profiles keyed by name.
    pub fn defaults() -> BTreeMap<String, DifficultyProfile> {
        let mut map = BTreeMap::new();
        map.insert("easy".to_string(), Self::easy());
        map.insert("medium".to_string(), Self::medium());
        map.insert("hard".to_string(), Self::hard());
        map
    }

    /// Check the ranges are coherent and that the largest room fits with a 1-tile margin.
    pub fn validate(&self) -> Result<(), String> {
        if self.min_rooms == 0 || self.min_rooms > self.max_rooms {
            return Err(format!(
                "room count range {}..={} is invalid",
                self.min_rooms, self.max_rooms
            ));
        }
        // Chest and treasure placement needs a non-empty interior.
        if self.min_room_size < 3 || self.min_room_size > self.max_room_size {
            return Err(format!(
                "room size range {}..={} is invalid (minimum size is 3)",
                self.min_room_size, self.max_room_size
            ));
        }
        if self.width < self.max_room_size + 2 || self.height < self.max_room_size + 2 {
            return Err(format!(
                "grid {}x{} cannot hold a {}-tile room with margins",
                self.width, self.height, self.max_room_size
            ));
        }
        for (name, p) in [
            ("enemy_density", self.enemy_density),
            ("treasure_density", self.treasure_density),
            ("door_chance", self.door_chance),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(format!("{} must be within 0.0..=1.0 (got {})", name, p));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HeroTemplate {
    pub class: HeroClass,
    pub gender: Gender,
    pub hp: i32,
    pub attack: i32,
    pub defense: i32,
    pub magic: i32,
    pub agility: i32,
    pub dice: DamageRoll,
}

impl HeroTemplate {
    pub fn base_stats(&self) -> Stats {
        Stats {
            hp: self.hp,
            max_hp: self.hp,
            attack: self.attack,
            defense: self.defense,
            magic: self.magic,
            agility: self.agility,
        }
    }
}

/// An equipment or consumable entry. Modifier names follow the `<stat>_bonus` /
/// `<stat>_penalty` convention understood by `combat::apply_item_effects`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ItemDef {
    pub name: String,
    pub category: ItemCategory,
    pub modifiers: BTreeMap<String, i32>,
    /// Consumables with a duration become timed effects measured in moves.
    pub duration: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnemyTemplate {
    pub species: EnemySpecies,
    pub hp: i32,
    pub attack: i32,
    pub defense: i32,
    pub dice: DamageRoll,
}

#[derive(Debug, Clone)]
pub struct Catalog {
    heroes: Vec<HeroTemplate>,
    items: Vec<ItemDef>,
    enemies: Vec<EnemyTemplate>,
    difficulties: BTreeMap<String, DifficultyProfile>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::standard()
    }
}

impl Catalog {
    /// Built-in heroes, items and enemies with the default difficulty profiles.
    pub fn standard() -> Self {
        Self::with_difficulties(DifficultyProfile::defaults())
    }

    pub fn with_difficulties(difficulties: BTreeMap<String, DifficultyProfile>) -> Self {
        Self {
            heroes: standard_heroes(),
            items: standard_items(),
            enemies: standard_enemies(),
            difficulties,
        }
    }

    pub fn hero(&self, class: HeroClass, gender: Gender) -> Option<&HeroTemplate> {
        self.heroes
            .iter()
            .find(|h| h.class == class && h.gender == gender)
    }

    pub fn heroes(&self) -> &[HeroTemplate] {
        &self.heroes
    }

    pub fn item(&self, category: ItemCategory, name: &str) -> Option<&ItemDef> {
        self.items
            .iter()
            .find(|i| i.category == category && i.name.eq_ignore_ascii_case(name))
    }

    pub fn items_in(&self, category: ItemCategory) -> Vec<&ItemDef> {
        self.items.iter().filter(|i| i.category == category).collect()
    }

    pub fn enemy(&self, species: EnemySpecies) -> Option<&EnemyTemplate> {
        self.enemies.iter().find(|e| e.species == species)
    }

    pub fn enemies(&self) -> &[EnemyTemplate] {
        &self.enemies
    }

    pub fn difficulty(&self, name: &str) -> Option<&DifficultyProfile> {
        self.difficulties.get(&name.trim().to_ascii_lowercase())
    }

    pub fn difficulty_names(&self) -> Vec<&str> {
        self.difficulties.keys().map(String::as_str).collect()
    }
}

fn hero(
    class: HeroClass,
    gender: Gender,
    [hp, attack, defense, magic, agility]: [i32; 5],
    dice: DamageRoll,
) -> HeroTemplate {
    HeroTemplate {
        class,
        gender,
        hp,
        attack,
        defense,
        magic,
        agility,
        dice,
    }
}

fn standard_heroes() -> Vec<HeroTemplate> {
    use Gender::{Female, Male};
    use HeroClass::*;
    vec![
        hero(Wizard, Male, [80, 8, 5, 20, 8], DamageRoll::new(2, 8)),
        hero(Wizard, Female, [75, 7, 5, 22, 9], DamageRoll::new(2, 8)),
        hero(Knight, Male, [130, 16, 13, 4, 5], DamageRoll::new(3, 6)),
        hero(Knight, Female, [120, 15, 12, 5, 6], DamageRoll::new(3, 6)),
        hero(Hunter, Male, [100, 13, 8, 6, 12], DamageRoll::new(2, 10)),
        hero(Hunter, Female, [95, 12, 8, 7, 13], DamageRoll::new(2, 10)),
        hero(Thief, Male, [90, 11, 6, 5, 16], DamageRoll::new(2, 12)),
        hero(Thief, Female, [85, 10, 6, 6, 17], DamageRoll::new(2, 12)),
        hero(Peasant, Male, [100, 8, 5, 2, 7], DamageRoll::new(1, 6)),
        hero(Peasant, Female, [95, 7, 5, 3, 8], DamageRoll::new(1, 6)),
    ]
}

fn item(name: &str, category: ItemCategory, mods: &[(&str, i32)], duration: Option<u32>) -> ItemDef {
    ItemDef {
        name: name.to_string(),
        category,
        modifiers: mods.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
        duration,
    }
}

fn standard_items() -> Vec<ItemDef> {
    use ItemCategory::{Armor, Potion, Weapon};
    vec![
        item("Rusty Sword", Weapon, &[("attack_bonus", 3)], None),
        item("Iron Sword", Weapon, &[("attack_bonus", 5)], None),
        item(
            "Battle Axe",
            Weapon,
            &[("attack_bonus", 8), ("agility_penalty", 2)],
            None,
        ),
        item(
            "Elven Bow",
            Weapon,
            &[("attack_bonus", 6), ("agility_bonus", 2)],
            None,
        ),
        item(
            "Magic Staff",
            Weapon,
            &[("magic_bonus", 8), ("attack_bonus", 2)],
            None,
        ),
        item("Leather Armor", Armor, &[("defense_bonus", 3)], None),
        item(
            "Chain Mail",
            Armor,
            &[("defense_bonus", 6), ("agility_penalty", 1)],
            None,
        ),
        item(
            "Plate Armor",
            Armor,
            &[("defense_bonus", 10), ("agility_penalty", 3)],
            None,
        ),
        item(
            "Mage Robe",
            Armor,
            &[("defense_bonus", 1), ("magic_bonus", 4)],
            None,
        ),
        item("Health Potion", Potion, &[("hp_bonus", 30)], None),
        item("Greater Health Potion", Potion, &[("hp_bonus", 60)], None),
        item("Strength Potion", Potion, &[("attack_bonus", 5)], Some(10)),
        item("Stoneskin Potion", Potion, &[("defense_bonus", 5)], Some(10)),
    ]
}

fn standard_enemies() -> Vec<EnemyTemplate> {
    use EnemySpecies::*;
    let e = |species, hp, attack, defense, dice| EnemyTemplate {
        species,
        hp,
        attack,
        defense,
        dice,
    };
    vec![
        e(Goblin, 30, 8, 3, DamageRoll::new(1, 6)),
        e(Orc, 45, 12, 5, DamageRoll::new(2, 6)),
        e(Skeleton, 35, 10, 4, DamageRoll::new(1, 8)),
        e(Spider, 25, 9, 2, DamageRoll::new(2, 4)),
        e(Rat, 15, 5, 1, DamageRoll::new(1, 4)),
    ]
}
