use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use super::catalog::HeroTemplate;
use super::grid::Grid;

pub const DUNGEON_SCHEMA_VERSION: u8 = 1;
pub const GAME_SCHEMA_VERSION: u8 = 1;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
    ];

    /// Unit step as (dx, dy); y grows downward.
    pub fn delta(self) -> (i64, i64) {
        match self {
            Direction::North => (0, -1),
            Direction::South => (0, 1),
            Direction::East => (1, 0),
            Direction::West => (-1, 0),
        }
    }

    /// Accepts full names and single-letter shorthands, case-insensitively.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "n" | "north" | "up" => Some(Direction::North),
            "s" | "south" | "down" => Some(Direction::South),
            "e" | "east" | "right" => Some(Direction::East),
            "w" | "west" | "left" => Some(Direction::West),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum KeyType {
    Bronze,
    Silver,
    Gold,
}

impl KeyType {
    pub const ALL: [KeyType; 3] = [KeyType::Bronze, KeyType::Silver, KeyType::Gold];

    pub fn as_str(self) -> &'static str {
        match self {
            KeyType::Bronze => "bronze",
            KeyType::Silver => "silver",
            KeyType::Gold => "gold",
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A die pool: `count` independent draws in `1..=sides`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DamageRoll {
    pub sides: u32,
    pub count: u32,
}

impl DamageRoll {
    pub const fn new(count: u32, sides: u32) -> Self {
        Self { sides, count }
    }
}

impl fmt::Display for DamageRoll {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d{}", self.count, self.sides)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Room {
    pub id: String,
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl Room {
    pub fn center(&self) -> Position {
        Position::new(self.x + self.width / 2, self.y + self.height / 2)
    }

    /// Overlap test with a one-tile buffer around `other`.
    pub fn intersects_with_buffer(&self, other: &Room) -> bool {
        self.x < other.x + other.width + 1
            && self.x + self.width + 1 > other.x
            && self.y < other.y + other.height + 1
            && self.y + self.height + 1 > other.y
    }

    pub fn contains(&self, pos: Position) -> bool {
        pos.x >= self.x && pos.x < self.x + self.width && pos.y >= self.y && pos.y < self.y + self.height
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Door {
    pub id: String,
    pub position: Position,
    pub key_type: KeyType,
    pub locked: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ItemCategory {
    Key,
    Weapon,
    Armor,
    Potion,
    Treasure,
}

impl ItemCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            ItemCategory::Key => "key",
            ItemCategory::Weapon => "weapon",
            ItemCategory::Armor => "armor",
            ItemCategory::Potion => "potion",
            ItemCategory::Treasure => "treasure",
        }
    }
}

impl fmt::Display for ItemCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Item descriptor stored inside a chest; names resolve against the item catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChestItem {
    pub category: ItemCategory,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chest {
    pub id: String,
    pub position: Position,
    pub key_type: KeyType,
    pub locked: bool,
    pub contents: Vec<ChestItem>,
}

/// A key lying on the floor, waiting to be collected.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KeyPickup {
    pub id: String,
    pub position: Position,
    pub key_type: KeyType,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TreasureKind {
    Gold,
    Potion,
    Weapon,
    Armor,
}

impl TreasureKind {
    pub const ALL: [TreasureKind; 4] = [
        TreasureKind::Gold,
        TreasureKind::Potion,
        TreasureKind::Weapon,
        TreasureKind::Armor,
    ];

    pub fn item_category(self) -> ItemCategory {
        match self {
            TreasureKind::Gold => ItemCategory::Treasure,
            TreasureKind::Potion => ItemCategory::Potion,
            TreasureKind::Weapon => ItemCategory::Weapon,
            TreasureKind::Armor => ItemCategory::Armor,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Treasure {
    pub id: String,
    pub position: Position,
    pub kind: TreasureKind,
    /// Concrete reward, resolved at generation time so pickups need no randomness.
    pub item_name: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EnemySpecies {
    Goblin,
    Orc,
    Skeleton,
    Spider,
    Rat,
}

impl EnemySpecies {
    pub const ALL: [EnemySpecies; 5] = [
        EnemySpecies::Goblin,
        EnemySpecies::Orc,
        EnemySpecies::Skeleton,
        EnemySpecies::Spider,
        EnemySpecies::Rat,
    ];

    pub fn name(self) -> &'static str {
        match self {
            EnemySpecies::Goblin => "goblin",
            EnemySpecies::Orc => "orc",
            EnemySpecies::Skeleton => "skeleton",
            EnemySpecies::Spider => "spider",
            EnemySpecies::Rat => "rat",
        }
    }
}

impl fmt::Display for EnemySpecies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Enemy {
    pub id: String,
    pub position: Position,
    pub species: EnemySpecies,
    pub hp: i32,
    pub max_hp: i32,
    pub attack: i32,
    pub defense: i32,
    pub dice: DamageRoll,
    pub alive: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TrapKind {
    Spike,
    Dart,
    Pit,
}

impl TrapKind {
    pub const ALL: [TrapKind; 3] = [TrapKind::Spike, TrapKind::Dart, TrapKind::Pit];

    pub fn as_str(self) -> &'static str {
        match self {
            TrapKind::Spike => "spike",
            TrapKind::Dart => "dart",
            TrapKind::Pit => "pit",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Trap {
    pub id: String,
    pub position: Position,
    pub kind: TrapKind,
    pub damage: i32,
}

/// The generated world. Immutable after assembly except door lock flags,
/// chest lock flags and enemy hp/liveness, which are shared by every session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Dungeon {
    pub id: String,
    pub seed: u64,
    pub grid: Grid,
    pub width: usize,
    pub height: usize,
    pub difficulty: String,
    pub theme: String,
    pub spawn: Position,
    pub rooms: Vec<Room>,
    pub doors: Vec<Door>,
    pub chests: Vec<Chest>,
    pub keys: Vec<KeyPickup>,
    pub treasures: Vec<Treasure>,
    pub enemies: Vec<Enemy>,
    pub traps: Vec<Trap>,
    pub created_at: DateTime<Utc>,
    pub schema_version: u8,
}

impl Dungeon {
    pub fn door_at(&self, pos: Position) -> Option<&Door> {
        self.doors.iter().find(|d| d.position == pos)
    }

    pub fn door_at_mut(&mut self, pos: Position) -> Option<&mut Door> {
        self.doors.iter_mut().find(|d| d.position == pos)
    }

    pub fn chest_at_mut(&mut self, pos: Position) -> Option<&mut Chest> {
        self.chests.iter_mut().find(|c| c.position == pos)
    }

    pub fn living_enemy_at(&self, pos: Position) -> Option<&Enemy> {
        self.enemies.iter().find(|e| e.alive && e.position == pos)
    }

    pub fn enemy(&self, id: &str) -> Option<&Enemy> {
        self.enemies.iter().find(|e| e.id == id)
    }

    pub fn enemy_mut(&mut self, id: &str) -> Option<&mut Enemy> {
        self.enemies.iter_mut().find(|e| e.id == id)
    }

    pub fn keys_at(&self, pos: Position) -> impl Iterator<Item = &KeyPickup> {
        self.keys.iter().filter(move |k| k.position == pos)
    }

    pub fn treasures_at(&self, pos: Position) -> impl Iterator<Item = &Treasure> {
        self.treasures.iter().filter(move |t| t.position == pos)
    }

    pub fn trap_at(&self, pos: Position) -> Option<&Trap> {
        self.traps.iter().find(|t| t.position == pos)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum HeroClass {
    Wizard,
    Knight,
    Hunter,
    Thief,
    Peasant,
}

impl HeroClass {
    pub const ALL: [HeroClass; 5] = [
        HeroClass::Wizard,
        HeroClass::Knight,
        HeroClass::Hunter,
        HeroClass::Thief,
        HeroClass::Peasant,
    ];

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "wizard" => Some(HeroClass::Wizard),
            "knight" => Some(HeroClass::Knight),
            "hunter" => Some(HeroClass::Hunter),
            "thief" => Some(HeroClass::Thief),
            "peasant" => Some(HeroClass::Peasant),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HeroClass::Wizard => "wizard",
            HeroClass::Knight => "knight",
            HeroClass::Hunter => "hunter",
            HeroClass::Thief => "thief",
            HeroClass::Peasant => "peasant",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub const ALL: [Gender; 2] = [Gender::Male, Gender::Female];

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "male" | "m" => Some(Gender::Male),
            "female" | "f" => Some(Gender::Female),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }
}

/// The flat stat map item modifiers act upon.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Stats {
    pub hp: i32,
    pub max_hp: i32,
    pub attack: i32,
    pub defense: i32,
    pub magic: i32,
    pub agility: i32,
}

impl Stats {
    /// Look up a stat by its modifier name; unknown names yield `None`.
    pub fn stat_mut(&mut self, name: &str) -> Option<&mut i32> {
        match name {
            "hp" => Some(&mut self.hp),
            "max_hp" => Some(&mut self.max_hp),
            "attack" => Some(&mut self.attack),
            "defense" => Some(&mut self.defense),
            "magic" => Some(&mut self.magic),
            "agility" => Some(&mut self.agility),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InventoryItem {
    pub id: String,
    pub name: String,
    pub category: ItemCategory,
    /// Only set for keys.
    pub key_type: Option<KeyType>,
}

impl InventoryItem {
    pub fn key(id: impl Into<String>, key_type: KeyType) -> Self {
        Self {
            id: id.into(),
            name: format!("{} key", key_type),
            category: ItemCategory::Key,
            key_type: Some(key_type),
        }
    }

    pub fn item(id: impl Into<String>, name: impl Into<String>, category: ItemCategory) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category,
            key_type: None,
        }
    }
}

/// A consumable's modifiers that are still in force, counted down in accepted moves.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActiveEffect {
    pub item_name: String,
    pub remaining_moves: u32,
}

/// Per-session player state. `combat` is the combat marker: `Some(enemy_id)` while engaged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameState {
    pub id: String,
    pub dungeon_id: String,
    pub hero_class: HeroClass,
    pub hero_gender: Gender,
    pub stats: Stats,
    pub dice: DamageRoll,
    pub position: Position,
    pub level: u32,
    pub experience: u32,
    pub inventory: Vec<InventoryItem>,
    pub equipped_weapon: Option<InventoryItem>,
    pub equipped_armor: Option<InventoryItem>,
    pub active_effects: Vec<ActiveEffect>,
    pub discovered: Vec<Vec<bool>>,
    pub defeated_enemies: BTreeSet<String>,
    pub collected_treasures: BTreeSet<String>,
    pub collected_keys: BTreeSet<String>,
    pub opened_chests: BTreeSet<String>,
    pub sprung_traps: BTreeSet<String>,
    pub moves: u32,
    pub combat: Option<String>,
    pub created_at: DateTime<Utc>,
    pub schema_version: u8,
}

impl GameState {
    /// Fresh session for `hero` standing on the dungeon's spawn. Only the spawn tile
    /// starts out discovered.
    pub fn start(id: impl Into<String>, dungeon: &Dungeon, hero: &HeroTemplate) -> Self {
        let mut discovered = vec![vec![false; dungeon.width]; dungeon.height];
        if let Some(cell) = discovered
            .get_mut(dungeon.spawn.y)
            .and_then(|row| row.get_mut(dungeon.spawn.x))
        {
            *cell = true;
        }
        Self {
            id: id.into(),
            dungeon_id: dungeon.id.clone(),
            hero_class: hero.class,
            hero_gender: hero.gender,
            stats: hero.base_stats(),
            dice: hero.dice,
            position: dungeon.spawn,
            level: 1,
            experience: 0,
            inventory: Vec::new(),
            equipped_weapon: None,
            equipped_armor: None,
            active_effects: Vec::new(),
            discovered,
            defeated_enemies: BTreeSet::new(),
            collected_treasures: BTreeSet::new(),
            collected_keys: BTreeSet::new(),
            opened_chests: BTreeSet::new(),
            sprung_traps: BTreeSet::new(),
            moves: 0,
            combat: None,
            created_at: Utc::now(),
            schema_version: GAME_SCHEMA_VERSION,
        }
    }

    pub fn in_combat(&self) -> bool {
        self.combat.is_some()
    }

    pub fn is_defeated(&self) -> bool {
        self.stats.hp <= 0
    }

    pub fn has_key(&self, key_type: KeyType) -> bool {
        self.inventory
            .iter()
            .any(|i| i.category == ItemCategory::Key && i.key_type == Some(key_type))
    }

    /// Remove and return one key of `key_type`.
    pub fn take_key(&mut self, key_type: KeyType) -> Option<InventoryItem> {
        let idx = self
            .inventory
            .iter()
            .position(|i| i.category == ItemCategory::Key && i.key_type == Some(key_type))?;
        Some(self.inventory.remove(idx))
    }

    pub fn is_discovered(&self, pos: Position) -> bool {
        self.discovered
            .get(pos.y)
            .and_then(|row| row.get(pos.x))
            .copied()
            .unwrap_or(false)
    }

    /// Reveal the 3x3 block centred on `pos`, clipped to the fog grid.
    pub fn reveal_around(&mut self, pos: Position) {
        let y0 = pos.y.saturating_sub(1);
        let x0 = pos.x.saturating_sub(1);
        for y in y0..=pos.y + 1 {
            let Some(row) = self.discovered.get_mut(y) else {
                continue;
            };
            for x in x0..=pos.x + 1 {
                if let Some(cell) = row.get_mut(x) {
                    *cell = true;
                }
            }
        }
    }

    pub fn discovered_count(&self) -> usize {
        self.discovered
            .iter()
            .map(|row| row.iter().filter(|v| **v).count())
            .sum()
    }
}
