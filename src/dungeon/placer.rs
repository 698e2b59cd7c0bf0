//! Scatters chests, keys, treasures, enemies and traps over a carved layout.
//!
//! Order matters: doors (already placed by the layout) come before chests, chests
//! before keys so the key tally sees the final lock demand, then treasures, enemies and
//! traps. Later placers never overwrite earlier special tiles.

use log::debug;
use rand::seq::{index, SliceRandom};
use rand::Rng;
use std::collections::{BTreeMap, HashSet};

use super::catalog::{Catalog, DifficultyProfile, GOLD_ITEM_NAME};
use super::grid::{Grid, Tile};
use super::types::{
    Chest, ChestItem, Door, Enemy, ItemCategory, KeyPickup, KeyType, Position,
    Room, Trap, TrapKind, Treasure, TreasureKind,
};

pub const CHEST_CHANCE: f64 = 0.6;
pub const CHEST_ITEM_CHANCE: f64 = 0.8;
pub const TRAP_CHANCE: f64 = 0.01;
/// Non-floor cells (of 9) that mark a tile as a narrow passage.
pub const TRAP_MIN_ENCLOSURE: usize = 6;
pub const TRAP_DAMAGE_MIN: i32 = 5;
pub const TRAP_DAMAGE_MAX: i32 = 15;

const CHEST_ITEM_CATEGORIES: [ItemCategory; 3] =
    [ItemCategory::Weapon, ItemCategory::Armor, ItemCategory::Potion];

#[derive(Debug, Clone, Default)]
pub struct Resources {
    pub chests: Vec<Chest>,
    pub keys: Vec<KeyPickup>,
    pub treasures: Vec<Treasure>,
    pub enemies: Vec<Enemy>,
    pub traps: Vec<Trap>,
}

/// Run every placer in order. `spawn` is kept clear of keys, treasures, enemies and traps.
pub fn place_resources<R: Rng + ?Sized>(
    grid: &mut Grid,
    rooms: &[Room],
    doors: &[Door],
    spawn: Position,
    profile: &DifficultyProfile,
    catalog: &Catalog,
    rng: &mut R,
) -> Resources {
    let chests = place_chests(grid, rooms, catalog, rng);
    let keys = place_keys(grid, doors, &chests, spawn, rng);
    let treasures = place_treasures(
        grid,
        rooms,
        &keys,
        spawn,
        profile.treasure_density,
        catalog,
        rng,
    );
    let enemies = place_enemies(grid, spawn, profile.enemy_density, catalog, rng);
    let traps = place_traps(grid, spawn, rng);
    debug!(
        "placed {} chests, {} keys, {} treasures, {} enemies, {} traps",
        chests.len(),
        keys.len(),
        treasures.len(),
        enemies.len(),
        traps.len()
    );
    Resources {
        chests,
        keys,
        treasures,
        enemies,
        traps,
    }
}

/// Random tile strictly inside the room's one-tile border.
fn interior_tile<R: Rng + ?Sized>(room: &Room, rng: &mut R) -> Option<Position> {
    if room.width < 3 || room.height < 3 {
        return None;
    }
    let x = rng.gen_range(room.x + 1..=room.x + room.width - 2);
    let y = rng.gen_range(room.y + 1..=room.y + room.height - 2);
    Some(Position::new(x, y))
}

fn pick_item_name<R: Rng + ?Sized>(
    catalog: &Catalog,
    category: ItemCategory,
    rng: &mut R,
) -> Option<String> {
    catalog
        .items_in(category)
        .choose(rng)
        .map(|item| item.name.clone())
}

fn place_chests<R: Rng + ?Sized>(
    grid: &mut Grid,
    rooms: &[Room],
    catalog: &Catalog,
    rng: &mut R,
) -> Vec<Chest> {
    let mut chests = Vec::new();
    // The first room is the spawn room.
    for room in rooms.iter().skip(1) {
        if !rng.gen_bool(CHEST_CHANCE) {
            continue;
        }
        let Some(pos) = interior_tile(room, rng) else {
            continue;
        };
        let key_type = *KeyType::ALL.choose(rng).unwrap_or(&KeyType::Bronze);
        let mut contents = Vec::new();
        if rng.gen_bool(CHEST_ITEM_CHANCE) {
            let category = *CHEST_ITEM_CATEGORIES
                .choose(rng)
                .unwrap_or(&ItemCategory::Potion);
            if let Some(name) = pick_item_name(catalog, category, rng) {
                contents.push(ChestItem { category, name });
            }
        }
        if !grid.is(pos, Tile::Floor) {
            continue;
        }
        grid.set(pos, Tile::Chest);
        chests.push(Chest {
            id: format!("chest_{}", chests.len()),
            position: pos,
            key_type,
            locked: true,
            contents,
        });
    }
    chests
}

/// Number of locks (doors and chests) per key type.
pub fn lock_demand(doors: &[Door], chests: &[Chest]) -> BTreeMap<KeyType, usize> {
    let mut demand = BTreeMap::new();
    for kt in doors
        .iter()
        .map(|d| d.key_type)
        .chain(chests.iter().map(|c| c.key_type))
    {
        *demand.entry(kt).or_insert(0) += 1;
    }
    demand
}

fn place_keys<R: Rng + ?Sized>(
    grid: &Grid,
    doors: &[Door],
    chests: &[Chest],
    spawn: Position,
    rng: &mut R,
) -> Vec<KeyPickup> {
    let demand = lock_demand(doors, chests);
    let mut pool: Vec<Position> = grid
        .floor_positions()
        .into_iter()
        .filter(|p| *p != spawn)
        .collect();
    pool.shuffle(rng);

    let mut keys = Vec::new();
    for (key_type, required) in demand {
        let wanted = required + rng.gen_range(1..=2);
        for _ in 0..wanted {
            // Running out of floor is tolerated; the dungeon is simply under-provisioned.
            let Some(pos) = pool.pop() else {
                debug!("floor exhausted while placing {} keys", key_type);
                break;
            };
            keys.push(KeyPickup {
                id: format!("key_{}", keys.len()),
                position: pos,
                key_type,
            });
        }
    }
    keys
}

fn place_treasures<R: Rng + ?Sized>(
    grid: &Grid,
    rooms: &[Room],
    keys: &[KeyPickup],
    spawn: Position,
    density: f64,
    catalog: &Catalog,
    rng: &mut R,
) -> Vec<Treasure> {
    let chance = (density * 10.0).clamp(0.0, 1.0);
    let taken: HashSet<Position> = keys.iter().map(|k| k.position).collect();
    let mut treasures = Vec::new();
    for room in rooms {
        if !rng.gen_bool(chance) {
            continue;
        }
        let Some(pos) = interior_tile(room, rng) else {
            continue;
        };
        let kind = *TreasureKind::ALL.choose(rng).unwrap_or(&TreasureKind::Gold);
        let item_name = match kind {
            TreasureKind::Gold => GOLD_ITEM_NAME.to_string(),
            other => pick_item_name(catalog, other.item_category(), rng)
                .unwrap_or_else(|| GOLD_ITEM_NAME.to_string()),
        };
        if pos == spawn || !grid.is(pos, Tile::Floor) || taken.contains(&pos) {
            continue;
        }
        treasures.push(Treasure {
            id: format!("treasure_{}", treasures.len()),
            position: pos,
            kind,
            item_name,
        });
    }
    treasures
}

fn place_enemies<R: Rng + ?Sized>(
    grid: &Grid,
    spawn: Position,
    density: f64,
    catalog: &Catalog,
    rng: &mut R,
) -> Vec<Enemy> {
    let floor = grid.floor_positions();
    let count = (floor.len() as f64 * density).floor() as usize;
    let candidates: Vec<Position> = floor.into_iter().filter(|p| *p != spawn).collect();
    let amount = count.min(candidates.len());

    let mut enemies = Vec::with_capacity(amount);
    for idx in index::sample(rng, candidates.len(), amount).into_vec() {
        let Some(template) = catalog.enemies().choose(rng) else {
            continue;
        };
        let species = template.species;
        enemies.push(Enemy {
            id: format!("enemy_{}", enemies.len()),
            position: candidates[idx],
            species,
            hp: template.hp,
            max_hp: template.hp,
            attack: template.attack,
            defense: template.defense,
            dice: template.dice,
            alive: true,
        });
    }
    enemies
}

fn place_traps<R: Rng + ?Sized>(grid: &Grid, spawn: Position, rng: &mut R) -> Vec<Trap> {
    let mut traps = Vec::new();
    for y in 1..grid.height().saturating_sub(1) {
        for x in 1..grid.width().saturating_sub(1) {
            let pos = Position::new(x, y);
            if pos == spawn
                || !grid.is(pos, Tile::Floor)
                || grid.non_floor_around(pos) < TRAP_MIN_ENCLOSURE
                || !rng.gen_bool(TRAP_CHANCE)
            {
                continue;
            }
            let kind = *TrapKind::ALL.choose(rng).unwrap_or(&TrapKind::Spike);
            traps.push(Trap {
                id: format!("trap_{}", traps.len()),
                position: pos,
                kind,
                damage: rng.gen_range(TRAP_DAMAGE_MIN..=TRAP_DAMAGE_MAX),
            });
        }
    }
    traps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dungeon::layout;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn generate(seed: u64, profile: &DifficultyProfile) -> (Grid, Vec<Room>, Vec<Door>, Resources) {
        let catalog = Catalog::standard();
        let mut rng = StdRng::seed_from_u64(seed);
        let mut lay = layout::generate(profile.width, profile.height, profile, &mut rng);
        let spawn = lay.rooms[0].center();
        let res = place_resources(
            &mut lay.grid,
            &lay.rooms,
            &lay.doors,
            spawn,
            profile,
            &catalog,
            &mut rng,
        );
        (lay.grid, lay.rooms, lay.doors, res)
    }

    #[test]
    fn keys_cover_lock_demand() {
        for seed in 0..20u64 {
            let (_, _, doors, res) = generate(seed, &DifficultyProfile::hard());
            let demand = lock_demand(&doors, &res.chests);
            for (kt, required) in demand {
                let supplied = res.keys.iter().filter(|k| k.key_type == kt).count();
                assert!(supplied > required, "seed {} {}: {} <= {}", seed, kt, supplied, required);
                assert!(supplied <= required + 2);
            }
        }
    }

    #[test]
    fn keys_occupy_distinct_floor_tiles() {
        let (grid, _, _, res) = generate(7, &DifficultyProfile::medium());
        let mut seen = HashSet::new();
        for k in &res.keys {
            assert!(grid.is(k.position, Tile::Floor));
            assert!(seen.insert(k.position), "duplicate key tile {}", k.position);
        }
    }

    #[test]
    fn chests_skip_spawn_room_and_sit_on_chest_tiles() {
        for seed in 0..10u64 {
            let (grid, rooms, _, res) = generate(seed, &DifficultyProfile::medium());
            for chest in &res.chests {
                assert!(grid.is(chest.position, Tile::Chest));
                assert!(!rooms[0].contains(chest.position));
                assert!(chest.locked);
                assert!(chest.contents.len() <= 1);
            }
            assert_eq!(grid.count(Tile::Chest), res.chests.len());
        }
    }

    #[test]
    fn treasures_only_on_plain_floor() {
        for seed in 0..10u64 {
            let (grid, _, _, res) = generate(seed, &DifficultyProfile::easy());
            for t in &res.treasures {
                assert!(grid.is(t.position, Tile::Floor));
                assert!(res.keys.iter().all(|k| k.position != t.position));
                if t.kind == TreasureKind::Gold {
                    assert_eq!(t.item_name, GOLD_ITEM_NAME);
                }
            }
        }
    }

    #[test]
    fn enemy_count_follows_density() {
        let profile = DifficultyProfile::hard();
        let catalog = Catalog::standard();
        let mut rng = StdRng::seed_from_u64(21);
        let mut lay = layout::generate(profile.width, profile.height, &profile, &mut rng);
        let spawn = lay.rooms[0].center();
        // Chests/doors are non-floor, so count against the grid as the enemy placer sees it.
        let res = place_resources(
            &mut lay.grid,
            &lay.rooms,
            &lay.doors,
            spawn,
            &profile,
            &catalog,
            &mut rng,
        );
        let floor = lay.grid.floor_positions().len();
        let expected = (floor as f64 * profile.enemy_density).floor() as usize;
        assert_eq!(res.enemies.len(), expected);
        let distinct: HashSet<_> = res.enemies.iter().map(|e| e.position).collect();
        assert_eq!(distinct.len(), res.enemies.len());
        for e in &res.enemies {
            assert!(e.alive);
            assert_eq!(e.hp, e.max_hp);
            assert_ne!(e.position, spawn);
        }
    }

    #[test]
    fn traps_only_in_narrow_passages() {
        let mut grid = Grid::new(40, 5);
        for x in 1..39 {
            grid.set(Position::new(x, 2), Tile::Floor);
        }
        // Every corridor tile is a candidate; with enough seeds some traps appear.
        let mut total = 0;
        for seed in 0..50u64 {
            let mut rng = StdRng::seed_from_u64(seed);
            let traps = place_traps(&grid, Position::new(1, 2), &mut rng);
            for t in &traps {
                assert_eq!(t.position.y, 2);
                assert_ne!(t.position.x, 1);
                assert!((TRAP_DAMAGE_MIN..=TRAP_DAMAGE_MAX).contains(&t.damage));
            }
            total += traps.len();
        }
        assert!(total > 0);

        // An open field yields no candidates at all.
        let mut open = Grid::new(10, 10);
        for y in 0..10 {
            for x in 0..10 {
                open.set(Position::new(x, y), Tile::Floor);
            }
        }
        let mut rng = StdRng::seed_from_u64(1);
        assert!(place_traps(&open, Position::new(0, 0), &mut rng).is_empty());
    }

    #[test]
    fn treasure_never_lands_on_spawn() {
        let catalog = Catalog::standard();
        let mut grid = Grid::new(6, 6);
        for y in 1..=3 {
            for x in 1..=3 {
                grid.set(Position::new(x, y), Tile::Floor);
            }
        }
        // A 3x3 room has a single interior tile: its centre.
        let room = Room {
            id: "room_0".into(),
            x: 1,
            y: 1,
            width: 3,
            height: 3,
        };
        let spawn = room.center();
        for seed in 0..10u64 {
            let mut rng = StdRng::seed_from_u64(seed);
            let rooms = [room.clone()];
            assert!(place_treasures(&grid, &rooms, &[], spawn, 1.0, &catalog, &mut rng).is_empty());
            let mut rng = StdRng::seed_from_u64(seed);
            let elsewhere = Position::new(1, 1);
            let placed = place_treasures(&grid, &rooms, &[], elsewhere, 1.0, &catalog, &mut rng);
            assert_eq!(placed.len(), 1);
            assert_eq!(placed[0].position, spawn);
        }
    }

    #[test]
    fn unused_key_types_get_no_keys() {
        let mut grid = Grid::new(12, 12);
        for y in 1..11 {
            for x in 1..11 {
                grid.set(Position::new(x, y), Tile::Floor);
            }
        }
        let doors: Vec<Door> = (0..3)
            .map(|i| Door {
                id: format!("door_{}", i),
                position: Position::new(0, i),
                key_type: KeyType::Bronze,
                locked: true,
            })
            .collect();
        for seed in 0..20u64 {
            let mut rng = StdRng::seed_from_u64(seed);
            let keys = place_keys(&grid, &doors, &[], Position::new(5, 5), &mut rng);
            assert!((4..=5).contains(&keys.len()));
            assert!(keys.iter().all(|k| k.key_type == KeyType::Bronze));
        }
        let mut rng = StdRng::seed_from_u64(3);
        assert!(place_keys(&grid, &[], &[], Position::new(5, 5), &mut rng).is_empty());
    }

    #[test]
    fn key_placement_tolerates_floor_exhaustion() {
        let mut grid = Grid::new(5, 5);
        grid.set(Position::new(1, 1), Tile::Floor);
        grid.set(Position::new(2, 1), Tile::Floor);
        let doors: Vec<Door> = (0..4)
            .map(|i| Door {
                id: format!("door_{}", i),
                position: Position::new(3, 3),
                key_type: KeyType::Gold,
                locked: true,
            })
            .collect();
        let mut rng = StdRng::seed_from_u64(0);
        let keys = place_keys(&grid, &doors, &[], Position::new(0, 0), &mut rng);
        assert_eq!(keys.len(), 2);
    }
}
