//! Shared fixtures for integration tests.

use dungeon_rpg::dungeon::{
    Catalog, Dungeon, DungeonEngine, DungeonStoreBuilder, Position, Tile,
};

/// Seeded engine over a throwaway sled store inside `dir`.
#[allow(dead_code)]
pub fn engine(dir: &tempfile::TempDir, seed: u64) -> DungeonEngine {
    let store = DungeonStoreBuilder::new(dir.path().join("db"))
        .without_flush()
        .open()
        .expect("store");
    DungeonEngine::with_seed(store, Catalog::standard(), seed)
}

/// The tile east of the spawn with every special feature stripped, left as plain floor.
#[allow(dead_code)]
pub fn clear_east_of_spawn(dungeon: &mut Dungeon) -> Position {
    let pos = Position::new(dungeon.spawn.x + 1, dungeon.spawn.y);
    dungeon.grid.set(pos, Tile::Floor);
    dungeon.doors.retain(|d| d.position != pos);
    dungeon.chests.retain(|c| c.position != pos);
    dungeon.keys.retain(|k| k.position != pos);
    dungeon.treasures.retain(|t| t.position != pos);
    dungeon.enemies.retain(|e| e.position != pos);
    dungeon.traps.retain(|t| t.position != pos);
    pos
}

/// Breadth-first search over walkable tiles, ignoring locks.
#[allow(dead_code)]
pub fn reachable(dungeon: &Dungeon, from: Position) -> Vec<Vec<bool>> {
    let mut seen = vec![vec![false; dungeon.width]; dungeon.height];
    let mut queue = std::collections::VecDeque::new();
    seen[from.y][from.x] = true;
    queue.push_back(from);
    while let Some(p) = queue.pop_front() {
        for dir in dungeon_rpg::dungeon::Direction::ALL {
            let next = dungeon.grid.step(p, dir);
            let walkable = dungeon.grid.get(next).map(|t| t.is_walkable()).unwrap_or(false);
            if walkable && !seen[next.y][next.x] {
                seen[next.y][next.x] = true;
                queue.push_back(next);
            }
        }
    }
    seen
}
