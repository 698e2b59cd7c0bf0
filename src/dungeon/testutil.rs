//! Hand-built fixtures for unit tests.

use chrono::Utc;

use super::catalog::Catalog;
use super::grid::{Grid, Tile};
use super::types::{
    Dungeon, Enemy, EnemySpecies, Gender, GameState, HeroClass, Position, DUNGEON_SCHEMA_VERSION,
};

pub struct Arena {
    pub catalog: Catalog,
    pub dungeon: Dungeon,
    pub state: GameState,
    pub enemy_id: String,
}

/// A 10x5 open room (floor at x 1..=8, y 1..=3) with the spawn at (1,2) and one
/// goblin at (5,2). The hero is a female knight.
pub fn arena() -> Arena {
    let catalog = Catalog::standard();
    let mut grid = Grid::new(10, 5);
    for y in 1..=3 {
        for x in 1..=8 {
            grid.set(Position::new(x, y), Tile::Floor);
        }
    }
    let template = catalog
        .enemy(EnemySpecies::Goblin)
        .cloned()
        .expect("goblin template");
    let enemy_id = "enemy_0".to_string();
    let dungeon = Dungeon {
        id: "arena".into(),
        seed: 0,
        grid,
        width: 10,
        height: 5,
        difficulty: "easy".into(),
        theme: "cave".into(),
        spawn: Position::new(1, 2),
        rooms: Vec::new(),
        doors: Vec::new(),
        chests: Vec::new(),
        keys: Vec::new(),
        treasures: Vec::new(),
        enemies: vec![Enemy {
            id: enemy_id.clone(),
            position: Position::new(5, 2),
            species: template.species,
            hp: template.hp,
            max_hp: template.hp,
            attack: template.attack,
            defense: template.defense,
            dice: template.dice,
            alive: true,
        }],
        traps: Vec::new(),
        created_at: Utc::now(),
        schema_version: DUNGEON_SCHEMA_VERSION,
    };
    let hero = catalog
        .hero(HeroClass::Knight, Gender::Female)
        .expect("knight template")
        .clone();
    let state = GameState::start("session", &dungeon, &hero);
    Arena {
        catalog,
        dungeon,
        state,
        enemy_id,
    }
}
