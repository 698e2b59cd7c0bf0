use std::path::{Path, PathBuf};

use sled::transaction::{ConflictableTransactionError, TransactionError, Transactional};
use sled::IVec;

use crate::dungeon::errors::DungeonError;
use crate::dungeon::types::{Dungeon, GameState, DUNGEON_SCHEMA_VERSION, GAME_SCHEMA_VERSION};

const TREE_DUNGEONS: &str = "dungeons";
const TREE_GAMES: &str = "games";

/// Helper builder so tests can easily create throwaway stores with custom paths.
pub struct DungeonStoreBuilder {
    path: PathBuf,
    flush_writes: bool,
}

impl DungeonStoreBuilder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            flush_writes: true,
        }
    }

    /// Skip the flush after every write (bulk generation, tests).
    pub fn without_flush(mut self) -> Self {
        self.flush_writes = false;
        self
    }

    pub fn open(self) -> Result<DungeonStore, DungeonError> {
        DungeonStore::open_with_options(self.path, self.flush_writes)
    }
}

/// Sled-backed persistence for dungeon and game-state records, addressed by id.
/// Records are always read and written whole.
pub struct DungeonStore {
    _db: sled::Db,
    dungeons: sled::Tree,
    games: sled::Tree,
    flush_writes: bool,
}

impl DungeonStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, DungeonError> {
        Self::open_with_options(path, true)
    }

    fn open_with_options<P: AsRef<Path>>(path: P, flush_writes: bool) -> Result<Self, DungeonError> {
        let path_ref = path.as_ref();
        std::fs::create_dir_all(path_ref)?;
        let db = sled::open(path_ref)?;
        let dungeons = db.open_tree(TREE_DUNGEONS)?;
        let games = db.open_tree(TREE_GAMES)?;
        Ok(Self {
            _db: db,
            dungeons,
            games,
            flush_writes,
        })
    }

    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, DungeonError> {
        Ok(bincode::serialize(value)?)
    }

    fn deserialize<T: serde::de::DeserializeOwned>(bytes: IVec) -> Result<T, DungeonError> {
        Ok(bincode::deserialize::<T>(&bytes)?)
    }

    fn flush(&self, tree: &sled::Tree) -> Result<(), DungeonError> {
        if self.flush_writes {
            tree.flush()?;
        }
        Ok(())
    }

    /// Insert or replace a dungeon record.
    pub fn put_dungeon(&self, mut dungeon: Dungeon) -> Result<(), DungeonError> {
        dungeon.schema_version = DUNGEON_SCHEMA_VERSION;
        let bytes = Self::serialize(&dungeon)?;
        self.dungeons.insert(dungeon.id.as_bytes(), bytes)?;
        self.flush(&self.dungeons)
    }

    pub fn get_dungeon(&self, id: &str) -> Result<Dungeon, DungeonError> {
        let Some(bytes) = self.dungeons.get(id.as_bytes())? else {
            return Err(DungeonError::NotFound(format!("dungeon: {}", id)));
        };
        let record: Dungeon = Self::deserialize(bytes)?;
        if record.schema_version != DUNGEON_SCHEMA_VERSION {
            return Err(DungeonError::SchemaMismatch {
                entity: "dungeon",
                expected: DUNGEON_SCHEMA_VERSION,
                found: record.schema_version,
            });
        }
        Ok(record)
    }

    /// Insert or replace a game-state record.
    pub fn put_game(&self, mut game: GameState) -> Result<(), DungeonError> {
        game.schema_version = GAME_SCHEMA_VERSION;
        let bytes = Self::serialize(&game)?;
        self.games.insert(game.id.as_bytes(), bytes)?;
        self.flush(&self.games)
    }

    pub fn get_game(&self, id: &str) -> Result<GameState, DungeonError> {
        let Some(bytes) = self.games.get(id.as_bytes())? else {
            return Err(DungeonError::NotFound(format!("game: {}", id)));
        };
        let record: GameState = Self::deserialize(bytes)?;
        if record.schema_version != GAME_SCHEMA_VERSION {
            return Err(DungeonError::SchemaMismatch {
                entity: "game",
                expected: GAME_SCHEMA_VERSION,
                found: record.schema_version,
            });
        }
        Ok(record)
    }

    /// Write a game state and the dungeon it mutated in one transaction, so a
    /// crash never leaves an unlocked door without the key having been spent.
    pub fn put_pair(&self, mut dungeon: Dungeon, mut game: GameState) -> Result<(), DungeonError> {
        dungeon.schema_version = DUNGEON_SCHEMA_VERSION;
        game.schema_version = GAME_SCHEMA_VERSION;
        let dungeon_bytes = Self::serialize(&dungeon)?;
        let game_bytes = Self::serialize(&game)?;
        (&self.dungeons, &self.games)
            .transaction(|(dungeons, games)| {
                dungeons.insert(dungeon.id.as_bytes(), dungeon_bytes.clone())?;
                games.insert(game.id.as_bytes(), game_bytes.clone())?;
                Ok::<(), ConflictableTransactionError<()>>(())
            })
            .map_err(|e| match e {
                TransactionError::Storage(err) => DungeonError::Sled(err),
                TransactionError::Abort(()) => {
                    DungeonError::Internal("record transaction aborted".into())
                }
            })?;
        self.flush(&self.dungeons)?;
        self.flush(&self.games)
    }

    pub fn list_dungeon_ids(&self) -> Result<Vec<String>, DungeonError> {
        Self::list_ids(&self.dungeons)
    }

    pub fn list_game_ids(&self) -> Result<Vec<String>, DungeonError> {
        Self::list_ids(&self.games)
    }

    fn list_ids(tree: &sled::Tree) -> Result<Vec<String>, DungeonError> {
        let mut ids = Vec::new();
        for entry in tree.iter() {
            let (key, _) = entry?;
            ids.push(String::from_utf8_lossy(&key).into_owned());
        }
        Ok(ids)
    }
}
