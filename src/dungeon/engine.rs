//! Caller-facing operations. Every action loads full records, resolves against them
//! and writes them back; actions touching the same dungeon run one at a time.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::assembly::{assemble, DungeonRequest};
use super::catalog::{Catalog, HeroTemplate};
use super::combat::{self, CombatAction, CombatOutcome};
use super::errors::DungeonError;
use super::items::{self, ActionOutcome};
use super::movement::{self, MoveOutcome};
use super::render;
use super::storage::DungeonStore;
use super::types::{Direction, Dungeon, GameState, Gender, HeroClass};
use crate::logutil::escape_log;
use crate::validation::validate_record_id;

pub struct DungeonEngine {
    store: DungeonStore,
    catalog: Catalog,
    rng: Mutex<StdRng>,
    dungeon_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl DungeonEngine {
    /// Engine drawing dungeon seeds and combat rolls from OS entropy.
    pub fn new(store: DungeonStore, catalog: Catalog) -> Self {
        Self::with_rng(store, catalog, StdRng::from_entropy())
    }

    /// Fully reproducible engine: the same seed and call sequence replays the same games.
    pub fn with_seed(store: DungeonStore, catalog: Catalog, seed: u64) -> Self {
        Self::with_rng(store, catalog, StdRng::seed_from_u64(seed))
    }

    fn with_rng(store: DungeonStore, catalog: Catalog, rng: StdRng) -> Self {
        Self {
            store,
            catalog,
            rng: Mutex::new(rng),
            dungeon_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &DungeonStore {
        &self.store
    }

    fn lock_rng(&self) -> Result<std::sync::MutexGuard<'_, StdRng>, DungeonError> {
        self.rng
            .lock()
            .map_err(|_| DungeonError::Internal("rng lock poisoned".into()))
    }

    fn dungeon_lock(&self, dungeon_id: &str) -> Result<Arc<Mutex<()>>, DungeonError> {
        let mut locks = self
            .dungeon_locks
            .lock()
            .map_err(|_| DungeonError::Internal("dungeon lock table poisoned".into()))?;
        Ok(locks
            .entry(dungeon_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone())
    }

    /// Drop the table entry once no other action holds or waits on it. Clones are only
    /// handed out under the table lock, so a count of one means the table's own copy.
    fn release_dungeon_lock(&self, dungeon_id: &str) {
        if let Ok(mut locks) = self.dungeon_locks.lock() {
            if locks
                .get(dungeon_id)
                .map_or(false, |l| Arc::strong_count(l) == 1)
            {
                locks.remove(dungeon_id);
            }
        }
    }

    fn record_id(kind: &str, raw: &str) -> Result<String, DungeonError> {
        validate_record_id(raw).map_err(|e| DungeonError::NotFound(format!("{}: {}", kind, e)))
    }

    /// Run `action` against a session and its dungeon under the dungeon's lock. The
    /// closure reports whether anything changed; unchanged records are not written.
    fn with_session<T>(
        &self,
        game_id: &str,
        action: impl FnOnce(&mut GameState, &mut Dungeon) -> Result<(T, bool), DungeonError>,
    ) -> Result<T, DungeonError> {
        let game_id = Self::record_id("game", game_id)?;
        let dungeon_id = self.store.get_game(&game_id)?.dungeon_id;
        let lock = self.dungeon_lock(&dungeon_id)?;
        let result = match lock.lock() {
            Ok(_guard) => self.run_locked(&game_id, &dungeon_id, action),
            Err(_) => Err(DungeonError::Internal("dungeon lock poisoned".into())),
        };
        drop(lock);
        self.release_dungeon_lock(&dungeon_id);
        result
    }

    fn run_locked<T>(
        &self,
        game_id: &str,
        dungeon_id: &str,
        action: impl FnOnce(&mut GameState, &mut Dungeon) -> Result<(T, bool), DungeonError>,
    ) -> Result<T, DungeonError> {
        let mut state = self.store.get_game(game_id)?;
        let mut dungeon = self.store.get_dungeon(dungeon_id)?;
        let (out, changed) = action(&mut state, &mut dungeon)?;
        if changed {
            self.store.put_pair(dungeon, state)?;
        }
        Ok(out)
    }

    pub fn generate_dungeon(&self, request: &DungeonRequest) -> Result<Dungeon, DungeonError> {
        let seed: u64 = self.lock_rng()?.gen();
        self.generate_dungeon_with_seed(request, seed)
    }

    pub fn generate_dungeon_with_seed(
        &self,
        request: &DungeonRequest,
        seed: u64,
    ) -> Result<Dungeon, DungeonError> {
        let dungeon = assemble(&self.catalog, request, seed)?;
        self.store.put_dungeon(dungeon.clone())?;
        Ok(dungeon)
    }

    pub fn start_game(
        &self,
        dungeon_id: &str,
        class: &str,
        gender: &str,
    ) -> Result<GameState, DungeonError> {
        let (Some(class), Some(gender)) = (HeroClass::parse(class), Gender::parse(gender)) else {
            return Err(DungeonError::invalid(format!(
                "unknown hero '{}/{}'",
                escape_log(class),
                escape_log(gender)
            )));
        };
        let hero = self.catalog.hero(class, gender).ok_or_else(|| {
            DungeonError::invalid(format!(
                "no hero template for {}/{}",
                class.as_str(),
                gender.as_str()
            ))
        })?;
        let dungeon = self.get_dungeon(dungeon_id)?;
        let state = GameState::start(uuid::Uuid::new_v4().to_string(), &dungeon, hero);
        self.store.put_game(state.clone())?;
        info!(
            "started game {} in dungeon {} as {} {}",
            state.id,
            dungeon.id,
            gender.as_str(),
            class.as_str()
        );
        Ok(state)
    }

    pub fn move_player(&self, game_id: &str, direction: Direction) -> Result<MoveOutcome, DungeonError> {
        self.with_session(game_id, |state, dungeon| {
            let out = movement::move_player(state, dungeon, &self.catalog, direction);
            let changed = out.success;
            Ok((out, changed))
        })
    }

    pub fn combat_action(
        &self,
        game_id: &str,
        action: CombatAction,
    ) -> Result<CombatOutcome, DungeonError> {
        self.with_session(game_id, |state, dungeon| {
            let mut rng = self.lock_rng()?;
            let out = combat::resolve(state, dungeon, action, &mut *rng)?;
            if out.player_defeated {
                info!("game {} ended: player defeated", state.id);
            }
            Ok((out, true))
        })
    }

    pub fn open_chest(&self, game_id: &str) -> Result<ActionOutcome, DungeonError> {
        self.with_session(game_id, |state, dungeon| {
            let out = items::open_chest(state, dungeon);
            let changed = out.success;
            Ok((out, changed))
        })
    }

    pub fn use_item(&self, game_id: &str, item_name: &str) -> Result<ActionOutcome, DungeonError> {
        self.with_session(game_id, |state, _| {
            let out = items::use_item(state, &self.catalog, item_name);
            let changed = out.success;
            Ok((out, changed))
        })
    }

    pub fn equip(&self, game_id: &str, item_name: &str) -> Result<ActionOutcome, DungeonError> {
        self.with_session(game_id, |state, _| {
            let out = items::equip(state, &self.catalog, item_name);
            let changed = out.success;
            Ok((out, changed))
        })
    }

    pub fn get_game(&self, game_id: &str) -> Result<GameState, DungeonError> {
        self.store.get_game(&Self::record_id("game", game_id)?)
    }

    pub fn get_dungeon(&self, dungeon_id: &str) -> Result<Dungeon, DungeonError> {
        self.store.get_dungeon(&Self::record_id("dungeon", dungeon_id)?)
    }

    pub fn list_heroes(&self) -> &[HeroTemplate] {
        self.catalog.heroes()
    }

    pub fn list_dungeons(&self) -> Result<Vec<String>, DungeonError> {
        self.store.list_dungeon_ids()
    }

    /// Fog-of-war map followed by the status line.
    pub fn render_game(&self, game_id: &str) -> Result<String, DungeonError> {
        let state = self.get_game(game_id)?;
        let dungeon = self.store.get_dungeon(&state.dungeon_id)?;
        debug!("render {} ({} tiles discovered)", state.id, state.discovered_count());
        Ok(format!(
            "{}{}",
            render::render_map(&dungeon, &state),
            render::status_line(&state)
        ))
    }
}
