//! # Dungeon RPG - procedural dungeons and a turn-based rules engine
//!
//! Generates grid dungeons (rooms, corridors, locked doors, keys, chests, treasures,
//! enemies and traps) from a difficulty profile and a seed, then arbitrates movement,
//! fog-of-war discovery and combat for play sessions persisted in sled.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dungeon_rpg::config::Config;
//! use dungeon_rpg::dungeon::{Direction, DungeonEngine, DungeonRequest, DungeonStore};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     let store = DungeonStore::open(config.db_path())?;
//!     let engine = DungeonEngine::new(store, config.catalog());
//!
//!     let dungeon = engine.generate_dungeon(&DungeonRequest::new("easy"))?;
//!     let game = engine.start_game(&dungeon.id, "knight", "female")?;
//!     let outcome = engine.move_player(&game.id, Direction::East)?;
//!     println!("{}", outcome.message);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`dungeon`] - generation pipeline, rules engine and sled storage
//! - [`config`] - TOML configuration, difficulty profiles
//! - [`validation`] - input validation for themes and record ids
//! - [`logutil`] - single-line log helpers

pub mod config;
pub mod dungeon;
pub mod logutil;
pub mod validation;
