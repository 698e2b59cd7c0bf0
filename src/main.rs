//! Binary entrypoint for the dungeon-rpg CLI.
//!
//! Commands:
//! - `init` - write a starter `config.toml`
//! - `generate [-d <difficulty>] [-t <theme>] [--seed <n>]` - create and store a dungeon
//! - `start <dungeon> [--class <c>] [--gender <g>]` - begin a session
//! - `move <game> <direction>` / `attack <game>` / `flee <game>` - play
//! - `open <game>` / `use <game> <item>` / `equip <game> <item>` - inventory actions
//! - `show <game> [--json]` / `dungeon <id> [--json]` - inspect records
//! - `heroes` - list hero templates
//!
//! See the library crate docs for module-level details: `dungeon_rpg::`.
use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};

use dungeon_rpg::config::Config;
use dungeon_rpg::dungeon::{
    CombatAction, Direction, DungeonEngine, DungeonRequest, DungeonStore,
};

#[derive(Parser)]
#[command(name = "dungeon-rpg")]
#[command(about = "Procedural dungeon generator and turn-based rules engine")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init,
    /// Generate a new dungeon and store it
    Generate {
        /// Difficulty name (defaults to engine.default_difficulty)
        #[arg(short, long)]
        difficulty: Option<String>,
        /// Theme label; random when omitted
        #[arg(short, long)]
        theme: Option<String>,
        /// Generation seed for a reproducible layout
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Start a session in a stored dungeon
    Start {
        dungeon: String,
        #[arg(long, default_value = "knight")]
        class: String,
        #[arg(long, default_value = "female")]
        gender: String,
    },
    /// Move one step (north/south/east/west or n/s/e/w)
    Move { game: String, direction: String },
    /// Take a combat action (attack/flee or a/f/run)
    Fight { game: String, action: String },
    /// Attack the enemy you are fighting
    Attack { game: String },
    /// Try to run from the current fight
    Flee { game: String },
    /// Open the chest you are standing on
    Open { game: String },
    /// Drink a potion from your inventory
    Use { game: String, item: String },
    /// Equip a weapon or armor from your inventory
    Equip { game: String, item: String },
    /// Show the map and status of a session
    Show {
        game: String,
        #[arg(long)]
        json: bool,
    },
    /// Show a stored dungeon
    Dungeon {
        id: String,
        #[arg(long)]
        json: bool,
    },
    /// List hero classes and their base stats
    Heroes,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let pre_config = match cli.command {
        Commands::Init => None,
        _ => Config::load(&cli.config).await.ok(),
    };
    init_logging(&pre_config, cli.verbose);

    if let Commands::Init = cli.command {
        info!("Initializing new configuration");
        Config::create_default(&cli.config).await?;
        info!("Configuration file created at {}", cli.config);
        println!("Wrote {}", cli.config);
        return Ok(());
    }

    let config = match pre_config {
        Some(cfg) => cfg,
        None => {
            warn!("Could not load {}; using built-in defaults", cli.config);
            Config::default()
        }
    };
    config.validate()?;
    let engine = build_engine(&config)?;

    match cli.command {
        Commands::Init => {}
        Commands::Generate {
            difficulty,
            theme,
            seed,
        } => {
            let mut request = DungeonRequest::new(
                difficulty.unwrap_or_else(|| config.engine.default_difficulty.clone()),
            );
            if let Some(theme) = theme {
                request = request.with_theme(theme);
            }
            let dungeon = match seed {
                Some(seed) => engine.generate_dungeon_with_seed(&request, seed)?,
                None => engine.generate_dungeon(&request)?,
            };
            println!(
                "{} ({} {}, {}x{}, {} rooms, {} enemies, seed {})",
                dungeon.id,
                dungeon.difficulty,
                dungeon.theme,
                dungeon.width,
                dungeon.height,
                dungeon.rooms.len(),
                dungeon.enemies.len(),
                dungeon.seed
            );
        }
        Commands::Start {
            dungeon,
            class,
            gender,
        } => {
            let game = engine.start_game(&dungeon, &class, &gender)?;
            println!("{}", game.id);
            println!("{}", engine.render_game(&game.id)?);
        }
        Commands::Move { game, direction } => {
            let dir = Direction::parse(&direction)
                .ok_or_else(|| anyhow!("Unknown direction '{}'", direction))?;
            let outcome = engine.move_player(&game, dir)?;
            if !outcome.success {
                println!("Can't move: {}", outcome.message);
            } else if !outcome.message.is_empty() {
                println!("{}", outcome.message);
            }
            println!("{}", engine.render_game(&game)?);
        }
        Commands::Fight { game, action } => {
            let action = CombatAction::parse(&action)
                .ok_or_else(|| anyhow!("Unknown combat action '{}'", action))?;
            let outcome = engine.combat_action(&game, action)?;
            println!("{}", outcome.message);
        }
        Commands::Attack { game } => {
            let outcome = engine.combat_action(&game, CombatAction::Attack)?;
            println!("{}", outcome.message);
        }
        Commands::Flee { game } => {
            let outcome = engine.combat_action(&game, CombatAction::Flee)?;
            println!("{}", outcome.message);
        }
        Commands::Open { game } => {
            println!("{}", engine.open_chest(&game)?.message);
        }
        Commands::Use { game, item } => {
            println!("{}", engine.use_item(&game, &item)?.message);
        }
        Commands::Equip { game, item } => {
            println!("{}", engine.equip(&game, &item)?.message);
        }
        Commands::Show { game, json } => {
            if json {
                let state = engine.get_game(&game)?;
                println!("{}", serde_json::to_string_pretty(&state)?);
            } else {
                println!("{}", engine.render_game(&game)?);
                let state = engine.get_game(&game)?;
                if !state.inventory.is_empty() {
                    let names: Vec<&str> = state.inventory.iter().map(|i| i.name.as_str()).collect();
                    println!("Inventory: {}", names.join(", "));
                }
            }
        }
        Commands::Dungeon { id, json } => {
            let dungeon = engine.get_dungeon(&id)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&dungeon)?);
            } else {
                for row in dungeon.grid.rows() {
                    let line: String = row.iter().map(|t| t.glyph()).collect();
                    println!("{}", line);
                }
                println!(
                    "{} {} | doors {} chests {} keys {} treasures {} enemies {} traps {}",
                    dungeon.difficulty,
                    dungeon.theme,
                    dungeon.doors.len(),
                    dungeon.chests.len(),
                    dungeon.keys.len(),
                    dungeon.treasures.len(),
                    dungeon.enemies.len(),
                    dungeon.traps.len()
                );
            }
        }
        Commands::Heroes => {
            for hero in engine.list_heroes() {
                println!(
                    "{:<8} {:<6} hp {:>3} atk {:>2} def {:>2} mag {:>2} agi {:>2} dmg {}",
                    hero.class.as_str(),
                    hero.gender.as_str(),
                    hero.hp,
                    hero.attack,
                    hero.defense,
                    hero.magic,
                    hero.agility,
                    hero.dice
                );
            }
        }
    }

    Ok(())
}

fn build_engine(config: &Config) -> Result<DungeonEngine> {
    let store = DungeonStore::open(config.db_path())
        .map_err(|e| anyhow!("Failed to open store at {}: {}", config.db_path(), e))?;
    let catalog = config.catalog();
    Ok(match config.engine.seed {
        Some(seed) => DungeonEngine::with_seed(store, catalog, seed),
        None => DungeonEngine::new(store, catalog),
    })
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    // CLI verbosity overrides the configured level
    let base_level = match verbosity {
        0 => config
            .as_ref()
            .and_then(|c| c.logging.level.parse::<log::LevelFilter>().ok())
            .unwrap_or(log::LevelFilter::Warn),
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);
    let log_file = config
        .as_ref()
        .and_then(|c| c.logging.file.clone())
        .and_then(|path| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .ok()
        });
    if let Some(f) = log_file {
        let write_mutex = std::sync::Arc::new(std::sync::Mutex::new(f));
        // Echo to the console only when attached to a terminal
        let is_tty = atty::is(atty::Stream::Stderr);
        builder.format(move |fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            let line = format!("{} [{}] {}", ts, record.level(), record.args());
            if let Ok(mut guard) = write_mutex.lock() {
                let _ = writeln!(guard, "{}", line);
            }
            if is_tty {
                writeln!(fmt, "{}", line)
            } else {
                Ok(())
            }
        });
    } else {
        builder.format(|fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            writeln!(fmt, "{} [{}] {}", ts, record.level(), record.args())
        });
    }
    let _ = builder.try_init();
}
