use std::num::ParseIntError;
use std::time::{SystemTime, UNIX_EPOCH};

use dungeon_engine::{
    resolve_app_paths, Actor, ActorKind, ActorSchedule, AppPaths, Building, Creature, Direction,
    Layer, Level, Location, RelationError, SavePayload, StartupError, World,
};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

const SAVE_SLOT_ENV_VAR: &str = "DUNGEON_SAVE_SLOT";
const MAX_TURNS_ENV_VAR: &str = "DUNGEON_MAX_TURNS";
const DEFAULT_SAVE_SLOT: &str = "quicksave";

const ROOM_WIDTH: i32 = 5;
const ROOM_HEIGHT: i32 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct GameConfig {
    pub(crate) save_slot: String,
    pub(crate) max_turns: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            save_slot: DEFAULT_SAVE_SLOT.to_string(),
            max_turns: None,
        }
    }
}

impl GameConfig {
    pub(crate) fn from_env() -> Result<Self, BootstrapError> {
        Self::from_vars(
            std::env::var(SAVE_SLOT_ENV_VAR).ok(),
            std::env::var(MAX_TURNS_ENV_VAR).ok(),
        )
    }

    fn from_vars(
        save_slot: Option<String>,
        max_turns: Option<String>,
    ) -> Result<Self, BootstrapError> {
        let mut config = Self::default();
        if let Some(slot) = save_slot.map(|raw| raw.trim().to_string()) {
            if !slot.is_empty() {
                config.save_slot = slot;
            }
        }
        if let Some(raw) = max_turns {
            let parsed = raw
                .trim()
                .parse::<u64>()
                .map_err(|source| BootstrapError::InvalidMaxTurns {
                    raw: raw.clone(),
                    source,
                })?;
            config.max_turns = Some(parsed);
        }
        Ok(config)
    }
}

#[derive(Debug, Error)]
pub(crate) enum BootstrapError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error("DUNGEON_MAX_TURNS must be a non-negative integer, got '{raw}': {source}")]
    InvalidMaxTurns {
        raw: String,
        #[source]
        source: ParseIntError,
    },
    #[error("failed to build starting world: {0}")]
    StartingWorld(#[from] RelationError),
}

pub(crate) struct AppWiring {
    pub(crate) paths: AppPaths,
    pub(crate) config: GameConfig,
    pub(crate) start: SavePayload,
}

pub(crate) fn build_app() -> Result<AppWiring, BootstrapError> {
    init_tracing();
    info!("=== Dungeon Startup ===");

    let paths = resolve_app_paths()?;
    let config = GameConfig::from_env()?;
    info!(
        root = %paths.root.display(),
        saves_dir = %paths.saves_dir.display(),
        save_slot = %config.save_slot,
        max_turns = ?config.max_turns,
        "config_resolved"
    );

    let start = starting_payload(now_ms())?;
    info!(
        actors = start.world.actors().len(),
        creatures = start.world.creatures().len(),
        scheduled = start.schedule.len(),
        "world_built"
    );

    Ok(AppWiring {
        paths,
        config,
        start,
    })
}

pub(crate) fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}

pub(crate) fn starting_payload(born_at_ms: u64) -> Result<SavePayload, RelationError> {
    let mut level = Level::new(born_at_ms);
    for y in 0..ROOM_HEIGHT {
        for x in 0..ROOM_WIDTH {
            let location = Location::new(x, y);
            level = level.set(
                Layer::Floor,
                location,
                Building::floor("flagstone", Direction::North, true),
            );
            let outer = [
                (Direction::West, x == 0),
                (Direction::East, x == ROOM_WIDTH - 1),
                (Direction::South, y == 0),
                (Direction::North, y == ROOM_HEIGHT - 1),
            ];
            for (direction, on_edge) in outer {
                if on_edge {
                    level = level.set(Layer::Wall(direction), location, Building::wall("brick"));
                }
            }
        }
    }
    let level = level
        .with_wall_between(Location::new(2, 0), Direction::North, Building::wall("brick"))
        .with_wall_between(
            Location::new(3, 1),
            Direction::East,
            Building::Wall {
                model: "door".to_string(),
                passable: true,
            },
        )
        .set(Layer::Column, Location::new(2, 2), Building::base("pillar"))
        .set(Layer::Ceiling, Location::new(2, 2), Building::base("vault"));

    let world = World::new(level);
    let (world, hero) = world.add_actor(Actor::new("hero", ActorKind::Player));
    let (world, sentry) = world.add_actor(Actor::new("sentry", ActorKind::Idle));
    let (world, _) = world.spawn_creature_at(
        Creature::new("knight", Direction::North),
        Location::new(0, 0),
        Some(hero),
    )?;
    let (world, _) = world.spawn_creature_at(
        Creature::new("skeleton", Direction::West),
        Location::new(ROOM_WIDTH - 1, ROOM_HEIGHT - 1),
        Some(sentry),
    )?;

    Ok(SavePayload {
        world: world.with_player(Some(hero)),
        schedule: ActorSchedule::new().add(hero, 0).add(sentry, 0),
        current_time: 0,
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}
