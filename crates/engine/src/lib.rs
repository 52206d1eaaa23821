use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod command;
pub mod render;
pub mod save;
pub mod world;

pub use command::{
    action_for_command, Command, CommandParseError, CommandRegistry, CommandRegistryError, Heading,
};
pub use render::{tile_view, world_bounds, LevelRenderer, TileView};
pub use save::{
    decode_save, encode_save, read_save, write_save, SaveError, SaveGame, SavePayload,
    SAVE_VERSION,
};
pub use world::{
    execute, Action, ActionError, Actor, ActorId, ActorKind, ActorSchedule, ActorTime, Actors,
    BiRelation, Building, Buildings, Creature, CreatureActor, CreatureId, CreatureLocation,
    Creatures, Direction, InvariantViolation, Layer, Level, Location, Position, Registry,
    RelationError, RelativeDirection, World,
};

pub const ROOT_ENV_VAR: &str = "DUNGEON_ROOT";

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub root: PathBuf,
    pub saves_dir: PathBuf,
}

impl AppPaths {
    pub fn save_file(&self, slot: &str) -> PathBuf {
        self.saves_dir.join(format!("{slot}.save.json"))
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to resolve current executable path: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error("current executable path has no parent directory: {0}")]
    ExeHasNoParent(PathBuf),
    #[error("failed to create saves directory at {path}: {source}")]
    CreateSavesDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(
        "DUNGEON_ROOT is set but does not point to a valid project root: {path}\n\
A valid root must contain Cargo.toml and crates/."
    )]
    InvalidEnvRoot { path: PathBuf },
    #[error(
        "Could not detect project root by walking upward from executable directory: {start_dir}\n\
Expected a directory containing Cargo.toml and crates/.\n\
Set {env_var} explicitly, for example:\n\
Bash/zsh: export {env_var}=\"/path/to/dungeon\""
    )]
    RootNotFound {
        start_dir: PathBuf,
        env_var: &'static str,
    },
}

pub fn resolve_app_paths() -> Result<AppPaths, StartupError> {
    let root = resolve_root()?;
    app_paths_at(root)
}

pub fn app_paths_at(root: PathBuf) -> Result<AppPaths, StartupError> {
    let saves_dir = root.join("saves");
    fs::create_dir_all(&saves_dir).map_err(|source| StartupError::CreateSavesDir {
        path: saves_dir.clone(),
        source,
    })?;

    Ok(AppPaths { root, saves_dir })
}

fn resolve_root() -> Result<PathBuf, StartupError> {
    match env::var(ROOT_ENV_VAR) {
        Ok(value) => {
            let raw = PathBuf::from(value);
            let normalized = normalize_path(&raw);
            if is_repo_marker(&normalized) {
                Ok(normalized)
            } else {
                Err(StartupError::InvalidEnvRoot { path: normalized })
            }
        }
        Err(env::VarError::NotPresent) => {
            let exe = env::current_exe().map_err(StartupError::CurrentExe)?;
            let exe_dir = exe
                .parent()
                .map(Path::to_path_buf)
                .ok_or_else(|| StartupError::ExeHasNoParent(exe.clone()))?;

            for candidate in exe_dir.ancestors() {
                if is_repo_marker(candidate) {
                    return Ok(normalize_path(candidate));
                }
            }

            Err(StartupError::RootNotFound {
                start_dir: normalize_path(&exe_dir),
                env_var: ROOT_ENV_VAR,
            })
        }
        Err(source) => Err(StartupError::EnvVar {
            var: ROOT_ENV_VAR,
            source,
        }),
    }
}

fn is_repo_marker(path: &Path) -> bool {
    path.join("Cargo.toml").is_file() && path.join("crates").is_dir()
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
