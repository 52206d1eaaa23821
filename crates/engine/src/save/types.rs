use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::world::{ActorSchedule, InvariantViolation, World};

pub const SAVE_VERSION: u32 = 1;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavePayload {
    pub world: World,
    pub schedule: ActorSchedule,
    pub current_time: u64,
}

/// On-disk envelope. `payload_sha256` covers the compact JSON of `payload`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveGame {
    pub save_version: u32,
    pub payload_sha256: String,
    pub payload: SavePayload,
}

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("encode save json: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("parse save json at {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("validation failed at save_version: expected {expected}, got {actual}")]
    VersionMismatch { expected: u32, actual: u32 },
    #[error("validation failed at payload_sha256: expected {expected}, got {actual}")]
    HashMismatch { expected: String, actual: String },
    #[error("validation failed at payload.world: {0}")]
    InvalidWorld(#[from] InvariantViolation),
    #[error("read save '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("write save '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
