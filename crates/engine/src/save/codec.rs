use std::fs;
use std::path::Path;

use tracing::info;

use super::atomic_io::write_text_atomic;
use super::hashing::sha256_hex;
use super::types::{SaveError, SaveGame, SavePayload, SAVE_VERSION};

pub fn encode_save(payload: &SavePayload) -> Result<String, SaveError> {
    let save = SaveGame {
        save_version: SAVE_VERSION,
        payload_sha256: payload_hash(payload)?,
        payload: payload.clone(),
    };
    serde_json::to_string_pretty(&save).map_err(SaveError::Encode)
}

pub fn decode_save(raw: &str) -> Result<SavePayload, SaveError> {
    let save = parse_save_game_json(raw)?;
    if save.save_version != SAVE_VERSION {
        return Err(SaveError::VersionMismatch {
            expected: SAVE_VERSION,
            actual: save.save_version,
        });
    }
    let actual = payload_hash(&save.payload)?;
    if actual != save.payload_sha256 {
        return Err(SaveError::HashMismatch {
            expected: save.payload_sha256,
            actual,
        });
    }
    save.payload.world.check_invariants()?;
    Ok(save.payload)
}

pub fn write_save(path: &Path, payload: &SavePayload) -> Result<(), SaveError> {
    let json = encode_save(payload)?;
    write_text_atomic(path, &json).map_err(|source| SaveError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    info!(
        path = %path.display(),
        bytes = json.len(),
        creatures = payload.world.creatures().len(),
        "save_written"
    );
    Ok(())
}

pub fn read_save(path: &Path) -> Result<SavePayload, SaveError> {
    let raw = fs::read_to_string(path).map_err(|source| SaveError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let payload = decode_save(&raw)?;
    info!(
        path = %path.display(),
        creatures = payload.world.creatures().len(),
        current_time = payload.current_time,
        "save_loaded"
    );
    Ok(payload)
}

fn payload_hash(payload: &SavePayload) -> Result<String, SaveError> {
    let compact = serde_json::to_vec(payload).map_err(SaveError::Encode)?;
    Ok(sha256_hex(&compact))
}

fn parse_save_game_json(raw: &str) -> Result<SaveGame, SaveError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    serde_path_to_error::deserialize::<_, SaveGame>(&mut deserializer).map_err(|error| {
        let path = error.path().to_string();
        SaveError::Parse {
            path: if path.is_empty() { ".".to_string() } else { path },
            source: error.into_inner(),
        }
    })
}
