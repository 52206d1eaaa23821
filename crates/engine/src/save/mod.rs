mod atomic_io;
mod codec;
mod hashing;
mod types;

pub use codec::{decode_save, encode_save, read_save, write_save};
pub use types::{SaveError, SaveGame, SavePayload, SAVE_VERSION};
