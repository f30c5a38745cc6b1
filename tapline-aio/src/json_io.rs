// tapline-aio/src/json_io.rs
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tapline_common::error::Result;
use tracing::debug;

/// Writes serializable data to a JSON file (pretty-printed), atomically.
pub fn write_json_sync<T: Serialize>(path: &Path, data: &T) -> Result<()> {
    debug!("Sync Writing JSON to: {}", path.display());
    let json_bytes = serde_json::to_vec_pretty(data)?;
    crate::fs::atomic_write_file(path, &json_bytes)
}

/// Reads and deserializes data from a JSON file.
pub fn read_json_sync<T: DeserializeOwned>(path: &Path) -> Result<T> {
    debug!("Sync Reading JSON from: {}", path.display());
    let file = std::fs::File::open(path)?;
    let reader = std::io::BufReader::new(file);
    Ok(serde_json::from_reader(reader)?)
}

/// Like [`read_json_sync`], but a missing file yields `T::default()`.
pub fn read_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    if !path.is_file() {
        return Ok(T::default());
    }
    read_json_sync(path)
}
