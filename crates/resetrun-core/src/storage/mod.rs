mod blob;
mod config;
mod local;

pub use blob::{BlobStore, FileBlobStore, MemoryBlobStore};
pub use config::{AccountConfig, Config, RemoteConfig};
pub use local::{LocalState, PREFERENCES_KEY, PROFILE_CACHE_KEY, RUN_STORE_KEY};

use std::path::PathBuf;

use crate::error::StorageError;

/// Returns the data directory, creating it if needed.
///
/// `RESETRUN_DATA_DIR` wins when set. Otherwise `~/.config/resetrun[-dev]/`,
/// with the `-dev` suffix selected by `RESETRUN_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, StorageError> {
    let dir = match std::env::var_os("RESETRUN_DATA_DIR") {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("RESETRUN_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("resetrun-dev")
            } else {
                base_dir.join("resetrun")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| StorageError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
