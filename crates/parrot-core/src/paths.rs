//! Filesystem locations for parrot data.

use std::env;
use std::fs;
use std::path::PathBuf;

use thiserror::Error;

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "PARROT_DATA_DIR";

#[derive(Debug, Error)]
pub enum PathError {
    /// Could not determine the system data directory.
    #[error("Cannot determine system data directory")]
    NoDataDir,

    /// Failed to create a directory.
    #[error("Failed to create directory {path}: {reason}")]
    CreateFailed { path: PathBuf, reason: String },
}

/// Root data directory, created if missing.
///
/// `PARROT_DATA_DIR` wins over the platform data directory.
pub fn data_root() -> Result<PathBuf, PathError> {
    let root = match env::var(DATA_DIR_ENV) {
        Ok(path) if !path.trim().is_empty() => PathBuf::from(path),
        _ => dirs::data_dir()
            .ok_or(PathError::NoDataDir)?
            .join("parrot"),
    };

    if !root.exists() {
        fs::create_dir_all(&root).map_err(|e| PathError::CreateFailed {
            path: root.clone(),
            reason: e.to_string(),
        })?;
    }
    Ok(root)
}

/// Default SQLite database location.
pub fn database_path() -> Result<PathBuf, PathError> {
    Ok(data_root()?.join("parrot.db"))
}
