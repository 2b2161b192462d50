//! Destination folder preparation.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{debug, info};

/// Errors raised while preparing a destination directory.
#[derive(Debug, Error)]
pub enum FolderError {
    /// The directory (or one of its parents) could not be created.
    #[error("failed to create folder {path}: {source}")]
    Create {
        /// Directory that was being created.
        path: PathBuf,
        /// Underlying filesystem error.
        #[source]
        source: std::io::Error,
    },

    /// Something other than a directory already occupies the path.
    #[error("destination {path} exists but is not a directory")]
    NotADirectory {
        /// The offending path.
        path: PathBuf,
    },
}

/// Ensures `path` exists as a directory, creating it and any missing parents.
///
/// Returns the same path so callers can chain it straight into writes.
///
/// # Errors
///
/// Returns [`FolderError::NotADirectory`] when a file sits at `path`, and
/// [`FolderError::Create`] when the directory chain cannot be created.
pub fn resolve_folder(path: &Path) -> Result<PathBuf, FolderError> {
    if path.is_dir() {
        debug!(path = %path.display(), "destination folder exists");
        return Ok(path.to_path_buf());
    }
    if path.exists() {
        return Err(FolderError::NotADirectory {
            path: path.to_path_buf(),
        });
    }

    std::fs::create_dir_all(path).map_err(|source| FolderError::Create {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), "created destination folder");
    Ok(path.to_path_buf())
}

/// Joins a `YYYY-MM-DD` folder for `date` onto `base`.
#[must_use]
pub fn dated_folder(base: &Path, date: NaiveDate) -> PathBuf {
    base.join(date.format("%Y-%m-%d").to_string())
}
