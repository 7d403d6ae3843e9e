//! Staging area management
//!
//! The staging area holds combined intermediates between the build step and
//! publication. It is wiped and recreated at the start of every assembly run;
//! there are no incremental or append semantics. Deletion and creation are
//! one unit from the caller's perspective.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Errors resetting the staging area.
#[derive(Debug, thiserror::Error)]
pub enum StagingError {
    #[error("Could not reset staging dir '{path}': {source}")]
    ResetFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Delete `path` recursively if present, then create it fresh.
///
/// Idempotent: any number of calls yields the same empty directory. If
/// deletion fails, creation is not attempted.
pub fn reset(path: &Path) -> Result<PathBuf, StagingError> {
    match fs::remove_dir_all(path) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(source) => {
            return Err(StagingError::ResetFailed {
                path: path.to_path_buf(),
                source,
            })
        }
    }

    fs::create_dir_all(path).map_err(|source| StagingError::ResetFailed {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(path.to_path_buf())
}
