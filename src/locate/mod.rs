//! Build artifact location
//!
//! Resolves and validates paths of externally-compiled libraries before any
//! combine or verify step consumes them. Missing inputs are operator errors
//! (a forgotten build step), so they get their own variants rather than a
//! generic I/O failure.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Target platform an artifact was compiled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Device,
    Simulator,
}

impl Platform {
    /// SDK identifier passed to `xcrun -sdk`.
    pub fn sdk(&self) -> &'static str {
        match self {
            Platform::Device => "iphoneos",
            Platform::Simulator => "iphonesimulator",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sdk())
    }
}

/// Errors locating a build artifact.
#[derive(Debug, thiserror::Error)]
pub enum LocateError {
    #[error("Expected directory '{directory}' to exist")]
    MissingDirectory { directory: PathBuf },

    #[error("Expected library at '{path}' to exist")]
    MissingArtifact { path: PathBuf },

    /// Zero-byte outputs are as useless as absent ones; the build step that
    /// should have produced them failed or was interrupted.
    #[error("Expected library at '{path}' to be non-empty")]
    EmptyArtifact { path: PathBuf },
}

/// An externally-produced binary, tagged with its platform and the
/// architectures it is expected to contain.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub path: PathBuf,
    pub platform: Platform,
    pub arches: Vec<String>,
}

impl Artifact {
    pub fn new(path: PathBuf, platform: Platform, arches: Vec<String>) -> Self {
        Self {
            path,
            platform,
            arches,
        }
    }
}

/// Resolve `directory/name`, failing fast if either is absent or the
/// artifact is empty.
///
/// No side effects; used identically for device libs, simulator libs, Frank
/// plugin libs, and dylibs.
pub fn locate(directory: &Path, name: &str) -> Result<PathBuf, LocateError> {
    if !directory.is_dir() {
        return Err(LocateError::MissingDirectory {
            directory: directory.to_path_buf(),
        });
    }

    let path = directory.join(name);
    let meta = match fs::metadata(&path) {
        Ok(meta) => meta,
        Err(_) => return Err(LocateError::MissingArtifact { path }),
    };
    if meta.is_file() && meta.len() == 0 {
        return Err(LocateError::EmptyArtifact { path });
    }
    Ok(path)
}

/// Locate an artifact and tag it with its platform and required arch set.
pub fn locate_artifact(
    directory: &Path,
    name: &str,
    platform: Platform,
    arches: Vec<String>,
) -> Result<Artifact, LocateError> {
    let path = locate(directory, name)?;
    Ok(Artifact::new(path, platform, arches))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_locate_existing_artifact() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("libcalabash-device.a"), b"lib").unwrap();

        let path = locate(dir.path(), "libcalabash-device.a").unwrap();
        assert_eq!(path, dir.path().join("libcalabash-device.a"));
    }

    #[test]
    fn test_locate_missing_directory() {
        let dir = TempDir::new().unwrap();
        let gone = dir.path().join("no-such-dir");

        let err = locate(&gone, "lib.a").unwrap_err();
        match err {
            LocateError::MissingDirectory { directory } => assert_eq!(directory, gone),
            other => panic!("expected MissingDirectory, got {:?}", other),
        }
    }

    #[test]
    fn test_locate_missing_artifact() {
        let dir = TempDir::new().unwrap();

        let err = locate(dir.path(), "lib.a").unwrap_err();
        match err {
            LocateError::MissingArtifact { path } => {
                assert_eq!(path, dir.path().join("lib.a"))
            }
            other => panic!("expected MissingArtifact, got {:?}", other),
        }
    }

    #[test]
    fn test_locate_rejects_empty_artifact() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("libcalabash-device.a"), b"").unwrap();

        let err = locate(dir.path(), "libcalabash-device.a").unwrap_err();
        match err {
            LocateError::EmptyArtifact { path } => {
                assert_eq!(path, dir.path().join("libcalabash-device.a"))
            }
            other => panic!("expected EmptyArtifact, got {:?}", other),
        }
    }

    #[test]
    fn test_locate_artifact_tags_platform_and_arches() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("libCalabashDynSim.dylib"), b"dylib").unwrap();

        let artifact = locate_artifact(
            dir.path(),
            "libCalabashDynSim.dylib",
            Platform::Simulator,
            vec!["arm64".to_string(), "x86_64".to_string()],
        )
        .unwrap();

        assert_eq!(artifact.platform, Platform::Simulator);
        assert_eq!(artifact.platform.sdk(), "iphonesimulator");
        assert_eq!(artifact.arches, vec!["arm64", "x86_64"]);
    }

    #[test]
    fn test_platform_sdk_identifiers() {
        assert_eq!(Platform::Device.sdk(), "iphoneos");
        assert_eq!(Platform::Simulator.to_string(), "iphonesimulator");
    }
}
