//! Typed xcframework manifest (Info.plist)
//!
//! The container manifest enumerates one library entry per platform with its
//! identifier and supported-architecture list. It starts life as a static,
//! platform-agnostic template whose entry ordering carries no meaning, so the
//! entry for a platform is always discovered by scanning identifiers rather
//! than assuming an index. Loaded and saved through the plist serializer;
//! no string-positional edits.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Errors reading, patching, or writing the manifest.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("Failed to load manifest '{path}': {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: plist::Error,
    },

    #[error("Failed to save manifest '{path}': {source}")]
    Save {
        path: PathBuf,
        #[source]
        source: plist::Error,
    },

    #[error("Couldn't find entry for platform '{identifier}' in the manifest")]
    PlatformEntryNotFound { identifier: String },
}

/// One `AvailableLibraries` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryEntry {
    #[serde(rename = "LibraryIdentifier")]
    pub identifier: String,

    /// Sub-framework path relative to the platform directory
    #[serde(rename = "LibraryPath")]
    pub library_path: String,

    #[serde(rename = "SupportedPlatform")]
    pub supported_platform: String,

    #[serde(rename = "SupportedArchitectures", default)]
    pub supported_architectures: Vec<String>,
}

/// The xcframework `Info.plist` document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XcframeworkManifest {
    #[serde(rename = "AvailableLibraries")]
    pub libraries: Vec<LibraryEntry>,

    #[serde(rename = "CFBundlePackageType")]
    pub package_type: String,

    #[serde(rename = "XCFrameworkFormatVersion")]
    pub format_version: String,
}

impl XcframeworkManifest {
    /// Load a manifest from a plist file (XML or binary).
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        plist::from_file(path).map_err(|source| ManifestError::Load {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Write the manifest back as XML.
    pub fn save(&self, path: &Path) -> Result<(), ManifestError> {
        plist::to_file_xml(path, self).map_err(|source| ManifestError::Save {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Index of the entry whose identifier matches `identifier`.
    ///
    /// Always a scan; template entry order is not guaranteed to match any
    /// iteration order elsewhere.
    pub fn entry_index(&self, identifier: &str) -> Result<usize, ManifestError> {
        self.libraries
            .iter()
            .position(|entry| entry.identifier == identifier)
            .ok_or_else(|| ManifestError::PlatformEntryNotFound {
                identifier: identifier.to_string(),
            })
    }

    /// Append `arches` to the architecture list of `identifier`'s entry.
    pub fn append_arches(&mut self, identifier: &str, arches: &[String]) -> Result<(), ManifestError> {
        let index = self.entry_index(identifier)?;
        self.libraries[index]
            .supported_architectures
            .extend(arches.iter().cloned());
        Ok(())
    }
}
