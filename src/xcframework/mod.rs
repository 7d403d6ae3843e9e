//! Multi-platform container assembly
//!
//! Builds `calabash.xcframework`: one framework bundle per platform plus the
//! manifest describing which architecture set each platform carries. The
//! manifest starts as the static template; after each platform's framework
//! completes, its entry is found by identifier scan and its architecture list
//! appended. Failure of any platform aborts the whole operation with no
//! rollback of platforms already built; a re-run starts from scratch.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::config::Layout;
use crate::exec::ToolRunner;
use crate::framework::{FrameworkAssembler, FrameworkError, FrameworkSpec};
use crate::locate::Platform;
use crate::manifest::{ManifestError, XcframeworkManifest};

/// Errors assembling the container.
#[derive(Debug, thiserror::Error)]
pub enum XcframeworkError {
    #[error("Manifest template does not exist: '{path}'")]
    MissingTemplate { path: PathBuf },

    #[error("Failed to {step} at '{path}': {source}")]
    Io {
        step: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Framework(#[from] FrameworkError),

    #[error(transparent)]
    Manifest(#[from] ManifestError),
}

/// One platform's contribution to the container.
#[derive(Debug, Clone)]
pub struct PlatformSpec {
    /// Manifest entry identifier and sub-directory name (`iphoneos`, ...)
    pub identifier: String,
    pub platform: Platform,
    /// Library binary installed into this platform's framework
    pub library: PathBuf,
    /// Architectures required of (and recorded for) this platform
    pub arches: Vec<String>,
}

impl PlatformSpec {
    pub fn new(platform: Platform, library: PathBuf, arches: Vec<String>) -> Self {
        Self {
            identifier: platform.sdk().to_string(),
            platform,
            library,
            arches,
        }
    }
}

/// Assembles the xcframework container.
pub struct XcframeworkAssembler<'a> {
    runner: &'a dyn ToolRunner,
    layout: &'a Layout,
}

impl<'a> XcframeworkAssembler<'a> {
    pub fn new(runner: &'a dyn ToolRunner, layout: &'a Layout) -> Self {
        Self { runner, layout }
    }

    /// Build the container at `target_dir` from `specs`, in the given order.
    pub fn assemble(&self, target_dir: &Path, specs: &[PlatformSpec]) -> Result<(), XcframeworkError> {
        println!("INFO: making xcframework at '{}'", target_dir.display());

        fs::create_dir_all(target_dir).map_err(|source| XcframeworkError::Io {
            step: "create xcframework dir",
            path: target_dir.to_path_buf(),
            source,
        })?;

        let template = self.layout.manifest_template();
        if !template.exists() {
            return Err(XcframeworkError::MissingTemplate { path: template });
        }
        let manifest_path = target_dir.join("Info.plist");
        fs::copy(&template, &manifest_path).map_err(|source| XcframeworkError::Io {
            step: "install manifest template",
            path: manifest_path.clone(),
            source,
        })?;

        let framework = FrameworkAssembler::new(self.runner, self.layout);

        for spec in specs {
            println!("INFO: making framework for '{}'", spec.identifier);
            framework.assemble(&FrameworkSpec {
                target_dir: target_dir
                    .join(&spec.identifier)
                    .join(format!("{}.framework", self.layout.product_name())),
                platform: spec.platform,
                library: spec.library.clone(),
                arches: spec.arches.clone(),
            })?;

            let mut manifest = XcframeworkManifest::load(&manifest_path)?;
            let index = manifest.entry_index(&spec.identifier)?;
            println!(
                "INFO: found platform '{}' at index {} in '{}'",
                spec.identifier,
                index,
                manifest_path.display()
            );
            manifest.append_arches(&spec.identifier, &spec.arches)?;
            manifest.save(&manifest_path)?;
        }

        Ok(())
    }
}
