//! Packaging layout configuration
//!
//! Every conventional path the pipelines touch lives here as a named field
//! with a documented default, resolved against an injected root directory so
//! the whole pipeline can run against arbitrary working directories. An
//! optional `calabash-dist.toml` at the root (or an explicit `--config` path)
//! overrides individual fields.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Name of the optional override file looked up under the root.
pub const CONFIG_FILE_NAME: &str = "calabash-dist.toml";

/// Errors loading layout overrides.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Overrides deserialized from `calabash-dist.toml`. Absent fields keep the
/// built-in defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayoutOverrides {
    pub device_build_dir: Option<PathBuf>,
    pub simulator_build_dir: Option<PathBuf>,
    pub staging_dir: Option<PathBuf>,
    pub publish_dir: Option<PathBuf>,
    pub headers_dir: Option<PathBuf>,
    pub version_tool: Option<PathBuf>,
    pub manifest_template: Option<PathBuf>,
    pub device_lib: Option<String>,
    pub simulator_lib: Option<String>,
    pub device_frank_lib: Option<String>,
    pub simulator_frank_lib: Option<String>,
    pub device_dylib: Option<String>,
    pub simulator_dylib: Option<String>,
    pub product_name: Option<String>,
}

impl LayoutOverrides {
    /// Parse overrides from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Resolved packaging layout.
///
/// Defaults mirror the conventional `make` output locations:
/// device libs under `build/Debug-iphoneos`, simulator libs under
/// `build/Debug-iphonesimulator`, intermediates under `build/Debug-combined`,
/// published artifacts at the repository root.
#[derive(Debug, Clone)]
pub struct Layout {
    root: PathBuf,
    device_build_dir: PathBuf,
    simulator_build_dir: PathBuf,
    staging_dir: PathBuf,
    publish_dir: PathBuf,
    headers_dir: PathBuf,
    version_tool: PathBuf,
    manifest_template: PathBuf,
    device_lib: String,
    simulator_lib: String,
    device_frank_lib: String,
    simulator_frank_lib: String,
    device_dylib: String,
    simulator_dylib: String,
    product_name: String,
}

impl Layout {
    /// Layout with built-in defaults rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            device_build_dir: PathBuf::from("build/Debug-iphoneos"),
            simulator_build_dir: PathBuf::from("build/Debug-iphonesimulator"),
            staging_dir: PathBuf::from("build/Debug-combined"),
            publish_dir: PathBuf::from("."),
            headers_dir: PathBuf::from("build/Debug-iphoneos/calabashHeaders"),
            version_tool: PathBuf::from("build/Debug/version"),
            manifest_template: PathBuf::from("templates/XCFramework.Info.plist"),
            device_lib: "libcalabash-device.a".to_string(),
            simulator_lib: "libcalabash-simulator.a".to_string(),
            device_frank_lib: "libFrankCalabashDevice.a".to_string(),
            simulator_frank_lib: "libFrankCalabash.a".to_string(),
            device_dylib: "libCalabashDyn.dylib".to_string(),
            simulator_dylib: "libCalabashDynSim.dylib".to_string(),
            product_name: "calabash".to_string(),
        }
    }

    /// Load the layout for `root`, applying overrides from `config_path` if
    /// given, else from `<root>/calabash-dist.toml` when that file exists.
    pub fn load(root: impl Into<PathBuf>, config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let layout = Self::new(root);
        let overrides = match config_path {
            Some(path) => LayoutOverrides::from_file(path)?,
            None => {
                let default_path = layout.root.join(CONFIG_FILE_NAME);
                if default_path.exists() {
                    LayoutOverrides::from_file(&default_path)?
                } else {
                    LayoutOverrides::default()
                }
            }
        };
        Ok(layout.with_overrides(overrides))
    }

    /// Apply overrides onto this layout.
    pub fn with_overrides(mut self, overrides: LayoutOverrides) -> Self {
        macro_rules! take {
            ($field:ident) => {
                if let Some(value) = overrides.$field {
                    self.$field = value;
                }
            };
        }
        take!(device_build_dir);
        take!(simulator_build_dir);
        take!(staging_dir);
        take!(publish_dir);
        take!(headers_dir);
        take!(version_tool);
        take!(manifest_template);
        take!(device_lib);
        take!(simulator_lib);
        take!(device_frank_lib);
        take!(simulator_frank_lib);
        take!(device_dylib);
        take!(simulator_dylib);
        take!(product_name);
        self
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Framework/xcframework product name (`calabash`).
    pub fn product_name(&self) -> &str {
        &self.product_name
    }

    /// Build output directory for device (iphoneos) targets.
    pub fn device_build_dir(&self) -> PathBuf {
        self.resolve(&self.device_build_dir)
    }

    /// Build output directory for simulator (iphonesimulator) targets.
    pub fn simulator_build_dir(&self) -> PathBuf {
        self.resolve(&self.simulator_build_dir)
    }

    /// Scratch directory for combined intermediates.
    pub fn staging_dir(&self) -> PathBuf {
        self.resolve(&self.staging_dir)
    }

    /// Directory final artifacts are published to.
    pub fn publish_dir(&self) -> PathBuf {
        self.resolve(&self.publish_dir)
    }

    /// Exported headers installed into framework bundles.
    pub fn headers_dir(&self) -> PathBuf {
        self.resolve(&self.headers_dir)
    }

    /// Version-reporting executable installed into framework Resources.
    pub fn version_tool(&self) -> PathBuf {
        self.resolve(&self.version_tool)
    }

    /// Platform-agnostic xcframework Info.plist template.
    pub fn manifest_template(&self) -> PathBuf {
        self.resolve(&self.manifest_template)
    }

    pub fn device_lib_name(&self) -> &str {
        &self.device_lib
    }

    pub fn simulator_lib_name(&self) -> &str {
        &self.simulator_lib
    }

    pub fn device_frank_lib_name(&self) -> &str {
        &self.device_frank_lib
    }

    pub fn simulator_frank_lib_name(&self) -> &str {
        &self.simulator_frank_lib
    }

    pub fn device_dylib_name(&self) -> &str {
        &self.device_dylib
    }

    pub fn simulator_dylib_name(&self) -> &str {
        &self.simulator_dylib
    }

    /// Name of the combined Frank plugin library.
    pub fn combined_frank_lib_name(&self) -> &str {
        "libFrankCalabash.a"
    }

    /// `<staging>/<product>.xcframework`, assembled before publishing.
    pub fn staged_xcframework(&self) -> PathBuf {
        self.staging_dir()
            .join(format!("{}.xcframework", self.product_name))
    }

    /// Published dylib directory (`calabash-dylibs`).
    pub fn published_dylibs_dir(&self) -> PathBuf {
        self.publish_dir().join(format!("{}-dylibs", self.product_name))
    }

    /// Architectures expected in device builds.
    pub fn device_arches(&self) -> Vec<String> {
        vec!["arm64".to_string()]
    }

    /// Architectures expected in simulator builds.
    pub fn simulator_arches(&self) -> Vec<String> {
        vec!["arm64".to_string(), "x86_64".to_string()]
    }

    /// Arch set the combined Frank library is checked against.
    pub fn frank_verify_arches(&self) -> Vec<String> {
        ["x86_64", "armv7", "armv7s", "arm64"]
            .iter()
            .map(|a| a.to_string())
            .collect()
    }
}
