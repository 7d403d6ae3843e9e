//! Framework bundle assembly
//!
//! Lays out the versioned framework bundle: `Versions/A/{Headers,Resources}`,
//! the installed fat binary, and the canonical symlink chain
//! (`Versions/Current -> A`, top-level `<product>`, `Headers`, `Resources`).
//! The version-reporting executable is installed into Resources and executed
//! from inside the bundle; its reported version gains a second
//! `Versions/<version> -> A` alias so both the symbolic and the semantic name
//! resolve to the same content. The installed binary is then verified against
//! the platform's required architecture set.
//!
//! Assembly is never incremental: a pre-existing bundle at the target path is
//! deleted first. On failure the partial directory is left in place for
//! postmortem inspection.

mod fsutil;

pub use fsutil::{copy_dir_contents, replace_symlink};

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::config::Layout;
use crate::exec::{ExecError, ToolRunner};
use crate::lipo::{Lipo, LipoError};
use crate::locate::Platform;

/// Errors assembling a framework bundle.
#[derive(Debug, thiserror::Error)]
pub enum FrameworkError {
    /// The library to install is absent; usually a forgotten build step.
    #[error("Library does not exist: could not find '{path}'")]
    MissingLibrary { path: PathBuf },

    /// The library exists but is zero bytes; an interrupted build step.
    #[error("Library is empty: '{path}'")]
    EmptyLibrary { path: PathBuf },

    #[error("Headers directory does not exist: '{path}'")]
    MissingHeaders { path: PathBuf },

    #[error("Version tool does not exist: '{path}'")]
    MissingVersionTool { path: PathBuf },

    #[error("Version tool '{tool}' failed (exit {code}): {message}")]
    VersionProbeFailed {
        tool: String,
        code: i32,
        message: String,
    },

    #[error("Failed to {step} at '{path}': {source}")]
    Io {
        step: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Lipo(#[from] LipoError),

    #[error(transparent)]
    Exec(#[from] ExecError),
}

fn io_step<'a>(step: &'static str, path: &'a Path) -> impl FnOnce(io::Error) -> FrameworkError + 'a {
    move |source| FrameworkError::Io {
        step,
        path: path.to_path_buf(),
        source,
    }
}

/// Inputs for one framework bundle.
#[derive(Debug, Clone)]
pub struct FrameworkSpec {
    /// Bundle directory, e.g. `.../iphoneos/calabash.framework`
    pub target_dir: PathBuf,
    pub platform: Platform,
    /// Library binary to install as the framework product
    pub library: PathBuf,
    /// Architectures the installed binary must contain
    pub arches: Vec<String>,
}

/// Assembles versioned framework bundles against a [`Layout`].
pub struct FrameworkAssembler<'a> {
    runner: &'a dyn ToolRunner,
    layout: &'a Layout,
}

impl<'a> FrameworkAssembler<'a> {
    pub fn new(runner: &'a dyn ToolRunner, layout: &'a Layout) -> Self {
        Self { runner, layout }
    }

    /// Build the bundle described by `spec` from scratch and verify it.
    pub fn assemble(&self, spec: &FrameworkSpec) -> Result<(), FrameworkError> {
        let dir = &spec.target_dir;
        let product = self.layout.product_name();

        // Stale symlinks or headers from a previous run must never survive.
        if dir.exists() {
            fs::remove_dir_all(dir).map_err(io_step("remove stale bundle", dir))?;
        }

        println!("INFO: making framework at '{}'", dir.display());
        println!(
            "INFO: installing lib '{}' to '{}'",
            spec.library.display(),
            dir.display()
        );

        if !spec.library.exists() {
            eprintln!("FAIL: lib does not exist");
            return Err(FrameworkError::MissingLibrary {
                path: spec.library.clone(),
            });
        }
        let lib_meta =
            fs::metadata(&spec.library).map_err(io_step("stat library", &spec.library))?;
        if lib_meta.len() == 0 {
            eprintln!("FAIL: lib is empty");
            return Err(FrameworkError::EmptyLibrary {
                path: spec.library.clone(),
            });
        }

        let version_a = dir.join("Versions/A");
        let headers = version_a.join("Headers");
        fs::create_dir_all(&headers).map_err(io_step("create headers dir", &headers))?;

        let installed = version_a.join(product);
        fs::copy(&spec.library, &installed).map_err(io_step("install library", &installed))?;

        let headers_src = self.layout.headers_dir();
        if !headers_src.is_dir() {
            return Err(FrameworkError::MissingHeaders { path: headers_src });
        }
        copy_dir_contents(&headers_src, &headers).map_err(io_step("copy headers", &headers))?;

        replace_symlink(Path::new("A"), &dir.join("Versions/Current"))
            .map_err(io_step("link Versions/Current", dir))?;
        replace_symlink(
            &Path::new("Versions/Current").join(product),
            &dir.join(product),
        )
        .map_err(io_step("link product", dir))?;
        replace_symlink(Path::new("Versions/Current/Headers"), &dir.join("Headers"))
            .map_err(io_step("link Headers", dir))?;

        self.install_resources(dir)?;
        let version = self.probe_version(dir)?;
        println!("INFO: framework version is '{}'", version);
        replace_symlink(Path::new("A"), &dir.join("Versions").join(&version))
            .map_err(io_step("link semantic version", dir))?;

        println!("INFO: verifying framework");
        let lipo = Lipo::new(self.runner);
        lipo.verify_arches(&dir.join(product), spec.platform.sdk(), &spec.arches)?;

        Ok(())
    }

    /// Install the version-reporting executable under `Versions/A/Resources`
    /// and link the top-level `Resources`.
    fn install_resources(&self, dir: &Path) -> Result<(), FrameworkError> {
        println!("INFO: installing Resources to '{}'", dir.display());

        let tool = self.layout.version_tool();
        if !tool.exists() {
            return Err(FrameworkError::MissingVersionTool { path: tool });
        }

        let resources = dir.join("Versions/A/Resources");
        fs::create_dir_all(&resources).map_err(io_step("create resources dir", &resources))?;

        let tool_name = tool
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("version"));
        let installed = resources.join(tool_name);
        fs::copy(&tool, &installed).map_err(io_step("install version tool", &installed))?;

        replace_symlink(Path::new("Versions/Current/Resources"), &dir.join("Resources"))
            .map_err(io_step("link Resources", dir))?;
        Ok(())
    }

    /// Execute the installed version tool from inside the bundle.
    fn probe_version(&self, dir: &Path) -> Result<String, FrameworkError> {
        let result = self.runner.run("Resources/version", &[], Some(dir))?;
        let version = result.stdout.trim().to_string();
        if !result.success() || version.is_empty() {
            return Err(FrameworkError::VersionProbeFailed {
                tool: dir.join("Resources/version").display().to_string(),
                code: result.code,
                message: result.message().to_string(),
            });
        }
        Ok(version)
    }
}
