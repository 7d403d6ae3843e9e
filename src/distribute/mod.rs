//! Distribution staging
//!
//! Installs final artifacts at the publish location, always replacing stale
//! prior output so exactly one version of an artifact exists after staging.
//!
//! The xcframework goes through a tar round-trip: the staged bundle is
//! archived, the archive re-extracted at the publish root, then deleted. The
//! round-trip normalizes permissions and metadata; the extraction is checked
//! before the archive is removed, and the archive is kept on disk if the
//! check fails.
//!
//! Single files (the Frank plugin fat lib, dylibs) are straight copies,
//! preceded by an existence check whose error carries a remediation hint
//! naming the forgotten build step. Published files get an informational
//! SHA-256 digest line.

use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tar::{Archive, Builder};

/// Errors staging artifacts to the publish location.
#[derive(Debug, thiserror::Error)]
pub enum DistributeError {
    /// Source artifact absent; `hint` names the build step to run first.
    #[error("{path} does not exist. {hint}")]
    MissingArtifact { path: PathBuf, hint: String },

    /// The archive extracted to nothing; the transport archive is kept.
    #[error("Extraction left no bundle at '{path}'; transport archive kept at '{archive}'")]
    ExtractionIncomplete { path: PathBuf, archive: PathBuf },

    #[error("Failed to {step} at '{path}': {source}")]
    Io {
        step: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn io_step<'a>(step: &'static str, path: &'a Path) -> impl FnOnce(io::Error) -> DistributeError + 'a {
    move |source| DistributeError::Io {
        step,
        path: path.to_path_buf(),
        source,
    }
}

/// Publish a staged bundle directory via the tar round-trip.
///
/// `source` is the staged bundle (e.g. `.../Debug-combined/calabash.xcframework`);
/// it is re-created as `<publish_dir>/<bundle name>`.
pub fn publish_bundle(source: &Path, publish_dir: &Path) -> Result<PathBuf, DistributeError> {
    let name = source
        .file_name()
        .ok_or_else(|| DistributeError::Io {
            step: "resolve bundle name",
            path: source.to_path_buf(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "source has no file name"),
        })?
        .to_string_lossy()
        .into_owned();

    if !source.is_dir() {
        return Err(DistributeError::MissingArtifact {
            path: source.to_path_buf(),
            hint: "Did you forget to assemble the xcframework?".to_string(),
        });
    }

    println!("INFO: staging '{}' to '{}'", source.display(), publish_dir.display());
    fs::create_dir_all(publish_dir).map_err(io_step("create publish dir", publish_dir))?;

    let published = publish_dir.join(&name);
    if published.is_dir() {
        println!("INFO: removing old {}", name);
        fs::remove_dir_all(&published).map_err(io_step("remove stale bundle", &published))?;
    }

    let archive_path = publish_dir.join(format!("{}.tar", name));
    if archive_path.exists() {
        println!("INFO: removing old {}.tar", name);
        fs::remove_file(&archive_path).map_err(io_step("remove stale archive", &archive_path))?;
    }

    println!("INFO: making a tarball of {}", source.display());
    let archive_file = File::create(&archive_path).map_err(io_step("create archive", &archive_path))?;
    let mut builder = Builder::new(archive_file);
    // the bundle's symlink chain must survive the round-trip
    builder.follow_symlinks(false);
    builder
        .append_dir_all(&name, source)
        .map_err(io_step("write archive", &archive_path))?;
    builder
        .finish()
        .map_err(io_step("write archive", &archive_path))?;

    println!("INFO: extracting {} from tarball", name);
    let archive_file = File::open(&archive_path).map_err(io_step("open archive", &archive_path))?;
    Archive::new(archive_file)
        .unpack(publish_dir)
        .map_err(io_step("extract archive", &archive_path))?;

    if !published.is_dir() {
        return Err(DistributeError::ExtractionIncomplete {
            path: published,
            archive: archive_path,
        });
    }

    println!("INFO: cleaning up");
    fs::remove_file(&archive_path).map_err(io_step("remove archive", &archive_path))?;

    Ok(published)
}

/// Publish a single file, replacing any stale copy at `target`.
///
/// `hint` names the build step the operator likely forgot when `source` is
/// absent (e.g. "Did you forget to run `make frank`?").
pub fn publish_file(source: &Path, target: &Path, hint: &str) -> Result<(), DistributeError> {
    if !source.exists() {
        return Err(DistributeError::MissingArtifact {
            path: source.to_path_buf(),
            hint: hint.to_string(),
        });
    }

    if target.exists() {
        println!("INFO: removing old {}", target.display());
        fs::remove_file(target).map_err(io_step("remove stale file", target))?;
    }

    println!("INFO: staging '{}' to '{}'", source.display(), target.display());
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(io_step("create publish dir", parent))?;
    }
    fs::copy(source, target).map_err(io_step("copy artifact", target))?;

    digest_line(target);
    Ok(())
}

/// Recreate `target_dir` and copy each source file into it.
///
/// Callers must have validated all sources first: a missing source here means
/// the stale directory was already removed.
pub fn publish_files(sources: &[PathBuf], target_dir: &Path) -> Result<(), DistributeError> {
    if target_dir.is_dir() {
        println!("INFO: removing old {}", target_dir.display());
        fs::remove_dir_all(target_dir).map_err(io_step("remove stale dir", target_dir))?;
    }
    fs::create_dir_all(target_dir).map_err(io_step("create publish dir", target_dir))?;

    for source in sources {
        let name = source
            .file_name()
            .ok_or_else(|| DistributeError::Io {
                step: "resolve artifact name",
                path: source.clone(),
                source: io::Error::new(io::ErrorKind::InvalidInput, "source has no file name"),
            })?;
        let target = target_dir.join(name);
        println!("INFO: staging '{}' to '{}'", source.display(), target_dir.display());
        fs::copy(source, &target).map_err(io_step("copy artifact", &target))?;
        digest_line(&target);
    }
    Ok(())
}

/// Informational SHA-256 of a published file; never gates.
fn digest_line(path: &Path) {
    match fs::read(path) {
        Ok(bytes) => {
            let digest = hex::encode(Sha256::digest(&bytes));
            println!("INFO: sha256 {}  {}", digest, path.display());
        }
        Err(e) => eprintln!("WARN: could not digest '{}': {}", path.display(), e),
    }
}
