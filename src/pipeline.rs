//! End-to-end packaging pipelines
//!
//! One driver per CLI subcommand, each running fully sequentially: locate
//! inputs, combine/assemble, verify architectures, publish. Every external
//! tool call is synchronous and assumed deterministic; there are no retries
//! and no partial continuation. The first failure terminates the flow and is
//! surfaced with the failing step, path, and captured tool output.

use crate::config::{ConfigError, Layout};
use crate::distribute::{self, DistributeError};
use crate::exec::{ExecError, ToolRunner};
use crate::framework::FrameworkError;
use crate::lipo::{Lipo, LipoError};
use crate::locate::{self, Artifact, LocateError, Platform};
use crate::manifest::ManifestError;
use crate::staging::{self, StagingError};
use crate::xcframework::{PlatformSpec, XcframeworkAssembler, XcframeworkError};

/// Aggregate error for a pipeline run.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Locate(#[from] LocateError),

    #[error(transparent)]
    Lipo(#[from] LipoError),

    #[error(transparent)]
    Staging(#[from] StagingError),

    #[error(transparent)]
    Framework(#[from] FrameworkError),

    #[error(transparent)]
    Xcframework(#[from] XcframeworkError),

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Distribute(#[from] DistributeError),

    #[error(transparent)]
    Exec(#[from] ExecError),
}

impl PipelineError {
    /// Process exit status for this failure: the failing subprocess's exit
    /// status where one is known, otherwise 1.
    pub fn exit_code(&self) -> i32 {
        self.tool_code().unwrap_or(1)
    }

    fn tool_code(&self) -> Option<i32> {
        match self {
            PipelineError::Lipo(e) => e.tool_code(),
            PipelineError::Framework(e) => framework_tool_code(e),
            PipelineError::Xcframework(XcframeworkError::Framework(e)) => framework_tool_code(e),
            _ => None,
        }
    }
}

fn framework_tool_code(error: &FrameworkError) -> Option<i32> {
    match error {
        FrameworkError::Lipo(e) => e.tool_code(),
        FrameworkError::VersionProbeFailed { code, .. } => Some(*code),
        _ => None,
    }
}

/// Drives one packaging flow end to end against a layout and a tool runner.
pub struct Pipeline<'a> {
    layout: Layout,
    runner: &'a dyn ToolRunner,
}

impl<'a> Pipeline<'a> {
    pub fn new(layout: Layout, runner: &'a dyn ToolRunner) -> Self {
        Self { layout, runner }
    }

    /// `verify-framework`: assemble the xcframework in the staging area and
    /// publish it via the tar round-trip.
    pub fn framework(&self) -> Result<(), PipelineError> {
        staging::reset(&self.layout.staging_dir())?;

        let specs = vec![
            PlatformSpec::new(
                Platform::Device,
                self.layout
                    .device_build_dir()
                    .join(self.layout.device_lib_name()),
                self.layout.device_arches(),
            ),
            PlatformSpec::new(
                Platform::Simulator,
                self.layout
                    .simulator_build_dir()
                    .join(self.layout.simulator_lib_name()),
                self.layout.simulator_arches(),
            ),
        ];

        let staged = self.layout.staged_xcframework();
        XcframeworkAssembler::new(self.runner, &self.layout).assemble(&staged, &specs)?;

        distribute::publish_bundle(&staged, &self.layout.publish_dir())?;
        Ok(())
    }

    /// `verify-frank`: combine the device and simulator Frank plugin libs
    /// into a fat library, verify it, and publish it.
    pub fn frank(&self) -> Result<(), PipelineError> {
        let staging_dir = staging::reset(&self.layout.staging_dir())?;

        let device = locate::locate(
            &self.layout.device_build_dir(),
            self.layout.device_frank_lib_name(),
        )?;
        let simulator = locate::locate(
            &self.layout.simulator_build_dir(),
            self.layout.simulator_frank_lib_name(),
        )?;

        let combined = staging_dir.join(self.layout.combined_frank_lib_name());
        let lipo = Lipo::new(self.runner);
        lipo.combine(&[&device, &simulator], &combined)?;
        lipo.verify_arches(
            &combined,
            Platform::Simulator.sdk(),
            &self.layout.frank_verify_arches(),
        )?;

        let target = self
            .layout
            .publish_dir()
            .join(self.layout.combined_frank_lib_name());
        distribute::publish_file(&combined, &target, "Did you forget to run `make frank`?")?;
        Ok(())
    }

    /// `verify-dylibs`: verify both dylibs and publish them together.
    ///
    /// Both inputs are located before the publish directory is touched, so a
    /// missing dylib leaves any previously published set intact.
    pub fn dylibs(&self) -> Result<(), PipelineError> {
        let device = self.locate_device_dylib()?;
        let simulator = self.locate_simulator_dylib()?;

        let lipo = Lipo::new(self.runner);
        for artifact in [&device, &simulator] {
            lipo.verify_arches(&artifact.path, artifact.platform.sdk(), &artifact.arches)?;
        }

        distribute::publish_files(
            &[device.path, simulator.path],
            &self.layout.published_dylibs_dir(),
        )?;
        Ok(())
    }

    /// `verify-sim-dylib`: verify and publish the simulator dylib alone.
    pub fn sim_dylib(&self) -> Result<(), PipelineError> {
        let simulator = self.locate_simulator_dylib()?;

        let lipo = Lipo::new(self.runner);
        lipo.verify_arches(&simulator.path, simulator.platform.sdk(), &simulator.arches)?;

        distribute::publish_files(&[simulator.path], &self.layout.published_dylibs_dir())?;
        Ok(())
    }

    fn locate_device_dylib(&self) -> Result<Artifact, PipelineError> {
        Ok(locate::locate_artifact(
            &self.layout.device_build_dir(),
            self.layout.device_dylib_name(),
            Platform::Device,
            self.layout.device_arches(),
        )?)
    }

    fn locate_simulator_dylib(&self) -> Result<Artifact, PipelineError> {
        Ok(locate::locate_artifact(
            &self.layout.simulator_build_dir(),
            self.layout.simulator_dylib_name(),
            Platform::Simulator,
            self.layout.simulator_arches(),
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_exit_code_defaults_to_one() {
        let err = PipelineError::Locate(LocateError::MissingArtifact {
            path: PathBuf::from("lib.a"),
        });
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_exit_code_uses_tool_status() {
        let err = PipelineError::Lipo(LipoError::CombineFailed {
            output: "out.a".to_string(),
            message: "boom".to_string(),
            code: 42,
        });
        assert_eq!(err.exit_code(), 42);
    }

    #[test]
    fn test_exit_code_through_framework_layers() {
        let err = PipelineError::Xcframework(XcframeworkError::Framework(
            FrameworkError::VersionProbeFailed {
                tool: "Resources/version".to_string(),
                code: 7,
                message: String::new(),
            },
        ));
        assert_eq!(err.exit_code(), 7);

        let err = PipelineError::Framework(FrameworkError::Lipo(LipoError::MissingArchitecture {
            binary: "calabash".to_string(),
            arch: "arm64".to_string(),
            sdk: "iphoneos".to_string(),
        }));
        assert_eq!(err.exit_code(), 1);
    }
}
