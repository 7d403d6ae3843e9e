//! Fat-binary tool adapter
//!
//! Wraps `xcrun lipo`: combining per-platform static libraries into a fat
//! binary, verifying a binary contains each required architecture slice, and
//! reporting the slices present. Architecture verification is the pipeline's
//! correctness gate; a missing slice would otherwise surface only as a crash
//! on end-user devices. It runs after every combine or copy step and fails on
//! the first missing architecture rather than aggregating.

use std::path::Path;

use crate::exec::{ExecError, ToolRunner};

/// Errors from combine / verify / inspect operations.
#[derive(Debug, thiserror::Error)]
pub enum LipoError {
    #[error("Could not create combined lib '{output}': {message}")]
    CombineFailed {
        output: String,
        message: String,
        code: i32,
    },

    #[error("Could not verify '{binary}' contains arch '{arch}' (sdk {sdk})")]
    MissingArchitecture {
        binary: String,
        arch: String,
        sdk: String,
    },

    #[error("Could not inspect '{binary}': {message}")]
    InspectFailed {
        binary: String,
        message: String,
        code: i32,
    },

    #[error(transparent)]
    Exec(#[from] ExecError),
}

impl LipoError {
    /// Exit code of the failing tool invocation, if one ran.
    pub fn tool_code(&self) -> Option<i32> {
        match self {
            LipoError::CombineFailed { code, .. } | LipoError::InspectFailed { code, .. } => {
                Some(*code)
            }
            _ => None,
        }
    }
}

/// Adapter over the external fat-binary tool.
pub struct Lipo<'a> {
    runner: &'a dyn ToolRunner,
}

impl<'a> Lipo<'a> {
    pub fn new(runner: &'a dyn ToolRunner) -> Self {
        Self { runner }
    }

    /// `xcrun lipo -create <inputs..> -output <output>`
    pub fn combine(&self, inputs: &[&Path], output: &Path) -> Result<(), LipoError> {
        let output_str = output.display().to_string();
        let input_strs: Vec<String> = inputs.iter().map(|p| p.display().to_string()).collect();

        let mut args: Vec<&str> = vec!["lipo", "-create"];
        args.extend(input_strs.iter().map(|s| s.as_str()));
        args.push("-output");
        args.push(&output_str);

        println!("INFO: combining libs");
        println!("INFO: xcrun {}", args.join(" "));

        let result = self.runner.run("xcrun", &args, None)?;
        if !result.success() {
            return Err(LipoError::CombineFailed {
                output: output_str,
                message: result.message().to_string(),
                code: result.code,
            });
        }
        Ok(())
    }

    /// Verify `binary` contains each architecture in `arches` for `sdk`.
    ///
    /// Fail-fast: the first missing architecture aborts; the pipeline must not
    /// publish an under-specified binary. On full success an architecture
    /// inventory is reported as a best-effort diagnostic.
    pub fn verify_arches(&self, binary: &Path, sdk: &str, arches: &[String]) -> Result<(), LipoError> {
        let binary_str = binary.display().to_string();

        for arch in arches {
            let args = [
                "-sdk",
                sdk,
                "lipo",
                binary_str.as_str(),
                "-verify_arch",
                arch.as_str(),
            ];
            let result = self.runner.run("xcrun", &args, None)?;
            if result.success() {
                println!("INFO: {} contains arch '{}'", binary_str, arch);
            } else {
                eprintln!("FAIL: could not verify lib contains arch '{}'", arch);
                eprintln!("FAIL: 'xcrun {}'", args.join(" "));
                return Err(LipoError::MissingArchitecture {
                    binary: binary_str,
                    arch: arch.clone(),
                    sdk: sdk.to_string(),
                });
            }
        }

        // Inventory report is informational; its failure never gates.
        match self.inspect(binary) {
            Ok(info) => println!("INFO: {}", info.trim()),
            Err(e) => eprintln!("WARN: architecture inventory unavailable: {}", e),
        }

        Ok(())
    }

    /// `xcrun lipo -info <binary>`: report the slices present.
    pub fn inspect(&self, binary: &Path) -> Result<String, LipoError> {
        let binary_str = binary.display().to_string();
        let args = ["lipo", "-info", binary_str.as_str()];

        let result = self.runner.run("xcrun", &args, None)?;
        if !result.success() {
            return Err(LipoError::InspectFailed {
                binary: binary_str,
                message: result.message().to_string(),
                code: result.code,
            });
        }
        Ok(result.stdout)
    }
}
