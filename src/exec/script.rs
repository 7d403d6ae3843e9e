//! Scripted tool runner for tests
//!
//! Stands in for the real toolchain so pipeline tests can run without Xcode.
//! A [`ScriptedRunner`] holds an ordered list of [`Script`] rules; the first
//! rule matching an invocation supplies its output. Rules can also touch the
//! path following a flag (e.g. `-output`) to mimic tools that create files.
//! Every invocation is recorded for assertions.

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use super::{ExecError, Invocation, ToolOutput, ToolRunner};

/// A single scripted response rule.
#[derive(Debug, Clone)]
pub struct Script {
    /// Matches when the invoked program ends with this suffix
    program_suffix: String,
    /// Additionally require one argument to equal this string
    arg: Option<String>,
    /// Canned output to return
    output: ToolOutput,
    /// After matching, create an empty file at the argument following this flag
    touch_after_flag: Option<String>,
}

impl Script {
    /// Rule matching any invocation of a program whose path ends with `suffix`.
    pub fn for_program(suffix: impl Into<String>) -> Self {
        Self {
            program_suffix: suffix.into(),
            arg: None,
            output: ToolOutput {
                code: 0,
                stdout: String::new(),
                stderr: String::new(),
            },
            touch_after_flag: None,
        }
    }

    /// Require an exact argument to be present.
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.arg = Some(arg.into());
        self
    }

    /// Respond with this stdout (exit 0).
    pub fn stdout(mut self, text: impl Into<String>) -> Self {
        self.output.stdout = text.into();
        self
    }

    /// Respond with this exit code and stderr.
    pub fn fails(mut self, code: i32, stderr: impl Into<String>) -> Self {
        self.output.code = code;
        self.output.stderr = stderr.into();
        self
    }

    /// After matching, create an empty file at the argument that follows `flag`.
    pub fn touches_output_of(mut self, flag: impl Into<String>) -> Self {
        self.touch_after_flag = Some(flag.into());
        self
    }

    fn matches(&self, program: &str, args: &[&str]) -> bool {
        program.ends_with(&self.program_suffix)
            && self
                .arg
                .as_ref()
                .map(|want| args.iter().any(|a| *a == want.as_str()))
                .unwrap_or(true)
    }
}

/// Test double recording invocations and replaying scripted outputs.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    scripts: Vec<Script>,
    calls: RefCell<Vec<Invocation>>,
}

impl ScriptedRunner {
    pub fn new(scripts: Vec<Script>) -> Self {
        Self {
            scripts,
            calls: RefCell::new(Vec::new()),
        }
    }

    /// All invocations seen so far, in order.
    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.borrow().clone()
    }

    /// Whether any recorded invocation contains `needle` in its rendering.
    pub fn saw(&self, needle: &str) -> bool {
        self.calls
            .borrow()
            .iter()
            .any(|inv| inv.to_string().contains(needle))
    }
}

impl ToolRunner for ScriptedRunner {
    fn run(&self, program: &str, args: &[&str], cwd: Option<&Path>) -> Result<ToolOutput, ExecError> {
        self.calls.borrow_mut().push(Invocation {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        });

        for script in &self.scripts {
            if !script.matches(program, args) {
                continue;
            }
            if let Some(ref flag) = script.touch_after_flag {
                if let Some(pos) = args.iter().position(|a| *a == flag.as_str()) {
                    if let Some(target) = args.get(pos + 1) {
                        let path = resolve(target, cwd);
                        if let Some(parent) = path.parent() {
                            let _ = fs::create_dir_all(parent);
                        }
                        let _ = fs::write(&path, b"scripted");
                    }
                }
            }
            return Ok(script.output.clone());
        }

        // Unscripted invocations fail loudly so tests catch drift.
        Ok(ToolOutput {
            code: 127,
            stdout: String::new(),
            stderr: format!("unscripted invocation: {} {}", program, args.join(" ")),
        })
    }
}

fn resolve(target: &str, cwd: Option<&Path>) -> PathBuf {
    let path = PathBuf::from(target);
    if path.is_absolute() {
        path
    } else {
        match cwd {
            Some(dir) => dir.join(path),
            None => path,
        }
    }
}
