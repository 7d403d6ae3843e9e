//! calabash-dist
//!
//! Packages externally-compiled calabash libraries into distributable
//! artifacts: a multi-platform `calabash.xcframework`, a fat static library
//! for the Frank plugin host, and standalone dynamic libraries. The compile
//! step itself is an external collaborator; this crate locates its outputs,
//! fuses architecture slices with `lipo`, stages bundles, verifies every
//! installed binary's architecture set, and publishes the result.

pub mod config;
pub mod distribute;
pub mod exec;
pub mod framework;
pub mod lipo;
pub mod locate;
pub mod manifest;
pub mod pipeline;
pub mod staging;
pub mod xcframework;

pub use config::{Layout, LayoutOverrides};
pub use exec::{SystemRunner, ToolRunner};
pub use pipeline::{Pipeline, PipelineError};
