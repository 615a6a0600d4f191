//! Build trace ingestion for rebuild.
//!
//! This crate provides:
//! - Build report parsing (SCons XML report, or a JSON record array)
//! - The ingested, read-only [`BuildTrace`] tables
//! - Conversion configuration (`rebuild.toml`)
//!
//! # Example
//!
//! ```toml
//! # rebuild.toml
//! [project]
//! vs_version = "vs19"
//!
//! [trace]
//! flavor = ".windows.tools.x86_64"
//!
//! [headers]
//! excluded_trees = ["thirdparty\\", "tests\\"]
//! ```

mod config;
mod error;
mod record;
mod report;
mod trace;

pub use config::{CompilerConfig, HeaderConfig, ProjectConfig, RebuildConfig, TraceConfig};
pub use error::{Result, TraceError};
pub use record::{strip_scons_markers, ActionKind, BuildRecord};
pub use report::{clean_report, read_records, records_from_json, records_from_xml, TraceFormat, MAGIC_COOKIE};
pub use trace::{module_name, BuildTrace};
