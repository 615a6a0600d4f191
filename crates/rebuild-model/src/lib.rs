//! Project model for rebuild.
//!
//! Turns the flat [`BuildTrace`](rebuild_trace::BuildTrace) into modules:
//!
//! - [`settings`]: module defaults plus per-source overrides
//! - [`headers`]: header ownership by longest directory prefix
//! - [`deps`]: module references vs. external libraries
//!
//! [`synthesize`] runs all three and returns a read-only [`ProjectModel`].

pub mod deps;
mod error;
pub mod headers;
mod module;
pub mod settings;
mod synth;

pub use deps::{resolve_dependencies, Resolution};
pub use error::{ModelError, Result};
pub use headers::{attribute_headers, discover_headers, HeaderAssignment, PrefixIndex};
pub use module::{Module, ModuleId, ModuleKind, ProjectModel};
pub use settings::{minimize, Axis, ModuleSettings, Normalizer, Override, SettingValue};
pub use synth::{synthesize, SynthOptions};
