//! Visual Studio project generation.
//!
//! Every module of a [`ProjectModel`](rebuild_model::ProjectModel) becomes an
//! open project: a template `.vcxproj` that imports generated properties
//! documents, chained through intermediate directories up to the build root.
//! Closed projects inline that chain into one document.
//!
//! All output goes through a [`StagedTree`] first:
//!
//! ```no_run
//! # use rebuild_msbuild::*;
//! # fn run(model: &rebuild_model::ProjectModel, options: &GenerateOptions) -> Result<()> {
//! let templates = TemplateStore::open("templates".as_ref(), "vs19")?;
//! let tree = generate(model, &templates, options)?;
//! tree.commit(&[&options.output_root])?;
//! # Ok(())
//! # }
//! ```

mod error;
pub mod filters;
pub mod flatten;
mod generate;
pub mod project;
pub mod solution;
mod stage;
mod template;

pub use error::{MsbuildError, Result};
pub use filters::FilterStyle;
pub use flatten::{flatten, flatten_file, is_local_import};
pub use generate::{generate, GenerateOptions, HEADER_ASSIGNMENTS};
pub use project::project_guid;
pub use stage::{crlf, DocumentLoader, StagedFile, StagedTree};
pub use template::{TemplateStore, TemplateVars};
