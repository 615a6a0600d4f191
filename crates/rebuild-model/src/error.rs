//! Error types for rebuild-model.

use miette::Diagnostic;
use thiserror::Error;

/// Result type for model synthesis.
pub type Result<T> = std::result::Result<T, ModelError>;

#[derive(Error, Debug, Diagnostic)]
pub enum ModelError {
    /// A link input names a module of the build that was never synthesized.
    #[error("\"{module}\" depends on \"{dependency}\", which is not part of the build")]
    #[diagnostic(
        code(rebuild::model::unresolved_dependency),
        help("references to projects not included in the solution are not supported; use --dry-run to continue anyway")
    )]
    UnresolvedDependency { module: String, dependency: String },

    /// Walking the source tree for headers failed.
    #[error("Failed to scan {root} for headers: {source}")]
    #[diagnostic(code(rebuild::model::discover))]
    Discover {
        root: String,
        #[source]
        source: walkdir::Error,
    },
}
