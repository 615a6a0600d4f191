//! Error types for rebuild-msbuild.

use miette::Diagnostic;
use rebuild_common::XmlError;
use thiserror::Error;

/// Result type for document generation.
pub type Result<T> = std::result::Result<T, MsbuildError>;

#[derive(Error, Debug, Diagnostic)]
pub enum MsbuildError {
    /// A generated or template document is not valid XML.
    #[error("Invalid project document {path}: {source}")]
    #[diagnostic(code(rebuild::msbuild::xml))]
    Xml {
        path: String,
        #[source]
        source: XmlError,
    },

    #[error("Failed to access {path}: {source}")]
    #[diagnostic(code(rebuild::msbuild::io))]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The template store lacks a file the generator needs.
    #[error("Template not found: {0}")]
    #[diagnostic(
        code(rebuild::msbuild::missing_template),
        help("check --templates and --vs-version")
    )]
    MissingTemplate(String),

    /// Local imports form a cycle.
    #[error("Template import cycle: {0}")]
    #[diagnostic(code(rebuild::msbuild::template_cycle))]
    TemplateCycle(String),

    #[error("Failed to walk template directory: {0}")]
    #[diagnostic(code(rebuild::msbuild::walk))]
    Walk(#[from] walkdir::Error),

    #[error("Failed to serialize header assignments: {0}")]
    #[diagnostic(code(rebuild::msbuild::json))]
    Json(#[from] serde_json::Error),
}

impl MsbuildError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        MsbuildError::Io {
            path: path.display().to_string(),
            source,
        }
    }

    pub(crate) fn xml(path: &std::path::Path, source: XmlError) -> Self {
        MsbuildError::Xml {
            path: path.display().to_string(),
            source,
        }
    }
}
