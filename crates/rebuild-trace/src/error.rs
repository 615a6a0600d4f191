//! Error types for rebuild-trace.

use miette::Diagnostic;
use rebuild_common::XmlError;
use thiserror::Error;

/// Result type for rebuild-trace operations.
pub type Result<T> = std::result::Result<T, TraceError>;

/// Errors that can occur while reading a build trace or configuration.
#[derive(Error, Debug, Diagnostic)]
pub enum TraceError {
    /// Failed to read the build report or configuration file.
    #[error("Failed to read {path}: {source}")]
    #[diagnostic(code(rebuild::trace::io))]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The build report is not well-formed XML.
    #[error("Failed to parse build report: {0}")]
    #[diagnostic(code(rebuild::trace::xml))]
    ParseXml(#[from] XmlError),

    /// The JSON trace could not be parsed.
    #[error("Failed to parse JSON trace: {0}")]
    #[diagnostic(code(rebuild::trace::json))]
    ParseJson(#[from] serde_json::Error),

    /// Failed to parse TOML configuration.
    #[error("Failed to parse TOML config: {0}")]
    #[diagnostic(code(rebuild::trace::toml))]
    ParseToml(#[from] toml::de::Error),

    /// A record whose action kind is not compile, archive or link.
    #[error("Malformed record: unsupported action kind `{0}`")]
    #[diagnostic(
        code(rebuild::trace::malformed_record),
        help("recognized kinds are cc, cxx, ar and link")
    )]
    UnknownAction(String),

    /// A record that carries no target identifier.
    #[error("Malformed record: `{kind}` record has no target")]
    #[diagnostic(code(rebuild::trace::malformed_record))]
    MissingTarget { kind: String },
}
