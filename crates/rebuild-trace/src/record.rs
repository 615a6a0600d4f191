//! Build trace records.
//!
//! SCons can emit an XML build report with one element per build action:
//! `<cxx>`, `<cc>`, `<ar>` or `<link>`, each holding one child element per
//! construction variable (`<target>`, `<source>`, `<include>`, ...).

use indexmap::IndexMap;
use std::fmt;

use crate::error::{Result, TraceError};

/// The kind of build action a record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    /// Compilation of a C source.
    CompileC,
    /// Compilation of a C++ source.
    CompileCxx,
    /// Creation of a static library.
    Archive,
    /// Link of an executable or shared library.
    Link,
}

impl ActionKind {
    /// Parse the tag used by the build report.
    pub fn from_tag(tag: &str) -> Result<Self> {
        match tag {
            "cc" => Ok(ActionKind::CompileC),
            "cxx" => Ok(ActionKind::CompileCxx),
            "ar" => Ok(ActionKind::Archive),
            "link" => Ok(ActionKind::Link),
            other => Err(TraceError::UnknownAction(other.to_string())),
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            ActionKind::CompileC => "cc",
            ActionKind::CompileCxx => "cxx",
            ActionKind::Archive => "ar",
            ActionKind::Link => "link",
        }
    }

    pub fn is_compile(self) -> bool {
        matches!(self, ActionKind::CompileC | ActionKind::CompileCxx)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A single build action from the trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRecord {
    kind: ActionKind,
    target: String,
    attributes: IndexMap<String, String>,
}

impl BuildRecord {
    /// Create a record from its raw attributes. SCons `$(`/`$)` markers are
    /// stripped from every value; `target` is required.
    pub fn new(kind: ActionKind, attributes: IndexMap<String, String>) -> Result<Self> {
        let attributes: IndexMap<String, String> = attributes
            .into_iter()
            .map(|(key, value)| (key, strip_scons_markers(&value)))
            .filter(|(_, value)| !value.is_empty())
            .collect();

        let target = attributes
            .get("target")
            .cloned()
            .ok_or_else(|| TraceError::MissingTarget {
                kind: kind.tag().to_string(),
            })?;

        Ok(Self {
            kind,
            target,
            attributes,
        })
    }

    pub fn kind(&self) -> ActionKind {
        self.kind
    }

    /// The output artifact path.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// The compiled file path (compile records only).
    pub fn source(&self) -> Option<&str> {
        self.attr("source")
    }

    /// Raw value of one attribute.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn attributes(&self) -> &IndexMap<String, String> {
        &self.attributes
    }

    /// Object inputs of an archive or link record.
    pub fn inputs(&self) -> Vec<&str> {
        self.attr("sources")
            .map(|s| s.split_whitespace().collect())
            .unwrap_or_default()
    }

    /// Link inputs as emitted by the trace.
    pub fn libs(&self) -> Vec<&str> {
        self.attr("libs")
            .map(|s| s.split_whitespace().collect())
            .unwrap_or_default()
    }
}

/// Remove SCons' `$(` and `$)` markers, which delimit parts of a command
/// line excluded from signatures, and collapse the remaining whitespace.
pub fn strip_scons_markers(text: &str) -> String {
    text.split_whitespace()
        .filter(|token| *token != "$(" && *token != "$)")
        .collect::<Vec<_>>()
        .join(" ")
}
