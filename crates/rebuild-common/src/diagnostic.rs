//! Non-fatal findings collected while converting a build trace.
//!
//! Fatal conditions are plain errors returned through `Result`; everything
//! the run can continue past is recorded here and reported at the end.

use miette::{Diagnostic as MietteDiagnostic, Severity};
use std::fmt::Display;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticLevel {
    Warning,
    Info,
}

/// What a diagnostic is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// A module's link inputs name the module itself.
    SelfDependency,
    /// A header is outside the excluded trees and no module owns it.
    UnattributedHeader,
    /// A sibling-module reference was dropped in best-effort mode.
    UnresolvedDependency,
}

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub kind: DiagnosticKind,
    pub message: String,
    pub help: Option<String>,
}

/// Rendered at the level it was recorded with: warnings as warnings, the
/// rest as advice.
impl MietteDiagnostic for Diagnostic {
    fn severity(&self) -> Option<Severity> {
        Some(match self.level {
            DiagnosticLevel::Warning => Severity::Warning,
            DiagnosticLevel::Info => Severity::Advice,
        })
    }

    fn help<'a>(&'a self) -> Option<Box<dyn Display + 'a>> {
        self.help.as_ref().map(|help| Box::new(help) as Box<dyn Display + 'a>)
    }
}

impl Diagnostic {
    pub fn warning(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Warning,
            kind,
            message: message.into(),
            help: None,
        }
    }

    pub fn info(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Info,
            kind,
            message: message.into(),
            help: None,
        }
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }
}

/// Ordered collection of diagnostics for one run.
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        match diagnostic.level {
            DiagnosticLevel::Warning => tracing::warn!(kind = ?diagnostic.kind, "{}", diagnostic.message),
            DiagnosticLevel::Info => tracing::info!(kind = ?diagnostic.kind, "{}", diagnostic.message),
        }
        self.items.push(diagnostic);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    /// Diagnostics of one kind, in the order they were raised.
    pub fn of_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter().filter(move |d| d.kind == kind)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.items.extend(other.items);
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }
}
