mod diagnostic;
pub mod paths;
pub mod xml;

pub use diagnostic::{Diagnostic, DiagnosticKind, DiagnosticLevel, Diagnostics};
pub use xml::{Element, Node, XmlError};
