//! Build report readers.
//!
//! The XML report is interleaved with ordinary build output; only lines
//! carrying the magic cookie belong to the document. A JSON array of
//! `{ "kind": ..., "attributes": { ... } }` objects is accepted as well.

use indexmap::IndexMap;
use serde::Deserialize;
use std::path::Path;

use crate::error::{Result, TraceError};
use crate::record::{ActionKind, BuildRecord};

/// Marker SCons prefixes to every line of the XML report.
pub const MAGIC_COOKIE: &str = "__BUILD_DATA_MAGIC_COOKIE__";

/// Encoding of a build trace file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceFormat {
    Xml,
    Json,
}

impl TraceFormat {
    /// Guess the format from a file extension, defaulting to XML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => TraceFormat::Json,
            _ => TraceFormat::Xml,
        }
    }
}

/// Keep only the report lines of a captured build log, with the cookie
/// removed. Input without any cookie is assumed to be a clean report.
pub fn clean_report(text: &str) -> String {
    if !text.contains(MAGIC_COOKIE) {
        return text.to_string();
    }
    text.lines()
        .filter(|line| line.contains(MAGIC_COOKIE))
        .map(|line| line.replace(MAGIC_COOKIE, ""))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parse records from an XML build report (cookies allowed).
pub fn records_from_xml(text: &str) -> Result<Vec<BuildRecord>> {
    let root = rebuild_common::xml::parse(&clean_report(text))?;

    root.elements()
        .map(|child| {
            let kind = ActionKind::from_tag(child.local_name())?;
            let attributes = child
                .elements()
                .map(|e| (e.local_name().to_string(), e.text()))
                .collect::<IndexMap<_, _>>();
            BuildRecord::new(kind, attributes)
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct JsonRecord {
    kind: String,
    #[serde(default)]
    attributes: IndexMap<String, String>,
}

/// Parse records from a JSON trace.
pub fn records_from_json(text: &str) -> Result<Vec<BuildRecord>> {
    let raw: Vec<JsonRecord> = serde_json::from_str(text)?;
    raw.into_iter()
        .map(|r| BuildRecord::new(ActionKind::from_tag(&r.kind)?, r.attributes))
        .collect()
}

/// Read and parse a trace file.
pub fn read_records(path: &Path, format: TraceFormat) -> Result<Vec<BuildRecord>> {
    let content = std::fs::read_to_string(path).map_err(|source| TraceError::Read {
        path: path.display().to_string(),
        source,
    })?;
    match format {
        TraceFormat::Xml => records_from_xml(&content),
        TraceFormat::Json => records_from_json(&content),
    }
}
