//! The ingested build trace: four read-only tables indexed by target.

use indexmap::IndexMap;
use std::path::Path;

use crate::error::Result;
use crate::record::{ActionKind, BuildRecord};
use crate::report::{read_records, TraceFormat};

/// Linker-only variables SCons reports on archive actions as well; the
/// archiver ignores them.
const ARCHIVE_IGNORED: &[&str] = &["libpath", "linkflags"];

/// All records of one build, split by action kind.
///
/// Compile records are keyed by their object file; archive and link records
/// by module name (the target with the build flavor and extension removed).
/// Every table keeps trace order.
#[derive(Debug, Clone, Default)]
pub struct BuildTrace {
    cc: IndexMap<String, BuildRecord>,
    cxx: IndexMap<String, BuildRecord>,
    ar: IndexMap<String, BuildRecord>,
    link: IndexMap<String, BuildRecord>,
}

impl BuildTrace {
    /// Index records by kind. A later record for the same key replaces the
    /// earlier one but keeps its position.
    pub fn ingest(records: impl IntoIterator<Item = BuildRecord>, flavor: &str) -> Self {
        let mut trace = Self::default();
        for record in records {
            match record.kind() {
                ActionKind::CompileC => {
                    trace.cc.insert(record.target().to_string(), record);
                }
                ActionKind::CompileCxx => {
                    trace.cxx.insert(record.target().to_string(), record);
                }
                ActionKind::Archive => {
                    let name = module_name(record.target(), flavor);
                    trace.ar.insert(name, without(record, ARCHIVE_IGNORED));
                }
                ActionKind::Link => {
                    let name = module_name(record.target(), flavor);
                    trace.link.insert(name, record);
                }
            }
        }
        tracing::info!(
            cc = trace.cc.len(),
            cxx = trace.cxx.len(),
            ar = trace.ar.len(),
            link = trace.link.len(),
            "ingested build trace"
        );
        trace
    }

    /// Read a trace file and index it.
    pub fn from_file(path: &Path, format: TraceFormat, flavor: &str) -> Result<Self> {
        Ok(Self::ingest(read_records(path, format)?, flavor))
    }

    /// The compile record producing `object`, C++ taking precedence.
    pub fn compile_record(&self, object: &str) -> Option<&BuildRecord> {
        self.cxx.get(object).or_else(|| self.cc.get(object))
    }

    pub fn archives(&self) -> impl Iterator<Item = (&str, &BuildRecord)> {
        self.ar.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn links(&self) -> impl Iterator<Item = (&str, &BuildRecord)> {
        self.link.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Archive modules followed by link modules.
    pub fn modules(&self) -> impl Iterator<Item = (&str, &BuildRecord)> {
        self.archives().chain(self.links())
    }

    pub fn compile_count(&self) -> usize {
        self.cc.len() + self.cxx.len()
    }

    pub fn module_count(&self) -> usize {
        self.ar.len() + self.link.len()
    }
}

/// Module name for an archive or link target: everything before the build
/// flavor (`core\core.windows.tools.x86_64.lib` → `core\core`), or the
/// target without its extension when the flavor does not appear.
pub fn module_name(target: &str, flavor: &str) -> String {
    if !flavor.is_empty() {
        if let Some(index) = target.find(flavor) {
            return target[..index].to_string();
        }
    }
    let file_start = target.rfind(['\\', '/']).map_or(0, |i| i + 1);
    match target[file_start..].rfind('.') {
        Some(dot) => target[..file_start + dot].to_string(),
        None => target.to_string(),
    }
}

fn without(record: BuildRecord, keys: &[&str]) -> BuildRecord {
    if !keys.iter().any(|k| record.attr(k).is_some()) {
        return record;
    }
    let attributes = record
        .attributes()
        .iter()
        .filter(|(k, _)| !keys.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    // Only removes keys, so `target` is still present.
    BuildRecord::new(record.kind(), attributes).unwrap_or(record)
}
