//! Header ownership.
//!
//! Headers are not part of the build trace, so they are discovered on disk
//! and handed to the module whose directory contains them. Module directories
//! are matched by longest prefix over a sorted list.

use rebuild_common::{paths, Diagnostic, DiagnosticKind, Diagnostics};
use rebuild_trace::HeaderConfig;
use std::collections::BTreeMap;
use std::path::Path;
use walkdir::WalkDir;

use crate::error::{ModelError, Result};
use crate::module::ModuleId;

/// Directory prefix a module claims headers under.
///
/// Modules below one of the module roots own their own directory; any other
/// module owns its parent (`core\core` → `core`). The grouping marker is
/// folded away (`modules\module_gdscript` → `modules\gdscript`).
pub fn module_prefix(name: &str, config: &HeaderConfig) -> String {
    let base = if config.module_roots.iter().any(|root| name.starts_with(root.as_str())) {
        name
    } else {
        paths::parent(name)
    };
    if config.grouping_marker.is_empty() {
        base.to_string()
    } else {
        base.replace(config.grouping_marker.as_str(), "\\")
    }
}

/// Module prefixes sorted for binary search.
#[derive(Debug, Clone, Default)]
pub struct PrefixIndex {
    prefixes: Vec<(String, ModuleId)>,
}

impl PrefixIndex {
    /// Build the index. When two modules claim the same prefix the first one
    /// keeps it.
    pub fn new<'a>(modules: impl IntoIterator<Item = &'a ModuleId>, config: &HeaderConfig) -> Self {
        let mut prefixes: Vec<(String, ModuleId)> = modules
            .into_iter()
            .map(|id| (module_prefix(id.as_str(), config), id.clone()))
            .collect();
        prefixes.sort_by(|a, b| a.0.cmp(&b.0));
        prefixes.dedup_by(|later, earlier| later.0 == earlier.0);
        Self { prefixes }
    }

    /// From explicit prefixes (already folded).
    pub fn from_prefixes(entries: impl IntoIterator<Item = (String, ModuleId)>) -> Self {
        let mut prefixes: Vec<_> = entries.into_iter().collect();
        prefixes.sort_by(|a, b| a.0.cmp(&b.0));
        prefixes.dedup_by(|later, earlier| later.0 == earlier.0);
        Self { prefixes }
    }

    pub fn prefixes(&self) -> impl Iterator<Item = &str> {
        self.prefixes.iter().map(|(p, _)| p.as_str())
    }

    /// Module owning `directory`: among the prefixes sorting at or before it,
    /// the rightmost one that contains it, which is also the longest.
    pub fn lookup(&self, directory: &str) -> Option<&ModuleId> {
        let end = self.prefixes.partition_point(|(p, _)| p.as_str() <= directory);
        self.prefixes[..end]
            .iter()
            .rev()
            .find(|(prefix, _)| paths::is_under(directory, prefix))
            .map(|(_, id)| id)
    }
}

/// Header path → owning module.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderAssignment {
    owners: BTreeMap<String, ModuleId>,
}

impl HeaderAssignment {
    pub fn owner(&self, header: &str) -> Option<&ModuleId> {
        self.owners.get(header)
    }

    /// Assignments sorted by header path.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ModuleId)> {
        self.owners.iter().map(|(h, m)| (h.as_str(), m))
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}

/// Assign each header to one module. Headers under an excluded tree are
/// skipped silently; other unowned headers raise a diagnostic.
pub fn attribute_headers(
    index: &PrefixIndex,
    headers: &[String],
    excluded_trees: &[String],
    diagnostics: &mut Diagnostics,
) -> HeaderAssignment {
    let mut owners = BTreeMap::new();
    for header in headers {
        if excluded_trees.iter().any(|tree| header.starts_with(tree.as_str())) {
            continue;
        }
        match index.lookup(paths::parent(header)) {
            Some(module) => {
                owners.insert(header.clone(), module.clone());
            }
            None => diagnostics.push(Diagnostic::warning(
                DiagnosticKind::UnattributedHeader,
                format!("header not assigned to any module: {header}"),
            )),
        }
    }
    HeaderAssignment { owners }
}

/// Find header files below `root`, as sorted backslash paths relative to it.
pub fn discover_headers(root: &Path, extensions: &[String]) -> Result<Vec<String>> {
    let mut headers = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|source| ModelError::Discover {
            root: root.display().to_string(),
            source,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let matches = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| extensions.iter().any(|x| x == ext));
        if !matches {
            continue;
        }
        if let Ok(relative) = entry.path().strip_prefix(root) {
            headers.push(paths::to_document_string(relative));
        }
    }
    headers.sort();
    tracing::debug!(count = headers.len(), root = %root.display(), "discovered headers");
    Ok(headers)
}
