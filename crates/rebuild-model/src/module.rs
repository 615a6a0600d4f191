//! The project model: one [`Module`] per archive or link action.

use indexmap::IndexMap;
use rebuild_common::paths;
use rebuild_trace::{ActionKind, BuildRecord};
use smol_str::SmolStr;
use std::borrow::Borrow;
use std::fmt;
use std::path::PathBuf;

use crate::headers::HeaderAssignment;
use crate::settings::{ModuleSettings, SettingValue};

/// Identity of a module: its target path without flavor and extension,
/// e.g. `modules\module_gdscript`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(SmolStr);

impl ModuleId {
    pub fn new(name: &str) -> Self {
        Self(SmolStr::new(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last path component, used for project file names.
    pub fn file_name(&self) -> &str {
        paths::file_name(&self.0)
    }

    /// The module's directory relative to the build root.
    pub fn to_native(&self) -> PathBuf {
        paths::to_native(&self.0)
    }
}

impl Borrow<str> for ModuleId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a module builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleKind {
    StaticLibrary,
    SharedLibrary,
    Executable,
}

impl ModuleKind {
    /// Archives are static libraries; links produce a shared library when
    /// the target is a `.dll` and an executable otherwise.
    pub fn of(record: &BuildRecord) -> Self {
        match record.kind() {
            ActionKind::Link if record.target().to_ascii_lowercase().ends_with(".dll") => {
                ModuleKind::SharedLibrary
            }
            ActionKind::Link => ModuleKind::Executable,
            _ => ModuleKind::StaticLibrary,
        }
    }

    pub fn is_archive(self) -> bool {
        self == ModuleKind::StaticLibrary
    }

    /// Template directory holding the project skeleton for this kind.
    pub fn template_dir(self) -> &'static str {
        match self {
            ModuleKind::StaticLibrary => "static_library",
            ModuleKind::SharedLibrary => "shared_library",
            ModuleKind::Executable => "executable",
        }
    }
}

/// One compilation/link unit.
#[derive(Debug, Clone)]
pub struct Module {
    pub id: ModuleId,
    pub kind: ModuleKind,
    /// Output artifact path from the trace.
    pub target: String,
    /// Compiled sources, in link order.
    pub sources: Vec<String>,
    pub settings: ModuleSettings,
    /// Inputs that were not compiled by the traced build (e.g. resources).
    pub opaque_objects: Vec<String>,
    pub headers: Vec<String>,
    pub library_paths: SettingValue,
    pub link_flags: Option<String>,
    /// Libraries that are not produced by another module.
    pub external_libs: Vec<String>,
    /// Modules whose output this module links.
    pub dependencies: Vec<ModuleId>,
}

impl Module {
    pub fn new(id: ModuleId, kind: ModuleKind, target: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            target: target.into(),
            sources: Vec::new(),
            settings: ModuleSettings::default(),
            opaque_objects: Vec::new(),
            headers: Vec::new(),
            library_paths: SettingValue::default(),
            link_flags: None,
            external_libs: Vec::new(),
            dependencies: Vec::new(),
        }
    }
}

/// All modules of a build plus the header side-table. Read-only once
/// synthesized.
#[derive(Debug, Clone, Default)]
pub struct ProjectModel {
    modules: IndexMap<ModuleId, Module>,
    headers: HeaderAssignment,
}

impl ProjectModel {
    pub(crate) fn new(modules: IndexMap<ModuleId, Module>, headers: HeaderAssignment) -> Self {
        Self { modules, headers }
    }

    /// Modules in trace order, archives first.
    pub fn modules(&self) -> impl Iterator<Item = &Module> {
        self.modules.values()
    }

    pub fn get(&self, id: &str) -> Option<&Module> {
        self.modules.get(id)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn header_assignment(&self) -> &HeaderAssignment {
        &self.headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(kind: ActionKind, target: &str) -> BuildRecord {
        let attributes = [("target".to_string(), target.to_string())].into_iter().collect();
        BuildRecord::new(kind, attributes).unwrap()
    }

    #[test]
    fn test_module_kind() {
        assert_eq!(
            ModuleKind::of(&record(ActionKind::Archive, "core\\core.lib")),
            ModuleKind::StaticLibrary
        );
        assert_eq!(
            ModuleKind::of(&record(ActionKind::Link, "bin\\godot.DLL")),
            ModuleKind::SharedLibrary
        );
        assert_eq!(
            ModuleKind::of(&record(ActionKind::Link, "bin\\godot.exe")),
            ModuleKind::Executable
        );
    }

    #[test]
    fn test_module_id() {
        let id = ModuleId::new("modules\\module_gdscript");
        assert_eq!(id.file_name(), "module_gdscript");
        assert_eq!(id.to_native(), PathBuf::from("modules").join("module_gdscript"));
    }
}
