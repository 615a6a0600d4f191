//! Project model synthesis from an ingested build trace.

use indexmap::IndexMap;
use rebuild_common::Diagnostics;
use rebuild_trace::{BuildRecord, BuildTrace, RebuildConfig};
use rustc_hash::FxHashSet;

use crate::deps::resolve_dependencies;
use crate::error::Result;
use crate::headers::{attribute_headers, PrefixIndex};
use crate::module::{Module, ModuleId, ModuleKind, ProjectModel};
use crate::settings::{minimize, Axis, Normalizer};

/// Inputs to synthesis besides the trace itself.
#[derive(Debug, Clone, Copy)]
pub struct SynthOptions<'a> {
    pub config: &'a RebuildConfig,
    /// Tolerate references to modules outside the build (dry runs).
    pub best_effort: bool,
}

/// Build the project model.
///
/// Every archive and link action becomes a module; its compile inputs are
/// minimized into module settings, its link inputs resolved against the
/// other modules, and the discovered `headers` distributed by directory.
pub fn synthesize(
    trace: &BuildTrace,
    headers: &[String],
    options: SynthOptions<'_>,
    diagnostics: &mut Diagnostics,
) -> Result<ProjectModel> {
    let config = options.config;
    let normalizer = Normalizer::new(config.removed_flags());

    let mut modules: IndexMap<ModuleId, Module> = IndexMap::new();
    for (name, record) in trace.modules() {
        let module = build_module(trace, name, record, &normalizer);
        modules.insert(module.id.clone(), module);
    }

    let known: FxHashSet<ModuleId> = modules.keys().cloned().collect();
    for (name, record) in trace.modules() {
        let Some(module) = modules.get_mut(name) else {
            continue;
        };
        let resolution = resolve_dependencies(
            &module.id,
            module.kind,
            &record.libs(),
            &known,
            &config.trace.flavor,
            options.best_effort,
            diagnostics,
        )?;
        module.dependencies = resolution.dependencies;
        module.external_libs = resolution.external;
    }

    let index = PrefixIndex::new(modules.keys(), &config.headers);
    let assignment = attribute_headers(&index, headers, &config.headers.excluded_trees, diagnostics);
    for (header, owner) in assignment.iter() {
        if let Some(module) = modules.get_mut(owner) {
            module.headers.push(header.to_string());
        }
    }

    tracing::info!(
        modules = modules.len(),
        headers = assignment.len(),
        "synthesized project model"
    );
    Ok(ProjectModel::new(modules, assignment))
}

fn build_module(trace: &BuildTrace, name: &str, record: &BuildRecord, normalizer: &Normalizer) -> Module {
    let mut module = Module::new(ModuleId::new(name), ModuleKind::of(record), record.target());

    let mut compiled: Vec<&BuildRecord> = Vec::new();
    let mut seen = FxHashSet::default();
    for input in record.inputs() {
        match trace.compile_record(input) {
            Some(compile) => {
                let source = compile.source().unwrap_or(compile.target());
                if seen.insert(source) {
                    module.sources.push(source.to_string());
                    compiled.push(compile);
                }
            }
            None => module.opaque_objects.push(input.to_string()),
        }
    }

    module.settings = minimize(&compiled, &Axis::ALL, normalizer);
    if let Some(raw) = record.attr("libpath") {
        module.library_paths = normalizer.library_paths(raw);
    }
    module.link_flags = record.attr("linkflags").map(str::to_string);

    tracing::debug!(module = name, kind = ?module.kind, sources = module.sources.len(), "built module");
    for (axis, value) in module.settings.defaults() {
        tracing::debug!(module = name, %axis, value = %value.join(axis.separator()), "module default");
    }
    module
}

#[cfg(test)]
mod tests {
    use super::*;
    use rebuild_common::DiagnosticKind;
    use rebuild_trace::{ActionKind, TraceConfig};

    fn record(kind: ActionKind, pairs: &[(&str, &str)]) -> BuildRecord {
        BuildRecord::new(
            kind,
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
        )
        .unwrap()
    }

    fn sample_trace() -> BuildTrace {
        BuildTrace::ingest(
            vec![
                record(
                    ActionKind::CompileCxx,
                    &[("target", "core\\os.obj"), ("source", "core\\os.cpp"), ("define", "/DTOOLS")],
                ),
                record(
                    ActionKind::CompileC,
                    &[("target", "core\\md5.obj"), ("source", "core\\md5.c"), ("define", "/DTOOLS /DC_ONLY")],
                ),
                record(
                    ActionKind::Archive,
                    &[
                        ("target", "core\\core.windows.tools.x86_64.lib"),
                        ("sources", "core\\os.obj core\\md5.obj"),
                    ],
                ),
                record(
                    ActionKind::Link,
                    &[
                        ("target", "bin\\godot.windows.tools.x86_64.exe"),
                        ("sources", "platform\\windows\\godot_res.obj"),
                        ("libs", "core\\core.windows.tools.x86_64.lib bin\\godot.windows.tools.x86_64.lib winmm.lib"),
                        ("libpath", "/LIBPATH:lib"),
                    ],
                ),
            ],
            &TraceConfig::default().flavor,
        )
    }

    #[test]
    fn test_synthesize() {
        let config = RebuildConfig::default();
        let mut diags = Diagnostics::new();
        let headers = vec![
            "core\\os.h".to_string(),
            "bin\\version.h".to_string(),
            "thirdparty\\zlib.h".to_string(),
            "servers\\server.h".to_string(),
        ];
        let model = synthesize(
            &sample_trace(),
            &headers,
            SynthOptions { config: &config, best_effort: false },
            &mut diags,
        )
        .unwrap();

        assert_eq!(model.len(), 2);

        let core = model.get("core\\core").unwrap();
        assert_eq!(core.kind, ModuleKind::StaticLibrary);
        assert_eq!(core.sources, vec!["core\\os.cpp", "core\\md5.c"]);
        assert_eq!(core.headers, vec!["core\\os.h"]);
        assert!(core.dependencies.is_empty());
        assert_eq!(core.settings.overrides().len(), 1);

        let godot = model.get("bin\\godot").unwrap();
        assert_eq!(godot.kind, ModuleKind::Executable);
        assert_eq!(godot.opaque_objects, vec!["platform\\windows\\godot_res.obj"]);
        assert_eq!(godot.dependencies, vec![ModuleId::new("core\\core")]);
        assert_eq!(godot.external_libs, vec!["winmm.lib"]);
        assert_eq!(godot.library_paths.entries(), ["$(SolutionDir)\\lib"]);
        assert_eq!(godot.headers, vec!["bin\\version.h"]);

        assert_eq!(diags.of_kind(DiagnosticKind::SelfDependency).count(), 1);
        assert_eq!(diags.of_kind(DiagnosticKind::UnattributedHeader).count(), 1);
        assert_eq!(model.header_assignment().len(), 2);
    }
}
