//! Link dependency resolution.
//!
//! The trace lists link inputs as library file names. Libraries built by
//! the traced build carry the build flavor (`core.windows.tools.x86_64.lib`)
//! and become project references; everything else stays a plain library.

use rebuild_common::{Diagnostic, DiagnosticKind, Diagnostics};
use rustc_hash::FxHashSet;

use crate::error::{ModelError, Result};
use crate::module::{ModuleId, ModuleKind};

/// Link inputs of one module, split into module references and libraries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    pub dependencies: Vec<ModuleId>,
    pub external: Vec<String>,
}

/// Name of the module a link input refers to, if it follows the naming of
/// the build's own libraries.
pub fn sibling_name<'a>(token: &'a str, flavor: &str) -> Option<&'a str> {
    if flavor.is_empty() {
        return None;
    }
    let stem = token.strip_suffix(".lib")?.strip_suffix(flavor)?;
    (!stem.is_empty()).then_some(stem)
}

/// Resolve the link inputs of `module`.
///
/// Archives are linked with every library of the build regardless of what
/// they use, so they keep the literal list and get no references.
/// References to the module itself are dropped with a diagnostic. A
/// reference to a module that does not exist is an error unless
/// `best_effort` is set, in which case it is dropped with a diagnostic.
pub fn resolve_dependencies(
    module: &ModuleId,
    kind: ModuleKind,
    libs: &[&str],
    modules: &FxHashSet<ModuleId>,
    flavor: &str,
    best_effort: bool,
    diagnostics: &mut Diagnostics,
) -> Result<Resolution> {
    if kind.is_archive() {
        return Ok(Resolution {
            dependencies: Vec::new(),
            external: libs.iter().map(|s| s.to_string()).collect(),
        });
    }

    let mut resolution = Resolution::default();
    for &token in libs {
        let Some(name) = sibling_name(token, flavor) else {
            resolution.external.push(token.to_string());
            continue;
        };

        if name == module.as_str() {
            diagnostics.push(
                Diagnostic::info(
                    DiagnosticKind::SelfDependency,
                    format!("ignoring module dependency from \"{module}\" on itself"),
                )
                .with_help("the build links this library into itself"),
            );
            continue;
        }

        match modules.get(name) {
            Some(target) => {
                if !resolution.dependencies.contains(target) {
                    resolution.dependencies.push(target.clone());
                }
            }
            None if best_effort => diagnostics.push(Diagnostic::warning(
                DiagnosticKind::UnresolvedDependency,
                format!("\"{module}\" references \"{name}\", which is not part of the build"),
            )),
            None => {
                return Err(ModelError::UnresolvedDependency {
                    module: module.to_string(),
                    dependency: name.to_string(),
                })
            }
        }
    }
    Ok(resolution)
}
