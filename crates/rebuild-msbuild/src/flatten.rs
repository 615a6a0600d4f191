//! Import flattening.
//!
//! Open projects pull their settings in through a chain of `Import`
//! elements. A closed project is the same document with every local import
//! replaced by the content of the imported document, recursively, so it can
//! be moved around without its properties files.

use rebuild_common::{paths, Element, Node};
use std::path::{Path, PathBuf};

use crate::error::{MsbuildError, Result};
use crate::stage::DocumentLoader;

/// True for an `Import` of one of our own properties documents, as opposed
/// to toolset imports such as `$(VCTargetsPath)\Microsoft.Cpp.props`.
pub fn is_local_import(element: &Element) -> bool {
    if element.local_name() != "Import" {
        return false;
    }
    let Some(project) = element.attr("Project") else {
        return false;
    };
    let local_start =
        project.starts_with("..") || project.starts_with(|c: char| c.is_ascii_uppercase());
    local_start && project.ends_with(".properties")
}

/// Resolve an import path against the directory of the importing document.
pub fn resolve_import(base: &Path, project: &str) -> PathBuf {
    let bytes = project.as_bytes();
    if bytes.len() > 1 && bytes[1] == b':' {
        return PathBuf::from(project);
    }
    paths::normalize(&base.join(paths::to_native(project)))
}

/// Load the document at `path` and inline all of its local imports.
pub fn flatten_file(path: &Path, loader: &dyn DocumentLoader) -> Result<Element> {
    let path = paths::normalize(path);
    let document = loader.load(&path)?;
    let base = path.parent().unwrap_or(Path::new("")).to_path_buf();
    let mut stack = vec![path];
    flatten_with(document, &base, loader, &mut stack)
}

/// Inline all local imports of `document`, resolving them against `base`.
pub fn flatten(document: Element, base: &Path, loader: &dyn DocumentLoader) -> Result<Element> {
    flatten_with(document, base, loader, &mut Vec::new())
}

fn flatten_with(
    mut document: Element,
    base: &Path,
    loader: &dyn DocumentLoader,
    stack: &mut Vec<PathBuf>,
) -> Result<Element> {
    let children = std::mem::take(&mut document.children);
    document.children = expand(children, base, loader, stack)?;
    Ok(document)
}

/// Rebuild one child list. Each input node is visited exactly once, in
/// order; a local import contributes the expanded children of its document.
fn expand(
    children: Vec<Node>,
    base: &Path,
    loader: &dyn DocumentLoader,
    stack: &mut Vec<PathBuf>,
) -> Result<Vec<Node>> {
    let mut out = Vec::with_capacity(children.len());
    for node in children {
        match node {
            Node::Element(element) if is_local_import(&element) => {
                let project = element.attr("Project").unwrap_or_default();
                let path = resolve_import(base, project);
                if stack.contains(&path) {
                    let mut chain: Vec<String> =
                        stack.iter().map(|p| p.display().to_string()).collect();
                    chain.push(path.display().to_string());
                    return Err(MsbuildError::TemplateCycle(chain.join(" -> ")));
                }
                tracing::trace!(import = project, path = %path.display(), "inlining");

                let imported = loader.load(&path)?;
                let imported_base = path.parent().unwrap_or(Path::new("")).to_path_buf();
                stack.push(path);
                let inlined = expand(imported.children, &imported_base, loader, stack)?;
                stack.pop();
                out.extend(inlined);
            }
            Node::Element(mut element) => {
                let nested = std::mem::take(&mut element.children);
                element.children = expand(nested, base, loader, stack)?;
                out.push(Node::Element(element));
            }
            other => out.push(other),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::StagedTree;

    fn import(project: &str) -> Element {
        Element::new("Import").with_attr("Project", project)
    }

    fn marker(name: &str) -> Element {
        Element::new("PropertyGroup").with_attr("Label", name)
    }

    fn project(children: Vec<Element>) -> Element {
        let mut doc = Element::new("Project");
        for child in children {
            doc.push(child);
        }
        doc
    }

    fn labels(doc: &Element) -> Vec<&str> {
        doc.elements().filter_map(|e| e.attr("Label")).collect()
    }

    #[test]
    fn test_is_local_import() {
        assert!(is_local_import(&import("..\\Parent.properties")));
        assert!(is_local_import(&import("DebugOptions.properties")));
        assert!(!is_local_import(&import("$(VCTargetsPath)\\Microsoft.Cpp.props")));
        assert!(!is_local_import(&import("Parent.props")));
        assert!(!is_local_import(&import("lower.properties")));
        assert!(!is_local_import(&marker("A.properties")));
    }

    #[test]
    fn test_chain_is_inlined_in_order() {
        let mut tree = StagedTree::new();
        let root = Path::new("/out/bld/core/core");
        tree.write_document(
            &root.join("B.properties"),
            &project(vec![marker("B"), import("..\\C.properties")]),
        )
        .unwrap();
        tree.write_document(Path::new("/out/bld/core/C.properties"), &project(vec![marker("C")]))
            .unwrap();

        let a = project(vec![marker("A"), import("B.properties")]);
        let closed = flatten(a, root, &tree).unwrap();

        assert_eq!(labels(&closed), vec!["A", "B", "C"]);
        assert!(closed.elements().all(|e| !is_local_import(e)));
    }

    #[test]
    fn test_foreign_imports_and_nesting_are_kept() {
        let mut tree = StagedTree::new();
        tree.write_document(
            Path::new("/p/Options.properties"),
            &project(vec![marker("options")]),
        )
        .unwrap();

        let mut group = Element::new("ImportGroup").with_attr("Label", "group");
        group.push(import("Options.properties"));
        let doc = project(vec![
            import("$(VCTargetsPath)\\Microsoft.Cpp.props"),
            group,
            marker("tail"),
        ]);

        let closed = flatten(doc, Path::new("/p"), &tree).unwrap();
        let children: Vec<&Element> = closed.elements().collect();
        assert_eq!(children.len(), 3);
        assert_eq!(
            children[0].attr("Project"),
            Some("$(VCTargetsPath)\\Microsoft.Cpp.props")
        );
        assert_eq!(labels(children[1]), vec!["options"]);
        assert_eq!(children[2].attr("Label"), Some("tail"));
    }

    #[test]
    fn test_cycle_is_reported() {
        let mut tree = StagedTree::new();
        tree.write_document(Path::new("/p/A.properties"), &project(vec![import("B.properties")]))
            .unwrap();
        tree.write_document(Path::new("/p/B.properties"), &project(vec![import("A.properties")]))
            .unwrap();

        let err = flatten_file(Path::new("/p/A.properties"), &tree).unwrap_err();
        assert!(matches!(err, MsbuildError::TemplateCycle(_)));
    }

    #[test]
    fn test_missing_import_fails() {
        let tree = StagedTree::new();
        let doc = project(vec![import("Gone.properties")]);
        let dir = tempfile::tempdir().unwrap();
        let err = flatten(doc, dir.path(), &tree).unwrap_err();
        assert!(matches!(err, MsbuildError::Io { .. }));
    }
}
