//! `.vcxproj.filters` documents: how the IDE groups a project's files.

use rebuild_common::{paths, Element, Node};
use rebuild_model::Module;
use rustc_hash::FxHashSet;
use uuid::Uuid;

use crate::project::braced;

const SOURCE_FILES: &str = "Source Files";
const HEADER_FILES: &str = "Header Files";
const OBJECT_FILES: &str = "Object Files from SCons Build";
const LOST_AND_FOUND: &str = "Lost and Found";

const SOURCE_EXTENSIONS: &str = "cpp;c;cc;cxx;c++;cppm;ixx;def;odl;idl;hpj;bat;asm;asmx";
const HEADER_EXTENSIONS: &str = "h;hh;hpp;hxx;h++;hm;inl;inc;ipp;xsd";

/// Filter layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterStyle {
    /// One filter per file category.
    Flat,
    /// One filter per source directory.
    #[default]
    FileSystem,
}

/// Builds a filters document for one module.
struct FilterWriter<'a> {
    doc: Element,
    declarations: Element,
    declared: FxHashSet<String>,
    namespace: Uuid,
    source_root: &'a str,
}

impl<'a> FilterWriter<'a> {
    fn new(skeleton: &Element, project_guid: &str, source_root: &'a str) -> Self {
        Self {
            doc: skeleton.clone(),
            declarations: Element::new("ItemGroup"),
            declared: FxHashSet::default(),
            namespace: Uuid::new_v5(&Uuid::NAMESPACE_OID, project_guid.as_bytes()),
            source_root,
        }
    }

    fn declare(&mut self, name: &str, extensions: &str) {
        if !self.declared.insert(name.to_string()) {
            return;
        }
        let id = Uuid::new_v5(&self.namespace, name.as_bytes());
        let filter = self.declarations.push(Element::new("Filter").with_attr("Include", name));
        filter.push(Element::new("UniqueIdentifier").with_text(braced(id)));
        filter.push(Element::new("Extensions").with_text(extensions));
    }

    /// Declare the directory filter of `path` and all of its ancestors.
    fn declare_directories(&mut self, path: &str) -> String {
        let directory = paths::parent(path);
        if directory.is_empty() {
            return LOST_AND_FOUND.to_string();
        }
        let mut walk = directory;
        while !walk.is_empty() && !self.declared.contains(walk) {
            self.declare(walk, "");
            walk = paths::parent(walk);
        }
        directory.to_string()
    }

    fn items(&mut self, tag: &str, files: &[String], filter: impl Fn(&mut Self, &str) -> String) {
        if files.is_empty() {
            return;
        }
        let mut group = Element::new("ItemGroup");
        for file in files {
            let name = filter(self, file);
            let item = group.push(Element::new(tag).with_attr("Include", paths::join(self.source_root, file)));
            item.push(Element::new("Filter").with_text(name));
        }
        self.doc.push(group);
    }

    /// Filter declarations go first, ahead of the items using them.
    fn finish(self) -> Element {
        let mut doc = self.doc;
        doc.children.insert(0, Node::Element(self.declarations));
        doc
    }
}

/// Build the filters document of `module`. Filter identifiers are derived
/// from the project GUID and the filter name.
pub fn module_filters(
    skeleton: &Element,
    module: &Module,
    project_guid: &str,
    source_root: &str,
    style: FilterStyle,
) -> Element {
    let mut writer = FilterWriter::new(skeleton, project_guid, source_root);
    match style {
        FilterStyle::Flat => {
            writer.declare(SOURCE_FILES, SOURCE_EXTENSIONS);
            writer.declare(HEADER_FILES, HEADER_EXTENSIONS);
            writer.items("ClCompile", &module.sources, |_, _| SOURCE_FILES.to_string());
            writer.items("ClInclude", &module.headers, |_, _| HEADER_FILES.to_string());
        }
        FilterStyle::FileSystem => {
            writer.items("ClCompile", &module.sources, |w, file| w.declare_directories(file));
            writer.items("ClInclude", &module.headers, |w, file| w.declare_directories(file));
        }
    }
    if !module.opaque_objects.is_empty() {
        writer.declare(OBJECT_FILES, "obj");
        writer.items("Object", &module.opaque_objects, |_, _| OBJECT_FILES.to_string());
    }
    if style == FilterStyle::FileSystem {
        writer.declare(
            LOST_AND_FOUND,
            &format!("{SOURCE_EXTENSIONS};{HEADER_EXTENSIONS}"),
        );
    }
    writer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rebuild_model::{ModuleId, ModuleKind};

    fn module() -> Module {
        let mut module = Module::new(ModuleId::new("core\\core"), ModuleKind::StaticLibrary, "core\\core.lib");
        module.sources = vec!["core\\io\\file.cpp".to_string(), "core\\os.cpp".to_string()];
        module.headers = vec!["core\\io\\file.h".to_string()];
        module
    }

    fn declared(doc: &Element) -> Vec<&str> {
        doc.elements()
            .next()
            .unwrap()
            .elements()
            .filter_map(|f| f.attr("Include"))
            .collect()
    }

    #[test]
    fn test_file_system_filters() {
        let skeleton = Element::new("Project");
        let doc = module_filters(&skeleton, &module(), "{GUID}", "..\\..", FilterStyle::FileSystem);

        assert_eq!(declared(&doc), vec!["core\\io", "core", "Lost and Found"]);
        let groups: Vec<&Element> = doc.elements().collect();
        assert_eq!(groups.len(), 3);
        let first = groups[1].find("ClCompile").unwrap();
        assert_eq!(first.attr("Include"), Some("..\\..\\core\\io\\file.cpp"));
        assert_eq!(first.find("Filter").unwrap().text(), "core\\io");
    }

    #[test]
    fn test_flat_filters_with_objects() {
        let skeleton = Element::new("Project");
        let mut module = module();
        module.opaque_objects = vec!["platform\\windows\\godot_res.obj".to_string()];
        let doc = module_filters(&skeleton, &module, "{GUID}", "..", FilterStyle::Flat);

        assert_eq!(
            declared(&doc),
            vec!["Source Files", "Header Files", "Object Files from SCons Build"]
        );
        let objects = doc.elements().last().unwrap().find("Object").unwrap();
        assert_eq!(objects.find("Filter").unwrap().text(), OBJECT_FILES);
    }

    #[test]
    fn test_filter_identifiers_are_stable() {
        let skeleton = Element::new("Project");
        let a = module_filters(&skeleton, &module(), "{A}", "..", FilterStyle::FileSystem);
        let b = module_filters(&skeleton, &module(), "{A}", "..", FilterStyle::FileSystem);
        let c = module_filters(&skeleton, &module(), "{B}", "..", FilterStyle::FileSystem);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
