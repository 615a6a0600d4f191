//! Per-module properties documents.
//!
//! Each function fills a copy of the template skeleton (`include_project.xml`)
//! with one aspect of a [`Module`]. The open project imports them all.

use rebuild_common::{paths, Element};
use rebuild_model::{Axis, Module, ModuleSettings, Override, SettingValue};
use uuid::Uuid;

/// Namespace of generated project identifiers.
pub const GUID_NAMESPACE: Uuid = Uuid::from_u128(0x1337);

const WARNING_LEVELS: [&str; 6] = ["TurnOffAllWarnings", "Level1", "Level2", "Level3", "Level4", "Level5"];

/// What the compiler uses when a command names no warning switch.
const DEFAULT_WARNING_LEVEL: &str = WARNING_LEVELS[1];

/// Stable project identifier: the same repository and module always map to
/// the same GUID.
pub fn project_guid(repo_name: &str, module: &str) -> String {
    let id = Uuid::new_v5(&GUID_NAMESPACE, format!("{repo_name}/{module}").as_bytes());
    braced(id)
}

pub(crate) fn braced(id: Uuid) -> String {
    format!("{{{}}}", id.hyphenated().to_string().to_uppercase())
}

/// Shared inputs of the document builders.
#[derive(Debug, Clone, Copy)]
pub struct DocumentContext<'a> {
    pub skeleton: &'a Element,
    /// MSBuild condition value, `Debug|x64`.
    pub condition: &'a str,
    /// Relative path from the module directory to the source repository.
    pub source_root: &'a str,
    pub edit_and_continue: bool,
}

impl DocumentContext<'_> {
    fn condition_attr(&self) -> String {
        format!("'$(Configuration)|$(Platform)'=='{}'", self.condition)
    }

    fn source_path(&self, path: &str) -> String {
        paths::join(self.source_root, path)
    }
}

/// `Project.properties`: identity of the project.
pub fn project_properties(ctx: &DocumentContext<'_>, module: &Module, guid: &str) -> Element {
    let mut doc = ctx.skeleton.clone();
    let group = doc.push(Element::new("PropertyGroup").with_attr("Label", "Globals"));
    group.push(Element::new("ProjectGuid").with_text(guid));
    group.push(Element::new("RootNamespace").with_text(module.id.file_name()));
    group.push(Element::new("ProjectName").with_text(module.id.file_name()));
    let parent = paths::join("$(SolutionDir)", paths::parent(module.id.as_str()));
    group.push(Element::new("ParentPathInSourceTree").with_text(format!("{parent}\\")));
    group.push(Element::new("TargetPathInSourceTree").with_text(module.target.as_str()));
    doc
}

/// `<Cfg>Options.properties`: module-wide compile defaults.
pub fn module_options(ctx: &DocumentContext<'_>, module: &Module) -> Element {
    let settings = &module.settings;
    let mut doc = ctx.skeleton.clone();
    let group = doc.push(Element::new("ItemDefinitionGroup").with_attr("Condition", ctx.condition_attr()));
    let compile = group.push(Element::new("ClCompile"));

    let defines = settings.default_for(Axis::Define).map(|v| v.join(";")).unwrap_or_default();
    compile.push(Element::new("PreprocessorDefinitions").with_text(defines));

    let (options, level) = split_warning_level(default_flags(settings));
    if !options.is_empty() {
        compile.push(Element::new("AdditionalOptions").with_text(options.join(" ")));
    }
    if let Some(level) = level {
        compile.push(Element::new("WarningLevel").with_text(level));
    }

    let mut includes = vec![local_include(module)];
    if let Some(value) = settings.default_for(Axis::Include) {
        includes.extend(value.entries().iter().cloned());
    }
    compile.push(Element::new("AdditionalIncludeDirectories").with_text(includes.join(";")));

    if ctx.edit_and_continue {
        compile.push(Element::new("DebugInformationFormat").with_text("EditAndContinue"));
    }
    doc
}

/// `<Cfg>Sources.properties`: compiled sources with their overrides, headers
/// and opaque objects.
pub fn module_sources(ctx: &DocumentContext<'_>, module: &Module) -> Element {
    let mut doc = ctx.skeleton.clone();
    let condition = ctx.condition_attr();

    let sources = doc.push(Element::new("ItemGroup").with_attr("Condition", condition.clone()));
    for source in &module.sources {
        let mut item = Element::new("ClCompile").with_attr("Include", ctx.source_path(source));
        source_metadata(&mut item, module, source);
        sources.push(item);
    }

    if !module.headers.is_empty() {
        let headers = doc.push(Element::new("ItemGroup").with_attr("Condition", condition.clone()));
        for header in &module.headers {
            headers.push(Element::new("ClInclude").with_attr("Include", ctx.source_path(header)));
        }
    }

    if !module.opaque_objects.is_empty() {
        let objects = doc.push(Element::new("ItemGroup").with_attr("Condition", condition));
        for object in &module.opaque_objects {
            objects.push(Element::new("Object").with_attr("Include", ctx.source_path(object)));
        }
    }
    doc
}

/// A reference from one project to another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// Project file path relative to the referencing project.
    pub include: String,
    pub guid: String,
}

/// `ProjectReferences.properties`. Archives are handed their libraries
/// literally and never reference other projects.
pub fn project_references(ctx: &DocumentContext<'_>, module: &Module, references: &[Reference]) -> Element {
    let mut doc = ctx.skeleton.clone();
    if module.kind.is_archive() || references.is_empty() {
        return doc;
    }
    let group = doc.push(Element::new("ItemGroup"));
    for reference in references {
        let item = group.push(Element::new("ProjectReference").with_attr("Include", reference.include.as_str()));
        item.push(Element::new("Project").with_text(reference.guid.as_str()));
    }
    doc
}

/// `<Cfg>Libraries.properties`: link or archive inputs.
pub fn module_libraries(ctx: &DocumentContext<'_>, module: &Module) -> Element {
    let mut doc = ctx.skeleton.clone();
    let group = doc.push(Element::new("ItemDefinitionGroup").with_attr("Condition", ctx.condition_attr()));
    let tool = group.push(Element::new(if module.kind.is_archive() { "Lib" } else { "Link" }));

    // Only what the build named; the toolset's default libraries stay out.
    if !module.external_libs.is_empty() {
        tool.push(Element::new("AdditionalDependencies").with_text(module.external_libs.join(";")));
    }
    if !module.library_paths.is_empty() {
        tool.push(Element::new("AdditionalLibraryDirectories").with_text(module.library_paths.join(";")));
    }
    if let Some(flags) = module.link_flags.as_deref() {
        tool.push(Element::new("AdditionalOptions").with_text(flags));
    }
    doc
}

/// The module's own directory, searched before anything the build names.
fn local_include(module: &Module) -> String {
    paths::join("$(SolutionDir)", module.id.as_str())
}

fn default_flags(settings: &ModuleSettings) -> Vec<String> {
    Axis::FLAGS
        .iter()
        .filter_map(|&axis| settings.default_for(axis))
        .flat_map(|v| v.entries().iter().cloned())
        .collect()
}

/// Whether `source` is compiled as C.
fn is_c_source(source: &str) -> bool {
    paths::file_name(source)
        .rsplit_once('.')
        .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case("c"))
}

/// Per-source metadata for the axes a source overrides. A C source in a
/// module with a C++ flags default gets its full flag list so the default
/// does not reach it.
fn source_metadata(item: &mut Element, module: &Module, source: &str) {
    let settings = &module.settings;
    let overrides = settings.overrides_for(source);
    let delta_for = |axis: Axis| overrides.and_then(|o| o.get(&axis));

    if let Some(delta) = delta_for(Axis::Define) {
        let text = match delta {
            Override::Extend(extra) => format!("%(PreprocessorDefinitions);{}", extra.join(";")),
            Override::Replace(value) => value.join(";"),
        };
        item.push(Element::new("PreprocessorDefinitions").with_text(text));
    }

    let c_source = is_c_source(source);
    let drops_cxx = c_source
        && Axis::FLAGS
            .iter()
            .any(|&axis| axis.is_cxx_only() && settings.default_for(axis).is_some());
    let flag_deltas: Vec<&Override> = Axis::FLAGS.iter().filter_map(|&a| delta_for(a)).collect();
    let extends_only = !drops_cxx && flag_deltas.iter().all(|d| matches!(d, Override::Extend(_)));

    if !flag_deltas.is_empty() && extends_only {
        let extra: Vec<String> = flag_deltas
            .iter()
            .filter_map(|d| match d {
                Override::Extend(extra) => Some(extra.entries().iter().cloned()),
                Override::Replace(_) => None,
            })
            .flatten()
            .collect();
        let (tokens, level) = split_warning_level(extra);
        let text = format!("%(AdditionalOptions) {}", tokens.join(" "));
        item.push(Element::new("AdditionalOptions").with_text(text.trim_end()));
        if let Some(level) = level {
            item.push(Element::new("WarningLevel").with_text(level));
        }
    } else if !extends_only {
        // The item replaces the module options, so the warning level is
        // always spelled out.
        let all: Vec<String> = Axis::FLAGS
            .iter()
            .filter(|axis| !(c_source && axis.is_cxx_only()))
            .filter_map(|&axis| settings.effective(source, axis))
            .flat_map(|v| v.entries().to_vec())
            .collect();
        let (tokens, level) = split_warning_level(all);
        item.push(Element::new("AdditionalOptions").with_text(tokens.join(" ")));
        item.push(Element::new("WarningLevel").with_text(level.unwrap_or(DEFAULT_WARNING_LEVEL)));
    }

    if let Some(delta) = delta_for(Axis::Include) {
        let text = match delta {
            Override::Extend(extra) => format!("%(AdditionalIncludeDirectories);{}", extra.join(";")),
            Override::Replace(value) => {
                let local = SettingValue::new(vec![local_include(module)]);
                local.extended(value).join(";")
            }
        };
        item.push(Element::new("AdditionalIncludeDirectories").with_text(text));
    }
}

/// Pull warning-level switches out of a compile command. `/W<n>` becomes the
/// matching level, `/w` turns warnings off; the first `/W<n>` wins.
pub fn split_warning_level(tokens: Vec<String>) -> (Vec<String>, Option<&'static str>) {
    let mut level = None;
    let mut disabled = false;
    let mut rest = Vec::with_capacity(tokens.len());
    for token in tokens {
        if token == "/w" {
            disabled = true;
        } else if let Some(n) = warning_level(&token) {
            level.get_or_insert(WARNING_LEVELS[n]);
        } else {
            rest.push(token);
        }
    }
    if level.is_none() && disabled {
        level = Some(WARNING_LEVELS[0]);
    }
    (rest, level)
}

fn warning_level(token: &str) -> Option<usize> {
    let digit = token.strip_prefix("/W")?;
    match digit.as_bytes() {
        [d @ b'0'..=b'5'] => Some((d - b'0') as usize),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rebuild_model::{minimize, ModuleId, ModuleKind, Normalizer};
    use rebuild_trace::{ActionKind, BuildRecord};

    fn compile(source: &str, pairs: &[(&str, &str)]) -> BuildRecord {
        let mut attributes = vec![
            ("target".to_string(), source.replace(".cpp", ".obj")),
            ("source".to_string(), source.to_string()),
        ];
        attributes.extend(pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())));
        BuildRecord::new(ActionKind::CompileCxx, attributes.into_iter().collect()).unwrap()
    }

    fn module_of(records: &[BuildRecord]) -> Module {
        let refs: Vec<&BuildRecord> = records.iter().collect();
        let mut module = Module::new(ModuleId::new("scene\\scene"), ModuleKind::StaticLibrary, "scene\\scene.lib");
        module.sources = records.iter().filter_map(|r| r.source()).map(str::to_string).collect();
        module.settings = minimize(&refs, &Axis::ALL, &Normalizer::new(Vec::new()));
        module
    }

    fn scene_module() -> Module {
        let records = vec![
            compile("scene\\a.cpp", &[("define", "/DA /DB"), ("flags", "/W3 /EHsc"), ("include", "/Iscene")]),
            compile("scene\\b.cpp", &[("define", "/DA /DB"), ("flags", "/W3 /EHsc"), ("include", "/Iscene")]),
            compile("scene\\c.cpp", &[("define", "/DA /DB"), ("flags", "/W3 /EHsc"), ("include", "/Iscene")]),
            compile(
                "scene\\d.cpp",
                &[("define", "/DA /DB /DC"), ("flags", "/w /EHsc"), ("include", "/Ithirdparty")],
            ),
        ];
        let mut module = module_of(&records);
        module.headers = vec!["scene\\node.h".to_string()];
        module
    }

    fn context(skeleton: &Element) -> DocumentContext<'_> {
        DocumentContext {
            skeleton,
            condition: "Debug|x64",
            source_root: "..\\..\\..\\..\\godot",
            edit_and_continue: true,
        }
    }

    fn child_text(element: &Element, name: &str) -> Option<String> {
        element.find(name).map(Element::text)
    }

    #[test]
    fn test_project_guid() {
        let guid = project_guid("godot", "core\\core");
        assert_eq!(guid, project_guid("godot", "core\\core"));
        assert_ne!(guid, project_guid("godot", "scene\\scene"));
        assert!(guid.starts_with('{') && guid.ends_with('}'));
        assert_eq!(guid.len(), 38);
        assert_eq!(guid, guid.to_uppercase());
    }

    #[test]
    fn test_split_warning_level() {
        let tokens = |s: &str| s.split_whitespace().map(str::to_string).collect::<Vec<_>>();
        assert_eq!(split_warning_level(tokens("/W3 /EHsc")), (tokens("/EHsc"), Some("Level3")));
        assert_eq!(split_warning_level(tokens("/w /EHsc")), (tokens("/EHsc"), Some("TurnOffAllWarnings")));
        assert_eq!(split_warning_level(tokens("/Wall /WX")), (tokens("/Wall /WX"), None));
    }

    #[test]
    fn test_module_options() {
        let skeleton = Element::new("Project");
        let module = scene_module();
        let doc = module_options(&context(&skeleton), &module);

        let group = doc.find("ItemDefinitionGroup").unwrap();
        assert_eq!(group.attr("Condition"), Some("'$(Configuration)|$(Platform)'=='Debug|x64'"));
        let compile = group.find("ClCompile").unwrap();
        assert_eq!(child_text(compile, "PreprocessorDefinitions").unwrap(), "A;B");
        assert_eq!(child_text(compile, "AdditionalOptions").unwrap(), "/EHsc");
        assert_eq!(child_text(compile, "WarningLevel").unwrap(), "Level3");
        assert_eq!(
            child_text(compile, "AdditionalIncludeDirectories").unwrap(),
            "$(SolutionDir)\\scene\\scene;$(SolutionDir)\\scene"
        );
        assert_eq!(child_text(compile, "DebugInformationFormat").unwrap(), "EditAndContinue");
    }

    #[test]
    fn test_module_sources() {
        let skeleton = Element::new("Project");
        let module = scene_module();
        let doc = module_sources(&context(&skeleton), &module);

        let groups: Vec<&Element> = doc.elements().collect();
        assert_eq!(groups.len(), 2);
        let items: Vec<&Element> = groups[0].elements().collect();
        assert_eq!(items.len(), 4);
        assert_eq!(items[0].attr("Include"), Some("..\\..\\..\\..\\godot\\scene\\a.cpp"));
        assert!(items[0].children.is_empty());

        let d = items[3];
        assert_eq!(child_text(d, "PreprocessorDefinitions").unwrap(), "%(PreprocessorDefinitions);C");
        assert_eq!(child_text(d, "AdditionalOptions").unwrap(), "/EHsc");
        assert_eq!(child_text(d, "WarningLevel").unwrap(), "TurnOffAllWarnings");
        assert_eq!(
            child_text(d, "AdditionalIncludeDirectories").unwrap(),
            "$(SolutionDir)\\scene\\scene;$(SolutionDir)\\thirdparty"
        );

        let header = groups[1].find("ClInclude").unwrap();
        assert_eq!(header.attr("Include"), Some("..\\..\\..\\..\\godot\\scene\\node.h"));
    }

    #[test]
    fn test_replaced_flags_spell_out_warning_level() {
        let skeleton = Element::new("Project");
        let module = module_of(&[
            compile("scene\\a.cpp", &[("flags", "/W3 /EHsc")]),
            compile("scene\\b.cpp", &[("flags", "/W3 /EHsc")]),
            compile("scene\\c.cpp", &[("flags", "/EHsc /GR")]),
        ]);
        let doc = module_sources(&context(&skeleton), &module);
        let items: Vec<&Element> = doc.find("ItemGroup").unwrap().elements().collect();

        assert!(items[0].children.is_empty());
        assert_eq!(child_text(items[2], "AdditionalOptions").unwrap(), "/EHsc /GR");
        assert_eq!(child_text(items[2], "WarningLevel").unwrap(), "Level1");
    }

    #[test]
    fn test_c_sources_drop_cxx_flags() {
        let skeleton = Element::new("Project");
        let c_record = BuildRecord::new(
            ActionKind::CompileC,
            [("target", "scene\\md5.obj"), ("source", "scene\\md5.c"), ("flags", "/W3")]
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
        .unwrap();
        let module = module_of(&[
            compile("scene\\a.cpp", &[("flags", "/W3"), ("cxxflags", "/GR")]),
            compile("scene\\b.cpp", &[("flags", "/W3"), ("cxxflags", "/GR")]),
            c_record,
        ]);
        let ctx = context(&skeleton);

        let options = module_options(&ctx, &module);
        let compile = options.find("ItemDefinitionGroup").unwrap().find("ClCompile").unwrap();
        assert_eq!(child_text(compile, "AdditionalOptions").unwrap(), "/GR");

        let doc = module_sources(&ctx, &module);
        let items: Vec<&Element> = doc.find("ItemGroup").unwrap().elements().collect();
        assert!(items[0].children.is_empty());
        let md5 = items[2];
        assert_eq!(md5.attr("Include"), Some("..\\..\\..\\..\\godot\\scene\\md5.c"));
        assert_eq!(child_text(md5, "AdditionalOptions").unwrap(), "");
        assert_eq!(child_text(md5, "WarningLevel").unwrap(), "Level3");
    }

    #[test]
    fn test_references_and_libraries() {
        let skeleton = Element::new("Project");
        let ctx = context(&skeleton);
        let mut module = Module::new(ModuleId::new("bin\\godot"), ModuleKind::Executable, "bin\\godot.exe");
        module.external_libs = vec!["winmm.lib".to_string()];
        module.link_flags = Some("/SUBSYSTEM:WINDOWS".to_string());
        module.library_paths = SettingValue::new(vec!["$(SolutionDir)\\lib".to_string()]);

        let references = vec![Reference {
            include: "..\\core\\core\\core_open.vcxproj".to_string(),
            guid: project_guid("godot", "core\\core"),
        }];
        let doc = project_references(&ctx, &module, &references);
        let item = doc.find("ItemGroup").unwrap().find("ProjectReference").unwrap();
        assert_eq!(item.attr("Include"), Some("..\\core\\core\\core_open.vcxproj"));
        assert_eq!(child_text(item, "Project").unwrap(), references[0].guid);

        let libs = module_libraries(&ctx, &module);
        let link = libs.find("ItemDefinitionGroup").unwrap().find("Link").unwrap();
        assert_eq!(child_text(link, "AdditionalDependencies").unwrap(), "winmm.lib");
        assert_eq!(child_text(link, "AdditionalLibraryDirectories").unwrap(), "$(SolutionDir)\\lib");
        assert_eq!(child_text(link, "AdditionalOptions").unwrap(), "/SUBSYSTEM:WINDOWS");

        module.kind = ModuleKind::StaticLibrary;
        assert!(project_references(&ctx, &module, &references).children.is_empty());
    }
}
