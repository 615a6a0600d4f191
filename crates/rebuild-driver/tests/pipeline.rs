use rebuild_common::{xml, DiagnosticKind, Element};
use rebuild_driver::{Driver, Options};
use std::fs;
use std::path::{Path, PathBuf};

fn workspace() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../..")
}

struct Checkout {
    dir: tempfile::TempDir,
}

impl Checkout {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        for header in [
            "core/os/os.h",
            "scene/2d/sprite.h",
            "modules/gdscript/gdscript.h",
            "thirdparty/zlib/zlib.h",
            "servers/server.h",
        ] {
            let path = dir.path().join("godot").join(header);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, "#pragma once\n").unwrap();
        }
        Self { dir }
    }

    fn source(&self) -> PathBuf {
        self.dir.path().join("godot")
    }

    fn output(&self) -> PathBuf {
        self.dir.path().join("godot_build").join("bld").join("vs19")
    }

    fn options(&self) -> Options {
        let mut options = Options::new(workspace().join("tests/fixtures/godot_build.log"), self.source());
        options.templates = workspace().join("templates");
        options
    }
}

fn read_document(path: &Path) -> Element {
    xml::parse(&fs::read_to_string(path).unwrap()).unwrap()
}

fn compile_settings(path: &Path) -> Element {
    let doc = read_document(path);
    doc.find("ItemDefinitionGroup").unwrap().find("ClCompile").unwrap().clone()
}

#[test]
fn converts_the_report_into_a_solution() {
    let checkout = Checkout::new();
    let mut options = checkout.options();
    options.closed = true;
    let outcome = Driver::new(options).run().unwrap();

    assert!(outcome.committed);
    assert_eq!(outcome.modules, 4);
    assert_eq!(outcome.solution, checkout.source().join("godot_rebuild_vs19.sln"));
    assert!(outcome.solution.is_file());
    assert_eq!(outcome.diagnostics.of_kind(DiagnosticKind::SelfDependency).count(), 1);
    assert_eq!(outcome.diagnostics.of_kind(DiagnosticKind::UnattributedHeader).count(), 1);

    let godot = checkout.output().join("bin").join("godot");
    assert!(godot.join("godot.vcxproj").is_file());
    assert!(godot.join("godot_open.vcxproj").is_file());

    let references = read_document(&godot.join("ProjectReferences.properties"));
    let included: Vec<&str> = references
        .find("ItemGroup")
        .unwrap()
        .elements()
        .filter_map(|r| r.attr("Include"))
        .collect();
    assert_eq!(
        included,
        vec![
            "..\\..\\modules\\module_gdscript\\module_gdscript.vcxproj",
            "..\\..\\scene\\scene\\scene.vcxproj",
            "..\\..\\core\\core\\core.vcxproj",
        ]
    );

    let sources = read_document(&godot.join("DebugSources.properties"));
    let objects: Vec<&Element> = sources
        .elements()
        .flat_map(|g| g.elements())
        .filter(|e| e.local_name() == "Object")
        .collect();
    assert_eq!(objects.len(), 1);

    let scene = checkout.output().join("scene").join("scene");
    let sprite = read_document(&scene.join("DebugSources.properties"))
        .elements()
        .flat_map(|g| g.elements().cloned().collect::<Vec<_>>())
        .find(|e| e.attr("Include").is_some_and(|i| i.ends_with("sprite.cpp")))
        .unwrap();
    assert_eq!(
        sprite.find("PreprocessorDefinitions").unwrap().text(),
        "%(PreprocessorDefinitions);SPRITE_FAST"
    );
    assert_eq!(sprite.find("WarningLevel").unwrap().text(), "TurnOffAllWarnings");

    let assignments = fs::read_to_string(checkout.output().join("header_assignments.json")).unwrap();
    assert!(assignments.contains("modules\\\\module_gdscript"));
}

#[test]
fn edit_and_continue_rewrites_debug_information() {
    let checkout = Checkout::new();
    let mut options = checkout.options();
    options.config.compiler.edit_and_continue = true;
    Driver::new(options).run().unwrap();

    let core = compile_settings(
        &checkout.output().join("core").join("core").join("DebugOptions.properties"),
    );
    assert_eq!(core.find("AdditionalOptions").unwrap().text(), "/nologo /EHsc");
    assert_eq!(core.find("WarningLevel").unwrap().text(), "Level3");
    assert_eq!(core.find("DebugInformationFormat").unwrap().text(), "EditAndContinue");
    assert_eq!(
        core.find("AdditionalIncludeDirectories").unwrap().text(),
        "$(SolutionDir)\\core\\core;$(SolutionDir)\\core;$(SolutionDir)\\thirdparty\\zlib"
    );
}

#[test]
fn dry_run_writes_nothing() {
    let checkout = Checkout::new();
    let mut options = checkout.options();
    options.dry_run = true;
    options.closed = true;
    let outcome = Driver::new(options).run().unwrap();

    assert!(!outcome.committed);
    assert!(outcome.files > 0);
    assert!(!checkout.dir.path().join("godot_build").exists());
    assert!(!outcome.solution.exists());
}

#[test]
fn previous_output_is_replaced_unless_dirty() {
    let checkout = Checkout::new();
    let stale = checkout.output().join("stale.properties");
    fs::create_dir_all(checkout.output()).unwrap();

    fs::write(&stale, "<Project />").unwrap();
    let mut options = checkout.options();
    options.dirty = true;
    Driver::new(options).run().unwrap();
    assert!(stale.exists());

    Driver::new(checkout.options()).run().unwrap();
    assert!(!stale.exists());
}

#[test]
fn unknown_module_reference() {
    let checkout = Checkout::new();
    let trace = checkout.dir.path().join("trace.json");
    fs::write(
        &trace,
        r#"[
            {"kind": "cxx", "attributes": {"target": "main\\main.obj", "source": "main\\main.cpp"}},
            {"kind": "link", "attributes": {
                "target": "bin\\godot.windows.tools.x86_64.exe",
                "sources": "main\\main.obj",
                "libs": "servers\\servers.windows.tools.x86_64.lib"
            }}
        ]"#,
    )
    .unwrap();

    let mut options = checkout.options();
    options.report = trace.clone();
    assert!(Driver::new(options).run().is_err());
    assert!(!checkout.dir.path().join("godot_build").exists());

    let mut options = checkout.options();
    options.report = trace;
    options.dry_run = true;
    let outcome = Driver::new(options).run().unwrap();
    assert_eq!(outcome.diagnostics.of_kind(DiagnosticKind::UnresolvedDependency).count(), 1);
}
