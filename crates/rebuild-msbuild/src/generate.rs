//! Staging of the complete output for a project model.

use rebuild_common::{paths, Element};
use rebuild_model::{Module, ProjectModel};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{MsbuildError, Result};
use crate::filters::{module_filters, FilterStyle};
use crate::flatten::flatten_file;
use crate::project::{
    module_libraries, module_options, module_sources, project_guid, project_properties,
    project_references, DocumentContext, Reference,
};
use crate::solution::{render_solution, SolutionEntry, SolutionTemplate};
use crate::stage::StagedTree;
use crate::template::{TemplateStore, TemplateVars, PLACEHOLDER};

pub const HEADER_ASSIGNMENTS: &str = "header_assignments.json";

/// Where and how to generate.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Name of the source repository, part of every project GUID.
    pub repo_name: String,
    /// Absolute path of the source repository.
    pub source_root: PathBuf,
    /// Absolute path of the generated tree (`<build>/bld/<vs>`).
    pub output_root: PathBuf,
    /// Absolute path of the solution file.
    pub solution_path: PathBuf,
    /// Configuration name, also used in document file names (`Debug`).
    pub configuration: String,
    /// Platform name (`x64`).
    pub platform: String,
    /// Reference and list the flattened projects instead of the open ones.
    pub closed: bool,
    pub filters: FilterStyle,
    pub edit_and_continue: bool,
}

impl GenerateOptions {
    /// `Debug|x64`.
    pub fn condition(&self) -> String {
        format!("{}|{}", self.configuration, self.platform)
    }

    fn template_vars(&self) -> TemplateVars<'_> {
        TemplateVars {
            configuration: &self.configuration,
            platform: &self.platform,
        }
    }
}

/// File locations of one module's project.
struct ProjectFiles {
    dir: PathBuf,
    open: PathBuf,
    closed: PathBuf,
}

impl ProjectFiles {
    fn of(module: &Module, options: &GenerateOptions) -> Self {
        let dir = options.output_root.join(module.id.to_native());
        let name = module.id.file_name();
        Self {
            open: dir.join(format!("{name}_open.vcxproj")),
            closed: dir.join(format!("{name}.vcxproj")),
            dir,
        }
    }

    fn project(&self, closed: bool) -> &Path {
        if closed {
            &self.closed
        } else {
            &self.open
        }
    }
}

fn filters_path(project: &Path) -> PathBuf {
    let mut name = project.as_os_str().to_owned();
    name.push(".filters");
    PathBuf::from(name)
}

/// Stage every output file for `model`. Closed projects are rendered against
/// the staged tree, so nothing needs to exist on disk except the templates.
pub fn generate(model: &ProjectModel, templates: &TemplateStore, options: &GenerateOptions) -> Result<StagedTree> {
    let mut tree = StagedTree::new();
    let skeleton = templates.include_project()?;

    stage_build_root(&mut tree, templates, options)?;
    let intermediates = templates.intermediate_files()?;

    for module in model.modules() {
        stage_module(&mut tree, model, module, templates, &skeleton, options)?;
        stage_intermediate_dirs(&mut tree, module, &intermediates, options)?;
    }

    if options.closed {
        for module in model.modules() {
            let files = ProjectFiles::of(module, options);
            let closed = flatten_file(&files.open, &tree)?;
            tree.write_document(&files.closed, &closed)?;
            if let Some(filters) = tree.read(&filters_path(&files.open))? {
                tree.write_text(&filters_path(&files.closed), &String::from_utf8_lossy(&filters));
            }
            tracing::debug!(module = %module.id, "rendered closed project");
        }
    }

    let assignments: BTreeMap<&str, &str> = model
        .header_assignment()
        .iter()
        .map(|(header, owner)| (header, owner.as_str()))
        .collect();
    tree.write_text(
        &options.output_root.join(HEADER_ASSIGNMENTS),
        &serde_json::to_string_pretty(&assignments)?,
    );

    stage_solution(&mut tree, model, templates, options)?;
    tracing::info!(files = tree.len(), closed = options.closed, "staged project files");
    Ok(tree)
}

/// Stage one template file. Files naming a placeholder are rendered with the
/// configuration filled in; everything else is copied as is.
fn stage_template(
    tree: &mut StagedTree,
    target: &Path,
    source: &Path,
    vars: TemplateVars<'_>,
) -> Result<()> {
    let bytes = fs::read(source).map_err(|e| MsbuildError::io(source, e))?;
    match std::str::from_utf8(&bytes) {
        Ok(text) if text.contains(PLACEHOLDER) => {
            tree.write_text(target, &vars.apply(text.trim_start_matches('\u{feff}')));
        }
        _ => tree.copy(target, source),
    }
    Ok(())
}

fn stage_build_root(tree: &mut StagedTree, templates: &TemplateStore, options: &GenerateOptions) -> Result<()> {
    let root = templates.build_root()?;
    for entry in WalkDir::new(&root).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        if let Ok(relative) = entry.path().strip_prefix(&root) {
            let target = options.output_root.join(relative);
            stage_template(tree, &target, entry.path(), options.template_vars())?;
        }
    }
    Ok(())
}

/// Every directory between the build root and the module directory gets the
/// intermediate properties, which chain the module's imports up to the root.
fn stage_intermediate_dirs(
    tree: &mut StagedTree,
    module: &Module,
    files: &[PathBuf],
    options: &GenerateOptions,
) -> Result<()> {
    let mut dir = paths::parent(module.id.as_str());
    while !dir.is_empty() {
        let target = options.output_root.join(paths::to_native(dir));
        for file in files {
            let Some(name) = file.file_name() else {
                continue;
            };
            let path = target.join(name);
            if !tree.contains(&path) {
                stage_template(tree, &path, file, options.template_vars())?;
            }
        }
        dir = paths::parent(dir);
    }
    Ok(())
}

fn stage_module(
    tree: &mut StagedTree,
    model: &ProjectModel,
    module: &Module,
    templates: &TemplateStore,
    skeleton: &Element,
    options: &GenerateOptions,
) -> Result<()> {
    let files = ProjectFiles::of(module, options);
    let source_root = paths::to_document_string(&paths::relative(&files.dir, &options.source_root));
    let condition = options.condition();
    let ctx = DocumentContext {
        skeleton,
        condition: &condition,
        source_root: &source_root,
        edit_and_continue: options.edit_and_continue,
    };
    let guid = project_guid(&options.repo_name, module.id.as_str());
    let cfg = &options.configuration;

    tree.write_document(
        &files.dir.join("Project.properties"),
        &project_properties(&ctx, module, &guid),
    )?;
    tree.write_document(
        &files.dir.join(format!("{cfg}Options.properties")),
        &module_options(&ctx, module),
    )?;
    tree.write_document(
        &files.dir.join(format!("{cfg}Sources.properties")),
        &module_sources(&ctx, module),
    )?;

    let references: Vec<Reference> = module
        .dependencies
        .iter()
        .filter_map(|id| model.get(id.as_str()))
        .map(|dependency| {
            let target = ProjectFiles::of(dependency, options);
            let path = paths::relative(&files.dir, target.project(options.closed));
            Reference {
                include: paths::to_document_string(&path),
                guid: project_guid(&options.repo_name, dependency.id.as_str()),
            }
        })
        .collect();
    tree.write_document(
        &files.dir.join("ProjectReferences.properties"),
        &project_references(&ctx, module, &references),
    )?;
    tree.write_document(
        &files.dir.join(format!("{cfg}Libraries.properties")),
        &module_libraries(&ctx, module),
    )?;

    stage_template(tree, &files.open, &templates.project(module.kind)?, options.template_vars())?;
    tree.write_document(
        &filters_path(&files.open),
        &module_filters(skeleton, module, &guid, &source_root, options.filters),
    )?;

    tracing::debug!(module = %module.id, dir = %files.dir.display(), "staged module");
    Ok(())
}

fn stage_solution(
    tree: &mut StagedTree,
    model: &ProjectModel,
    templates: &TemplateStore,
    options: &GenerateOptions,
) -> Result<()> {
    let vars = options.template_vars();
    let template = SolutionTemplate {
        header: vars.apply(&templates.solution_part("header")?),
        middle: vars.apply(&templates.solution_part("middle")?),
        trailer: vars.apply(&templates.solution_part("trailer")?),
    };
    let solution_dir = options.solution_path.parent().unwrap_or(Path::new(""));
    let entries: Vec<SolutionEntry> = model
        .modules()
        .map(|module| {
            let files = ProjectFiles::of(module, options);
            SolutionEntry {
                name: module.id.file_name().to_string(),
                path: paths::to_document_string(&paths::relative(solution_dir, files.project(options.closed))),
                guid: project_guid(&options.repo_name, module.id.as_str()),
            }
        })
        .collect();

    let text = render_solution(&template, &entries, &options.condition());
    tree.write_text(&options.solution_path, &text);
    Ok(())
}
