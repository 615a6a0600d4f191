use miette::{IntoDiagnostic, Result, WrapErr};
use rebuild_common::{paths, Diagnostics};
use rebuild_model::{discover_headers, synthesize, ProjectModel, SynthOptions};
use rebuild_msbuild::{generate, FilterStyle, GenerateOptions, StagedTree, TemplateStore};
use rebuild_trace::{BuildTrace, RebuildConfig, TraceFormat};
use std::path::{Path, PathBuf};

/// Everything a conversion run needs.
#[derive(Debug, Clone)]
pub struct Options {
    /// Build report or JSON trace.
    pub report: PathBuf,
    /// Trace format; guessed from the report's extension when unset.
    pub format: Option<TraceFormat>,
    pub source_repo: PathBuf,
    /// Defaults to `<repo>_build` next to the source repository.
    pub build_path: Option<PathBuf>,
    pub templates: PathBuf,
    pub closed: bool,
    /// Run every phase but write nothing.
    pub dry_run: bool,
    /// Keep the previous build root instead of recreating it.
    pub dirty: bool,
    pub filters: FilterStyle,
    pub config: RebuildConfig,
}

impl Options {
    pub fn new(report: impl Into<PathBuf>, source_repo: impl Into<PathBuf>) -> Self {
        Self {
            report: report.into(),
            format: None,
            source_repo: source_repo.into(),
            build_path: None,
            templates: PathBuf::from("templates"),
            closed: false,
            dry_run: false,
            dirty: false,
            filters: FilterStyle::default(),
            config: RebuildConfig::default(),
        }
    }
}

/// Result of a successful run.
#[derive(Debug)]
pub struct Outcome {
    pub modules: usize,
    pub files: usize,
    pub output_root: PathBuf,
    pub solution: PathBuf,
    /// False for dry runs.
    pub committed: bool,
    pub diagnostics: Diagnostics,
}

/// Conversion pipeline: ingest, synthesize, stage, commit.
pub struct Driver {
    options: Options,
}

impl Driver {
    pub fn new(options: Options) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Read and index the build trace.
    pub fn ingest(&self) -> Result<BuildTrace> {
        let report = &self.options.report;
        let format = self.options.format.unwrap_or_else(|| TraceFormat::from_path(report));
        let trace = BuildTrace::from_file(report, format, &self.options.config.trace.flavor)?;
        Ok(trace)
    }

    /// Build the project model from an ingested trace and the headers found
    /// in the source repository.
    pub fn synthesize(&self, trace: &BuildTrace, diagnostics: &mut Diagnostics) -> Result<ProjectModel> {
        let config = &self.options.config;
        let headers = discover_headers(&self.source_repo()?, &config.headers.extensions)?;
        let options = SynthOptions {
            config,
            best_effort: self.options.dry_run,
        };
        Ok(synthesize(trace, &headers, options, diagnostics)?)
    }

    /// Stage all output for `model` without writing anything.
    pub fn stage(&self, model: &ProjectModel) -> Result<StagedTree> {
        let project = &self.options.config.project;
        let templates = TemplateStore::open(&self.options.templates, &project.vs_version)?;
        let tree = generate(model, &templates, &self.generate_options()?)?;
        Ok(tree)
    }

    /// Run the whole pipeline. Output is written only once every phase has
    /// succeeded, and never in a dry run.
    pub fn run(&self) -> Result<Outcome> {
        let mut diagnostics = Diagnostics::new();

        let trace = self.ingest()?;
        let model = self.synthesize(&trace, &mut diagnostics)?;
        let tree = self.stage(&model)?;
        let generate = self.generate_options()?;

        let committed = if self.options.dry_run {
            tracing::info!(files = tree.len(), "dry run, nothing written");
            false
        } else {
            let recreate: Vec<&Path> = if self.options.dirty {
                Vec::new()
            } else {
                vec![generate.output_root.as_path()]
            };
            tree.commit(&recreate)?;
            true
        };

        Ok(Outcome {
            modules: model.len(),
            files: tree.len(),
            output_root: generate.output_root,
            solution: generate.solution_path,
            committed,
            diagnostics,
        })
    }

    fn source_repo(&self) -> Result<PathBuf> {
        paths::absolute(&self.options.source_repo)
            .into_diagnostic()
            .wrap_err("Failed to resolve the source repository path")
    }

    fn repo_name(source_repo: &Path) -> String {
        source_repo
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    fn generate_options(&self) -> Result<GenerateOptions> {
        let config = &self.options.config;
        let project = &config.project;
        let source_root = self.source_repo()?;
        let repo_name = Self::repo_name(&source_root);

        let build_path = match &self.options.build_path {
            Some(path) => paths::absolute(path)
                .into_diagnostic()
                .wrap_err("Failed to resolve the build path")?,
            None => source_root
                .parent()
                .unwrap_or(Path::new(""))
                .join(format!("{repo_name}_build")),
        };
        let solution_name = project
            .solution_name
            .clone()
            .unwrap_or_else(|| format!("{repo_name}_rebuild_{}", project.vs_version));

        Ok(GenerateOptions {
            output_root: build_path.join("bld").join(&project.vs_version),
            solution_path: source_root.join(format!("{solution_name}.sln")),
            configuration: project.configuration.clone(),
            platform: project.platform.clone(),
            closed: self.options.closed,
            filters: self.options.filters,
            edit_and_continue: config.compiler.edit_and_continue,
            repo_name,
            source_root,
        })
    }
}
