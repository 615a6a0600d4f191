use clap::Parser;
use miette::Result;
use rebuild_common::Diagnostics;
use rebuild_driver::{Driver, Options, Outcome};
use rebuild_msbuild::FilterStyle;
use rebuild_trace::{RebuildConfig, TraceFormat};
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "rebuild")]
#[command(author, version, about = "Generate Visual Studio projects from a SCons build report")]
struct Cli {
    /// Build report captured from the SCons build (or a JSON trace)
    build_report_path: PathBuf,

    /// Source repository the build ran in
    #[arg(short = 'S', long, default_value = "../godot")]
    source_repo_path: PathBuf,

    /// Directory to generate into [default: <repo>_build next to the repository]
    #[arg(short = 'B', long)]
    build_path: Option<PathBuf>,

    /// Create one self-contained project file per module instead of the
    /// inheritance tree
    #[arg(long)]
    closed: bool,

    /// Decoration the build adds to its artifact names
    #[arg(short = 'F', long)]
    build_flavor: Option<String>,

    /// Template set to generate from
    #[arg(short = 'M', long)]
    vs_version: Option<String>,

    /// Rebuild every module with edit-and-continue debug information
    #[arg(short = 'E', long)]
    edit_and_continue: bool,

    /// Run every phase but write nothing
    #[arg(long)]
    dry_run: bool,

    /// Keep existing output instead of recreating the build root
    #[arg(long)]
    dirty: bool,

    /// Group files by kind instead of by directory
    #[arg(long)]
    flat_filters: bool,

    /// Template store directory
    #[arg(long, default_value = "templates")]
    templates: PathBuf,

    /// Configuration file (rebuild.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Trace format [default: from the report's extension]
    #[arg(long)]
    format: Option<ReportFormat>,

    /// Increase logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum ReportFormat {
    /// SCons XML build report
    Xml,
    /// JSON array of records
    Json,
}

impl From<ReportFormat> for TraceFormat {
    fn from(format: ReportFormat) -> Self {
        match format {
            ReportFormat::Xml => TraceFormat::Xml,
            ReportFormat::Json => TraceFormat::Json,
        }
    }
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

impl Cli {
    /// Configuration file settings with command line flags applied on top.
    fn config(&self) -> Result<RebuildConfig> {
        let mut config = match &self.config {
            Some(path) => RebuildConfig::from_file(path)?,
            None => RebuildConfig::default(),
        };
        if let Some(flavor) = &self.build_flavor {
            config.trace.flavor = flavor.clone();
        }
        if let Some(vs_version) = &self.vs_version {
            config.project.vs_version = vs_version.clone();
        }
        if self.edit_and_continue {
            config.compiler.edit_and_continue = true;
        }
        Ok(config)
    }

    fn options(&self) -> Result<Options> {
        let mut options = Options::new(&self.build_report_path, &self.source_repo_path);
        options.format = self.format.map(TraceFormat::from);
        options.build_path = self.build_path.clone();
        options.templates = self.templates.clone();
        options.closed = self.closed;
        options.dry_run = self.dry_run;
        options.dirty = self.dirty;
        options.filters = if self.flat_filters {
            FilterStyle::Flat
        } else {
            FilterStyle::FileSystem
        };
        options.config = self.config()?;
        Ok(options)
    }
}

/// Every collected diagnostic, rendered at its own severity.
fn rendered(diagnostics: &Diagnostics) -> Vec<String> {
    diagnostics
        .iter()
        .map(|diagnostic| format!("{:?}", miette::Report::new(diagnostic.clone())))
        .collect()
}

fn report(diagnostics: &Diagnostics) {
    for text in rendered(diagnostics) {
        eprintln!("{text}");
    }
}

fn summary(outcome: &Outcome) {
    let verb = if outcome.committed { "Generated" } else { "Would generate" };
    println!(
        "{verb} {} projects ({} files) in {}",
        outcome.modules,
        outcome.files,
        outcome.output_root.display()
    );
    println!("Solution: {}", outcome.solution.display());
    if !outcome.diagnostics.is_empty() {
        println!("{} diagnostics", outcome.diagnostics.len());
    }
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let driver = Driver::new(cli.options()?);
    let outcome = driver.run()?;
    report(&outcome.diagnostics);
    summary(&outcome);
    Ok(())
}
