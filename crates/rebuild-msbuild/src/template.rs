//! Template store layout.
//!
//! ```text
//! <templates>/<vs>/include_project.xml        empty generated-document skeleton
//! <templates>/<vs>/bld/<vs>/...               copied as the build root
//! <templates>/<vs>/intermediate_dir/*.properties
//! <templates>/<vs>/<kind>/_<kind>_.vcxproj    project skeleton per module kind
//! <templates>/<vs>/solution/sln.{header,middle,trailer}.txt
//! ```
//!
//! Template text may name `{{configuration}}` and `{{platform}}`; they are
//! filled in when the file is staged.

use rebuild_common::{xml, Element};
use rebuild_model::ModuleKind;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{MsbuildError, Result};

/// Marks template text that needs [`TemplateVars::apply`].
pub(crate) const PLACEHOLDER: &str = "{{";

/// Values of the template placeholders.
#[derive(Debug, Clone, Copy)]
pub struct TemplateVars<'a> {
    pub configuration: &'a str,
    pub platform: &'a str,
}

impl TemplateVars<'_> {
    pub fn apply(&self, text: &str) -> String {
        text.replace("{{configuration}}", self.configuration)
            .replace("{{platform}}", self.platform)
    }
}

#[derive(Debug, Clone)]
pub struct TemplateStore {
    root: PathBuf,
    vs_version: String,
}

impl TemplateStore {
    /// Open the template set for `vs_version` under `templates`.
    pub fn open(templates: &Path, vs_version: &str) -> Result<Self> {
        let root = templates.join(vs_version);
        if !root.is_dir() {
            return Err(MsbuildError::MissingTemplate(root.display().to_string()));
        }
        Ok(Self {
            root,
            vs_version: vs_version.to_string(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn vs_version(&self) -> &str {
        &self.vs_version
    }

    /// Skeleton every generated properties document starts from.
    pub fn include_project(&self) -> Result<Element> {
        let path = self.require(self.root.join("include_project.xml"))?;
        let text = read_text(&path)?;
        xml::parse(&text).map_err(|e| MsbuildError::xml(&path, e))
    }

    /// Directory copied as the root of the build output.
    pub fn build_root(&self) -> Result<PathBuf> {
        self.require(self.root.join("bld").join(&self.vs_version))
    }

    /// Properties files placed in every directory between the build root and
    /// a module.
    pub fn intermediate_files(&self) -> Result<Vec<PathBuf>> {
        let dir = self.require(self.root.join("intermediate_dir"))?;
        let mut files = Vec::new();
        for entry in fs::read_dir(&dir).map_err(|e| MsbuildError::io(&dir, e))? {
            let path = entry.map_err(|e| MsbuildError::io(&dir, e))?.path();
            if path.extension().is_some_and(|ext| ext == "properties") {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    pub fn project(&self, kind: ModuleKind) -> Result<PathBuf> {
        let dir = kind.template_dir();
        self.require(self.root.join(dir).join(format!("_{dir}_.vcxproj")))
    }

    /// One of the solution file fragments: `header`, `middle` or `trailer`.
    pub fn solution_part(&self, part: &str) -> Result<String> {
        let path = self.require(self.root.join("solution").join(format!("sln.{part}.txt")))?;
        read_text(&path)
    }

    fn require(&self, path: PathBuf) -> Result<PathBuf> {
        if path.exists() {
            Ok(path)
        } else {
            Err(MsbuildError::MissingTemplate(path.display().to_string()))
        }
    }
}

fn read_text(path: &Path) -> Result<String> {
    let text = fs::read_to_string(path).map_err(|e| MsbuildError::io(path, e))?;
    Ok(text.trim_start_matches('\u{feff}').to_string())
}
