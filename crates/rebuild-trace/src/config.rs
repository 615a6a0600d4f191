//! Conversion configuration (`rebuild.toml`).

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::TraceError;

/// Root configuration. Every section is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RebuildConfig {
    /// Generated solution and project settings.
    #[serde(default)]
    pub project: ProjectConfig,

    /// How the trace names its artifacts.
    #[serde(default)]
    pub trace: TraceConfig,

    /// Header discovery and attribution.
    #[serde(default)]
    pub headers: HeaderConfig,

    /// Compiler settings processing.
    #[serde(default)]
    pub compiler: CompilerConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Template set under the templates directory (e.g. `vs19`).
    #[serde(default = "default_vs_version")]
    pub vs_version: String,

    /// Configuration name (`Debug`).
    #[serde(default = "default_configuration")]
    pub configuration: String,

    /// Platform name (`x64`).
    #[serde(default = "default_platform")]
    pub platform: String,

    /// Solution file stem; defaults to `<repo>_rebuild_<vs_version>`.
    #[serde(default)]
    pub solution_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceConfig {
    /// Decoration the build stamps on its artifacts.
    #[serde(default = "default_flavor")]
    pub flavor: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderConfig {
    /// Trees whose modules own their own directory rather than their parent.
    #[serde(default = "default_module_roots")]
    pub module_roots: Vec<String>,

    /// Name decoration of grouped modules (`modules\module_gdscript`).
    #[serde(default = "default_grouping_marker")]
    pub grouping_marker: String,

    /// Top-level trees never attributed to a module.
    #[serde(default = "default_excluded_trees")]
    pub excluded_trees: Vec<String>,

    /// File extensions treated as headers.
    #[serde(default = "default_header_extensions")]
    pub extensions: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompilerConfig {
    /// Flags dropped from every compile command.
    #[serde(default)]
    pub remove_flags: Vec<String>,

    /// Rebuild every module with edit-and-continue debug information.
    #[serde(default)]
    pub edit_and_continue: bool,
}

fn default_vs_version() -> String {
    "vs19".to_string()
}

fn default_configuration() -> String {
    "Debug".to_string()
}

fn default_platform() -> String {
    "x64".to_string()
}

fn default_flavor() -> String {
    ".windows.tools.x86_64".to_string()
}

fn default_module_roots() -> Vec<String> {
    vec!["modules\\".to_string(), "platform\\".to_string()]
}

fn default_grouping_marker() -> String {
    "\\module_".to_string()
}

fn default_excluded_trees() -> Vec<String> {
    vec!["thirdparty\\".to_string(), "tests\\".to_string()]
}

fn default_header_extensions() -> Vec<String> {
    vec!["h".to_string()]
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            vs_version: default_vs_version(),
            configuration: default_configuration(),
            platform: default_platform(),
            solution_name: None,
        }
    }
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            flavor: default_flavor(),
        }
    }
}

impl Default for HeaderConfig {
    fn default() -> Self {
        Self {
            module_roots: default_module_roots(),
            grouping_marker: default_grouping_marker(),
            excluded_trees: default_excluded_trees(),
            extensions: default_header_extensions(),
        }
    }
}

impl RebuildConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| TraceError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Ok(toml::from_str(&content)?)
    }

    /// `Debug|x64`
    pub fn condition(&self) -> String {
        format!("{}|{}", self.project.configuration, self.project.platform)
    }

    /// Flags removed from compile commands, including the debug information
    /// flags replaced by edit-and-continue.
    pub fn removed_flags(&self) -> Vec<String> {
        let mut flags = self.compiler.remove_flags.clone();
        if self.compiler.edit_and_continue {
            for flag in ["/Z7", "/Zi", "/ZI"] {
                if !flags.iter().any(|f| f == flag) {
                    flags.push(flag.to_string());
                }
            }
        }
        flags
    }
}
