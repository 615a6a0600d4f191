//! Solution file assembly.

use std::fmt::Write;

/// Project type GUID of Visual C++ projects.
const VC_PROJECT_TYPE: &str = "{8BC9CEB8-8B4A-11D0-8D11-00A0C91BC942}";

/// One project line of the solution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolutionEntry {
    pub name: String,
    /// Project file path relative to the solution directory.
    pub path: String,
    pub guid: String,
}

/// Template text around the generated sections.
#[derive(Debug, Clone, Default)]
pub struct SolutionTemplate {
    pub header: String,
    pub middle: String,
    pub trailer: String,
}

/// Render the solution: header, project entries, middle, one configuration
/// mapping per project, trailer. Line endings are applied when staging.
pub fn render_solution(template: &SolutionTemplate, entries: &[SolutionEntry], condition: &str) -> String {
    let mut out = String::new();
    push_section(&mut out, &template.header);
    for entry in entries {
        let _ = writeln!(
            out,
            "Project(\"{VC_PROJECT_TYPE}\") = \"{}\", \"{}\", \"{}\"",
            entry.name, entry.path, entry.guid
        );
        out.push_str("EndProject\n");
    }
    push_section(&mut out, &template.middle);
    for entry in entries {
        let _ = writeln!(out, "\t\t{}.{condition}.ActiveCfg = {condition}", entry.guid);
        let _ = writeln!(out, "\t\t{}.{condition}.Build.0 = {condition}", entry.guid);
    }
    push_section(&mut out, &template.trailer);
    out
}

fn push_section(out: &mut String, text: &str) {
    if text.is_empty() {
        return;
    }
    out.push_str(text);
    if !text.ends_with('\n') {
        out.push('\n');
    }
}
