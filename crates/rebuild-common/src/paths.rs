//! Path helpers.
//!
//! Build traces and project documents use backslash-separated relative paths
//! (`modules\gdscript\tokenizer.h`) regardless of the host platform. These
//! helpers keep that string convention separate from native `Path`s.

use std::path::{Component, Path, PathBuf};

pub const SEPARATOR: char = '\\';

/// Rewrite any forward slashes into the backslash convention.
pub fn to_backslashes(path: &str) -> String {
    path.replace('/', "\\")
}

/// Components of a backslash (or slash) separated path, empty parts skipped.
pub fn components(path: &str) -> impl Iterator<Item = &str> {
    path.split(['\\', '/']).filter(|c| !c.is_empty())
}

/// Everything before the last separator, or `""` for a bare name.
pub fn parent(path: &str) -> &str {
    match path.rfind(['\\', '/']) {
        Some(index) => &path[..index],
        None => "",
    }
}

/// The last component.
pub fn file_name(path: &str) -> &str {
    match path.rfind(['\\', '/']) {
        Some(index) => &path[index + 1..],
        None => path,
    }
}

/// Join two backslash paths.
pub fn join(base: &str, rest: &str) -> String {
    if base.is_empty() {
        rest.to_string()
    } else if rest.is_empty() {
        base.to_string()
    } else {
        format!("{}{}{}", base.trim_end_matches(['\\', '/']), SEPARATOR, rest)
    }
}

/// True if `path` equals `prefix` or lies below it. The empty prefix
/// contains everything.
pub fn is_under(path: &str, prefix: &str) -> bool {
    if prefix.is_empty() {
        return true;
    }
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with(SEPARATOR) || prefix.ends_with(SEPARATOR),
        None => false,
    }
}

/// Convert a backslash relative path into a native one.
pub fn to_native(path: &str) -> PathBuf {
    components(path).collect()
}

/// Render a native path in the backslash convention.
pub fn to_document_string(path: &Path) -> String {
    let mut out = String::new();
    for component in path.components() {
        let part = match component {
            Component::Prefix(prefix) => prefix.as_os_str().to_string_lossy().into_owned(),
            Component::RootDir => {
                out.push(SEPARATOR);
                continue;
            }
            Component::CurDir => ".".to_string(),
            Component::ParentDir => "..".to_string(),
            Component::Normal(name) => name.to_string_lossy().into_owned(),
        };
        if !out.is_empty() && !out.ends_with(SEPARATOR) {
            out.push(SEPARATOR);
        }
        out.push_str(&part);
    }
    out
}

/// Lexically resolve `.` and `..` components.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(out.components().next_back(), Some(Component::Normal(_)))
                    && out.pop();
                if !popped {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Make `path` absolute against the current directory and normalize it.
pub fn absolute(path: &Path) -> std::io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(normalize(path))
    } else {
        Ok(normalize(&std::env::current_dir()?.join(path)))
    }
}

/// Relative path leading from directory `from` to `to`. Both must be
/// normalized and either both absolute or both relative to the same base.
pub fn relative(from: &Path, to: &Path) -> PathBuf {
    let from: Vec<Component> = from.components().collect();
    let to: Vec<Component> = to.components().collect();
    let common = from.iter().zip(to.iter()).take_while(|(a, b)| a == b).count();

    let mut out = PathBuf::new();
    for _ in common..from.len() {
        out.push("..");
    }
    for component in &to[common..] {
        out.push(component.as_os_str());
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parent_and_file_name() {
        assert_eq!(parent("modules\\gdscript\\tokenizer.h"), "modules\\gdscript");
        assert_eq!(parent("main.h"), "");
        assert_eq!(file_name("modules\\gdscript"), "gdscript");
        assert_eq!(file_name("core"), "core");
    }

    #[test]
    fn test_is_under_respects_component_boundaries() {
        assert!(is_under("modules\\gdscript", "modules\\gdscript"));
        assert!(is_under("modules\\gdscript\\parser", "modules\\gdscript"));
        assert!(!is_under("modules\\gdscript_extra", "modules\\gdscript"));
        assert!(is_under("anything", ""));
    }

    #[test]
    fn test_relative() {
        let from = Path::new("/work/build/bld/vs19/modules/gdscript");
        let to = Path::new("/work/godot");
        assert_eq!(
            to_document_string(&relative(from, to)),
            "..\\..\\..\\..\\..\\godot"
        );
        assert_eq!(relative(Path::new("/a/b"), Path::new("/a/b")), PathBuf::from("."));
    }

    #[test]
    fn test_normalize() {
        assert_eq!(
            normalize(Path::new("/a/b/../c/./d")),
            PathBuf::from("/a/c/d")
        );
        assert_eq!(normalize(Path::new("../x")), PathBuf::from("../x"));
    }

    #[test]
    fn test_native_round_trip() {
        let native = to_native("platform\\windows\\godot.h");
        assert_eq!(to_document_string(&native), "platform\\windows\\godot.h");
        assert_eq!(join("core", "io"), "core\\io");
        assert_eq!(join("", "io"), "io");
    }
}
