//! In-memory output tree.
//!
//! Every generated file is staged here first. Nothing touches the disk until
//! [`StagedTree::commit`], so a failing run leaves the previous output alone
//! and a dry run leaves no output at all.

use rebuild_common::{paths, xml, Element};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{MsbuildError, Result};

/// Source of parsed project documents, keyed by absolute path.
pub trait DocumentLoader {
    fn load(&self, path: &Path) -> Result<Element>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StagedFile {
    /// Generated content, CRLF line endings already applied.
    Bytes(Vec<u8>),
    /// Verbatim copy of a template file.
    Copy(PathBuf),
}

/// Output files by normalized absolute path.
#[derive(Debug, Clone, Default)]
pub struct StagedTree {
    files: BTreeMap<PathBuf, StagedFile>,
}

impl StagedTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a serialized project document.
    pub fn write_document(&mut self, path: &Path, document: &Element) -> Result<()> {
        let text = document.to_xml().map_err(|e| MsbuildError::xml(path, e))?;
        self.write_text(path, &text);
        Ok(())
    }

    /// Stage text with Windows line endings.
    pub fn write_text(&mut self, path: &Path, text: &str) {
        self.files.insert(
            paths::normalize(path),
            StagedFile::Bytes(crlf(text).into_bytes()),
        );
    }

    pub fn copy(&mut self, path: &Path, from: &Path) {
        self.files
            .insert(paths::normalize(path), StagedFile::Copy(from.to_path_buf()));
    }

    /// Stage a copy unless something is already staged at `path`.
    pub fn copy_if_absent(&mut self, path: &Path, from: &Path) {
        self.files
            .entry(paths::normalize(path))
            .or_insert_with(|| StagedFile::Copy(from.to_path_buf()));
    }

    pub fn get(&self, path: &Path) -> Option<&StagedFile> {
        self.files.get(&paths::normalize(path))
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.get(path).is_some()
    }

    /// Content of a staged file, reading copies from their template.
    pub fn read(&self, path: &Path) -> Result<Option<Vec<u8>>> {
        match self.get(path) {
            Some(StagedFile::Bytes(bytes)) => Ok(Some(bytes.clone())),
            Some(StagedFile::Copy(from)) => fs::read(from)
                .map(Some)
                .map_err(|e| MsbuildError::io(from, e)),
            None => Ok(None),
        }
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.files.keys().map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Write everything to disk. Each directory in `recreate` is removed
    /// first if it exists.
    pub fn commit<P: AsRef<Path>>(&self, recreate: &[P]) -> Result<()> {
        for root in recreate {
            let root = root.as_ref();
            if root.exists() {
                tracing::info!(path = %root.display(), "removing previous output");
                fs::remove_dir_all(root).map_err(|e| MsbuildError::io(root, e))?;
            }
        }

        for (path, file) in &self.files {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(|e| MsbuildError::io(parent, e))?;
            }
            match file {
                StagedFile::Bytes(bytes) => {
                    fs::write(path, bytes).map_err(|e| MsbuildError::io(path, e))?;
                }
                StagedFile::Copy(from) => {
                    fs::copy(from, path).map_err(|e| MsbuildError::io(from, e))?;
                }
            }
        }
        tracing::info!(files = self.files.len(), "wrote output");
        Ok(())
    }
}

impl DocumentLoader for StagedTree {
    /// Staged content wins; anything else is read from disk.
    fn load(&self, path: &Path) -> Result<Element> {
        let bytes = match self.read(path)? {
            Some(bytes) => bytes,
            None => fs::read(path).map_err(|e| MsbuildError::io(path, e))?,
        };
        let text = String::from_utf8_lossy(&bytes);
        xml::parse(text.trim_start_matches('\u{feff}')).map_err(|e| MsbuildError::xml(path, e))
    }
}

/// Convert any mix of line endings into CRLF.
pub fn crlf(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n").replace('\n', "\r\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crlf() {
        assert_eq!(crlf("a\nb\r\nc\rd"), "a\r\nb\r\nc\r\nd");
    }

    #[test]
    fn test_staged_documents_load_without_disk() {
        let mut tree = StagedTree::new();
        let path = Path::new("/nowhere/out/./a/Project.properties");
        let doc = Element::new("Project").with_attr("ToolsVersion", "Current");
        tree.write_document(path, &doc).unwrap();

        let loaded = tree.load(Path::new("/nowhere/out/a/b/../Project.properties")).unwrap();
        assert_eq!(loaded, doc);
        assert!(!Path::new("/nowhere").exists());
    }

    #[test]
    fn test_commit_recreates_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("bld");
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join("stale.txt"), "old").unwrap();

        let template = dir.path().join("template.properties");
        fs::write(&template, "<Project />").unwrap();

        let mut tree = StagedTree::new();
        tree.write_text(&root.join("core/notes.txt"), "one\ntwo\n");
        tree.copy(&root.join("Parent.properties"), &template);
        tree.copy_if_absent(&root.join("Parent.properties"), Path::new("/missing"));
        tree.commit(&[&root]).unwrap();

        assert!(!root.join("stale.txt").exists());
        assert_eq!(fs::read_to_string(root.join("core/notes.txt")).unwrap(), "one\r\ntwo\r\n");
        assert_eq!(fs::read_to_string(root.join("Parent.properties")).unwrap(), "<Project />");
    }
}
