//! Markdown documents on disk.

use crate::types::Document;
use docqa_core::{AppError, AppResult};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const MARKDOWN_EXTENSION: &str = "md";

/// Read-only view of the docs directory.
#[derive(Debug, Clone)]
pub struct DocumentLibrary {
    root: PathBuf,
}

impl DocumentLibrary {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn ensure_root(&self) -> AppResult<()> {
        if !self.root.is_dir() {
            return Err(AppError::Config(format!(
                "Docs directory not found: {}",
                self.root.display()
            )));
        }
        Ok(())
    }

    /// Markdown filenames directly under the docs directory, sorted.
    pub fn list(&self) -> AppResult<Vec<String>> {
        self.ensure_root()?;

        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.is_file() && is_markdown(&path) {
                if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                    names.push(name.to_string());
                }
            }
        }

        names.sort();
        Ok(names)
    }

    /// Fetch one top-level document by filename.
    ///
    /// Anything that is not a plain `*.md` name resolving inside the docs
    /// directory is reported as not found.
    pub fn get(&self, filename: &str) -> AppResult<Document> {
        let not_found = || AppError::DocumentNotFound(filename.to_string());

        if filename.is_empty()
            || !filename.ends_with(".md")
            || filename.contains('/')
            || filename.contains('\\')
            || filename.contains("..")
        {
            return Err(not_found());
        }

        let root = self.root.canonicalize().map_err(|_| not_found())?;
        let path = root.join(filename).canonicalize().map_err(|_| not_found())?;

        if !path.starts_with(&root) || !path.is_file() {
            return Err(not_found());
        }

        let body = std::fs::read_to_string(&path)?;
        Ok(Document::new(filename, body))
    }

    /// Every `*.md` file under the docs directory, recursively, sorted by
    /// relative path.
    pub fn load_all(&self) -> AppResult<Vec<Document>> {
        self.ensure_root()?;

        let mut paths: Vec<(String, PathBuf)> = WalkDir::new(&self.root)
            .follow_links(false)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file() && is_markdown(e.path()))
            .filter_map(|e| {
                let relative = e.path().strip_prefix(&self.root).ok()?;
                Some((relative_id(relative), e.path().to_path_buf()))
            })
            .collect();

        if paths.is_empty() {
            return Err(AppError::Config(format!(
                "No markdown files found in {}",
                self.root.display()
            )));
        }

        paths.sort();

        let mut documents = Vec::with_capacity(paths.len());
        for (id, path) in paths {
            tracing::debug!("Loading document: {}", id);
            let body = std::fs::read_to_string(&path)?;
            documents.push(Document::new(id, body));
        }

        Ok(documents)
    }
}

fn is_markdown(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(MARKDOWN_EXTENSION)
}

/// Relative path with `/` separators on every platform.
fn relative_id(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
