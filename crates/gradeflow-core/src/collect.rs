//! Document collection from a directory tree
//!
//! Walks a root in file-name order, prunes ignored directories, keeps files
//! whose extension is accepted and whose name is not ignored, and reads each
//! as UTF-8. A file that cannot be read is logged and recorded as skipped;
//! it never aborts the walk.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use walkdir::{DirEntry, WalkDir};

use crate::config::CollectionConfig;
use crate::document::{Origin, SourceDocument};
use crate::error::{GradeError, Result};

/// A file that matched the filters but could not be loaded
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedDocument {
    pub path: PathBuf,
    pub reason: String,
}

/// Result of walking one root
#[derive(Debug, Clone, Default)]
pub struct Collected {
    pub documents: Vec<SourceDocument>,
    pub skipped: Vec<SkippedDocument>,
}

impl Collected {
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

fn is_ignored_dir(entry: &DirEntry, config: &CollectionConfig) -> bool {
    // The root itself is never pruned
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| config.ignored_directories.iter().any(|d| d == name))
}

fn is_candidate(path: &Path, config: &CollectionConfig) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    if config.ignored_files.iter().any(|f| f == name) {
        return false;
    }
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| config.extensions.iter().any(|accepted| accepted == ext))
}

fn read_document(root: &Path, path: &Path, origin: Origin) -> Result<SourceDocument> {
    let bytes = fs::read(path).map_err(|e| GradeError::DocumentRead {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let text = String::from_utf8(bytes).map_err(|e| GradeError::DocumentRead {
        path: path.to_path_buf(),
        reason: format!("not valid UTF-8: {}", e.utf8_error()),
    })?;

    let label = path
        .strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/");
    Ok(SourceDocument::new(origin, label, path, text))
}

/// Collect every matching document under `root`.
///
/// Fails with `SourceNotFound` when `root` does not exist. Unreadable files
/// are returned in [`Collected::skipped`].
#[tracing::instrument(skip_all, fields(root = %root.display(), origin = %origin))]
pub fn collect_documents(
    root: &Path,
    origin: Origin,
    config: &CollectionConfig,
) -> Result<Collected> {
    if !root.exists() {
        return Err(GradeError::SourceNotFound {
            root: root.to_path_buf(),
        });
    }

    let mut collected = Collected::default();
    let walker = WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_ignored_dir(e, config));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());
                tracing::warn!(path = %path.display(), error = %e, "skipping unreadable entry");
                collected.skipped.push(SkippedDocument {
                    path,
                    reason: e.to_string(),
                });
                continue;
            }
        };

        if !entry.file_type().is_file() || !is_candidate(entry.path(), config) {
            continue;
        }

        match read_document(root, entry.path(), origin) {
            Ok(document) => collected.documents.push(document),
            Err(e) => {
                tracing::warn!(error = %e, "skipping document");
                collected.skipped.push(SkippedDocument {
                    path: entry.path().to_path_buf(),
                    reason: e.to_string(),
                });
            }
        }
    }

    tracing::debug!(
        documents = collected.documents.len(),
        skipped = collected.skipped.len(),
        "collected documents"
    );
    Ok(collected)
}
