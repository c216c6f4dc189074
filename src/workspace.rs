//! File search over the workspace root and the active-document hint.

use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};
use itertools::Itertools;
use pathdiff::diff_paths;
use tokio::sync::RwLock;
use walkdir::WalkDir;

use crate::document::TextDocument;
use crate::error::{Error, Result};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

#[derive(Debug)]
pub struct Workspace {
    root: PathBuf,
    active_document: RwLock<Option<PathBuf>>,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Workspace {
        Workspace {
            root: root.into(),
            active_document: RwLock::new(None),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn set_active_document(&self, path: Option<PathBuf>) {
        *self.active_document.write().await = path;
    }

    pub async fn active_document(&self) -> Option<PathBuf> {
        self.active_document.read().await.clone()
    }

    /// Whether `path` (absolute, inside the root) matches the workspace-relative `glob`.
    pub fn matches(&self, glob: &str, path: &Path) -> bool {
        let Ok(pattern) = Pattern::new(glob) else {
            return false;
        };
        path.strip_prefix(&self.root)
            .is_ok_and(|relative| pattern.matches_path_with(relative, MATCH_OPTIONS))
    }

    /// All files under the root matching `glob`, in walk order.
    ///
    /// Hidden directories are skipped. The walk is sorted by file name so the
    /// order is stable between scans.
    pub fn find_files(&self, glob: &str) -> Vec<PathBuf> {
        let pattern = match Pattern::new(glob) {
            Ok(pattern) => pattern,
            Err(err) => {
                tracing::debug!(glob, %err, "invalid glob");
                return Vec::new();
            }
        };

        WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                e.depth() == 0
                    || !e
                        .file_name()
                        .to_str()
                        .map(|s| s.starts_with('.'))
                        .unwrap_or(false)
            })
            .flatten()
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| {
                entry
                    .path()
                    .strip_prefix(&self.root)
                    .is_ok_and(|relative| pattern.matches_path_with(relative, MATCH_OPTIONS))
            })
            .map(|entry| entry.into_path())
            .collect_vec()
    }

    /// Stable-sorts `files` farthest first by how many path steps separate them
    /// from `from`, so the nearest file is committed last and wins collisions.
    pub fn order_by_distance(files: &mut [PathBuf], from: &Path) {
        files.sort_by_cached_key(|file| {
            std::cmp::Reverse(
                diff_paths(file, from)
                    .map(|relative| relative.components().count())
                    .unwrap_or(usize::MAX),
            )
        });
    }

    /// Reads a file from disk into a document.
    pub async fn read_document(&self, path: &Path) -> Result<TextDocument> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| Error::Io {
                path: path.to_path_buf(),
                source,
            })?;

        Ok(TextDocument::new(path, &text))
    }
}
