use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::resource::ResourceFile;

/// The complete set of indexed files of one resource type.
///
/// Files keep the order they were committed in; later files win identifier collisions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeEntry {
    order: Vec<PathBuf>,
    files: HashMap<PathBuf, ResourceFile>,
}

impl TypeEntry {
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    pub fn get(&self, path: &Path) -> Option<&ResourceFile> {
        self.files.get(path)
    }

    /// Files in commit order.
    pub fn files(&self) -> impl Iterator<Item = &ResourceFile> {
        self.order.iter().filter_map(|path| self.files.get(path))
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.order
    }

    /// Adds `file`, or replaces the file at the same path keeping its position.
    pub(super) fn upsert(&mut self, file: ResourceFile) {
        if !self.files.contains_key(&file.path) {
            self.order.push(file.path.clone());
        }
        self.files.insert(file.path.clone(), file);
    }

    /// Removes `path` and, when it names a folder, everything below it.
    pub(super) fn remove(&mut self, path: &Path) -> bool {
        let before = self.order.len();
        self.order.retain(|file| !file.starts_with(path));
        self.files.retain(|file, _| !file.starts_with(path));
        before != self.order.len()
    }
}
