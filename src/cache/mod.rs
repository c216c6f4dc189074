//! The in-memory resource cache.
//!
//! Each resource type is either absent (never scanned) or holds the complete
//! set of its files. A per-type lock makes sure a type is populated by exactly
//! one scan even when several requests need it at once.

mod entry;

#[cfg(test)]
mod tests;

pub use entry::TypeEntry;

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use crate::config::Settings;
use crate::document::TextDocument;
use crate::resource::{
    classifier_for, Classifier, DataKind, LocationData, PackType, ResourceFile, ResourceType,
    CLASSIFIERS,
};
use crate::workspace::Workspace;

/// Identifier → definition, flattened over every file of one type.
pub type IdentifierIndex = BTreeMap<String, LocationData>;

#[derive(Debug)]
pub struct ResourceCache {
    workspace: Arc<Workspace>,
    proximity_ordering: bool,
    entries: RwLock<HashMap<ResourceType, Arc<TypeEntry>>>,
    locks: Mutex<HashMap<ResourceType, Arc<Mutex<()>>>>,
    /// Bumped by every full clear so a scan that straddles one is not committed.
    generation: AtomicU64,
    scans: std::sync::Mutex<HashMap<ResourceType, usize>>,
}

impl ResourceCache {
    pub fn new(workspace: Arc<Workspace>, settings: &Settings) -> ResourceCache {
        ResourceCache {
            workspace,
            proximity_ordering: settings.proximity_ordering,
            entries: RwLock::new(HashMap::new()),
            locks: Mutex::new(HashMap::new()),
            generation: AtomicU64::new(0),
            scans: std::sync::Mutex::new(HashMap::new()),
        }
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// Every indexed file of `resource_type`, populating the type on first use.
    ///
    /// Types that are not backed by files yield an empty entry.
    pub async fn get_all_by_type(&self, resource_type: ResourceType) -> Arc<TypeEntry> {
        if let Some(entry) = self.cached(resource_type).await {
            return entry;
        }
        let Some(classifier) = classifier_for(resource_type) else {
            return Arc::default();
        };

        let lock = self.type_lock(resource_type).await;
        let _guard = lock.lock().await;

        // Someone else may have finished the scan while we were waiting.
        if let Some(entry) = self.cached(resource_type).await {
            return entry;
        }

        let generation = self.generation.load(Ordering::SeqCst);
        let entry = Arc::new(self.populate(classifier).await);

        if generation == self.generation.load(Ordering::SeqCst) {
            self.entries
                .write()
                .await
                .insert(resource_type, entry.clone());
        } else {
            debug!(?resource_type, "cache cleared during scan; result not kept");
        }

        entry
    }

    /// The `Definition` identifiers of every admitted file of `resource_type`.
    pub async fn get_identifiers_by_file_type(
        &self,
        resource_type: ResourceType,
        pack_filter: Option<PackType>,
    ) -> IdentifierIndex {
        self.get_identifiers_by_kind(resource_type, DataKind::Definition, pack_filter)
            .await
    }

    /// Flattens one data kind over all files; a later file overwrites an earlier
    /// one declaring the same identifier.
    pub async fn get_identifiers_by_kind(
        &self,
        resource_type: ResourceType,
        kind: DataKind,
        pack_filter: Option<PackType>,
    ) -> IdentifierIndex {
        let entry = self.get_all_by_type(resource_type).await;
        let mut index = IdentifierIndex::new();

        for file in entry.files() {
            if !file.pack_type.admitted_by(pack_filter) {
                continue;
            }
            for (identifier, info) in file.get(kind).into_iter().flatten() {
                index.insert(
                    identifier.clone(),
                    LocationData::new(identifier.as_str(), &file.path, info.range),
                );
            }
        }

        index
    }

    /// Exact lookup, falling back to `identifier:` prefixed keys for parented types.
    pub async fn find_by_identifier(
        &self,
        resource_type: ResourceType,
        identifier: &str,
        pack_filter: Option<PackType>,
    ) -> Option<LocationData> {
        let mut index = self
            .get_identifiers_by_file_type(resource_type, pack_filter)
            .await;

        if let Some(location) = index.remove(identifier) {
            return Some(location);
        }
        if !resource_type.allows_parented_lookup() {
            return None;
        }

        let parent = format!("{identifier}:");
        index
            .into_iter()
            .find(|(key, _)| key.starts_with(&parent))
            .map(|(_, location)| location)
    }

    /// Re-extracts one file from disk into every populated type it belongs to.
    pub async fn refresh_cache_for_file(&self, path: &Path) {
        match self.workspace.read_document(path).await {
            Ok(document) => self.refresh_document(&document).await,
            Err(err) => {
                debug!(%err, "refresh skipped");
                self.delete_file_from_cache(path).await;
            }
        }
    }

    /// Re-extracts `document` into every populated type it belongs to.
    ///
    /// Types that were never scanned are left alone; they pick the file up on
    /// their first scan. A file that no longer parses leaves its types.
    pub async fn refresh_document(&self, document: &TextDocument) {
        let path = document.path();

        for classifier in CLASSIFIERS {
            let resource_type = classifier.resource_type;
            let lock = self.type_lock(resource_type).await;
            let _guard = lock.lock().await;

            let mut entries = self.entries.write().await;
            let Some(entry) = entries.get_mut(&resource_type) else {
                continue;
            };
            if !self.workspace.matches(classifier.glob, path) && !entry.contains(path) {
                continue;
            }

            let entry = Arc::make_mut(entry);
            match ResourceFile::extract(classifier, document) {
                Some(file) => {
                    debug!(?resource_type, path = %path.display(), "refreshed");
                    entry.upsert(file);
                }
                None => {
                    entry.remove(path);
                }
            }
        }
    }

    /// Drops `path` (or every file below it) from all types.
    pub async fn delete_file_from_cache(&self, path: &Path) {
        let mut entries = self.entries.write().await;
        for (resource_type, entry) in entries.iter_mut() {
            if entry.paths().iter().any(|file| file.starts_with(path)) {
                Arc::make_mut(entry).remove(path);
                debug!(?resource_type, path = %path.display(), "removed from cache");
            }
        }
    }

    /// Drops everything. The next request of each type scans again.
    pub async fn empty_cache(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.entries.write().await.clear();
        info!("resource cache cleared");
    }

    /// How many bulk scans `resource_type` has gone through.
    pub fn scan_count(&self, resource_type: ResourceType) -> usize {
        self.scans
            .lock()
            .map(|scans| scans.get(&resource_type).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    async fn cached(&self, resource_type: ResourceType) -> Option<Arc<TypeEntry>> {
        self.entries.read().await.get(&resource_type).cloned()
    }

    async fn type_lock(&self, resource_type: ResourceType) -> Arc<Mutex<()>> {
        self.locks
            .lock()
            .await
            .entry(resource_type)
            .or_default()
            .clone()
    }

    async fn populate(&self, classifier: &Classifier) -> TypeEntry {
        let resource_type = classifier.resource_type;
        if let Ok(mut scans) = self.scans.lock() {
            *scans.entry(resource_type).or_default() += 1;
        }

        let mut files = self.workspace.find_files(classifier.glob);
        if self.proximity_ordering {
            if let Some(active) = self.workspace.active_document().await {
                Workspace::order_by_distance(&mut files, &active);
            }
        }

        let mut entry = TypeEntry::default();
        for path in files {
            let document = match self.workspace.read_document(&path).await {
                Ok(document) => document,
                Err(err) => {
                    debug!(%err, "skipping unreadable file");
                    continue;
                }
            };
            if let Some(file) = ResourceFile::extract(classifier, &document) {
                entry.upsert(file);
            }
        }

        info!(?resource_type, files = entry.len(), "populated resource cache");
        entry
    }
}
