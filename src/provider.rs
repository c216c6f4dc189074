//! The entry points the language server calls into.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tower_lsp::lsp_types::{CompletionResponse, DocumentLink, Location, Position};
use tracing::debug;

use crate::cache::ResourceCache;
use crate::classify::{classify_document, is_resource_document};
use crate::completion::get_completions;
use crate::config::Settings;
use crate::document::TextDocument;
use crate::gotodef::goto_definition;
use crate::links::document_links;
use crate::workspace::Workspace;

/// Definitions, completions and links for one workspace, over a shared resource cache.
#[derive(Debug)]
pub struct Provider {
    cache: ResourceCache,
    settings: Settings,
}

impl Provider {
    pub fn new(root: impl Into<PathBuf>, settings: Settings) -> Provider {
        let workspace = Arc::new(Workspace::new(root));
        Provider {
            cache: ResourceCache::new(workspace, &settings),
            settings,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn cache(&self) -> &ResourceCache {
        &self.cache
    }

    /// The document being edited; the nearest files to it win identifier collisions.
    pub async fn set_active_document(&self, path: Option<PathBuf>) {
        self.cache.workspace().set_active_document(path).await;
    }

    pub async fn resolve_definition(
        &self,
        document: &TextDocument,
        position: Position,
    ) -> Option<Location> {
        goto_definition(&self.cache, &self.settings, document, position).await
    }

    pub async fn resolve_completions(
        &self,
        document: &TextDocument,
        position: Position,
    ) -> Option<CompletionResponse> {
        get_completions(&self.cache, &self.settings, document, position).await
    }

    pub async fn resolve_document_links(&self, document: &TextDocument) -> Vec<DocumentLink> {
        document_links(&self.cache, &self.settings, document).await
    }

    /// Saved resource files are re-extracted in place.
    pub async fn on_save(&self, document: &TextDocument) {
        if is_resource_document(classify_document(document)) {
            self.cache.refresh_document(document).await;
        } else {
            debug!(path = %document.path().display(), "saved file declares no resources");
        }
    }

    pub async fn on_delete(&self, paths: &[impl AsRef<Path>]) {
        for path in paths {
            self.cache.delete_file_from_cache(path.as_ref()).await;
        }
    }

    /// Renamed or new files may belong to any type, so everything is scanned again.
    pub async fn on_rename_or_create(&self, paths: &[impl AsRef<Path>]) {
        if !paths.is_empty() {
            self.cache.empty_cache().await;
        }
    }

    pub async fn purge_cache(&self) {
        self.cache.empty_cache().await;
    }
}
