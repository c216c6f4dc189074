use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use bedrock_definitions::config::Settings;
use bedrock_definitions::document::TextDocument;
use bedrock_definitions::error::Error;
use bedrock_definitions::logging;
use bedrock_definitions::provider::Provider;
use clap::Parser;
use serde_json::Value;
use tokio::sync::RwLock;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer, LspService, Server};
use tracing::{debug, info, warn};

const PURGE_CACHE: &str = "bedrock-definitions.purgeCache";

#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Log at debug level, ignoring RUST_LOG
    #[arg(short, long)]
    verbose: bool,
}

struct Backend {
    client: Client,
    provider: Arc<RwLock<Option<Arc<Provider>>>>,
    documents: Arc<RwLock<HashMap<PathBuf, TextDocument>>>,
}

impl Backend {
    fn new(client: Client) -> Backend {
        Backend {
            client,
            provider: Arc::new(RwLock::new(None)),
            documents: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    async fn provider(&self) -> Option<Arc<Provider>> {
        self.provider.read().await.clone()
    }

    /// The open buffer for `uri`, or the file on disk.
    async fn document(&self, uri: &Url) -> Option<TextDocument> {
        let path = file_path(uri).ok()?;
        if let Some(document) = self.documents.read().await.get(&path) {
            return Some(document.clone());
        }

        let provider = self.provider().await?;
        provider
            .cache()
            .workspace()
            .read_document(&path)
            .await
            .map_err(|err| debug!(%err, "document unavailable"))
            .ok()
    }

    async fn update_document(&self, uri: &Url, text: &str) {
        let Ok(path) = file_path(uri) else {
            return;
        };

        if let Some(provider) = self.provider().await {
            provider.set_active_document(Some(path.clone())).await;
        }
        self.documents
            .write()
            .await
            .insert(path.clone(), TextDocument::new(path, text));
    }
}

fn file_path(uri: &Url) -> std::result::Result<PathBuf, Error> {
    uri.to_file_path()
        .map_err(|_| Error::InvalidUri(uri.to_string()))
}

fn paths<'a>(uris: impl IntoIterator<Item = &'a str>) -> Vec<PathBuf> {
    uris.into_iter()
        .filter_map(|uri| Url::parse(uri).ok())
        .filter_map(|uri| file_path(&uri).ok())
        .collect()
}

#[allow(deprecated)]
fn workspace_root(params: &InitializeParams) -> Option<PathBuf> {
    let folder = params
        .workspace_folders
        .as_ref()
        .and_then(|folders| folders.first())
        .map(|folder| folder.uri.clone());

    folder
        .or_else(|| params.root_uri.clone())
        .and_then(|uri| file_path(&uri).ok())
}

fn file_operations() -> FileOperationRegistrationOptions {
    FileOperationRegistrationOptions {
        filters: vec![FileOperationFilter {
            scheme: Some("file".to_string()),
            pattern: FileOperationPattern {
                glob: "**/*".to_string(),
                matches: None,
                options: None,
            },
        }],
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        let Some(root) = workspace_root(&params) else {
            warn!("no workspace folder; definitions are unavailable");
            return Ok(InitializeResult::default());
        };

        let settings = match Settings::new(&root, &params.capabilities) {
            Ok(settings) => settings,
            Err(err) => {
                self.client
                    .log_message(MessageType::ERROR, format!("Failed to load settings: {err}"))
                    .await;
                Settings::default()
            }
        };
        info!(root = %root.display(), ?settings, "initializing");

        *self.provider.write().await = Some(Arc::new(Provider::new(root, settings)));

        Ok(InitializeResult {
            server_info: Some(ServerInfo {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Options(
                    TextDocumentSyncOptions {
                        open_close: Some(true),
                        change: Some(TextDocumentSyncKind::FULL),
                        save: Some(TextDocumentSyncSaveOptions::SaveOptions(SaveOptions {
                            include_text: Some(true),
                        })),
                        ..Default::default()
                    },
                )),
                definition_provider: Some(OneOf::Left(true)),
                completion_provider: Some(CompletionOptions {
                    trigger_characters: Some(vec![
                        ".".to_string(),
                        ":".to_string(),
                        "/".to_string(),
                    ]),
                    ..Default::default()
                }),
                document_link_provider: Some(DocumentLinkOptions {
                    resolve_provider: Some(false),
                    work_done_progress_options: Default::default(),
                }),
                execute_command_provider: Some(ExecuteCommandOptions {
                    commands: vec![PURGE_CACHE.to_string()],
                    ..Default::default()
                }),
                workspace: Some(WorkspaceServerCapabilities {
                    workspace_folders: None,
                    file_operations: Some(WorkspaceFileOperationsServerCapabilities {
                        did_create: Some(file_operations()),
                        did_rename: Some(file_operations()),
                        did_delete: Some(file_operations()),
                        ..Default::default()
                    }),
                }),
                ..Default::default()
            },
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        self.client
            .log_message(MessageType::INFO, "bedrock-definitions initialized")
            .await;
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        self.update_document(&params.text_document.uri, &params.text_document.text)
            .await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        // Full sync: the last change holds the whole text
        if let Some(change) = params.content_changes.last() {
            self.update_document(&params.text_document.uri, &change.text)
                .await;
        }
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        if let Some(text) = &params.text {
            self.update_document(&params.text_document.uri, text).await;
        }
        let (Some(provider), Some(document)) = (
            self.provider().await,
            self.document(&params.text_document.uri).await,
        ) else {
            return;
        };

        provider.on_save(&document).await;
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        if let Ok(path) = file_path(&params.text_document.uri) {
            self.documents.write().await.remove(&path);
        }
    }

    async fn did_delete_files(&self, params: DeleteFilesParams) {
        if let Some(provider) = self.provider().await {
            let deleted = paths(params.files.iter().map(|file| file.uri.as_str()));
            provider.on_delete(&deleted).await;
        }
    }

    async fn did_rename_files(&self, params: RenameFilesParams) {
        if let Some(provider) = self.provider().await {
            let renamed = paths(params.files.iter().map(|file| file.new_uri.as_str()));
            provider.on_rename_or_create(&renamed).await;
        }
    }

    async fn did_create_files(&self, params: CreateFilesParams) {
        if let Some(provider) = self.provider().await {
            let created = paths(params.files.iter().map(|file| file.uri.as_str()));
            provider.on_rename_or_create(&created).await;
        }
    }

    async fn did_change_watched_files(&self, params: DidChangeWatchedFilesParams) {
        let Some(provider) = self.provider().await else {
            return;
        };

        for change in params.changes {
            let Ok(path) = file_path(&change.uri) else {
                continue;
            };
            match change.typ {
                FileChangeType::CREATED => provider.on_rename_or_create(&[path]).await,
                FileChangeType::DELETED => provider.on_delete(&[path]).await,
                _ => provider.cache().refresh_cache_for_file(&path).await,
            }
        }
    }

    async fn goto_definition(
        &self,
        params: GotoDefinitionParams,
    ) -> Result<Option<GotoDefinitionResponse>> {
        let position = params.text_document_position_params;
        let (Some(provider), Some(document)) = (
            self.provider().await,
            self.document(&position.text_document.uri).await,
        ) else {
            return Ok(None);
        };

        Ok(provider
            .resolve_definition(&document, position.position)
            .await
            .map(GotoDefinitionResponse::Scalar))
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        let position = params.text_document_position;
        let (Some(provider), Some(document)) = (
            self.provider().await,
            self.document(&position.text_document.uri).await,
        ) else {
            return Ok(None);
        };

        Ok(provider
            .resolve_completions(&document, position.position)
            .await)
    }

    async fn document_link(&self, params: DocumentLinkParams) -> Result<Option<Vec<DocumentLink>>> {
        let (Some(provider), Some(document)) = (
            self.provider().await,
            self.document(&params.text_document.uri).await,
        ) else {
            return Ok(None);
        };

        Ok(Some(provider.resolve_document_links(&document).await))
    }

    async fn execute_command(&self, params: ExecuteCommandParams) -> Result<Option<Value>> {
        if params.command != PURGE_CACHE {
            warn!(command = %params.command, "unknown command");
            return Ok(None);
        }

        if let Some(provider) = self.provider().await {
            provider.purge_cache().await;
            self.client
                .log_message(MessageType::INFO, "Resource cache purged")
                .await;
        }
        Ok(None)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logging::init(args.verbose)?;

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(Backend::new);
    Server::new(stdin, stdout, socket).serve(service).await;

    Ok(())
}
