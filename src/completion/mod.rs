use std::future::Future;

use itertools::Itertools;
use tower_lsp::lsp_types::{
    CompletionItem, CompletionItemKind, CompletionList, CompletionResponse, CompletionTextEdit,
    Position, TextEdit,
};

use crate::cache::ResourceCache;
use crate::classify::classify_document;
use crate::config::Settings;
use crate::document::{DocRange, TextDocument};
use crate::resource::ResourceType;

use self::command_completer::CommandCompleter;
use self::selection_completer::SelectionCompleter;

mod command_completer;
mod selection_completer;
mod util;

#[derive(Clone, Copy)]
pub struct Context<'a> {
    cache: &'a ResourceCache,
    document: &'a TextDocument,
    document_type: ResourceType,
    settings: &'a Settings,
}

pub(crate) trait Completer<'a>: Sized {
    fn construct(context: Context<'a>, position: Position) -> Option<Self>;

    /// Every identifier that could stand where the cursor is, unfiltered.
    fn candidates(&self) -> impl Future<Output = Vec<String>> + Send;

    /// What has been typed so far.
    fn prefix(&self) -> &str;

    /// The text an accepted item replaces.
    fn replace_range(&self) -> DocRange;

    fn resource_type(&self) -> ResourceType;
}

pub async fn get_completions(
    cache: &ResourceCache,
    settings: &Settings,
    document: &TextDocument,
    position: Position,
) -> Option<CompletionResponse> {
    if !settings.completions {
        return None;
    }

    let context = Context {
        cache,
        document,
        document_type: classify_document(document),
        settings,
    };

    if let Some(response) = run_completer::<CommandCompleter>(context, position).await {
        return Some(response);
    }
    run_completer::<SelectionCompleter>(context, position).await
}

fn run_completer<'a, T: Completer<'a> + Send + Sync + 'a>(
    context: Context<'a>,
    position: Position,
) -> impl Future<Output = Option<CompletionResponse>> + Send + 'a {
    async move {
        let completer = T::construct(context, position)?;
        let prefix = completer.prefix();
        let range = *completer.replace_range();
        let detail = completer.resource_type().title();

        let items = completer
            .candidates()
            .await
            .into_iter()
            .filter(|candidate| candidate.starts_with(prefix))
            .unique()
            .take(context.settings.max_completions)
            .map(|label| CompletionItem {
                kind: Some(CompletionItemKind::VALUE),
                detail: Some(detail.to_string()),
                text_edit: Some(CompletionTextEdit::Edit(TextEdit {
                    range,
                    new_text: label.clone(),
                })),
                label,
                ..Default::default()
            })
            .collect_vec();

        Some(CompletionResponse::List(CompletionList {
            is_incomplete: true,
            items,
        }))
    }
}
