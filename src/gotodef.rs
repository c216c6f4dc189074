use tower_lsp::lsp_types::{Location, Position};

use crate::cache::ResourceCache;
use crate::classify::{classify_document, handles_commands, handles_selections};
use crate::config::Settings;
use crate::document::TextDocument;
use crate::line_parser::usage_at_position;
use crate::resolve::{resolve_selection, resolve_usage};
use crate::selection::Selection;

pub async fn goto_definition(
    cache: &ResourceCache,
    settings: &Settings,
    document: &TextDocument,
    cursor_position: Position,
) -> Option<Location> {
    let document_type = classify_document(document);

    let location = if handles_selections(document_type) {
        // In an entity file, look at the JSON around the cursor
        let selection = Selection::at(document, cursor_position)?;
        if !selection.is_reference() {
            return None;
        }
        resolve_selection(cache, document, document_type, &selection).await?
    } else if handles_commands(document_type) {
        let usage = usage_at_position(document, cursor_position)?;
        resolve_usage(cache, settings, document, &usage).await?
    } else {
        return None;
    };

    location.to_location()
}
