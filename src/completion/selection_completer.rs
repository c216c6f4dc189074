use tower_lsp::lsp_types::Position;

use crate::classify::handles_selections;
use crate::document::DocRange;
use crate::resolve::{animate_names, entity_section_keys, selection_target};
use crate::resource::ResourceType;
use crate::selection::Selection;

use super::util::texture_paths;
use super::{Completer, Context};

/// Completes a reference inside an entity file, based on what surrounds the cursor.
pub struct SelectionCompleter<'a> {
    context: Context<'a>,
    selection: Selection,
    target: ResourceType,
    typed: String,
}

impl<'a> Completer<'a> for SelectionCompleter<'a> {
    fn construct(context: Context<'a>, position: Position) -> Option<Self> {
        if !handles_selections(context.document_type) {
            return None;
        }

        let selection = Selection::at(context.document, position)?;
        let target = selection_target(context.document_type, &selection)?;

        let start = selection.range.start;
        let typed_chars = if position.line == start.line {
            position.character.saturating_sub(start.character) as usize
        } else {
            0
        };
        let typed = selection.text.chars().take(typed_chars).collect();

        Some(SelectionCompleter {
            context,
            selection,
            target,
            typed,
        })
    }

    async fn candidates(&self) -> Vec<String> {
        let cache = self.context.cache;
        let document = self.context.document;

        match self.target {
            ResourceType::Texture => texture_paths(cache.workspace()),
            ResourceType::AnimateReference => animate_names(document),
            ResourceType::EventIdentifier => entity_section_keys(document, "events"),
            ResourceType::ComponentGroup => entity_section_keys(document, "component_groups"),
            ResourceType::Geometry => self
                .identifiers()
                .await
                .into_iter()
                // `geometry.child:geometry.parent` is referenced by its child part
                .map(|identifier| match identifier.rsplit_once(':') {
                    Some((child, _)) => child.to_string(),
                    None => identifier,
                })
                .collect(),
            _ => self.identifiers().await,
        }
    }

    fn prefix(&self) -> &str {
        &self.typed
    }

    fn replace_range(&self) -> DocRange {
        self.selection.range
    }

    fn resource_type(&self) -> ResourceType {
        self.target
    }
}

impl SelectionCompleter<'_> {
    async fn identifiers(&self) -> Vec<String> {
        self.context
            .cache
            .get_identifiers_by_file_type(self.target, self.target.expected_pack_type())
            .await
            .into_keys()
            .collect()
    }
}
