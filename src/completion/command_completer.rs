use tower_lsp::lsp_types::Position;

use crate::classify::handles_commands;
use crate::document::DocRange;
use crate::line_parser::{usage_at_position, Usage, UsageTarget};
use crate::resource::{DataKind, PackType, ResourceType};

use super::util::function_paths;
use super::{Completer, Context};

/// Completes the identifier of a command usage, up to the cursor.
pub struct CommandCompleter<'a> {
    context: Context<'a>,
    usage: Usage,
}

impl<'a> Completer<'a> for CommandCompleter<'a> {
    fn construct(context: Context<'a>, position: Position) -> Option<Self> {
        if !handles_commands(context.document_type) {
            return None;
        }

        let usage = usage_at_position(context.document, position)?.truncated_at(position);

        Some(CommandCompleter { context, usage })
    }

    async fn candidates(&self) -> Vec<String> {
        let cache = self.context.cache;

        match self.usage.target {
            UsageTarget::Resource(ResourceType::McFunction) => function_paths(cache.workspace()),
            UsageTarget::Resource(resource_type) => cache
                .get_identifiers_by_file_type(resource_type, resource_type.expected_pack_type())
                .await
                .into_keys()
                .collect(),
            UsageTarget::Data(kind @ DataKind::ServerEntityEvents)
            | UsageTarget::Data(kind @ DataKind::ServerEntityComponentGroups) => cache
                .get_identifiers_by_kind(
                    ResourceType::ServerEntity,
                    kind,
                    Some(PackType::Behaviour),
                )
                .await
                .into_keys()
                .collect(),
            UsageTarget::Data(DataKind::Definition) => Vec::new(),
        }
    }

    fn prefix(&self) -> &str {
        &self.usage.identifier
    }

    fn replace_range(&self) -> DocRange {
        self.usage.range
    }

    fn resource_type(&self) -> ResourceType {
        match self.usage.target {
            UsageTarget::Resource(resource_type) => resource_type,
            UsageTarget::Data(DataKind::ServerEntityComponentGroups) => {
                ResourceType::ComponentGroup
            }
            UsageTarget::Data(_) => ResourceType::EventIdentifier,
        }
    }
}
