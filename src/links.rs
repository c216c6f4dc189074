//! Document links for the resource usages of command files.

use tower_lsp::lsp_types::DocumentLink;
use tracing::debug;

use crate::cache::ResourceCache;
use crate::classify::{classify_document, handles_commands};
use crate::config::Settings;
use crate::document::TextDocument;
use crate::line_parser::{document_usages, UsageTarget};
use crate::resolve::{find_definition, lookup_identifier};

pub async fn document_links(
    cache: &ResourceCache,
    settings: &Settings,
    document: &TextDocument,
) -> Vec<DocumentLink> {
    if !settings.document_links || !handles_commands(classify_document(document)) {
        return Vec::new();
    }

    let mut links = Vec::new();
    for (target, data) in document_usages(document) {
        let UsageTarget::Resource(resource_type) = target else {
            continue;
        };

        for (identifier, infos) in data {
            let linked = infos.into_iter().filter(|info| info.link).collect::<Vec<_>>();
            if linked.is_empty() {
                continue;
            }

            let lookup = lookup_identifier(settings, resource_type, &identifier);
            let Some(location) = find_definition(cache, document, resource_type, &lookup)
                .await
                .and_then(|location| location.to_location())
            else {
                continue;
            };

            links.extend(linked.into_iter().map(|info| DocumentLink {
                range: *info.range,
                target: Some(location.uri.clone()),
                tooltip: Some(format!("Open {} definition", resource_type.title())),
                data: None,
            }));
        }
    }

    debug!(path = %document.path().display(), count = links.len(), "document links");
    links
}
