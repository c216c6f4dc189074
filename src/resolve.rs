//! Turning a reference into the location of its definition.
//!
//! Most references go through the resource cache. Events, component groups and
//! `scripts.animate` entries live in the same file as their use and are looked
//! up in the current document. Textures and functions are plain files found by
//! path.

use glob::Pattern;
use tracing::debug;

use crate::cache::ResourceCache;
use crate::config::Settings;
use crate::document::{DocRange, TextDocument};
use crate::json_tree::{parse_tree, Node, Segment};
use crate::line_parser::{Usage, UsageTarget};
use crate::resource::{LocationData, ResourceType};
use crate::selection::Selection;
use crate::workspace::Workspace;

const SERVER_ENTITY_ROOT: &str = "minecraft:entity";
const ENTITY_ROOTS: [&str; 2] = ["minecraft:client_entity", SERVER_ENTITY_ROOT];
const TEXTURE_EXTENSIONS: [&str; 2] = ["png", "tga"];

/// Where `identifier` of `resource_type` is defined, looking from `document`.
pub async fn find_definition(
    cache: &ResourceCache,
    document: &TextDocument,
    resource_type: ResourceType,
    identifier: &str,
) -> Option<LocationData> {
    match resource_type {
        ResourceType::Texture => find_texture(cache.workspace(), identifier),
        ResourceType::McFunction => find_function(cache.workspace(), identifier),
        ResourceType::EventIdentifier => find_in_entity(document, "events", identifier),
        ResourceType::ComponentGroup => find_in_entity(document, "component_groups", identifier),
        ResourceType::AnimateReference => find_animate_reference(document, identifier),
        ResourceType::None => None,
        _ => {
            cache
                .find_by_identifier(resource_type, identifier, resource_type.expected_pack_type())
                .await
        }
    }
}

/// The type a selection in a document of `document_type` refers to.
///
/// The `identifier` of an entity points to the other half of the entity, and
/// component groups only count when used from inside `events`.
pub fn selection_target(document_type: ResourceType, selection: &Selection) -> Option<ResourceType> {
    let resource_type = selection.resource_type;

    match (document_type, resource_type) {
        (_, ResourceType::None) => None,
        (ResourceType::ClientEntity, ResourceType::ClientEntity)
        | (ResourceType::ServerEntity, ResourceType::ServerEntity) => {
            resource_type.reciprocal_entity()
        }
        (ResourceType::ServerEntity, ResourceType::ComponentGroup)
            if !selection.path_contains("events") =>
        {
            None
        }
        (_, ResourceType::AnimateReference)
            if !(selection.path_contains("scripts") && selection.path_contains("animate")) =>
        {
            None
        }
        _ => Some(resource_type),
    }
}

/// Resolves the selection of an entity file.
pub async fn resolve_selection(
    cache: &ResourceCache,
    document: &TextDocument,
    document_type: ResourceType,
    selection: &Selection,
) -> Option<LocationData> {
    let resource_type = selection_target(document_type, selection)?;

    find_definition(cache, document, resource_type, &selection.text).await
}

/// Resolves a command usage. Entity events are file local and never resolve
/// from a command.
pub async fn resolve_usage(
    cache: &ResourceCache,
    settings: &Settings,
    document: &TextDocument,
    usage: &Usage,
) -> Option<LocationData> {
    let UsageTarget::Resource(resource_type) = usage.target else {
        return None;
    };
    let identifier = lookup_identifier(settings, resource_type, &usage.identifier);

    find_definition(cache, document, resource_type, &identifier).await
}

/// Entities referenced from commands may leave out their namespace.
pub fn lookup_identifier(settings: &Settings, resource_type: ResourceType, identifier: &str) -> String {
    if resource_type == ResourceType::ServerEntity && !identifier.contains(':') {
        format!("{}:{identifier}", settings.default_namespace)
    } else {
        identifier.to_string()
    }
}

/// `minecraft:entity.<section>.<identifier>` of the current document, anchored at the key.
pub fn find_in_entity(
    document: &TextDocument,
    section: &str,
    identifier: &str,
) -> Option<LocationData> {
    let tree = parse_current(document)?;
    let property = tree.find_property_at_path(&[
        Segment::from(SERVER_ENTITY_ROOT),
        Segment::from(section),
        Segment::from(identifier),
    ])?;

    Some(LocationData::new(
        identifier,
        document.path(),
        document.range_at(property.key_inner_span()),
    ))
}

/// A short animation name used in `scripts.animate`, declared under
/// `description.animations` of the same entity.
pub fn find_animate_reference(document: &TextDocument, name: &str) -> Option<LocationData> {
    let tree = parse_current(document)?;
    let property = entity_root(&tree)?
        .get("description")?
        .get("animations")?
        .property(name)?;

    Some(LocationData::new(
        name,
        document.path(),
        document.range_at(property.key_inner_span()),
    ))
}

/// The short animation names declared by an entity document.
pub fn animate_names(document: &TextDocument) -> Vec<String> {
    parse_current(document)
        .and_then(|tree| {
            let animations = entity_root(&tree)?.get("description")?.get("animations")?;
            Some(animations.keys().map(str::to_string).collect())
        })
        .unwrap_or_default()
}

/// The keys of `minecraft:entity.<section>` in the current document.
pub fn entity_section_keys(document: &TextDocument, section: &str) -> Vec<String> {
    parse_current(document)
        .and_then(|tree| {
            let section = tree.get(SERVER_ENTITY_ROOT)?.get(section)?;
            Some(section.keys().map(str::to_string).collect())
        })
        .unwrap_or_default()
}

fn entity_root(tree: &Node) -> Option<&Node> {
    ENTITY_ROOTS.iter().find_map(|root| tree.get(root))
}

fn parse_current(document: &TextDocument) -> Option<Node> {
    parse_tree(&document.text())
        .map_err(|err| debug!(path = %document.path().display(), %err, "current document does not parse"))
        .ok()
}

/// A texture path (`textures/entity/pig`) to the first `png` or `tga` file it names.
pub fn find_texture(workspace: &Workspace, path: &str) -> Option<LocationData> {
    let escaped = Pattern::escape(path);
    let file = TEXTURE_EXTENSIONS
        .iter()
        .flat_map(|extension| workspace.find_files(&format!("**/{escaped}.{extension}")))
        .next()?;

    Some(LocationData::new(path, &file, DocRange::document_start()))
}

/// A function path (`mobs/spawn`) to its `.mcfunction` file.
pub fn find_function(workspace: &Workspace, path: &str) -> Option<LocationData> {
    let escaped = Pattern::escape(path);
    let file = workspace
        .find_files(&format!("**/functions/{escaped}.mcfunction"))
        .into_iter()
        .next()?;

    Some(LocationData::new(path, &file, DocRange::document_start()))
}
