//! Working out which kind of resource a document is.

use crate::document::TextDocument;
use crate::json_tree::parse_tree;
use crate::resource::ResourceType;

/// Top level key → document type. Later entries override earlier ones.
const ROOTS: &[(&str, ResourceType)] = &[
    ("minecraft:client_entity", ResourceType::ClientEntity),
    ("minecraft:entity", ResourceType::ServerEntity),
    ("minecraft:geometry", ResourceType::Geometry),
    ("animations", ResourceType::Animation),
    ("animation_controllers", ResourceType::AnimationController),
    ("render_controllers", ResourceType::RenderController),
    ("particle_effect", ResourceType::Particle),
    ("sound_definitions", ResourceType::SoundEffect),
    ("materials", ResourceType::Material),
    ("minecraft:block", ResourceType::Block),
    ("minecraft:npc_dialogue", ResourceType::Dialogue),
];

const SOUND_DEFINITIONS: &str = "sound_definitions.json";
const FUNCTION_EXTENSION: &str = ".mcfunction";

/// Entity files get cursor-context (selection) resolution.
pub fn handles_selections(document_type: ResourceType) -> bool {
    matches!(
        document_type,
        ResourceType::ClientEntity | ResourceType::ServerEntity
    )
}

/// Files whose lines may hold commands.
pub fn handles_commands(document_type: ResourceType) -> bool {
    matches!(
        document_type,
        ResourceType::McFunction | ResourceType::Animation | ResourceType::AnimationController
    )
}

/// Files that declare resources, and so have to be refreshed when saved.
pub fn is_resource_document(document_type: ResourceType) -> bool {
    !matches!(document_type, ResourceType::None | ResourceType::McFunction)
}

pub fn classify_document(document: &TextDocument) -> ResourceType {
    let text = document.text();
    classify(document.file_name().unwrap_or_default(), &text)
}

/// The resource type of a file with `file_name` and contents `text`.
pub fn classify(file_name: &str, text: &str) -> ResourceType {
    if file_name.ends_with(FUNCTION_EXTENSION) {
        return ResourceType::McFunction;
    }
    if file_name == SOUND_DEFINITIONS {
        return ResourceType::SoundEffect;
    }

    let Ok(tree) = parse_tree(text) else {
        return ResourceType::None;
    };
    let keys: Vec<&str> = tree.keys().collect();
    if !keys.contains(&"format_version") && !keys.contains(&"materials") {
        return ResourceType::None;
    }

    let matched = ROOTS
        .iter()
        .filter(|(root, _)| keys.contains(root))
        .last()
        .map(|(_, resource_type)| *resource_type);

    match matched {
        Some(resource_type) => resource_type,
        None if keys.iter().any(|key| key.starts_with("geometry.")) => ResourceType::Geometry,
        None => ResourceType::None,
    }
}
