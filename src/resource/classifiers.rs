//! The extraction strategy table: which files hold which resource type, and
//! where in those files the identifiers live.

use crate::document::TextDocument;
use crate::json_tree::{Node, Property};

use super::{DataKind, DataTypeMap, IdentifierMap, RangeInfo, ResourceType};

/// How identifiers are laid out in a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Identifiers are the keys directly under `root` (or the top level when `root` is `None`).
    KeyBased { root: Option<&'static str> },
    /// The identifier is `<root>.description.identifier`.
    DescriptionBased { root: &'static str },
    /// `geometry.*` keys before format 1.12, `minecraft:geometry[*].description.identifier` after.
    Geometry,
    /// `scene_tag` of each scene under `<root>.scenes`; untagged scenes are skipped.
    Dialogue { root: &'static str },
}

#[derive(Debug)]
pub struct Classifier {
    pub resource_type: ResourceType,
    /// Workspace-relative glob selecting candidate files.
    pub glob: &'static str,
    pub strategy: Strategy,
    /// Extra keyed sections under the root object, indexed as their own data kind.
    pub auxiliary: &'static [(DataKind, &'static str)],
}

pub static CLASSIFIERS: &[Classifier] = &[
    Classifier {
        resource_type: ResourceType::Animation,
        glob: "**/animations/**/*.json",
        strategy: Strategy::KeyBased {
            root: Some("animations"),
        },
        auxiliary: &[],
    },
    Classifier {
        resource_type: ResourceType::AnimationController,
        glob: "**/animation_controllers/**/*.json",
        strategy: Strategy::KeyBased {
            root: Some("animation_controllers"),
        },
        auxiliary: &[],
    },
    Classifier {
        resource_type: ResourceType::RenderController,
        glob: "**/render_controllers/**/*.json",
        strategy: Strategy::KeyBased {
            root: Some("render_controllers"),
        },
        auxiliary: &[],
    },
    Classifier {
        resource_type: ResourceType::Material,
        glob: "**/materials/**/*.material",
        strategy: Strategy::KeyBased {
            root: Some("materials"),
        },
        auxiliary: &[],
    },
    Classifier {
        resource_type: ResourceType::SoundEffect,
        glob: "**/sounds/sound_definitions.json",
        strategy: Strategy::KeyBased { root: None },
        auxiliary: &[],
    },
    Classifier {
        resource_type: ResourceType::Particle,
        glob: "**/particles/**/*.json",
        strategy: Strategy::DescriptionBased {
            root: "particle_effect",
        },
        auxiliary: &[],
    },
    Classifier {
        resource_type: ResourceType::ClientEntity,
        glob: "**/entity/**/*.json",
        strategy: Strategy::DescriptionBased {
            root: "minecraft:client_entity",
        },
        auxiliary: &[],
    },
    Classifier {
        resource_type: ResourceType::ServerEntity,
        glob: "**/entities/**/*.json",
        strategy: Strategy::DescriptionBased {
            root: "minecraft:entity",
        },
        auxiliary: &[
            (DataKind::ServerEntityEvents, "events"),
            (DataKind::ServerEntityComponentGroups, "component_groups"),
        ],
    },
    Classifier {
        resource_type: ResourceType::Block,
        glob: "**/blocks/**/*.json",
        strategy: Strategy::DescriptionBased {
            root: "minecraft:block",
        },
        auxiliary: &[],
    },
    Classifier {
        resource_type: ResourceType::Geometry,
        glob: "**/models/**/*.json",
        strategy: Strategy::Geometry,
        auxiliary: &[],
    },
    Classifier {
        resource_type: ResourceType::Dialogue,
        glob: "**/dialogue/**/*.json",
        strategy: Strategy::Dialogue {
            root: "minecraft:npc_dialogue",
        },
        auxiliary: &[],
    },
];

/// The classifier indexing `resource_type`, if that type is backed by files.
pub fn classifier_for(resource_type: ResourceType) -> Option<&'static Classifier> {
    CLASSIFIERS
        .iter()
        .find(|classifier| classifier.resource_type == resource_type)
}

impl Classifier {
    /// Every data kind this classifier produces for one parsed file.
    pub fn extract(&self, tree: &Node, document: &TextDocument) -> DataTypeMap {
        let mut data = DataTypeMap::new();
        data.insert(DataKind::Definition, self.extract_identifiers(tree, document));

        for (kind, section) in self.auxiliary {
            let keys = self
                .root_node(tree)
                .and_then(|root| root.get(section))
                .map(|section| keyed_identifiers(section, document))
                .unwrap_or_default();
            data.insert(*kind, keys);
        }

        data
    }

    fn root_node<'a>(&self, tree: &'a Node) -> Option<&'a Node> {
        match self.strategy {
            Strategy::KeyBased { root: Some(root) }
            | Strategy::DescriptionBased { root }
            | Strategy::Dialogue { root } => tree.get(root),
            Strategy::KeyBased { root: None } | Strategy::Geometry => Some(tree),
        }
    }

    pub fn extract_identifiers(&self, tree: &Node, document: &TextDocument) -> IdentifierMap {
        match self.strategy {
            Strategy::KeyBased { root: Some(root) } => tree
                .get(root)
                .map(|node| keyed_identifiers(node, document))
                .unwrap_or_default(),
            Strategy::KeyBased { root: None } => rootless_identifiers(tree, document),
            Strategy::DescriptionBased { root } => tree
                .get(root)
                .and_then(|node| description_identifier(node, document))
                .into_iter()
                .collect(),
            Strategy::Geometry => geometry_identifiers(tree, document),
            Strategy::Dialogue { root } => dialogue_identifiers(tree, root, document),
        }
    }
}

fn key_anchor(property: &Property, document: &TextDocument) -> (String, RangeInfo) {
    (
        property.key.clone(),
        document.range_at(property.key_inner_span()).into(),
    )
}

fn keyed_identifiers(node: &Node, document: &TextDocument) -> IdentifierMap {
    node.properties()
        .iter()
        .map(|property| key_anchor(property, document))
        .collect()
}

/// Legacy sound definition files have no root; newer ones nest under
/// `sound_definitions` next to a `format_version`.
fn rootless_identifiers(tree: &Node, document: &TextDocument) -> IdentifierMap {
    match (tree.get("format_version"), tree.get("sound_definitions")) {
        (Some(_), Some(definitions)) => keyed_identifiers(definitions, document),
        _ => tree
            .properties()
            .iter()
            .filter(|property| property.key != "format_version")
            .map(|property| key_anchor(property, document))
            .collect(),
    }
}

/// `description.identifier` of `node`, anchored at the identifier string.
fn description_identifier(node: &Node, document: &TextDocument) -> Option<(String, RangeInfo)> {
    let identifier = node.get("description")?.get("identifier")?;
    let text = identifier.as_str().filter(|text| !text.is_empty())?;

    Some((
        text.to_string(),
        document.range_at(identifier.inner_span()).into(),
    ))
}

/// Minor component of `format_version`; zero or unparseable means "not a geometry file".
fn format_minor(tree: &Node) -> Option<u32> {
    tree.get("format_version")?
        .as_str()?
        .split('.')
        .nth(1)?
        .parse()
        .ok()
        .filter(|minor| *minor > 0)
}

fn geometry_identifiers(tree: &Node, document: &TextDocument) -> IdentifierMap {
    let Some(minor) = format_minor(tree) else {
        return IdentifierMap::new();
    };

    if minor < 12 {
        tree.properties()
            .iter()
            .filter(|property| property.key.starts_with("geometry."))
            .map(|property| key_anchor(property, document))
            .collect()
    } else {
        tree.get("minecraft:geometry")
            .map(|geometries| {
                geometries
                    .items()
                    .iter()
                    .filter_map(|geometry| description_identifier(geometry, document))
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn dialogue_identifiers(tree: &Node, root: &str, document: &TextDocument) -> IdentifierMap {
    let Some(scenes) = tree.get(root).and_then(|root| root.get("scenes")) else {
        return IdentifierMap::new();
    };

    scenes
        .items()
        .iter()
        .filter_map(|scene| {
            let tag = scene.get("scene_tag")?;
            let text = tag.as_str().filter(|text| !text.is_empty())?;
            Some((text.to_string(), document.range_at(tag.inner_span()).into()))
        })
        .collect()
}
