//! What the cursor is on inside a structured (JSON) document.

use tower_lsp::lsp_types::{Position, Range};

use crate::document::{DocRange, TextDocument};
use crate::json_tree::{location_at_offset, Segment};
use crate::resource::ResourceType;

/// Maps a word to the type it references, by its prefix, its parent key or both.
struct Rule {
    resource_type: ResourceType,
    prefixes: Option<&'static [&'static str]>,
    parents: Option<&'static [&'static str]>,
}

impl Rule {
    fn matches(&self, text: &str, parent: Option<&str>) -> bool {
        let prefixed = self
            .prefixes
            .map(|prefixes| prefixes.iter().any(|prefix| text.starts_with(prefix)));
        let child = self
            .parents
            .map(|parents| parent.is_some_and(|parent| parents.contains(&parent)));

        match (prefixed, child) {
            (Some(prefixed), Some(child)) => prefixed && child,
            (Some(prefixed), None) => prefixed,
            (None, Some(child)) => child,
            (None, None) => false,
        }
    }
}

/// Evaluated in order; a later match replaces an earlier one.
const RULES: &[Rule] = &[
    Rule {
        resource_type: ResourceType::AnimationController,
        prefixes: Some(&["controller.animation."]),
        parents: Some(&["animation_controllers", "animations"]),
    },
    Rule {
        resource_type: ResourceType::RenderController,
        prefixes: Some(&["controller."]),
        parents: Some(&["render_controllers"]),
    },
    Rule {
        resource_type: ResourceType::Animation,
        prefixes: Some(&["animation."]),
        parents: Some(&["animations"]),
    },
    Rule {
        resource_type: ResourceType::Geometry,
        prefixes: Some(&["geometry."]),
        parents: Some(&["geometry"]),
    },
    Rule {
        resource_type: ResourceType::Particle,
        prefixes: None,
        parents: Some(&["particle_effects"]),
    },
    Rule {
        resource_type: ResourceType::Texture,
        prefixes: None,
        parents: Some(&["textures"]),
    },
    Rule {
        resource_type: ResourceType::Material,
        prefixes: None,
        parents: Some(&["materials"]),
    },
    Rule {
        resource_type: ResourceType::ComponentGroup,
        prefixes: None,
        parents: Some(&["component_groups"]),
    },
    Rule {
        resource_type: ResourceType::AnimateReference,
        prefixes: None,
        parents: Some(&["animate"]),
    },
    Rule {
        resource_type: ResourceType::SoundEffect,
        prefixes: None,
        parents: Some(&["sound_effects"]),
    },
];

/// The word under the cursor of a JSON document and what it refers to.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    /// Keys and indices leading to the cursor.
    pub path: Vec<Segment>,
    pub parent: Option<Segment>,
    pub key: Option<Segment>,
    /// The word with surrounding quotes removed; quoted words are lowercased.
    pub text: String,
    pub range: DocRange,
    pub resource_type: ResourceType,
}

impl Selection {
    pub fn at(document: &TextDocument, position: Position) -> Option<Selection> {
        let word = document.word_range_at(position)?;
        let (text, range) = unquote(document, word);

        let path = if document.has_extension("json") {
            location_at_offset(&document.text(), document.offset_at(position))
        } else {
            Vec::new()
        };
        let (parent, key) = parent_and_key(&path);

        let mut selection = Selection {
            path,
            parent,
            key,
            text,
            range,
            resource_type: ResourceType::None,
        };
        selection.resource_type = selection.reference_type();

        Some(selection)
    }

    pub fn parent_key(&self) -> Option<&str> {
        self.parent.as_ref().and_then(Segment::as_key)
    }

    pub fn key_name(&self) -> Option<&str> {
        self.key.as_ref().and_then(Segment::as_key)
    }

    /// Whether `key` appears anywhere on the path to the cursor.
    pub fn path_contains(&self, key: &str) -> bool {
        self.path.iter().any(|segment| segment.as_key() == Some(key))
    }

    pub fn is_reference(&self) -> bool {
        self.resource_type != ResourceType::None
    }

    fn reference_type(&self) -> ResourceType {
        let parent = self.parent_key();
        let mut resource_type = RULES
            .iter()
            .filter(|rule| rule.matches(&self.text, parent))
            .last()
            .map(|rule| rule.resource_type)
            .unwrap_or(ResourceType::None);

        if self.key_name() == Some("event") && resource_type == ResourceType::None {
            resource_type = ResourceType::EventIdentifier;
        }

        if self.key_name() == Some("identifier") && parent == Some("description") {
            if self.path_contains("minecraft:client_entity") {
                resource_type = ResourceType::ClientEntity;
            } else if self.path_contains("minecraft:entity") {
                resource_type = ResourceType::ServerEntity;
            }
        }

        resource_type
    }
}

/// The enclosing key one level up, or two levels up when one level up is an array index.
fn parent_and_key(path: &[Segment]) -> (Option<Segment>, Option<Segment>) {
    let len = path.len();
    let mut parent = len.checked_sub(2).and_then(|index| path.get(index));
    if matches!(parent, None | Some(Segment::Index(_))) && len > 3 {
        parent = path.get(len - 3);
    }

    (parent.cloned(), path.last().cloned())
}

fn unquote(document: &TextDocument, word: DocRange) -> (String, DocRange) {
    let text = document.text_in(&word);
    if text.len() < 2 || !text.starts_with('"') || !text.ends_with('"') {
        return (text, word);
    }

    let mut inner = Range::from(*word);
    inner.start.character += 1;
    inner.end.character = inner.end.character.saturating_sub(1);
    let inner = DocRange::from(inner);

    (document.text_in(&inner).to_lowercase(), inner)
}
