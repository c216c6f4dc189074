//! Resource types, pack types and the per-file extracted data.

mod classifiers;
mod file;

pub use classifiers::{classifier_for, Classifier, Strategy, CLASSIFIERS};
pub use file::{guess_pack_type, ResourceFile};

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tower_lsp::lsp_types::{Location, Url};

use crate::document::DocRange;

/// The kind of a resource file, or of a symbolic reference to one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceType {
    AnimationController,
    Animation,
    RenderController,
    Geometry,
    Material,
    Particle,
    Texture,
    ClientEntity,
    ServerEntity,
    EventIdentifier,
    ComponentGroup,
    AnimateReference,
    SoundEffect,
    Block,
    Dialogue,
    McFunction,
    None,
}

impl ResourceType {
    /// Human readable name, used for link tooltips and completion details.
    pub fn title(&self) -> &'static str {
        match self {
            ResourceType::AnimationController => "Animation Controller",
            ResourceType::Animation => "Animation",
            ResourceType::RenderController => "Render Controller",
            ResourceType::Geometry => "Geometry",
            ResourceType::Material => "Material",
            ResourceType::Particle => "Particle",
            ResourceType::Texture => "Texture",
            ResourceType::ClientEntity => "Client Entity",
            ResourceType::ServerEntity => "Entity",
            ResourceType::EventIdentifier => "Event",
            ResourceType::ComponentGroup => "Component Group",
            ResourceType::AnimateReference => "Animation Reference",
            ResourceType::SoundEffect => "Sound Effect",
            ResourceType::Block => "Block",
            ResourceType::Dialogue => "Dialogue",
            ResourceType::McFunction => "Function",
            ResourceType::None => "None",
        }
    }

    /// Parented identifiers (`parent:child`) can be looked up by their parent part.
    pub fn allows_parented_lookup(&self) -> bool {
        matches!(self, ResourceType::Material | ResourceType::Geometry)
    }

    /// The pack a target of this type normally lives in; `None` when it can be either.
    pub fn expected_pack_type(&self) -> Option<PackType> {
        match self {
            ResourceType::ServerEntity
            | ResourceType::Block
            | ResourceType::Dialogue
            | ResourceType::McFunction
            | ResourceType::EventIdentifier
            | ResourceType::ComponentGroup => Some(PackType::Behaviour),
            ResourceType::ClientEntity
            | ResourceType::RenderController
            | ResourceType::Geometry
            | ResourceType::Material
            | ResourceType::Particle
            | ResourceType::Texture
            | ResourceType::SoundEffect => Some(PackType::Resource),
            ResourceType::Animation
            | ResourceType::AnimationController
            | ResourceType::AnimateReference
            | ResourceType::None => None,
        }
    }

    /// The other half of an entity definition.
    pub fn reciprocal_entity(&self) -> Option<ResourceType> {
        match self {
            ResourceType::ClientEntity => Some(ResourceType::ServerEntity),
            ResourceType::ServerEntity => Some(ResourceType::ClientEntity),
            _ => None,
        }
    }
}

/// Which pack a file was found in, guessed from its folders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PackType {
    #[default]
    Unknown,
    Behaviour,
    Resource,
}

impl PackType {
    /// Whether a file of this pack passes `filter`. Unknown files pass every filter.
    pub fn admitted_by(&self, filter: Option<PackType>) -> bool {
        match (filter, self) {
            (None, _) | (_, PackType::Unknown) => true,
            (Some(expected), actual) => expected == *actual,
        }
    }
}

/// The kinds of data extracted from one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DataKind {
    /// The identifiers the file itself declares.
    Definition,
    ServerEntityEvents,
    ServerEntityComponentGroups,
}

/// Where an identifier is anchored in its file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeInfo {
    pub range: DocRange,
}

impl From<DocRange> for RangeInfo {
    fn from(range: DocRange) -> Self {
        RangeInfo { range }
    }
}

/// Identifier → anchor, in declaration order of the file.
pub type IdentifierMap = Vec<(String, RangeInfo)>;

/// Per data kind extraction results of one file.
pub type DataTypeMap = HashMap<DataKind, IdentifierMap>;

/// A resolved definition: the file and the range inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationData {
    pub identifier: String,
    pub path: PathBuf,
    pub range: DocRange,
}

impl LocationData {
    pub fn new(identifier: impl Into<String>, path: &Path, range: DocRange) -> LocationData {
        LocationData {
            identifier: identifier.into(),
            path: path.to_path_buf(),
            range,
        }
    }

    pub fn to_location(&self) -> Option<Location> {
        Some(Location {
            uri: Url::from_file_path(&self.path).ok()?,
            range: *self.range,
        })
    }
}
