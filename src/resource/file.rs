use std::path::{Path, PathBuf};

use crate::document::TextDocument;
use crate::json_tree::parse_tree;

use super::{Classifier, DataKind, DataTypeMap, IdentifierMap, PackType, RangeInfo};

/// One indexed file of a known resource type.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceFile {
    pub path: PathBuf,
    pub pack_type: PackType,
    pub data: DataTypeMap,
}

impl ResourceFile {
    /// Parses `document` and runs `classifier` over it.
    ///
    /// Returns `None` when the text is not valid JSON; such files are left out of the cache.
    pub fn extract(classifier: &Classifier, document: &TextDocument) -> Option<ResourceFile> {
        let tree = match parse_tree(&document.text()) {
            Ok(tree) => tree,
            Err(err) => {
                tracing::debug!(path = %document.path().display(), %err, "skipping unparseable file");
                return None;
            }
        };

        Some(ResourceFile {
            path: document.path().to_path_buf(),
            pack_type: guess_pack_type(document.path()),
            data: classifier.extract(&tree, document),
        })
    }

    pub fn get(&self, kind: DataKind) -> Option<&IdentifierMap> {
        self.data.get(&kind)
    }

    pub fn definitions(&self) -> &[(String, RangeInfo)] {
        self.get(DataKind::Definition)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// Guesses the pack from the closest ancestor folder that names one.
pub fn guess_pack_type(path: &Path) -> PackType {
    path.ancestors()
        .skip(1)
        .filter_map(|dir| dir.file_name()?.to_str())
        .find_map(pack_type_of_folder)
        .unwrap_or_default()
}

fn pack_type_of_folder(name: &str) -> Option<PackType> {
    let name = name.to_lowercase();
    let marks = |long: [&str; 2], short: &str| {
        long.iter().any(|needle| name.contains(needle))
            || name == short
            || [" ", "_", "-"]
                .iter()
                .any(|separator| name.ends_with(&format!("{separator}{short}")))
    };

    if marks(["behavior_pack", "behaviour_pack"], "bp") {
        Some(PackType::Behaviour)
    } else if marks(["resource_pack", "resourcepack"], "rp") {
        Some(PackType::Resource)
    } else {
        None
    }
}
