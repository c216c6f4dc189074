use std::path::Path;

use crate::workspace::Workspace;

const TEXTURE_GLOBS: [&str; 2] = ["**/textures/**/*.png", "**/textures/**/*.tga"];
const FUNCTION_GLOB: &str = "**/functions/**/*.mcfunction";

/// `textures/entity/pig` for every texture image in the workspace.
pub fn texture_paths(workspace: &Workspace) -> Vec<String> {
    TEXTURE_GLOBS
        .iter()
        .flat_map(|glob| workspace.find_files(glob))
        .filter_map(|file| path_from(workspace.root(), &file, "textures", true))
        .collect()
}

/// `mobs/spawn` for every function file in the workspace.
pub fn function_paths(workspace: &Workspace) -> Vec<String> {
    workspace
        .find_files(FUNCTION_GLOB)
        .iter()
        .filter_map(|file| path_from(workspace.root(), file, "functions", false))
        .collect()
}

/// The `/`-joined part of `file` from the first `folder` below `root`, without the extension.
fn path_from(root: &Path, file: &Path, folder: &str, include_folder: bool) -> Option<String> {
    let relative = file.strip_prefix(root).ok()?.with_extension("");
    let components = relative
        .iter()
        .map(|component| component.to_str())
        .collect::<Option<Vec<_>>>()?;

    let index = components
        .iter()
        .position(|component| *component == folder)?;
    let start = if include_folder { index } else { index + 1 };

    Some(components[start..].join("/"))
}
