//! Shared test utilities.
//!
//! Only compiled when running tests.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Creates a temporary workspace directory for testing.
///
/// Returns a tuple of (TempDir, PathBuf) where:
/// - TempDir: The temp directory handle (must be kept alive for the test duration)
/// - PathBuf: The path to the workspace subdirectory
///
/// The file walker skips hidden directories and on some systems temp
/// directories live under paths like `/tmp/.tmpXXXXX`, so the files go into a
/// non-hidden `workspace` subdirectory.
///
/// # Example
///
/// ```ignore
/// use crate::test_utils::create_test_workspace_dir;
///
/// let (_temp_dir, root) = create_test_workspace_dir();
/// std::fs::write(root.join("pig.json"), "{}").unwrap();
/// ```
pub fn create_test_workspace_dir() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    // Create a non-hidden subdirectory since WalkDir filters out .* dirs
    let root = temp_dir.path().join("workspace");
    fs::create_dir(&root).expect("Failed to create workspace subdirectory");
    (temp_dir, root)
}

/// Writes `contents` to `root/relative`, creating parent folders.
pub fn write_file(root: &Path, relative: &str, contents: &str) -> PathBuf {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create parent directories");
    }
    fs::write(&path, contents).expect("Failed to write test file");
    path
}

/// Creates a small add-on with one pack of each kind.
///
/// # Workspace Structure
///
/// ```text
/// workspace/
/// ├── BP/
/// │   ├── entities/pig.json
/// │   └── functions/
/// │       ├── setup.mcfunction
/// │       └── mobs/spawn.mcfunction
/// └── RP/
///     ├── animations/pig.animation.json
///     ├── entity/pig.entity.json
///     ├── materials/entity.material
///     ├── models/entity/pig.geo.json
///     ├── models/entity/legacy.geo.json
///     ├── particles/smoke.json
///     ├── sounds/sound_definitions.json
///     └── textures/entity/pig.png
/// ```
#[allow(dead_code)]
pub fn create_addon_fixture() -> (TempDir, PathBuf) {
    let (temp_dir, root) = create_test_workspace_dir();

    write_file(&root, "BP/entities/pig.json", SERVER_PIG);
    write_file(&root, "BP/functions/setup.mcfunction", "say hi\n");
    write_file(&root, "BP/functions/mobs/spawn.mcfunction", "summon custom:pig\n");
    write_file(&root, "RP/entity/pig.entity.json", CLIENT_PIG);
    write_file(
        &root,
        "RP/animations/pig.animation.json",
        r#"{
  "format_version": "1.8.0",
  "animations": {
    "animation.pig.walk": {},
    "animation.pig.look_at_target": {}
  }
}"#,
    );
    write_file(
        &root,
        "RP/materials/entity.material",
        r#"{
  "materials": {
    "version": "1.0.0",
    "stone:variant_a": {}
  }
}"#,
    );
    write_file(
        &root,
        "RP/models/entity/pig.geo.json",
        r#"{
  "format_version": "1.12.0",
  "minecraft:geometry": [
    {"description": {"identifier": "geometry.pig"}}
  ]
}"#,
    );
    write_file(
        &root,
        "RP/models/entity/legacy.geo.json",
        r#"{
  "format_version": "1.8.0",
  "geometry.legacy:geometry.base": {}
}"#,
    );
    write_file(
        &root,
        "RP/particles/smoke.json",
        r#"{
  "format_version": "1.10.0",
  "particle_effect": {
    "description": {"identifier": "custom:smoke"}
  }
}"#,
    );
    write_file(
        &root,
        "RP/sounds/sound_definitions.json",
        r#"{
  "format_version": "1.14.0",
  "sound_definitions": {
    "mob.pig.say": {"sounds": []}
  }
}"#,
    );
    write_file(&root, "RP/textures/entity/pig.png", "");

    (temp_dir, root)
}

#[allow(dead_code)]
pub const SERVER_PIG: &str = r#"{
  "format_version": "1.16.0",
  "minecraft:entity": {
    "description": {
      "identifier": "custom:pig"
    },
    "component_groups": {
      "cg_dead": {}
    },
    "events": {
      "custom:die": {
        "add": {
          "component_groups": ["cg_dead"]
        }
      }
    }
  }
}"#;

#[allow(dead_code)]
pub const CLIENT_PIG: &str = r#"{
  "format_version": "1.10.0",
  "minecraft:client_entity": {
    "description": {
      "identifier": "custom:pig",
      "materials": {"default": "stone"},
      "textures": {"default": "textures/entity/pig"},
      "geometry": {"default": "geometry.pig"},
      "animations": {
        "walk": "animation.pig.walk"
      },
      "scripts": {
        "animate": ["walk"]
      },
      "particle_effects": {"smoke": "custom:smoke"}
    }
  }
}"#;
