//! Integration tests for the bedrock-definitions public API.
//!
//! These drive the library the way the server binary does: a `Provider` over a
//! workspace on disk, documents handed in as text.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tower_lsp::lsp_types::{CompletionResponse, Position, Url};

use bedrock_definitions::config::Settings;
use bedrock_definitions::document::TextDocument;
use bedrock_definitions::line_parser::{LineParser, UsageTarget};
use bedrock_definitions::provider::Provider;
use bedrock_definitions::resource::ResourceType;

const SERVER_ZOMBIE: &str = r#"{
  "format_version": "1.16.0",
  "minecraft:entity": {
    "description": {
      "identifier": "custom:zombie"
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

const CLIENT_ZOMBIE: &str = r#"{
  "format_version": "1.10.0",
  "minecraft:client_entity": {
    "description": {
      "identifier": "custom:zombie",
      "materials": {"default": "stone"},
      "geometry": {"default": "geometry.zombie"}
    }
  }
}"#;

/// Helper: a workspace with one entity in both packs.
///
/// Returns (TempDir, PathBuf) - keep TempDir alive for test duration.
fn create_test_workspace() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let root = temp_dir.path().join("workspace");

    write(&root, "behavior_pack/entities/zombie.json", SERVER_ZOMBIE);
    write(&root, "resource_pack/entity/zombie.entity.json", CLIENT_ZOMBIE);
    write(
        &root,
        "resource_pack/materials/entity.material",
        r#"{"materials": {"version": "1.0.0", "stone:variant_a": {}}}"#,
    );
    write(
        &root,
        "resource_pack/models/entity/zombie.geo.json",
        r#"{"format_version": "1.8.0", "geometry.zombie": {}}"#,
    );
    write(
        &root,
        "resource_pack/models/entity/other.geo.json",
        r#"{"format_version": "1.12.0", "minecraft:geometry": [{"description": {"identifier": "geometry.other"}}]}"#,
    );
    write(&root, "behavior_pack/functions/kill.mcfunction", "event entity @s custom:die\n");

    (temp_dir, root)
}

fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn position_in(text: &str, needle: &str, shift: usize) -> Position {
    let document = TextDocument::new("/unused.json", text);
    document.position_at(text.find(needle).unwrap() + shift)
}

fn uri(path: PathBuf) -> Url {
    Url::from_file_path(path).unwrap()
}

#[tokio::test]
async fn test_reciprocal_entity_link() {
    let (_temp_dir, root) = create_test_workspace();
    let provider = Provider::new(&root, Settings::default());
    let server = TextDocument::new(root.join("behavior_pack/entities/zombie.json"), SERVER_ZOMBIE);
    let client = TextDocument::new(
        root.join("resource_pack/entity/zombie.entity.json"),
        CLIENT_ZOMBIE,
    );

    let to_client = provider
        .resolve_definition(&server, position_in(SERVER_ZOMBIE, "\"custom:zombie\"", 3))
        .await
        .unwrap();
    let to_server = provider
        .resolve_definition(&client, position_in(CLIENT_ZOMBIE, "\"custom:zombie\"", 3))
        .await
        .unwrap();

    assert_eq!(to_client.uri, uri(client.path().to_path_buf()));
    assert_eq!(to_server.uri, uri(server.path().to_path_buf()));
}

/// Test: events are file local, component groups resolve to their key.
#[tokio::test]
async fn test_end_to_end_events_and_component_groups() {
    let (_temp_dir, root) = create_test_workspace();
    let provider = Provider::new(&root, Settings::default());

    let function = TextDocument::new(
        root.join("behavior_pack/functions/kill.mcfunction"),
        "event entity @s custom:die\n",
    );
    let from_command = provider
        .resolve_definition(
            &function,
            Position {
                line: 0,
                character: 20,
            },
        )
        .await;
    assert!(from_command.is_none());

    let server = TextDocument::new(root.join("behavior_pack/entities/zombie.json"), SERVER_ZOMBIE);
    let group = provider
        .resolve_definition(&server, position_in(SERVER_ZOMBIE, "[\"cg_dead\"]", 3))
        .await
        .unwrap();

    assert_eq!(group.uri, uri(server.path().to_path_buf()));
    assert_eq!(group.range.start, position_in(SERVER_ZOMBIE, "\"cg_dead\": {}", 1));
    assert_eq!(group.range.end, position_in(SERVER_ZOMBIE, "\"cg_dead\": {}", 8));
}

#[tokio::test]
async fn test_material_prefix_and_geometry_schemas() {
    let (_temp_dir, root) = create_test_workspace();
    let provider = Provider::new(&root, Settings::default());
    let cache = provider.cache();

    let material = cache
        .find_by_identifier(ResourceType::Material, "stone", None)
        .await
        .unwrap();
    assert_eq!(material.identifier, "stone:variant_a");

    let geometry = cache
        .get_identifiers_by_file_type(ResourceType::Geometry, None)
        .await;
    assert!(geometry.contains_key("geometry.zombie"));
    assert!(geometry.contains_key("geometry.other"));
}

#[tokio::test]
async fn test_completion_and_links_from_a_function() {
    let (_temp_dir, root) = create_test_workspace();
    let provider = Provider::new(&root, Settings::default());
    let text = "summon custom:z\nsummon custom:zombie\n";
    let document = TextDocument::new(root.join("behavior_pack/functions/spawn.mcfunction"), text);

    let completions = provider
        .resolve_completions(
            &document,
            Position {
                line: 0,
                character: 15,
            },
        )
        .await;
    let Some(CompletionResponse::List(list)) = completions else {
        panic!("expected a completion list");
    };
    let labels = list.items.iter().map(|item| item.label.as_str()).collect::<Vec<_>>();
    assert_eq!(labels, vec!["custom:zombie"]);

    let links = provider.resolve_document_links(&document).await;
    assert_eq!(links.len(), 1);
    assert_eq!(
        links[0].target,
        Some(uri(root.join("behavior_pack/entities/zombie.json")))
    );
}

#[test]
fn test_selector_compound_values_and_comments() {
    let usages = LineParser::parse(
        0,
        "execute as @e[type=custom:pig,scores={foo=1..5,bar=2}] run summon custom:pig ~ ~ ~ {Tags:[\"x\"]}",
    )
    .into_usages();
    let entities = &usages[&UsageTarget::Resource(ResourceType::ServerEntity)];
    assert_eq!(entities["custom:pig"].len(), 2);
    assert_eq!(usages.len(), 1);

    assert!(LineParser::parse(0, "// summon custom:pig").usages().is_empty());
}
