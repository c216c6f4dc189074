use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use tempfile::TempDir;

use super::*;
use crate::document::DocRange;
use crate::test_utils::{create_addon_fixture, create_test_workspace_dir, write_file};

fn cache_for(root: &Path) -> ResourceCache {
    ResourceCache::new(Arc::new(Workspace::new(root)), &Settings::default())
}

fn animations(root: &Path, name: &str, keys: &[&str]) -> PathBuf {
    let body = keys
        .iter()
        .map(|key| format!("\"{key}\": {{}}"))
        .collect::<Vec<_>>()
        .join(", ");
    write_file(
        root,
        &format!("RP/animations/{name}.json"),
        &format!("{{\"format_version\": \"1.8.0\", \"animations\": {{{body}}}}}"),
    )
}

fn setup() -> (TempDir, PathBuf, ResourceCache) {
    let (temp_dir, root) = create_addon_fixture();
    let cache = cache_for(&root);
    (temp_dir, root, cache)
}

/// Test: a second request for the same type reuses the first scan.
#[tokio::test]
async fn population_is_idempotent() {
    let (_temp_dir, _root, cache) = setup();

    let first = cache.get_all_by_type(ResourceType::Animation).await;
    let second = cache.get_all_by_type(ResourceType::Animation).await;

    assert_eq!(first, second);
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(cache.scan_count(ResourceType::Animation), 1);
}

/// Test: concurrent requests for an unpopulated type trigger exactly one scan.
#[tokio::test]
async fn concurrent_requests_share_one_scan() {
    let (_temp_dir, _root, cache) = setup();

    let (a, b, c) = tokio::join!(
        cache.get_all_by_type(ResourceType::ServerEntity),
        cache.get_all_by_type(ResourceType::ServerEntity),
        cache.get_all_by_type(ResourceType::Particle),
    );

    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(a.len(), 1);
    assert_eq!(c.len(), 1);
    assert_eq!(cache.scan_count(ResourceType::ServerEntity), 1);
    assert_eq!(cache.scan_count(ResourceType::Particle), 1);
}

#[tokio::test]
async fn types_without_files_are_empty() {
    let (_temp_dir, _root, cache) = setup();

    assert!(cache.get_all_by_type(ResourceType::Texture).await.is_empty());
    assert!(cache.get_all_by_type(ResourceType::None).await.is_empty());
    assert_eq!(cache.scan_count(ResourceType::Texture), 0);
}

/// Test: malformed files are skipped without failing the whole type.
#[tokio::test]
async fn malformed_files_are_excluded() {
    let (_temp_dir, root) = create_test_workspace_dir();
    animations(&root, "good", &["animation.good"]);
    write_file(&root, "RP/animations/bad.json", "{\"animations\": {");

    let cache = cache_for(&root);
    let entry = cache.get_all_by_type(ResourceType::Animation).await;

    assert_eq!(entry.len(), 1);
    assert!(cache
        .find_by_identifier(ResourceType::Animation, "animation.good", None)
        .await
        .is_some());
}

#[tokio::test]
async fn finds_identifier_with_its_range() {
    let (_temp_dir, root, cache) = setup();

    let location = cache
        .find_by_identifier(ResourceType::Particle, "custom:smoke", None)
        .await
        .unwrap();

    assert_eq!(location.path, root.join("RP/particles/smoke.json"));
    assert_eq!(location.range, DocRange::on_line(3, 35, 47));
}

/// Test: materials resolve by their parent part.
#[tokio::test]
async fn parented_material_by_prefix() {
    let (_temp_dir, _root, cache) = setup();

    let location = cache
        .find_by_identifier(ResourceType::Material, "stone", None)
        .await
        .unwrap();

    assert_eq!(location.identifier, "stone:variant_a");
    assert!(cache
        .find_by_identifier(ResourceType::Material, "ston", None)
        .await
        .is_none());
}

#[tokio::test]
async fn prefix_fallback_is_limited_to_parented_types() {
    let (_temp_dir, root) = create_test_workspace_dir();
    animations(&root, "a", &["animation.a:child"]);
    let cache = cache_for(&root);

    assert!(cache
        .find_by_identifier(ResourceType::Animation, "animation.a", None)
        .await
        .is_none());
}

/// Test: both geometry schemas are indexed side by side.
#[tokio::test]
async fn geometry_schemas_coexist() {
    let (_temp_dir, _root, cache) = setup();

    let index = cache
        .get_identifiers_by_file_type(ResourceType::Geometry, None)
        .await;

    assert!(index.contains_key("geometry.pig"));
    assert!(index.contains_key("geometry.legacy:geometry.base"));
    assert!(cache
        .find_by_identifier(ResourceType::Geometry, "geometry.legacy", None)
        .await
        .is_some());
}

#[tokio::test]
async fn pack_filter_admits_unknown_packs() {
    let (_temp_dir, root) = create_test_workspace_dir();
    write_file(
        &root,
        "shared/animations/a.json",
        r#"{"animations": {"animation.shared": {}}}"#,
    );
    write_file(
        &root,
        "BP/animations/b.json",
        r#"{"animations": {"animation.behaviour": {}}}"#,
    );
    let cache = cache_for(&root);

    let index = cache
        .get_identifiers_by_file_type(ResourceType::Animation, Some(PackType::Resource))
        .await;

    assert!(index.contains_key("animation.shared"));
    assert!(!index.contains_key("animation.behaviour"));
}

#[tokio::test]
async fn auxiliary_kinds_are_indexed() {
    let (_temp_dir, _root, cache) = setup();

    let events = cache
        .get_identifiers_by_kind(
            ResourceType::ServerEntity,
            DataKind::ServerEntityEvents,
            None,
        )
        .await;

    assert_eq!(events.keys().collect::<Vec<_>>(), vec!["custom:die"]);
}

/// Test: the file nearest to the active document wins a collision.
#[tokio::test]
async fn nearest_file_wins_collisions() {
    let (_temp_dir, root) = create_test_workspace_dir();
    let near = animations(&root, "near/a", &["animation.shared"]);
    animations(&root, "z/far/deeper/still/b", &["animation.shared"]);
    let workspace = Arc::new(Workspace::new(&root));
    workspace
        .set_active_document(Some(root.join("RP/animations/near/current.json")))
        .await;
    let cache = ResourceCache::new(workspace, &Settings::default());

    let location = cache
        .find_by_identifier(ResourceType::Animation, "animation.shared", None)
        .await
        .unwrap();

    assert_eq!(location.path, near);
}

/// Test: refreshing one file leaves other files of the type untouched.
#[tokio::test]
async fn refresh_replaces_only_that_file() {
    let (_temp_dir, root) = create_test_workspace_dir();
    let first = animations(&root, "first", &["animation.one"]);
    animations(&root, "second", &["animation.two"]);
    let cache = cache_for(&root);
    let before = cache.get_all_by_type(ResourceType::Animation).await;

    animations(&root, "first", &["animation.renamed"]);
    cache.refresh_cache_for_file(&first).await;

    let after = cache.get_all_by_type(ResourceType::Animation).await;
    let index = cache
        .get_identifiers_by_file_type(ResourceType::Animation, None)
        .await;

    assert_eq!(cache.scan_count(ResourceType::Animation), 1);
    assert_eq!(after.paths(), before.paths());
    assert_eq!(
        index.keys().collect::<Vec<_>>(),
        vec!["animation.renamed", "animation.two"]
    );
    let second = root.join("RP/animations/second.json");
    assert_eq!(before.get(&second), after.get(&second));
}

#[tokio::test]
async fn refresh_adds_new_files_to_populated_types() {
    let (_temp_dir, root) = create_test_workspace_dir();
    animations(&root, "first", &["animation.one"]);
    let cache = cache_for(&root);
    cache.get_all_by_type(ResourceType::Animation).await;

    let added = animations(&root, "added", &["animation.added"]);
    cache.refresh_cache_for_file(&added).await;

    assert_eq!(cache.get_all_by_type(ResourceType::Animation).await.len(), 2);
    assert_eq!(cache.scan_count(ResourceType::Animation), 1);
}

#[tokio::test]
async fn refresh_does_not_populate_unscanned_types() {
    let (_temp_dir, root) = create_test_workspace_dir();
    let file = animations(&root, "first", &["animation.one"]);
    let cache = cache_for(&root);

    cache.refresh_cache_for_file(&file).await;

    assert_eq!(cache.scan_count(ResourceType::Animation), 0);
    assert!(cache.entries.read().await.is_empty());
}

#[tokio::test]
async fn delete_removes_one_file() {
    let (_temp_dir, root) = create_test_workspace_dir();
    let first = animations(&root, "first", &["animation.one"]);
    animations(&root, "second", &["animation.two"]);
    let cache = cache_for(&root);
    cache.get_all_by_type(ResourceType::Animation).await;

    fs::remove_file(&first).unwrap();
    cache.delete_file_from_cache(&first).await;

    let index = cache
        .get_identifiers_by_file_type(ResourceType::Animation, None)
        .await;
    assert_eq!(index.keys().collect::<Vec<_>>(), vec!["animation.two"]);
    assert_eq!(cache.scan_count(ResourceType::Animation), 1);
}

#[tokio::test]
async fn empty_cache_forces_a_rescan() {
    let (_temp_dir, root) = create_test_workspace_dir();
    animations(&root, "first", &["animation.one"]);
    let cache = cache_for(&root);
    cache.get_all_by_type(ResourceType::Animation).await;

    animations(&root, "second", &["animation.two"]);
    cache.empty_cache().await;

    assert_eq!(cache.get_all_by_type(ResourceType::Animation).await.len(), 2);
    assert_eq!(cache.scan_count(ResourceType::Animation), 2);
}
