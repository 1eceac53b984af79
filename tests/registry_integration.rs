//! Registry Integration Tests
//!
//! End-to-end coverage of registration, deduplication and filtered queries
//! through the public API.

use std::collections::HashSet;

use meshreg::{
    ComponentDefinition, ComponentFilter, ComponentFormat, DatabaseEngine, Metadata, Model,
    OrderField, RegistryBuilder, RegistryHandles, SortOrder, storage::IN_MEMORY,
};
use serde_json::json;
use tempfile::TempDir;

// =============================================================================
// Test Helpers
// =============================================================================

/// Build handles over an in-memory database.
async fn memory_registry() -> RegistryHandles {
    RegistryBuilder::new(IN_MEMORY)
        .engine(DatabaseEngine::Sqlite)
        .build()
        .await
        .expect("Failed to build registry")
}

/// Build handles over an on-disk database with a real connection pool.
async fn file_registry() -> (RegistryHandles, TempDir) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let handles = RegistryBuilder::new(dir.path().join("registry.db"))
        .engine(DatabaseEngine::Sqlite)
        .max_connections(8)
        .build()
        .await
        .expect("Failed to build registry");
    (handles, dir)
}

fn component(kind: &str, api_version: &str, model: Model) -> ComponentDefinition {
    ComponentDefinition::new(kind, api_version, model)
        .with_display_name(kind)
        .with_schema(format!(r#"{{"title":"{kind}"}}"#))
}

fn kinds(components: &[ComponentDefinition]) -> Vec<String> {
    components.iter().map(|c| c.kind().to_string()).collect()
}

// =============================================================================
// Deduplication
// =============================================================================

#[tokio::test]
async fn test_identical_models_stored_once() {
    let handles = memory_registry().await;
    let model = Model::new("istio", "1.20.0")
        .with_category("Service Mesh")
        .with_metadata("svgWhite", json!("<svg/>"));

    let a = handles
        .components
        .register(&component("Gateway", "v1beta1", model.clone()))
        .await
        .unwrap();
    let b = handles
        .components
        .register(&component("Sidecar", "v1beta1", model.clone()))
        .await
        .unwrap();

    assert_ne!(a, b);
    assert_eq!(handles.models.count().await.unwrap(), 1);
    assert_eq!(handles.components.count().await.unwrap(), 2);

    let all = handles
        .components
        .query(&ComponentFilter::default())
        .await
        .unwrap();
    let model_ids: HashSet<_> = all.iter().map(|c| c.model.id.unwrap()).collect();
    assert_eq!(model_ids.len(), 1);
    assert_eq!(
        model_ids.into_iter().next(),
        Some(meshreg::storage::derive_id(&model).unwrap())
    );

    handles.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_registrations_share_one_model() {
    const N: usize = 32;
    let (handles, _dir) = file_registry().await;
    let model = Model::new("cilium", "1.15.0").with_metadata("cncf", json!("graduated"));

    let mut tasks = Vec::with_capacity(N);
    for i in 0..N {
        let store = handles.components.clone();
        let definition = component(&format!("Policy{i:02}"), "cilium.io/v2", model.clone());
        tasks.push(tokio::spawn(async move { store.register(&definition).await }));
    }

    let mut ids = HashSet::new();
    for task in tasks {
        let id = task.await.unwrap().expect("registration should succeed");
        ids.insert(id);
    }

    assert_eq!(ids.len(), N);
    assert_eq!(handles.models.count().await.unwrap(), 1);
    assert_eq!(handles.components.count().await.unwrap(), N as i64);

    handles.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_registrations_distinct_models() {
    let (handles, _dir) = file_registry().await;

    let mut tasks = Vec::new();
    for i in 0..12 {
        let store = handles.components.clone();
        // Three distinct models, four registrations each
        let model = Model::new("kubernetes", format!("v1.{}.0", 27 + i % 3));
        let definition = component(&format!("Kind{i}"), "v1", model);
        tasks.push(tokio::spawn(async move { store.register(&definition).await }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    assert_eq!(handles.models.count().await.unwrap(), 3);
    assert_eq!(handles.components.count().await.unwrap(), 12);

    handles.shutdown().await.unwrap();
}

// =============================================================================
// Filters
// =============================================================================

#[tokio::test]
async fn test_greedy_and_exact_name_filter() {
    let handles = memory_registry().await;
    let model = Model::new("acme", "1.0.0");
    for kind in ["Foo", "FooBar", "foobaz", "Bar"] {
        handles
            .components
            .register(&component(kind, "v1", model.clone()))
            .await
            .unwrap();
    }

    let greedy = handles
        .components
        .query(&ComponentFilter {
            name: "Foo".to_string(),
            greedy: true,
            order_on: Some(OrderField::Kind),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(kinds(&greedy), vec!["Foo", "FooBar"]);

    let exact = handles
        .components
        .query(&ComponentFilter::by_name("Foo"))
        .await
        .unwrap();
    assert_eq!(kinds(&exact), vec!["Foo"]);

    let none = handles
        .components
        .query(&ComponentFilter::by_name("Fo"))
        .await
        .unwrap();
    assert!(none.is_empty());

    handles.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_greedy_name_with_wildcard_characters() {
    let handles = memory_registry().await;
    let model = Model::new("acme", "1.0.0");
    for kind in ["My_Kind", "MyXKind", "100%Ready"] {
        handles
            .components
            .register(&component(kind, "v1", model.clone()))
            .await
            .unwrap();
    }

    let underscore = handles
        .components
        .query(&ComponentFilter {
            name: "My_".to_string(),
            greedy: true,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(kinds(&underscore), vec!["My_Kind"]);

    let percent = handles
        .components
        .query(&ComponentFilter {
            name: "100%".to_string(),
            greedy: true,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(kinds(&percent), vec!["100%Ready"]);

    handles.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_api_version_and_model_filters() {
    let handles = memory_registry().await;
    let istio_old = Model::new("istio", "1.19.0");
    let istio_new = Model::new("istio", "1.20.0");
    let linkerd = Model::new("linkerd", "2.14.0");

    let fixtures = [
        ("Gateway", "networking.istio.io/v1alpha3", istio_old.clone()),
        ("Gateway", "networking.istio.io/v1beta1", istio_new.clone()),
        ("Sidecar", "networking.istio.io/v1beta1", istio_new.clone()),
        ("Server", "policy.linkerd.io/v1beta1", linkerd.clone()),
    ];
    for (kind, api_version, model) in fixtures {
        handles
            .components
            .register(&component(kind, api_version, model))
            .await
            .unwrap();
    }
    assert_eq!(handles.models.count().await.unwrap(), 3);

    let by_api = handles
        .components
        .query(&ComponentFilter {
            api_version: "networking.istio.io/v1beta1".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(kinds(&by_api), vec!["Gateway", "Sidecar"]);

    let by_model = handles
        .components
        .query(&ComponentFilter {
            model_name: "istio".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(by_model.len(), 3);
    assert!(by_model.iter().all(|c| c.model.name == "istio"));

    let by_model_version = handles
        .components
        .query(&ComponentFilter {
            model_name: "istio".to_string(),
            version: "1.19.0".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(by_model_version.len(), 1);
    assert_eq!(
        by_model_version[0].api_version(),
        "networking.istio.io/v1alpha3"
    );

    let combined = handles
        .components
        .query(&ComponentFilter {
            name: "Gateway".to_string(),
            version: "1.20.0".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(combined.len(), 1);
    assert_eq!(combined[0].model.version, "1.20.0");

    handles.shutdown().await.unwrap();
}

// =============================================================================
// Ordering and pagination
// =============================================================================

async fn seed_ten(handles: &RegistryHandles) {
    let model = Model::new("acme", "1.0.0");
    // Insert out of order so ordering is observable
    for i in [7, 2, 9, 0, 5, 3, 8, 1, 6, 4] {
        handles
            .components
            .register(&component(&format!("Kind{i:02}"), "v1", model.clone()))
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn test_pagination_window() {
    let handles = memory_registry().await;
    seed_ten(&handles).await;

    let page = handles
        .components
        .query(&ComponentFilter {
            order_on: Some(OrderField::Kind),
            limit: 3,
            offset: 2,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(kinds(&page), vec!["Kind02", "Kind03", "Kind04"]);

    let all = handles
        .components
        .query(&ComponentFilter {
            order_on: Some(OrderField::Kind),
            limit: 0,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(all.len(), 10);
    assert_eq!(all[0].kind(), "Kind00");
    assert_eq!(all[9].kind(), "Kind09");

    let tail = handles
        .components
        .query(&ComponentFilter {
            order_on: Some(OrderField::Kind),
            offset: 8,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(kinds(&tail), vec!["Kind08", "Kind09"]);

    let past_end = handles
        .components
        .query(&ComponentFilter {
            offset: 10,
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(past_end.is_empty());

    handles.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_sort_direction() {
    let handles = memory_registry().await;
    seed_ten(&handles).await;

    let desc = handles
        .components
        .query(&ComponentFilter {
            order_on: Some(OrderField::Kind),
            sort: SortOrder::Desc,
            limit: 3,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(kinds(&desc), vec!["Kind09", "Kind08", "Kind07"]);

    // Direction without a field keeps insertion order
    let unordered = handles
        .components
        .query(&ComponentFilter {
            sort: SortOrder::Desc,
            limit: 2,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(kinds(&unordered), vec!["Kind07", "Kind02"]);

    handles.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_filter_from_map_drives_query() {
    let handles = memory_registry().await;
    seed_ten(&handles).await;

    let raw = json!({
        "name": "Kind0",
        "greedy": true,
        "orderOn": "kind",
        "sort": "desc",
        "limit": 2,
        "offset": 1
    });
    let filter = ComponentFilter::from_map(raw.as_object().unwrap()).unwrap();
    let page = handles.components.query(&filter).await.unwrap();
    assert_eq!(kinds(&page), vec!["Kind08", "Kind07"]);

    handles.shutdown().await.unwrap();
}

// =============================================================================
// Round trip
// =============================================================================

#[tokio::test]
async fn test_component_roundtrip_through_query() {
    let handles = memory_registry().await;
    let metadata = Metadata::from([
        ("isNamespaced".to_string(), json!(true)),
        ("styles".to_string(), json!({"shape": "circle", "width": 20})),
    ]);
    let model = Model::new("kubernetes", "v1.29.0")
        .with_display_name("Kubernetes")
        .with_category("Orchestration & Management")
        .with_metadata("source_uri", json!("git://github.com/kubernetes/kubernetes"));

    let mut definition = ComponentDefinition::new("Deployment", "apps/v1", model.clone())
        .with_display_name("Deployment")
        .with_format(ComponentFormat::Yaml)
        .with_schema("type: object");
    definition.metadata = metadata.clone();

    let id = handles.components.register(&definition).await.unwrap();
    let found = handles
        .components
        .query(&ComponentFilter::by_name("Deployment"))
        .await
        .unwrap();

    assert_eq!(found.len(), 1);
    let stored = &found[0];
    assert_eq!(stored.id, Some(id));
    assert_eq!(stored.type_meta, definition.type_meta);
    assert_eq!(stored.display_name, "Deployment");
    assert_eq!(stored.format, ComponentFormat::Yaml);
    assert_eq!(stored.schema, "type: object");
    assert_eq!(stored.metadata, metadata);
    assert_eq!(stored.model.name, model.name);
    assert_eq!(stored.model.category, model.category);
    assert_eq!(stored.model.metadata, model.metadata);

    handles.shutdown().await.unwrap();
}
