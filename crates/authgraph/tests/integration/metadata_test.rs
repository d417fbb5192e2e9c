//! Integration tests for graph metadata and peer coherence

use authgraph::engine::{FORMAT_VERSION_METADATA_KEY, ID_GENERATOR_METADATA_KEY};
use authgraph::{
    Authorizations, Graph, GraphConfig, InProcessCoordinator, MemoryBackend, MutationBuilder,
    PropertyDataType, PropertyDefinition, Visibility,
};
use serde_json::json;
use std::sync::Arc;

fn peers() -> (Graph, Graph) {
    let backend = Arc::new(MemoryBackend::new());
    let coordinator = Arc::new(InProcessCoordinator::new());
    let first = Graph::builder(backend.clone())
        .coordinator(coordinator.clone())
        .build()
        .unwrap();
    let second = Graph::builder(backend)
        .coordinator(coordinator)
        .build()
        .unwrap();
    (first, second)
}

#[test]
fn test_set_get_remove_metadata() {
    let graph = Graph::in_memory().unwrap();
    assert_eq!(graph.get_metadata("missing").unwrap(), None);

    graph.set_metadata("owner", json!({"team": "graph"})).unwrap();
    assert_eq!(
        graph.get_metadata("owner").unwrap(),
        Some(json!({"team": "graph"}))
    );

    graph.set_metadata("owner", json!("someone else")).unwrap();
    assert_eq!(graph.get_metadata("owner").unwrap(), Some(json!("someone else")));

    graph.remove_metadata("owner").unwrap();
    assert_eq!(graph.get_metadata("owner").unwrap(), None);
}

#[test]
fn test_graph_identity_is_recorded() {
    let graph = Graph::in_memory().unwrap();
    assert_eq!(
        graph.get_metadata(ID_GENERATOR_METADATA_KEY).unwrap(),
        Some(json!("uuid"))
    );
    assert!(graph.get_metadata(FORMAT_VERSION_METADATA_KEY).unwrap().is_some());
}

#[test]
fn test_peers_see_each_others_metadata() {
    let (first, second) = peers();
    // Load the second peer's table before the first one writes.
    assert_eq!(second.get_metadata("shared").unwrap(), None);

    first.set_metadata("shared", json!(1)).unwrap();
    assert_eq!(second.get_metadata("shared").unwrap(), Some(json!(1)));

    second.remove_metadata("shared").unwrap();
    assert_eq!(first.get_metadata("shared").unwrap(), None);
}

#[test]
fn test_reload_reads_writes_made_without_notification() {
    let backend = Arc::new(MemoryBackend::new());
    // Separate coordinators: no notification crosses between the two graphs.
    let first = Graph::with_backend(backend.clone()).unwrap();
    let second = Graph::with_backend(backend).unwrap();
    assert_eq!(second.get_metadata("late").unwrap(), None);

    first.set_metadata("late", json!(true)).unwrap();
    second.reload_metadata().unwrap();
    assert_eq!(second.get_metadata("late").unwrap(), Some(json!(true)));
}

#[test]
fn test_property_definitions_across_peers() {
    let (first, second) = peers();
    assert!(second.property_definition("age").unwrap().is_none());

    first
        .define_property(PropertyDefinition::new("age", PropertyDataType::Int).with_sortable(true))
        .unwrap();
    let definition = second.property_definition("age").unwrap().unwrap();
    assert_eq!(definition.data_type, PropertyDataType::Int);
    assert!(definition.sortable);

    let names: Vec<String> = second
        .property_definitions()
        .unwrap()
        .into_iter()
        .map(|d| d.name)
        .collect();
    assert_eq!(names, vec!["age".to_string()]);
}

#[test]
fn test_strict_peer_accepts_definition_from_other_peer() {
    let backend = Arc::new(MemoryBackend::new());
    let coordinator = Arc::new(InProcessCoordinator::new());
    let lenient = Graph::builder(backend.clone())
        .coordinator(coordinator.clone())
        .build()
        .unwrap();
    let strict = Graph::builder(backend)
        .coordinator(coordinator)
        .config(GraphConfig::default().with_strict_typing(true))
        .build()
        .unwrap();
    let auths = Authorizations::empty();

    lenient
        .prepare_vertex_with_id("v1", Visibility::empty())
        .set_property("name", "joe", Visibility::empty())
        .unwrap()
        .save(&auths)
        .unwrap();
    strict
        .prepare_vertex_with_id("v2", Visibility::empty())
        .set_property("name", "ann", Visibility::empty())
        .unwrap()
        .save(&auths)
        .unwrap();
}

#[test]
fn test_reserved_definitions_cannot_be_replaced() {
    let graph = Graph::in_memory().unwrap();
    let err = graph
        .define_property(PropertyDefinition::new(
            authgraph::model::ID_PROPERTY_NAME,
            PropertyDataType::Int,
        ))
        .unwrap_err();
    assert!(matches!(err, authgraph::GraphError::InvalidOperation { .. }));
    let built_in = graph
        .property_definition(authgraph::model::ID_PROPERTY_NAME)
        .unwrap()
        .unwrap();
    assert_eq!(built_in.data_type, PropertyDataType::String);
}
