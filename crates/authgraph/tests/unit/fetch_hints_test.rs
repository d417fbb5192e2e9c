//! Unit tests for fetch hints presets, validation and accessor enforcement

use authgraph::{
    Authorizations, Direction, FetchHints, Graph, GraphElement, GraphError, MutationBuilder,
    Visibility,
};

fn graph_with_pair() -> (Graph, Authorizations) {
    let graph = Graph::in_memory().unwrap();
    let auths = Authorizations::empty();
    graph
        .prepare_vertex_with_id("v1", Visibility::empty())
        .set_property("name", "one", Visibility::empty())
        .unwrap()
        .set_property("age", 42, Visibility::empty())
        .unwrap()
        .save(&auths)
        .unwrap();
    graph
        .prepare_vertex_with_id("v2", Visibility::empty())
        .save(&auths)
        .unwrap();
    graph
        .prepare_edge_with_id("e1", "v1", "v2", "knows", Visibility::empty())
        .save(&auths)
        .unwrap();
    (graph, auths)
}

#[test]
fn test_edge_refs_without_ids_are_rejected() {
    let err = FetchHints::builder()
        .include_all_edge_refs(true)
        .include_edge_ids(false)
        .include_edge_vertex_ids(false)
        .build()
        .unwrap_err();
    assert!(matches!(err, GraphError::InvalidFetchHints { .. }));
}

#[test]
fn test_preset_coverage() {
    assert!(FetchHints::all().has_fetch_hints(FetchHints::none()));
    assert!(FetchHints::all().has_fetch_hints(FetchHints::properties()));
    assert!(!FetchHints::none().has_fetch_hints(FetchHints::all()));
    assert!(FetchHints::all_including_hidden().has_fetch_hints(FetchHints::all()));
    assert!(!FetchHints::all().has_fetch_hints(FetchHints::all_including_hidden()));
}

#[test]
fn test_unfetched_properties_are_an_error() {
    let (graph, auths) = graph_with_pair();
    let vertex = graph.vertex("v1", FetchHints::none(), &auths).unwrap().unwrap();

    let err = vertex.property_value("name").unwrap_err();
    assert!(err.is_fetch_hints_violation());
    assert_eq!(vertex.id(), "v1");
}

#[test]
fn test_named_property_hints_load_only_those_names() {
    let (graph, auths) = graph_with_pair();
    let hints = FetchHints::builder()
        .property_names_to_include(["name"])
        .build()
        .unwrap();
    let vertex = graph.vertex("v1", &hints, &auths).unwrap().unwrap();

    assert_eq!(vertex.property_value("name").unwrap(), Some("one".into()));
    assert!(vertex.property_value("age").is_err());
}

#[test]
fn test_unfetched_edge_refs_are_an_error() {
    let (graph, auths) = graph_with_pair();
    let vertex = graph.vertex("v1", FetchHints::properties(), &auths).unwrap().unwrap();
    assert!(vertex.edge_ids(Direction::Both, &[]).is_err());

    let vertex = graph.vertex("v1", FetchHints::edge_refs(), &auths).unwrap().unwrap();
    assert_eq!(vertex.edge_ids(Direction::Outgoing, &[]).unwrap(), vec!["e1".to_string()]);
    assert!(vertex.edge_ids(Direction::Incoming, &[]).unwrap().is_empty());
    assert!(vertex.property_value("name").is_err());
}

#[test]
fn test_edge_label_filter() {
    let (graph, auths) = graph_with_pair();
    graph
        .prepare_edge_with_id("e2", "v1", "v2", "likes", Visibility::empty())
        .save(&auths)
        .unwrap();
    let hints = FetchHints::builder()
        .include_out_edge_refs(true)
        .edge_labels_of_edge_refs_to_include(["likes"])
        .build()
        .unwrap();
    let vertex = graph.vertex("v1", &hints, &auths).unwrap().unwrap();
    assert_eq!(vertex.edge_ids(Direction::Outgoing, &["likes"]).unwrap(), vec!["e2".to_string()]);
}

#[test]
fn test_edge_label_counts() {
    let (graph, auths) = graph_with_pair();
    let vertex = graph.vertex("v2", FetchHints::edge_labels(), &auths).unwrap().unwrap();
    assert_eq!(vertex.edge_count(Direction::Incoming).unwrap(), 1);
    assert!(vertex.edge_labels(Direction::Both).unwrap().contains("knows"));
}
