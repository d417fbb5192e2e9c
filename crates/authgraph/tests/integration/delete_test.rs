//! Integration tests for soft and hard deletes

use crate::common::{chain, EventLog};
use authgraph::{
    Authorizations, Direction, ElementRef, FetchHints, Graph, GraphConfig, GraphElement,
    GraphEvent, MemoryBackend, MutationBuilder, Visibility,
};
use std::sync::Arc;

#[test]
fn test_soft_delete_vertex_cascades_with_one_timestamp() {
    let graph = Graph::in_memory().unwrap();
    let auths = Authorizations::empty();
    chain(&graph, &auths);
    let log = EventLog::attach(&graph);

    graph.soft_delete_vertex("b", None, &auths).unwrap();

    assert!(graph.vertex("b", FetchHints::all(), &auths).unwrap().is_none());
    assert!(graph.edge("ab", FetchHints::all(), &auths).unwrap().is_none());
    assert!(graph.edge("bc", FetchHints::all(), &auths).unwrap().is_none());
    let a = graph.vertex("a", FetchHints::edge_refs(), &auths).unwrap().unwrap();
    assert!(a.edge_ids(Direction::Both, &[]).unwrap().is_empty());

    let events = log.take();
    let timestamps: Vec<i64> = events
        .iter()
        .filter_map(|e| match e {
            GraphEvent::SoftDeleteEdge { timestamp, .. }
            | GraphEvent::SoftDeleteVertex { timestamp, .. } => Some(*timestamp),
            _ => None,
        })
        .collect();
    assert_eq!(timestamps.len(), 3);
    assert!(timestamps.iter().all(|ts| *ts == timestamps[0]));
    assert!(matches!(events.last(), Some(GraphEvent::SoftDeleteVertex { vertex_id, .. }) if vertex_id == "b"));
}

#[test]
fn test_soft_delete_edge() {
    let graph = Graph::in_memory().unwrap();
    let auths = Authorizations::empty();
    chain(&graph, &auths);

    graph.soft_delete_edge("ab", Some(graph.current_time() + 10), &auths).unwrap();
    assert!(!graph.does_edge_exist("ab", &auths).unwrap());
    assert!(graph.does_vertex_exist("a", &auths).unwrap());
    let b = graph.vertex("b", FetchHints::edge_refs(), &auths).unwrap().unwrap();
    assert_eq!(b.edge_ids(Direction::Both, &[]).unwrap(), vec!["bc".to_string()]);
}

#[test]
fn test_soft_delete_missing_is_not_found() {
    let graph = Graph::in_memory().unwrap();
    let auths = Authorizations::empty();
    let err = graph.soft_delete_vertex("nope", None, &auths).unwrap_err();
    assert_eq!(err.to_string(), "Could not find vertex nope to soft delete");
    assert!(graph.soft_delete_edge("nope", None, &auths).unwrap_err().is_not_found());
}

#[test]
fn test_soft_delete_requires_readable_element() {
    let graph = Graph::in_memory().unwrap();
    graph
        .prepare_vertex_with_id("v1", Visibility::new("a"))
        .save(&Authorizations::new(["a"]))
        .unwrap();
    let err = graph
        .soft_delete_vertex("v1", None, &Authorizations::empty())
        .unwrap_err();
    assert!(err.is_not_found());
    assert!(graph.does_vertex_exist("v1", &Authorizations::new(["a"])).unwrap());
}

#[test]
fn test_hard_delete_vertex_removes_edges_and_refs() {
    let backend = Arc::new(MemoryBackend::new());
    let graph = Graph::with_backend(backend.clone()).unwrap();
    let auths = Authorizations::empty();
    chain(&graph, &auths);
    let log = EventLog::attach(&graph);

    graph.delete_vertex("b", &auths).unwrap();

    assert!(graph.vertex("b", FetchHints::all(), &auths).unwrap().is_none());
    assert!(graph.edges(FetchHints::none(), &auths).unwrap().is_empty());
    for id in ["a", "c"] {
        let vertex = graph.vertex(id, FetchHints::edge_refs(), &auths).unwrap().unwrap();
        assert!(vertex.edge_ids(Direction::Both, &[]).unwrap().is_empty());
    }

    let events = log.take();
    let deleted_edges = events
        .iter()
        .filter(|e| matches!(e, GraphEvent::DeleteEdge { .. }))
        .count();
    assert_eq!(deleted_edges, 2);
    assert_eq!(
        events.last(),
        Some(&GraphEvent::DeleteVertex {
            vertex_id: "b".to_string()
        })
    );
}

#[test]
fn test_hard_delete_leaves_no_cells_behind() {
    let backend = Arc::new(MemoryBackend::new());
    let graph = Graph::with_backend(backend.clone()).unwrap();
    let auths = Authorizations::empty();
    // Registers the "name" definition before the baseline is taken.
    graph
        .prepare_vertex_with_id("keep", Visibility::empty())
        .set_property("name", "k", Visibility::empty())
        .unwrap()
        .save(&auths)
        .unwrap();
    let baseline = backend.len();

    graph
        .prepare_vertex_with_id("gone", Visibility::empty())
        .set_property("name", "x", Visibility::empty())
        .unwrap()
        .add_extended_data("table", "row", "column", "value", Visibility::empty())
        .unwrap()
        .save(&auths)
        .unwrap();
    graph
        .prepare_edge_with_id("e", "keep", "gone", "knows", Visibility::empty())
        .save(&auths)
        .unwrap();
    graph.soft_delete_edge("e", None, &auths).unwrap();
    graph.delete_vertex("gone", &auths).unwrap();

    assert_eq!(backend.len(), baseline);
}

#[test]
fn test_hard_delete_edge() {
    let graph = Graph::in_memory().unwrap();
    let auths = Authorizations::empty();
    chain(&graph, &auths);
    graph.delete_edge("bc", &auths).unwrap();

    assert!(!graph.does_edge_exist("bc", &auths).unwrap());
    let c = graph.vertex("c", FetchHints::edge_refs(), &auths).unwrap().unwrap();
    assert!(c.edge_ids(Direction::Both, &[]).unwrap().is_empty());
    assert!(graph.delete_edge("bc", &auths).unwrap_err().is_not_found());
}

#[test]
fn test_delete_elements_in_batches() {
    let graph = Graph::builder(Arc::new(MemoryBackend::new()))
        .config(GraphConfig::default().with_delete_batch_size(2))
        .build()
        .unwrap();
    let auths = Authorizations::empty();
    for i in 0..5 {
        graph
            .prepare_vertex_with_id(format!("v{i}"), Visibility::empty())
            .save(&auths)
            .unwrap();
    }
    for i in 0..4 {
        graph
            .prepare_edge_with_id(format!("e{i}"), format!("v{i}"), format!("v{}", i + 1), "next", Visibility::empty())
            .save(&auths)
            .unwrap();
    }
    let log = EventLog::attach(&graph);

    let v0 = graph.vertex("v0", FetchHints::all(), &auths).unwrap().unwrap();
    let refs = vec![
        ElementRef::from(authgraph::Element::Vertex(v0)),
        ElementRef::VertexId("v1".to_string()),
        ElementRef::EdgeId("e3".to_string()),
        ElementRef::VertexId("v2".to_string()),
    ];
    graph.delete_elements(refs, &auths).unwrap();

    let remaining: Vec<String> = graph
        .vertices(FetchHints::none(), &auths)
        .unwrap()
        .iter()
        .map(|v| v.id().to_string())
        .collect();
    assert_eq!(remaining, vec!["v3".to_string(), "v4".to_string()]);
    assert!(graph.edges(FetchHints::none(), &auths).unwrap().is_empty());

    let events = log.take();
    let edge_events = events
        .iter()
        .filter(|e| matches!(e, GraphEvent::DeleteEdge { .. }))
        .count();
    assert_eq!(edge_events, 4);
}

#[test]
fn test_delete_elements_unknown_id() {
    let graph = Graph::in_memory().unwrap();
    let err = graph
        .delete_elements([ElementRef::VertexId("ghost".to_string())], &Authorizations::empty())
        .unwrap_err();
    assert_eq!(err.to_string(), "Could not find vertex ghost to delete");
}
