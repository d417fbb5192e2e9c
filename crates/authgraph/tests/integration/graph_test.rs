//! Integration tests for element creation and the read API

use crate::common::{chain, edge, EventLog};
use authgraph::{
    Authorizations, Direction, FetchHints, Graph, GraphElement, GraphError, GraphEvent,
    MutationBuilder, PropertyValue, Visibility,
};

#[test]
fn test_property_visibility_filters_reads() {
    let graph = Graph::in_memory().unwrap();
    let writer = Authorizations::new(["a", "b"]);
    graph
        .prepare_vertex_with_id("v1", Visibility::empty())
        .add_property_value("k1", "name", "public", Visibility::empty())
        .unwrap()
        .add_property_value("k1", "name", "secret", Visibility::new("a"))
        .unwrap()
        .add_property_value("k2", "name", "top", Visibility::new("a&b"))
        .unwrap()
        .save(&writer)
        .unwrap();

    let all = graph.vertex("v1", FetchHints::all(), &writer).unwrap().unwrap();
    assert_eq!(all.property_values("name").unwrap().len(), 3);

    let only_a = Authorizations::new(["a"]);
    let partial = graph.vertex("v1", FetchHints::all(), &only_a).unwrap().unwrap();
    let mut values: Vec<String> = partial
        .property_values("name")
        .unwrap()
        .iter()
        .filter_map(|v| v.as_str().map(str::to_string))
        .collect();
    values.sort();
    assert_eq!(values, vec!["public".to_string(), "secret".to_string()]);

    let nobody = graph
        .vertex("v1", FetchHints::all(), &Authorizations::empty())
        .unwrap()
        .unwrap();
    assert_eq!(
        nobody.property_values("name").unwrap(),
        vec![PropertyValue::from("public")]
    );
}

#[test]
fn test_element_visibility_hides_whole_element() {
    let graph = Graph::in_memory().unwrap();
    let auths = Authorizations::new(["a"]);
    graph
        .prepare_vertex_with_id("v1", Visibility::new("a"))
        .save(&auths)
        .unwrap();

    assert!(graph.vertex("v1", FetchHints::all(), &auths).unwrap().is_some());
    // The cached copy must not leak to a caller without the token.
    assert!(graph
        .vertex("v1", FetchHints::all(), &Authorizations::empty())
        .unwrap()
        .is_none());
    assert!(!graph.does_vertex_exist("v1", &Authorizations::empty()).unwrap());
}

#[test]
fn test_edge_requires_existing_endpoints() {
    let graph = Graph::in_memory().unwrap();
    let auths = Authorizations::empty();
    graph
        .prepare_vertex_with_id("a", Visibility::empty())
        .save(&auths)
        .unwrap();
    let err = graph
        .prepare_edge("a", "missing", "knows", Visibility::empty())
        .save(&auths)
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "Could not find vertex missing to add edge");
}

#[test]
fn test_edges_and_edge_refs() {
    let graph = Graph::in_memory().unwrap();
    let auths = Authorizations::empty();
    chain(&graph, &auths);

    let edge = graph.edge("ab", FetchHints::all(), &auths).unwrap().unwrap();
    assert_eq!(edge.out_vertex_id(), "a");
    assert_eq!(edge.in_vertex_id(), "b");
    assert_eq!(edge.label(), "knows");

    let b = graph.vertex("b", FetchHints::all(), &auths).unwrap().unwrap();
    assert_eq!(b.vertex_ids(Direction::Incoming, &[]).unwrap(), vec!["a".to_string()]);
    assert_eq!(b.vertex_ids(Direction::Outgoing, &[]).unwrap(), vec!["c".to_string()]);
    assert_eq!(b.edge_ids(Direction::Both, &[]).unwrap().len(), 2);

    let neighbors = graph
        .vertex_neighbors(&b, Direction::Both, &[], FetchHints::properties(), &auths)
        .unwrap();
    let mut ids: Vec<&str> = neighbors.iter().map(|v| v.id()).collect();
    ids.sort();
    assert_eq!(ids, vec!["a", "c"]);

    let edges = graph
        .vertex_edges(&b, Direction::Outgoing, &["knows"], FetchHints::all(), &auths)
        .unwrap();
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].id(), "bc");
}

#[test]
fn test_edge_ref_visibility() {
    let graph = Graph::in_memory().unwrap();
    let writer = Authorizations::new(["a"]);
    for id in ["v1", "v2"] {
        graph
            .prepare_vertex_with_id(id, Visibility::empty())
            .save(&writer)
            .unwrap();
    }
    graph
        .prepare_edge_with_id("e1", "v1", "v2", "knows", Visibility::new("a"))
        .save(&writer)
        .unwrap();

    let v1 = graph.vertex("v1", FetchHints::edge_refs(), &writer).unwrap().unwrap();
    assert_eq!(v1.edge_ids(Direction::Outgoing, &[]).unwrap().len(), 1);
    let v1 = graph
        .vertex("v1", FetchHints::edge_refs(), &Authorizations::empty())
        .unwrap()
        .unwrap();
    assert!(v1.edge_ids(Direction::Outgoing, &[]).unwrap().is_empty());
}

#[test]
fn test_bulk_and_range_reads() {
    let graph = Graph::in_memory().unwrap();
    let auths = Authorizations::empty();
    for id in ["v1", "v2", "v3", "w1"] {
        graph
            .prepare_vertex_with_id(id, Visibility::empty())
            .save(&auths)
            .unwrap();
    }

    let all = graph.vertices(FetchHints::none(), &auths).unwrap();
    assert_eq!(all.len(), 4);

    let range = graph.vertices_in_range("v1", "v3", FetchHints::none(), &auths).unwrap();
    let ids: Vec<&str> = range.iter().map(|v| v.id()).collect();
    assert_eq!(ids, vec!["v1", "v2"]);

    let by_ids = graph
        .vertices_by_ids(["v3", "missing", "w1"], FetchHints::none(), &auths)
        .unwrap();
    assert_eq!(by_ids.len(), 2);

    let exists = graph.do_vertices_exist(["v1", "nope"], &auths).unwrap();
    assert_eq!(exists.get("v1"), Some(&true));
    assert_eq!(exists.get("nope"), Some(&false));
}

#[test]
fn test_edges_in_range_and_by_ids() {
    let graph = Graph::in_memory().unwrap();
    let auths = Authorizations::empty();
    chain(&graph, &auths);
    edge(&graph, "ca", "c", "a", "likes", &auths);

    assert_eq!(graph.edges(FetchHints::none(), &auths).unwrap().len(), 3);
    let range = graph.edges_in_range("a", "c", FetchHints::none(), &auths).unwrap();
    let ids: Vec<&str> = range.iter().map(|e| e.id()).collect();
    assert_eq!(ids, vec!["ab", "bc"]);
    assert!(graph.does_edge_exist("ca", &auths).unwrap());
    assert_eq!(graph.edges_by_ids(["ca", "zz"], FetchHints::all(), &auths).unwrap().len(), 1);
}

#[test]
fn test_timestamps_increase_and_explicit_timestamps_stick() {
    let graph = Graph::in_memory().unwrap();
    let auths = Authorizations::empty();
    let first = graph.prepare_vertex(Visibility::empty()).save(&auths).unwrap();
    let second = graph.prepare_vertex(Visibility::empty()).save(&auths).unwrap();
    assert!(second.timestamp() > first.timestamp());

    let explicit = graph
        .prepare_vertex_with_id("old", Visibility::empty())
        .with_timestamp(5)
        .save(&auths)
        .unwrap();
    assert_eq!(explicit.timestamp(), 5);
    let next = graph.prepare_vertex(Visibility::empty()).save(&auths).unwrap();
    assert!(next.timestamp() > second.timestamp());
}

#[test]
fn test_create_fires_events() {
    let graph = Graph::in_memory().unwrap();
    let log = EventLog::attach(&graph);
    let auths = Authorizations::empty();
    graph
        .prepare_vertex_with_id("v1", Visibility::empty())
        .set_property("name", "joe", Visibility::empty())
        .unwrap()
        .save(&auths)
        .unwrap();

    let events = log.take();
    assert!(events.contains(&GraphEvent::AddVertex {
        vertex_id: "v1".to_string()
    }));
    assert!(events.iter().any(|e| matches!(
        e,
        GraphEvent::AddProperty { element_id, name, .. } if element_id == "v1" && name == "name"
    )));
}

#[test]
fn test_concept_type() {
    let graph = Graph::in_memory().unwrap();
    let auths = Authorizations::empty();
    let vertex = graph
        .prepare_vertex_with_id("v1", Visibility::empty())
        .with_concept_type("person")
        .save(&auths)
        .unwrap();
    assert_eq!(vertex.concept_type(), Some("person"));
}

#[test]
fn test_invalid_ids_are_rejected() {
    let graph = Graph::in_memory().unwrap();
    let err = graph
        .prepare_vertex_with_id("bad\u{1f}id", Visibility::empty())
        .save(&Authorizations::empty())
        .unwrap_err();
    assert!(matches!(err, GraphError::InvalidOperation { .. }));
    assert!(graph
        .vertex("bad\u{1f}id", FetchHints::all(), &Authorizations::empty())
        .unwrap()
        .is_none());
}

#[test]
fn test_batch_saves_vertices_before_edges() {
    let graph = Graph::in_memory().unwrap();
    let auths = Authorizations::empty();

    let saved = graph
        .save_element_mutations(
            vec![
                graph
                    .prepare_edge_with_id("e1", "a", "b", "knows", Visibility::empty())
                    .into(),
                graph.prepare_vertex_with_id("a", Visibility::empty()).into(),
                graph.prepare_vertex_with_id("b", Visibility::empty()).into(),
            ],
            &auths,
        )
        .unwrap();
    let ids: Vec<&str> = saved.iter().map(|e| e.id()).collect();
    assert_eq!(ids, vec!["a", "b", "e1"]);

    let a = graph.vertex("a", FetchHints::all(), &auths).unwrap().unwrap();
    let b = graph.vertex("b", FetchHints::all(), &auths).unwrap().unwrap();
    assert_eq!(a.edge_ids(Direction::Outgoing, &[]).unwrap(), vec!["e1".to_string()]);
    assert_eq!(b.edge_ids(Direction::Incoming, &[]).unwrap(), vec!["e1".to_string()]);
}
