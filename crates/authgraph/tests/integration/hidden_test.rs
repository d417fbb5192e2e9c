//! Integration tests for hiding and un-hiding elements and properties

use crate::common::{chain, EventLog};
use authgraph::{
    Authorizations, Direction, Element, ElementType, FetchHints, Graph, GraphElement, GraphEvent,
    MutationBuilder, Visibility,
};

fn hider() -> Authorizations {
    Authorizations::new(["h"])
}

#[test]
fn test_mark_vertex_hidden_then_visible() {
    let graph = Graph::in_memory().unwrap();
    let auths = hider();
    graph
        .prepare_vertex_with_id("v1", Visibility::empty())
        .save(&auths)
        .unwrap();

    graph.mark_vertex_hidden("v1", &Visibility::new("h"), &auths).unwrap();
    assert!(graph.vertex("v1", FetchHints::all(), &auths).unwrap().is_none());

    let hidden = graph
        .vertex("v1", FetchHints::all_including_hidden(), &auths)
        .unwrap()
        .unwrap();
    assert!(hidden.is_hidden(&auths));
    assert!(hidden.hidden_visibilities().contains(&Visibility::new("h")));

    // Readers who cannot see the marker still see the vertex.
    assert!(graph
        .vertex("v1", FetchHints::all(), &Authorizations::empty())
        .unwrap()
        .is_some());

    graph.mark_vertex_visible("v1", &Visibility::new("h"), &auths).unwrap();
    let vertex = graph.vertex("v1", FetchHints::all(), &auths).unwrap().unwrap();
    assert!(!vertex.is_hidden(&auths));
}

#[test]
fn test_hidden_vertex_hides_its_edges() {
    let graph = Graph::in_memory().unwrap();
    let auths = hider();
    chain(&graph, &auths);
    let log = EventLog::attach(&graph);

    graph.mark_vertex_hidden("b", &Visibility::new("h"), &auths).unwrap();
    assert!(graph.edge("ab", FetchHints::all(), &auths).unwrap().is_none());
    assert!(graph.edge("bc", FetchHints::all(), &auths).unwrap().is_none());
    let a = graph.vertex("a", FetchHints::edge_refs(), &auths).unwrap().unwrap();
    assert!(a.edge_ids(Direction::Outgoing, &[]).unwrap().is_empty());

    let events = log.take();
    assert_eq!(
        events.last(),
        Some(&GraphEvent::MarkHidden {
            element_type: ElementType::Vertex,
            element_id: "b".to_string(),
            visibility: Visibility::new("h"),
        })
    );
    assert_eq!(
        events
            .iter()
            .filter(|e| matches!(e, GraphEvent::MarkHidden { element_type: ElementType::Edge, .. }))
            .count(),
        2
    );

    graph.mark_vertex_visible("b", &Visibility::new("h"), &auths).unwrap();
    assert!(graph.edge("ab", FetchHints::all(), &auths).unwrap().is_some());
    let a = graph.vertex("a", FetchHints::edge_refs(), &auths).unwrap().unwrap();
    assert_eq!(a.edge_ids(Direction::Outgoing, &[]).unwrap(), vec!["ab".to_string()]);
}

#[test]
fn test_mark_edge_hidden() {
    let graph = Graph::in_memory().unwrap();
    let auths = hider();
    chain(&graph, &auths);

    graph.mark_edge_hidden("ab", &Visibility::new("h"), &auths).unwrap();
    assert!(graph.edge("ab", FetchHints::all(), &auths).unwrap().is_none());
    assert!(graph
        .edge("ab", FetchHints::all_including_hidden(), &auths)
        .unwrap()
        .is_some());
    let b = graph.vertex("b", FetchHints::edge_refs(), &auths).unwrap().unwrap();
    assert!(b.edge_ids(Direction::Incoming, &[]).unwrap().is_empty());
    assert_eq!(b.edge_ids(Direction::Outgoing, &[]).unwrap(), vec!["bc".to_string()]);

    graph.mark_edge_visible("ab", &Visibility::new("h"), &auths).unwrap();
    let b = graph.vertex("b", FetchHints::edge_refs(), &auths).unwrap().unwrap();
    assert_eq!(b.edge_ids(Direction::Incoming, &[]).unwrap(), vec!["ab".to_string()]);
}

#[test]
fn test_mark_hidden_missing_element() {
    let graph = Graph::in_memory().unwrap();
    let err = graph
        .mark_vertex_hidden("ghost", &Visibility::new("h"), &hider())
        .unwrap_err();
    assert_eq!(err.to_string(), "Could not find vertex ghost to mark hidden");
    let err = graph
        .mark_edge_visible("ghost", &Visibility::new("h"), &hider())
        .unwrap_err();
    assert_eq!(err.to_string(), "Could not find edge ghost to mark visible");
}

#[test]
fn test_mark_property_hidden() {
    let graph = Graph::in_memory().unwrap();
    let auths = hider();
    let vertex: Element = graph
        .prepare_vertex_with_id("v1", Visibility::empty())
        .set_property("name", "joe", Visibility::empty())
        .unwrap()
        .set_property("age", 30, Visibility::empty())
        .unwrap()
        .save(&auths)
        .unwrap()
        .into();
    let property = vertex.property("name").unwrap().unwrap().into_owned();

    graph
        .mark_property_hidden(&vertex, &property, &Visibility::new("h"), &auths)
        .unwrap();
    let reread = graph.vertex("v1", FetchHints::all(), &auths).unwrap().unwrap();
    assert!(reread.property("name").unwrap().is_none());
    assert!(reread.property("age").unwrap().is_some());

    let including_hidden = graph
        .vertex("v1", FetchHints::all_including_hidden(), &auths)
        .unwrap()
        .unwrap();
    let hidden = including_hidden.property("name").unwrap().unwrap();
    assert!(hidden.is_hidden(&auths));

    graph
        .mark_property_visible(&vertex, &property, &Visibility::new("h"), &auths)
        .unwrap();
    let reread = graph.vertex("v1", FetchHints::all(), &auths).unwrap().unwrap();
    assert_eq!(reread.property_value("name").unwrap(), Some("joe".into()));
}

#[test]
fn test_mark_edge_property_hidden() {
    let graph = Graph::in_memory().unwrap();
    let auths = hider();
    chain(&graph, &auths);
    let edge: Element = graph
        .prepare_edge_with_id("ac", "a", "c", "knows", Visibility::empty())
        .set_property("since", 2020, Visibility::empty())
        .unwrap()
        .save(&auths)
        .unwrap()
        .into();
    let property = edge.property("since").unwrap().unwrap().into_owned();

    graph
        .mark_property_hidden(&edge, &property, &Visibility::new("h"), &auths)
        .unwrap();
    let reread = graph.edge("ac", FetchHints::all(), &auths).unwrap().unwrap();
    assert!(reread.property("since").unwrap().is_none());
}
