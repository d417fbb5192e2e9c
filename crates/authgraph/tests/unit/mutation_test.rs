//! Unit tests for mutation builders and batch ordering

use authgraph::mutation::order_vertices_first;
use authgraph::model::ID_PROPERTY_NAME;
use authgraph::{
    Authorizations, ElementMutation, ElementType, FetchHints, Graph, GraphElement, GraphError,
    MutationBuilder, PropertyValue, Visibility,
};

#[test]
fn test_builder_rejects_empty_name_and_null_value() {
    let graph = Graph::in_memory().unwrap();
    assert!(graph
        .prepare_vertex(Visibility::empty())
        .set_property("", "x", Visibility::empty())
        .is_err());
    assert!(graph
        .prepare_vertex(Visibility::empty())
        .set_property("name", PropertyValue::Null, Visibility::empty())
        .is_err());
}

#[test]
fn test_builder_rejects_separator_in_identifiers() {
    let graph = Graph::in_memory().unwrap();
    let err = graph
        .prepare_vertex(Visibility::empty())
        .set_property("bad\u{1f}name", "x", Visibility::empty())
        .unwrap_err();
    assert!(matches!(err, GraphError::InvalidOperation { .. }));
}

#[test]
fn test_reserved_property_names_are_rejected_on_save() {
    let graph = Graph::in_memory().unwrap();
    let err = graph
        .prepare_vertex(Visibility::empty())
        .set_property(ID_PROPERTY_NAME, "x", Visibility::empty())
        .unwrap()
        .save(&Authorizations::empty())
        .unwrap_err();
    assert!(matches!(err, GraphError::InvalidOperation { .. }));
}

#[test]
fn test_has_changes() {
    let graph = Graph::in_memory().unwrap();
    let auths = Authorizations::empty();
    assert!(!graph.prepare_vertex(Visibility::empty()).has_changes());
    assert!(graph
        .prepare_vertex(Visibility::empty())
        .with_concept_type("person")
        .has_changes());

    let vertex = graph
        .prepare_vertex_with_id("v1", Visibility::empty())
        .save(&auths)
        .unwrap();
    let mutation = graph.prepare_vertex_mutation(&vertex);
    assert!(!mutation.has_changes());
    // Altering to the current visibility is not a change.
    let mutation = mutation.alter_element_visibility(Visibility::empty());
    assert!(!mutation.has_changes());
}

#[test]
fn test_alter_label_only_on_edges() {
    let graph = Graph::in_memory().unwrap();
    let auths = Authorizations::empty();
    let vertex = graph
        .prepare_vertex_with_id("v1", Visibility::empty())
        .save(&auths)
        .unwrap();
    assert!(graph.prepare_vertex_mutation(&vertex).alter_edge_label("x").is_err());
    assert!(graph.prepare_vertex_mutation(&vertex).alter_concept_type("person").is_ok());
}

#[test]
fn test_order_vertices_first_is_stable() {
    let graph = Graph::in_memory().unwrap();
    let mut mutations: Vec<ElementMutation<'_>> = vec![
        graph.prepare_edge_with_id("e1", "a", "b", "l", Visibility::empty()).into(),
        graph.prepare_vertex_with_id("a", Visibility::empty()).into(),
        graph.prepare_edge_with_id("e2", "b", "a", "l", Visibility::empty()).into(),
        graph.prepare_vertex_with_id("b", Visibility::empty()).into(),
    ];
    order_vertices_first(&mut mutations);

    let types: Vec<ElementType> = mutations.iter().map(ElementMutation::element_type).collect();
    assert_eq!(
        types,
        vec![ElementType::Vertex, ElementType::Vertex, ElementType::Edge, ElementType::Edge]
    );
    let ids: Vec<&str> = mutations
        .iter()
        .map(|m| match m {
            ElementMutation::NewVertex(b) => b.id().unwrap_or(""),
            ElementMutation::NewEdge(b) => b.id().unwrap_or(""),
            ElementMutation::Existing(m) => m.element().id(),
        })
        .collect();
    assert_eq!(ids, vec!["a", "b", "e1", "e2"]);
}

#[test]
fn test_generated_ids_are_unique() {
    let graph = Graph::in_memory().unwrap();
    let auths = Authorizations::empty();
    let a = graph.prepare_vertex(Visibility::empty()).save(&auths).unwrap();
    let b = graph.prepare_vertex(Visibility::empty()).save(&auths).unwrap();
    assert_ne!(a.id(), b.id());
    assert!(graph.vertex(a.id(), FetchHints::none(), &auths).unwrap().is_some());
}
