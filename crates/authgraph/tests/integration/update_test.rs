//! Integration tests for mutating existing elements

use crate::common::{chain, EventLog};
use authgraph::{
    Authorizations, Direction, Element, FetchHints, Graph, GraphConfig, GraphElement,
    GraphError, GraphEvent, MutationBuilder, PropertyDataType, PropertyDefinition, PropertyValue,
    TimeRange, Visibility,
};

fn vertex_with_name(graph: &Graph, auths: &Authorizations) -> Element {
    graph
        .prepare_vertex_with_id("v1", Visibility::empty())
        .set_property("name", "joe", Visibility::empty())
        .unwrap()
        .save(auths)
        .unwrap()
        .into()
}

#[test]
fn test_overwrite_property_value() {
    let graph = Graph::in_memory().unwrap();
    let auths = Authorizations::empty();
    let vertex = vertex_with_name(&graph, &auths);

    let updated = graph
        .prepare_mutation(&vertex)
        .unwrap()
        .set_property("name", "joseph", Visibility::empty())
        .unwrap()
        .save(&auths)
        .unwrap();
    assert_eq!(updated.property_value("name").unwrap(), Some("joseph".into()));

    let reread = graph.vertex("v1", FetchHints::all(), &auths).unwrap().unwrap();
    assert_eq!(reread.property_values("name").unwrap().len(), 1);
    assert_eq!(reread.property_value("name").unwrap(), Some("joseph".into()));
}

#[test]
fn test_same_key_and_name_under_two_visibilities() {
    let graph = Graph::in_memory().unwrap();
    let auths = Authorizations::new(["a", "b"]);
    let vertex = graph
        .prepare_vertex_with_id("v1", Visibility::empty())
        .add_property_value("k", "name", "for a", Visibility::new("a"))
        .unwrap()
        .add_property_value("k", "name", "for b", Visibility::new("b"))
        .unwrap()
        .save(&auths)
        .unwrap();
    assert_eq!(vertex.properties_named("name").unwrap().len(), 2);

    let only_b = graph
        .vertex("v1", FetchHints::all(), &Authorizations::new(["b"]))
        .unwrap()
        .unwrap();
    assert_eq!(only_b.property_value("name").unwrap(), Some("for b".into()));
}

#[test]
fn test_mutation_without_changes_fires_nothing() {
    let graph = Graph::in_memory().unwrap();
    let auths = Authorizations::empty();
    let vertex = vertex_with_name(&graph, &auths);
    let log = EventLog::attach(&graph);

    let mutation = graph.prepare_mutation(&vertex).unwrap();
    assert!(!mutation.has_changes());
    let unchanged = mutation.save(&auths).unwrap();
    assert_eq!(unchanged.id(), "v1");
    assert!(log.take().is_empty());
}

#[test]
fn test_alter_property_visibility() {
    let graph = Graph::in_memory().unwrap();
    let auths = Authorizations::new(["a"]);
    let vertex = vertex_with_name(&graph, &auths);

    graph
        .prepare_mutation(&vertex)
        .unwrap()
        .alter_property_visibility("", "name", None, Visibility::new("a"))
        .unwrap()
        .save(&auths)
        .unwrap();

    let with_a = graph.vertex("v1", FetchHints::all(), &auths).unwrap().unwrap();
    let property = with_a.property("name").unwrap().unwrap();
    assert_eq!(property.visibility(), &Visibility::new("a"));
    assert_eq!(property.value(), &PropertyValue::from("joe"));

    let without = graph
        .vertex("v1", FetchHints::all(), &Authorizations::empty())
        .unwrap()
        .unwrap();
    assert!(without.property("name").unwrap().is_none());
}

#[test]
fn test_alter_missing_property_visibility_fails() {
    let graph = Graph::in_memory().unwrap();
    let auths = Authorizations::empty();
    let vertex = vertex_with_name(&graph, &auths);
    let err = graph
        .prepare_mutation(&vertex)
        .unwrap()
        .alter_property_visibility("", "missing", None, Visibility::new("a"))
        .unwrap()
        .save(&auths)
        .unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_soft_delete_property_keeps_history() {
    let graph = Graph::in_memory().unwrap();
    let auths = Authorizations::empty();
    let vertex = vertex_with_name(&graph, &auths);
    let log = EventLog::attach(&graph);

    let updated = graph
        .prepare_mutation(&vertex)
        .unwrap()
        .soft_delete_property("", "name", None, None)
        .unwrap()
        .save(&auths)
        .unwrap();
    assert!(updated.property("name").unwrap().is_none());
    assert!(log.take().iter().any(|e| matches!(e, GraphEvent::SoftDeleteProperty { name, .. } if name == "name")));

    let history = graph
        .historical_property_values(&updated, None, Some("name"), None, None, &auths)
        .unwrap();
    assert_eq!(history.len(), 2);
    assert!(history[0].is_deleted);
    assert!(!history[1].is_deleted);
    assert_eq!(history[1].value, PropertyValue::from("joe"));
    assert!(history[0].timestamp >= history[1].timestamp);

    // A later write brings the property back.
    let restored = graph
        .prepare_mutation(&updated)
        .unwrap()
        .set_property("name", "again", Visibility::empty())
        .unwrap()
        .save(&auths)
        .unwrap();
    assert_eq!(restored.property_value("name").unwrap(), Some("again".into()));
}

#[test]
fn test_history_time_range() {
    let graph = Graph::in_memory().unwrap();
    let auths = Authorizations::empty();
    let vertex: Element = graph
        .prepare_vertex_with_id("v1", Visibility::empty())
        .add_property_value_full("", "age", 1, Default::default(), Some(100), Visibility::empty())
        .unwrap()
        .save(&auths)
        .unwrap()
        .into();
    let vertex = graph
        .prepare_mutation(&vertex)
        .unwrap()
        .add_property_value_full("", "age", 2, Default::default(), Some(200), Visibility::empty())
        .unwrap()
        .save(&auths)
        .unwrap();

    let all = graph
        .historical_property_values(&vertex, None, Some("age"), None, None, &auths)
        .unwrap();
    let values: Vec<i64> = all.iter().filter_map(|h| h.value.as_int()).collect();
    assert_eq!(values, vec![2, 1]);

    let early = graph
        .historical_property_values(
            &vertex,
            None,
            Some("age"),
            None,
            Some(TimeRange { start: 0, end: 150 }),
            &auths,
        )
        .unwrap();
    assert_eq!(early.len(), 1);
    assert_eq!(early[0].timestamp, 100);
}

#[test]
fn test_hard_delete_property() {
    let graph = Graph::in_memory().unwrap();
    let auths = Authorizations::empty();
    let vertex = vertex_with_name(&graph, &auths);
    let log = EventLog::attach(&graph);

    let updated = graph
        .prepare_mutation(&vertex)
        .unwrap()
        .delete_property("", "name", None)
        .unwrap()
        .save(&auths)
        .unwrap();
    assert!(updated.property("name").unwrap().is_none());
    assert!(log.take().iter().any(|e| matches!(e, GraphEvent::DeleteProperty { name, .. } if name == "name")));
    let history = graph
        .historical_property_values(&updated, None, Some("name"), None, None, &auths)
        .unwrap();
    assert!(history.is_empty());
}

#[test]
fn test_delete_then_set_in_one_mutation_keeps_new_value() {
    let graph = Graph::in_memory().unwrap();
    let auths = Authorizations::empty();
    let vertex = vertex_with_name(&graph, &auths);

    let updated = graph
        .prepare_mutation(&vertex)
        .unwrap()
        .delete_property("", "name", None)
        .unwrap()
        .set_property("name", "joseph", Visibility::empty())
        .unwrap()
        .save(&auths)
        .unwrap();
    assert_eq!(updated.property_value("name").unwrap(), Some("joseph".into()));

    let reread = graph.vertex("v1", FetchHints::all(), &auths).unwrap().unwrap();
    assert_eq!(reread.property_values("name").unwrap().len(), 1);
    assert_eq!(reread.property_value("name").unwrap(), Some("joseph".into()));
    let history = graph
        .historical_property_values(&updated, None, Some("name"), None, None, &auths)
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].value, PropertyValue::from("joseph"));
}

#[test]
fn test_soft_delete_then_set_in_one_mutation_keeps_new_value() {
    let graph = Graph::in_memory().unwrap();
    let auths = Authorizations::empty();
    let vertex = vertex_with_name(&graph, &auths);

    let updated = graph
        .prepare_mutation(&vertex)
        .unwrap()
        .soft_delete_property("", "name", None, None)
        .unwrap()
        .set_property("name", "joseph", Visibility::empty())
        .unwrap()
        .save(&auths)
        .unwrap();
    assert_eq!(updated.property_value("name").unwrap(), Some("joseph".into()));

    let reread = graph.vertex("v1", FetchHints::all(), &auths).unwrap().unwrap();
    assert_eq!(reread.property_value("name").unwrap(), Some("joseph".into()));

    // joseph, then the tombstone, then joe.
    let history = graph
        .historical_property_values(&updated, None, Some("name"), None, None, &auths)
        .unwrap();
    assert_eq!(history.len(), 3);
    assert!(!history[0].is_deleted);
    assert_eq!(history[0].value, PropertyValue::from("joseph"));
    assert!(history[1].is_deleted);
    assert!(history[1].timestamp < history[0].timestamp);
    assert_eq!(history[2].value, PropertyValue::from("joe"));
}

#[test]
fn test_property_metadata() {
    let graph = Graph::in_memory().unwrap();
    let auths = Authorizations::new(["m"]);
    let vertex = vertex_with_name(&graph, &auths);

    let updated = graph
        .prepare_mutation(&vertex)
        .unwrap()
        .set_property_metadata("", "name", Visibility::empty(), "confidence", 0.5, Visibility::new("m"))
        .unwrap()
        .save(&auths)
        .unwrap();
    let property = updated.property("name").unwrap().unwrap();
    assert_eq!(
        property.metadata().unwrap().value("confidence").unwrap(),
        Some(&PropertyValue::from(0.5))
    );

    let without_m = graph
        .vertex("v1", FetchHints::all(), &Authorizations::empty())
        .unwrap()
        .unwrap();
    let property = without_m.property("name").unwrap().unwrap();
    assert!(property.metadata().unwrap().is_empty());

    let no_metadata = graph
        .vertex("v1", FetchHints::properties(), &auths)
        .unwrap()
        .unwrap();
    let property = no_metadata.property("name").unwrap().unwrap();
    assert!(property.metadata().unwrap_err().is_fetch_hints_violation());
}

#[test]
fn test_alter_element_visibility() {
    let graph = Graph::in_memory().unwrap();
    let auths = Authorizations::new(["secret"]);
    let vertex = vertex_with_name(&graph, &auths);

    graph
        .prepare_mutation(&vertex)
        .unwrap()
        .alter_element_visibility(Visibility::new("secret"))
        .save(&auths)
        .unwrap();

    assert!(graph
        .vertex("v1", FetchHints::all(), &Authorizations::empty())
        .unwrap()
        .is_none());
    let vertex = graph.vertex("v1", FetchHints::all(), &auths).unwrap().unwrap();
    assert_eq!(vertex.visibility(), &Visibility::new("secret"));
    assert_eq!(vertex.property_value("name").unwrap(), Some("joe".into()));
}

#[test]
fn test_alter_edge_visibility_updates_refs() {
    let graph = Graph::in_memory().unwrap();
    let auths = Authorizations::new(["secret"]);
    chain(&graph, &auths);
    let edge = graph.edge("ab", FetchHints::all(), &auths).unwrap().unwrap();

    graph
        .prepare_edge_mutation(&edge)
        .alter_element_visibility(Visibility::new("secret"))
        .save(&auths)
        .unwrap();

    let a = graph
        .vertex("a", FetchHints::edge_refs(), &Authorizations::empty())
        .unwrap()
        .unwrap();
    assert!(a.edge_ids(Direction::Outgoing, &[]).unwrap().is_empty());
    let a = graph.vertex("a", FetchHints::edge_refs(), &auths).unwrap().unwrap();
    assert_eq!(a.edge_ids(Direction::Outgoing, &[]).unwrap(), vec!["ab".to_string()]);
}

#[test]
fn test_alter_edge_label_updates_refs() {
    let graph = Graph::in_memory().unwrap();
    let auths = Authorizations::empty();
    chain(&graph, &auths);
    let log = EventLog::attach(&graph);
    let edge = graph.edge("ab", FetchHints::all(), &auths).unwrap().unwrap();

    let updated = graph
        .prepare_edge_mutation(&edge)
        .alter_edge_label("likes")
        .unwrap()
        .save(&auths)
        .unwrap();
    assert_eq!(updated.as_edge().unwrap().label(), "likes");
    assert!(log.take().contains(&GraphEvent::AlterEdgeLabel {
        edge_id: "ab".to_string(),
        label: "likes".to_string()
    }));

    let a = graph.vertex("a", FetchHints::edge_refs(), &auths).unwrap().unwrap();
    assert_eq!(a.edge_ids(Direction::Outgoing, &["likes"]).unwrap(), vec!["ab".to_string()]);
    assert!(a.edge_ids(Direction::Outgoing, &["knows"]).unwrap().is_empty());
    let b = graph.vertex("b", FetchHints::edge_refs(), &auths).unwrap().unwrap();
    assert_eq!(b.edge_ids(Direction::Incoming, &["likes"]).unwrap(), vec!["ab".to_string()]);
}

#[test]
fn test_alter_concept_type() {
    let graph = Graph::in_memory().unwrap();
    let auths = Authorizations::empty();
    let vertex = graph
        .prepare_vertex_with_id("v1", Visibility::empty())
        .with_concept_type("person")
        .save(&auths)
        .unwrap();

    graph
        .prepare_vertex_mutation(&vertex)
        .alter_concept_type("company")
        .unwrap()
        .save(&auths)
        .unwrap();
    let vertex = graph.vertex("v1", FetchHints::all(), &auths).unwrap().unwrap();
    assert_eq!(vertex.concept_type(), Some("company"));
}

#[test]
fn test_update_soft_deleted_element_is_not_found() {
    let graph = Graph::in_memory().unwrap();
    let auths = Authorizations::empty();
    let vertex = vertex_with_name(&graph, &auths);
    graph.soft_delete_vertex("v1", None, &auths).unwrap();

    let err = graph
        .prepare_mutation(&vertex)
        .unwrap()
        .set_property("name", "ghost", Visibility::empty())
        .unwrap()
        .save(&auths)
        .unwrap_err();
    assert!(matches!(
        err,
        GraphError::NotFound { ref kind, ref operation, .. } if kind == "vertex" && operation == "update"
    ));
}

#[test]
fn test_strict_typing_rejects_wrong_type() {
    let graph = Graph::builder(std::sync::Arc::new(authgraph::MemoryBackend::new()))
        .config(GraphConfig::default().with_strict_typing(true))
        .build()
        .unwrap();
    let auths = Authorizations::empty();

    let err = graph
        .prepare_vertex_with_id("v1", Visibility::empty())
        .set_property("age", 42, Visibility::empty())
        .unwrap()
        .save(&auths)
        .unwrap_err();
    assert!(matches!(err, GraphError::SchemaViolation { .. }));

    graph
        .define_property(PropertyDefinition::new("age", PropertyDataType::Int))
        .unwrap();
    graph
        .prepare_vertex_with_id("v1", Visibility::empty())
        .set_property("age", 42, Visibility::empty())
        .unwrap()
        .save(&auths)
        .unwrap();
    let err = graph
        .prepare_vertex_with_id("v2", Visibility::empty())
        .set_property("age", "forty-two", Visibility::empty())
        .unwrap()
        .save(&auths)
        .unwrap_err();
    assert!(matches!(
        err,
        GraphError::SchemaViolation { ref property_name, .. } if property_name == "age"
    ));
}

#[test]
fn test_lenient_typing_defines_properties() {
    let graph = Graph::in_memory().unwrap();
    vertex_with_name(&graph, &Authorizations::empty());
    let definition = graph.property_definition("name").unwrap().unwrap();
    assert_eq!(definition.data_type, PropertyDataType::String);
}

#[test]
fn test_reserved_property_name_rejected() {
    let graph = Graph::in_memory().unwrap();
    let err = graph
        .prepare_vertex_with_id("v1", Visibility::empty())
        .set_property(authgraph::model::ID_PROPERTY_NAME, "x", Visibility::empty())
        .unwrap()
        .save(&Authorizations::empty())
        .unwrap_err();
    assert!(matches!(err, GraphError::InvalidOperation { .. }));
    assert!(graph
        .vertex("v1", FetchHints::all(), &Authorizations::empty())
        .unwrap()
        .is_none());
}
