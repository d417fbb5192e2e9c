//! Integration tests for externalized property values

use authgraph::storage::StreamingRef;
use authgraph::{
    Authorizations, Element, FetchHints, Graph, GraphConfig, GraphElement, MemoryBackend,
    MutationBuilder, PropertyValue, StreamingPropertyValue, StreamingValueSink, Visibility,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::sync::Arc;

/// Sink keeping payloads in a map, to observe what the graph stores.
#[derive(Default)]
struct MapSink {
    payloads: Mutex<HashMap<String, Vec<u8>>>,
}

impl StreamingValueSink for MapSink {
    fn save(
        &self,
        row_key: &str,
        key: &str,
        name: &str,
        bytes: &[u8],
    ) -> authgraph::Result<StreamingRef> {
        let mut payloads = self.payloads.lock();
        let reference = format!("{row_key}/{key}/{name}/{}", payloads.len());
        payloads.insert(reference.clone(), bytes.to_vec());
        Ok(StreamingRef::new(reference))
    }

    fn open_input_streams(
        &self,
        references: &[StreamingRef],
    ) -> authgraph::Result<Vec<Box<dyn Read + Send>>> {
        let payloads = self.payloads.lock();
        references
            .iter()
            .map(|r| {
                payloads
                    .get(r.as_str())
                    .map(|bytes| Box::new(Cursor::new(bytes.clone())) as Box<dyn Read + Send>)
                    .ok_or_else(|| authgraph::GraphError::not_found("payload", r.as_str(), "open"))
            })
            .collect()
    }

    fn delete(&self, reference: &StreamingRef) -> authgraph::Result<()> {
        self.payloads.lock().remove(reference.as_str());
        Ok(())
    }
}

fn text_of(element: &impl GraphElement, name: &str) -> String {
    match element.property_value(name).unwrap() {
        Some(PropertyValue::Streaming(value)) => value.read_to_string().unwrap(),
        other => panic!("expected a streaming value, found {other:?}"),
    }
}

#[test]
fn test_streaming_value_round_trip() {
    let graph = Graph::in_memory().unwrap();
    let auths = Authorizations::empty();
    let text = "lorem ipsum ".repeat(1000);
    graph
        .prepare_vertex_with_id("doc", Visibility::empty())
        .set_property("body", StreamingPropertyValue::from_string(text.clone()), Visibility::empty())
        .unwrap()
        .save(&auths)
        .unwrap();

    let vertex = graph.vertex("doc", FetchHints::all(), &auths).unwrap().unwrap();
    assert_eq!(text_of(&vertex, "body"), text);
    let Some(PropertyValue::Streaming(value)) = vertex.property_value("body").unwrap() else {
        panic!("body is not streaming");
    };
    assert_eq!(value.len(), text.len() as u64);
    assert!(value.is_searchable());
    assert!(value.reference().is_some());
}

#[test]
fn test_large_bytes_are_externalized() {
    let backend = Arc::new(MemoryBackend::new());
    let graph = Graph::builder(backend)
        .config(GraphConfig::default().with_max_inline_value_size(16))
        .build()
        .unwrap();
    let auths = Authorizations::empty();
    graph
        .prepare_vertex_with_id("v1", Visibility::empty())
        .set_property("small", vec![1u8, 2, 3], Visibility::empty())
        .unwrap()
        .set_property("large", vec![7u8; 64], Visibility::empty())
        .unwrap()
        .save(&auths)
        .unwrap();

    let vertex = graph.vertex("v1", FetchHints::all(), &auths).unwrap().unwrap();
    assert_eq!(
        vertex.property_value("small").unwrap(),
        Some(PropertyValue::Bytes(vec![1, 2, 3]))
    );
    match vertex.property_value("large").unwrap() {
        Some(PropertyValue::Streaming(value)) => assert_eq!(value.read_to_vec().unwrap(), vec![7u8; 64]),
        other => panic!("expected the large value to be externalized, found {other:?}"),
    }
}

#[test]
fn test_open_streaming_values_in_bulk() {
    let graph = Graph::in_memory().unwrap();
    let auths = Authorizations::empty();
    let saved = graph
        .prepare_vertex_with_id("doc", Visibility::empty())
        .add_property_value("1", "page", StreamingPropertyValue::from_string("first"), Visibility::empty())
        .unwrap()
        .add_property_value("2", "page", StreamingPropertyValue::from_string("second"), Visibility::empty())
        .unwrap()
        .save(&auths)
        .unwrap();
    let pending = StreamingPropertyValue::from_bytes(b"unsaved".to_vec());

    let pages = saved.property_values("page").unwrap();
    let mut values: Vec<&StreamingPropertyValue> =
        pages.iter().filter_map(PropertyValue::as_streaming).collect();
    values.push(&pending);
    let mut contents = Vec::new();
    for mut stream in graph.open_streaming_values(&values).unwrap() {
        let mut text = String::new();
        stream.read_to_string(&mut text).unwrap();
        contents.push(text);
    }
    let (last, saved_pages) = contents.split_last().unwrap();
    assert_eq!(last, "unsaved");
    let mut saved_pages = saved_pages.to_vec();
    saved_pages.sort();
    assert_eq!(saved_pages, vec!["first".to_string(), "second".to_string()]);
}

#[test]
fn test_custom_sink_receives_payloads() {
    let sink = Arc::new(MapSink::default());
    let graph = Graph::builder(Arc::new(MemoryBackend::new()))
        .streaming_sink(sink.clone())
        .build()
        .unwrap();
    let auths = Authorizations::empty();
    let vertex: Element = graph
        .prepare_vertex_with_id("doc", Visibility::empty())
        .set_property("body", StreamingPropertyValue::from_string("payload"), Visibility::empty())
        .unwrap()
        .save(&auths)
        .unwrap()
        .into();
    assert_eq!(sink.payloads.lock().len(), 1);
    assert_eq!(text_of(&vertex, "body"), "payload");

    graph
        .prepare_mutation(&vertex)
        .unwrap()
        .delete_property("", "body", None)
        .unwrap()
        .save(&auths)
        .unwrap();
    assert!(sink.payloads.lock().is_empty());
}

#[test]
fn test_hard_delete_removes_payloads() {
    let backend = Arc::new(MemoryBackend::new());
    let graph = Graph::with_backend(backend.clone()).unwrap();
    let auths = Authorizations::empty();
    // Registers the "body" definition before the baseline is taken.
    graph
        .prepare_vertex_with_id("warmup", Visibility::empty())
        .set_property("body", StreamingPropertyValue::from_string("w"), Visibility::empty())
        .unwrap()
        .save(&auths)
        .unwrap();
    graph.delete_vertex("warmup", &auths).unwrap();
    let baseline = backend.len();

    graph
        .prepare_vertex_with_id("doc", Visibility::empty())
        .set_property("body", StreamingPropertyValue::from_string("x".repeat(4096)), Visibility::empty())
        .unwrap()
        .save(&auths)
        .unwrap();
    assert!(backend.len() > baseline);
    graph.delete_vertex("doc", &auths).unwrap();
    assert_eq!(backend.len(), baseline);
}
