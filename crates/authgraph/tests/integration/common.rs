//! Shared fixtures for integration tests.

use authgraph::{Authorizations, Graph, GraphEvent, MutationBuilder, Visibility};
use parking_lot::Mutex;
use std::sync::Arc;

/// Records every event a graph fires.
#[derive(Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<GraphEvent>>>);

impl EventLog {
    pub fn attach(graph: &Graph) -> Self {
        let log = Self::default();
        let sink = log.0.clone();
        graph.add_listener(Arc::new(move |event: &GraphEvent| sink.lock().push(event.clone())));
        log
    }

    pub fn take(&self) -> Vec<GraphEvent> {
        std::mem::take(&mut *self.0.lock())
    }
}

/// `a -knows-> b -knows-> c`, all with empty visibility.
pub fn chain(graph: &Graph, auths: &Authorizations) {
    for id in ["a", "b", "c"] {
        graph
            .prepare_vertex_with_id(id, Visibility::empty())
            .set_property("name", id, Visibility::empty())
            .unwrap()
            .save(auths)
            .unwrap();
    }
    edge(graph, "ab", "a", "b", "knows", auths);
    edge(graph, "bc", "b", "c", "knows", auths);
}

pub fn edge(graph: &Graph, id: &str, out: &str, into: &str, label: &str, auths: &Authorizations) {
    graph
        .prepare_edge_with_id(id, out, into, label, Visibility::empty())
        .save(auths)
        .unwrap();
}
