//! Integration tests for bounded-hop path search

use crate::common::{chain, edge};
use authgraph::{Authorizations, FindPathOptions, Graph, Path, Visibility};
use parking_lot::Mutex;
use std::sync::Arc;

fn ids(paths: &[Path]) -> Vec<Vec<&str>> {
    let mut result: Vec<Vec<&str>> = paths
        .iter()
        .map(|p| p.vertex_ids().iter().map(String::as_str).collect())
        .collect();
    result.sort();
    result
}

#[test]
fn test_two_hop_chain() {
    let graph = Graph::in_memory().unwrap();
    let auths = Authorizations::empty();
    chain(&graph, &auths);

    let paths = graph.find_paths(&FindPathOptions::new("a", "c", 2), &auths).unwrap();
    assert_eq!(ids(&paths), vec![vec!["a", "b", "c"]]);
    assert_eq!(paths[0].to_string(), "a -> b -> c");

    let paths = graph.find_paths(&FindPathOptions::new("a", "c", 1), &auths).unwrap();
    assert!(paths.is_empty());
}

#[test]
fn test_direct_edge_is_a_path() {
    let graph = Graph::in_memory().unwrap();
    let auths = Authorizations::empty();
    chain(&graph, &auths);
    edge(&graph, "ac", "a", "c", "knows", &auths);

    let paths = graph.find_paths(&FindPathOptions::new("a", "c", 1), &auths).unwrap();
    assert_eq!(ids(&paths), vec![vec!["a", "c"]]);

    let paths = graph.find_paths(&FindPathOptions::new("a", "c", 2), &auths).unwrap();
    assert_eq!(ids(&paths), vec![vec!["a", "b", "c"], vec!["a", "c"]]);
}

#[test]
fn test_edges_are_followed_in_both_directions() {
    let graph = Graph::in_memory().unwrap();
    let auths = Authorizations::empty();
    chain(&graph, &auths);

    let paths = graph.find_paths(&FindPathOptions::new("c", "a", 3), &auths).unwrap();
    assert_eq!(ids(&paths), vec![vec!["c", "b", "a"]]);
}

#[test]
fn test_deeper_search_finds_every_simple_path() {
    let graph = Graph::in_memory().unwrap();
    let auths = Authorizations::empty();
    for id in ["a", "b", "c", "d"] {
        graph
            .prepare_vertex_with_id(id, Visibility::empty())
            .save(&auths)
            .unwrap();
    }
    edge(&graph, "ab", "a", "b", "next", &auths);
    edge(&graph, "bd", "b", "d", "next", &auths);
    edge(&graph, "ac", "a", "c", "next", &auths);
    edge(&graph, "cb", "c", "b", "next", &auths);

    let paths = graph.find_paths(&FindPathOptions::new("a", "d", 3), &auths).unwrap();
    assert_eq!(ids(&paths), vec![vec!["a", "b", "d"], vec!["a", "c", "b", "d"]]);
}

#[test]
fn test_get_any_path_stops_early() {
    let graph = Graph::in_memory().unwrap();
    let auths = Authorizations::empty();
    chain(&graph, &auths);
    graph
        .prepare_vertex_with_id("d", Visibility::empty())
        .save(&auths)
        .unwrap();
    edge(&graph, "ad", "a", "d", "knows", &auths);
    edge(&graph, "dc", "d", "c", "knows", &auths);

    let all = graph.find_paths(&FindPathOptions::new("a", "c", 2), &auths).unwrap();
    assert_eq!(all.len(), 2);
    for hops in [2, 3] {
        let options = FindPathOptions::new("a", "c", hops).get_any_path(true);
        assert_eq!(graph.find_paths(&options, &auths).unwrap().len(), 1);
    }
}

#[test]
fn test_label_filters() {
    let graph = Graph::in_memory().unwrap();
    let auths = Authorizations::empty();
    chain(&graph, &auths);
    graph
        .prepare_vertex_with_id("d", Visibility::empty())
        .save(&auths)
        .unwrap();
    edge(&graph, "ad", "a", "d", "likes", &auths);
    edge(&graph, "dc", "d", "c", "likes", &auths);

    let only_likes = FindPathOptions::new("a", "c", 3).labels(["likes"]);
    assert_eq!(
        ids(&graph.find_paths(&only_likes, &auths).unwrap()),
        vec![vec!["a", "d", "c"]]
    );

    let without_likes = FindPathOptions::new("a", "c", 2).excluded_labels(["likes"]);
    assert_eq!(
        ids(&graph.find_paths(&without_likes, &auths).unwrap()),
        vec![vec!["a", "b", "c"]]
    );

    // Exclusion wins over inclusion.
    let conflicting = FindPathOptions::new("a", "c", 3)
        .labels(["likes"])
        .excluded_labels(["likes"]);
    assert!(graph.find_paths(&conflicting, &auths).unwrap().is_empty());
}

#[test]
fn test_unreadable_vertices_are_not_traversed() {
    let graph = Graph::in_memory().unwrap();
    let writer = Authorizations::new(["secret"]);
    chain(&graph, &writer);
    let hidden_bridge = graph
        .prepare_vertex_with_id("x", Visibility::new("secret"))
        .save(&writer);
    assert!(hidden_bridge.is_ok());
    edge(&graph, "ax", "a", "x", "knows", &writer);
    edge(&graph, "xc", "x", "c", "knows", &writer);

    let reader = Authorizations::empty();
    for hops in [2, 3] {
        let paths = graph.find_paths(&FindPathOptions::new("a", "c", hops), &reader).unwrap();
        assert_eq!(ids(&paths), vec![vec!["a", "b", "c"]]);
    }
}

#[test]
fn test_progress_is_reported() {
    let graph = Graph::in_memory().unwrap();
    let auths = Authorizations::empty();
    chain(&graph, &auths);

    let reports = Arc::new(Mutex::new(Vec::new()));
    let sink = reports.clone();
    let options = FindPathOptions::new("a", "c", 3)
        .progress_callback(move |fraction, message: &str| sink.lock().push((fraction, message.to_string())));
    graph.find_paths(&options, &auths).unwrap();

    let reports = reports.lock();
    assert!(!reports.is_empty());
    assert_eq!(reports.last().map(|r| r.0), Some(1.0));
    assert!(reports.iter().all(|(fraction, _)| (0.0..=1.0).contains(fraction)));
}

#[test]
fn test_missing_source_yields_no_paths() {
    let graph = Graph::in_memory().unwrap();
    let auths = Authorizations::empty();
    chain(&graph, &auths);
    for hops in [2, 4] {
        let paths = graph.find_paths(&FindPathOptions::new("nope", "c", hops), &auths).unwrap();
        assert!(paths.is_empty());
    }
}
