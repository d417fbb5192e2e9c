//! Bounded-hop path search between two vertices.
//!
//! Edges are followed in both directions. Two hops are answered with a set
//! intersection of the endpoints' neighborhoods; every other depth uses a
//! depth-limited DFS whose seen set is unwound on backtrack, so a vertex can appear
//! on several branches.

use crate::engine::Graph;
use crate::error::Result;
use crate::model::{Direction, FetchHints, GraphElement, Vertex};
use crate::security::Authorizations;
use log::{debug, trace};
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::sync::Arc;

/// Receives `(fraction complete, message)` while paths are searched.
pub type ProgressCallback = Arc<dyn Fn(f64, &str) + Send + Sync>;

/// Parameters of [`Graph::find_paths`].
#[derive(Clone)]
pub struct FindPathOptions {
    source_vertex_id: String,
    destination_vertex_id: String,
    max_hops: usize,
    labels: BTreeSet<String>,
    excluded_labels: BTreeSet<String>,
    get_any_path: bool,
    progress_callback: Option<ProgressCallback>,
}

impl FindPathOptions {
    /// Search every path of at most `max_hops` edges.
    pub fn new(
        source_vertex_id: impl Into<String>,
        destination_vertex_id: impl Into<String>,
        max_hops: usize,
    ) -> Self {
        Self {
            source_vertex_id: source_vertex_id.into(),
            destination_vertex_id: destination_vertex_id.into(),
            max_hops,
            labels: BTreeSet::new(),
            excluded_labels: BTreeSet::new(),
            get_any_path: false,
            progress_callback: None,
        }
    }

    /// Only follow edges with one of these labels.
    pub fn labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels = labels.into_iter().map(Into::into).collect();
        self
    }

    /// Never follow edges with these labels, even when listed in [`Self::labels`].
    pub fn excluded_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_labels = labels.into_iter().map(Into::into).collect();
        self
    }

    /// Stop after the first path found.
    pub fn get_any_path(mut self, value: bool) -> Self {
        self.get_any_path = value;
        self
    }

    /// Report search progress.
    pub fn progress_callback(mut self, callback: impl Fn(f64, &str) + Send + Sync + 'static) -> Self {
        self.progress_callback = Some(Arc::new(callback));
        self
    }

    /// Source vertex id.
    pub fn source_vertex_id(&self) -> &str {
        &self.source_vertex_id
    }

    /// Destination vertex id.
    pub fn destination_vertex_id(&self) -> &str {
        &self.destination_vertex_id
    }

    /// Maximum number of edges in a path.
    pub fn max_hops(&self) -> usize {
        self.max_hops
    }

    fn follows(&self, label: &str) -> bool {
        !self.excluded_labels.contains(label)
            && (self.labels.is_empty() || self.labels.contains(label))
    }

    fn report(&self, fraction: f64, message: &str) {
        if let Some(callback) = &self.progress_callback {
            callback(fraction, message);
        }
    }
}

impl fmt::Debug for FindPathOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FindPathOptions")
            .field("source_vertex_id", &self.source_vertex_id)
            .field("destination_vertex_id", &self.destination_vertex_id)
            .field("max_hops", &self.max_hops)
            .field("labels", &self.labels)
            .field("excluded_labels", &self.excluded_labels)
            .field("get_any_path", &self.get_any_path)
            .field("progress_callback", &self.progress_callback.is_some())
            .finish()
    }
}

/// An ordered sequence of vertex ids from source to destination.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Path(Vec<String>);

impl Path {
    /// Vertex ids in traversal order.
    pub fn vertex_ids(&self) -> &[String] {
        &self.0
    }

    /// Number of vertices on the path.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the path has no vertices.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(" -> "))
    }
}

impl From<Vec<String>> for Path {
    fn from(value: Vec<String>) -> Self {
        Self(value)
    }
}

impl Graph {
    /// Find paths from the source to the destination vertex.
    ///
    /// # Errors
    ///
    /// Propagates storage and decoding errors from loading vertices.
    pub fn find_paths(
        &self,
        options: &FindPathOptions,
        authorizations: &Authorizations,
    ) -> Result<Vec<Path>> {
        debug!(
            "Finding paths {} -> {} within {} hops",
            options.source_vertex_id, options.destination_vertex_id, options.max_hops
        );
        let finder = PathFinder {
            graph: self,
            options,
            authorizations,
        };
        let mut paths = Vec::new();
        if options.max_hops == 2 {
            finder.two_hop_paths(&mut paths)?;
        } else if let Some(source) = finder.vertex(&options.source_vertex_id)? {
            let mut seen = HashSet::new();
            let mut current = Vec::new();
            finder.search(&source, options.max_hops, 0, &mut seen, &mut current, &mut paths)?;
        }
        options.report(1.0, "Paths found");
        debug!("Found {} paths", paths.len());
        Ok(paths)
    }
}

struct PathFinder<'a> {
    graph: &'a Graph,
    options: &'a FindPathOptions,
    authorizations: &'a Authorizations,
}

impl PathFinder<'_> {
    fn vertex(&self, vertex_id: &str) -> Result<Option<Vertex>> {
        self.graph
            .vertex(vertex_id, FetchHints::edge_refs(), self.authorizations)
    }

    /// Ids of vertices one followed edge away from `vertex`, in edge-ref order.
    fn neighbor_ids(&self, vertex: &Vertex) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        let mut added = HashSet::new();
        for info in vertex.edge_infos(Direction::Both, &[])? {
            if self.options.follows(info.label()) && added.insert(info.other_vertex_id()) {
                ids.push(info.other_vertex_id().to_string());
            }
        }
        Ok(ids)
    }

    fn search(
        &self,
        vertex: &Vertex,
        hops: usize,
        level: usize,
        seen: &mut HashSet<String>,
        current: &mut Vec<String>,
        paths: &mut Vec<Path>,
    ) -> Result<()> {
        if self.options.get_any_path && !paths.is_empty() {
            return Ok(());
        }
        seen.insert(vertex.id().to_string());
        current.push(vertex.id().to_string());
        if vertex.id() == self.options.destination_vertex_id {
            trace!("Found path {}", current.join(" -> "));
            paths.push(Path(current.clone()));
        } else if hops > 0 {
            let neighbors = self.neighbor_ids(vertex)?;
            let total = neighbors.len();
            for (index, neighbor_id) in neighbors.iter().enumerate() {
                if level == 0 {
                    self.options
                        .report(index as f64 / total as f64, "Searching nodes");
                }
                if seen.contains(neighbor_id) {
                    continue;
                }
                if let Some(neighbor) = self.vertex(neighbor_id)? {
                    self.search(&neighbor, hops - 1, level + 1, seen, current, paths)?;
                }
            }
        }
        current.pop();
        seen.remove(vertex.id());
        Ok(())
    }

    fn two_hop_paths(&self, paths: &mut Vec<Path>) -> Result<()> {
        let source_id = &self.options.source_vertex_id;
        let destination_id = &self.options.destination_vertex_id;
        let (Some(source), Some(destination)) =
            (self.vertex(source_id)?, self.vertex(destination_id)?)
        else {
            return Ok(());
        };
        self.options.report(0.1, "Finding source neighbors");
        let from_source = self.existing(self.neighbor_ids(&source)?)?;
        self.options.report(0.45, "Finding destination neighbors");
        let from_destination: HashSet<String> = self
            .existing(self.neighbor_ids(&destination)?)?
            .into_iter()
            .collect();

        if from_source.iter().any(|id| id == destination_id) {
            paths.push(Path(vec![source_id.clone(), destination_id.clone()]));
            if self.options.get_any_path {
                return Ok(());
            }
        }
        self.options.report(0.9, "Intersecting neighbors");
        for bridge in from_source {
            if from_destination.contains(&bridge) && bridge != *source_id && bridge != *destination_id {
                paths.push(Path(vec![source_id.clone(), bridge, destination_id.clone()]));
                if self.options.get_any_path {
                    break;
                }
            }
        }
        Ok(())
    }

    fn existing(&self, ids: Vec<String>) -> Result<Vec<String>> {
        let exists = self.graph.do_vertices_exist(&ids, self.authorizations)?;
        Ok(ids
            .into_iter()
            .filter(|id| exists.get(id).copied().unwrap_or(false))
            .collect())
    }
}
