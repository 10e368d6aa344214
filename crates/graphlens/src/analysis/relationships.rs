//! Adjacency cache and N-hop relationship queries.
//!
//! The detector owns a petgraph `DiGraph` built from the snapshot's edges plus
//! containment indexes (symbol → file → domain). It is the only state shared
//! across queries within one snapshot's lifetime.
//!
//! # Cache Keying
//!
//! The cache is keyed by [`SnapshotHandle::generation`]. [`ensure`] rebuilds
//! only when the generation differs from the one the cache was built for;
//! [`invalidate`] drops everything so the next `ensure` always rebuilds.
//!
//! # Edge Direction
//!
//! Edges point from caller to callee (source → target). Callers are found by
//! walking `Direction::Incoming`, callees by walking `Direction::Outgoing`.
//!
//! [`ensure`]: RelationshipDetector::ensure
//! [`invalidate`]: RelationshipDetector::invalidate

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use tracing::debug;

use crate::snapshot::SnapshotHandle;
use crate::types::{
    domain_node_id, file_node_id, EdgeKind, DOMAIN_ID_PREFIX, FILE_ID_PREFIX,
};

/// The five relationship sets around one node, plus hop distances.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelatedNodes {
    /// One level of containment up
    pub parents: BTreeSet<String>,
    /// One level of containment down
    pub children: BTreeSet<String>,
    /// Symbols reaching the node over incoming edges within the hop bound
    pub callers: BTreeSet<String>,
    /// Symbols reached from the node over outgoing edges within the hop bound
    pub callees: BTreeSet<String>,
    /// Other symbols declared in the node's file
    pub same_file: BTreeSet<String>,
    /// Minimum hop distance of every caller/callee
    pub depths: HashMap<String, u32>,
}

impl RelatedNodes {
    /// Union of all five sets.
    #[must_use]
    pub fn all(&self) -> BTreeSet<String> {
        self.parents
            .iter()
            .chain(&self.children)
            .chain(&self.callers)
            .chain(&self.callees)
            .chain(&self.same_file)
            .cloned()
            .collect()
    }

    /// Returns `true` when every set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
            && self.children.is_empty()
            && self.callers.is_empty()
            && self.callees.is_empty()
            && self.same_file.is_empty()
    }
}

/// Cached adjacency plus containment indexes for one snapshot generation.
#[derive(Debug, Default)]
pub struct RelationshipDetector {
    generation: Option<u64>,
    graph: DiGraph<String, EdgeKind>,
    node_map: HashMap<String, NodeIndex>,
    /// symbol id -> file path
    file_of: HashMap<String, String>,
    /// file path -> symbol ids in declaration order
    symbols_by_file: HashMap<String, Vec<String>>,
    /// file path -> domain name
    domain_of_file: HashMap<String, String>,
    /// domain name -> file paths
    files_by_domain: HashMap<String, Vec<String>>,
}

impl RelationshipDetector {
    /// Create an empty detector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Generation the cache was built for, if any.
    #[must_use]
    pub fn generation(&self) -> Option<u64> {
        self.generation
    }

    /// Drop the cache wholesale.
    pub fn invalidate(&mut self) {
        *self = Self::default();
    }

    /// Rebuild the cache if it was built for a different generation.
    ///
    /// Returns `true` when a rebuild happened.
    pub fn ensure(&mut self, handle: &SnapshotHandle) -> bool {
        if self.generation == Some(handle.generation()) {
            return false;
        }
        self.rebuild(handle);
        true
    }

    fn rebuild(&mut self, handle: &SnapshotHandle) {
        let snapshot = handle.snapshot();
        let mut graph = DiGraph::new();
        let mut node_map = HashMap::new();
        let mut file_of = HashMap::new();
        let mut first_seen = Vec::new();

        // duplicate ids: last write wins for the file mapping
        for symbol in &snapshot.symbols {
            file_of.insert(symbol.id.clone(), symbol.file_path.clone());
            if node_map.contains_key(&symbol.id) {
                continue;
            }
            let index = graph.add_node(symbol.id.clone());
            node_map.insert(symbol.id.clone(), index);
            first_seen.push(symbol.id.clone());
        }

        let mut symbols_by_file: HashMap<String, Vec<String>> = HashMap::new();
        for id in first_seen {
            if let Some(path) = file_of.get(&id) {
                symbols_by_file.entry(path.clone()).or_default().push(id);
            }
        }

        let mut dangling = 0usize;
        for edge in &snapshot.edges {
            match (node_map.get(&edge.source), node_map.get(&edge.target)) {
                (Some(&from), Some(&to)) => {
                    graph.add_edge(from, to, edge.kind);
                }
                _ => dangling += 1,
            }
        }

        let mut domain_of_file = HashMap::new();
        let mut files_by_domain: HashMap<String, Vec<String>> = HashMap::new();
        for (path, domain) in snapshot.file_domains() {
            domain_of_file.insert(path.to_string(), domain.to_string());
            files_by_domain
                .entry(domain.to_string())
                .or_default()
                .push(path.to_string());
        }
        for files in files_by_domain.values_mut() {
            files.sort();
        }

        debug!(
            generation = handle.generation(),
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            dangling,
            "Rebuilt relationship cache"
        );

        *self = Self {
            generation: Some(handle.generation()),
            graph,
            node_map,
            file_of,
            symbols_by_file,
            domain_of_file,
            files_by_domain,
        };
    }

    /// Whether the id names a symbol in the cached snapshot.
    #[must_use]
    pub fn contains_symbol(&self, id: &str) -> bool {
        self.node_map.contains_key(id)
    }

    /// File path of a symbol.
    #[must_use]
    pub fn file_of(&self, symbol_id: &str) -> Option<&str> {
        self.file_of.get(symbol_id).map(String::as_str)
    }

    /// Domain name of a symbol (via its file).
    #[must_use]
    pub fn domain_of(&self, symbol_id: &str) -> Option<&str> {
        self.file_of(symbol_id)
            .and_then(|path| self.domain_of_file.get(path))
            .map(String::as_str)
    }

    /// Direct neighbors in edge insertion order.
    ///
    /// petgraph yields neighbors most-recent-first; the order is reversed so
    /// traversals discover nodes in the order the indexer emitted edges.
    fn neighbors_in_order(&self, index: NodeIndex, direction: Direction) -> Vec<NodeIndex> {
        let mut neighbors: Vec<NodeIndex> =
            self.graph.neighbors_directed(index, direction).collect();
        neighbors.reverse();
        neighbors
    }

    /// Breadth-first walk from `start`.
    ///
    /// Returns every reached node (excluding `start`) with its hop distance,
    /// in discovery order. Each node is enqueued at most once, so cyclic call
    /// graphs terminate.
    #[must_use]
    pub fn traverse(
        &self,
        start: &str,
        direction: Direction,
        max_hops: Option<u32>,
    ) -> Vec<(String, u32)> {
        let Some(&start_node) = self.node_map.get(start) else {
            return Vec::new();
        };

        let mut reached = Vec::new();
        let mut visited = HashSet::from([start_node]);
        let mut queue = VecDeque::from([(start_node, 0u32)]);

        while let Some((current, depth)) = queue.pop_front() {
            if max_hops.is_some_and(|max| depth >= max) {
                continue;
            }
            for next in self.neighbors_in_order(current, direction) {
                if visited.insert(next) {
                    reached.push((self.graph[next].clone(), depth + 1));
                    queue.push_back((next, depth + 1));
                }
            }
        }

        reached
    }

    /// N-hop relationship query around a symbol or container node.
    ///
    /// Unknown ids yield empty sets.
    #[must_use]
    pub fn related_nodes(&self, node_id: &str, max_hops: u32) -> RelatedNodes {
        let mut related = RelatedNodes::default();

        if let Some(name) = node_id.strip_prefix(DOMAIN_ID_PREFIX) {
            if let Some(files) = self.files_by_domain.get(name) {
                related.children = files.iter().map(|p| file_node_id(p)).collect();
            }
            return related;
        }

        if let Some(path) = node_id.strip_prefix(FILE_ID_PREFIX) {
            if let Some(domain) = self.domain_of_file.get(path) {
                related.parents.insert(domain_node_id(domain));
            }
            if let Some(symbols) = self.symbols_by_file.get(path) {
                related.children = symbols.iter().cloned().collect();
            }
            return related;
        }

        let Some(path) = self.file_of(node_id) else {
            return related;
        };
        related.parents.insert(file_node_id(path));
        if let Some(symbols) = self.symbols_by_file.get(path) {
            related.same_file = symbols
                .iter()
                .filter(|id| id.as_str() != node_id)
                .cloned()
                .collect();
        }

        for (id, depth) in self.traverse(node_id, Direction::Incoming, Some(max_hops)) {
            related.depths.insert(id.clone(), depth);
            related.callers.insert(id);
        }
        for (id, depth) in self.traverse(node_id, Direction::Outgoing, Some(max_hops)) {
            let entry = related.depths.entry(id.clone()).or_insert(depth);
            *entry = (*entry).min(depth);
            related.callees.insert(id);
        }

        related
    }
}
