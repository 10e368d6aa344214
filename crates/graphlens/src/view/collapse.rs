//! Collapse redirection: hidden descendants are represented by their
//! outermost collapsed ancestor.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use super::{GraphEdge, GraphNode, ProjectedGraph};

/// Maps a hidden node id to the visible collapsed container standing in for it.
///
/// Targets are always ancestors of their keys, so the map is acyclic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedirectionMap {
    targets: HashMap<String, String>,
}

impl RedirectionMap {
    /// Compute redirections for every node under a collapsed container.
    ///
    /// A symbol in a collapsed domain maps to the domain even when its file
    /// is collapsed too; otherwise a collapsed file wins.
    #[must_use]
    pub fn build(nodes: &[GraphNode], collapsed: &HashSet<String>) -> Self {
        let mut targets = HashMap::new();
        if collapsed.is_empty() {
            return Self { targets };
        }

        let parents: HashMap<&str, &str> = nodes
            .iter()
            .filter_map(|n| n.parent_id.as_deref().map(|p| (n.id.as_str(), p)))
            .collect();
        let collapsed_containers: HashSet<&str> = nodes
            .iter()
            .filter(|n| n.is_container() && collapsed.contains(&n.id))
            .map(|n| n.id.as_str())
            .collect();

        for node in nodes {
            // Walk to the root; the last collapsed ancestor seen is the outermost.
            let mut outermost = None;
            let mut seen = HashSet::from([node.id.as_str()]);
            let mut current = parents.get(node.id.as_str()).copied();
            while let Some(ancestor) = current {
                if !seen.insert(ancestor) {
                    break;
                }
                if collapsed_containers.contains(ancestor) {
                    outermost = Some(ancestor);
                }
                current = parents.get(ancestor).copied();
            }
            if let Some(target) = outermost {
                targets.insert(node.id.clone(), target.to_string());
            }
        }

        Self { targets }
    }

    /// Where `id` is drawn: its redirection target, or itself.
    #[must_use]
    pub fn resolve<'a>(&'a self, id: &'a str) -> &'a str {
        self.targets.get(id).map_or(id, String::as_str)
    }

    /// Whether `id` is hidden inside a collapsed container.
    #[must_use]
    pub fn is_hidden(&self, id: &str) -> bool {
        self.targets.contains_key(id)
    }

    /// Number of redirected nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Whether nothing is redirected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// Rewrite a projection around the collapsed containers.
///
/// Hidden nodes are removed; edge endpoints are substituted through the
/// redirection map, self-loops dropped and duplicates on
/// `(source, target, kind)` removed. Edges whose endpoints are not visible
/// afterwards are dropped as well.
#[must_use]
pub fn redirect_collapsed(graph: ProjectedGraph, collapsed: &HashSet<String>) -> ProjectedGraph {
    let redirects = RedirectionMap::build(&graph.nodes, collapsed);
    if redirects.is_empty() {
        return graph;
    }

    let nodes: Vec<GraphNode> = graph
        .nodes
        .into_iter()
        .filter(|n| !redirects.is_hidden(&n.id))
        .collect();
    let visible: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();

    let mut seen = HashSet::new();
    let mut edges = Vec::new();
    for edge in &graph.edges {
        let source = redirects.resolve(&edge.source);
        let target = redirects.resolve(&edge.target);
        if source == target || !visible.contains(source) || !visible.contains(target) {
            continue;
        }
        let rerouted = GraphEdge::new(source, target, edge.kind);
        if seen.insert(rerouted.id.clone()) {
            edges.push(rerouted);
        }
    }

    debug!(
        hidden = redirects.len(),
        edges_before = graph.edges.len(),
        edges_after = edges.len(),
        "Redirected collapsed containers"
    );
    ProjectedGraph { nodes, edges }
}
