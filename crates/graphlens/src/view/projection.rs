//! Mode-specific projection of a snapshot into view nodes and edges.
//!
//! | Mode | Nodes | Edges |
//! |------|-------|-------|
//! | architecture | containment tree to `max_depth` | symbol edges + edges lifted to the deepest projected container |
//! | risk / impact / search | containment tree to `max_depth` | symbol edges |
//! | flow | every symbol, flat | symbol edges |
//! | trace | focus + callers/callees within `max(1, max_depth)` hops, flat | edges among them |
//!
//! Edges whose endpoints are not projected (dangling references or symbols
//! cut by the depth cap) are dropped here.

use std::collections::{HashMap, HashSet};

use petgraph::Direction;
use tracing::debug;

use super::{
    ContainerPayload, GraphEdge, GraphNode, NodeKind, ProjectedGraph, SymbolPayload, ViewMode,
    ViewParams,
};
use crate::analysis::{ExecutionFlow, ImpactAnalysis, RelationshipDetector};
use crate::metrics::CouplingMetrics;
use crate::snapshot::Snapshot;
use crate::types::{domain_node_id, file_node_id, HealthMetrics, Symbol};

/// Everything a projection may draw on.
#[derive(Debug, Clone, Copy)]
pub struct ProjectionInputs<'a> {
    /// Current snapshot
    pub snapshot: &'a Snapshot,
    /// Coupling metrics of the snapshot
    pub metrics: &'a CouplingMetrics,
    /// Detected execution flows
    pub flows: &'a [ExecutionFlow],
    /// Relationship cache, already built for the snapshot
    pub detector: &'a RelationshipDetector,
    /// Impact analysis of the focused node, in impact mode
    pub impact: Option<&'a ImpactAnalysis>,
}

/// Build the projection for `params.mode`.
#[must_use]
pub fn build_projection(inputs: &ProjectionInputs<'_>, params: &ViewParams) -> ProjectedGraph {
    let projected = match params.mode {
        ViewMode::Flow => flat_projection(inputs, None),
        ViewMode::Trace => trace_projection(inputs, params),
        ViewMode::Architecture => containment_projection(inputs, params.containment_depth(), true),
        ViewMode::Risk | ViewMode::Impact | ViewMode::Search => {
            containment_projection(inputs, params.containment_depth(), false)
        }
    };
    debug!(
        mode = %params.mode,
        nodes = projected.nodes.len(),
        edges = projected.edges.len(),
        "Built projection"
    );
    projected
}

fn symbol_node(inputs: &ProjectionInputs<'_>, symbol: &Symbol, parent_id: Option<String>) -> GraphNode {
    let impact_depth = inputs.impact.and_then(|impact| {
        if impact.focal == symbol.id {
            Some(0)
        } else {
            impact.depth_of(&symbol.id)
        }
    });
    GraphNode {
        id: symbol.id.clone(),
        parent_id,
        kind: NodeKind::Symbol(SymbolPayload {
            name: symbol.name.clone(),
            file_path: symbol.file_path.clone(),
            symbol_kind: symbol.kind,
            complexity: symbol.complexity,
            coupling: inputs.metrics.get(&symbol.id).cloned(),
            tags: symbol.tags.clone(),
            impact_depth,
        }),
    }
}

/// Push a node, or replace an earlier node with the same id (last write wins).
fn upsert(nodes: &mut Vec<GraphNode>, positions: &mut HashMap<String, usize>, node: GraphNode) {
    if let Some(&index) = positions.get(&node.id) {
        nodes[index] = node;
    } else {
        positions.insert(node.id.clone(), nodes.len());
        nodes.push(node);
    }
}

/// Symbol edges whose endpoints are both in `present`, deduplicated by id.
fn resolved_symbol_edges(snapshot: &Snapshot, present: &HashSet<&str>) -> Vec<GraphEdge> {
    let mut seen = HashSet::new();
    let mut dropped = 0usize;
    let mut edges = Vec::new();
    for edge in &snapshot.edges {
        if !present.contains(edge.source.as_str()) || !present.contains(edge.target.as_str()) {
            dropped += 1;
            continue;
        }
        if seen.insert(edge.id()) {
            edges.push(GraphEdge::new(
                edge.source.as_str(),
                edge.target.as_str(),
                edge.kind,
            ));
        }
    }
    if dropped > 0 {
        debug!(dropped, "Dropped edges with unprojected endpoints");
    }
    edges
}

fn flat_projection(inputs: &ProjectionInputs<'_>, only: Option<&HashSet<String>>) -> ProjectedGraph {
    let mut nodes = Vec::new();
    let mut positions = HashMap::new();
    for symbol in &inputs.snapshot.symbols {
        if only.is_some_and(|keep| !keep.contains(&symbol.id)) {
            continue;
        }
        upsert(&mut nodes, &mut positions, symbol_node(inputs, symbol, None));
    }
    let present: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
    let edges = resolved_symbol_edges(inputs.snapshot, &present);
    ProjectedGraph { nodes, edges }
}

fn trace_projection(inputs: &ProjectionInputs<'_>, params: &ViewParams) -> ProjectedGraph {
    let root = params
        .focused_node_id
        .as_deref()
        .filter(|id| inputs.detector.contains_symbol(id))
        .or_else(|| {
            if params.focused_node_id.is_some() {
                None
            } else {
                inputs.flows.first().map(|flow| flow.entry_point.as_str())
            }
        });
    let Some(root) = root else {
        return ProjectedGraph::default();
    };

    let hops = u32::from(params.containment_depth().max(1));
    let mut keep: HashSet<String> = HashSet::from([root.to_string()]);
    for direction in [Direction::Incoming, Direction::Outgoing] {
        keep.extend(
            inputs
                .detector
                .traverse(root, direction, Some(hops))
                .into_iter()
                .map(|(id, _)| id),
        );
    }
    flat_projection(inputs, Some(&keep))
}

fn containment_projection(
    inputs: &ProjectionInputs<'_>,
    depth: u8,
    lift_edges: bool,
) -> ProjectedGraph {
    let snapshot = inputs.snapshot;
    let file_domains = snapshot.file_domains();
    let mut nodes = Vec::new();
    let mut positions = HashMap::new();

    let domain_health: HashMap<&str, &HealthMetrics> = snapshot
        .domains
        .iter()
        .map(|d| (d.name.as_str(), &d.health))
        .collect();
    let mut domain_names: Vec<&str> = snapshot.domains.iter().map(|d| d.name.as_str()).collect();
    domain_names.extend(snapshot.files.iter().filter_map(|f| file_domains.get(f.path.as_str()).copied()));
    domain_names.extend(snapshot.symbols.iter().filter_map(|s| s.domain.as_deref()));
    for name in domain_names {
        let id = domain_node_id(name);
        if positions.contains_key(&id) && !domain_health.contains_key(name) {
            continue;
        }
        let health = domain_health.get(name).map(|h| (*h).clone()).unwrap_or_default();
        upsert(
            &mut nodes,
            &mut positions,
            GraphNode {
                id,
                parent_id: None,
                kind: NodeKind::Domain(ContainerPayload {
                    label: name.to_string(),
                    health,
                }),
            },
        );
    }

    if depth >= 1 {
        let file_health: HashMap<&str, &HealthMetrics> = snapshot
            .files
            .iter()
            .map(|f| (f.path.as_str(), &f.health))
            .collect();
        let paths = snapshot
            .files
            .iter()
            .map(|f| f.path.as_str())
            .chain(snapshot.symbols.iter().map(|s| s.file_path.as_str()));
        for path in paths {
            let id = file_node_id(path);
            if positions.contains_key(&id) {
                continue;
            }
            upsert(
                &mut nodes,
                &mut positions,
                GraphNode {
                    id,
                    parent_id: file_domains.get(path).map(|d| domain_node_id(d)),
                    kind: NodeKind::File(ContainerPayload {
                        label: path.to_string(),
                        health: file_health.get(path).map(|h| (*h).clone()).unwrap_or_default(),
                    }),
                },
            );
        }
    }

    if depth >= 2 {
        for symbol in &snapshot.symbols {
            let node = symbol_node(inputs, symbol, Some(symbol.file_node_id()));
            upsert(&mut nodes, &mut positions, node);
        }
    }

    let present: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
    let mut edges = resolved_symbol_edges(snapshot, &present);

    if lift_edges {
        let known = snapshot.symbol_index();
        let lift = |symbol_id: &str| -> Option<String> {
            let symbol = known.get(symbol_id)?;
            if depth >= 1 {
                Some(symbol.file_node_id())
            } else {
                file_domains
                    .get(symbol.file_path.as_str())
                    .map(|d| domain_node_id(d))
            }
        };
        let mut seen: HashSet<String> = edges.iter().map(|e| e.id.clone()).collect();
        for edge in &snapshot.edges {
            let (Some(source), Some(target)) = (lift(&edge.source), lift(&edge.target)) else {
                continue;
            };
            if source == target {
                continue;
            }
            let lifted = GraphEdge::new(source, target, edge.kind);
            if seen.insert(lifted.id.clone()) {
                edges.push(lifted);
            }
        }
    }

    ProjectedGraph { nodes, edges }
}
