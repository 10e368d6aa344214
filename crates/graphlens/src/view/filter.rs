//! Mode-specific visibility rules.
//!
//! [`filter_view`] is a pure function of the projection and a
//! [`FilterContext`]; calling it twice with equal inputs yields equal output.
//! A search query longer than two characters pre-empts the mode's own rules.

use std::collections::{HashMap, HashSet};

use super::{
    EdgeVisibility, FilteredGraph, GraphNode, NodeKind, NodeVisibility, ProjectedGraph,
    VisibleEdge, VisibleNode, ViewMode,
};
use crate::analysis::{EdgeImportance, ExecutionFlow, ImpactAnalysis, IMPACT_MAX_HOPS};
use crate::config::RiskThresholds;
use crate::types::HealthStatus;

/// Opacity of elements outside the current emphasis.
pub const DIMMED_OPACITY: f64 = 0.15;

/// Opacity of every element in impact mode when nothing is focused.
pub const UNFOCUSED_IMPACT_OPACITY: f64 = 0.4;

/// Opacity of low-risk nodes.
pub const LOW_RISK_OPACITY: f64 = 0.3;

/// Opacity of edges that do not connect two search matches.
pub const SEARCH_EDGE_OPACITY: f64 = 0.1;

/// Minimum query length (exclusive) for the search overlay.
pub const MIN_SEARCH_QUERY_LEN: usize = 2;

/// Glow for high-risk nodes.
pub const HIGH_RISK_GLOW: &str = "#f44336";

/// Glow for medium-risk nodes.
pub const MEDIUM_RISK_GLOW: &str = "#ff9800";

/// Inputs the filter needs beyond the projection itself.
#[derive(Debug, Clone, Copy)]
pub struct FilterContext<'a> {
    /// Active mode
    pub mode: ViewMode,
    /// Focused node id
    pub focused_node_id: Option<&'a str>,
    /// Search text
    pub search_query: Option<&'a str>,
    /// Risk thresholds from configuration
    pub risk_thresholds: RiskThresholds,
    /// Execution flows of the snapshot
    pub execution_flows: &'a [ExecutionFlow],
    /// Impact analysis of the focused node
    pub impact: Option<&'a ImpactAnalysis>,
}

impl<'a> FilterContext<'a> {
    /// Context for a mode with nothing focused, no flows and default thresholds.
    #[must_use]
    pub fn new(mode: ViewMode) -> Self {
        Self {
            mode,
            focused_node_id: None,
            search_query: None,
            risk_thresholds: RiskThresholds::default(),
            execution_flows: &[],
            impact: None,
        }
    }

    /// The search query, when it is long enough to apply.
    fn active_query(&self) -> Option<&'a str> {
        self.search_query
            .filter(|q| q.chars().count() > MIN_SEARCH_QUERY_LEN)
    }
}

/// Risk classification of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskLevel {
    /// Score > 0.6
    High,
    /// Score in (0.3, 0.6]
    Medium,
    /// Score <= 0.3
    Low,
}

impl RiskLevel {
    /// Classify a risk score.
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score > 0.6 {
            Self::High
        } else if score > 0.3 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

/// Risk score in `[0, 1]` for a node under the given thresholds.
#[must_use]
pub fn risk_score(node: &GraphNode, thresholds: &RiskThresholds) -> f64 {
    match &node.kind {
        NodeKind::Domain(container) | NodeKind::File(container) => match container.health.status {
            HealthStatus::Critical => 1.0,
            HealthStatus::Warning => 0.5,
            HealthStatus::Healthy => 0.1,
        },
        NodeKind::Symbol(symbol) => {
            let mut score = 0.0;
            if f64::from(symbol.complexity) > thresholds.complexity_threshold {
                score += 0.5;
            }
            if symbol
                .coupling
                .as_ref()
                .is_some_and(|c| c.normalized_score > thresholds.coupling_threshold)
            {
                score += 0.5;
            }
            f64::min(score, 1.0)
        }
    }
}

/// Apply the mode's visibility rules.
#[must_use]
pub fn filter_view(graph: &ProjectedGraph, context: &FilterContext<'_>) -> FilteredGraph {
    let (nodes, edges) = if let Some(query) = context.active_query() {
        filter_search(graph, query)
    } else {
        match context.mode {
            ViewMode::Architecture => filter_architecture(graph),
            ViewMode::Flow => filter_flow(graph, context.execution_flows),
            ViewMode::Risk => filter_risk(graph, &context.risk_thresholds),
            ViewMode::Impact => filter_impact(graph, context),
            // Search without a usable query and trace both pass through.
            ViewMode::Trace | ViewMode::Search => pass_through(graph),
        }
    };
    FilteredGraph {
        mode: context.mode,
        focused_node_id: context.focused_node_id.map(str::to_string),
        nodes,
        edges,
    }
}

type Filtered = (Vec<VisibleNode>, Vec<VisibleEdge>);

fn visible_node(node: &GraphNode, visibility: NodeVisibility) -> VisibleNode {
    VisibleNode {
        node: node.clone(),
        visibility,
    }
}

fn pass_through(graph: &ProjectedGraph) -> Filtered {
    let nodes = graph
        .nodes
        .iter()
        .map(|n| visible_node(n, NodeVisibility::default()))
        .collect();
    let edges = graph
        .edges
        .iter()
        .map(|e| VisibleEdge {
            edge: e.clone(),
            visibility: EdgeVisibility::default(),
        })
        .collect();
    (nodes, edges)
}

fn filter_architecture(graph: &ProjectedGraph) -> Filtered {
    let nodes: Vec<VisibleNode> = graph
        .nodes
        .iter()
        .filter(|n| n.is_container())
        .map(|n| visible_node(n, NodeVisibility::default()))
        .collect();
    let containers: HashSet<&str> = nodes.iter().map(|n| n.node.id.as_str()).collect();
    let edges = graph
        .edges
        .iter()
        .filter(|e| containers.contains(e.source.as_str()) && containers.contains(e.target.as_str()))
        .map(|e| VisibleEdge {
            edge: e.clone(),
            visibility: EdgeVisibility::default(),
        })
        .collect();
    (nodes, edges)
}

fn filter_flow(graph: &ProjectedGraph, flows: &[ExecutionFlow]) -> Filtered {
    let on_flow: HashSet<&str> = flows
        .iter()
        .flat_map(|flow| flow.path.iter().map(String::as_str))
        .collect();
    let importance = EdgeImportance::new(flows);

    let nodes = graph
        .nodes
        .iter()
        .map(|n| {
            let visibility = if on_flow.contains(n.id.as_str()) {
                NodeVisibility {
                    highlighted: true,
                    ..NodeVisibility::default()
                }
            } else {
                NodeVisibility::with_opacity(DIMMED_OPACITY)
            };
            visible_node(n, visibility)
        })
        .collect();

    let edges = graph
        .edges
        .iter()
        .map(|e| {
            let visibility =
                if on_flow.contains(e.source.as_str()) && on_flow.contains(e.target.as_str()) {
                    EdgeVisibility {
                        opacity: 1.0,
                        stroke_width: 2.0 * EdgeVisibility::BASE_STROKE
                            + importance.score(&e.source, &e.target),
                        label: None,
                    }
                } else {
                    EdgeVisibility::with_opacity(DIMMED_OPACITY)
                };
            VisibleEdge {
                edge: e.clone(),
                visibility,
            }
        })
        .collect();
    (nodes, edges)
}

fn filter_risk(graph: &ProjectedGraph, thresholds: &RiskThresholds) -> Filtered {
    let mut opacity_of: HashMap<&str, f64> = HashMap::new();
    let nodes = graph
        .nodes
        .iter()
        .map(|n| {
            let visibility = match RiskLevel::from_score(risk_score(n, thresholds)) {
                RiskLevel::High => NodeVisibility {
                    highlighted: true,
                    glow_color: Some(HIGH_RISK_GLOW.to_string()),
                    ..NodeVisibility::default()
                },
                RiskLevel::Medium => NodeVisibility {
                    highlighted: true,
                    glow_color: Some(MEDIUM_RISK_GLOW.to_string()),
                    ..NodeVisibility::default()
                },
                RiskLevel::Low => NodeVisibility::with_opacity(LOW_RISK_OPACITY),
            };
            opacity_of.insert(n.id.as_str(), visibility.opacity);
            visible_node(n, visibility)
        })
        .collect();

    // An edge is as visible as its dimmer endpoint.
    let edges = graph
        .edges
        .iter()
        .map(|e| {
            let endpoint = |id: &str| opacity_of.get(id).copied().unwrap_or(LOW_RISK_OPACITY);
            let opacity = endpoint(&e.source).min(endpoint(&e.target));
            VisibleEdge {
                edge: e.clone(),
                visibility: EdgeVisibility::with_opacity(opacity),
            }
        })
        .collect();
    (nodes, edges)
}

/// Border width for a node `depth` hops from the focal node.
fn impact_border(depth: Option<u32>) -> f64 {
    match depth {
        Some(d) if d <= IMPACT_MAX_HOPS => {
            NodeVisibility::BASE_BORDER + f64::from(IMPACT_MAX_HOPS + 1 - d)
        }
        _ => NodeVisibility::BASE_BORDER,
    }
}

fn filter_impact(graph: &ProjectedGraph, context: &FilterContext<'_>) -> Filtered {
    let Some(focal) = context.focused_node_id else {
        let nodes = graph
            .nodes
            .iter()
            .map(|n| visible_node(n, NodeVisibility::with_opacity(UNFOCUSED_IMPACT_OPACITY)))
            .collect();
        let edges = graph
            .edges
            .iter()
            .map(|e| VisibleEdge {
                edge: e.clone(),
                visibility: EdgeVisibility::with_opacity(UNFOCUSED_IMPACT_OPACITY),
            })
            .collect();
        return (nodes, edges);
    };

    let related = context
        .impact
        .filter(|impact| impact.focal == focal)
        .map(ImpactAnalysis::related_ids)
        .unwrap_or_default();
    let in_blast_radius = |id: &str| id == focal || related.contains(id);

    let nodes = graph
        .nodes
        .iter()
        .map(|n| {
            let visibility = if in_blast_radius(&n.id) {
                let depth = if n.id == focal {
                    Some(0)
                } else {
                    n.symbol().and_then(|s| s.impact_depth)
                };
                NodeVisibility {
                    opacity: 1.0,
                    highlighted: true,
                    glow_color: None,
                    border_width: impact_border(depth),
                }
            } else {
                NodeVisibility::with_opacity(DIMMED_OPACITY)
            };
            visible_node(n, visibility)
        })
        .collect();

    let edges = graph
        .edges
        .iter()
        .map(|e| {
            let label = if e.source == focal && related.contains(&e.target) {
                Some("downstream")
            } else if e.target == focal && related.contains(&e.source) {
                Some("upstream")
            } else {
                None
            };
            let visibility = if let Some(label) = label {
                EdgeVisibility {
                    opacity: 1.0,
                    stroke_width: 2.0 * EdgeVisibility::BASE_STROKE,
                    label: Some(label.to_string()),
                }
            } else if in_blast_radius(&e.source) && in_blast_radius(&e.target) {
                EdgeVisibility::default()
            } else {
                EdgeVisibility::with_opacity(DIMMED_OPACITY)
            };
            VisibleEdge {
                edge: e.clone(),
                visibility,
            }
        })
        .collect();
    (nodes, edges)
}

/// Case-insensitive match on label, file path or tags.
fn matches_query(node: &GraphNode, needle: &str) -> bool {
    let contains = |haystack: &str| haystack.to_lowercase().contains(needle);
    if contains(node.label()) {
        return true;
    }
    node.symbol()
        .is_some_and(|s| contains(&s.file_path) || s.tags.iter().any(|t| contains(t)))
}

fn filter_search(graph: &ProjectedGraph, query: &str) -> Filtered {
    let needle = query.to_lowercase();
    let mut matched: HashSet<&str> = HashSet::new();
    let nodes = graph
        .nodes
        .iter()
        .map(|n| {
            let visibility = if matches_query(n, &needle) {
                matched.insert(n.id.as_str());
                NodeVisibility {
                    highlighted: true,
                    border_width: 2.0 * NodeVisibility::BASE_BORDER,
                    ..NodeVisibility::default()
                }
            } else {
                NodeVisibility::with_opacity(DIMMED_OPACITY)
            };
            visible_node(n, visibility)
        })
        .collect();

    let edges = graph
        .edges
        .iter()
        .map(|e| {
            let opacity =
                if matched.contains(e.source.as_str()) && matched.contains(e.target.as_str()) {
                    1.0
                } else {
                    SEARCH_EDGE_OPACITY
                };
            VisibleEdge {
                edge: e.clone(),
                visibility: EdgeVisibility::with_opacity(opacity),
            }
        })
        .collect();
    (nodes, edges)
}

/// Drop repeated node ids and edge ids, keeping first occurrences in order.
#[must_use]
pub fn dedup_filtered(mut graph: FilteredGraph) -> FilteredGraph {
    let mut seen_nodes = HashSet::new();
    graph.nodes.retain(|n| seen_nodes.insert(n.node.id.clone()));
    let mut seen_edges = HashSet::new();
    graph.edges.retain(|e| seen_edges.insert(e.edge.id.clone()));
    graph
}
