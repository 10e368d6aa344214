//! View projection: modes, projected nodes/edges and visibility annotations.
//!
//! A view is built in stages, each a pure function of its inputs:
//!
//! 1. [`projection`]: mode-specific set of nodes and edges
//! 2. [`collapse`]: reroute edges around collapsed containers
//! 3. [`filter`]: visibility/opacity/highlight per element, then dedup
//!
//! The result, a [`FilteredGraph`], is what the layout orchestrator consumes.

pub mod collapse;
pub mod filter;
pub mod projection;

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::metrics::CouplingMetric;
use crate::types::{EdgeKind, HealthMetrics, SymbolKind};

pub use collapse::{redirect_collapsed, RedirectionMap};
pub use filter::{dedup_filtered, filter_view, FilterContext};
pub use projection::build_projection;

/// Deepest containment level: domains (0), files (1), symbols (2).
pub const MAX_CONTAINMENT_DEPTH: u8 = 2;

/// One of the mutually exclusive analytical lenses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    /// Containers and their dependencies
    #[default]
    Architecture,
    /// Execution flows highlighted over all symbols
    Flow,
    /// Health/complexity/coupling risk
    Risk,
    /// Blast radius of the focused node
    Impact,
    /// Micro view around one symbol
    Trace,
    /// Search overlay
    Search,
}

impl ViewMode {
    /// All modes, in display order.
    pub const ALL: [Self; 6] = [
        Self::Architecture,
        Self::Flow,
        Self::Risk,
        Self::Impact,
        Self::Trace,
        Self::Search,
    ];

    /// Lowercase name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Architecture => "architecture",
            Self::Flow => "flow",
            Self::Risk => "risk",
            Self::Impact => "impact",
            Self::Trace => "trace",
            Self::Search => "search",
        }
    }

    /// Whether the mode is laid out as a BFS tree instead of containment.
    #[must_use]
    pub fn uses_tree_layout(&self) -> bool {
        matches!(self, Self::Flow | Self::Trace)
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ViewMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown view mode: {s}"))
    }
}

/// The parameter bundle supplied on every mode change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewParams {
    /// Active mode
    pub mode: ViewMode,
    /// Node the user focused, if any
    pub focused_node_id: Option<String>,
    /// Search text; the search branch applies when longer than two characters
    pub search_query: Option<String>,
    /// Containers currently collapsed
    pub collapsed_nodes: HashSet<String>,
    /// Containment depth cap (0..=2); `None` means full depth
    pub max_depth: Option<u8>,
}

impl ViewParams {
    /// Parameters for a mode with nothing focused.
    #[must_use]
    pub fn for_mode(mode: ViewMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Effective containment depth, clamped to [`MAX_CONTAINMENT_DEPTH`].
    #[must_use]
    pub fn containment_depth(&self) -> u8 {
        self.max_depth
            .unwrap_or(MAX_CONTAINMENT_DEPTH)
            .min(MAX_CONTAINMENT_DEPTH)
    }
}

// ============================================================================
// Projected graph
// ============================================================================

/// Payload of a domain or file container.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerPayload {
    /// Domain name or file path
    pub label: String,
    /// Upstream health
    pub health: HealthMetrics,
}

/// Payload of a symbol node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolPayload {
    /// Display name
    pub name: String,
    /// Containing file
    pub file_path: String,
    /// Symbol kind
    pub symbol_kind: SymbolKind,
    /// Cyclomatic complexity
    pub complexity: u32,
    /// Coupling metric for the symbol
    pub coupling: Option<CouplingMetric>,
    /// Tags
    pub tags: Vec<String>,
    /// Hop distance from the focal node in impact mode
    pub impact_depth: Option<u32>,
}

/// What a projected node represents.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum NodeKind {
    /// Domain container
    Domain(ContainerPayload),
    /// File container
    File(ContainerPayload),
    /// Code symbol
    Symbol(SymbolPayload),
}

/// A node in a projected view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    /// Node id
    pub id: String,
    /// Containment parent
    pub parent_id: Option<String>,
    /// Kind and payload
    pub kind: NodeKind,
}

impl GraphNode {
    /// Whether the node is a domain or file container.
    #[must_use]
    pub fn is_container(&self) -> bool {
        !matches!(self.kind, NodeKind::Symbol(_))
    }

    /// Kind name as used in render output.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            NodeKind::Domain(_) => "domain",
            NodeKind::File(_) => "file",
            NodeKind::Symbol(_) => "symbol",
        }
    }

    /// Display label: domain name, file path or symbol name.
    #[must_use]
    pub fn label(&self) -> &str {
        match &self.kind {
            NodeKind::Domain(c) | NodeKind::File(c) => &c.label,
            NodeKind::Symbol(s) => &s.name,
        }
    }

    /// Symbol payload, if this is a symbol.
    #[must_use]
    pub fn symbol(&self) -> Option<&SymbolPayload> {
        match &self.kind {
            NodeKind::Symbol(payload) => Some(payload),
            _ => None,
        }
    }
}

/// An edge in a projected view.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct GraphEdge {
    /// `source->target:kind`
    pub id: String,
    /// Source node id
    pub source: String,
    /// Target node id
    pub target: String,
    /// Relationship kind
    pub kind: EdgeKind,
}

impl GraphEdge {
    /// Create an edge, deriving its id.
    #[must_use]
    pub fn new(source: impl Into<String>, target: impl Into<String>, kind: EdgeKind) -> Self {
        let source = source.into();
        let target = target.into();
        Self {
            id: crate::types::edge_id(&source, &target, kind),
            source,
            target,
            kind,
        }
    }
}

/// Nodes and edges of one mode-specific projection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectedGraph {
    /// Nodes, parents before children
    pub nodes: Vec<GraphNode>,
    /// Edges between projected nodes
    pub edges: Vec<GraphEdge>,
}

// ============================================================================
// Visibility annotations
// ============================================================================

/// Visibility state of a node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeVisibility {
    /// Opacity in `[0, 1]`
    pub opacity: f64,
    /// Whether the node is emphasized
    pub highlighted: bool,
    /// Glow color for risk emphasis
    #[serde(skip_serializing_if = "Option::is_none")]
    pub glow_color: Option<String>,
    /// Border width
    pub border_width: f64,
}

impl NodeVisibility {
    /// Default border width.
    pub const BASE_BORDER: f64 = 1.0;

    /// Plain node at the given opacity.
    #[must_use]
    pub fn with_opacity(opacity: f64) -> Self {
        Self {
            opacity,
            highlighted: false,
            glow_color: None,
            border_width: Self::BASE_BORDER,
        }
    }
}

impl Default for NodeVisibility {
    fn default() -> Self {
        Self::with_opacity(1.0)
    }
}

/// Visibility state of an edge.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeVisibility {
    /// Opacity in `[0, 1]`
    pub opacity: f64,
    /// Stroke width
    pub stroke_width: f64,
    /// Optional label (`upstream` / `downstream`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl EdgeVisibility {
    /// Default stroke width.
    pub const BASE_STROKE: f64 = 1.0;

    /// Plain edge at the given opacity.
    #[must_use]
    pub fn with_opacity(opacity: f64) -> Self {
        Self {
            opacity,
            stroke_width: Self::BASE_STROKE,
            label: None,
        }
    }
}

impl Default for EdgeVisibility {
    fn default() -> Self {
        Self::with_opacity(1.0)
    }
}

/// A node that survived filtering, with its annotation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisibleNode {
    /// The projected node
    pub node: GraphNode,
    /// Its visibility
    pub visibility: NodeVisibility,
}

/// An edge that survived filtering, with its annotation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisibleEdge {
    /// The projected edge
    pub edge: GraphEdge,
    /// Its visibility
    pub visibility: EdgeVisibility,
}

/// Output of the filter stage; input to layout.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilteredGraph {
    /// Mode the graph was filtered for
    pub mode: ViewMode,
    /// Focused node, used as the tree layout root
    pub focused_node_id: Option<String>,
    /// Visible nodes in projection order
    pub nodes: Vec<VisibleNode>,
    /// Visible edges
    pub edges: Vec<VisibleEdge>,
}

impl FilteredGraph {
    /// Whether there is nothing to lay out.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_mode_parses_case_insensitively() {
        assert_eq!("Flow".parse::<ViewMode>(), Ok(ViewMode::Flow));
        assert!("bogus".parse::<ViewMode>().is_err());
    }

    #[test]
    fn only_flow_and_trace_use_tree_layout() {
        let tree: Vec<ViewMode> = ViewMode::ALL
            .into_iter()
            .filter(ViewMode::uses_tree_layout)
            .collect();
        assert_eq!(tree, vec![ViewMode::Flow, ViewMode::Trace]);
    }

    #[test]
    fn containment_depth_is_clamped() {
        let mut params = ViewParams::for_mode(ViewMode::Architecture);
        assert_eq!(params.containment_depth(), 2);
        params.max_depth = Some(7);
        assert_eq!(params.containment_depth(), 2);
        params.max_depth = Some(0);
        assert_eq!(params.containment_depth(), 0);
    }
}
