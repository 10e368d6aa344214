//! Node placement for filtered views.
//!
//! Two algorithms are selected by mode:
//!
//! - [`hierarchical`]: containment-respecting layered layout behind the
//!   [`LayoutEngine`] seam (architecture, risk, impact, search)
//! - [`tree`]: BFS tree with a grid fallback (flow, trace)
//!
//! [`orchestrator`] debounces layout requests and publishes the latest
//! [`RenderGraph`].

pub mod hierarchical;
pub mod orchestrator;
pub mod tree;

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::view::{EdgeVisibility, FilteredGraph, GraphNode, NodeKind, NodeVisibility};

pub use hierarchical::{HierarchyRequest, LayeredEngine};
pub use orchestrator::{LayoutOrchestrator, LayoutUpdate};
pub use tree::tree_layout;

/// Absolute position of a node's top-left corner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Position {
    /// Horizontal coordinate
    pub x: f64,
    /// Vertical coordinate
    pub y: f64,
}

impl Position {
    /// Create a position.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Width and height of a node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Size {
    /// Width
    pub width: f64,
    /// Height
    pub height: f64,
}

impl Size {
    /// Create a size.
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Axis along which tree depth grows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayoutDirection {
    /// Depth grows downwards
    #[default]
    TopDown,
    /// Depth grows to the right
    LeftRight,
}

/// Minimum size of a node by kind.
#[must_use]
pub fn size_hint(node: &GraphNode) -> Size {
    match node.kind {
        NodeKind::Domain(_) => Size::new(240.0, 80.0),
        NodeKind::File(_) => Size::new(200.0, 60.0),
        NodeKind::Symbol(_) => Size::new(160.0, 40.0),
    }
}

/// Placement of one node.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NodeLayout {
    /// Top-left corner
    pub position: Position,
    /// Computed size
    pub size: Size,
}

/// Output of a layout algorithm, keyed by node id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutResult {
    /// Placement per node
    pub nodes: HashMap<String, NodeLayout>,
}

impl LayoutResult {
    /// Placement of a node, if it was laid out.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&NodeLayout> {
        self.nodes.get(id)
    }
}

/// External layered layout algorithm.
///
/// Implementations must keep every child within its parent's bounds and
/// separate disconnected components. Only node positions are produced; edge
/// routing is left to the engine's renderer.
#[async_trait]
pub trait LayoutEngine: Send + Sync {
    /// Lay out a containment hierarchy.
    ///
    /// # Errors
    ///
    /// Returns `Error::Layout` when the request cannot be laid out.
    async fn layout(&self, request: &HierarchyRequest) -> Result<LayoutResult>;
}

// ============================================================================
// Render output
// ============================================================================

/// A positioned node handed to the renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderNode {
    /// Node id
    pub id: String,
    /// `domain`, `file` or `symbol`
    pub kind: &'static str,
    /// Containment parent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    /// Top-left corner
    pub position: Position,
    /// Size
    pub size: Size,
    /// Visibility from the filter stage
    pub visibility: NodeVisibility,
}

/// An edge handed to the renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderEdge {
    /// `source->target:kind`
    pub id: String,
    /// Source node id
    pub source: String,
    /// Target node id
    pub target: String,
    /// Visibility from the filter stage
    pub visibility: EdgeVisibility,
}

/// The positioned graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderGraph {
    /// Positioned nodes, in filter order
    pub nodes: Vec<RenderNode>,
    /// Edges, in filter order
    pub edges: Vec<RenderEdge>,
}

impl RenderGraph {
    /// Combine a filtered graph with a layout result.
    ///
    /// Nodes the layout did not place keep the origin and their hinted size.
    #[must_use]
    pub fn from_layout(graph: &FilteredGraph, layout: &LayoutResult) -> Self {
        let nodes = graph
            .nodes
            .iter()
            .map(|visible| {
                let node = &visible.node;
                let placed = layout.get(&node.id).copied().unwrap_or(NodeLayout {
                    position: Position::default(),
                    size: size_hint(node),
                });
                RenderNode {
                    id: node.id.clone(),
                    kind: node.kind_name(),
                    parent_id: node.parent_id.clone(),
                    position: placed.position,
                    size: placed.size,
                    visibility: visible.visibility.clone(),
                }
            })
            .collect();
        let edges = graph
            .edges
            .iter()
            .map(|visible| RenderEdge {
                id: visible.edge.id.clone(),
                source: visible.edge.source.clone(),
                target: visible.edge.target.clone(),
                visibility: visible.visibility.clone(),
            })
            .collect();
        Self { nodes, edges }
    }

    /// The pre-layout graph: every node at the origin with its hinted size.
    #[must_use]
    pub fn unlaid(graph: &FilteredGraph) -> Self {
        Self::from_layout(graph, &LayoutResult::default())
    }

    /// Whether the graph has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Dispatch to the tree or hierarchical layout for the graph's mode.
///
/// A failing engine is logged and the pre-layout graph is returned.
pub async fn run_layout(
    engine: &dyn LayoutEngine,
    graph: &FilteredGraph,
    config: &crate::config::LayoutConfig,
) -> RenderGraph {
    if graph.is_empty() {
        return RenderGraph::default();
    }
    let layout = if graph.mode.uses_tree_layout() {
        Ok(tree_layout(graph, config))
    } else {
        engine.layout(&HierarchyRequest::from_graph(graph, config)).await
    };
    match layout {
        Ok(layout) => RenderGraph::from_layout(graph, &layout),
        Err(e) => {
            tracing::warn!(error = %e, mode = %graph.mode, "Layout failed, showing pre-layout positions");
            RenderGraph::unlaid(graph)
        }
    }
}
