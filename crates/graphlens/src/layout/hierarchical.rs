//! Containment-respecting layered layout.
//!
//! [`HierarchyRequest`] is the input handed to any [`LayoutEngine`];
//! [`LayeredEngine`] is the built-in implementation.
//!
//! # Algorithm
//!
//! Each container is laid out bottom-up:
//!
//! 1. Children are measured first (recursively), so a container is sized to
//!    hold them plus padding.
//! 2. Edges between descendants of different siblings are lifted to the
//!    siblings themselves.
//! 3. Siblings are split into weakly connected components, which are placed
//!    side by side.
//! 4. Within a component, siblings are layered by longest path over the SCC
//!    condensation (cycles share a layer), one row per layer.
//!
//! Edges are not routed here; the renderer draws them between the placed
//! nodes.

use std::collections::HashMap;

use async_trait::async_trait;
use petgraph::algo::{condensation, toposort};
use petgraph::graph::DiGraph;
use petgraph::unionfind::UnionFind;
use petgraph::Direction;
use tracing::debug;

use super::{size_hint, LayoutEngine, LayoutResult, NodeLayout, Position, Size};
use crate::config::LayoutConfig;
use crate::error::{Error, Result};
use crate::view::FilteredGraph;

/// Smallest container padding at any depth.
pub const MIN_CONTAINER_PADDING: f64 = 8.0;

/// Containment tree plus edges and spacing, ready for a layout engine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HierarchyRequest {
    /// Top-level node ids, in input order
    pub roots: Vec<String>,
    /// Children per container, in input order
    pub children: HashMap<String, Vec<String>>,
    /// Parent of every non-root node
    pub parents: HashMap<String, String>,
    /// Nesting depth (roots are 0)
    pub depths: HashMap<String, u32>,
    /// Minimum size per node
    pub sizes: HashMap<String, Size>,
    /// Visible edges as `(source, target)`
    pub edges: Vec<(String, String)>,
    /// Gap between siblings in a row
    pub node_spacing: f64,
    /// Gap between rows
    pub layer_spacing: f64,
    /// Container padding at depth zero
    pub container_padding: f64,
}

impl HierarchyRequest {
    /// Build the containment tree of a filtered graph.
    ///
    /// A node whose parent is not visible becomes a root.
    #[must_use]
    pub fn from_graph(graph: &FilteredGraph, config: &LayoutConfig) -> Self {
        let mut request = Self {
            node_spacing: config.node_spacing,
            layer_spacing: config.layer_spacing,
            container_padding: config.container_padding,
            ..Self::default()
        };

        for visible in &graph.nodes {
            let node = &visible.node;
            request.sizes.insert(node.id.clone(), size_hint(node));
        }
        for visible in &graph.nodes {
            let node = &visible.node;
            match node.parent_id.as_ref().filter(|p| request.sizes.contains_key(*p)) {
                Some(parent) => {
                    request.parents.insert(node.id.clone(), parent.clone());
                    request
                        .children
                        .entry(parent.clone())
                        .or_default()
                        .push(node.id.clone());
                }
                None => request.roots.push(node.id.clone()),
            }
        }

        let limit = graph.nodes.len();
        for id in request.sizes.keys() {
            let mut depth = 0u32;
            let mut current = id.as_str();
            while let Some(parent) = request.parents.get(current) {
                depth += 1;
                if depth as usize > limit {
                    break;
                }
                current = parent.as_str();
            }
            request.depths.insert(id.clone(), depth);
        }

        request.edges = graph
            .edges
            .iter()
            .map(|e| (e.edge.source.clone(), e.edge.target.clone()))
            .collect();
        request
    }

    /// Inner padding of a container: `padding / (depth + 1)`, at least
    /// [`MIN_CONTAINER_PADDING`].
    #[must_use]
    pub fn padding_for(&self, id: &str) -> f64 {
        let depth = self.depths.get(id).copied().unwrap_or(0);
        (self.container_padding / f64::from(depth + 1)).max(MIN_CONTAINER_PADDING)
    }

    fn size_of(&self, id: &str) -> Size {
        self.sizes.get(id).copied().unwrap_or_default()
    }

    /// The member of `members` that is `id` or one of its ancestors.
    fn representative(&self, id: &str, members: &HashMap<&str, usize>) -> Option<usize> {
        let mut current = id;
        for _ in 0..=self.sizes.len() {
            if let Some(&index) = members.get(current) {
                return Some(index);
            }
            current = self.parents.get(current).map(String::as_str)?;
        }
        None
    }
}

/// A laid-out subtree, positions relative to its own origin.
struct Arrangement {
    placed: Vec<(String, NodeLayout)>,
    size: Size,
}

impl Arrangement {
    fn offset(self, dx: f64, dy: f64) -> impl Iterator<Item = (String, NodeLayout)> {
        self.placed.into_iter().map(move |(id, mut layout)| {
            layout.position.x += dx;
            layout.position.y += dy;
            (id, layout)
        })
    }
}

/// Built-in layered layout engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct LayeredEngine;

impl LayeredEngine {
    /// Lay out a request synchronously.
    ///
    /// # Errors
    ///
    /// Returns `Error::Layout` when nodes exist but none of them is a root.
    pub fn layout_sync(&self, request: &HierarchyRequest) -> Result<LayoutResult> {
        if request.roots.is_empty() {
            if request.sizes.is_empty() {
                return Ok(LayoutResult::default());
            }
            return Err(Error::Layout(
                "containment hierarchy has no root nodes".to_string(),
            ));
        }

        let arrangement = Self::arrange(request, &request.roots);
        let nodes: HashMap<String, NodeLayout> = arrangement.placed.into_iter().collect();
        if nodes.len() < request.sizes.len() {
            debug!(
                placed = nodes.len(),
                total = request.sizes.len(),
                "Some nodes were unreachable from the containment roots"
            );
        }
        Ok(LayoutResult { nodes })
    }

    fn measure(request: &HierarchyRequest, id: &str) -> Arrangement {
        let hint = request.size_of(id);
        let Some(children) = request.children.get(id).filter(|c| !c.is_empty()) else {
            return Arrangement {
                placed: vec![(
                    id.to_string(),
                    NodeLayout {
                        position: Position::default(),
                        size: hint,
                    },
                )],
                size: hint,
            };
        };

        let inner = Self::arrange(request, children);
        let pad = request.padding_for(id);
        let size = Size::new(
            hint.width.max(inner.size.width + 2.0 * pad),
            hint.height.max(inner.size.height + 2.0 * pad),
        );
        let mut placed = vec![(
            id.to_string(),
            NodeLayout {
                position: Position::default(),
                size,
            },
        )];
        placed.extend(inner.offset(pad, pad));
        Arrangement { placed, size }
    }

    fn arrange(request: &HierarchyRequest, members: &[String]) -> Arrangement {
        let boxes: Vec<Arrangement> = members.iter().map(|id| Self::measure(request, id)).collect();
        let index: HashMap<&str, usize> = members
            .iter()
            .enumerate()
            .map(|(i, id)| (id.as_str(), i))
            .collect();

        let sibling_edges: Vec<(usize, usize)> = request
            .edges
            .iter()
            .filter_map(|(source, target)| {
                let s = request.representative(source, &index)?;
                let t = request.representative(target, &index)?;
                (s != t).then_some((s, t))
            })
            .collect();

        let mut components = UnionFind::new(members.len());
        for &(s, t) in &sibling_edges {
            components.union(s, t);
        }
        let mut groups: Vec<(usize, Vec<usize>)> = Vec::new();
        for i in 0..members.len() {
            let root = components.find(i);
            match groups.iter_mut().find(|(r, _)| *r == root) {
                Some((_, group)) => group.push(i),
                None => groups.push((root, vec![i])),
            }
        }

        let mut boxes: Vec<Option<Arrangement>> = boxes.into_iter().map(Some).collect();
        let mut placed = Vec::new();
        let mut cursor_x = 0.0_f64;
        let mut height = 0.0_f64;

        for (_, group) in &groups {
            let rows = Self::layers(group, &sibling_edges);
            let mut y = 0.0_f64;
            let mut component_width = 0.0_f64;
            for row in rows {
                let mut x = 0.0_f64;
                let mut row_height = 0.0_f64;
                for member in row {
                    let Some(arrangement) = boxes[member].take() else {
                        continue;
                    };
                    let size = arrangement.size;
                    placed.extend(arrangement.offset(cursor_x + x, y));
                    x += size.width + request.node_spacing;
                    row_height = row_height.max(size.height);
                }
                component_width = component_width.max(x - request.node_spacing);
                y += row_height + request.layer_spacing;
            }
            height = height.max(y - request.layer_spacing);
            cursor_x += component_width + request.node_spacing;
        }

        let width = if groups.is_empty() {
            0.0
        } else {
            cursor_x - request.node_spacing
        };
        Arrangement {
            placed,
            size: Size::new(width.max(0.0), height.max(0.0)),
        }
    }

    /// Longest-path layers of one component, each layer in input order.
    fn layers(group: &[usize], edges: &[(usize, usize)]) -> Vec<Vec<usize>> {
        let local: HashMap<usize, usize> = group.iter().enumerate().map(|(l, &g)| (g, l)).collect();
        let mut graph: DiGraph<usize, ()> = DiGraph::new();
        let nodes: Vec<_> = group.iter().map(|&g| graph.add_node(g)).collect();
        for (s, t) in edges {
            if let (Some(&ls), Some(&lt)) = (local.get(s), local.get(t)) {
                graph.add_edge(nodes[ls], nodes[lt], ());
            }
        }

        let condensed = condensation(graph, true);
        let order = toposort(&condensed, None).unwrap_or_else(|_| condensed.node_indices().collect());
        let mut layer_of = vec![0usize; condensed.node_count()];
        for scc in order {
            let layer = condensed
                .neighbors_directed(scc, Direction::Incoming)
                .map(|pred| layer_of[pred.index()] + 1)
                .max()
                .unwrap_or(0);
            layer_of[scc.index()] = layer;
        }

        let mut rows: Vec<Vec<usize>> = Vec::new();
        for scc in condensed.node_indices() {
            let layer = layer_of[scc.index()];
            if rows.len() <= layer {
                rows.resize_with(layer + 1, Vec::new);
            }
            rows[layer].extend(condensed[scc].iter().copied());
        }
        for row in &mut rows {
            row.sort_unstable();
        }
        rows
    }
}

#[async_trait]
impl LayoutEngine for LayeredEngine {
    async fn layout(&self, request: &HierarchyRequest) -> Result<LayoutResult> {
        self.layout_sync(request)
    }
}
