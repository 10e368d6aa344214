//! BFS tree layout with a uniform grid fallback.
//!
//! The root is the focused node when it is visible, else the first node.
//! Nodes the BFS from the root does not reach start new trees in input
//! order. When the graph splits into many small components (more than half
//! the node count) a grid is used instead.

use std::collections::{HashMap, HashSet, VecDeque};

use petgraph::unionfind::UnionFind;
use tracing::debug;

use super::{size_hint, LayoutDirection, LayoutResult, NodeLayout, Position, Size};
use crate::config::LayoutConfig;
use crate::view::FilteredGraph;

#[allow(clippy::cast_precision_loss)]
fn coord(index: usize) -> f64 {
    index as f64
}

/// Lay out a filtered graph as a BFS tree, or as a grid when it is too
/// fragmented.
#[must_use]
pub fn tree_layout(graph: &FilteredGraph, config: &LayoutConfig) -> LayoutResult {
    let ids: Vec<&str> = graph.nodes.iter().map(|n| n.node.id.as_str()).collect();
    if ids.is_empty() {
        return LayoutResult::default();
    }
    let index: HashMap<&str, usize> = ids.iter().enumerate().map(|(i, id)| (*id, i)).collect();
    let sizes: Vec<Size> = graph.nodes.iter().map(|n| size_hint(&n.node)).collect();
    let cell = Size::new(
        sizes.iter().map(|s| s.width).fold(0.0, f64::max),
        sizes.iter().map(|s| s.height).fold(0.0, f64::max),
    );

    let mut outgoing: Vec<Vec<usize>> = vec![Vec::new(); ids.len()];
    let mut components = UnionFind::new(ids.len());
    for visible in &graph.edges {
        let (Some(&s), Some(&t)) = (
            index.get(visible.edge.source.as_str()),
            index.get(visible.edge.target.as_str()),
        ) else {
            continue;
        };
        outgoing[s].push(t);
        components.union(s, t);
    }
    let component_count = (0..ids.len())
        .map(|i| components.find(i))
        .collect::<HashSet<_>>()
        .len();

    if component_count * 2 > ids.len() {
        debug!(
            nodes = ids.len(),
            components = component_count,
            "Graph too fragmented for a tree, using grid layout"
        );
        return grid_layout(&ids, &sizes, cell, config);
    }

    let root = graph
        .focused_node_id
        .as_deref()
        .and_then(|id| index.get(id).copied())
        .unwrap_or(0);

    // Forest BFS: the root first, then every unreached node in input order.
    let mut depth_of: Vec<Option<usize>> = vec![None; ids.len()];
    let mut levels: Vec<Vec<usize>> = Vec::new();
    for start in std::iter::once(root).chain(0..ids.len()) {
        if depth_of[start].is_some() {
            continue;
        }
        depth_of[start] = Some(0);
        let mut queue = VecDeque::from([start]);
        while let Some(current) = queue.pop_front() {
            let depth = depth_of[current].unwrap_or(0);
            if levels.len() <= depth {
                levels.resize_with(depth + 1, Vec::new);
            }
            levels[depth].push(current);
            for &next in &outgoing[current] {
                if depth_of[next].is_none() {
                    depth_of[next] = Some(depth + 1);
                    queue.push_back(next);
                }
            }
        }
    }

    let step_breadth = |size: Size| match config.direction {
        LayoutDirection::TopDown => size.width + config.node_spacing,
        LayoutDirection::LeftRight => size.height + config.node_spacing,
    };
    let step_depth = |size: Size| match config.direction {
        LayoutDirection::TopDown => size.height + config.layer_spacing,
        LayoutDirection::LeftRight => size.width + config.layer_spacing,
    };

    let mut nodes = HashMap::with_capacity(ids.len());
    for (depth, level) in levels.iter().enumerate() {
        for (slot, &node) in level.iter().enumerate() {
            let along = coord(slot) * step_breadth(cell);
            let across = coord(depth) * step_depth(cell);
            let position = match config.direction {
                LayoutDirection::TopDown => Position::new(along, across),
                LayoutDirection::LeftRight => Position::new(across, along),
            };
            nodes.insert(
                ids[node].to_string(),
                NodeLayout {
                    position,
                    size: sizes[node],
                },
            );
        }
    }
    LayoutResult { nodes }
}

/// Uniform grid with `ceil(sqrt(n))` columns; cells never overlap.
fn grid_layout(ids: &[&str], sizes: &[Size], cell: Size, config: &LayoutConfig) -> LayoutResult {
    let mut columns = 1;
    while columns * columns < ids.len() {
        columns += 1;
    }
    let cell_width = cell.width + config.node_spacing;
    let cell_height = cell.height + config.node_spacing;

    let nodes = ids
        .iter()
        .zip(sizes)
        .enumerate()
        .map(|(i, (id, size))| {
            let position = Position::new(
                coord(i % columns) * cell_width,
                coord(i / columns) * cell_height,
            );
            (
                (*id).to_string(),
                NodeLayout {
                    position,
                    size: *size,
                },
            )
        })
        .collect();
    LayoutResult { nodes }
}
