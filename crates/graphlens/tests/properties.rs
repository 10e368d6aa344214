//! Behavioral guarantees of the analytic stages, checked through the public API.
//!
//! - degree/CBO relationship of coupling metrics (property-based)
//! - flow detection for a handler reaching a database sink
//! - termination of related-node queries on cyclic graphs
//! - purity of the view filter
//! - non-overlapping grid fallback for disconnected singletons

use std::collections::BTreeSet;

use graphlens::config::CouplingColors;
use graphlens::layout::{tree_layout, NodeLayout};
use graphlens::view::{filter_view, FilterContext};
use graphlens::{
    detect_execution_flows, CouplingMetrics, Edge, EdgeKind, FlowCategory, LayoutConfig,
    RelationshipDetector, Snapshot, SnapshotHandle, Symbol, ViewConfig, ViewMode, ViewParams,
    ViewPipeline,
};
use proptest::prelude::*;

fn detector_for(symbols: Vec<Symbol>, edges: Vec<Edge>) -> (SnapshotHandle, RelationshipDetector) {
    let handle = SnapshotHandle::new(
        Snapshot {
            symbols,
            edges,
            ..Snapshot::default()
        },
        1,
    );
    let mut detector = RelationshipDetector::new();
    detector.ensure(&handle);
    (handle, detector)
}

// =============================================================================
// Coupling metrics
// =============================================================================

proptest! {
    #[test]
    fn degree_bounds_cbo(
        count in 1usize..8,
        raw_edges in prop::collection::vec((0usize..8, 0usize..8), 0..24),
    ) {
        let symbols: Vec<Symbol> = (0..count)
            .map(|i| Symbol::new("src/lib.ts", &format!("f{i}"), u32::try_from(i).unwrap_or(0)))
            .collect();
        let edges: Vec<Edge> = raw_edges
            .iter()
            .filter(|(s, t)| *s < count && *t < count)
            .map(|(s, t)| Edge::new(&symbols[*s].id, &symbols[*t].id, EdgeKind::Call))
            .collect();

        let metrics = CouplingMetrics::compute(&symbols, &edges, &CouplingColors::default());
        for symbol in &symbols {
            let metric = metrics.get(&symbol.id).unwrap();
            prop_assert!(metric.in_degree + metric.out_degree >= metric.cbo);
            if metric.cbo == 0 {
                prop_assert!(metric.normalized_score.abs() < f64::EPSILON);
            }
            prop_assert!((0.0..=1.0).contains(&metric.normalized_score));
        }
    }
}

#[test]
fn single_call_edge_counts_both_ends() {
    let a = Symbol::new("file1", "f", 1);
    let b = Symbol::new("file1", "g", 2);
    let edges = vec![Edge::new(&a.id, &b.id, EdgeKind::Call)];
    let metrics = CouplingMetrics::compute(&[a.clone(), b.clone()], &edges, &CouplingColors::default());

    let ma = metrics.get("file1:f:1").unwrap();
    assert_eq!((ma.out_degree, ma.in_degree, ma.cbo), (1, 0, 1));
    let mb = metrics.get(&b.id).unwrap();
    assert_eq!((mb.out_degree, mb.in_degree, mb.cbo), (0, 1, 1));
}

// =============================================================================
// Flow detection
// =============================================================================

#[test]
fn handler_reaching_database_is_one_api_flow() {
    let handler = Symbol::new("/api/orders.ts", "handleRequest", 3);
    let query = Symbol::new("/db/queries.ts", "queryDatabase", 8);
    let (handle, detector) = detector_for(
        vec![handler.clone(), query.clone()],
        vec![Edge::new(&handler.id, &query.id, EdgeKind::Call)],
    );

    let flows = detect_execution_flows(&handle.snapshot().symbols, &detector);

    assert_eq!(flows.len(), 1);
    assert_eq!(flows[0].entry_point, handler.id);
    assert!(flows[0].sinks.contains(&query.id));
    assert_eq!(flows[0].category, FlowCategory::Api);
}

// =============================================================================
// Relationships
// =============================================================================

#[test]
fn mutual_recursion_related_nodes_terminate() {
    let a = Symbol::new("m.ts", "a", 1);
    let b = Symbol::new("m.ts", "b", 2);
    let (_handle, detector) = detector_for(
        vec![a.clone(), b.clone()],
        vec![
            Edge::new(&a.id, &b.id, EdgeKind::Call),
            Edge::new(&b.id, &a.id, EdgeKind::Call),
        ],
    );

    let related = detector.related_nodes(&a.id, 2);

    assert_eq!(related.callees, BTreeSet::from([b.id.clone()]));
    assert_eq!(related.callers, BTreeSet::from([b.id.clone()]));
}

// =============================================================================
// Filter purity
// =============================================================================

fn mixed_snapshot() -> Snapshot {
    let handler = Symbol::new("src/api/orders.ts", "handleRequest", 1)
        .in_domain("orders")
        .with_complexity(15);
    let service = Symbol::new("src/core/service.ts", "placeOrder", 4).in_domain("core");
    let store = Symbol::new("src/db/store.ts", "saveOrder", 9).in_domain("data");
    Snapshot {
        edges: vec![
            Edge::new(&handler.id, &service.id, EdgeKind::Call),
            Edge::new(&service.id, &store.id, EdgeKind::Call),
            Edge::new(&store.id, &service.id, EdgeKind::Import),
        ],
        symbols: vec![handler, service, store],
        ..Snapshot::default()
    }
}

#[test]
fn filtering_twice_yields_identical_output() {
    let pipeline = ViewPipeline::with_snapshot(ViewConfig::default(), mixed_snapshot());
    for mode in ViewMode::ALL {
        let params = ViewParams {
            focused_node_id: Some("src/core/service.ts:placeOrder:4".to_string()),
            search_query: (mode == ViewMode::Search).then(|| "order".to_string()),
            ..ViewParams::for_mode(mode)
        };
        assert_eq!(pipeline.build_view(&params), pipeline.build_view(&params), "{mode}");
    }
}

#[test]
fn filter_is_pure_over_the_same_projection() {
    let pipeline = ViewPipeline::with_snapshot(ViewConfig::default(), mixed_snapshot());
    let view = pipeline.build_view(&ViewParams::for_mode(ViewMode::Trace));
    let projected = graphlens::view::ProjectedGraph {
        nodes: view.nodes.iter().map(|n| n.node.clone()).collect(),
        edges: view.edges.iter().map(|e| e.edge.clone()).collect(),
    };
    let context = FilterContext {
        execution_flows: pipeline.flows(),
        ..FilterContext::new(ViewMode::Flow)
    };

    assert_eq!(filter_view(&projected, &context), filter_view(&projected, &context));
}

// =============================================================================
// Layout
// =============================================================================

fn overlaps(a: &NodeLayout, b: &NodeLayout) -> bool {
    a.position.x < b.position.x + b.size.width
        && b.position.x < a.position.x + a.size.width
        && a.position.y < b.position.y + b.size.height
        && b.position.y < a.position.y + a.size.height
}

#[test]
fn disconnected_singletons_do_not_overlap() {
    let snapshot = Snapshot {
        symbols: vec![Symbol::new("a.ts", "alpha", 1), Symbol::new("b.ts", "beta", 1)],
        ..Snapshot::default()
    };
    let pipeline = ViewPipeline::with_snapshot(ViewConfig::default(), snapshot);
    let view = pipeline.build_view(&ViewParams::for_mode(ViewMode::Flow));
    assert_eq!(view.nodes.len(), 2);

    let layout = tree_layout(&view, &LayoutConfig::default());
    let alpha = layout.get("a.ts:alpha:1").unwrap();
    let beta = layout.get("b.ts:beta:1").unwrap();
    assert!(!overlaps(alpha, beta));
}
