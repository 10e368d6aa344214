//! End-to-end view pipeline over the current snapshot.
//!
//! ```text
//! snapshot ──► metrics, relationships, flows   (once per snapshot)
//!                    │
//! ViewParams ──► projection ──► collapse ──► filter ──► dedup ──► FilteredGraph
//! ```
//!
//! Everything downstream of the snapshot is recomputed on every
//! [`ViewPipeline::build_view`] call; nothing is persisted across reloads.

use tracing::{debug, info};

use crate::analysis::{
    analyze_impact, detect_execution_flows, ExecutionFlow, ImpactAnalysis, RelationshipDetector,
};
use crate::config::ViewConfig;
use crate::error::{Error, Result};
use crate::metrics::CouplingMetrics;
use crate::snapshot::{Snapshot, SnapshotHandle};
use crate::view::projection::ProjectionInputs;
use crate::view::{
    build_projection, dedup_filtered, filter_view, redirect_collapsed, FilterContext,
    FilteredGraph, ViewMode, ViewParams,
};
use crate::warning::IntegrityWarning;

/// Owns the current snapshot and everything derived from it.
#[derive(Debug)]
pub struct ViewPipeline {
    config: ViewConfig,
    handle: SnapshotHandle,
    metrics: CouplingMetrics,
    detector: RelationshipDetector,
    flows: Vec<ExecutionFlow>,
    warnings: Vec<IntegrityWarning>,
}

impl ViewPipeline {
    /// Create a pipeline holding an empty snapshot.
    #[must_use]
    pub fn new(config: ViewConfig) -> Self {
        let mut pipeline = Self {
            config,
            handle: SnapshotHandle::new(Snapshot::default(), 0),
            metrics: CouplingMetrics::default(),
            detector: RelationshipDetector::new(),
            flows: Vec::new(),
            warnings: Vec::new(),
        };
        pipeline.detector.ensure(&pipeline.handle);
        pipeline
    }

    /// Create a pipeline and install `snapshot` as its first snapshot.
    #[must_use]
    pub fn with_snapshot(config: ViewConfig, snapshot: Snapshot) -> Self {
        let mut pipeline = Self::new(config);
        pipeline.replace_snapshot(snapshot);
        pipeline
    }

    /// Install a new snapshot and recompute metrics, relationships and flows.
    ///
    /// Returns the new snapshot generation.
    pub fn replace_snapshot(&mut self, snapshot: Snapshot) -> u64 {
        let generation = self.handle.generation() + 1;
        self.handle = SnapshotHandle::new(snapshot, generation);
        self.detector.invalidate();
        self.detector.ensure(&self.handle);

        let snapshot = self.handle.snapshot();
        self.warnings = snapshot.integrity_warnings();
        self.metrics = CouplingMetrics::compute(
            &snapshot.symbols,
            &snapshot.edges,
            &self.config.coupling_colors,
        );
        self.flows = detect_execution_flows(&snapshot.symbols, &self.detector);

        info!(
            generation,
            symbols = snapshot.symbols.len(),
            edges = snapshot.edges.len(),
            flows = self.flows.len(),
            warnings = self.warnings.len(),
            "Installed snapshot"
        );
        generation
    }

    /// Configuration in use.
    #[must_use]
    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    /// Current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> &Snapshot {
        self.handle.snapshot()
    }

    /// Generation of the current snapshot (0 before the first replacement).
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.handle.generation()
    }

    /// Coupling metrics of the current snapshot.
    #[must_use]
    pub fn metrics(&self) -> &CouplingMetrics {
        &self.metrics
    }

    /// Execution flows of the current snapshot.
    #[must_use]
    pub fn flows(&self) -> &[ExecutionFlow] {
        &self.flows
    }

    /// Integrity warnings of the current snapshot.
    #[must_use]
    pub fn warnings(&self) -> &[IntegrityWarning] {
        &self.warnings
    }

    /// Relationship cache for the current snapshot.
    #[must_use]
    pub fn relationships(&self) -> &RelationshipDetector {
        &self.detector
    }

    /// Blast radius of a symbol.
    ///
    /// # Errors
    ///
    /// Returns `Error::NodeNotFound` when `node_id` is not a known symbol.
    pub fn impact(&self, node_id: &str) -> Result<ImpactAnalysis> {
        if !self.detector.contains_symbol(node_id) {
            return Err(Error::NodeNotFound(node_id.to_string()));
        }
        Ok(analyze_impact(&self.detector, node_id))
    }

    /// Run projection, collapse, filter and dedup for `params`.
    #[must_use]
    pub fn build_view(&self, params: &ViewParams) -> FilteredGraph {
        let impact = match (params.mode, params.focused_node_id.as_deref()) {
            (ViewMode::Impact, Some(focus)) => Some(analyze_impact(&self.detector, focus)),
            _ => None,
        };

        let inputs = ProjectionInputs {
            snapshot: self.handle.snapshot(),
            metrics: &self.metrics,
            flows: &self.flows,
            detector: &self.detector,
            impact: impact.as_ref(),
        };
        let projected = build_projection(&inputs, params);
        let redirected = redirect_collapsed(projected, &params.collapsed_nodes);

        let context = FilterContext {
            mode: params.mode,
            focused_node_id: params.focused_node_id.as_deref(),
            search_query: params.search_query.as_deref(),
            risk_thresholds: self.config.risk,
            execution_flows: &self.flows,
            impact: impact.as_ref(),
        };
        let filtered = dedup_filtered(filter_view(&redirected, &context));
        debug!(
            mode = %params.mode,
            nodes = filtered.nodes.len(),
            edges = filtered.edges.len(),
            "Built view"
        );
        filtered
    }
}
