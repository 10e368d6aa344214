//! # Graphlens: analytical views over code dependency graphs
//!
//! Graphlens takes a snapshot of a code graph (symbols, files, domains and
//! the edges between symbols) and turns it into positioned, styled views:
//!
//! - **Coupling metrics** per symbol (in/out degree, CBO, normalized score)
//! - **Execution flows** from entry points (handlers, `main`, listeners,
//!   routes) to sinks (database, network, I/O, responses)
//! - **Impact analysis**: the blast radius of changing a symbol
//! - **Collapse redirection** of edges around hidden containers
//! - **View modes** (architecture, flow, risk, impact, trace, search)
//!   applied as a pure visibility filter
//! - **Layout**: containment-respecting layered layout, or a BFS tree with a
//!   grid fallback, scheduled with debouncing
//!
//! ## Quick Start
//!
//! ```no_run
//! use graphlens::{Snapshot, ViewConfig, ViewMode, ViewParams, ViewPipeline};
//!
//! let json = std::fs::read_to_string("snapshot.json")?;
//! let snapshot = Snapshot::from_json_str(&json)?;
//! let pipeline = ViewPipeline::with_snapshot(ViewConfig::default(), snapshot);
//!
//! let view = pipeline.build_view(&ViewParams::for_mode(ViewMode::Flow));
//! println!("{} visible nodes", view.nodes.len());
//! # Ok::<(), graphlens::Error>(())
//! ```

pub mod analysis;
pub mod config;
pub mod error;
pub mod layout;
pub mod metrics;
pub mod pipeline;
pub mod snapshot;
pub mod types;
pub mod view;
pub mod warning;

pub use analysis::{
    analyze_impact, detect_execution_flows, ExecutionFlow, FlowCategory, ImpactAnalysis,
    ImpactStats, RelatedNodes, RelationshipDetector,
};
pub use config::{CouplingColors, LayoutConfig, RiskThresholds, ViewConfig};
pub use error::{Error, Result};
pub use layout::{
    LayeredEngine, LayoutDirection, LayoutEngine, LayoutOrchestrator, LayoutUpdate, RenderGraph,
};
pub use metrics::{CouplingMetric, CouplingMetrics};
pub use pipeline::ViewPipeline;
pub use snapshot::{Snapshot, SnapshotHandle};
pub use types::{DomainInfo, Edge, EdgeKind, FileInfo, HealthMetrics, HealthStatus, Symbol, SymbolKind};
pub use view::{FilteredGraph, GraphNode, NodeKind, ViewMode, ViewParams};
pub use warning::IntegrityWarning;
