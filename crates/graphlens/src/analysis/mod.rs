//! Graph analytics over a snapshot.
//!
//! - [`relationships`]: cached adjacency and N-hop related-node queries
//! - [`flows`]: entry point / sink classification and flow tracing
//! - [`impact`]: blast radius around a focal node
//!
//! Every traversal is an iterative BFS with an explicit visited set; call and
//! import graphs are not guaranteed to be acyclic.

pub mod flows;
pub mod impact;
pub mod relationships;

pub use flows::{detect_execution_flows, EdgeImportance, ExecutionFlow, FlowCategory};
pub use impact::{analyze_impact, ImpactAnalysis, ImpactStats, IMPACT_MAX_HOPS};
pub use relationships::{RelatedNodes, RelationshipDetector};
