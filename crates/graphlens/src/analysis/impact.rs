//! Change-impact (blast radius) analysis around a focal node.

use std::collections::BTreeSet;

use serde::Serialize;

use super::relationships::{RelatedNodes, RelationshipDetector};

/// Hop bound used for impact queries.
pub const IMPACT_MAX_HOPS: u32 = 2;

/// Blast-radius summary for one focal node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactStats {
    /// Distinct symbols upstream or downstream of the focal node
    pub affected_functions: usize,
    /// Files containing the focal node or an affected symbol
    pub affected_files: usize,
    /// Domains containing the focal node or an affected symbol
    pub affected_domains: usize,
    /// Callers within the hop bound
    pub upstream: Vec<String>,
    /// Callees within the hop bound
    pub downstream: Vec<String>,
}

/// Impact statistics plus the relationship sets they were derived from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImpactAnalysis {
    /// The focal node id
    pub focal: String,
    /// Relationship sets at [`IMPACT_MAX_HOPS`]
    pub related: RelatedNodes,
    /// Aggregate counts
    pub stats: ImpactStats,
}

impl ImpactAnalysis {
    /// Every node id the focal node is related to (excluding itself).
    #[must_use]
    pub fn related_ids(&self) -> BTreeSet<String> {
        let mut ids = self.related.all();
        ids.remove(&self.focal);
        ids
    }

    /// Hop distance of a related node, when it was reached by traversal.
    #[must_use]
    pub fn depth_of(&self, id: &str) -> Option<u32> {
        self.related.depths.get(id).copied()
    }
}

/// Analyze the blast radius of changing `focal`.
///
/// Unknown ids produce an empty analysis.
#[must_use]
pub fn analyze_impact(detector: &RelationshipDetector, focal: &str) -> ImpactAnalysis {
    let related = detector.related_nodes(focal, IMPACT_MAX_HOPS);

    let affected: BTreeSet<&str> = related
        .callers
        .iter()
        .chain(&related.callees)
        .map(String::as_str)
        .filter(|id| *id != focal)
        .collect();

    let mut files = BTreeSet::new();
    let mut domains = BTreeSet::new();
    for id in affected.iter().copied().chain(std::iter::once(focal)) {
        if let Some(file) = detector.file_of(id) {
            files.insert(file);
        }
        if let Some(domain) = detector.domain_of(id) {
            domains.insert(domain);
        }
    }

    let stats = ImpactStats {
        affected_functions: affected.len(),
        affected_files: files.len(),
        affected_domains: domains.len(),
        upstream: related.callers.iter().cloned().collect(),
        downstream: related.callees.iter().cloned().collect(),
    };

    ImpactAnalysis {
        focal: focal.to_string(),
        related,
        stats,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{Snapshot, SnapshotHandle};
    use crate::types::{Edge, EdgeKind, Symbol};

    /// ```text
    /// route (api/a.ts, web) -> service (svc/b.ts, core) -> repo (db/c.ts, data) -> driver (db/d.ts, data)
    /// ```
    fn chain() -> (Vec<Symbol>, RelationshipDetector) {
        let symbols = vec![
            Symbol::new("api/a.ts", "route", 1).in_domain("web"),
            Symbol::new("svc/b.ts", "service", 1).in_domain("core"),
            Symbol::new("db/c.ts", "repo", 1).in_domain("data"),
            Symbol::new("db/d.ts", "driver", 1).in_domain("data"),
        ];
        let edges = symbols
            .windows(2)
            .map(|w| Edge::new(&w[0].id, &w[1].id, EdgeKind::Call))
            .collect();
        let handle = SnapshotHandle::new(
            Snapshot {
                symbols: symbols.clone(),
                edges,
                ..Snapshot::default()
            },
            1,
        );
        let mut detector = RelationshipDetector::new();
        detector.ensure(&handle);
        (symbols, detector)
    }

    #[test]
    fn impact_splits_upstream_and_downstream() {
        let (symbols, detector) = chain();
        let analysis = analyze_impact(&detector, &symbols[1].id);

        assert_eq!(analysis.stats.upstream, vec![symbols[0].id.clone()]);
        assert_eq!(
            analysis.stats.downstream,
            vec![symbols[2].id.clone(), symbols[3].id.clone()]
        );
        assert_eq!(analysis.stats.affected_functions, 3);
        assert_eq!(analysis.stats.affected_files, 4);
        assert_eq!(analysis.stats.affected_domains, 3);
    }

    #[test]
    fn impact_is_bounded_to_two_hops() {
        let (symbols, detector) = chain();
        let analysis = analyze_impact(&detector, &symbols[0].id);

        assert_eq!(analysis.stats.downstream.len(), 2);
        assert!(!analysis.stats.downstream.contains(&symbols[3].id));
        assert_eq!(analysis.depth_of(&symbols[2].id), Some(2));
    }

    #[test]
    fn related_ids_exclude_focal() {
        let (symbols, detector) = chain();
        let analysis = analyze_impact(&detector, &symbols[1].id);
        let ids = analysis.related_ids();
        assert!(!ids.contains(&symbols[1].id));
        assert!(ids.contains("file:svc/b.ts"));
    }

    #[test]
    fn unknown_focal_is_empty() {
        let (_, detector) = chain();
        let analysis = analyze_impact(&detector, "missing:x:1");
        assert_eq!(analysis.stats, ImpactStats::default());
    }
}
