//! Per-symbol coupling metrics.
//!
//! | Metric | Definition |
//! |--------|------------|
//! | in-degree | edges whose target is the symbol |
//! | out-degree | edges whose source is the symbol |
//! | CBO | distinct other symbols at the opposite end of any edge |
//! | normalized score | CBO / max CBO in the snapshot (0 when the max is 0) |
//!
//! Metrics are derived once per snapshot and are read-only afterwards.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::config::CouplingColors;
use crate::types::{Edge, Symbol};

/// Coupling metric for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CouplingMetric {
    /// Number of incoming edges
    pub in_degree: usize,
    /// Number of outgoing edges
    pub out_degree: usize,
    /// Distinct coupled neighbors
    pub cbo: usize,
    /// `cbo / max_cbo`, in `[0, 1]`
    pub normalized_score: f64,
    /// Color picked from the three-stop scale
    pub color: String,
}

/// Coupling metrics for every symbol of a snapshot, keyed by symbol id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CouplingMetrics {
    by_id: HashMap<String, CouplingMetric>,
    max_cbo: usize,
}

impl CouplingMetrics {
    /// Compute metrics for all symbols.
    ///
    /// Only ids of known symbols count toward CBO. Degrees count every edge
    /// touching the symbol, including edges whose other endpoint is dangling.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn compute(symbols: &[Symbol], edges: &[Edge], colors: &CouplingColors) -> Self {
        let known: HashSet<&str> = symbols.iter().map(|s| s.id.as_str()).collect();

        let mut in_degree: HashMap<&str, usize> = HashMap::new();
        let mut out_degree: HashMap<&str, usize> = HashMap::new();
        let mut neighbors: HashMap<&str, HashSet<&str>> = HashMap::new();

        for edge in edges {
            let (source, target) = (edge.source.as_str(), edge.target.as_str());
            *out_degree.entry(source).or_insert(0) += 1;
            *in_degree.entry(target).or_insert(0) += 1;
            if source == target {
                continue;
            }
            if known.contains(target) {
                neighbors.entry(source).or_default().insert(target);
            }
            if known.contains(source) {
                neighbors.entry(target).or_default().insert(source);
            }
        }

        let cbo_of = |id: &str| neighbors.get(id).map_or(0, HashSet::len);
        let max_cbo = known.iter().map(|&id| cbo_of(id)).max().unwrap_or(0);

        let by_id = known
            .iter()
            .map(|&id| {
                let cbo = cbo_of(id);
                let normalized_score = if max_cbo == 0 {
                    0.0
                } else {
                    cbo as f64 / max_cbo as f64
                };
                let metric = CouplingMetric {
                    in_degree: in_degree.get(id).copied().unwrap_or(0),
                    out_degree: out_degree.get(id).copied().unwrap_or(0),
                    cbo,
                    normalized_score,
                    color: colors.color_for(normalized_score).to_string(),
                };
                (id.to_string(), metric)
            })
            .collect();

        Self { by_id, max_cbo }
    }

    /// Metric for a symbol id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&CouplingMetric> {
        self.by_id.get(id)
    }

    /// Highest CBO observed in the snapshot.
    #[must_use]
    pub fn max_cbo(&self) -> usize {
        self.max_cbo
    }

    /// Number of symbols with metrics.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Returns `true` when no symbols were measured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Metrics sorted by descending CBO, ties broken by id.
    #[must_use]
    pub fn ranked(&self) -> Vec<(&str, &CouplingMetric)> {
        let mut ranked: Vec<_> = self.by_id.iter().map(|(id, m)| (id.as_str(), m)).collect();
        ranked.sort_by(|a, b| b.1.cbo.cmp(&a.1.cbo).then_with(|| a.0.cmp(b.0)));
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EdgeKind;

    fn compute(symbols: &[Symbol], edges: &[Edge]) -> CouplingMetrics {
        CouplingMetrics::compute(symbols, edges, &CouplingColors::default())
    }

    #[test]
    fn single_call_edge_couples_both_ends() {
        let a = Symbol::new("file1", "f", 1);
        let b = Symbol::new("file1", "g", 2);
        let edges = vec![Edge::new(&a.id, &b.id, EdgeKind::Call)];
        let metrics = compute(&[a.clone(), b.clone()], &edges);

        let ma = metrics.get(&a.id).unwrap();
        assert_eq!((ma.out_degree, ma.in_degree, ma.cbo), (1, 0, 1));
        let mb = metrics.get(&b.id).unwrap();
        assert_eq!((mb.out_degree, mb.in_degree, mb.cbo), (0, 1, 1));
    }

    #[test]
    fn multi_edges_to_same_neighbor_count_once() {
        let a = Symbol::new("f.ts", "a", 1);
        let b = Symbol::new("f.ts", "b", 2);
        let edges = vec![
            Edge::new(&a.id, &b.id, EdgeKind::Call),
            Edge::new(&a.id, &b.id, EdgeKind::Import),
            Edge::new(&b.id, &a.id, EdgeKind::Call),
        ];
        let metrics = compute(&[a.clone(), b], &edges);

        let ma = metrics.get(&a.id).unwrap();
        assert_eq!(ma.out_degree, 2);
        assert_eq!(ma.in_degree, 1);
        assert_eq!(ma.cbo, 1);
    }

    #[test]
    fn isolated_symbol_gets_baseline() {
        let lonely = Symbol::new("x.ts", "lonely", 1);
        let metrics = compute(std::slice::from_ref(&lonely), &[]);

        let metric = metrics.get(&lonely.id).unwrap();
        assert_eq!(metric.cbo, 0);
        assert!(metric.normalized_score.abs() < f64::EPSILON);
        assert_eq!(metric.color, CouplingColors::default().low);
    }

    #[test]
    fn score_is_normalized_by_max_cbo() {
        let hub = Symbol::new("h.ts", "hub", 1);
        let spokes: Vec<Symbol> = (0..4).map(|i| Symbol::new("s.ts", "spoke", i)).collect();
        let edges: Vec<Edge> = spokes
            .iter()
            .map(|s| Edge::new(&hub.id, &s.id, EdgeKind::Call))
            .collect();
        let mut all = spokes.clone();
        all.push(hub.clone());
        let metrics = compute(&all, &edges);

        assert_eq!(metrics.max_cbo(), 4);
        assert!((metrics.get(&hub.id).unwrap().normalized_score - 1.0).abs() < f64::EPSILON);
        assert!((metrics.get(&spokes[0].id).unwrap().normalized_score - 0.25).abs() < 1e-9);
        assert_eq!(metrics.ranked()[0].0, hub.id);
    }

    #[test]
    fn self_loop_counts_degree_but_not_cbo() {
        let rec = Symbol::new("r.ts", "rec", 1);
        let metrics = compute(
            std::slice::from_ref(&rec),
            &[Edge::new(&rec.id, &rec.id, EdgeKind::Call)],
        );
        let metric = metrics.get(&rec.id).unwrap();
        assert_eq!((metric.in_degree, metric.out_degree, metric.cbo), (1, 1, 0));
    }

    #[test]
    fn dangling_neighbor_is_not_coupled() {
        let a = Symbol::new("a.ts", "a", 1);
        let metrics = compute(
            std::slice::from_ref(&a),
            &[Edge::new(&a.id, "missing:x:1", EdgeKind::Call)],
        );
        let metric = metrics.get(&a.id).unwrap();
        assert_eq!(metric.out_degree, 1);
        assert_eq!(metric.cbo, 0);
    }
}
