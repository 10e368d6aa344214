//! The raw graph snapshot and its lifecycle handle.
//!
//! A snapshot is produced externally and is immutable once handed to the
//! pipeline. Every replacement gets a fresh generation id from
//! [`SnapshotHandle`]; caches key on that generation instead of on the
//! identity of a collection.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, warn};

use crate::error::Result;
use crate::types::{DomainInfo, Edge, FileInfo, Symbol};
use crate::warning::IntegrityWarning;

/// A complete code-graph snapshot as delivered by the indexer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    /// All symbols
    pub symbols: Vec<Symbol>,
    /// Relationships between symbols
    pub edges: Vec<Edge>,
    /// File containers
    pub files: Vec<FileInfo>,
    /// Domain containers
    pub domains: Vec<DomainInfo>,
}

impl Snapshot {
    /// Parse a snapshot from JSON.
    ///
    /// A literal `null` is accepted and yields an empty snapshot.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let parsed: Option<Self> = serde_json::from_str(json)?;
        let mut snapshot = parsed.unwrap_or_default();
        snapshot.normalize_ids();
        Ok(snapshot)
    }

    /// Load a snapshot from a JSON file.
    pub async fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).await?;
        let snapshot = Self::from_json_str(&content)?;
        debug!(
            path = %path.display(),
            symbols = snapshot.symbols.len(),
            edges = snapshot.edges.len(),
            "Loaded snapshot"
        );
        Ok(snapshot)
    }

    /// Derive missing symbol ids from their location parts.
    pub fn normalize_ids(&mut self) {
        for symbol in &mut self.symbols {
            if symbol.id.is_empty() {
                symbol.id = Symbol::make_id(&symbol.file_path, &symbol.name, symbol.start_line);
            }
        }
    }

    /// Whether the snapshot has no symbols and no containers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty() && self.files.is_empty() && self.domains.is_empty()
    }

    /// Index symbols by id. Duplicate ids resolve last-write-wins.
    #[must_use]
    pub fn symbol_index(&self) -> HashMap<&str, &Symbol> {
        self.symbols.iter().map(|s| (s.id.as_str(), s)).collect()
    }

    /// Resolve the domain of every file path.
    ///
    /// An explicit `FileInfo::domain` wins; otherwise the domain of the first
    /// symbol seen in that file is used.
    #[must_use]
    pub fn file_domains(&self) -> HashMap<&str, &str> {
        let mut domains: HashMap<&str, &str> = HashMap::new();
        for file in &self.files {
            if let Some(domain) = file.domain.as_deref() {
                domains.insert(file.path.as_str(), domain);
            }
        }
        for symbol in &self.symbols {
            if let Some(domain) = symbol.domain.as_deref() {
                domains.entry(symbol.file_path.as_str()).or_insert(domain);
            }
        }
        domains
    }

    /// Scan for data-integrity problems.
    ///
    /// Duplicate ids are logged at `warn`; dangling edges only at `debug`.
    #[must_use]
    pub fn integrity_warnings(&self) -> Vec<IntegrityWarning> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        let mut order = Vec::new();
        for symbol in &self.symbols {
            let count = counts.entry(symbol.id.as_str()).or_insert(0);
            if *count == 1 {
                order.push(symbol.id.as_str());
            }
            *count += 1;
        }

        let mut warnings: Vec<IntegrityWarning> = order
            .into_iter()
            .map(|id| IntegrityWarning::DuplicateSymbolId {
                id: id.to_string(),
                occurrences: counts[id],
            })
            .collect();

        for edge in &self.edges {
            if !counts.contains_key(edge.source.as_str()) || !counts.contains_key(edge.target.as_str())
            {
                warnings.push(IntegrityWarning::DanglingEdge {
                    source: edge.source.clone(),
                    target: edge.target.clone(),
                });
            }
        }

        for warning in &warnings {
            if warning.is_reportable() {
                warn!(kind = warning.kind(), "{warning}");
            } else {
                debug!(kind = warning.kind(), "{warning}");
            }
        }
        warnings
    }
}

/// An immutable snapshot tagged with the generation it was installed at.
#[derive(Debug, Clone)]
pub struct SnapshotHandle {
    snapshot: Arc<Snapshot>,
    generation: u64,
}

impl SnapshotHandle {
    /// Wrap a snapshot at the given generation.
    #[must_use]
    pub fn new(snapshot: Snapshot, generation: u64) -> Self {
        Self {
            snapshot: Arc::new(snapshot),
            generation,
        }
    }

    /// The generation this snapshot was installed at.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Borrow the snapshot.
    #[must_use]
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EdgeKind;

    #[test]
    fn null_snapshot_is_empty() {
        let snapshot = Snapshot::from_json_str("null").expect("null is accepted");
        assert!(snapshot.is_empty());
    }

    #[test]
    fn missing_arrays_default_to_empty() {
        let snapshot = Snapshot::from_json_str(r#"{"symbols":[]}"#).unwrap();
        assert!(snapshot.edges.is_empty());
        assert!(snapshot.domains.is_empty());
    }

    #[test]
    fn empty_ids_are_derived_from_location() {
        let json = r#"{"symbols":[{"name":"f","filePath":"a.ts","startLine":3}]}"#;
        let snapshot = Snapshot::from_json_str(json).unwrap();
        assert_eq!(snapshot.symbols[0].id, "a.ts:f:3");
    }

    #[test]
    fn duplicate_ids_are_reported_once_with_count() {
        let snapshot = Snapshot {
            symbols: vec![
                Symbol::new("a.ts", "f", 1),
                Symbol::new("a.ts", "f", 1),
                Symbol::new("a.ts", "f", 1),
                Symbol::new("a.ts", "g", 2),
            ],
            ..Snapshot::default()
        };

        let warnings = snapshot.integrity_warnings();
        assert_eq!(
            warnings,
            vec![IntegrityWarning::DuplicateSymbolId {
                id: "a.ts:f:1".to_string(),
                occurrences: 3,
            }]
        );
    }

    #[test]
    fn dangling_edges_are_listed() {
        let snapshot = Snapshot {
            symbols: vec![Symbol::new("a.ts", "f", 1)],
            edges: vec![Edge::new("a.ts:f:1", "gone.ts:x:9", EdgeKind::Call)],
            ..Snapshot::default()
        };

        let warnings = snapshot.integrity_warnings();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].kind(), "dangling_edge");
    }

    #[test]
    fn symbol_index_is_last_write_wins() {
        let mut second = Symbol::new("a.ts", "f", 1);
        second.complexity = 7;
        let snapshot = Snapshot {
            symbols: vec![Symbol::new("a.ts", "f", 1), second],
            ..Snapshot::default()
        };
        assert_eq!(snapshot.symbol_index()["a.ts:f:1"].complexity, 7);
    }

    #[test]
    fn explicit_file_domain_beats_symbol_domain() {
        let snapshot = Snapshot {
            symbols: vec![Symbol::new("a.ts", "f", 1).in_domain("billing")],
            files: vec![FileInfo {
                path: "a.ts".to_string(),
                domain: Some("orders".to_string()),
                health: crate::types::HealthMetrics::default(),
            }],
            ..Snapshot::default()
        };
        assert_eq!(snapshot.file_domains()["a.ts"], "orders");
    }
}
