//! Data-integrity warnings raised while scanning a snapshot.
//!
//! Integrity problems never stop the pipeline. They are returned alongside
//! the loaded snapshot so callers can surface them, and the pipeline keeps
//! going with last-write-wins semantics for duplicate ids and silently
//! drops dangling edges.

/// A non-fatal problem found in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityWarning {
    /// More than one symbol shares the same id.
    ///
    /// Any map keyed by symbol id keeps the last occurrence.
    DuplicateSymbolId {
        /// The duplicated id.
        id: String,
        /// How many symbols carry it.
        occurrences: usize,
    },

    /// An edge endpoint does not resolve to any symbol.
    DanglingEdge {
        /// Edge source id.
        source: String,
        /// Edge target id.
        target: String,
    },
}

impl IntegrityWarning {
    /// Returns a human-readable description of the warning.
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::DuplicateSymbolId { id, occurrences } => {
                format!("symbol id '{id}' appears {occurrences} times; last occurrence wins")
            }
            Self::DanglingEdge { source, target } => {
                format!("edge {source} -> {target} references an unknown symbol")
            }
        }
    }

    /// Returns a static string identifying the warning kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DuplicateSymbolId { .. } => "duplicate_symbol_id",
            Self::DanglingEdge { .. } => "dangling_edge",
        }
    }

    /// Whether the warning should be surfaced above debug level.
    ///
    /// Dangling edges are an expected by-product of partial indexing and are
    /// only kept for diagnostics.
    #[must_use]
    pub fn is_reportable(&self) -> bool {
        matches!(self, Self::DuplicateSymbolId { .. })
    }
}

impl std::fmt::Display for IntegrityWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

impl std::error::Error for IntegrityWarning {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_id_is_reportable() {
        let warning = IntegrityWarning::DuplicateSymbolId {
            id: "a.ts:f:1".to_string(),
            occurrences: 2,
        };
        assert!(warning.is_reportable());
        assert_eq!(warning.kind(), "duplicate_symbol_id");
        assert!(warning.to_string().contains("appears 2 times"));
    }

    #[test]
    fn dangling_edge_is_diagnostic_only() {
        let warning = IntegrityWarning::DanglingEdge {
            source: "a".to_string(),
            target: "missing".to_string(),
        };
        assert!(!warning.is_reportable());
        assert_eq!(warning.kind(), "dangling_edge");
    }
}
