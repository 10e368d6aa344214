//! Domain types for the raw code graph.
//!
//! These are the entities delivered by the external indexer:
//! - **Entities**: `Symbol`, `Edge`
//! - **Containers**: `FileInfo`, `DomainInfo` with upstream-computed health
//!
//! ## Identifiers
//!
//! A symbol id is `filePath:name:startLine`. Every cross-reference in a
//! snapshot (edge endpoints, focus ids, collapse targets) is a string built
//! this way, so the format is load-bearing. Container ids are namespaced
//! (`domain:<name>`, `file:<path>`) so they can never collide with a symbol.

use serde::{Deserialize, Serialize};

/// Prefix for domain container node ids.
pub const DOMAIN_ID_PREFIX: &str = "domain:";

/// Prefix for file container node ids.
pub const FILE_ID_PREFIX: &str = "file:";

/// Build the node id for a domain container.
#[must_use]
pub fn domain_node_id(name: &str) -> String {
    format!("{DOMAIN_ID_PREFIX}{name}")
}

/// Build the node id for a file container.
#[must_use]
pub fn file_node_id(path: &str) -> String {
    format!("{FILE_ID_PREFIX}{path}")
}

// ============================================================================
// Enums
// ============================================================================

/// Symbol kinds reported by the indexer.
///
/// Unknown kinds deserialize to [`SymbolKind::Other`] rather than failing the
/// whole snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    /// Free function
    #[default]
    Function,
    /// Function associated with a type
    Method,
    /// Class or struct
    Class,
    /// Interface or trait
    Interface,
    /// Variable or constant
    Variable,
    /// Type alias or enum
    Type,
    /// Module or namespace
    Module,
    /// Anything else
    #[serde(other)]
    Other,
}

impl SymbolKind {
    /// Lowercase name used in output.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Function => "function",
            Self::Method => "method",
            Self::Class => "class",
            Self::Interface => "interface",
            Self::Variable => "variable",
            Self::Type => "type",
            Self::Module => "module",
            Self::Other => "other",
        }
    }
}

/// Relationship kinds between symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    /// Function or method call
    Call,
    /// Import statement
    Import,
    /// Class inheritance
    Extends,
    /// Interface implementation
    Implements,
}

impl EdgeKind {
    /// Lowercase name used in edge ids and output.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Call => "call",
            Self::Import => "import",
            Self::Extends => "extends",
            Self::Implements => "implements",
        }
    }
}

/// Health classification of a container, supplied upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Within all thresholds
    #[default]
    Healthy,
    /// Approaching limits
    Warning,
    /// Over limits
    Critical,
}

// ============================================================================
// Entities
// ============================================================================

/// A named code entity (function, class, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Symbol {
    /// `filePath:name:startLine`; derived from the parts when empty
    #[serde(default)]
    pub id: String,
    /// Display name
    pub name: String,
    /// Symbol kind
    #[serde(rename = "type", default)]
    pub kind: SymbolKind,
    /// Path of the containing file
    pub file_path: String,
    /// 1-based first line
    #[serde(default)]
    pub start_line: u32,
    /// Cyclomatic complexity
    #[serde(default)]
    pub complexity: u32,
    /// Owning domain, if the indexer assigned one
    #[serde(default)]
    pub domain: Option<String>,
    /// Free-form tags (AI-assigned or manual)
    #[serde(default, alias = "aiTags")]
    pub tags: Vec<String>,
    /// Fragility estimate in `[0, 1]`
    #[serde(default)]
    pub fragility: Option<f64>,
}

impl Symbol {
    /// Build a symbol id from its location parts.
    #[must_use]
    pub fn make_id(file_path: &str, name: &str, start_line: u32) -> String {
        format!("{file_path}:{name}:{start_line}")
    }

    /// Create a function symbol with its id derived from the location.
    #[must_use]
    pub fn new(file_path: &str, name: &str, start_line: u32) -> Self {
        Self {
            id: Self::make_id(file_path, name, start_line),
            name: name.to_string(),
            kind: SymbolKind::Function,
            file_path: file_path.to_string(),
            start_line,
            complexity: 0,
            domain: None,
            tags: Vec::new(),
            fragility: None,
        }
    }

    /// Set the domain (builder style).
    #[must_use]
    pub fn in_domain(mut self, domain: &str) -> Self {
        self.domain = Some(domain.to_string());
        self
    }

    /// Set the complexity (builder style).
    #[must_use]
    pub fn with_complexity(mut self, complexity: u32) -> Self {
        self.complexity = complexity;
        self
    }

    /// Node id of the containing file.
    #[must_use]
    pub fn file_node_id(&self) -> String {
        file_node_id(&self.file_path)
    }
}

/// A directed relationship between two symbols.
///
/// Endpoints are symbol ids. Endpoints that do not resolve to a symbol in the
/// snapshot are tolerated and dropped by the projection stage.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    /// Source symbol id
    pub source: String,
    /// Target symbol id
    pub target: String,
    /// Relationship kind
    #[serde(rename = "type", alias = "kind")]
    pub kind: EdgeKind,
}

impl Edge {
    /// Create a new edge.
    #[must_use]
    pub fn new(source: impl Into<String>, target: impl Into<String>, kind: EdgeKind) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            kind,
        }
    }

    /// Stable edge id: `source->target:kind`.
    #[must_use]
    pub fn id(&self) -> String {
        edge_id(&self.source, &self.target, self.kind)
    }
}

/// Build an edge id from its parts.
#[must_use]
pub fn edge_id(source: &str, target: &str, kind: EdgeKind) -> String {
    format!("{source}->{target}:{}", kind.as_str())
}

/// Aggregate container health, computed upstream.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HealthMetrics {
    /// Number of symbols in the container
    pub symbol_count: u32,
    /// Mean cyclomatic complexity
    pub avg_complexity: f64,
    /// Aggregate coupling
    pub coupling: f64,
    /// Overall score in `[0, 100]`
    pub health_score: f64,
    /// Health classification
    pub status: HealthStatus,
}

/// A source file container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    /// File path, matching `Symbol::file_path`
    pub path: String,
    /// Owning domain; falls back to the domain of the file's first symbol
    #[serde(default)]
    pub domain: Option<String>,
    /// Aggregate health
    #[serde(default)]
    pub health: HealthMetrics,
}

/// A domain container (a group of files).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainInfo {
    /// Domain name
    pub name: String,
    /// Aggregate health
    #[serde(default)]
    pub health: HealthMetrics,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_id_is_path_name_line() {
        let symbol = Symbol::new("src/api/orders.ts", "handleRequest", 12);
        assert_eq!(symbol.id, "src/api/orders.ts:handleRequest:12");
        assert_eq!(symbol.file_node_id(), "file:src/api/orders.ts");
    }

    #[test]
    fn edge_id_includes_kind() {
        let edge = Edge::new("a", "b", EdgeKind::Import);
        assert_eq!(edge.id(), "a->b:import");
    }

    #[test]
    fn unknown_symbol_kind_deserializes_to_other() {
        let json = r#"{"name":"x","type":"decorator","filePath":"a.py"}"#;
        let symbol: Symbol = serde_json::from_str(json).expect("valid symbol json");
        assert_eq!(symbol.kind, SymbolKind::Other);
        assert!(symbol.id.is_empty());
    }

    #[test]
    fn edge_accepts_kind_alias() {
        let edge: Edge =
            serde_json::from_str(r#"{"source":"a","target":"b","kind":"extends"}"#).unwrap();
        assert_eq!(edge.kind, EdgeKind::Extends);
    }
}
