//! Execution flow detection: entry points, sinks and reachability.
//!
//! ## Classification
//!
//! | Role | Rule |
//! |------|------|
//! | Entry point | first matching name category in the order api, main, event, route |
//! | Entry point (path) | file under an api/route/handler/controller directory ⇒ `api`, if not already classified |
//! | Sink | name matches any database, network, io or response pattern |
//!
//! ## The `path` Field
//!
//! A flow's `path` is the full set of nodes reachable from the entry point, in
//! BFS discovery order, starting with the entry itself. It is not a single
//! linear walk. Edge importance checks index adjacency in this sequence, which
//! is only meaningful because discovery order is preserved.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use petgraph::Direction;
use regex::Regex;
use serde::Serialize;
use tracing::debug;

use super::relationships::RelationshipDetector;
use crate::types::Symbol;

/// Maximum importance score for a single edge.
pub const MAX_EDGE_IMPORTANCE: f64 = 3.0;

/// Extra importance per flow for flows starting at an API entry point.
const API_FLOW_BONUS: f64 = 0.5;

/// Directory names that mark an API boundary.
const SOURCE_BOUNDARY_SEGMENTS: &[&str] = &[
    "api",
    "apis",
    "route",
    "routes",
    "handler",
    "handlers",
    "controller",
    "controllers",
];

/// Kind of entry point a flow starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowCategory {
    /// Request handler or controller
    Api,
    /// Program entry (`main`, `run`, ...)
    Main,
    /// Event listener or callback
    Event,
    /// Route or endpoint declaration
    Route,
}

impl FlowCategory {
    /// Lowercase name used in output.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Api => "api",
            Self::Main => "main",
            Self::Event => "event",
            Self::Route => "route",
        }
    }
}

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("built-in flow pattern must compile")
}

/// Entry patterns, in priority order.
static ENTRY_PATTERNS: LazyLock<Vec<(FlowCategory, Regex)>> = LazyLock::new(|| {
    vec![
        (
            FlowCategory::Api,
            compile(r"^(handle|process)([A-Z_]|$)|(Handler|Controller)$|^api[A-Z_]"),
        ),
        (
            FlowCategory::Main,
            compile(r"^(main|run|start|bootstrap|init|setup)$|^(main|bootstrap)[A-Z_]"),
        ),
        (
            FlowCategory::Event,
            compile(r"^on[A-Z_]|(Listener|Subscriber|Callback)$"),
        ),
        (FlowCategory::Route, compile(r"(?i)(route|router|endpoint)")),
    ]
});

/// Sink patterns: database, network, io, response.
static SINK_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        compile(
            r"(?i:query|database|sql|repository|persist|upsert)|^(insert|select|save|find|delete|update)([A-Z_]|$)|D[bB]([A-Z_]|$)",
        ),
        compile(r"(?i)(fetch|http|axios|socket|webhook|grpc|download|upload)"),
        compile(r"^(read|write|open|print|log)([A-Z_]|$)|File(Sync)?$|Stream$"),
        compile(r"^(respond|render|reply|send)([A-Z_]|$)|(Response|Json)$"),
    ]
});

/// Classify a symbol name as an entry point, by name alone.
#[must_use]
pub fn classify_entry_name(name: &str) -> Option<FlowCategory> {
    ENTRY_PATTERNS
        .iter()
        .find(|(_, pattern)| pattern.is_match(name))
        .map(|(category, _)| *category)
}

/// Whether a file path lies under an API/route/handler/controller directory.
#[must_use]
pub fn is_source_boundary_path(path: &str) -> bool {
    let segments: Vec<&str> = path.split(['/', '\\']).collect();
    let Some((_file_name, directories)) = segments.split_last() else {
        return false;
    };
    directories
        .iter()
        .any(|dir| SOURCE_BOUNDARY_SEGMENTS.contains(&dir.to_ascii_lowercase().as_str()))
}

/// Classify a symbol as an entry point.
///
/// The name rule wins; the path rule only adds `api` for symbols the name
/// rule left unclassified.
#[must_use]
pub fn classify_entry(symbol: &Symbol) -> Option<FlowCategory> {
    classify_entry_name(&symbol.name)
        .or_else(|| is_source_boundary_path(&symbol.file_path).then_some(FlowCategory::Api))
}

/// Whether a symbol name matches any sink pattern.
#[must_use]
pub fn is_sink_name(name: &str) -> bool {
    SINK_PATTERNS.iter().any(|pattern| pattern.is_match(name))
}

/// One entry → sinks trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionFlow {
    /// Entry point symbol id
    pub entry_point: String,
    /// Sinks reached from the entry, in discovery order
    pub sinks: Vec<String>,
    /// Every reachable node in BFS discovery order, entry first
    pub path: Vec<String>,
    /// Entry point category
    pub category: FlowCategory,
}

/// Detect execution flows over the detector's outgoing adjacency.
///
/// A flow is emitted only when at least one sink is reachable. Symbols with
/// duplicate ids are classified by their last occurrence; entries keep the
/// order in which each id was first seen.
#[must_use]
pub fn detect_execution_flows(
    symbols: &[Symbol],
    detector: &RelationshipDetector,
) -> Vec<ExecutionFlow> {
    let latest: HashMap<&str, &Symbol> = symbols.iter().map(|s| (s.id.as_str(), s)).collect();
    let sinks: HashMap<&str, bool> = latest
        .iter()
        .map(|(id, symbol)| (*id, is_sink_name(&symbol.name)))
        .collect();

    let mut seen: HashSet<&str> = HashSet::new();
    let mut entries: Vec<(&str, FlowCategory)> = Vec::new();
    for symbol in symbols {
        let id = symbol.id.as_str();
        if !seen.insert(id) {
            continue;
        }
        let symbol = latest.get(id).copied().unwrap_or(symbol);
        if let Some(category) = classify_entry(symbol) {
            entries.push((id, category));
        }
    }

    let flows: Vec<ExecutionFlow> = entries
        .into_iter()
        .filter_map(|(entry, category)| {
            let reached = detector.traverse(entry, Direction::Outgoing, None);
            let found: Vec<String> = reached
                .iter()
                .filter(|(id, _)| id != entry && sinks.get(id.as_str()).copied().unwrap_or(false))
                .map(|(id, _)| id.clone())
                .collect();
            if found.is_empty() {
                return None;
            }

            let mut path = Vec::with_capacity(reached.len() + 1);
            path.push(entry.to_string());
            path.extend(reached.into_iter().map(|(id, _)| id));

            Some(ExecutionFlow {
                entry_point: entry.to_string(),
                sinks: found,
                path,
                category,
            })
        })
        .collect();

    debug!(flows = flows.len(), "Detected execution flows");
    flows
}

/// Importance scores for edges, derived from flow adjacency.
#[derive(Debug, Clone, Default)]
pub struct EdgeImportance {
    /// Per flow: position of each node in the path, and whether it is an api flow
    flows: Vec<(HashMap<String, usize>, bool)>,
}

impl EdgeImportance {
    /// Index the given flows.
    #[must_use]
    pub fn new(flows: &[ExecutionFlow]) -> Self {
        let flows = flows
            .iter()
            .map(|flow| {
                let positions = flow
                    .path
                    .iter()
                    .enumerate()
                    .map(|(index, id)| (id.clone(), index))
                    .collect();
                (positions, flow.category == FlowCategory::Api)
            })
            .collect();
        Self { flows }
    }

    /// Score for the edge `source -> target`, in `[0, MAX_EDGE_IMPORTANCE]`.
    ///
    /// Each flow where `target` immediately follows `source` adds 1, plus
    /// 0.5 when the flow starts at an API entry point.
    #[must_use]
    pub fn score(&self, source: &str, target: &str) -> f64 {
        let total: f64 = self
            .flows
            .iter()
            .filter(|(positions, _)| {
                matches!(
                    (positions.get(source), positions.get(target)),
                    (Some(&s), Some(&t)) if t == s + 1
                )
            })
            .map(|(_, is_api)| if *is_api { 1.0 + API_FLOW_BONUS } else { 1.0 })
            .sum();
        total.min(MAX_EDGE_IMPORTANCE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{Snapshot, SnapshotHandle};
    use crate::types::{Edge, EdgeKind};
    use rstest::rstest;

    fn detect(symbols: Vec<Symbol>, edges: Vec<Edge>) -> Vec<ExecutionFlow> {
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
        detect_execution_flows(&symbols, &detector)
    }

    #[rstest]
    #[case::handler_prefix("handleRequest", Some(FlowCategory::Api))]
    #[case::snake_case_handler("handle_upload", Some(FlowCategory::Api))]
    #[case::controller_suffix("OrderController", Some(FlowCategory::Api))]
    #[case::main("main", Some(FlowCategory::Main))]
    #[case::event("onClick", Some(FlowCategory::Event))]
    #[case::route("registerRoutes", Some(FlowCategory::Route))]
    #[case::api_beats_route("handleRoute", Some(FlowCategory::Api))]
    #[case::plain_helper("formatDate", None)]
    fn entry_names_classify_in_priority_order(
        #[case] name: &str,
        #[case] expected: Option<FlowCategory>,
    ) {
        assert_eq!(classify_entry_name(name), expected);
    }

    #[rstest]
    #[case::database("queryDatabase", true)]
    #[case::repository("userRepository", true)]
    #[case::network("fetchPrices", true)]
    #[case::io("writeFile", true)]
    #[case::response("sendJson", true)]
    #[case::pure("computeTotal", false)]
    fn sink_names(#[case] name: &str, #[case] expected: bool) {
        assert_eq!(is_sink_name(name), expected);
    }

    #[test]
    fn path_rule_adds_api_entries() {
        let symbol = Symbol::new("/api/orders.ts", "listOrders", 3);
        assert_eq!(classify_entry(&symbol), Some(FlowCategory::Api));

        let elsewhere = Symbol::new("/lib/orders.ts", "listOrders", 3);
        assert_eq!(classify_entry(&elsewhere), None);

        // file names are not directories
        assert!(!is_source_boundary_path("src/api.ts"));
    }

    #[test]
    fn path_rule_does_not_override_name_rule() {
        let symbol = Symbol::new("src/routes/app.ts", "main", 1);
        assert_eq!(classify_entry(&symbol), Some(FlowCategory::Main));
    }

    #[test]
    fn api_handler_reaching_database_yields_one_flow() {
        let handler = Symbol::new("/api/orders.ts", "handleRequest", 1);
        let query = Symbol::new("/db/orders.ts", "queryDatabase", 10);
        let flows = detect(
            vec![handler.clone(), query.clone()],
            vec![Edge::new(&handler.id, &query.id, EdgeKind::Call)],
        );

        assert_eq!(flows.len(), 1);
        assert_eq!(flows[0].entry_point, handler.id);
        assert_eq!(flows[0].sinks, vec![query.id.clone()]);
        assert_eq!(flows[0].category, FlowCategory::Api);
        assert_eq!(flows[0].path, vec![handler.id, query.id]);
    }

    #[test]
    fn entry_without_reachable_sink_emits_nothing() {
        let main = Symbol::new("src/main.ts", "main", 1);
        let helper = Symbol::new("src/util.ts", "formatDate", 1);
        let flows = detect(
            vec![main.clone(), helper.clone()],
            vec![Edge::new(&main.id, &helper.id, EdgeKind::Call)],
        );
        assert!(flows.is_empty());
    }

    #[test]
    fn path_is_full_reachable_set_in_discovery_order() {
        let main = Symbol::new("m.ts", "main", 1);
        let left = Symbol::new("m.ts", "parse", 2);
        let right = Symbol::new("m.ts", "validate", 3);
        let sink = Symbol::new("m.ts", "saveOrder", 4);
        let flows = detect(
            vec![main.clone(), left.clone(), right.clone(), sink.clone()],
            vec![
                Edge::new(&main.id, &left.id, EdgeKind::Call),
                Edge::new(&main.id, &right.id, EdgeKind::Call),
                Edge::new(&right.id, &sink.id, EdgeKind::Call),
                Edge::new(&sink.id, &main.id, EdgeKind::Call),
            ],
        );

        assert_eq!(flows.len(), 1);
        assert_eq!(flows[0].path, vec![main.id, left.id, right.id, sink.id.clone()]);
        assert_eq!(flows[0].sinks, vec![sink.id]);
    }

    #[test]
    fn importance_counts_adjacent_pairs_with_api_bonus_and_cap() {
        let flow = |category| ExecutionFlow {
            entry_point: "a".to_string(),
            sinks: vec!["b".to_string()],
            path: vec!["a".to_string(), "b".to_string()],
            category,
        };
        let single = EdgeImportance::new(&[flow(FlowCategory::Main)]);
        assert!((single.score("a", "b") - 1.0).abs() < f64::EPSILON);
        assert!(single.score("b", "a").abs() < f64::EPSILON);

        let api = EdgeImportance::new(&[flow(FlowCategory::Api)]);
        assert!((api.score("a", "b") - 1.5).abs() < f64::EPSILON);

        let many = EdgeImportance::new(&[
            flow(FlowCategory::Api),
            flow(FlowCategory::Api),
            flow(FlowCategory::Api),
        ]);
        assert!((many.score("a", "b") - MAX_EDGE_IMPORTANCE).abs() < f64::EPSILON);
    }

    #[test]
    fn duplicate_id_is_classified_by_last_occurrence() {
        let entry = Symbol::new("api/orders.ts", "handleRequest", 1);
        let mut helper = Symbol::new("db/store.ts", "formatDate", 4);
        helper.id = "dup".to_string();
        let mut sink = Symbol::new("db/store.ts", "queryDatabase", 4);
        sink.id = "dup".to_string();

        let flows = detect(
            vec![entry.clone(), helper, sink],
            vec![Edge::new(&entry.id, "dup", EdgeKind::Call)],
        );

        assert_eq!(flows.len(), 1);
        assert_eq!(flows[0].sinks, vec!["dup".to_string()]);
    }

    #[test]
    fn duplicate_entry_keeps_first_seen_position() {
        let sink = Symbol::new("db/store.ts", "queryDatabase", 1);
        let first = Symbol::new("api/a.ts", "handleA", 1);
        let second = Symbol::new("api/b.ts", "handleB", 1);
        let again = first.clone();
        let edges = vec![
            Edge::new(&first.id, &sink.id, EdgeKind::Call),
            Edge::new(&second.id, &sink.id, EdgeKind::Call),
        ];

        let flows = detect(vec![first.clone(), second.clone(), again, sink], edges);

        let entries: Vec<&str> = flows.iter().map(|f| f.entry_point.as_str()).collect();
        assert_eq!(entries, vec![first.id.as_str(), second.id.as_str()]);
    }
}
