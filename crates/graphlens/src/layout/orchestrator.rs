//! Debounced, generation-checked layout scheduling.
//!
//! Every [`LayoutOrchestrator::schedule`] call bumps a generation counter
//! and restarts a single quiescence timer. When the timer fires, the layout
//! runs in its own task, so a later trigger can start a second computation
//! while the first is still in flight; a result is published only when its
//! generation is still the newest one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::{run_layout, LayoutEngine, LayeredEngine, RenderGraph};
use crate::config::LayoutConfig;
use crate::view::FilteredGraph;

/// A published layout.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutUpdate {
    /// Generation of the request that produced it
    pub generation: u64,
    /// The positioned graph
    pub graph: Arc<RenderGraph>,
}

/// Debounces layout requests and publishes the newest result.
///
/// Must be used from within a tokio runtime.
pub struct LayoutOrchestrator {
    engine: Arc<dyn LayoutEngine>,
    config: LayoutConfig,
    generation: Arc<AtomicU64>,
    pending: Option<JoinHandle<()>>,
    updates: Arc<watch::Sender<Option<LayoutUpdate>>>,
}

impl std::fmt::Debug for LayoutOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayoutOrchestrator")
            .field("config", &self.config)
            .field("generation", &self.generation.load(Ordering::SeqCst))
            .field("pending", &self.pending.is_some())
            .finish_non_exhaustive()
    }
}

impl LayoutOrchestrator {
    /// Create an orchestrator around a layout engine.
    #[must_use]
    pub fn new(engine: Arc<dyn LayoutEngine>, config: LayoutConfig) -> Self {
        let (updates, _) = watch::channel(None);
        Self {
            engine,
            config,
            generation: Arc::new(AtomicU64::new(0)),
            pending: None,
            updates: Arc::new(updates),
        }
    }

    /// Create an orchestrator using the built-in [`LayeredEngine`].
    #[must_use]
    pub fn with_layered_engine(config: LayoutConfig) -> Self {
        Self::new(Arc::new(LayeredEngine), config)
    }

    /// Receive published layouts.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<LayoutUpdate>> {
        self.updates.subscribe()
    }

    /// The most recently published layout.
    #[must_use]
    pub fn latest(&self) -> Option<LayoutUpdate> {
        self.updates.borrow().clone()
    }

    /// Request a layout of `graph` once the debounce window elapses.
    ///
    /// Cancels any pending (not yet started) layout. Returns the generation
    /// assigned to this request.
    pub fn schedule(&mut self, graph: FilteredGraph) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }

        let delay = Duration::from_millis(self.config.debounce_ms);
        let engine = Arc::clone(&self.engine);
        let config = self.config;
        let current = Arc::clone(&self.generation);
        let updates = Arc::clone(&self.updates);

        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Detached so that a later trigger aborting the timer cannot cancel it.
            tokio::spawn(async move {
                debug!(generation, nodes = graph.nodes.len(), "Running layout");
                let render = run_layout(engine.as_ref(), &graph, &config).await;
                let newest = current.load(Ordering::SeqCst);
                if newest != generation {
                    warn!(generation, newest, "Discarding stale layout result");
                    return;
                }
                updates.send_replace(Some(LayoutUpdate {
                    generation,
                    graph: Arc::new(render),
                }));
            });
        }));
        generation
    }

    /// Lay out `graph` immediately, without debouncing or publishing.
    pub async fn compute(&self, graph: &FilteredGraph) -> RenderGraph {
        run_layout(self.engine.as_ref(), graph, &self.config).await
    }
}

impl Drop for LayoutOrchestrator {
    fn drop(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use crate::layout::{HierarchyRequest, LayoutResult, Position};
    use crate::types::HealthMetrics;
    use crate::view::{
        ContainerPayload, GraphNode, NodeKind, NodeVisibility, ViewMode, VisibleNode,
    };
    use async_trait::async_trait;

    fn domains(names: &[&str]) -> FilteredGraph {
        FilteredGraph {
            mode: ViewMode::Architecture,
            focused_node_id: None,
            nodes: names
                .iter()
                .map(|name| VisibleNode {
                    node: GraphNode {
                        id: format!("domain:{name}"),
                        parent_id: None,
                        kind: NodeKind::Domain(ContainerPayload {
                            label: (*name).to_string(),
                            health: HealthMetrics::default(),
                        }),
                    },
                    visibility: NodeVisibility::default(),
                })
                .collect(),
            edges: vec![],
        }
    }

    struct FailingEngine;

    #[async_trait]
    impl LayoutEngine for FailingEngine {
        async fn layout(&self, _request: &HierarchyRequest) -> Result<LayoutResult> {
            Err(Error::Layout("engine unavailable".to_string()))
        }
    }

    /// Takes longer for smaller graphs, so an older request can finish last.
    struct SlowEngine;

    #[async_trait]
    impl LayoutEngine for SlowEngine {
        async fn layout(&self, request: &HierarchyRequest) -> Result<LayoutResult> {
            let millis = if request.roots.len() == 1 { 1_000 } else { 10 };
            tokio::time::sleep(Duration::from_millis(millis)).await;
            LayeredEngine.layout_sync(request)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_triggers_publish_only_the_last_layout() {
        let mut orchestrator = LayoutOrchestrator::with_layered_engine(LayoutConfig::default());
        let mut updates = orchestrator.subscribe();

        orchestrator.schedule(domains(&["a"]));
        tokio::time::sleep(Duration::from_millis(50)).await;
        orchestrator.schedule(domains(&["a", "b"]));
        tokio::time::sleep(Duration::from_millis(50)).await;
        let last = orchestrator.schedule(domains(&["a", "b", "c"]));

        updates.changed().await.unwrap();
        let update = updates.borrow_and_update().clone().unwrap();
        assert_eq!(update.generation, last);
        assert_eq!(update.graph.nodes.len(), 3);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(!updates.has_changed().unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn nothing_is_published_before_the_debounce_window() {
        let mut orchestrator = LayoutOrchestrator::with_layered_engine(LayoutConfig::default());
        orchestrator.schedule(domains(&["a"]));
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(orchestrator.latest().is_none());
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(orchestrator.latest().map(|u| u.generation), Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn stale_in_flight_result_is_discarded() {
        let mut orchestrator = LayoutOrchestrator::new(Arc::new(SlowEngine), LayoutConfig::default());
        let mut updates = orchestrator.subscribe();

        orchestrator.schedule(domains(&["slow"]));
        // Let the first layout start before triggering again.
        tokio::time::sleep(Duration::from_millis(200)).await;
        let newer = orchestrator.schedule(domains(&["x", "y"]));

        updates.changed().await.unwrap();
        assert_eq!(updates.borrow_and_update().as_ref().map(|u| u.generation), Some(newer));

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(!updates.has_changed().unwrap());
        assert_eq!(orchestrator.latest().map(|u| u.generation), Some(newer));
    }

    #[tokio::test(start_paused = true)]
    async fn engine_failure_publishes_pre_layout_graph() {
        let mut orchestrator =
            LayoutOrchestrator::new(Arc::new(FailingEngine), LayoutConfig::default());
        let mut updates = orchestrator.subscribe();
        orchestrator.schedule(domains(&["a", "b"]));

        updates.changed().await.unwrap();
        let update = updates.borrow_and_update().clone().unwrap();
        assert_eq!(update.graph.nodes.len(), 2);
        assert!(update
            .graph
            .nodes
            .iter()
            .all(|n| n.position == Position::default()));
    }

    #[tokio::test]
    async fn compute_runs_without_debounce() {
        let orchestrator = LayoutOrchestrator::with_layered_engine(LayoutConfig::default());
        let render = orchestrator.compute(&domains(&["a", "b"])).await;
        assert_eq!(render.nodes.len(), 2);
        assert!(render.nodes[1].position.x > render.nodes[0].position.x);
    }
}
