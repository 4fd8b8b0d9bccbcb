use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use librarian_analysis::deterministic::{
    adjacency_stats, build_cfg, reachable_from, scc_entries, shortest_path, tarjan_scc,
    AdjacencyStats, Scc,
};
use librarian_analysis::hybrid::{
    classify_feedback_loops, control_stability, propagate_risk_default, system_health,
    ControlStability, RiskAssessment, SystemHealthReport,
};
use librarian_analysis::probabilistic::{
    aggregate_report, propagate_confidence, uncertainty_report, BetaPosterior, UncertaintyEntry,
    DEFAULT_DECAY,
};
use librarian_graph::{EntityId, EntityKind, GraphModel};
use librarian_recovery::RecoveryLearner;
use librarian_storage::{CfgEdge, ConfidenceRecord, FeedbackLoop, StorageGateway};
use librarian_trace::Tracer;
use parking_lot::RwLock;

use crate::error::{LibrarianError, Result};

/// Wires GraphModel (A), StorageGateway (B), the analyzers (C/D/E),
/// RecoveryLearner (F), and Tracer (G) into one entry point (spec.md §2's
/// pipeline). Every method that suspends goes through `storage`; every
/// other computation is synchronous and traced.
pub struct LibrarianCore {
    graph: RwLock<GraphModel>,
    storage: Arc<dyn StorageGateway>,
    tracer: Tracer,
    learner: RecoveryLearner,
}

impl LibrarianCore {
    pub fn new(storage: Arc<dyn StorageGateway>, tracer: Tracer) -> Self {
        Self {
            graph: RwLock::new(GraphModel::default()),
            storage,
            tracer,
            learner: RecoveryLearner::new(Utc::now()),
        }
    }

    pub fn tracer(&self) -> &Tracer {
        &self.tracer
    }

    pub fn learner(&self) -> &RecoveryLearner {
        &self.learner
    }

    /// Replace the in-memory graph snapshot (spec.md §4.A: construction is
    /// batch-only — the indexer that produces node/edge lists is an
    /// external collaborator outside this crate's scope).
    pub fn set_graph(&self, graph: GraphModel) {
        *self.graph.write() = graph;
    }

    pub fn graph(&self) -> GraphModel {
        self.graph.read().clone()
    }

    fn storage_err(&self, err: librarian_storage::StorageError) -> LibrarianError {
        let built = LibrarianError::from_storage(err, Utc::now());
        tracing::warn!(code = built.code.as_str(), message = %built.message, "storage operation failed");
        built
    }

    // ---- C. Deterministic ----------------------------------------------

    pub fn scc_components(&self) -> Vec<Scc> {
        let span = self.tracer.start_span("analysis.scc", None, None);
        let result = tarjan_scc(&self.graph.read());
        self.tracer.end_span(&span);
        result
    }

    pub async fn persist_scc(&self, kind: EntityKind) -> Result<()> {
        let span = self.tracer.start_span("analysis.scc.persist", None, None);
        let sccs = self.scc_components();
        let entries = scc_entries(&sccs, kind, Utc::now());
        let result = self
            .storage
            .upsert_scc_entries(entries)
            .await
            .map_err(|e| self.storage_err(e));
        self.tracer.end_span(&span);
        result
    }

    pub fn reachable_from(&self, source: &EntityId) -> std::collections::BTreeSet<EntityId> {
        reachable_from(&self.graph.read(), source)
    }

    pub fn shortest_path(&self, source: &EntityId, target: &EntityId) -> Option<Vec<EntityId>> {
        shortest_path(&self.graph.read(), source, target)
    }

    pub fn adjacency_stats(&self) -> AdjacencyStats {
        adjacency_stats(&self.graph.read())
    }

    pub async fn build_and_persist_cfg(
        &self,
        function_id: &EntityId,
        start_line: u32,
        end_line: u32,
        source: &str,
    ) -> Result<Vec<CfgEdge>> {
        let span = self.tracer.start_span("analysis.cfg", None, None);
        let (_blocks, edges) = build_cfg(function_id, start_line, end_line, source);
        let result = self
            .storage
            .upsert_cfg_edges(edges.clone())
            .await
            .map(|_| edges)
            .map_err(|e| self.storage_err(e));
        self.tracer.end_span(&span);
        result
    }

    // ---- D. Probabilistic ----------------------------------------------

    pub async fn record_confidence_observations(
        &self,
        entity_id: &EntityId,
        entity_kind: EntityKind,
        successes: f64,
        failures: f64,
    ) -> Result<ConfidenceRecord> {
        let span = self.tracer.start_span("analysis.confidence.update", None, None);
        let now = Utc::now();
        let existing = self
            .storage
            .get_bayesian_confidence(entity_id, entity_kind)
            .await
            .map_err(|e| self.storage_err(e))?;
        let record = existing.unwrap_or_else(|| ConfidenceRecord::uniform_prior(entity_id.clone(), entity_kind, now));
        let posterior = BetaPosterior::from_record(&record)
            .record_observations(successes, failures)
            .map_err(|e| LibrarianError::from_analysis(e, now))?;
        let updated = posterior.into_record(&record, now);
        let result = self
            .storage
            .upsert_bayesian_confidence(updated.clone())
            .await
            .map(|_| updated)
            .map_err(|e| self.storage_err(e));
        self.tracer.end_span(&span);
        result
    }

    pub async fn confidence_means(
        &self,
        entity_kind: EntityKind,
    ) -> Result<HashMap<EntityId, f64>> {
        Ok(self
            .confidence_posteriors(entity_kind)
            .await?
            .into_iter()
            .map(|(id, p)| (id, p.mean()))
            .collect())
    }

    /// Every entity's full posterior (not just its mean), for callers that
    /// need to pool across entities rather than average per-entity point
    /// estimates (spec.md §4.E, "System-health report").
    pub async fn confidence_posteriors(
        &self,
        entity_kind: EntityKind,
    ) -> Result<HashMap<EntityId, BetaPosterior>> {
        let mut posteriors = HashMap::new();
        for id in self.graph.read().nodes().cloned().collect::<Vec<_>>() {
            if let Some(record) = self
                .storage
                .get_bayesian_confidence(&id, entity_kind)
                .await
                .map_err(|e| self.storage_err(e))?
            {
                posteriors.insert(id, BetaPosterior::from_record(&record));
            }
        }
        Ok(posteriors)
    }

    pub fn propagate_confidence(&self, means: &HashMap<EntityId, f64>, decay: f64) -> HashMap<EntityId, f64> {
        propagate_confidence(&self.graph.read(), means, decay)
    }

    pub fn aggregate_confidence(&self, posteriors: &[BetaPosterior]) -> Option<(f64, (f64, f64))> {
        aggregate_report(posteriors)
    }

    pub fn uncertainty_report(
        &self,
        entries: &[(EntityId, BetaPosterior, u64)],
        threshold: u64,
    ) -> Vec<UncertaintyEntry> {
        uncertainty_report(entries, threshold)
    }

    // ---- E. Hybrid -------------------------------------------------------

    pub fn feedback_loops(&self, mean_confidence: &HashMap<EntityId, f64>) -> Vec<FeedbackLoop> {
        let span = self.tracer.start_span("analysis.feedback_loops", None, None);
        let graph = self.graph.read();
        let sccs = tarjan_scc(&graph);
        let result = classify_feedback_loops(&graph, &sccs, mean_confidence, Utc::now());
        self.tracer.end_span(&span);
        result
    }

    pub fn control_stability(
        &self,
        mean_confidence: &HashMap<EntityId, f64>,
        volatility: &HashMap<EntityId, f64>,
        loops: &[FeedbackLoop],
    ) -> ControlStability {
        control_stability(&self.graph.read(), mean_confidence, volatility, loops)
    }

    pub fn system_health(
        &self,
        posteriors: &HashMap<EntityId, BetaPosterior>,
        stability: ControlStability,
        loops: &[FeedbackLoop],
    ) -> SystemHealthReport {
        system_health(&self.graph.read(), posteriors, stability, loops)
    }

    pub fn risk_assessment(&self, mean_confidence: &HashMap<EntityId, f64>) -> Vec<RiskAssessment> {
        propagate_risk_default(&self.graph.read(), mean_confidence)
    }

    /// The default decay used by both D's confidence propagation and E's
    /// risk propagation (spec.md §4.D/§4.E).
    pub fn default_decay(&self) -> f64 {
        DEFAULT_DECAY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use librarian_storage::InMemoryStorageGateway;

    fn eid(s: &str) -> EntityId {
        EntityId::new(s)
    }

    fn core() -> LibrarianCore {
        LibrarianCore::new(Arc::new(InMemoryStorageGateway::new()), Tracer::new())
    }

    #[test]
    fn scc_components_reflects_current_graph() {
        let core = core();
        core.set_graph(GraphModel::build(
            vec![eid("a"), eid("b")],
            vec![(eid("a"), eid("b")), (eid("b"), eid("a"))],
        ));
        let sccs = core.scc_components();
        assert_eq!(sccs.len(), 1);
        assert_eq!(sccs[0].size(), 2);
    }

    #[tokio::test]
    async fn record_confidence_observations_persists_through_storage() {
        let core = core();
        core.set_graph(GraphModel::build(vec![eid("a")], vec![]));
        let updated = core
            .record_confidence_observations(&eid("a"), EntityKind::Module, 8.0, 2.0)
            .await
            .unwrap();
        assert_eq!(updated.alpha, 9.0);
        assert_eq!(updated.beta, 3.0);
        assert_eq!(updated.observation_count, 10);
    }

    #[tokio::test]
    async fn risk_propagation_matches_worked_example() {
        let core = core();
        core.set_graph(GraphModel::build(
            vec![eid("x"), eid("y")],
            vec![(eid("x"), eid("y"))],
        ));
        let mut means = HashMap::new();
        means.insert(eid("x"), 0.9);
        means.insert(eid("y"), 0.3);
        let assessments = core.risk_assessment(&means);
        let x = assessments.iter().find(|a| a.entity_id == eid("x")).unwrap();
        assert!((x.propagated_risk - 0.49).abs() < 1e-9);
    }
}
