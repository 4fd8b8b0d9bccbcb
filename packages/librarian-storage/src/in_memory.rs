use std::collections::HashMap;

use async_trait::async_trait;
use librarian_graph::{EntityId, EntityKind};
use parking_lot::RwLock;

use crate::error::Result;
use crate::gateway::StorageGateway;
use crate::models::{CfgEdge, CfgEdgeType, ConfidenceRecord, FeedbackLoop, SccEntry, StabilityMetrics};

#[derive(Default)]
struct Tables {
    confidence: HashMap<(EntityId, EntityKind), ConfidenceRecord>,
    stability: HashMap<(EntityId, EntityKind), StabilityMetrics>,
    scc_entries: HashMap<(String, EntityId, EntityKind), SccEntry>,
    cfg_edges: HashMap<(EntityId, u32, u32), CfgEdge>,
    feedback_loops: HashMap<String, FeedbackLoop>,
}

/// Reference [`StorageGateway`] implementation backed by in-process maps.
///
/// The real backing store (SQLite, Postgres, …) is out of scope for this
/// core (spec.md §1) — this adapter exists so the analyzers and their tests
/// have a concrete, contract-compliant store to run against, the same role
/// a placeholder adapter plays against a port trait in the teacher's
/// storage layer.
pub struct InMemoryStorageGateway {
    tables: RwLock<Tables>,
}

impl InMemoryStorageGateway {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
        }
    }
}

impl Default for InMemoryStorageGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageGateway for InMemoryStorageGateway {
    async fn get_bayesian_confidence(
        &self,
        id: &EntityId,
        kind: EntityKind,
    ) -> Result<Option<ConfidenceRecord>> {
        Ok(self
            .tables
            .read()
            .confidence
            .get(&(id.clone(), kind))
            .cloned())
    }

    async fn upsert_bayesian_confidence(&self, record: ConfidenceRecord) -> Result<()> {
        let key = (record.entity_id.clone(), record.entity_kind);
        self.tables.write().confidence.insert(key, record);
        Ok(())
    }

    async fn get_stability_metrics(
        &self,
        id: &EntityId,
        kind: EntityKind,
    ) -> Result<Option<StabilityMetrics>> {
        Ok(self
            .tables
            .read()
            .stability
            .get(&(id.clone(), kind))
            .cloned())
    }

    async fn upsert_stability_metrics(&self, record: StabilityMetrics) -> Result<()> {
        let key = (record.entity_id.clone(), record.entity_kind);
        self.tables.write().stability.insert(key, record);
        Ok(())
    }

    async fn upsert_scc_entries(&self, entries: Vec<SccEntry>) -> Result<()> {
        let mut tables = self.tables.write();
        let kinds: std::collections::HashSet<EntityKind> =
            entries.iter().map(|e| e.entity_kind).collect();
        tables
            .scc_entries
            .retain(|(_, _, kind), _| !kinds.contains(kind));
        for entry in entries {
            let key = (
                entry.component_id.clone(),
                entry.entity_id.clone(),
                entry.entity_kind,
            );
            tables.scc_entries.insert(key, entry);
        }
        Ok(())
    }

    async fn upsert_cfg_edges(&self, edges: Vec<CfgEdge>) -> Result<()> {
        let mut tables = self.tables.write();
        for edge in edges {
            let key = (edge.function_id.clone(), edge.from_block, edge.to_block);
            tables.cfg_edges.insert(key, edge);
        }
        Ok(())
    }

    async fn get_cfg_edges(
        &self,
        function_id: &EntityId,
        edge_types: Option<&[CfgEdgeType]>,
    ) -> Result<Vec<CfgEdge>> {
        let tables = self.tables.read();
        Ok(tables
            .cfg_edges
            .values()
            .filter(|e| &e.function_id == function_id)
            .filter(|e| {
                edge_types
                    .map(|types| types.contains(&e.edge_type))
                    .unwrap_or(true)
            })
            .cloned()
            .collect())
    }

    async fn upsert_feedback_loop(&self, loop_: FeedbackLoop) -> Result<()> {
        self.tables
            .write()
            .feedback_loops
            .insert(loop_.loop_id.clone(), loop_);
        Ok(())
    }

    async fn get_feedback_loops(&self) -> Result<Vec<FeedbackLoop>> {
        Ok(self.tables.read().feedback_loops.values().cloned().collect())
    }

    async fn get_scc_entries(&self, kind: Option<EntityKind>) -> Result<Vec<SccEntry>> {
        let tables = self.tables.read();
        Ok(tables
            .scc_entries
            .values()
            .filter(|e| kind.map(|k| e.entity_kind == k).unwrap_or(true))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn upsert_is_idempotent() {
        let gw = InMemoryStorageGateway::new();
        let id = EntityId::new("fn_a");
        let record = ConfidenceRecord::uniform_prior(id.clone(), EntityKind::Function, Utc::now());
        gw.upsert_bayesian_confidence(record.clone()).await.unwrap();
        gw.upsert_bayesian_confidence(record.clone()).await.unwrap();

        let fetched = gw
            .get_bayesian_confidence(&id, EntityKind::Function)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched.observation_count, 0);
    }

    #[tokio::test]
    async fn scc_upsert_replaces_prior_entries_of_same_kind() {
        let gw = InMemoryStorageGateway::new();
        let now = Utc::now();
        let old = SccEntry {
            component_id: "c1".into(),
            entity_id: EntityId::new("a"),
            entity_kind: EntityKind::Function,
            is_root: true,
            component_size: 1,
            computed_at: now,
        };
        gw.upsert_scc_entries(vec![old]).await.unwrap();

        let new = SccEntry {
            component_id: "c2".into(),
            entity_id: EntityId::new("b"),
            entity_kind: EntityKind::Function,
            is_root: true,
            component_size: 1,
            computed_at: now,
        };
        gw.upsert_scc_entries(vec![new]).await.unwrap();

        let entries = gw.get_scc_entries(Some(EntityKind::Function)).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].component_id, "c2");
    }
}
