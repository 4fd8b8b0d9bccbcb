use async_trait::async_trait;
use librarian_graph::{EntityId, EntityKind};

use crate::error::Result;
use crate::models::{CfgEdge, CfgEdgeType, ConfidenceRecord, FeedbackLoop, SccEntry, StabilityMetrics};

/// The complete boundary between the analytical core and persistence
/// (spec.md §4.B). Every method must be idempotent and total on repeat
/// invocation with identical inputs — callers are free to retry blindly.
///
/// Only storage operations may suspend (spec.md §5); everything else in the
/// core is synchronous, which is why this is the one `#[async_trait]` in
/// the workspace, mirroring `codegraph_storage::domain::CodeSnapshotStore`.
#[async_trait]
pub trait StorageGateway: Send + Sync {
    async fn get_bayesian_confidence(
        &self,
        id: &EntityId,
        kind: EntityKind,
    ) -> Result<Option<ConfidenceRecord>>;

    async fn upsert_bayesian_confidence(&self, record: ConfidenceRecord) -> Result<()>;

    async fn get_stability_metrics(
        &self,
        id: &EntityId,
        kind: EntityKind,
    ) -> Result<Option<StabilityMetrics>>;

    async fn upsert_stability_metrics(&self, record: StabilityMetrics) -> Result<()>;

    /// Replaces all prior entries sharing each represented entity kind,
    /// atomically (spec.md §4.B).
    async fn upsert_scc_entries(&self, entries: Vec<SccEntry>) -> Result<()>;

    /// Keyed by `(function_id, from_block, to_block)`.
    async fn upsert_cfg_edges(&self, edges: Vec<CfgEdge>) -> Result<()>;

    async fn get_cfg_edges(
        &self,
        function_id: &EntityId,
        edge_types: Option<&[CfgEdgeType]>,
    ) -> Result<Vec<CfgEdge>>;

    /// Keyed by `loop_id`.
    async fn upsert_feedback_loop(&self, loop_: FeedbackLoop) -> Result<()>;

    async fn get_feedback_loops(&self) -> Result<Vec<FeedbackLoop>>;

    async fn get_scc_entries(&self, kind: Option<EntityKind>) -> Result<Vec<SccEntry>>;
}
