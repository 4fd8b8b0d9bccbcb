use chrono::{DateTime, Utc};
use librarian_graph::{EntityId, EntityKind};
use serde::{Deserialize, Serialize};

/// Persisted Beta-posterior state for one entity (spec.md §3,
/// "ConfidenceRecord").
///
/// Invariants: `alpha, beta >= 1`; `alpha >= prior_alpha`;
/// `beta >= prior_beta`; `observation_count == (alpha - prior_alpha) +
/// (beta - prior_beta)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceRecord {
    pub entity_id: EntityId,
    pub entity_kind: EntityKind,
    pub prior_alpha: f64,
    pub prior_beta: f64,
    pub alpha: f64,
    pub beta: f64,
    pub observation_count: u64,
    pub last_updated: DateTime<Utc>,
}

impl ConfidenceRecord {
    /// A fresh record under the uniform prior Beta(1, 1), spec.md §4.D's
    /// "Model" default.
    pub fn uniform_prior(entity_id: EntityId, entity_kind: EntityKind, now: DateTime<Utc>) -> Self {
        Self {
            entity_id,
            entity_kind,
            prior_alpha: 1.0,
            prior_beta: 1.0,
            alpha: 1.0,
            beta: 1.0,
            observation_count: 0,
            last_updated: now,
        }
    }
}

/// Volatility/change-rate snapshot for one entity (spec.md §3,
/// "StabilityMetrics").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StabilityMetrics {
    pub entity_id: EntityId,
    pub entity_kind: EntityKind,
    /// In `[0, 1]`.
    pub volatility: f64,
    pub last_changed: DateTime<Utc>,
    pub change_count: u32,
}

/// One entity's membership row in a strongly connected component
/// (spec.md §3, "SCCEntry"). Exactly one entry per component has
/// `is_root = true`; all entries of a component share `component_id` and
/// `component_size`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SccEntry {
    pub component_id: String,
    pub entity_id: EntityId,
    pub entity_kind: EntityKind,
    pub is_root: bool,
    pub component_size: usize,
    pub computed_at: DateTime<Utc>,
}

/// Shape of a classified cycle in the dependency graph (spec.md §3,
/// "FeedbackLoop").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopType {
    CircularImport,
    MutualRecursion,
    StateCycle,
    /// Reserved — only emitted when the graph carries data-flow edge
    /// labels, which this core does not currently produce (spec.md §4.E).
    DataFlowCycle,
}

/// Feedback-loop severity ladder (spec.md §4.E, "Severity").
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// A detected cycle in the dependency graph, classified by shape and
/// severity (spec.md §3, "FeedbackLoop"). `cycle_length == entities.len()
/// >= 2`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackLoop {
    pub loop_id: String,
    pub entities: Vec<EntityId>,
    pub loop_type: LoopType,
    pub severity: Severity,
    pub is_stable: bool,
    pub cycle_length: usize,
    pub detected_at: DateTime<Utc>,
}

/// One edge type in a function's control-flow graph (spec.md §3,
/// "BasicBlock & CFGEdge").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CfgEdgeType {
    Sequential,
    BranchTrue,
    BranchFalse,
    LoopBack,
}

/// A basic block within one function's CFG. `start_line <= end_line`;
/// exactly one block per function has `is_entry = true`, at least one has
/// `is_exit = true`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasicBlock {
    pub id: u32,
    pub start_line: u32,
    pub end_line: u32,
    pub is_entry: bool,
    pub is_exit: bool,
    pub statements: Vec<String>,
}

/// An edge between two basic blocks, keyed by `(function_id, from_block,
/// to_block)` in storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CfgEdge {
    pub function_id: EntityId,
    pub from_block: u32,
    pub to_block: u32,
    pub edge_type: CfgEdgeType,
    pub condition: Option<String>,
    /// In `[0, 1]`.
    pub confidence: f64,
}
