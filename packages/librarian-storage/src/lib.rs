//! Narrow persistence contract consumed by the analyzers (spec.md §4.B).
//!
//! This crate specifies only the boundary: the `StorageGateway` trait and
//! its domain models, plus an in-memory reference implementation. The real
//! backing store is an external collaborator (spec.md §1).

mod error;
mod gateway;
mod in_memory;
mod models;

pub use error::{ErrorKind, Result, StorageError};
pub use gateway::StorageGateway;
pub use in_memory::InMemoryStorageGateway;
pub use models::{
    BasicBlock, CfgEdge, CfgEdgeType, ConfidenceRecord, FeedbackLoop, LoopType, SccEntry,
    Severity, StabilityMetrics,
};
