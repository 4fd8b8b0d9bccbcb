//! Directed graph abstraction over opaque entity IDs.
//!
//! `GraphModel` is the forward/reverse adjacency pair described in spec.md
//! §3 ("Graph (G, G⁻¹)"). It is deliberately thin: no analysis lives here,
//! only storage and lookup. The deterministic, probabilistic, and hybrid
//! analyzers in `librarian-analysis` consume it.

mod error;
mod model;

pub use error::{GraphError, Result};
pub use model::{EntityId, EntityKind, GraphModel};
