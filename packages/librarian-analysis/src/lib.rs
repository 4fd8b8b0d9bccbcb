//! Deterministic, probabilistic, and hybrid analyses over a dependency
//! graph (spec.md §4).

pub mod deterministic;
mod error;
pub mod hybrid;
pub mod probabilistic;

pub use error::{AnalysisError, Result};
