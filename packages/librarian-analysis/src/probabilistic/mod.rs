//! Bayesian confidence tracking over entities (spec.md §4.D).
//!
//! `numerics` is kept separate from `beta` so the recovery learner can
//! reuse the Gamma/Beta sampling primitives without depending on the
//! `ConfidenceRecord`-flavored posterior wrapper.

mod aggregate;
mod beta;
pub mod numerics;
mod propagate;
mod uncertainty;

pub use aggregate::{aggregate, aggregate_report};
pub use beta::BetaPosterior;
pub use propagate::{propagate_confidence, DEFAULT_DECAY};
pub use uncertainty::{uncertainty_report, UncertaintyEntry, DEFAULT_OBSERVATION_THRESHOLD};
