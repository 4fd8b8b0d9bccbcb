//! Thompson-sampling strategy selection over recovery outcomes, sharing
//! its Bayesian primitives with the probabilistic analyzer (spec.md §4.F).

mod error;
mod learner;
mod model;
mod persistence;

pub use error::{RecoveryError, Result};
pub use learner::{Outcome, RecoveryLearner};
pub use model::{
    classify_anti_pattern, AntiPattern, AntiPatternRecommendation, StrategyStats,
    ANTI_PATTERN_AVOID_THRESHOLD, ANTI_PATTERN_CAUTION_THRESHOLD, ANTI_PATTERN_MIN_SAMPLES,
    ANTI_PATTERN_PENALTY, MIN_EXPLORATION_RATE,
};
pub use persistence::{load_from_file, restore, save_to_file, serialize, LearnerStateV1, LEARNER_STATE_VERSION};
