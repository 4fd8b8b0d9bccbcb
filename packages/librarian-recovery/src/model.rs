use chrono::{DateTime, Utc};
use librarian_analysis::probabilistic::BetaPosterior;
use serde::{Deserialize, Serialize};

/// Outcome tally for one `(strategy, degradationType)` pair (spec.md §4.F,
/// "State"). The Beta posterior is derived from `successes`/`failures`
/// under the uniform prior α₀=β₀=1 rather than stored redundantly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyStats {
    pub strategy: String,
    pub degradation_type: String,
    pub successes: u64,
    pub failures: u64,
    pub total_fitness_delta: f64,
    pub mean_fitness_delta: f64,
    pub last_updated: DateTime<Utc>,
}

impl StrategyStats {
    pub fn new(strategy: impl Into<String>, degradation_type: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            strategy: strategy.into(),
            degradation_type: degradation_type.into(),
            successes: 0,
            failures: 0,
            total_fitness_delta: 0.0,
            mean_fitness_delta: 0.0,
            last_updated: now,
        }
    }

    pub fn total_trials(&self) -> u64 {
        self.successes + self.failures
    }

    pub fn failure_rate(&self) -> f64 {
        let total = self.total_trials();
        if total == 0 {
            0.0
        } else {
            self.failures as f64 / total as f64
        }
    }

    pub fn posterior(&self) -> BetaPosterior {
        BetaPosterior {
            alpha: 1.0 + self.successes as f64,
            beta: 1.0 + self.failures as f64,
        }
    }

    pub fn record_outcome(&mut self, success: bool, fitness_delta: f64, now: DateTime<Utc>) {
        if success {
            self.successes += 1;
        } else {
            self.failures += 1;
        }
        self.total_fitness_delta += fitness_delta;
        self.mean_fitness_delta = self.total_fitness_delta / self.total_trials() as f64;
        self.last_updated = now;
    }
}

/// Anti-pattern scan thresholds (spec.md §4.F, "State" and "Anti-patterns").
pub const ANTI_PATTERN_MIN_SAMPLES: u64 = 10;
pub const ANTI_PATTERN_AVOID_THRESHOLD: f64 = 0.8;
pub const ANTI_PATTERN_CAUTION_THRESHOLD: f64 = 0.6;
/// Multiplier applied to a candidate's sampled θ̂ when it is an anti-pattern
/// under current stats (spec.md §4.F, "selectStrategy" step 4).
pub const ANTI_PATTERN_PENALTY: f64 = 0.1;
/// Floor lifted to when a candidate has no trials yet (spec.md §4.F,
/// "selectStrategy" step 5).
pub const MIN_EXPLORATION_RATE: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AntiPatternRecommendation {
    Caution,
    Avoid,
}

/// One flagged `(strategy, degradationType)` pair (spec.md §4.F,
/// "Anti-patterns").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AntiPattern {
    pub strategy: String,
    pub degradation_type: String,
    pub failure_rate: f64,
    pub sample_size: u64,
    pub recommendation: AntiPatternRecommendation,
}

/// Classify a [`StrategyStats`] row as an anti-pattern, if its sample
/// size and failure rate clear the thresholds.
pub fn classify_anti_pattern(stats: &StrategyStats) -> Option<AntiPattern> {
    let total = stats.total_trials();
    if total < ANTI_PATTERN_MIN_SAMPLES {
        return None;
    }
    let failure_rate = stats.failure_rate();
    let recommendation = if failure_rate >= ANTI_PATTERN_AVOID_THRESHOLD {
        AntiPatternRecommendation::Avoid
    } else if failure_rate >= ANTI_PATTERN_CAUTION_THRESHOLD {
        AntiPatternRecommendation::Caution
    } else {
        return None;
    };
    Some(AntiPattern {
        strategy: stats.strategy.clone(),
        degradation_type: stats.degradation_type.clone(),
        failure_rate,
        sample_size: total,
        recommendation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn below_min_samples_is_never_an_anti_pattern() {
        let mut stats = StrategyStats::new("retry", "timeout", Utc::now());
        for _ in 0..9 {
            stats.record_outcome(false, -0.1, Utc::now());
        }
        assert!(classify_anti_pattern(&stats).is_none());
    }

    #[test]
    fn high_failure_rate_at_threshold_is_avoid() {
        let mut stats = StrategyStats::new("retry", "timeout", Utc::now());
        for _ in 0..9 {
            stats.record_outcome(false, -0.1, Utc::now());
        }
        stats.record_outcome(true, 0.1, Utc::now());
        let pattern = classify_anti_pattern(&stats).unwrap();
        assert_eq!(pattern.recommendation, AntiPatternRecommendation::Avoid);
    }
}
