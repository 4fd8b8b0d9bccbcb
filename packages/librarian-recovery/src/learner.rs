use std::collections::HashMap;

use chrono::{DateTime, Utc};
use librarian_analysis::probabilistic::numerics::{inverse_regularized_incomplete_beta, sample_beta};
use parking_lot::RwLock;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::error::{RecoveryError, Result};
use crate::model::{classify_anti_pattern, AntiPattern, StrategyStats, MIN_EXPLORATION_RATE};

fn stats_key(strategy: &str, degradation_type: &str) -> String {
    format!("{strategy}::{degradation_type}")
}

/// A single recorded recovery outcome (spec.md §4.F, "recordOutcome").
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub strategy: String,
    pub degradation_type: String,
    pub success: bool,
    pub fitness_delta: f64,
    pub timestamp: Option<DateTime<Utc>>,
}

/// Thompson-sampling strategy selector with anti-pattern avoidance
/// (spec.md §4.F). Internally synchronized so `recordOutcome` and
/// `selectStrategy` may be called concurrently from multiple producers,
/// per spec.md §5's "Shared state" note on the learner's stats map.
pub struct RecoveryLearner {
    stats: RwLock<HashMap<String, StrategyStats>>,
    rng: RwLock<StdRng>,
    created_at: DateTime<Utc>,
}

impl RecoveryLearner {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            stats: RwLock::new(HashMap::new()),
            rng: RwLock::new(StdRng::from_entropy()),
            created_at: now,
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn record_outcome(&self, outcome: Outcome) {
        let now = outcome.timestamp.unwrap_or_else(Utc::now);
        let key = stats_key(&outcome.strategy, &outcome.degradation_type);
        let mut stats = self.stats.write();
        let entry = stats
            .entry(key)
            .or_insert_with(|| StrategyStats::new(outcome.strategy, outcome.degradation_type, now));
        entry.record_outcome(outcome.success, outcome.fitness_delta, now);
    }

    /// Select a strategy for `degradation_type` from `candidates` via
    /// Thompson sampling (spec.md §4.F, "selectStrategy").
    pub fn select_strategy(&self, degradation_type: &str, candidates: &[String]) -> Result<String> {
        if candidates.is_empty() {
            return Err(RecoveryError::NoStrategy);
        }
        if candidates.len() == 1 {
            return Ok(candidates[0].clone());
        }

        let stats = self.stats.read();
        let mut rng = self.rng.write();

        let mut best: Option<(String, f64)> = None;
        for candidate in candidates {
            let key = stats_key(candidate, degradation_type);
            let entry = stats.get(&key);
            let posterior = entry.map(StrategyStats::posterior).unwrap_or(
                librarian_analysis::probabilistic::BetaPosterior::UNIFORM_PRIOR,
            );

            let mut theta_hat = sample_beta(posterior.alpha, posterior.beta, &mut *rng);

            let is_anti_pattern = entry
                .and_then(classify_anti_pattern)
                .is_some();
            if is_anti_pattern {
                theta_hat *= crate::model::ANTI_PATTERN_PENALTY;
            }

            let total_trials = entry.map(StrategyStats::total_trials).unwrap_or(0);
            if total_trials == 0 {
                theta_hat = theta_hat.max(MIN_EXPLORATION_RATE);
            }

            match &best {
                Some((_, best_theta)) if *best_theta >= theta_hat => {}
                _ => best = Some((candidate.clone(), theta_hat)),
            }
        }

        Ok(best.expect("candidates is non-empty").0)
    }

    /// Posterior mean success probability for `(strategy, degradationType)`
    /// (spec.md §4.F, "Posterior queries").
    pub fn success_probability(&self, strategy: &str, degradation_type: &str) -> f64 {
        self.posterior_for(strategy, degradation_type).mean()
    }

    /// 95% credible interval via the Newton-Raphson quantile (spec.md §4.F,
    /// "Posterior queries").
    pub fn confidence_interval(&self, strategy: &str, degradation_type: &str) -> (f64, f64) {
        let posterior = self.posterior_for(strategy, degradation_type);
        let lo = inverse_regularized_incomplete_beta(0.025, posterior.alpha, posterior.beta);
        let hi = inverse_regularized_incomplete_beta(0.975, posterior.alpha, posterior.beta);
        (lo, hi)
    }

    fn posterior_for(
        &self,
        strategy: &str,
        degradation_type: &str,
    ) -> librarian_analysis::probabilistic::BetaPosterior {
        let stats = self.stats.read();
        stats
            .get(&stats_key(strategy, degradation_type))
            .map(StrategyStats::posterior)
            .unwrap_or(librarian_analysis::probabilistic::BetaPosterior::UNIFORM_PRIOR)
    }

    /// Scan all tracked stats for anti-patterns (spec.md §4.F,
    /// "Anti-patterns"): `totalTrials >= 10`, failure rate thresholds
    /// 0.6/0.8.
    pub fn anti_patterns(&self) -> Vec<AntiPattern> {
        let stats = self.stats.read();
        let mut patterns: Vec<AntiPattern> = stats.values().filter_map(classify_anti_pattern).collect();
        patterns.sort_by(|a, b| {
            a.strategy
                .cmp(&b.strategy)
                .then_with(|| a.degradation_type.cmp(&b.degradation_type))
        });
        patterns
    }

    pub fn stats_snapshot(&self) -> HashMap<String, StrategyStats> {
        self.stats.read().clone()
    }

    pub fn restore_stats(&self, stats: HashMap<String, StrategyStats>) {
        *self.stats.write() = stats;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_candidates_is_enostrategy() {
        let learner = RecoveryLearner::new(Utc::now());
        let err = learner.select_strategy("timeout", &[]);
        assert!(matches!(err, Err(RecoveryError::NoStrategy)));
    }

    #[test]
    fn single_candidate_short_circuits() {
        let learner = RecoveryLearner::new(Utc::now());
        let result = learner
            .select_strategy("timeout", &["retry".to_string()])
            .unwrap();
        assert_eq!(result, "retry");
    }

    #[test]
    fn record_outcome_updates_success_probability() {
        let learner = RecoveryLearner::new(Utc::now());
        for _ in 0..8 {
            learner.record_outcome(Outcome {
                strategy: "retry".into(),
                degradation_type: "timeout".into(),
                success: true,
                fitness_delta: 0.1,
                timestamp: None,
            });
        }
        for _ in 0..2 {
            learner.record_outcome(Outcome {
                strategy: "retry".into(),
                degradation_type: "timeout".into(),
                success: false,
                fitness_delta: -0.1,
                timestamp: None,
            });
        }
        let p = learner.success_probability("retry", "timeout");
        assert!((p - 0.75).abs() < 1e-9);
    }

    #[test]
    fn thompson_sampling_converges_to_better_strategy() {
        let learner = RecoveryLearner::new(Utc::now());
        let mut rng = rand::rngs::StdRng::seed_from_u64(123);
        for _ in 0..1000 {
            let outcome_s1 = rand::Rng::gen_bool(&mut rng, 0.8);
            learner.record_outcome(Outcome {
                strategy: "s1".into(),
                degradation_type: "x".into(),
                success: outcome_s1,
                fitness_delta: if outcome_s1 { 1.0 } else { -1.0 },
                timestamp: None,
            });
            let outcome_s2 = rand::Rng::gen_bool(&mut rng, 0.2);
            learner.record_outcome(Outcome {
                strategy: "s2".into(),
                degradation_type: "x".into(),
                success: outcome_s2,
                fitness_delta: if outcome_s2 { 1.0 } else { -1.0 },
                timestamp: None,
            });
        }

        let candidates = vec!["s1".to_string(), "s2".to_string()];
        let mut s1_wins = 0;
        for _ in 0..200 {
            if learner.select_strategy("x", &candidates).unwrap() == "s1" {
                s1_wins += 1;
            }
        }
        assert!(s1_wins as f64 / 200.0 >= 0.85);
    }

    #[test]
    fn anti_pattern_strategy_is_suppressed_in_selection() {
        let learner = RecoveryLearner::new(Utc::now());
        for _ in 0..9 {
            learner.record_outcome(Outcome {
                strategy: "bad".into(),
                degradation_type: "x".into(),
                success: false,
                fitness_delta: -1.0,
                timestamp: None,
            });
        }
        learner.record_outcome(Outcome {
            strategy: "bad".into(),
            degradation_type: "x".into(),
            success: true,
            fitness_delta: 0.1,
            timestamp: None,
        });
        for _ in 0..10 {
            learner.record_outcome(Outcome {
                strategy: "good".into(),
                degradation_type: "x".into(),
                success: true,
                fitness_delta: 1.0,
                timestamp: None,
            });
        }

        let candidates = vec!["bad".to_string(), "good".to_string()];
        let mut good_wins = 0;
        for _ in 0..50 {
            if learner.select_strategy("x", &candidates).unwrap() == "good" {
                good_wins += 1;
            }
        }
        assert!(good_wins >= 45);
    }
}
