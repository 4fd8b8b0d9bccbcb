use chrono::Utc;
use librarian_analysis::probabilistic::BetaPosterior;
use librarian_graph::{EntityId, EntityKind};
use librarian_storage::ConfidenceRecord;
use proptest::prelude::*;

proptest! {
    /// Credible interval `[lo, hi]` for Beta(a, b) satisfies
    /// `0 < lo <= mean <= hi < 1` (spec.md §8, "Invariants").
    #[test]
    fn credible_interval_brackets_mean(
        alpha in 1.0f64..200.0,
        beta in 1.0f64..200.0,
    ) {
        let posterior = BetaPosterior { alpha, beta };
        let mean = posterior.mean();
        let (lo, hi) = posterior.credible_interval(0.95);

        prop_assert!(lo > 0.0);
        prop_assert!(hi < 1.0);
        prop_assert!(lo <= mean + 1e-9);
        prop_assert!(hi >= mean - 1e-9);
    }

    /// Recording k successes and m failures moves the posterior to exactly
    /// `(alpha + k, beta + m)` with observation count `k + m` (spec.md §8,
    /// "Invariants").
    #[test]
    fn observations_update_posterior_exactly(
        alpha in 1.0f64..50.0,
        beta in 1.0f64..50.0,
        successes in 0.0f64..50.0,
        failures in 0.0f64..50.0,
    ) {
        let posterior = BetaPosterior { alpha, beta };
        let updated = posterior.record_observations(successes, failures).unwrap();
        prop_assert!((updated.alpha - (alpha + successes)).abs() < 1e-9);
        prop_assert!((updated.beta - (beta + failures)).abs() < 1e-9);

        let record = ConfidenceRecord {
            entity_id: EntityId::new("e"),
            entity_kind: EntityKind::Module,
            prior_alpha: alpha,
            prior_beta: beta,
            alpha,
            beta,
            observation_count: 0,
            last_updated: Utc::now(),
        };
        let persisted = updated.into_record(&record, Utc::now());
        prop_assert_eq!(persisted.observation_count, (successes + failures).round() as u64);
    }
}
