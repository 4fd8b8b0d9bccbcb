use chrono::{DateTime, Utc};
use librarian_storage::ConfidenceRecord;

use super::numerics::inverse_regularized_incomplete_beta;
use crate::{AnalysisError, Result};

/// A Beta(alpha, beta) posterior over one entity's confidence, with the
/// point estimates and update rule from spec.md §4.D ("Model", "Point
/// estimates", "Observations").
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BetaPosterior {
    pub alpha: f64,
    pub beta: f64,
}

impl BetaPosterior {
    pub const UNIFORM_PRIOR: BetaPosterior = BetaPosterior {
        alpha: 1.0,
        beta: 1.0,
    };

    pub fn from_record(record: &ConfidenceRecord) -> Self {
        Self {
            alpha: record.alpha,
            beta: record.beta,
        }
    }

    /// Posterior mean `alpha / (alpha + beta)`.
    pub fn mean(&self) -> f64 {
        self.alpha / (self.alpha + self.beta)
    }

    /// Posterior variance `alpha*beta / ((alpha+beta)^2 * (alpha+beta+1))`.
    pub fn variance(&self) -> f64 {
        let sum = self.alpha + self.beta;
        (self.alpha * self.beta) / (sum * sum * (sum + 1.0))
    }

    /// A `(1 - alpha_level)` credible interval, e.g. `alpha_level = 0.05`
    /// for the 95% interval (spec.md §4.D, "Point estimates").
    pub fn credible_interval(&self, confidence_level: f64) -> (f64, f64) {
        let tail = (1.0 - confidence_level) / 2.0;
        let lo = inverse_regularized_incomplete_beta(tail, self.alpha, self.beta);
        let hi = inverse_regularized_incomplete_beta(1.0 - tail, self.alpha, self.beta);
        (lo, hi)
    }

    /// Fold `successes` and `failures` observations into the posterior
    /// (spec.md §4.D, "Observations"): `alpha += successes`, `beta +=
    /// failures`. Rejects negative counts.
    pub fn record_observations(&self, successes: f64, failures: f64) -> Result<Self> {
        if successes < 0.0 || failures < 0.0 {
            return Err(AnalysisError::InvalidArgument(format!(
                "observation counts must be non-negative, got successes={successes}, failures={failures}"
            )));
        }
        Ok(Self {
            alpha: self.alpha + successes,
            beta: self.beta + failures,
        })
    }

    pub fn observation_count(&self) -> f64 {
        (self.alpha - 1.0) + (self.beta - 1.0)
    }

    pub fn into_record(
        self,
        record: &ConfidenceRecord,
        now: DateTime<Utc>,
    ) -> ConfidenceRecord {
        let observation_count =
            ((self.alpha - record.prior_alpha) + (self.beta - record.prior_beta)).round() as u64;
        ConfidenceRecord {
            entity_id: record.entity_id.clone(),
            entity_kind: record.entity_kind,
            prior_alpha: record.prior_alpha,
            prior_beta: record.prior_beta,
            alpha: self.alpha,
            beta: self.beta,
            observation_count,
            last_updated: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_prior_has_mean_half() {
        assert_eq!(BetaPosterior::UNIFORM_PRIOR.mean(), 0.5);
    }

    #[test]
    fn worked_example_matches_spec_scenario() {
        // alpha=beta=1 -> record 8 successes, 2 failures -> (9, 3),
        // mean 0.75, variance ~= 0.01442 (spec.md §8, scenario 3).
        let updated = BetaPosterior::UNIFORM_PRIOR
            .record_observations(8.0, 2.0)
            .unwrap();
        assert_eq!(updated.alpha, 9.0);
        assert_eq!(updated.beta, 3.0);
        assert!((updated.mean() - 0.75).abs() < 1e-9);
        assert!((updated.variance() - 0.014423).abs() < 1e-4);
    }

    #[test]
    fn rejects_negative_observations() {
        let err = BetaPosterior::UNIFORM_PRIOR.record_observations(-1.0, 0.0);
        assert!(err.is_err());
    }

    #[test]
    fn credible_interval_widens_with_fewer_observations() {
        let narrow = BetaPosterior {
            alpha: 90.0,
            beta: 10.0,
        };
        let wide = BetaPosterior {
            alpha: 9.0,
            beta: 1.0,
        };
        let (nlo, nhi) = narrow.credible_interval(0.95);
        let (wlo, whi) = wide.credible_interval(0.95);
        assert!(nhi - nlo < whi - wlo);
    }
}
