use super::beta::BetaPosterior;

/// Pool several posteriors by summing α's and β's — equivalent to pooled
/// observations under a shared prior (spec.md §4.D, "Aggregation").
/// Returns the uniform prior for an empty pool.
pub fn aggregate(posteriors: &[BetaPosterior]) -> BetaPosterior {
    posteriors.iter().fold(
        BetaPosterior { alpha: 0.0, beta: 0.0 },
        |acc, p| BetaPosterior {
            alpha: acc.alpha + p.alpha,
            beta: acc.beta + p.beta,
        },
    )
}

/// Pooled mean and 95% credible interval over several posteriors, or
/// `None` for an empty pool.
pub fn aggregate_report(posteriors: &[BetaPosterior]) -> Option<(f64, (f64, f64))> {
    if posteriors.is_empty() {
        return None;
    }
    let pooled = aggregate(posteriors);
    Some((pooled.mean(), pooled.credible_interval(0.95)))
}
