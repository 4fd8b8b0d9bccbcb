use librarian_graph::EntityId;

use super::beta::BetaPosterior;

/// Default minimum observation count below which an entity is flagged as
/// having insufficient data (spec.md §4.D, "Uncertainty report").
pub const DEFAULT_OBSERVATION_THRESHOLD: u64 = 5;

/// One row of an uncertainty report, sorted by variance descending.
#[derive(Debug, Clone, PartialEq)]
pub struct UncertaintyEntry {
    pub entity_id: EntityId,
    pub mean: f64,
    pub variance: f64,
    pub observation_count: u64,
    pub insufficient_data: bool,
}

/// Build an uncertainty report sorted by variance descending, flagging
/// entities below `observation_threshold` as having insufficient data
/// (spec.md §4.D, "Uncertainty report").
pub fn uncertainty_report(
    entries: &[(EntityId, BetaPosterior, u64)],
    observation_threshold: u64,
) -> Vec<UncertaintyEntry> {
    let mut rows: Vec<UncertaintyEntry> = entries
        .iter()
        .map(|(id, posterior, observation_count)| UncertaintyEntry {
            entity_id: id.clone(),
            mean: posterior.mean(),
            variance: posterior.variance(),
            observation_count: *observation_count,
            insufficient_data: *observation_count < observation_threshold,
        })
        .collect();

    rows.sort_by(|a, b| {
        b.variance
            .partial_cmp(&a.variance)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.entity_id.cmp(&b.entity_id))
    });
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eid(s: &str) -> EntityId {
        EntityId::new(s)
    }

    #[test]
    fn sorted_by_variance_descending() {
        let entries = vec![
            (eid("confident"), BetaPosterior { alpha: 90.0, beta: 10.0 }, 99),
            (eid("uncertain"), BetaPosterior { alpha: 2.0, beta: 2.0 }, 3),
        ];
        let report = uncertainty_report(&entries, DEFAULT_OBSERVATION_THRESHOLD);
        assert_eq!(report[0].entity_id, eid("uncertain"));
        assert!(report[0].variance > report[1].variance);
    }

    #[test]
    fn flags_below_threshold_as_insufficient() {
        let entries = vec![(eid("a"), BetaPosterior::UNIFORM_PRIOR, 2)];
        let report = uncertainty_report(&entries, DEFAULT_OBSERVATION_THRESHOLD);
        assert!(report[0].insufficient_data);
    }

    #[test]
    fn at_threshold_is_sufficient() {
        let entries = vec![(eid("a"), BetaPosterior::UNIFORM_PRIOR, DEFAULT_OBSERVATION_THRESHOLD)];
        let report = uncertainty_report(&entries, DEFAULT_OBSERVATION_THRESHOLD);
        assert!(!report[0].insufficient_data);
    }
}
