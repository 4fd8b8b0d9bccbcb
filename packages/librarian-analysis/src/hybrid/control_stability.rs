use std::collections::{HashMap, HashSet};

use librarian_graph::{EntityId, GraphModel};
use librarian_storage::FeedbackLoop;

/// Volatility above which an entity counts toward `volatile_fraction`
/// (spec.md §4.E, "Control stability").
const VOLATILITY_THRESHOLD: f64 = 0.3;

/// Composite stability assessment over a whole graph (spec.md §4.E,
/// "Control stability").
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlStability {
    pub avg_confidence: f64,
    pub volatile_fraction: f64,
    pub loop_risk: f64,
    pub change_amplification: f64,
    /// `avgConfidence · (1 − volatileFraction) · (1 − 0.5·loopRisk)`,
    /// clamped to `[0, 1]`.
    pub overall: f64,
}

/// Compute [`ControlStability`] for a graph. `mean_confidence` and
/// `volatility` default to 0.5 and 0.0 respectively for entities with no
/// record (spec.md §7, "Policy": missing data assumes mean 0.5).
pub fn control_stability(
    graph: &GraphModel,
    mean_confidence: &HashMap<EntityId, f64>,
    volatility: &HashMap<EntityId, f64>,
    loops: &[FeedbackLoop],
) -> ControlStability {
    let n = graph.node_count();
    if n == 0 {
        return ControlStability {
            avg_confidence: 0.5,
            volatile_fraction: 0.0,
            loop_risk: 0.0,
            change_amplification: 0.0,
            overall: 0.5,
        };
    }

    let total_confidence: f64 = graph
        .nodes()
        .map(|id| mean_confidence.get(id).copied().unwrap_or(0.5))
        .sum();
    let avg_confidence = total_confidence / n as f64;

    let volatile_count = graph
        .nodes()
        .filter(|id| volatility.get(*id).copied().unwrap_or(0.0) > VOLATILITY_THRESHOLD)
        .count();
    let volatile_fraction = volatile_count as f64 / n as f64;

    let entities_in_any_loop: HashSet<&EntityId> =
        loops.iter().flat_map(|l| l.entities.iter()).collect();
    let loop_risk = entities_in_any_loop.len() as f64 / n as f64;

    let total_out_degree: usize = graph.nodes().map(|id| graph.out_degree(id)).sum();
    let avg_out_degree = total_out_degree as f64 / n as f64;
    let change_amplification = (avg_out_degree / 10.0).min(1.0);

    let overall =
        (avg_confidence * (1.0 - volatile_fraction) * (1.0 - 0.5 * loop_risk)).clamp(0.0, 1.0);

    ControlStability {
        avg_confidence,
        volatile_fraction,
        loop_risk,
        change_amplification,
        overall,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eid(s: &str) -> EntityId {
        EntityId::new(s)
    }

    #[test]
    fn empty_graph_yields_neutral_defaults() {
        let g = GraphModel::build(vec![], vec![]);
        let stability = control_stability(&g, &HashMap::new(), &HashMap::new(), &[]);
        assert_eq!(stability.overall, 0.5);
    }

    #[test]
    fn high_confidence_no_loops_no_volatility_is_near_one() {
        let g = GraphModel::build(vec![eid("a"), eid("b")], vec![(eid("a"), eid("b"))]);
        let mut conf = HashMap::new();
        conf.insert(eid("a"), 0.95);
        conf.insert(eid("b"), 0.95);
        let stability = control_stability(&g, &conf, &HashMap::new(), &[]);
        assert!(stability.overall > 0.9);
        assert_eq!(stability.loop_risk, 0.0);
    }

    #[test]
    fn volatility_above_threshold_reduces_overall() {
        let g = GraphModel::build(vec![eid("a")], vec![]);
        let mut conf = HashMap::new();
        conf.insert(eid("a"), 0.9);
        let stable = control_stability(&g, &conf, &HashMap::new(), &[]);
        let mut volatility = HashMap::new();
        volatility.insert(eid("a"), 0.9);
        let volatile = control_stability(&g, &conf, &volatility, &[]);
        assert!(volatile.overall < stable.overall);
    }
}
