use std::collections::HashMap;

use librarian_graph::{EntityId, GraphModel};

use crate::probabilistic::DEFAULT_DECAY;

/// Neighbor risk below this contributes nothing to `risk_sources`
/// (spec.md §4.E, "Risk propagation").
const RISK_SOURCE_THRESHOLD: f64 = 0.3;

/// Risk assessment for one entity (spec.md §4.E, "Risk propagation").
#[derive(Debug, Clone, PartialEq)]
pub struct RiskAssessment {
    pub entity_id: EntityId,
    pub direct_risk: f64,
    pub propagated_risk: f64,
    pub risk_sources: Vec<EntityId>,
}

/// Single-pass risk propagation over the whole graph (spec.md §4.E,
/// "Risk propagation"): for each node, `directRisk = 1 - mean(posterior)`
/// (0.5 absent a record); `propagatedRisk = max(directRisk, max over
/// outgoing neighbors of neighborRisk · decay)`, where `neighborRisk` is
/// the neighbor's own *direct* risk — this is explicitly not a
/// fixed-point computation.
pub fn propagate_risk(
    graph: &GraphModel,
    mean_confidence: &HashMap<EntityId, f64>,
    decay: f64,
) -> Vec<RiskAssessment> {
    let direct_risk = |id: &EntityId| 1.0 - mean_confidence.get(id).copied().unwrap_or(0.5);

    graph
        .nodes()
        .map(|id| {
            let own_risk = direct_risk(id);
            let mut propagated = own_risk;
            let mut risk_sources = Vec::new();

            for neighbor in graph.neighbors(id) {
                let neighbor_risk = direct_risk(neighbor);
                propagated = propagated.max(neighbor_risk * decay);
                if neighbor_risk > RISK_SOURCE_THRESHOLD {
                    risk_sources.push(neighbor.clone());
                }
            }

            RiskAssessment {
                entity_id: id.clone(),
                direct_risk: own_risk,
                propagated_risk: propagated,
                risk_sources,
            }
        })
        .collect()
}

/// [`propagate_risk`] with the default 0.7-per-hop decay.
pub fn propagate_risk_default(
    graph: &GraphModel,
    mean_confidence: &HashMap<EntityId, f64>,
) -> Vec<RiskAssessment> {
    propagate_risk(graph, mean_confidence, DEFAULT_DECAY)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eid(s: &str) -> EntityId {
        EntityId::new(s)
    }

    #[test]
    fn worked_example_matches_spec_scenario() {
        let g = GraphModel::build(vec![eid("x"), eid("y")], vec![(eid("x"), eid("y"))]);
        let mut conf = HashMap::new();
        conf.insert(eid("x"), 0.9);
        conf.insert(eid("y"), 0.3);
        let results = propagate_risk_default(&g, &conf);
        let x = results.iter().find(|r| r.entity_id == eid("x")).unwrap();
        assert!((x.direct_risk - 0.1).abs() < 1e-9);
        assert!((x.propagated_risk - 0.49).abs() < 1e-9);
        assert_eq!(x.risk_sources, vec![eid("y")]);
    }

    #[test]
    fn low_risk_neighbor_is_not_a_risk_source() {
        let g = GraphModel::build(vec![eid("x"), eid("y")], vec![(eid("x"), eid("y"))]);
        let mut conf = HashMap::new();
        conf.insert(eid("x"), 0.5);
        conf.insert(eid("y"), 0.95);
        let results = propagate_risk_default(&g, &conf);
        let x = results.iter().find(|r| r.entity_id == eid("x")).unwrap();
        assert!(x.risk_sources.is_empty());
    }

    #[test]
    fn missing_record_defaults_to_half_risk() {
        let g = GraphModel::build(vec![eid("x")], vec![]);
        let results = propagate_risk_default(&g, &HashMap::new());
        assert_eq!(results[0].direct_risk, 0.5);
        assert_eq!(results[0].propagated_risk, 0.5);
    }
}
