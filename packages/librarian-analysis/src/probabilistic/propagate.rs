use std::collections::HashMap;

use librarian_graph::{EntityId, GraphModel};

use crate::deterministic::tarjan_scc;

/// Default decay applied per hop when a dependency's confidence is
/// inherited by its dependent (spec.md §4.D, "Propagation").
pub const DEFAULT_DECAY: f64 = 0.7;

/// Bound on same-component relaxation passes for cyclic SCCs, where
/// members' propagated confidences depend on each other.
const CYCLE_RELAXATION_CAP: usize = 16;
const CYCLE_RELAXATION_TOLERANCE: f64 = 1e-9;

/// Propagate confidence along dependency edges: for entity `e` with
/// dependencies `D` (its outgoing neighbors), computed confidence is
/// `min(mean(e), max_{d in D}(confidence(d) * decay))` — a low-confidence
/// dependency drags its dependents down (spec.md §4.D, "Propagation").
///
/// `own_mean` supplies each entity's own posterior mean (missing entries
/// fall back to the uniform prior's mean, 0.5). SCCs are processed in
/// Tarjan emission order, which places each entity's dependencies — nodes
/// reachable via its own outgoing edges — ahead of it in the order. For
/// cyclic components, members are relaxed against each other for a
/// bounded number of passes rather than in one step.
pub fn propagate_confidence(
    graph: &GraphModel,
    own_mean: &HashMap<EntityId, f64>,
    decay: f64,
) -> HashMap<EntityId, f64> {
    let mean_of = |id: &EntityId| own_mean.get(id).copied().unwrap_or(0.5);
    let mut computed: HashMap<EntityId, f64> = HashMap::new();

    for scc in tarjan_scc(graph) {
        if !scc.is_cyclic {
            let e = &scc.members[0];
            computed.insert(e.clone(), propagated_value(graph, e, &computed, &mean_of, decay));
            continue;
        }

        for m in &scc.members {
            computed.insert(m.clone(), mean_of(m));
        }
        for _ in 0..CYCLE_RELAXATION_CAP {
            let mut max_delta = 0.0f64;
            for m in &scc.members {
                let next = propagated_value(graph, m, &computed, &mean_of, decay);
                let prev = computed[m];
                max_delta = max_delta.max((next - prev).abs());
                computed.insert(m.clone(), next);
            }
            if max_delta < CYCLE_RELAXATION_TOLERANCE {
                break;
            }
        }
    }

    computed
}

fn propagated_value(
    graph: &GraphModel,
    e: &EntityId,
    computed: &HashMap<EntityId, f64>,
    mean_of: &impl Fn(&EntityId) -> f64,
    decay: f64,
) -> f64 {
    let own = mean_of(e);
    let floor = graph
        .neighbors(e)
        .iter()
        .filter(|d| *d != e)
        .map(|d| computed.get(d).copied().unwrap_or_else(|| mean_of(d)) * decay)
        .fold(f64::NEG_INFINITY, f64::max);

    if floor.is_finite() {
        own.min(floor)
    } else {
        own
    }
}
