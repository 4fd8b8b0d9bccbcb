use std::collections::{BTreeSet, VecDeque};

use librarian_graph::{EntityId, GraphModel};

/// Nodes reachable from `source` by breadth-first traversal (spec.md §4.C,
/// "Reachability"). `source` itself is excluded unless it is reachable via
/// a non-trivial path (a self-loop, or a longer cycle back to it).
pub fn reachable_from(graph: &GraphModel, source: &EntityId) -> BTreeSet<EntityId> {
    let mut visited: BTreeSet<EntityId> = BTreeSet::new();
    let mut result: BTreeSet<EntityId> = BTreeSet::new();
    let mut queue: VecDeque<EntityId> = VecDeque::new();

    visited.insert(source.clone());
    queue.push_back(source.clone());

    while let Some(u) = queue.pop_front() {
        for v in graph.neighbors(&u) {
            if v == source {
                result.insert(source.clone());
                continue;
            }
            if visited.insert(v.clone()) {
                result.insert(v.clone());
                queue.push_back(v.clone());
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eid(s: &str) -> EntityId {
        EntityId::new(s)
    }

    #[test]
    fn empty_graph_has_empty_reachable_set() {
        let g = GraphModel::build(vec![], vec![]);
        assert!(reachable_from(&g, &eid("a")).is_empty());
    }

    #[test]
    fn linear_chain_excludes_source_without_cycle() {
        let g = GraphModel::build(
            vec![eid("a"), eid("b"), eid("c")],
            vec![(eid("a"), eid("b")), (eid("b"), eid("c"))],
        );
        let set = reachable_from(&g, &eid("a"));
        assert_eq!(set, [eid("b"), eid("c")].into_iter().collect());
    }

    #[test]
    fn cycle_back_to_source_includes_source() {
        let g = GraphModel::build(
            vec![eid("a"), eid("b")],
            vec![(eid("a"), eid("b")), (eid("b"), eid("a"))],
        );
        let set = reachable_from(&g, &eid("a"));
        assert!(set.contains(&eid("a")));
        assert!(set.contains(&eid("b")));
    }

    #[test]
    fn self_loop_includes_source() {
        let g = GraphModel::build(vec![eid("a")], vec![(eid("a"), eid("a"))]);
        let set = reachable_from(&g, &eid("a"));
        assert!(set.contains(&eid("a")));
    }
}
