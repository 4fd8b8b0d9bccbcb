use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use librarian_graph::{EntityId, EntityKind, GraphModel};
use librarian_storage::SccEntry;

/// One strongly connected component (spec.md §4.C, "SCC (Tarjan)").
///
/// `members` is sorted lexicographically, so `members[0]` is always the
/// deterministic root per spec.md's "fix a deterministic rule (e.g.,
/// lexicographic min ID)".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scc {
    pub members: Vec<EntityId>,
    pub is_cyclic: bool,
}

impl Scc {
    pub fn root(&self) -> &EntityId {
        &self.members[0]
    }

    pub fn size(&self) -> usize {
        self.members.len()
    }
}

struct Frame {
    node: EntityId,
    children: Vec<EntityId>,
    child_idx: usize,
}

/// Tarjan's SCC algorithm, run as an **iterative** depth-first traversal
/// (spec.md §4.C requires this explicitly, to avoid unbounded recursion
/// depth on large graphs — the teacher's own `scc_detector::tarjan_dfs` is
/// recursive; this keeps its index/lowlink/on-stack bookkeeping but drives
/// it with an explicit work stack instead of the call stack).
///
/// Nodes are visited in lexicographic order (spec.md §5, "Ordering"), which
/// `GraphModel`'s `BTreeMap`-backed storage gives for free.
pub fn tarjan_scc(graph: &GraphModel) -> Vec<Scc> {
    let mut index: HashMap<EntityId, usize> = HashMap::new();
    let mut lowlink: HashMap<EntityId, usize> = HashMap::new();
    let mut on_stack: HashSet<EntityId> = HashSet::new();
    let mut tarjan_stack: Vec<EntityId> = Vec::new();
    let mut components: Vec<Vec<EntityId>> = Vec::new();
    let mut next_index = 0usize;

    let all_nodes: Vec<EntityId> = graph.nodes().cloned().collect();

    for start in all_nodes {
        if index.contains_key(&start) {
            continue;
        }

        let mut work: Vec<Frame> = Vec::new();
        push_frame(graph, &start, &mut work, &mut index, &mut lowlink, &mut tarjan_stack, &mut on_stack, &mut next_index);

        while let Some(frame) = work.last_mut() {
            if frame.child_idx < frame.children.len() {
                let w = frame.children[frame.child_idx].clone();
                frame.child_idx += 1;
                if !index.contains_key(&w) {
                    push_frame(graph, &w, &mut work, &mut index, &mut lowlink, &mut tarjan_stack, &mut on_stack, &mut next_index);
                } else if on_stack.contains(&w) {
                    let v = frame.node.clone();
                    let candidate = index[&w];
                    let current = *lowlink.get(&v).unwrap();
                    if candidate < current {
                        lowlink.insert(v, candidate);
                    }
                }
            } else {
                let v = frame.node.clone();
                work.pop();
                if let Some(parent) = work.last() {
                    let p = parent.node.clone();
                    let candidate = *lowlink.get(&v).unwrap();
                    let current = *lowlink.get(&p).unwrap();
                    if candidate < current {
                        lowlink.insert(p, candidate);
                    }
                }
                if lowlink[&v] == index[&v] {
                    let mut component = Vec::new();
                    loop {
                        let w = tarjan_stack.pop().expect("tarjan stack underflow");
                        on_stack.remove(&w);
                        let done = w == v;
                        component.push(w);
                        if done {
                            break;
                        }
                    }
                    components.push(component);
                }
            }
        }
    }

    components
        .into_iter()
        .map(|mut members| {
            members.sort();
            let is_cyclic = members.len() > 1
                || graph.neighbors(&members[0]).contains(&members[0]);
            Scc { members, is_cyclic }
        })
        .collect()
}

#[allow(clippy::too_many_arguments)]
fn push_frame(
    graph: &GraphModel,
    node: &EntityId,
    work: &mut Vec<Frame>,
    index: &mut HashMap<EntityId, usize>,
    lowlink: &mut HashMap<EntityId, usize>,
    tarjan_stack: &mut Vec<EntityId>,
    on_stack: &mut HashSet<EntityId>,
    next_index: &mut usize,
) {
    index.insert(node.clone(), *next_index);
    lowlink.insert(node.clone(), *next_index);
    *next_index += 1;
    tarjan_stack.push(node.clone());
    on_stack.insert(node.clone());
    let children: Vec<EntityId> = graph.neighbors(node).iter().cloned().collect();
    work.push(Frame {
        node: node.clone(),
        children,
        child_idx: 0,
    });
}

/// Turn computed SCCs into persistable [`SccEntry`] rows (spec.md §3,
/// "SCCEntry"): one entry per member, sharing `component_id` and `size`,
/// exactly one `is_root = true` per component.
pub fn scc_entries(sccs: &[Scc], kind: EntityKind, computed_at: DateTime<Utc>) -> Vec<SccEntry> {
    sccs.iter()
        .flat_map(|scc| {
            let component_id = format!("scc-{}-{}", kind, scc.root());
            scc.members.iter().map(move |m| SccEntry {
                component_id: component_id.clone(),
                entity_id: m.clone(),
                entity_kind: kind,
                is_root: m == scc.root(),
                component_size: scc.size(),
                computed_at,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eid(s: &str) -> EntityId {
        EntityId::new(s)
    }

    #[test]
    fn empty_graph_has_no_components() {
        let g = GraphModel::build(vec![], vec![]);
        assert!(tarjan_scc(&g).is_empty());
    }

    #[test]
    fn single_node_self_loop_is_one_cyclic_component() {
        let g = GraphModel::build(vec![eid("a")], vec![(eid("a"), eid("a"))]);
        let sccs = tarjan_scc(&g);
        assert_eq!(sccs.len(), 1);
        assert!(sccs[0].is_cyclic);
        assert_eq!(sccs[0].size(), 1);
    }

    #[test]
    fn singleton_without_self_loop_is_acyclic() {
        let g = GraphModel::build(vec![eid("a"), eid("b")], vec![(eid("a"), eid("b"))]);
        let sccs = tarjan_scc(&g);
        assert_eq!(sccs.len(), 2);
        assert!(sccs.iter().all(|s| !s.is_cyclic));
    }

    #[test]
    fn two_node_cycle_is_one_component_of_size_two() {
        let g = GraphModel::build(
            vec![eid("a"), eid("b")],
            vec![(eid("a"), eid("b")), (eid("b"), eid("a"))],
        );
        let sccs = tarjan_scc(&g);
        assert_eq!(sccs.len(), 1);
        assert_eq!(sccs[0].size(), 2);
        assert!(sccs[0].is_cyclic);
        assert_eq!(sccs[0].root(), &eid("a"));
    }

    #[test]
    fn critical_five_cycle_is_one_component() {
        let g = GraphModel::build(
            vec![eid("a"), eid("b"), eid("c"), eid("d"), eid("e")],
            vec![
                (eid("a"), eid("b")),
                (eid("b"), eid("c")),
                (eid("c"), eid("d")),
                (eid("d"), eid("e")),
                (eid("e"), eid("a")),
            ],
        );
        let sccs = tarjan_scc(&g);
        assert_eq!(sccs.len(), 1);
        assert_eq!(sccs[0].size(), 5);
    }

    #[test]
    fn every_node_belongs_to_exactly_one_component() {
        let g = GraphModel::build(
            vec![eid("a"), eid("b"), eid("c"), eid("d")],
            vec![
                (eid("a"), eid("b")),
                (eid("b"), eid("a")),
                (eid("c"), eid("d")),
            ],
        );
        let sccs = tarjan_scc(&g);
        let mut all_members: Vec<EntityId> =
            sccs.iter().flat_map(|s| s.members.clone()).collect();
        all_members.sort();
        assert_eq!(
            all_members,
            vec![eid("a"), eid("b"), eid("c"), eid("d")]
        );
    }

    #[test]
    fn scc_entries_has_exactly_one_root_per_component() {
        let g = GraphModel::build(
            vec![eid("a"), eid("b"), eid("c")],
            vec![(eid("a"), eid("b")), (eid("b"), eid("a")), (eid("c"), eid("c"))],
        );
        let sccs = tarjan_scc(&g);
        let entries = scc_entries(&sccs, EntityKind::Module, Utc::now());
        for scc in &sccs {
            let roots: Vec<_> = entries
                .iter()
                .filter(|e| scc.members.contains(&e.entity_id) && e.is_root)
                .collect();
            assert_eq!(roots.len(), 1);
        }
    }
}
