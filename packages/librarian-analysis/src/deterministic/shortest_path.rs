use std::collections::{HashMap, VecDeque};

use librarian_graph::{EntityId, GraphModel};

/// Shortest path from `source` to `target`, inclusive of both endpoints
/// (spec.md §4.C, "Shortest path"). `None` when unreachable. The degenerate
/// case `source == target` returns a single-element path.
pub fn shortest_path(
    graph: &GraphModel,
    source: &EntityId,
    target: &EntityId,
) -> Option<Vec<EntityId>> {
    if source == target {
        return Some(vec![source.clone()]);
    }

    let mut came_from: HashMap<EntityId, EntityId> = HashMap::new();
    let mut visited: std::collections::HashSet<EntityId> = std::collections::HashSet::new();
    let mut queue: VecDeque<EntityId> = VecDeque::new();

    visited.insert(source.clone());
    queue.push_back(source.clone());

    while let Some(u) = queue.pop_front() {
        if &u == target {
            return Some(reconstruct(&came_from, source, target));
        }
        for v in graph.neighbors(&u) {
            if visited.insert(v.clone()) {
                came_from.insert(v.clone(), u.clone());
                if v == target {
                    return Some(reconstruct(&came_from, source, target));
                }
                queue.push_back(v.clone());
            }
        }
    }

    None
}

fn reconstruct(
    came_from: &HashMap<EntityId, EntityId>,
    source: &EntityId,
    target: &EntityId,
) -> Vec<EntityId> {
    let mut path = vec![target.clone()];
    let mut current = target.clone();
    while &current != source {
        let prev = came_from[&current].clone();
        path.push(prev.clone());
        current = prev;
    }
    path.reverse();
    path
}
