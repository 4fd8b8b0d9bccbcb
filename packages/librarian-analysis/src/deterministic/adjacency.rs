use std::collections::BTreeMap;

use librarian_graph::{EntityId, GraphModel};

/// Degree and density metrics over a whole graph (spec.md §4.C, "Adjacency
/// stats").
#[derive(Debug, Clone, PartialEq)]
pub struct AdjacencyStats {
    pub out_degree: BTreeMap<EntityId, usize>,
    pub in_degree: BTreeMap<EntityId, usize>,
    pub isolated: Vec<EntityId>,
    pub leaves: Vec<EntityId>,
    pub roots: Vec<EntityId>,
    /// `edge_count / (n·(n-1))` for `n >= 2`, else `0`.
    pub density: f64,
    pub avg_out_degree: f64,
    pub avg_in_degree: f64,
    pub max_out_degree_node: Option<EntityId>,
    pub max_out_degree: usize,
    pub max_in_degree_node: Option<EntityId>,
    pub max_in_degree: usize,
}

/// Compute [`AdjacencyStats`] over the whole graph. Nodes are visited in
/// lexicographic order so max-degree ties are broken by first-encountered
/// node (spec.md §4.C).
pub fn adjacency_stats(graph: &GraphModel) -> AdjacencyStats {
    let mut out_degree = BTreeMap::new();
    let mut in_degree = BTreeMap::new();
    let mut isolated = Vec::new();
    let mut leaves = Vec::new();
    let mut roots = Vec::new();

    let mut max_out_degree = 0usize;
    let mut max_out_degree_node: Option<EntityId> = None;
    let mut max_in_degree = 0usize;
    let mut max_in_degree_node: Option<EntityId> = None;

    let mut total_out = 0usize;
    let mut total_in = 0usize;

    for id in graph.nodes() {
        let out_d = graph.out_degree(id);
        let in_d = graph.in_degree(id);
        out_degree.insert(id.clone(), out_d);
        in_degree.insert(id.clone(), in_d);
        total_out += out_d;
        total_in += in_d;

        match (out_d, in_d) {
            (0, 0) => isolated.push(id.clone()),
            (0, _) => leaves.push(id.clone()),
            (_, 0) => roots.push(id.clone()),
            _ => {}
        }

        if out_d > max_out_degree {
            max_out_degree = out_d;
            max_out_degree_node = Some(id.clone());
        }
        if in_d > max_in_degree {
            max_in_degree = in_d;
            max_in_degree_node = Some(id.clone());
        }
    }

    let n = graph.node_count();
    let density = if n >= 2 {
        graph.edge_count() as f64 / (n as f64 * (n as f64 - 1.0))
    } else {
        0.0
    };
    let avg_out_degree = if n > 0 { total_out as f64 / n as f64 } else { 0.0 };
    let avg_in_degree = if n > 0 { total_in as f64 / n as f64 } else { 0.0 };

    AdjacencyStats {
        out_degree,
        in_degree,
        isolated,
        leaves,
        roots,
        density,
        avg_out_degree,
        avg_in_degree,
        max_out_degree_node,
        max_out_degree,
        max_in_degree_node,
        max_in_degree,
    }
}
