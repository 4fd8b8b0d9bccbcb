use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{GraphError, Result};

/// Opaque identifier for an analyzable entity.
///
/// IDs are unique per [`EntityKind`] (spec.md §3), not globally — two
/// entities of different kinds may share the same string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Kind of entity tracked by the graph. IDs are unique per kind, not globally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Function,
    Module,
    File,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EntityKind::Function => "function",
            EntityKind::Module => "module",
            EntityKind::File => "file",
        };
        write!(f, "{s}")
    }
}

/// Directed graph over opaque entity IDs, kept as forward and reverse
/// adjacency maps (spec.md §3, "Graph (G, G⁻¹)").
///
/// Construction is batch-only: the whole graph is rebuilt from an indexer's
/// node/edge lists, never mutated incrementally (spec.md §4.A). `BTreeMap`
/// backs both maps so iteration order is always lexicographic by ID, which
/// is what the deterministic analyzer's ordering requirement (spec.md §5)
/// needs without any extra sorting at call sites.
#[derive(Debug, Clone, Default)]
pub struct GraphModel {
    forward: BTreeMap<EntityId, BTreeSet<EntityId>>,
    reverse: BTreeMap<EntityId, BTreeSet<EntityId>>,
    edge_count: usize,
}

static EMPTY: BTreeSet<EntityId> = BTreeSet::new();

impl GraphModel {
    /// Build a graph from an explicit node list plus a directed edge list.
    ///
    /// Edge endpoints not present in `nodes` are added implicitly (the
    /// indexer is expected to supply a complete node list, but a missing
    /// endpoint is not treated as an error — see spec.md §4.A).
    pub fn build<N, E>(nodes: N, edges: E) -> Self
    where
        N: IntoIterator<Item = EntityId>,
        E: IntoIterator<Item = (EntityId, EntityId)>,
    {
        let mut forward: BTreeMap<EntityId, BTreeSet<EntityId>> = BTreeMap::new();
        let mut reverse: BTreeMap<EntityId, BTreeSet<EntityId>> = BTreeMap::new();

        for node in nodes {
            forward.entry(node.clone()).or_default();
            reverse.entry(node).or_default();
        }

        let mut edge_count = 0;
        for (from, to) in edges {
            let inserted = forward
                .entry(from.clone())
                .or_default()
                .insert(to.clone());
            if inserted {
                edge_count += 1;
            }
            reverse.entry(to.clone()).or_default().insert(from.clone());
            // An edge endpoint implies node membership even if absent from
            // the declared node list — every node must have an entry on
            // both sides so `neighbors`/`reverse_neighbors` never need the
            // `unwrap_or` fallback for a node that participates in an edge.
            forward.entry(to).or_default();
            reverse.entry(from).or_default();
        }

        Self {
            forward,
            reverse,
            edge_count,
        }
    }

    /// Build a graph, additionally verifying the transpose invariant
    /// (`y ∈ G[x] ⇔ x ∈ G⁻¹[y]`, spec.md §3) before returning it. Useful in
    /// tests and anywhere a caller assembles the adjacency maps by hand
    /// instead of going through [`GraphModel::build`].
    pub fn try_build<N, E>(nodes: N, edges: E) -> Result<Self>
    where
        N: IntoIterator<Item = EntityId>,
        E: IntoIterator<Item = (EntityId, EntityId)>,
    {
        let model = Self::build(nodes, edges);
        model.check_invariant()?;
        Ok(model)
    }

    fn check_invariant(&self) -> Result<()> {
        for (from, targets) in &self.forward {
            for to in targets {
                if !self
                    .reverse
                    .get(to)
                    .map(|s| s.contains(from))
                    .unwrap_or(false)
                {
                    return Err(GraphError::InvariantViolation(
                        from.to_string(),
                        to.to_string(),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Outgoing neighbors of `id`. Unknown IDs return an empty set, never an
    /// error (spec.md §4.A).
    pub fn neighbors(&self, id: &EntityId) -> &BTreeSet<EntityId> {
        self.forward.get(id).unwrap_or(&EMPTY)
    }

    /// Incoming neighbors of `id`. Unknown IDs return an empty set.
    pub fn reverse_neighbors(&self, id: &EntityId) -> &BTreeSet<EntityId> {
        self.reverse.get(id).unwrap_or(&EMPTY)
    }

    /// All known node IDs, in lexicographic order.
    pub fn nodes(&self) -> impl Iterator<Item = &EntityId> {
        self.forward.keys()
    }

    pub fn node_count(&self) -> usize {
        self.forward.len()
    }

    /// Number of distinct directed edges (self-loops count once).
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.forward.contains_key(id)
    }

    pub fn out_degree(&self, id: &EntityId) -> usize {
        self.neighbors(id).len()
    }

    pub fn in_degree(&self, id: &EntityId) -> usize {
        self.reverse_neighbors(id).len()
    }
}
