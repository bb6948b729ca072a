use itertools::Itertools;
use petgraph::matrix_graph::{MatrixGraph, NodeIndex, UnMatrix, Zero};
use std::{collections::HashMap, hash::Hash};

/// Index into a [WeightGraph].
pub type Idx = NodeIndex;

/// Edge weight used for the graph nodes. Edges are unweighted; this is only
/// present/absent per [Zero].
pub struct BoolIdx(bool);

impl From<bool> for BoolIdx {
    fn from(b: bool) -> Self {
        BoolIdx(b)
    }
}

impl Zero for BoolIdx {
    fn zero() -> Self {
        BoolIdx(false)
    }

    fn is_zero(&self) -> bool {
        !self.0
    }
}

/// A wrapper over a petgraph matrix graph that lets edges be added using the
/// node weight `T` directly instead of a [NodeIndex], and additionally
/// remembers the order nodes were inserted in so that greedy algorithms over
/// the graph stay deterministic in that order rather than in hash order.
pub struct WeightGraph<T> {
    /// Mapping from `T` to its index in `graph`.
    index_map: HashMap<T, NodeIndex>,
    /// Node indices in insertion order.
    order: Vec<NodeIndex>,
    graph: UnMatrix<(), BoolIdx>,
}

impl<T, C> From<C> for WeightGraph<T>
where
    T: Eq + Hash,
    C: Iterator<Item = T>,
{
    fn from(nodes: C) -> Self {
        let mut graph = MatrixGraph::new_undirected();
        let mut order = Vec::new();
        let index_map: HashMap<_, _> = nodes
            .map(|node| {
                let idx = graph.add_node(());
                order.push(idx);
                (node, idx)
            })
            .collect();
        WeightGraph {
            index_map,
            order,
            graph,
        }
    }
}

impl<T> WeightGraph<T>
where
    T: Eq + Hash + Clone,
{
    /// Add an edge between `a` and `b`. No-op if the edge already exists.
    #[inline(always)]
    pub fn add_edge(&mut self, a: &T, b: &T) {
        self.graph
            .update_edge(self.index_map[a], self.index_map[b], true.into());
    }

    /// Returns a map from [NodeIndex] back to the original node weight.
    pub fn reverse_index(&self) -> HashMap<NodeIndex, T> {
        self.index_map
            .iter()
            .map(|(k, v)| (*v, k.clone()))
            .collect()
    }

    /// Iterate node indices in the order they were inserted.
    pub fn order(&self) -> &[NodeIndex] {
        &self.order
    }

    pub fn neighbors(&self, idx: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.neighbors(idx)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }
}

impl<'a, T> WeightGraph<T>
where
    T: 'a + Eq + Hash + Clone,
{
    /// Add edges between every pair in `items` (a clique).
    pub fn add_all_edges<C>(&mut self, items: C)
    where
        C: Iterator<Item = &'a T> + Clone,
    {
        items.tuple_combinations().for_each(|(src, dst)| {
            self.add_edge(src, dst);
        });
    }
}
