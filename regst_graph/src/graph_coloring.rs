use crate::weight_graph::WeightGraph;
use std::{collections::HashSet, hash::Hash};

/// A greedy coloring over a generic conflict/intersection graph.
///
/// Nodes are colored in the order they were first inserted: for each node,
/// the smallest color index not already used by one of its already-colored
/// neighbors is assigned. This is deterministic in input order, which is the
/// property the plan improver relies on to keep mem-shared-id assignment
/// reproducible across runs over the same plan.
pub struct GraphColoring<T> {
    graph: WeightGraph<T>,
}

impl<T, C> From<C> for GraphColoring<T>
where
    T: Hash + Eq,
    C: Iterator<Item = T>,
{
    fn from(nodes: C) -> Self {
        GraphColoring {
            graph: WeightGraph::from(nodes),
        }
    }
}

impl<T> GraphColoring<T>
where
    T: Eq + Hash + Clone,
{
    /// Add an edge between `a` and `b`: the two nodes may never share a color.
    #[inline(always)]
    pub fn insert_edge(&mut self, a: &T, b: &T) {
        self.graph.add_edge(a, b);
    }

    pub fn has_nodes(&self) -> bool {
        self.graph.node_count() > 0
    }

    /// Add edges between every pair in `items`: none of them may share a
    /// color. Used when conflicts come from a shared key (e.g. every pair of
    /// regst-descs live at the same actor) rather than being discovered
    /// pairwise.
    pub fn insert_clique<'a, C>(&mut self, items: C)
    where
        T: 'a,
        C: Iterator<Item = &'a T> + Clone,
    {
        self.graph.add_all_edges(items);
    }

    /// Color every node, returning the color classes as a list of node
    /// groups. The outer list and each inner group are both in the order
    /// nodes were first seen, so two runs over the same insertion sequence
    /// produce byte-identical output.
    pub fn color_greedy(&self) -> Vec<Vec<T>> {
        let rev_map = self.graph.reverse_index();
        let mut node_color: std::collections::HashMap<_, usize> = std::collections::HashMap::new();
        let mut classes: Vec<Vec<T>> = Vec::new();

        for &idx in self.graph.order() {
            let mut used: HashSet<usize> = HashSet::new();
            for neighbor in self.graph.neighbors(idx) {
                if let Some(&c) = node_color.get(&neighbor) {
                    used.insert(c);
                }
            }
            let color = (0..).find(|c| !used.contains(c)).expect("infinite range");
            node_color.insert(idx, color);
            if color == classes.len() {
                classes.push(Vec::new());
            }
            classes[color].push(rev_map[&idx].clone());
        }
        classes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_edges_all_share_one_class() {
        let g: GraphColoring<i64> = GraphColoring::from([1, 2, 3].into_iter());
        let classes = g.color_greedy();
        assert_eq!(classes.len(), 1);
        assert_eq!(classes[0], vec![1, 2, 3]);
    }

    #[test]
    fn clique_gets_one_color_per_node() {
        let mut g: GraphColoring<i64> = GraphColoring::from([1, 2, 3].into_iter());
        g.insert_edge(&1, &2);
        g.insert_edge(&1, &3);
        g.insert_edge(&2, &3);
        let classes = g.color_greedy();
        assert_eq!(classes.len(), 3);
        for class in &classes {
            assert_eq!(class.len(), 1);
        }
    }

    #[test]
    fn two_components_reuse_colors() {
        // 1-2 conflict, 3-4 conflict, but 1/3 and 2/4 don't conflict with
        // each other. Expect 2 colors total, not 4.
        let mut g: GraphColoring<i64> = GraphColoring::from([1, 2, 3, 4].into_iter());
        g.insert_edge(&1, &2);
        g.insert_edge(&3, &4);
        let classes = g.color_greedy();
        assert_eq!(classes.len(), 2);
        assert_eq!(classes[0], vec![1, 3]);
        assert_eq!(classes[1], vec![2, 4]);
    }

    #[test]
    fn deterministic_across_repeated_runs() {
        let build = || {
            let mut g: GraphColoring<i64> = GraphColoring::from([5, 1, 3, 2].into_iter());
            g.insert_edge(&5, &1);
            g.insert_edge(&1, &3);
            g
        };
        let a = build().color_greedy();
        let b = build().color_greedy();
        assert_eq!(a, b);
    }
}
