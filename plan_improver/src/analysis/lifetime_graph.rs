//! C1: groups a set of regst-descs into mem-shared-id classes by coloring
//! their lifetime-intersection graph.
//!
//! Two regst-descs conflict (and so can never share a color, and therefore
//! never a `mem_shared_id`) exactly when their lifetime actor-id sets
//! intersect: some task is alive for both at once. Rather than comparing
//! every pair of lifetimes directly (quadratic in the number of regst-descs),
//! this inverts the relation: for every actor-id, collect the regst-descs
//! whose lifetime includes it, and mark that whole group as a mutual-conflict
//! clique. This is the same trick `regst_graph::WeightGraph::add_all_edges`
//! exists for, and it is cheap whenever the number of distinct actor-ids `L`
//! touched by the group is small relative to the number of regst-desc pairs.

use plan_model::ids::{RegstDescId, TaskId};
use regst_graph::GraphColoring;
use std::collections::{HashMap, HashSet};

/// Partition `regst_desc_ids` into color classes such that no two
/// regst-descs in the same class have overlapping lifetimes. `lifetime`
/// computes the set of actor-ids a regst-desc is alive for.
pub fn color_by_lifetime(
    regst_desc_ids: &[RegstDescId],
    lifetime: impl Fn(RegstDescId) -> HashSet<TaskId>,
) -> Vec<Vec<RegstDescId>> {
    let mut coloring: GraphColoring<RegstDescId> =
        GraphColoring::from(regst_desc_ids.iter().copied());

    let mut actor_to_regsts: HashMap<TaskId, Vec<RegstDescId>> = HashMap::new();
    for &id in regst_desc_ids {
        for actor_id in lifetime(id) {
            actor_to_regsts.entry(actor_id).or_default().push(id);
        }
    }
    for regsts in actor_to_regsts.values() {
        coloring.insert_clique(regsts.iter());
    }
    coloring.color_greedy()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lifetimes(table: &[(RegstDescId, &[TaskId])]) -> HashMap<RegstDescId, HashSet<TaskId>> {
        table
            .iter()
            .map(|(id, actors)| (*id, actors.iter().copied().collect()))
            .collect()
    }

    #[test]
    fn disjoint_lifetimes_share_one_class() {
        let ids = vec![1, 2, 3];
        let map = lifetimes(&[(1, &[10]), (2, &[11]), (3, &[12])]);
        let classes = color_by_lifetime(&ids, |id| map[&id].clone());
        assert_eq!(classes.len(), 1);
    }

    #[test]
    fn overlapping_lifetimes_split_into_classes() {
        let ids = vec![1, 2, 3];
        // 1 and 2 both alive at actor 10; 3 is independent.
        let map = lifetimes(&[(1, &[10, 20]), (2, &[10, 30]), (3, &[40])]);
        let classes = color_by_lifetime(&ids, |id| map[&id].clone());
        assert_eq!(classes.len(), 2);
        assert!(classes.iter().any(|c| c.contains(&3)));
    }

    #[test]
    fn deterministic_in_input_order() {
        let ids = vec![3, 1, 2];
        let map = lifetimes(&[(1, &[10]), (2, &[10]), (3, &[10])]);
        let first = color_by_lifetime(&ids, |id| map[&id].clone());
        let second = color_by_lifetime(&ids, |id| map[&id].clone());
        assert_eq!(first, second);
        // all three share actor 10, so every node needs its own color
        assert_eq!(first.len(), 3);
        assert_eq!(first[0], vec![3]);
    }
}
