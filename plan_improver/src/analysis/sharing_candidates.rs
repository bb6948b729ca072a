//! C2: finds the two pools of regst-descs eligible to compete for
//! mem-shared-ids -- grouped by work stream for regst-descs with no
//! consumer, and grouped by chain for regst-descs with a consumer -- before
//! each pool is handed to [crate::analysis::lifetime_graph::color_by_lifetime].

use plan_model::ids::{ChainId, RegstDescId, TaskId, WorkStreamId};
use plan_model::regst::RegstDesc;
use plan_model::{IdentifierManager, Plan};
use std::collections::HashMap;

/// Appends `value` into the group keyed by `key`, recording `key`'s
/// insertion order the first time it is seen so callers can iterate groups
/// deterministically afterward.
fn group_append<K: std::hash::Hash + Eq + Clone, V>(
    order: &mut Vec<K>,
    groups: &mut HashMap<K, Vec<V>>,
    key: K,
    value: V,
) {
    if !groups.contains_key(&key) {
        order.push(key.clone());
    }
    groups.entry(key).or_default().push(value);
}

fn is_sharable_without_consumer(regst: &RegstDesc) -> bool {
    regst.consumer_task_ids.is_empty() && regst.enable_mem_sharing
}

fn is_sharable_with_consumer(
    regst: &RegstDesc,
    chain_id_of: &HashMap<TaskId, ChainId>,
) -> bool {
    if regst.consumer_task_ids.is_empty() || !regst.enable_mem_sharing || regst.register_num != 1 {
        return false;
    }
    let Some(&producer_chain) = chain_id_of.get(&regst.producer_task_id) else {
        return false;
    };
    regst
        .consumer_task_ids
        .iter()
        .all(|c| chain_id_of.get(c) == Some(&producer_chain))
}

/// Regst-descs with no consumer, grouped by global work stream, restricted
/// to groups with more than one candidate (a group of one has nothing to
/// share with).
pub fn without_consumer_pools(
    plan: &Plan,
    identifiers: &impl IdentifierManager,
) -> Vec<Vec<RegstDescId>> {
    let mut order = Vec::new();
    let mut groups: HashMap<WorkStreamId, Vec<RegstDescId>> = HashMap::new();
    for task in &plan.tasks {
        let stream_id = identifiers.global_work_stream_id(task.task_id);
        for regst in &task.produced_regst_descs {
            if is_sharable_without_consumer(regst) {
                group_append(&mut order, &mut groups, stream_id, regst.regst_desc_id);
            }
        }
    }
    order
        .into_iter()
        .filter_map(|k| groups.remove(&k))
        .filter(|g| g.len() > 1)
        .collect()
}

/// Regst-descs with a consumer, all sharing a chain with their producer,
/// grouped by that chain, restricted to chains with more than one task and
/// groups with more than one candidate.
pub fn with_consumer_pools(plan: &Plan) -> Vec<Vec<RegstDescId>> {
    let chain_id_of: HashMap<TaskId, ChainId> =
        plan.tasks.iter().map(|t| (t.task_id, t.chain_id)).collect();

    let mut chain_task_count: HashMap<ChainId, usize> = HashMap::new();
    for task in &plan.tasks {
        *chain_task_count.entry(task.chain_id).or_insert(0) += 1;
    }

    let mut order = Vec::new();
    let mut groups: HashMap<ChainId, Vec<RegstDescId>> = HashMap::new();
    for task in &plan.tasks {
        if chain_task_count[&task.chain_id] <= 1 {
            continue;
        }
        for regst in &task.produced_regst_descs {
            if is_sharable_with_consumer(regst, &chain_id_of) {
                group_append(&mut order, &mut groups, task.chain_id, regst.regst_desc_id);
            }
        }
    }
    order
        .into_iter()
        .filter_map(|k| groups.remove(&k))
        .filter(|g| g.len() > 1)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use plan_model::collab::SequentialIdentifierManager;
    use plan_model::regst::{MemCase, RegstDesc};
    use plan_model::task::{TaskProto, TaskType};

    fn sharable_regst(id: RegstDescId, producer: TaskId) -> RegstDesc {
        let mut r = RegstDesc::new(id, producer, MemCase::Host, 1024);
        r.enable_mem_sharing = true;
        r
    }

    #[test]
    fn without_consumer_groups_by_stream_and_drops_singletons() {
        let mut t0 = TaskProto::new(0, 0, TaskType::Other, 0, 0, 7);
        t0.produced_regst_descs.push(sharable_regst(100, 0));
        let mut t1 = TaskProto::new(1, 0, TaskType::Other, 1, 1, 7);
        t1.produced_regst_descs.push(sharable_regst(101, 1));
        let mut t2 = TaskProto::new(2, 0, TaskType::Other, 2, 2, 8);
        t2.produced_regst_descs.push(sharable_regst(102, 2));

        let plan = Plan::new(vec![t0, t1, t2]);
        let ids = SequentialIdentifierManager::build(&plan, 0);
        let pools = without_consumer_pools(&plan, &ids);
        assert_eq!(pools.len(), 1);
        assert_eq!(pools[0], vec![100, 101]);
    }

    #[test]
    fn with_consumer_requires_same_chain_and_single_register() {
        let mut t0 = TaskProto::new(0, 0, TaskType::Other, 5, 0, 1);
        let mut r0 = sharable_regst(200, 0);
        r0.consumer_task_ids.insert(1);
        t0.produced_regst_descs.push(r0);

        let mut t1 = TaskProto::new(1, 0, TaskType::Other, 5, 1, 1);
        let mut r1 = sharable_regst(201, 1);
        r1.consumer_task_ids.insert(2);
        t1.produced_regst_descs.push(r1);

        let mut t2 = TaskProto::new(2, 0, TaskType::Other, 5, 2, 1);
        // cross-chain consumer disqualifies this one.
        let mut r2 = sharable_regst(202, 2);
        r2.consumer_task_ids.insert(99);
        t2.produced_regst_descs.push(r2);

        let plan = Plan::new(vec![t0, t1, t2]);
        let pools = with_consumer_pools(&plan);
        assert_eq!(pools.len(), 1);
        assert_eq!(pools[0], vec![200, 201]);
    }
}
