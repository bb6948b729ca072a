//! C4: protects each multi-member mem-share group with a control edge so
//! the next producer in the group never overwrites memory a later consumer
//! hasn't read yet.
//!
//! Within a mem-share group the regst-descs are ordered by their producer's
//! `order_in_graph` (a duplicate is a fatal plan-construction error: two
//! producers can't race for the same shared buffer without a defined
//! order). The header (first producer) gets a control edge to every sink
//! among the later members' consumers -- a consumer that is not itself a
//! dependency of another consumer in the set, i.e. the last reader on any
//! path through it.

use plan_model::ids::{MemSharedId, RegstDescId, TaskId, UNSHARED};
use plan_model::{Error, Plan, PlanTaskGraph, Result};
use std::collections::{BTreeSet, HashMap};

fn tail_sink_task_ids(
    tail_consumer_ids: &BTreeSet<TaskId>,
    plan_task_graph: &impl PlanTaskGraph,
) -> Vec<TaskId> {
    tail_consumer_ids
        .iter()
        .copied()
        .filter(|&src| {
            !tail_consumer_ids.iter().any(|&dst| {
                dst != src && plan_task_graph.is_reachable_in_same_area(src, dst)
            })
        })
        .collect()
}

pub fn add_mem_sharing_critical_sections(
    plan: &mut Plan,
    plan_task_graph: &impl PlanTaskGraph,
) -> Result<()> {
    let order_in_graph_of: HashMap<TaskId, i64> = plan
        .tasks
        .iter()
        .map(|t| (t.task_id, t.order_in_graph))
        .collect();

    let mut group_order: Vec<MemSharedId> = Vec::new();
    let mut groups: HashMap<MemSharedId, Vec<RegstDescId>> = HashMap::new();
    for task in &plan.tasks {
        for regst in &task.produced_regst_descs {
            if regst.mem_shared_id == UNSHARED || regst.consumer_task_ids.is_empty() {
                continue;
            }
            if !regst.enable_mem_sharing {
                return Err(Error::not_mem_sharable(regst.regst_desc_id));
            }
            if !groups.contains_key(&regst.mem_shared_id) {
                group_order.push(regst.mem_shared_id);
            }
            groups
                .entry(regst.mem_shared_id)
                .or_default()
                .push(regst.regst_desc_id);
        }
    }

    let index = plan.index();
    let mut next_regst_desc_id = plan.next_regst_desc_id();

    for mem_shared_id in group_order {
        let unordered = groups.remove(&mem_shared_id).expect("just inserted");
        let mut keyed: Vec<(RegstDescId, i64)> = Vec::with_capacity(unordered.len());
        for id in unordered {
            let producer = index.regst_desc(plan, id)?.producer_task_id;
            keyed.push((id, order_in_graph_of[&producer]));
        }
        keyed.sort_by_key(|&(_, order)| order);
        for pair in keyed.windows(2) {
            if pair[0].1 == pair[1].1 {
                let task_id = index.regst_desc(plan, pair[1].0)?.producer_task_id;
                return Err(Error::duplicate_order_in_graph(task_id, pair[1].1));
            }
        }
        let ids: Vec<RegstDescId> = keyed.into_iter().map(|(id, _)| id).collect();
        if ids.len() <= 1 {
            continue;
        }

        let header_task_id = index.regst_desc(plan, ids[0])?.producer_task_id;
        let mut tail_consumer_ids: BTreeSet<TaskId> = BTreeSet::new();
        for &id in &ids[1..] {
            tail_consumer_ids.extend(index.regst_desc(plan, id)?.consumer_task_ids.iter().copied());
        }
        let sink_task_ids = tail_sink_task_ids(&tail_consumer_ids, plan_task_graph);

        for sink_task_id in sink_task_ids {
            let (ctrl_id, newly_added) = {
                let header = index.task_mut(plan, header_task_id)?;
                let ctrl_id =
                    header.find_or_create_out_ctrl(&mut || {
                        let id = next_regst_desc_id;
                        next_regst_desc_id += 1;
                        id
                    });
                let ctrl = header
                    .produced_regst_descs
                    .iter_mut()
                    .find(|r| r.regst_desc_id == ctrl_id)
                    .expect("just found or created");
                (ctrl_id, ctrl.consumer_task_ids.insert(sink_task_id))
            };
            if newly_added {
                index.task_mut(plan, sink_task_id)?.add_consumed_ctrl(ctrl_id);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use plan_model::collab::ChainPlanTaskGraphBuilder;
    use plan_model::regst::{MemCase, RegstDesc};
    use plan_model::task::{TaskProto, TaskType};
    use plan_model::traits::PlanTaskGraphBuilder;

    fn shared_regst(id: RegstDescId, producer: TaskId, consumer: TaskId, mem_shared_id: MemSharedId) -> RegstDesc {
        let mut r = RegstDesc::new(id, producer, MemCase::Host, 16);
        r.enable_mem_sharing = true;
        r.mem_shared_id = mem_shared_id;
        r.consumer_task_ids.insert(consumer);
        r
    }

    #[test]
    fn connects_header_to_lone_sink() {
        let mut t0 = TaskProto::new(0, 0, TaskType::Other, 0, 0, 1);
        t0.produced_regst_descs.push(shared_regst(10, 0, 2, 5));
        let mut t1 = TaskProto::new(1, 0, TaskType::Other, 0, 1, 1);
        t1.produced_regst_descs.push(shared_regst(11, 1, 3, 5));
        let t2 = TaskProto::new(2, 0, TaskType::Other, 0, 2, 1);
        let t3 = TaskProto::new(3, 0, TaskType::Other, 0, 3, 1);

        let mut plan = Plan::new(vec![t0, t1, t2, t3]);
        let task_graph = ChainPlanTaskGraphBuilder.build(&plan);
        add_mem_sharing_critical_sections(&mut plan, &task_graph).unwrap();

        let header = plan.tasks.iter().find(|t| t.task_id == 0).unwrap();
        let ctrl = header
            .produced_regst_descs
            .iter()
            .find(|r| r.is_control())
            .expect("control regst created");
        assert!(ctrl.consumer_task_ids.contains(&3));

        let sink = plan.tasks.iter().find(|t| t.task_id == 3).unwrap();
        assert!(sink
            .consumed_ctrl_regst_desc_ids
            .get("in_ctrl")
            .unwrap()
            .contains(&ctrl.regst_desc_id));
    }

    #[test]
    fn single_member_group_needs_no_critical_section() {
        let mut t0 = TaskProto::new(0, 0, TaskType::Other, 0, 0, 1);
        t0.produced_regst_descs.push(shared_regst(10, 0, 1, 5));
        let t1 = TaskProto::new(1, 0, TaskType::Other, 0, 1, 1);
        let mut plan = Plan::new(vec![t0, t1]);
        let task_graph = ChainPlanTaskGraphBuilder.build(&plan);
        add_mem_sharing_critical_sections(&mut plan, &task_graph).unwrap();
        assert!(plan.tasks[0]
            .produced_regst_descs
            .iter()
            .all(|r| !r.is_control()));
    }

    #[test]
    fn duplicate_order_in_graph_is_fatal() {
        let mut t0 = TaskProto::new(0, 0, TaskType::Other, 0, 5, 1);
        t0.produced_regst_descs.push(shared_regst(10, 0, 2, 5));
        let mut t1 = TaskProto::new(1, 0, TaskType::Other, 0, 5, 1);
        t1.produced_regst_descs.push(shared_regst(11, 1, 3, 5));
        let mut plan = Plan::new(vec![t0, t1]);
        let task_graph = ChainPlanTaskGraphBuilder.build(&plan);
        let err = add_mem_sharing_critical_sections(&mut plan, &task_graph).unwrap_err();
        assert!(err.to_string().contains("order_in_graph"));
    }
}
