//! C8: binary search for the smallest II that both respects the
//! compute-bound floor (§ [crate::base_ii]) and keeps every memory zone
//! within budget.

use crate::feasibility::{calc_max_regst_desc_duration, MemZoneRegstDescs, MemoryModel};
use plan_model::{ActivityGraph, Plan, PlanIndex, Result};

const II_SEARCH_THRESHOLD: f64 = 1.0;

/// Smallest II at or above `base_ii` for which [MemoryModel::any_zone_out_of_memory]
/// is false, accurate to within [II_SEARCH_THRESHOLD]. `base_ii` itself must
/// already be a lower bound; the plan's largest single path duration is used
/// as the upper bound, since no regst-desc ever needs more than one
/// register once its II reaches its own full duration.
pub fn binary_search_ii(
    base_ii: f64,
    plan: &Plan,
    index: &PlanIndex,
    mz_regst_descs: &MemZoneRegstDescs,
    activity: &impl ActivityGraph,
    memory: &MemoryModel,
) -> Result<f64> {
    let max_duration = calc_max_regst_desc_duration(activity, mz_regst_descs);
    if memory.any_zone_out_of_memory(plan, index, mz_regst_descs, activity, max_duration)? {
        return Err(plan_model::Error::infeasible_at_max_duration(max_duration));
    }

    let mut l = base_ii;
    let mut r = max_duration;
    while (r - l) > II_SEARCH_THRESHOLD {
        let mid = (l + r) / 2.0;
        log::debug!("probing ii={mid}");
        if memory.any_zone_out_of_memory(plan, index, mz_regst_descs, activity, mid)? {
            l = mid;
        } else {
            r = mid;
        }
    }
    Ok(r)
}

#[cfg(test)]
mod tests {
    use super::*;
    use plan_model::collab::InMemoryActivityGraph;
    use plan_model::regst::MemCase;
    use plan_model::task::{TaskProto, TaskType};
    use plan_model::traits::ActEvent;
    use plan_model::{AvailableMemDesc, JobDescriptor, RegstDesc};
    use std::collections::HashMap;

    fn job() -> JobDescriptor {
        JobDescriptor {
            reserved_host_mem_byte: 0,
            reserved_device_mem_byte: 0,
            persistence_buf_byte: 0,
            num_of_batches_in_snapshot: 1,
            num_of_pieces_in_batch: 1,
            total_machine_num: 1,
            gpu_device_num: 0,
        }
    }

    #[test]
    fn search_converges_to_a_feasible_ii_within_threshold() {
        let mut t0 = TaskProto::new(0, 0, TaskType::Other, 0, 0, 1);
        t0.produced_regst_descs.push(RegstDesc::new(100, 0, MemCase::Host, 10));
        let mut t1 = TaskProto::new(1, 0, TaskType::Other, 0, 1, 1);
        let mut r1 = RegstDesc::new(101, 1, MemCase::Host, 10);
        r1.consumer_task_ids.insert(2);
        t1.produced_regst_descs.push(r1);
        let t2 = TaskProto::new(2, 0, TaskType::Other, 0, 2, 1);
        let plan = Plan::new(vec![t0, t1, t2]);

        let events = vec![
            ActEvent { actor_id: 1, work_stream_id: 1, duration: 100.0 },
            ActEvent { actor_id: 2, work_stream_id: 1, duration: 10.0 },
        ];
        let activity = InMemoryActivityGraph::build(&plan, events);

        let mut amd = AvailableMemDesc::new();
        amd.set_capacity(0, 0, 30);
        let record_load = HashMap::new();
        let memory = MemoryModel {
            job: &job(),
            amd: &amd,
            record_load_task_num: &record_load,
            host_zone_index: 0,
        };
        let index = plan.index();
        let mz = MemZoneRegstDescs::build(&plan, 0);

        let ii = binary_search_ii(1.0, &plan, &index, &mz, &activity, &memory).unwrap();
        assert!(!memory.any_zone_out_of_memory(&plan, &index, &mz, &activity, ii).unwrap());
        assert!(ii >= 1.0);
    }
}
