//! C6: the smallest II the busiest work stream's raw compute time alone
//! demands, before memory feasibility is considered at all. This is the
//! lower end of the binary search in [crate::search].

use plan_model::ids::WorkStreamId;
use plan_model::task::TaskType;
use plan_model::{ActivityGraph, JobDescriptor};
use std::collections::HashMap;

/// A model-save activation's measured duration is scaled down to the
/// fraction of a steady-state iteration it actually costs: it only runs
/// once every `num_of_pieces_in_snapshot` iterations, so its contribution
/// to any one iteration's critical path is its duration divided by how
/// often it ran during profiling, times how often it *would* run in
/// steady state.
fn formal_duration(
    task_type: TaskType,
    duration: f64,
    act_frequency: f64,
    num_of_pieces_in_snapshot: u64,
) -> f64 {
    if task_type == TaskType::ModelSave && act_frequency > 0.0 {
        let formal_run_frequency = 1.0 / num_of_pieces_in_snapshot as f64;
        (duration / act_frequency) * formal_run_frequency
    } else {
        duration
    }
}

/// The smallest feasible II ignoring memory: the busiest work stream's
/// total formal compute time per activation, normalized against the most
/// frequently activated actor in the plan.
pub fn calc_base_ii(activity: &impl ActivityGraph, job: &JobDescriptor) -> f64 {
    let max_act_cnt = activity
        .actor_ids()
        .iter()
        .map(|&id| activity.act_cnt(id))
        .max()
        .unwrap_or(0);
    if max_act_cnt == 0 {
        return 0.0;
    }

    let mut stream_total_calc_time: HashMap<WorkStreamId, f64> = HashMap::new();
    for event in activity.nodes() {
        let act_cnt = activity.act_cnt(event.actor_id);
        let act_frequency = act_cnt as f64 / max_act_cnt as f64;
        let task_type = activity
            .task_proto(event.actor_id)
            .map(|t| t.task_type)
            .unwrap_or(TaskType::Other);
        let formal = formal_duration(task_type, event.duration, act_frequency, job.num_of_pieces_in_snapshot());
        *stream_total_calc_time.entry(event.work_stream_id).or_insert(0.0) += formal;
    }

    stream_total_calc_time
        .values()
        .fold(0.0_f64, |acc, &total| acc.max(total / max_act_cnt as f64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use plan_model::collab::InMemoryActivityGraph;
    use plan_model::regst::MemCase;
    use plan_model::task::TaskProto;
    use plan_model::traits::ActEvent;
    use plan_model::{Plan, RegstDesc};

    fn job() -> JobDescriptor {
        JobDescriptor {
            reserved_host_mem_byte: 0,
            reserved_device_mem_byte: 0,
            persistence_buf_byte: 0,
            num_of_batches_in_snapshot: 10,
            num_of_pieces_in_batch: 4,
            total_machine_num: 1,
            gpu_device_num: 0,
        }
    }

    #[test]
    fn base_ii_is_zero_with_no_activity() {
        let plan = Plan::new(vec![]);
        let graph = InMemoryActivityGraph::build(&plan, vec![]);
        assert_eq!(calc_base_ii(&graph, &job()), 0.0);
    }

    #[test]
    fn base_ii_reflects_busiest_stream() {
        let mut t0 = TaskProto::new(0, 0, TaskType::Other, 0, 0, 1);
        t0.produced_regst_descs.push(RegstDesc::new(100, 0, MemCase::Host, 8));
        let plan = Plan::new(vec![t0]);
        let events = vec![
            ActEvent { actor_id: 0, work_stream_id: 1, duration: 4.0 },
            ActEvent { actor_id: 0, work_stream_id: 1, duration: 6.0 },
        ];
        let graph = InMemoryActivityGraph::build(&plan, events);
        // max_act_cnt = 2, stream total = 10, base_ii = 10 / 2 = 5
        assert!((calc_base_ii(&graph, &job()) - 5.0).abs() < 1e-9);
    }
}
