//! C7: whether a plan fits in its per-`(machine, memory zone)` budgets at a
//! given II. The oracle [MemoryModel::any_zone_out_of_memory] is what
//! [crate::search::binary_search_ii] bisects on.

use crate::regst_num::calc_regst_num;
use plan_model::ids::{MachineId, MemSharedId, RegstDescId, ZoneId};
use plan_model::{ActivityGraph, AvailableMemDesc, Error, JobDescriptor, Plan, PlanIndex, Result};
use std::collections::HashMap;

/// Every regst-desc in the plan, grouped by the `(machine, memory zone)`
/// it's allocated in. Built once per `Improve` run and reused across every
/// II the binary search tries.
pub struct MemZoneRegstDescs {
    zones: HashMap<(MachineId, ZoneId), Vec<RegstDescId>>,
}

impl MemZoneRegstDescs {
    pub fn build(plan: &Plan, host_zone_index: ZoneId) -> Self {
        let mut zones: HashMap<(MachineId, ZoneId), Vec<RegstDescId>> = HashMap::new();
        for task in &plan.tasks {
            for regst in &task.produced_regst_descs {
                let zone_id = regst.mem_case.zone_id(host_zone_index);
                zones.entry((task.machine_id, zone_id)).or_default().push(regst.regst_desc_id);
            }
        }
        MemZoneRegstDescs { zones }
    }

    fn iter(&self) -> impl Iterator<Item = (MachineId, ZoneId, &[RegstDescId])> {
        self.zones.iter().map(|(&(m, z), ids)| (m, z, ids.as_slice()))
    }
}

/// Bundles the plan-wide quantities the memory oracle needs so they don't
/// have to be threaded through every call individually.
pub struct MemoryModel<'a> {
    pub job: &'a JobDescriptor,
    pub amd: &'a AvailableMemDesc,
    pub record_load_task_num: &'a HashMap<MachineId, u64>,
    pub host_zone_index: ZoneId,
}

impl<'a> MemoryModel<'a> {
    /// Usable capacity of one zone after the ambient reservations are
    /// subtracted: a flat reservation on every device zone, plus a flat
    /// reservation and a per-record-load-task persistence buffer on the
    /// host zone.
    pub fn available_mem_size(&self, machine_id: MachineId, zone_id: ZoneId) -> Result<u64> {
        let mut mem_size = self.amd.raw_capacity(machine_id, zone_id) as i64;
        if zone_id == self.host_zone_index {
            mem_size -= self.job.reserved_host_mem_byte as i64;
            let record_load_tasks = self.record_load_task_num.get(&machine_id).copied().unwrap_or(0);
            mem_size -= self.job.persistence_buf_byte as i64 * record_load_tasks as i64;
        } else {
            mem_size -= self.job.reserved_device_mem_byte as i64;
        }
        if mem_size <= 0 {
            return Err(Error::non_positive_available_mem(machine_id, zone_id, mem_size));
        }
        Ok(mem_size as u64)
    }

    /// Total bytes `regst_desc_ids` would consume at II `ii`: unshared
    /// regst-descs pay for every register they hold, while every group of
    /// regst-descs sharing a `mem_shared_id` pays once, for its largest
    /// member (each such regst-desc is required to settle on exactly one
    /// register, §4.3's mem-share invariant).
    pub fn calc_memory_consumed(
        &self,
        plan: &Plan,
        index: &PlanIndex,
        regst_desc_ids: &[RegstDescId],
        activity: &impl ActivityGraph,
        ii: f64,
    ) -> Result<u64> {
        let mut mem_consumed = 0u64;
        let mut mem_shared_max_bytes: HashMap<MemSharedId, u64> = HashMap::new();
        for &id in regst_desc_ids {
            let regst = index.regst_desc(plan, id)?;
            let regst_num = calc_regst_num(regst, activity, self.job, ii);
            if regst.is_mem_shared() {
                if regst_num != 1 {
                    return Err(Error::mem_shared_register_mismatch(id, regst_num));
                }
                let slot = mem_shared_max_bytes.entry(regst.mem_shared_id).or_insert(0);
                *slot = (*slot).max(regst.byte_size);
            } else {
                mem_consumed += regst_num * regst.byte_size;
            }
        }
        mem_consumed += mem_shared_max_bytes.values().sum::<u64>();
        Ok(mem_consumed)
    }

    /// Whether any `(machine, zone)` would be over budget at II `ii`.
    pub fn any_zone_out_of_memory(
        &self,
        plan: &Plan,
        index: &PlanIndex,
        mz_regst_descs: &MemZoneRegstDescs,
        activity: &impl ActivityGraph,
        ii: f64,
    ) -> Result<bool> {
        for (machine_id, zone_id, regst_desc_ids) in mz_regst_descs.iter() {
            let consumed = self.calc_memory_consumed(plan, index, regst_desc_ids, activity, ii)?;
            if consumed >= self.available_mem_size(machine_id, zone_id)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// The largest single-consumer path duration across the whole plan: an
/// upper bound on the II that is always feasible, since at that II every
/// regst-desc needs at most one register.
pub fn calc_max_regst_desc_duration(activity: &impl ActivityGraph, mz_regst_descs: &MemZoneRegstDescs) -> f64 {
    let mut max_duration = 0.0_f64;
    for (_, _, regst_desc_ids) in mz_regst_descs.iter() {
        for &id in regst_desc_ids {
            for &duration in activity.path_durations(id).values() {
                max_duration = max_duration.max(duration);
            }
        }
    }
    max_duration
}

pub fn record_load_task_num(plan: &Plan, total_machine_num: u64) -> HashMap<MachineId, u64> {
    let mut counts: HashMap<MachineId, u64> = (0..total_machine_num as MachineId)
        .map(|m| (m, 0))
        .collect();
    for task in &plan.tasks {
        if task.task_type == plan_model::task::TaskType::RecordLoad {
            *counts.entry(task.machine_id).or_insert(0) += 1;
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use plan_model::collab::InMemoryActivityGraph;
    use plan_model::regst::MemCase;
    use plan_model::task::{TaskProto, TaskType};
    use plan_model::traits::ActEvent;
    use plan_model::RegstDesc;

    fn job() -> JobDescriptor {
        JobDescriptor {
            reserved_host_mem_byte: 100,
            reserved_device_mem_byte: 0,
            persistence_buf_byte: 0,
            num_of_batches_in_snapshot: 1,
            num_of_pieces_in_batch: 1,
            total_machine_num: 1,
            gpu_device_num: 0,
        }
    }

    #[test]
    fn available_mem_size_subtracts_host_reservation() {
        let mut amd = AvailableMemDesc::new();
        amd.set_capacity(0, 0, 1000);
        let record_load = HashMap::new();
        let model = MemoryModel {
            job: &job(),
            amd: &amd,
            record_load_task_num: &record_load,
            host_zone_index: 0,
        };
        assert_eq!(model.available_mem_size(0, 0).unwrap(), 900);
    }

    #[test]
    fn zero_or_negative_available_mem_is_fatal() {
        let mut amd = AvailableMemDesc::new();
        amd.set_capacity(0, 0, 50);
        let record_load = HashMap::new();
        let model = MemoryModel {
            job: &job(),
            amd: &amd,
            record_load_task_num: &record_load,
            host_zone_index: 0,
        };
        assert!(model.available_mem_size(0, 0).is_err());
    }

    #[test]
    fn mem_shared_group_pays_once_for_its_largest_member() {
        let mut t0 = TaskProto::new(0, 0, TaskType::Other, 0, 0, 1);
        let mut r0 = RegstDesc::new(100, 0, MemCase::Host, 64);
        r0.mem_shared_id = 7;
        let mut r1 = RegstDesc::new(101, 0, MemCase::Host, 128);
        r1.mem_shared_id = 7;
        t0.produced_regst_descs.push(r0);
        t0.produced_regst_descs.push(r1);
        let plan = Plan::new(vec![t0]);
        let index = plan.index();
        let activity = InMemoryActivityGraph::build(&plan, Vec::<ActEvent>::new());

        let amd = AvailableMemDesc::new();
        let record_load = HashMap::new();
        let model = MemoryModel {
            job: &job(),
            amd: &amd,
            record_load_task_num: &record_load,
            host_zone_index: 0,
        };
        let consumed = model
            .calc_memory_consumed(&plan, &index, &[100, 101], &activity, 1.0)
            .unwrap();
        assert_eq!(consumed, 128);
    }
}
