use crate::ids::{ChainId, MachineId, RegstDescId, TaskId, WorkStreamId};
use crate::regst::RegstDesc;
use std::collections::HashMap;

/// The only task kinds the numeric core distinguishes by name. Everything
/// else runs through the same `register_num`/`mem_shared_id` machinery
/// regardless of what it computes, so it collapses into `Other`.
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskType {
    /// Periodically checkpoints the model; amortized over
    /// `NumOfPiecesInSnapshot` activations (§4.6, §4.5).
    ModelSave,
    /// Loads training records from storage; counted for host-zone
    /// persistence-buffer reservations (§4.7).
    RecordLoad,
    Other,
}

/// Tag used on the producer side of a critical-section control edge.
pub const OUT_CTRL_TAG: &str = "out_ctrl_shared_mem_safe_guard";
/// Tag used on the consumer side of a critical-section control edge.
pub const IN_CTRL_TAG: &str = "in_ctrl";

#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct TaskProto {
    pub task_id: TaskId,
    pub machine_id: MachineId,
    pub task_type: TaskType,
    pub chain_id: ChainId,
    /// Total order over all tasks in the plan; must be unique within any one
    /// mem-share group (enforced in `passes::critical_section`).
    pub order_in_graph: i64,
    pub work_stream_id: WorkStreamId,
    pub produced_regst_descs: Vec<RegstDesc>,
    /// Regst-desc-ids consumed via a named control channel (only
    /// [crate::task::IN_CTRL_TAG] is used today, but the map shape matches
    /// the producer-side tagging in [Self::produced_regst_descs]).
    pub consumed_ctrl_regst_desc_ids: HashMap<String, Vec<RegstDescId>>,
}

impl TaskProto {
    pub fn new(
        task_id: TaskId,
        machine_id: MachineId,
        task_type: TaskType,
        chain_id: ChainId,
        order_in_graph: i64,
        work_stream_id: WorkStreamId,
    ) -> Self {
        TaskProto {
            task_id,
            machine_id,
            task_type,
            chain_id,
            order_in_graph,
            work_stream_id,
            produced_regst_descs: Vec::new(),
            consumed_ctrl_regst_desc_ids: HashMap::new(),
        }
    }

    /// Find the existing `out_ctrl_shared_mem_safe_guard` regst-desc this
    /// task produces, or create a fresh one via `next_id` (§4.10).
    pub fn find_or_create_out_ctrl(&mut self, next_id: &mut impl FnMut() -> RegstDescId) -> RegstDescId {
        if let Some(existing) = self
            .produced_regst_descs
            .iter()
            .find(|r| r.ctrl_tag.as_deref() == Some(OUT_CTRL_TAG))
        {
            return existing.regst_desc_id;
        }
        let id = next_id();
        self.produced_regst_descs
            .push(RegstDesc::new_ctrl(id, self.task_id, OUT_CTRL_TAG));
        id
    }

    /// Record that `regst_desc_id` is consumed via the `in_ctrl` channel,
    /// unless it is already recorded.
    pub fn add_consumed_ctrl(&mut self, regst_desc_id: RegstDescId) {
        let ids = self
            .consumed_ctrl_regst_desc_ids
            .entry(IN_CTRL_TAG.to_string())
            .or_default();
        if !ids.contains(&regst_desc_id) {
            ids.push(regst_desc_id);
        }
    }
}
