use crate::ids::{MemSharedId, RegstDescId, TaskId, ZoneId, UNSHARED};
use std::collections::BTreeSet;

#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemCase {
    /// The host (CPU) memory zone of a machine.
    Host,
    /// A device memory zone, identified by its ordinal on the machine.
    Device(u32),
}

impl MemCase {
    /// Resolve to a zone id using the identifier manager's convention that
    /// the host zone's index equals the device count (see
    /// [crate::traits::IdentifierManager::host_zone_index]).
    pub fn zone_id(self, host_zone_index: ZoneId) -> ZoneId {
        match self {
            MemCase::Host => host_zone_index,
            MemCase::Device(ordinal) => ordinal as ZoneId,
        }
    }
}

/// A descriptor of a memory buffer passed between tasks. May exist in
/// multiple copies (`register_num` > 1) to allow pipelining.
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct RegstDesc {
    pub regst_desc_id: RegstDescId,
    pub producer_task_id: TaskId,
    pub consumer_task_ids: BTreeSet<TaskId>,
    pub enable_mem_sharing: bool,
    pub register_num: u64,
    pub min_register_num: u64,
    pub max_register_num: u64,
    pub mem_shared_id: MemSharedId,
    pub mem_case: MemCase,
    /// Byte size of one packed register instance.
    pub byte_size: u64,
    /// Debug tag used to identify control regst-descs
    /// (`"out_ctrl_shared_mem_safe_guard"`); `None` for payload regsts.
    pub ctrl_tag: Option<String>,
}

impl RegstDesc {
    pub fn is_control(&self) -> bool {
        self.ctrl_tag.is_some()
    }

    pub fn is_mem_shared(&self) -> bool {
        self.mem_shared_id != UNSHARED
    }

    /// A fresh payload regst-desc with no sharing and a single register.
    pub fn new(
        regst_desc_id: RegstDescId,
        producer_task_id: TaskId,
        mem_case: MemCase,
        byte_size: u64,
    ) -> Self {
        RegstDesc {
            regst_desc_id,
            producer_task_id,
            consumer_task_ids: BTreeSet::new(),
            enable_mem_sharing: false,
            register_num: 1,
            min_register_num: 1,
            max_register_num: 1,
            mem_shared_id: UNSHARED,
            mem_case,
            byte_size,
            ctrl_tag: None,
        }
    }

    /// A fresh control regst-desc: zero bytes, a single register, tagged by
    /// name so [crate::plan::TaskProto::find_or_create_out_ctrl] can find it
    /// again on a later call.
    pub fn new_ctrl(regst_desc_id: RegstDescId, producer_task_id: TaskId, tag: &str) -> Self {
        RegstDesc {
            regst_desc_id,
            producer_task_id,
            consumer_task_ids: BTreeSet::new(),
            enable_mem_sharing: false,
            register_num: 1,
            min_register_num: 1,
            max_register_num: 1,
            mem_shared_id: UNSHARED,
            mem_case: MemCase::Host,
            byte_size: 0,
            ctrl_tag: Some(tag.to_string()),
        }
    }
}
