use crate::ids::{MachineId, ZoneId};
use std::collections::HashMap;

/// Process-wide configuration threaded in as an explicit argument rather
/// than consulted through a global, per the driver's design notes on
/// singletons.
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy)]
pub struct JobDescriptor {
    pub reserved_host_mem_byte: u64,
    pub reserved_device_mem_byte: u64,
    pub persistence_buf_byte: u64,
    pub num_of_batches_in_snapshot: u64,
    pub num_of_pieces_in_batch: u64,
    pub total_machine_num: u64,
    pub gpu_device_num: u32,
}

impl JobDescriptor {
    /// `NumOfPiecesInSnapshot()`: how many training pieces elapse between
    /// two model-save activations, used to amortize model-save duration.
    pub fn num_of_pieces_in_snapshot(&self) -> u64 {
        self.num_of_batches_in_snapshot * self.num_of_pieces_in_batch
    }
}

/// Raw per-`(machine_id, memory_zone_id)` capacity, queried by the
/// feasibility oracle before reservations are subtracted.
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Default)]
pub struct AvailableMemDesc {
    capacity: HashMap<(MachineId, ZoneId), u64>,
}

impl AvailableMemDesc {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_capacity(&mut self, machine_id: MachineId, zone_id: ZoneId, bytes: u64) {
        self.capacity.insert((machine_id, zone_id), bytes);
    }

    /// Raw zone capacity before reservations are subtracted. Zones with no
    /// recorded capacity are treated as empty (0 bytes).
    pub fn raw_capacity(&self, machine_id: MachineId, zone_id: ZoneId) -> u64 {
        self.capacity
            .get(&(machine_id, zone_id))
            .copied()
            .unwrap_or(0)
    }
}
