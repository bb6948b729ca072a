//! The plan graph is an arena of flat integer ids rather than shared,
//! reference-counted nodes: a task or regst-desc is always looked up through
//! [crate::plan::Plan]'s indices, never held by pointer. This keeps the
//! model `Send`/`Sync` for free and avoids the ownership questions that a
//! graph-of-`Rc`s would raise.

/// Identifies a task (actor) in the plan.
pub type TaskId = i64;
/// Identifies a regst-desc (register descriptor) in the plan.
pub type RegstDescId = i64;
/// Identifies the machine a task runs on.
pub type MachineId = i64;
/// Identifies a memory zone within a machine (device ordinal, or the host zone).
pub type ZoneId = i64;
/// Identifies a chain: a group of tasks that execute serially together.
pub type ChainId = i64;
/// Identifies a hardware/logical work stream that executes its tasks serially.
pub type WorkStreamId = i64;
/// Identifies a mem-shared-id group. `-1` means "not mem-shared".
pub type MemSharedId = i64;

/// Sentinel for [crate::regst::RegstDesc::mem_shared_id] meaning "unshared".
pub const UNSHARED: MemSharedId = -1;
