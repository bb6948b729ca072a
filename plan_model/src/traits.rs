use crate::ids::{MachineId, MemSharedId, RegstDescId, TaskId, WorkStreamId, ZoneId};
use crate::plan::Plan;
use crate::task::TaskProto;
use std::collections::HashSet;

/// One recorded activation of an actor during profiling.
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy)]
pub struct ActEvent {
    pub actor_id: TaskId,
    pub work_stream_id: WorkStreamId,
    /// Wall-time duration of this activation, in microseconds.
    pub duration: f64,
}

/// The capability set the improver needs from a profile's activity graph.
/// Implementations may back this with a real activity DAG; the improver
/// only ever calls these methods (§6, §9 "polymorphism over activity/plan
/// graphs" -- tests substitute in-memory fixtures for this trait).
pub trait ActivityGraph {
    /// Number of times `actor_id` was activated during profiling.
    fn act_cnt(&self, actor_id: TaskId) -> u64;

    /// All actor-ids with at least one recorded activation.
    fn actor_ids(&self) -> Vec<TaskId>;

    /// Every recorded activation node, in profile order.
    fn nodes(&self) -> &[ActEvent];

    fn task_proto(&self, actor_id: TaskId) -> Option<&TaskProto>;

    /// `(regst_desc_id, consumer_actor_id) -> mean path duration`, over
    /// every producer -> consumer dependency path in the plan.
    fn path_durations(&self, regst_desc_id: RegstDescId) -> &std::collections::HashMap<TaskId, f64>;

    /// `(regst_desc_id, consumer_actor_id) -> path II-scale`, the raw scale
    /// before the model-save substitution in §4.6 is applied.
    fn path_ii_scales(&self, regst_desc_id: RegstDescId) -> &std::collections::HashMap<TaskId, f64>;
}

/// The capability set the improver needs from the plan-task graph: chain
/// membership, lifetime computation, and same-area reachability.
pub trait PlanTaskGraph {
    fn task_proto(&self, task_id: TaskId) -> Option<&TaskProto>;

    /// All task-ids on the producer-to-consumer path for `regst_desc_id`,
    /// inclusive, restricted to the producer's chain (§4, with-consumer
    /// lifetime policy).
    fn compute_lifetime_same_chain_actor_ids(&self, regst_desc_id: RegstDescId) -> HashSet<TaskId>;

    /// Whether `dst` is reachable from `src` under the reachability
    /// relation C4 uses to prune the tail-consumer set down to sinks.
    fn is_reachable_in_same_area(&self, src: TaskId, dst: TaskId) -> bool;
}

/// Builds a [PlanTaskGraph] from a [Plan]. A separate trait (rather than a
/// constructor on [PlanTaskGraph] itself) because the driver needs to build
/// one twice, once per `Plan` snapshot in a run (§4.9 Phase B).
pub trait PlanTaskGraphBuilder {
    type Graph: PlanTaskGraph;
    fn build(&self, plan: &Plan) -> Self::Graph;
}

/// Identifiers minted by a process-wide identifier manager, consulted
/// read-only by the driver (mem-shared-id minting uses interior mutability
/// so the trait can take `&self` throughout, §5).
pub trait IdentifierManager {
    /// Monotonically increasing, never reused within one improver run.
    fn new_mem_shared_id(&self) -> MemSharedId;
    fn global_work_stream_id(&self, task_id: TaskId) -> WorkStreamId;
    fn machine_id(&self, task_id: TaskId) -> MachineId;
    /// Conventional host-zone index, equal to the GPU device count.
    fn host_zone_index(&self) -> ZoneId;
}
