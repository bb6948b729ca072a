//! Reference implementations of the collaborator traits in [crate::traits].
//!
//! These exist so the crate is runnable end-to-end without a caller having
//! to write their own activity/plan-task graph first. They are deliberately
//! simple: constructing a real activity graph from profiler events, and a
//! real plan-task graph with general reachability, is explicitly out of
//! scope for the improver core (the "hard part" is §4.1-§4.9, not this).
//! Tests of the core algorithms build small hand-written fixtures instead
//! of going through these.

use crate::ids::{ChainId, MachineId, MemSharedId, RegstDescId, TaskId, WorkStreamId, ZoneId};
use crate::plan::Plan;
use crate::task::TaskProto;
use crate::traits::{ActEvent, ActivityGraph, IdentifierManager, PlanTaskGraph, PlanTaskGraphBuilder};
use std::cell::Cell;
use std::collections::{HashMap, HashSet};

/// Builds path-duration/II-scale maps from per-actor activation totals
/// rather than from a true per-activation dependency DAG: a path from a
/// regst-desc's producer to one of its consumers is approximated by the
/// producer's mean activation duration, and every path's II-scale defaults
/// to `1.0`. This is a sound enough stand-in to drive the numeric core, but
/// it is not a faithful activity graph -- a real one would measure the
/// wall-clock gap between matching producer/consumer activations directly.
pub struct InMemoryActivityGraph {
    act_cnt: HashMap<TaskId, u64>,
    nodes: Vec<ActEvent>,
    tasks: HashMap<TaskId, TaskProto>,
    path_durations: HashMap<RegstDescId, HashMap<TaskId, f64>>,
    path_ii_scales: HashMap<RegstDescId, HashMap<TaskId, f64>>,
    empty: HashMap<TaskId, f64>,
}

impl InMemoryActivityGraph {
    pub fn build(plan: &Plan, events: Vec<ActEvent>) -> Self {
        let mut act_cnt: HashMap<TaskId, u64> = HashMap::new();
        let mut duration_sum: HashMap<TaskId, f64> = HashMap::new();
        for event in &events {
            *act_cnt.entry(event.actor_id).or_insert(0) += 1;
            *duration_sum.entry(event.actor_id).or_insert(0.0) += event.duration;
        }
        let mean_duration = |actor_id: TaskId| -> f64 {
            let cnt = act_cnt.get(&actor_id).copied().unwrap_or(0);
            if cnt == 0 {
                0.0
            } else {
                duration_sum[&actor_id] / cnt as f64
            }
        };

        let mut tasks = HashMap::new();
        let mut path_durations: HashMap<RegstDescId, HashMap<TaskId, f64>> = HashMap::new();
        let mut path_ii_scales: HashMap<RegstDescId, HashMap<TaskId, f64>> = HashMap::new();
        for task in &plan.tasks {
            tasks.insert(task.task_id, task.clone());
            for regst in &task.produced_regst_descs {
                if regst.consumer_task_ids.is_empty() {
                    continue;
                }
                let durations = path_durations.entry(regst.regst_desc_id).or_default();
                let scales = path_ii_scales.entry(regst.regst_desc_id).or_default();
                let duration = mean_duration(regst.producer_task_id);
                for &consumer in &regst.consumer_task_ids {
                    durations.insert(consumer, duration);
                    scales.insert(consumer, 1.0);
                }
            }
        }

        InMemoryActivityGraph {
            act_cnt,
            nodes: events,
            tasks,
            path_durations,
            path_ii_scales,
            empty: HashMap::new(),
        }
    }
}

impl ActivityGraph for InMemoryActivityGraph {
    fn act_cnt(&self, actor_id: TaskId) -> u64 {
        self.act_cnt.get(&actor_id).copied().unwrap_or(0)
    }

    fn actor_ids(&self) -> Vec<TaskId> {
        self.act_cnt.keys().copied().collect()
    }

    fn nodes(&self) -> &[ActEvent] {
        &self.nodes
    }

    fn task_proto(&self, actor_id: TaskId) -> Option<&TaskProto> {
        self.tasks.get(&actor_id)
    }

    fn path_durations(&self, regst_desc_id: RegstDescId) -> &HashMap<TaskId, f64> {
        self.path_durations.get(&regst_desc_id).unwrap_or(&self.empty)
    }

    fn path_ii_scales(&self, regst_desc_id: RegstDescId) -> &HashMap<TaskId, f64> {
        self.path_ii_scales.get(&regst_desc_id).unwrap_or(&self.empty)
    }
}

/// A chain's tasks, ordered by `order_in_graph`.
struct Chain {
    tasks: Vec<TaskId>,
    position: HashMap<TaskId, usize>,
}

/// Treats each chain as a serial sequence ordered by `order_in_graph`: a
/// regst-desc's same-chain lifetime is the inclusive range from its
/// producer to its furthest consumer in that order, and `dst` is reachable
/// from `src` only when both are in the same chain and `src` does not come
/// after `dst`. Tasks in different chains are never considered reachable --
/// a deliberately conservative choice documented in SPEC_FULL.md §4.11;
/// plan construction (out of scope here) is what would normally supply a
/// richer, whole-plan reachability relation.
pub struct ChainPlanTaskGraph {
    tasks: HashMap<TaskId, TaskProto>,
    chain_of_task: HashMap<TaskId, ChainId>,
    chains: HashMap<ChainId, Chain>,
    regst_producer: HashMap<RegstDescId, TaskId>,
    regst_consumers: HashMap<RegstDescId, Vec<TaskId>>,
}

impl PlanTaskGraph for ChainPlanTaskGraph {
    fn task_proto(&self, task_id: TaskId) -> Option<&TaskProto> {
        self.tasks.get(&task_id)
    }

    fn compute_lifetime_same_chain_actor_ids(&self, regst_desc_id: RegstDescId) -> HashSet<TaskId> {
        let mut lifetime = HashSet::new();
        let Some(&producer) = self.regst_producer.get(&regst_desc_id) else {
            return lifetime;
        };
        lifetime.insert(producer);
        let Some(chain_id) = self.chain_of_task.get(&producer) else {
            return lifetime;
        };
        let Some(chain) = self.chains.get(chain_id) else {
            return lifetime;
        };
        let Some(&producer_pos) = chain.position.get(&producer) else {
            return lifetime;
        };
        let consumers = self.regst_consumers.get(&regst_desc_id).cloned().unwrap_or_default();
        let mut last_pos = producer_pos;
        for consumer in &consumers {
            if let Some(&pos) = chain.position.get(consumer) {
                last_pos = last_pos.max(pos);
            }
        }
        for &task_id in &chain.tasks[producer_pos..=last_pos] {
            lifetime.insert(task_id);
        }
        lifetime
    }

    fn is_reachable_in_same_area(&self, src: TaskId, dst: TaskId) -> bool {
        if src == dst {
            return false;
        }
        let (Some(src_chain), Some(dst_chain)) =
            (self.chain_of_task.get(&src), self.chain_of_task.get(&dst))
        else {
            return false;
        };
        if src_chain != dst_chain {
            return false;
        }
        let chain = &self.chains[src_chain];
        match (chain.position.get(&src), chain.position.get(&dst)) {
            (Some(&sp), Some(&dp)) => sp <= dp,
            _ => false,
        }
    }
}

pub struct ChainPlanTaskGraphBuilder;

impl PlanTaskGraphBuilder for ChainPlanTaskGraphBuilder {
    type Graph = ChainPlanTaskGraph;

    fn build(&self, plan: &Plan) -> ChainPlanTaskGraph {
        let mut tasks = HashMap::new();
        let mut chain_of_task = HashMap::new();
        let mut chain_tasks: HashMap<ChainId, Vec<TaskId>> = HashMap::new();
        let mut regst_producer = HashMap::new();
        let mut regst_consumers = HashMap::new();

        let mut ordered_tasks: Vec<&TaskProto> = plan.tasks.iter().collect();
        ordered_tasks.sort_by_key(|t| t.order_in_graph);
        for task in ordered_tasks {
            tasks.insert(task.task_id, task.clone());
            chain_of_task.insert(task.task_id, task.chain_id);
            chain_tasks.entry(task.chain_id).or_default().push(task.task_id);
            for regst in &task.produced_regst_descs {
                regst_producer.insert(regst.regst_desc_id, regst.producer_task_id);
                regst_consumers.insert(
                    regst.regst_desc_id,
                    regst.consumer_task_ids.iter().copied().collect(),
                );
            }
        }

        let chains = chain_tasks
            .into_iter()
            .map(|(chain_id, tasks)| {
                let position = tasks
                    .iter()
                    .enumerate()
                    .map(|(i, &t)| (t, i))
                    .collect();
                (chain_id, Chain { tasks, position })
            })
            .collect();

        ChainPlanTaskGraph {
            tasks,
            chain_of_task,
            chains,
            regst_producer,
            regst_consumers,
        }
    }
}

/// Monotonic counters behind interior mutability, so [IdentifierManager]
/// methods can take `&self` and the driver can treat the identifier manager
/// as a read-only dependency end to end (§5).
pub struct SequentialIdentifierManager {
    next_mem_shared_id: Cell<MemSharedId>,
    work_stream_id: HashMap<TaskId, WorkStreamId>,
    machine_id: HashMap<TaskId, MachineId>,
    host_zone_index: ZoneId,
}

impl SequentialIdentifierManager {
    pub fn build(plan: &Plan, gpu_device_num: u32) -> Self {
        let work_stream_id = plan
            .tasks
            .iter()
            .map(|t| (t.task_id, t.work_stream_id))
            .collect();
        let machine_id = plan.tasks.iter().map(|t| (t.task_id, t.machine_id)).collect();
        SequentialIdentifierManager {
            next_mem_shared_id: Cell::new(0),
            work_stream_id,
            machine_id,
            host_zone_index: gpu_device_num as ZoneId,
        }
    }
}

impl IdentifierManager for SequentialIdentifierManager {
    fn new_mem_shared_id(&self) -> MemSharedId {
        let id = self.next_mem_shared_id.get();
        self.next_mem_shared_id.set(id + 1);
        id
    }

    fn global_work_stream_id(&self, task_id: TaskId) -> WorkStreamId {
        self.work_stream_id.get(&task_id).copied().unwrap_or(task_id)
    }

    fn machine_id(&self, task_id: TaskId) -> MachineId {
        self.machine_id.get(&task_id).copied().unwrap_or(0)
    }

    fn host_zone_index(&self) -> ZoneId {
        self.host_zone_index
    }
}
