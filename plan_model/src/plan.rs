use crate::ids::{RegstDescId, TaskId};
use crate::regst::RegstDesc;
use crate::task::TaskProto;
use regst_graph::Error;
use std::collections::HashMap;

/// A static dataflow execution plan: a flat list of tasks, each producing
/// zero or more regst-descs. Cross-references are always ids, resolved
/// through [PlanIndex] -- never shared pointers -- per the arena discipline
/// called out for this kind of graph.
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Default)]
pub struct Plan {
    pub tasks: Vec<TaskProto>,
}

impl Plan {
    pub fn new(tasks: Vec<TaskProto>) -> Self {
        Plan { tasks }
    }

    /// Build a fresh lookup index. Call once per pass that needs random
    /// access by task-id or regst-desc-id; never cached across a mutation
    /// since indices point at `Vec` positions.
    pub fn index(&self) -> PlanIndex {
        let mut task_pos = HashMap::new();
        let mut regst_pos = HashMap::new();
        for (ti, task) in self.tasks.iter().enumerate() {
            task_pos.insert(task.task_id, ti);
            for (ri, regst) in task.produced_regst_descs.iter().enumerate() {
                regst_pos.insert(regst.regst_desc_id, (ti, ri));
            }
        }
        PlanIndex {
            task_pos,
            regst_pos,
        }
    }

    pub fn regst_descs(&self) -> impl Iterator<Item = &RegstDesc> {
        self.tasks.iter().flat_map(|t| t.produced_regst_descs.iter())
    }

    pub fn next_regst_desc_id(&self) -> RegstDescId {
        1 + self
            .regst_descs()
            .map(|r| r.regst_desc_id)
            .max()
            .unwrap_or(0)
    }
}

/// Position index into a [Plan], rebuilt whenever the plan's task/regst
/// shape changes.
pub struct PlanIndex {
    task_pos: HashMap<TaskId, usize>,
    regst_pos: HashMap<RegstDescId, (usize, usize)>,
}

impl PlanIndex {
    pub fn task<'p>(&self, plan: &'p Plan, task_id: TaskId) -> Result<&'p TaskProto, Error> {
        let &ti = self
            .task_pos
            .get(&task_id)
            .ok_or_else(|| Error::unknown_task(task_id))?;
        Ok(&plan.tasks[ti])
    }

    pub fn task_mut<'p>(
        &self,
        plan: &'p mut Plan,
        task_id: TaskId,
    ) -> Result<&'p mut TaskProto, Error> {
        let &ti = self
            .task_pos
            .get(&task_id)
            .ok_or_else(|| Error::unknown_task(task_id))?;
        Ok(&mut plan.tasks[ti])
    }

    pub fn regst_desc<'p>(
        &self,
        plan: &'p Plan,
        regst_desc_id: RegstDescId,
    ) -> Result<&'p RegstDesc, Error> {
        let &(ti, ri) = self
            .regst_pos
            .get(&regst_desc_id)
            .ok_or_else(|| Error::unknown_regst_desc(regst_desc_id))?;
        Ok(&plan.tasks[ti].produced_regst_descs[ri])
    }

    pub fn regst_desc_mut<'p>(
        &self,
        plan: &'p mut Plan,
        regst_desc_id: RegstDescId,
    ) -> Result<&'p mut RegstDesc, Error> {
        let &(ti, ri) = self
            .regst_pos
            .get(&regst_desc_id)
            .ok_or_else(|| Error::unknown_regst_desc(regst_desc_id))?;
        Ok(&mut plan.tasks[ti].produced_regst_descs[ri])
    }
}
