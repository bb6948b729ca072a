//! C3: assigns `mem_shared_id`s across the whole plan by coloring each
//! sharing-candidate pool's lifetime-intersection graph and minting one
//! fresh id per color class.

use crate::analysis::{lifetime_graph, sharing_candidates};
use plan_model::ids::RegstDescId;
use plan_model::{IdentifierManager, Plan, PlanTaskGraph};
use std::collections::HashSet;

fn compute_color_classes(
    plan: &Plan,
    plan_task_graph: &impl PlanTaskGraph,
    identifiers: &impl IdentifierManager,
) -> Vec<Vec<RegstDescId>> {
    let index = plan.index();
    let mut classes = Vec::new();

    for pool in sharing_candidates::without_consumer_pools(plan, identifiers) {
        classes.extend(lifetime_graph::color_by_lifetime(&pool, |id| {
            let producer = index
                .regst_desc(plan, id)
                .map(|r| r.producer_task_id)
                .unwrap_or_default();
            HashSet::from([producer])
        }));
    }

    for pool in sharing_candidates::with_consumer_pools(plan) {
        classes.extend(lifetime_graph::color_by_lifetime(&pool, |id| {
            plan_task_graph.compute_lifetime_same_chain_actor_ids(id)
        }));
    }

    classes
}

/// Mutates `plan` in place: every color class, including singletons, gets
/// its own fresh `mem_shared_id`. A singleton still needs one (it marks the
/// regst-desc as settled to a single register) even though it needs no
/// critical-section edge -- `passes::critical_section` skips groups of one.
pub fn improve_mem_shared_id(
    plan: &mut Plan,
    plan_task_graph: &impl PlanTaskGraph,
    identifiers: &impl IdentifierManager,
) -> plan_model::Result<()> {
    let classes = compute_color_classes(plan, plan_task_graph, identifiers);
    let index = plan.index();
    for class in classes {
        let mem_shared_id = identifiers.new_mem_shared_id();
        for &id in &class {
            index.regst_desc_mut(plan, id)?.mem_shared_id = mem_shared_id;
        }
    }
    Ok(())
}
