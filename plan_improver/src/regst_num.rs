//! C5: the continuous register-count/II relationship and the discrete
//! per-regst-desc register count it's used to derive.

use plan_model::task::TaskType;
use plan_model::{ActivityGraph, JobDescriptor};
use plan_model::regst::RegstDesc;

/// How many registers a path with a given duration, II, and II-scale needs,
/// as a continuous (pre-`ceil`) quantity. `ii_scale` is 1 for a simple
/// dataflow edge, and larger when the consumer runs less often than every
/// iteration (e.g. a periodic checkpoint).
pub fn calc_regst_num_continuous(duration: f64, ii: f64, ii_scale: f64) -> f64 {
    ((ii_scale - 1.0) * ii + duration) / (ii_scale * ii)
}

/// Inverse of [calc_regst_num_continuous]: the II a path needs to get by
/// with exactly `regst_num` registers.
pub fn calc_ii(duration: f64, regst_num: u64, ii_scale: f64) -> f64 {
    duration / ((regst_num as f64 - 1.0) * ii_scale + 1.0)
}

/// A consumer whose task is a model-save runs far less often than the
/// pipeline's steady-state rate, so its II-scale is widened to the number
/// of pipeline iterations between two checkpoints rather than whatever the
/// activity graph measured directly.
fn ii_scale_for_consumer(task_type: TaskType, raw_ii_scale: f64, num_of_pieces_in_snapshot: u64) -> f64 {
    match task_type {
        TaskType::ModelSave => num_of_pieces_in_snapshot as f64,
        _ => raw_ii_scale,
    }
}

/// `regst_num` a single regst-desc needs at a given II: the worst case
/// (largest) register count across every consumer path, clamped to the
/// regst-desc's own `[min_register_num, max_register_num]` bounds.
pub fn calc_regst_num(
    regst: &RegstDesc,
    activity: &impl ActivityGraph,
    job: &JobDescriptor,
    ii: f64,
) -> u64 {
    let durations = activity.path_durations(regst.regst_desc_id);
    let ii_scales = activity.path_ii_scales(regst.regst_desc_id);
    let mut regst_num = 0u64;
    for (&consumer_actor_id, &duration) in durations {
        let raw_ii_scale = ii_scales.get(&consumer_actor_id).copied().unwrap_or(1.0);
        let task_type = activity
            .task_proto(consumer_actor_id)
            .map(|t| t.task_type)
            .unwrap_or(TaskType::Other);
        let ii_scale = ii_scale_for_consumer(task_type, raw_ii_scale, job.num_of_pieces_in_snapshot());
        let path_regst_num = calc_regst_num_continuous(duration, ii, ii_scale).ceil() as u64;
        regst_num = regst_num.max(path_regst_num);
    }
    regst_num.clamp(regst.min_register_num, regst.max_register_num)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn continuous_regst_num_matches_closed_form() {
        // duration 10, ii 4, ii_scale 1 -> ((0)*4 + 10) / (1*4) = 2.5
        assert!((calc_regst_num_continuous(10.0, 4.0, 1.0) - 2.5).abs() < 1e-9);
    }

    #[test]
    fn calc_ii_is_the_inverse_relation() {
        let duration = 10.0;
        let ii = 4.0;
        let ii_scale = 1.0;
        let n = calc_regst_num_continuous(duration, ii, ii_scale).ceil();
        let back = calc_ii(duration, n as u64, ii_scale);
        // ceil(n) can only need an II <= the original one.
        assert!(back <= ii + 1e-9);
    }

    #[test]
    fn model_save_scale_uses_snapshot_period_not_raw_scale() {
        assert_eq!(ii_scale_for_consumer(TaskType::ModelSave, 1.0, 40), 40.0);
        assert_eq!(ii_scale_for_consumer(TaskType::Other, 3.0, 40), 3.0);
    }
}
