use crate::gga::{FitnessBreakdown, FitnessEvaluator};
use crate::scheduler::{ConstraintChecker, MergedGroups, ResourceIndex, VariablePairs};
use crate::types::{Assignment, SchedulerConfig, SchedulingVariable};

/// Observed soft-metric scores for the report, computed with the same
/// evaluator the optimiser uses
pub fn soft_breakdown(
    assignments: &[Assignment],
    res: &ResourceIndex,
    pairs: &VariablePairs,
    groups: &MergedGroups,
    variables: &[SchedulingVariable],
    config: &SchedulerConfig,
) -> FitnessBreakdown {
    let evaluator = FitnessEvaluator::new(
        res,
        pairs,
        groups,
        variables,
        ConstraintChecker::new(config.allow_consecutive_lab_sessions),
        config.gga.weights.clone(),
    );
    evaluator.evaluate(assignments).breakdown
}
