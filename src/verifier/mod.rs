mod hard;
mod soft;

pub use hard::*;
pub use soft::*;

use crate::gga::FitnessBreakdown;
use crate::scheduler::{MergedGroups, ResourceIndex, VariablePairs};
use crate::types::{Assignment, SchedulerConfig, SchedulingVariable, VariableId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Report category for one finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Critical,
    Warning,
    Info,
}

impl Severity {
    pub fn name(&self) -> &'static str {
        match self {
            Severity::Critical => "CRITICAL",
            Severity::Warning => "WARNING",
            Severity::Info => "INFO",
        }
    }
}

/// One constraint finding against a placed assignment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub constraint: String,
    pub severity: Severity,
    pub message: String,
    pub variable_id: Option<VariableId>,
}

/// Categorised verification result over a completed assignment list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationReport {
    pub violations: Vec<Violation>,
    pub total_violations: usize,
    pub by_severity: BTreeMap<String, usize>,
    pub by_constraint: BTreeMap<String, usize>,
    pub soft: FitnessBreakdown,
}

impl VerificationReport {
    pub fn is_feasible(&self) -> bool {
        self.critical_count() == 0
    }

    pub fn critical_count(&self) -> usize {
        self.by_severity
            .get(Severity::Critical.name())
            .copied()
            .unwrap_or(0)
    }
}

/// Walk a finished assignment list and produce the typed report. Pure: the
/// same inputs always yield the same report, and canonical-merge excuses are
/// applied exactly as the solver applies them.
pub fn verify_timetable(
    assignments: &[Assignment],
    res: &ResourceIndex,
    pairs: &VariablePairs,
    groups: &MergedGroups,
    variables: &[SchedulingVariable],
    config: &SchedulerConfig,
) -> VerificationReport {
    let mut violations = check_hard_constraints(assignments, res, pairs, groups, variables, config);
    violations.extend(fallback_annotations(assignments, variables));

    let soft = soft_breakdown(assignments, res, pairs, groups, variables, config);

    let mut by_severity: BTreeMap<String, usize> = BTreeMap::new();
    let mut by_constraint: BTreeMap<String, usize> = BTreeMap::new();
    let mut counted = 0usize;
    for violation in &violations {
        *by_severity.entry(violation.severity.name().to_string()).or_insert(0) += 1;
        *by_constraint.entry(violation.constraint.clone()).or_insert(0) += 1;
        if violation.severity != Severity::Info {
            counted += 1;
        }
    }

    VerificationReport {
        total_violations: counted,
        violations,
        by_severity,
        by_constraint,
        soft,
    }
}
