use crate::error::Result;
use crate::scheduler::TimetableRun;
use crate::types::Timetable;
use crate::verifier::Violation;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Serialize)]
struct ViolationsFile<'a> {
    timestamp: String,
    total_violations: usize,
    by_severity: &'a BTreeMap<String, usize>,
    by_constraint: &'a BTreeMap<String, usize>,
    violations: &'a [Violation],
}

/// Render the violations artefact for one term
pub fn generate_violations_json(run: &TimetableRun) -> Result<String> {
    let file = ViolationsFile {
        timestamp: chrono::Utc::now().to_rfc3339(),
        total_violations: run.report.total_violations,
        by_severity: &run.report.by_severity,
        by_constraint: &run.report.by_constraint,
        violations: &run.report.violations,
    };
    Ok(serde_json::to_string_pretty(&file)?)
}

/// Serialise the timetable itself, so it can be re-validated later
pub fn generate_timetable_json(timetable: &Timetable) -> Result<String> {
    Ok(serde_json::to_string_pretty(timetable)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Term;

    #[test]
    fn test_timetable_json_round_trips() {
        let timetable = Timetable::new(Term::Two);
        let json = generate_timetable_json(&timetable).unwrap();
        let back: Timetable = serde_json::from_str(&json).unwrap();
        assert_eq!(back.metadata.term, Term::Two);
    }
}
