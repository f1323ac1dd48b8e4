use super::{Severity, Violation};
use crate::scheduler::{
    ConstraintChecker, ConstraintContext, ConstraintKind, MergedGroups, ResourceIndex,
    VariablePairs,
};
use crate::types::{Assignment, SchedulerConfig, SchedulingVariable};

/// Replay every assignment through the constraint engine, collecting one
/// finding per breached constraint. Replays in list order, so the later of
/// two clashing rows is the one reported.
pub fn check_hard_constraints(
    assignments: &[Assignment],
    res: &ResourceIndex,
    pairs: &VariablePairs,
    groups: &MergedGroups,
    variables: &[SchedulingVariable],
    config: &SchedulerConfig,
) -> Vec<Violation> {
    let checker = ConstraintChecker::new(config.allow_consecutive_lab_sessions);
    let mut ctx = ConstraintContext::new(res, pairs, groups, variables);
    let mut violations = Vec::new();

    for assignment in assignments {
        for kind in ConstraintKind::ALL {
            if let Some(message) = checker.check(kind, assignment, &ctx) {
                violations.push(Violation {
                    constraint: kind.name().to_string(),
                    severity: severity_of(kind),
                    message,
                    variable_id: Some(assignment.variable_id.clone()),
                });
            }
        }
        ctx.add_assignment(assignment);
    }
    violations
}

/// Pre-solver room-kind downgrades are feasibility decisions, not
/// violations; they surface as INFO so readers can see them
pub fn fallback_annotations(
    assignments: &[Assignment],
    variables: &[SchedulingVariable],
) -> Vec<Violation> {
    let mut annotations = Vec::new();
    for variable in variables {
        let fallback = match &variable.room_fallback {
            Some(f) => f,
            None => continue,
        };
        if assignments.iter().any(|a| a.variable_id == variable.id) {
            annotations.push(Violation {
                constraint: "RoomKindFallback".to_string(),
                severity: Severity::Info,
                message: format!(
                    "'{}' downgraded {} to {}: {}",
                    variable.id,
                    fallback.from.display_name(),
                    fallback.to.display_name(),
                    fallback.reason
                ),
                variable_id: Some(variable.id.clone()),
            });
        }
    }
    annotations
}

fn severity_of(kind: ConstraintKind) -> Severity {
    if kind.is_critical() {
        Severity::Critical
    } else {
        Severity::Warning
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::CanonicalRegistry;
    use crate::types::{
        CanonicalId, Course, CourseId, Lecturer, LecturerId, LecturerRole, Program, ProgramId,
        Room, RoomId, RoomKind, ScheduleInput, Term, TimeSlot, VariableId, Weekday,
    };
    use std::collections::BTreeMap;

    fn world() -> ScheduleInput {
        let mut families = BTreeMap::new();
        families.insert(
            CanonicalId("FAM".to_string()),
            vec!["C1".to_string(), "C2".to_string()],
        );
        ScheduleInput {
            lecturers: vec![Lecturer {
                id: LecturerId("l1".to_string()),
                name: "L1".to_string(),
                role: LecturerRole::FullTime,
                faculty: String::new(),
                specializations: vec!["C1".to_string(), "C2".to_string()],
                availability: BTreeMap::new(),
            }],
            rooms: vec![Room {
                id: RoomId("r1".to_string()),
                name: "R1".to_string(),
                capacity: 60,
                kind: RoomKind::Theory,
                specializations: vec![],
                available: true,
                building: String::new(),
                campus: String::new(),
            }],
            courses: vec![course("c1", "C1"), course("c2", "C2")],
            programs: vec![
                program("p1", 30, &["c1"]),
                program("p2", 25, &["c2"]),
            ],
            registry: CanonicalRegistry::from_families(families),
            config: crate::types::SchedulerConfig::default(),
        }
    }

    fn course(id: &str, code: &str) -> Course {
        Course {
            id: CourseId(id.to_string()),
            code: code.to_string(),
            name: format!("{code} course"),
            weekly_hours: 2,
            credits: 4,
            preferred_room_kind: RoomKind::Theory,
            course_group: None,
            preferred_term: None,
            foundational: false,
            prerequisites: vec![],
        }
    }

    fn program(id: &str, size: u32, courses: &[&str]) -> Program {
        Program {
            id: ProgramId(id.to_string()),
            code: id.to_string(),
            batch: "2024".to_string(),
            semester: 1,
            size,
            courses: courses.iter().map(|c| CourseId(c.to_string())).collect(),
        }
    }

    fn assignment(var: &str, course: &str, program: &str, slot: TimeSlot) -> Assignment {
        Assignment {
            variable_id: VariableId(var.to_string()),
            course_id: CourseId(course.to_string()),
            program_id: ProgramId(program.to_string()),
            lecturer_id: LecturerId("l1".to_string()),
            room_id: RoomId("r1".to_string()),
            slot,
            term: Term::One,
            session_number: 1,
        }
    }

    #[test]
    fn test_clean_list_has_no_findings() {
        let input = world();
        let res = ResourceIndex::build(&input, &[]);
        let assignments = vec![
            assignment("v1", "c1", "p1", TimeSlot::new(Weekday::Mon, 0)),
            assignment("v2", "c2", "p2", TimeSlot::new(Weekday::Tue, 0)),
        ];
        let violations = check_hard_constraints(
            &assignments,
            &res,
            &VariablePairs::new(),
            &MergedGroups::default(),
            &[],
            &input.config,
        );
        assert!(violations.is_empty(), "got {violations:?}");
    }

    #[test]
    fn test_canonical_rows_in_one_room_slot_are_not_double_booked() {
        let input = world();
        let res = ResourceIndex::build(&input, &[]);
        let slot = TimeSlot::new(Weekday::Mon, 0);

        // Same family, same session, same room and lecturer: a legitimate merge
        let assignments = vec![
            assignment("v1", "c1", "p1", slot),
            assignment("v2", "c2", "p2", slot),
        ];
        let violations = check_hard_constraints(
            &assignments,
            &res,
            &VariablePairs::new(),
            &MergedGroups::default(),
            &[],
            &input.config,
        );
        assert!(violations
            .iter()
            .all(|v| v.constraint != "NoDoubleBooking"), "got {violations:?}");
    }

    #[test]
    fn test_true_clash_is_reported_on_the_later_row() {
        let input = world();
        let res = ResourceIndex::build(&input, &[]);
        let slot = TimeSlot::new(Weekday::Mon, 0);

        let mut second = assignment("v2", "c2", "p2", slot);
        second.session_number = 2; // different session, no merge excuse
        let assignments = vec![assignment("v1", "c1", "p1", slot), second];

        let violations = check_hard_constraints(
            &assignments,
            &res,
            &VariablePairs::new(),
            &MergedGroups::default(),
            &[],
            &input.config,
        );
        let clash: Vec<_> = violations
            .iter()
            .filter(|v| v.constraint == "NoDoubleBooking")
            .collect();
        assert_eq!(clash.len(), 1);
        assert_eq!(clash[0].variable_id, Some(VariableId("v2".to_string())));
        assert_eq!(clash[0].severity, Severity::Critical);
    }
}
