use crate::canonical::matches_specialization;
use crate::error::{Result, SchedulerError};
use crate::types::{Course, CourseId, LecturerRole, ScheduleInput};
use std::collections::HashSet;

/// Validation result with collected errors
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    pub fn add_warning(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }
}

/// Validate all input data. Hard failures surface as a configuration error;
/// warnings describe inputs the solver can work around but probably should
/// not have been given.
pub fn validate_input(input: &ScheduleInput) -> Result<ValidationResult> {
    let mut result = ValidationResult::default();

    check_duplicate_ids(input, &mut result);
    check_catalogue(input, &mut result);

    let course_ids: HashSet<&CourseId> = input.courses.iter().map(|c| &c.id).collect();

    for course in &input.courses {
        if course.weekly_hours == 0 || course.weekly_hours % 2 != 0 {
            result.add_error(format!(
                "Course '{}' has weekly_hours {}; must be a positive even number",
                course.id, course.weekly_hours
            ));
        }
        for prereq in &course.prerequisites {
            if !course_ids.contains(prereq) {
                result.add_warning(format!(
                    "Course '{}' lists unknown prerequisite '{}'",
                    course.id, prereq
                ));
            }
        }
    }

    for program in &input.programs {
        if program.semester == 0 || program.semester > 6 {
            result.add_error(format!(
                "Program '{}' has semester {}; expected 1..=6",
                program.id, program.semester
            ));
        }
        for course_id in &program.courses {
            if !course_ids.contains(course_id) {
                result.add_error(format!(
                    "Program '{}' references unknown course '{}'",
                    program.id, course_id
                ));
            }
        }
    }

    // Every course should have at least one canonically qualified lecturer
    for course in &input.courses {
        let qualified = input
            .lecturers
            .iter()
            .any(|l| matches_specialization(course, &l.specializations, &input.registry));
        if !qualified {
            result.add_warning(format!(
                "Course '{}' has no canonically qualified lecturer",
                course.id
            ));
        }
    }

    // Groups larger than every room cannot be seated without splitting
    let max_capacity = input.rooms.iter().map(|r| r.capacity).max().unwrap_or(0);
    for program in &input.programs {
        if program.size > max_capacity {
            result.add_warning(format!(
                "Program '{}' ({} students) exceeds the largest room capacity ({})",
                program.id, program.size, max_capacity
            ));
        }
    }

    // A part-timer with availability should name labels the catalogue has
    let labels: HashSet<String> = input
        .config
        .catalogue
        .periods
        .iter()
        .map(|p| p.label())
        .collect();
    for lecturer in &input.lecturers {
        if lecturer.role != LecturerRole::PartTime {
            continue;
        }
        for (day, windows) in &lecturer.availability {
            for window in windows {
                if !labels.contains(window) {
                    result.add_warning(format!(
                        "Lecturer '{}' availability '{} {}' matches no catalogue block",
                        lecturer.id, day, window
                    ));
                }
            }
        }
    }

    if !result.is_valid() {
        return Err(SchedulerError::ConfigInvalid(format!(
            "{} errors:\n{}",
            result.errors.len(),
            result.errors.join("\n")
        ))
        .into());
    }

    Ok(result)
}

fn check_duplicate_ids(input: &ScheduleInput, result: &mut ValidationResult) {
    let mut seen = HashSet::new();
    for lecturer in &input.lecturers {
        if !seen.insert(&lecturer.id) {
            result.add_error(format!("Duplicate lecturer ID: '{}'", lecturer.id));
        }
    }
    let mut seen = HashSet::new();
    for room in &input.rooms {
        if !seen.insert(&room.id) {
            result.add_error(format!("Duplicate room ID: '{}'", room.id));
        }
    }
    let mut seen = HashSet::new();
    for course in &input.courses {
        if !seen.insert(&course.id) {
            result.add_error(format!("Duplicate course ID: '{}'", course.id));
        }
    }
    let mut seen = HashSet::new();
    for program in &input.programs {
        if !seen.insert(&program.id) {
            result.add_error(format!("Duplicate program ID: '{}'", program.id));
        }
    }
}

fn check_catalogue(input: &ScheduleInput, result: &mut ValidationResult) {
    let catalogue = &input.config.catalogue;
    if catalogue.periods.is_empty() {
        result.add_error("Slot catalogue has no periods");
    }
    if catalogue.days.is_empty() {
        result.add_error("Slot catalogue has no teaching days");
    }
    for period in &catalogue.periods {
        match (period.start_minutes(), period.end_minutes()) {
            (Some(start), Some(end)) if start < end => {}
            (Some(_), Some(_)) => result.add_error(format!(
                "Catalogue block '{}' ends before it starts",
                period.id
            )),
            _ => result.add_error(format!(
                "Catalogue block '{}' has malformed times '{}'-'{}'",
                period.id, period.start, period.end
            )),
        }
    }
}

/// Whether a course list contains ill-formed pairing: members of one pair
/// group forced into opposite terms
pub fn pairing_conflicts(courses: &[Course]) -> Vec<String> {
    use std::collections::HashMap;
    let mut by_group: HashMap<&str, HashSet<u8>> = HashMap::new();
    for course in courses {
        if let (Some(group), Some(term)) = (&course.course_group, course.preferred_term) {
            by_group.entry(group).or_default().insert(term.number());
        }
    }
    by_group
        .into_iter()
        .filter(|(_, terms)| terms.len() > 1)
        .map(|(group, _)| group.to_string())
        .collect()
}
