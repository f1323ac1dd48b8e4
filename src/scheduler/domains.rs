use super::merger::VariableSet;
use crate::canonical::{matches_specialization, CanonicalRegistry};
use crate::types::{
    Course, CourseId, Lecturer, Room, RoomKind, RoomKindFallback, SchedulingVariable, SlotCatalogue,
    TimeSlot, VariableId,
};
use std::collections::HashMap;

/// Why a variable starts with nothing to choose from
#[derive(Debug, Clone)]
pub struct DomainDiagnostic {
    pub variable_id: VariableId,
    pub detail: String,
}

/// Attach candidate slots, lecturers and rooms to every variable.
///
/// Slot domains are the whole catalogue; each lecturer additionally carries
/// the subset of slots they admit, which is what part-time availability
/// actually restricts. Room domains filter on kind and capacity, with a
/// recorded downgrade to theory rooms when a lab course has no lab large
/// enough.
pub fn build_domains(
    set: &mut VariableSet,
    lecturers: &[Lecturer],
    rooms: &[Room],
    courses: &[Course],
    registry: &CanonicalRegistry,
    catalogue: &SlotCatalogue,
) -> Vec<DomainDiagnostic> {
    let course_map: HashMap<&CourseId, &Course> = courses.iter().map(|c| (&c.id, c)).collect();
    let all_slots = catalogue.slots();
    let mut diagnostics = Vec::new();

    for variable in &mut set.variables {
        let course = match course_map.get(&variable.course_id) {
            Some(c) => *c,
            None => continue,
        };

        variable.slot_domain = all_slots.clone();
        fill_lecturer_domain(variable, course, lecturers, registry, catalogue, &all_slots);
        fill_room_domain(variable, course, rooms);

        if let Some(detail) = variable.empty_domain_reason() {
            diagnostics.push(DomainDiagnostic {
                variable_id: variable.id.clone(),
                detail,
            });
        }
    }
    diagnostics
}

fn fill_lecturer_domain(
    variable: &mut SchedulingVariable,
    course: &Course,
    lecturers: &[Lecturer],
    registry: &CanonicalRegistry,
    catalogue: &SlotCatalogue,
    all_slots: &[TimeSlot],
) {
    variable.lecturer_domain.clear();
    variable.lecturer_slots.clear();

    for lecturer in lecturers {
        if !matches_specialization(course, &lecturer.specializations, registry) {
            continue;
        }
        let admitted: Vec<TimeSlot> = all_slots
            .iter()
            .copied()
            .filter(|slot| lecturer.admits(slot.day, &catalogue.label(*slot)))
            .collect();

        variable.lecturer_domain.push(lecturer.id.clone());
        variable.lecturer_slots.insert(lecturer.id.clone(), admitted);
    }
}

fn fill_room_domain(variable: &mut SchedulingVariable, course: &Course, rooms: &[Room]) {
    let matching = |kind: RoomKind| -> Vec<_> {
        rooms
            .iter()
            .filter(|r| r.available && r.kind == kind && r.fits(variable.group_size))
            .map(|r| r.id.clone())
            .collect()
    };

    variable.room_fallback = None;
    variable.room_domain = matching(course.preferred_room_kind);

    // Lab courses may downgrade to theory rooms; theory courses never take labs
    if variable.room_domain.is_empty() && course.preferred_room_kind == RoomKind::Lab {
        let theory = matching(RoomKind::Theory);
        if !theory.is_empty() {
            variable.room_domain = theory;
            variable.room_fallback = Some(RoomKindFallback {
                from: RoomKind::Lab,
                to: RoomKind::Theory,
                reason: format!(
                    "no lab room fits {} students for '{}'",
                    variable.group_size, course.code
                ),
            });
        }
    }
}
