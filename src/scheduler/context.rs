use super::merger::MergedGroups;
use super::pairing::VariablePairs;
use crate::canonical::CanonicalRegistry;
use crate::types::{
    Assignment, Course, CourseId, Lecturer, LecturerId, Program, ProgramId, Room, RoomId,
    RoomKindFallback, ScheduleInput, SchedulingVariable, SlotCatalogue, TimeSlot, VariableId,
    Weekday,
};
use std::collections::{HashMap, HashSet};

/// Read-only id-keyed views over the run's resources, including the
/// synthetic merged programs
#[derive(Debug, Clone)]
pub struct ResourceIndex {
    pub lecturers: HashMap<LecturerId, Lecturer>,
    pub rooms: HashMap<RoomId, Room>,
    pub courses: HashMap<CourseId, Course>,
    pub programs: HashMap<ProgramId, Program>,
    pub catalogue: SlotCatalogue,
    pub registry: CanonicalRegistry,
}

impl ResourceIndex {
    pub fn build(input: &ScheduleInput, merged_programs: &[Program]) -> Self {
        let mut programs: HashMap<ProgramId, Program> = input
            .programs
            .iter()
            .map(|p| (p.id.clone(), p.clone()))
            .collect();
        for merged in merged_programs {
            programs.insert(merged.id.clone(), merged.clone());
        }

        Self {
            lecturers: input
                .lecturers
                .iter()
                .map(|l| (l.id.clone(), l.clone()))
                .collect(),
            rooms: input.rooms.iter().map(|r| (r.id.clone(), r.clone())).collect(),
            courses: input
                .courses
                .iter()
                .map(|c| (c.id.clone(), c.clone()))
                .collect(),
            programs,
            catalogue: input.config.catalogue.clone(),
            registry: input.registry.clone(),
        }
    }

    pub fn group_size(&self, program: &ProgramId) -> u32 {
        self.programs.get(program).map(|p| p.size).unwrap_or(0)
    }

    /// Canonical family of an assignment's course, when it has one
    pub fn canonical_of(&self, course: &CourseId) -> Option<&crate::types::CanonicalId> {
        self.courses
            .get(course)
            .and_then(|c| self.registry.canonical_of_course(c))
    }
}

/// Incremental index of who and what is booked where.
///
/// Every mutation goes through `add_assignment` / `remove_assignment` so the
/// per-lecturer, per-room and per-group schedules stay consistent with the
/// assignment store.
#[derive(Debug, Clone)]
pub struct ConstraintContext<'a> {
    pub res: &'a ResourceIndex,
    pub pairs: &'a VariablePairs,
    pub groups: &'a MergedGroups,
    /// Recorded pre-solver room-kind downgrades, by variable
    pub fallbacks: HashMap<VariableId, RoomKindFallback>,

    lecturer_slots: HashMap<LecturerId, HashMap<TimeSlot, HashSet<VariableId>>>,
    room_slots: HashMap<RoomId, HashMap<TimeSlot, HashSet<VariableId>>>,
    group_slots: HashMap<ProgramId, HashMap<TimeSlot, HashSet<VariableId>>>,
    lecturer_daily: HashMap<(LecturerId, Weekday), u32>,
    /// (morning used, afternoon used) per lecturer and day
    lecturer_half_day: HashMap<(LecturerId, Weekday), (bool, bool)>,
    lecturer_weekly_hours: HashMap<LecturerId, u32>,
    unit_daily: HashMap<(ProgramId, CourseId), HashMap<Weekday, u32>>,
    slot_usage: HashMap<TimeSlot, u32>,
    assignments: HashMap<VariableId, Assignment>,
}

impl<'a> ConstraintContext<'a> {
    pub fn new(
        res: &'a ResourceIndex,
        pairs: &'a VariablePairs,
        groups: &'a MergedGroups,
        variables: &[SchedulingVariable],
    ) -> Self {
        let fallbacks = variables
            .iter()
            .filter_map(|v| v.room_fallback.clone().map(|f| (v.id.clone(), f)))
            .collect();
        Self {
            res,
            pairs,
            groups,
            fallbacks,
            lecturer_slots: HashMap::new(),
            room_slots: HashMap::new(),
            group_slots: HashMap::new(),
            lecturer_daily: HashMap::new(),
            lecturer_half_day: HashMap::new(),
            lecturer_weekly_hours: HashMap::new(),
            unit_daily: HashMap::new(),
            slot_usage: HashMap::new(),
            assignments: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    pub fn assignment(&self, variable: &VariableId) -> Option<&Assignment> {
        self.assignments.get(variable)
    }

    pub fn assignments(&self) -> impl Iterator<Item = &Assignment> {
        self.assignments.values()
    }

    pub fn add_assignment(&mut self, assignment: &Assignment) {
        let slot = assignment.slot;
        let vid = assignment.variable_id.clone();

        self.lecturer_slots
            .entry(assignment.lecturer_id.clone())
            .or_default()
            .entry(slot)
            .or_default()
            .insert(vid.clone());
        self.room_slots
            .entry(assignment.room_id.clone())
            .or_default()
            .entry(slot)
            .or_default()
            .insert(vid.clone());
        for projection in self.groups.projections(&assignment.program_id) {
            self.group_slots
                .entry(projection)
                .or_default()
                .entry(slot)
                .or_default()
                .insert(vid.clone());
        }

        let day_key = (assignment.lecturer_id.clone(), slot.day);
        *self.lecturer_daily.entry(day_key.clone()).or_insert(0) += 1;
        let afternoon = self.res.catalogue.is_afternoon(slot);
        let half = self.lecturer_half_day.entry(day_key).or_insert((false, false));
        if afternoon {
            half.1 = true;
        } else {
            half.0 = true;
        }

        *self
            .lecturer_weekly_hours
            .entry(assignment.lecturer_id.clone())
            .or_insert(0) += 2;
        *self
            .unit_daily
            .entry((assignment.program_id.clone(), assignment.course_id.clone()))
            .or_default()
            .entry(slot.day)
            .or_insert(0) += 1;
        *self.slot_usage.entry(slot).or_insert(0) += 1;

        self.assignments.insert(vid, assignment.clone());
    }

    pub fn remove_assignment(&mut self, variable: &VariableId) -> Option<Assignment> {
        let assignment = self.assignments.remove(variable)?;
        let slot = assignment.slot;

        remove_slot_entry(&mut self.lecturer_slots, &assignment.lecturer_id, slot, variable);
        remove_slot_entry(&mut self.room_slots, &assignment.room_id, slot, variable);
        for projection in self.groups.projections(&assignment.program_id) {
            remove_slot_entry(&mut self.group_slots, &projection, slot, variable);
        }

        let day_key = (assignment.lecturer_id.clone(), slot.day);
        if let Some(count) = self.lecturer_daily.get_mut(&day_key) {
            *count -= 1;
            if *count == 0 {
                self.lecturer_daily.remove(&day_key);
            }
        }
        // The half-day flags are disjunctions, so recompute them from what
        // remains instead of decrementing
        self.recompute_half_day(&assignment.lecturer_id, slot.day);

        if let Some(hours) = self.lecturer_weekly_hours.get_mut(&assignment.lecturer_id) {
            *hours = hours.saturating_sub(2);
            if *hours == 0 {
                self.lecturer_weekly_hours.remove(&assignment.lecturer_id);
            }
        }

        let unit_key = (assignment.program_id.clone(), assignment.course_id.clone());
        if let Some(days) = self.unit_daily.get_mut(&unit_key) {
            if let Some(count) = days.get_mut(&slot.day) {
                *count -= 1;
                if *count == 0 {
                    days.remove(&slot.day);
                }
            }
            if days.is_empty() {
                self.unit_daily.remove(&unit_key);
            }
        }

        if let Some(count) = self.slot_usage.get_mut(&slot) {
            *count -= 1;
            if *count == 0 {
                self.slot_usage.remove(&slot);
            }
        }

        Some(assignment)
    }

    fn recompute_half_day(&mut self, lecturer: &LecturerId, day: Weekday) {
        let mut morning = false;
        let mut afternoon = false;
        if let Some(slots) = self.lecturer_slots.get(lecturer) {
            for (slot, occupants) in slots {
                if slot.day != day || occupants.is_empty() {
                    continue;
                }
                if self.res.catalogue.is_afternoon(*slot) {
                    afternoon = true;
                } else {
                    morning = true;
                }
            }
        }
        let key = (lecturer.clone(), day);
        if morning || afternoon {
            self.lecturer_half_day.insert(key, (morning, afternoon));
        } else {
            self.lecturer_half_day.remove(&key);
        }
    }

    pub fn lecturer_occupants(&self, lecturer: &LecturerId, slot: TimeSlot) -> Vec<&VariableId> {
        occupants(&self.lecturer_slots, lecturer, slot)
    }

    pub fn room_occupants(&self, room: &RoomId, slot: TimeSlot) -> Vec<&VariableId> {
        occupants(&self.room_slots, room, slot)
    }

    pub fn group_occupants(&self, program: &ProgramId, slot: TimeSlot) -> Vec<&VariableId> {
        occupants(&self.group_slots, program, slot)
    }

    pub fn daily_count(&self, lecturer: &LecturerId, day: Weekday) -> u32 {
        self.lecturer_daily
            .get(&(lecturer.clone(), day))
            .copied()
            .unwrap_or(0)
    }

    pub fn half_day_used(&self, lecturer: &LecturerId, day: Weekday) -> (bool, bool) {
        self.lecturer_half_day
            .get(&(lecturer.clone(), day))
            .copied()
            .unwrap_or((false, false))
    }

    pub fn weekly_hours(&self, lecturer: &LecturerId) -> u32 {
        self.lecturer_weekly_hours.get(lecturer).copied().unwrap_or(0)
    }

    pub fn unit_sessions_on(&self, program: &ProgramId, course: &CourseId, day: Weekday) -> u32 {
        self.unit_daily
            .get(&(program.clone(), course.clone()))
            .and_then(|days| days.get(&day))
            .copied()
            .unwrap_or(0)
    }

    pub fn slot_usage(&self, slot: TimeSlot) -> u32 {
        self.slot_usage.get(&slot).copied().unwrap_or(0)
    }

    /// Distinct programs currently seated in a room at a slot
    pub fn room_programs(&self, room: &RoomId, slot: TimeSlot) -> Vec<&ProgramId> {
        let mut seen = Vec::new();
        for vid in self.room_occupants(room, slot) {
            if let Some(a) = self.assignments.get(vid) {
                if !seen.contains(&&a.program_id) {
                    seen.push(&a.program_id);
                }
            }
        }
        seen
    }

    /// Whether an existing occupant is excused from conflicting with the
    /// candidate: pair peers always are, and members of the same canonical
    /// family with the same session number merge legitimately.
    pub fn is_excused_conflict(&self, existing: &VariableId, candidate: &Assignment) -> bool {
        if super::pairing::peers_of(self.pairs, &candidate.variable_id)
            .iter()
            .any(|peer| peer == existing)
        {
            return true;
        }
        let existing = match self.assignments.get(existing) {
            Some(a) => a,
            None => return false,
        };
        if existing.session_number != candidate.session_number {
            return false;
        }
        match (
            self.res.canonical_of(&existing.course_id),
            self.res.canonical_of(&candidate.course_id),
        ) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

fn occupants<'m, K: std::hash::Hash + Eq>(
    map: &'m HashMap<K, HashMap<TimeSlot, HashSet<VariableId>>>,
    key: &K,
    slot: TimeSlot,
) -> Vec<&'m VariableId> {
    let mut found: Vec<&VariableId> = map
        .get(key)
        .and_then(|slots| slots.get(&slot))
        .map(|set| set.iter().collect())
        .unwrap_or_default();
    // Set iteration order is not stable; callers fold it into messages
    found.sort();
    found
}

fn remove_slot_entry<K: std::hash::Hash + Eq + Clone>(
    map: &mut HashMap<K, HashMap<TimeSlot, HashSet<VariableId>>>,
    key: &K,
    slot: TimeSlot,
    variable: &VariableId,
) {
    if let Some(slots) = map.get_mut(key) {
        if let Some(set) = slots.get_mut(&slot) {
            set.remove(variable);
            if set.is_empty() {
                slots.remove(&slot);
            }
        }
        if slots.is_empty() {
            map.remove(key);
        }
    }
}
