use super::{CourseId, LecturerId, ProgramId, RoomId, RoomKind, TimeSlot, VariableId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Record of a pre-solver room-kind downgrade (lab course placed in theory rooms)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomKindFallback {
    pub from: RoomKind,
    pub to: RoomKind,
    pub reason: String,
}

/// One CSP decision: a single session of one course for one (possibly merged) group
#[derive(Debug, Clone)]
pub struct SchedulingVariable {
    pub id: VariableId,
    pub program_id: ProgramId,
    pub course_id: CourseId,
    /// 1-based session number within the course's week
    pub session_number: u32,
    pub group_size: u32,
    pub merged: bool,
    /// All catalogue slots; each lecturer carries its own admissible subset
    pub slot_domain: Vec<TimeSlot>,
    pub lecturer_domain: Vec<LecturerId>,
    pub room_domain: Vec<RoomId>,
    /// Per-lecturer admissible slots (part-timers restrict theirs)
    pub lecturer_slots: HashMap<LecturerId, Vec<TimeSlot>>,
    pub room_fallback: Option<RoomKindFallback>,
}

impl SchedulingVariable {
    /// Domain size weighted by what each lecturer actually admits; the MRV metric
    pub fn accurate_domain_size(&self) -> usize {
        let rooms = self.room_domain.len();
        self.lecturer_domain
            .iter()
            .map(|l| self.lecturer_slots.get(l).map(|s| s.len()).unwrap_or(0) * rooms)
            .sum()
    }

    pub fn has_empty_domain(&self) -> bool {
        self.accurate_domain_size() == 0
    }

    /// Which of the three domains is empty, for diagnostics
    pub fn empty_domain_reason(&self) -> Option<String> {
        if !self.has_empty_domain() {
            return None;
        }
        let mut missing = Vec::new();
        if self.lecturer_domain.is_empty() {
            missing.push("no canonically qualified lecturer");
        }
        if self.room_domain.is_empty() {
            missing.push("no room of matching kind and capacity");
        }
        if !self.lecturer_domain.is_empty()
            && self
                .lecturer_domain
                .iter()
                .all(|l| self.lecturer_slots.get(l).map(|s| s.is_empty()).unwrap_or(true))
        {
            missing.push("no lecturer admits any catalogue slot");
        }
        Some(missing.join("; "))
    }
}
