use super::context::ConstraintContext;
use crate::canonical::matches_specialization;
use crate::types::Assignment;

/// The hard constraints, in checking order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintKind {
    NoDoubleBooking,
    RoomCapacity,
    RoomKindMatch,
    LecturerSpecialization,
    Pairing,
    DailyLimit,
    WeeklyLimit,
    NoSameDayRepeat,
    StandardBlocks,
    MergeCapacity,
    ClassSplitting,
}

impl ConstraintKind {
    pub const ALL: [ConstraintKind; 11] = [
        ConstraintKind::NoDoubleBooking,
        ConstraintKind::RoomCapacity,
        ConstraintKind::RoomKindMatch,
        ConstraintKind::LecturerSpecialization,
        ConstraintKind::Pairing,
        ConstraintKind::DailyLimit,
        ConstraintKind::WeeklyLimit,
        ConstraintKind::NoSameDayRepeat,
        ConstraintKind::StandardBlocks,
        ConstraintKind::MergeCapacity,
        ConstraintKind::ClassSplitting,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ConstraintKind::NoDoubleBooking => "NoDoubleBooking",
            ConstraintKind::RoomCapacity => "RoomCapacity",
            ConstraintKind::RoomKindMatch => "RoomKindMatch",
            ConstraintKind::LecturerSpecialization => "LecturerSpecialization",
            ConstraintKind::Pairing => "Pairing",
            ConstraintKind::DailyLimit => "DailyLimit",
            ConstraintKind::WeeklyLimit => "WeeklyLimit",
            ConstraintKind::NoSameDayRepeat => "NoSameDayRepeat",
            ConstraintKind::StandardBlocks => "StandardBlocks",
            ConstraintKind::MergeCapacity => "MergeCapacity",
            ConstraintKind::ClassSplitting => "ClassSplitting",
        }
    }

    /// Double-booking, capacity excess and room-kind mismatch can never be
    /// tolerated; limit breaches can be repaired downstream
    pub fn is_critical(&self) -> bool {
        matches!(
            self,
            ConstraintKind::NoDoubleBooking
                | ConstraintKind::RoomCapacity
                | ConstraintKind::RoomKindMatch
                | ConstraintKind::MergeCapacity
                | ConstraintKind::ClassSplitting
        )
    }

    pub fn is_limit(&self) -> bool {
        matches!(self, ConstraintKind::DailyLimit | ConstraintKind::WeeklyLimit)
    }
}

/// A failed check, naming the first constraint that rejected the candidate
#[derive(Debug, Clone)]
pub struct ConstraintViolation {
    pub kind: ConstraintKind,
    pub message: String,
}

/// Runs the hard constraints in order; the first failure rejects
#[derive(Debug, Clone, Copy)]
pub struct ConstraintChecker {
    /// Excuse back-to-back lab sessions from the one-session-per-day rule
    pub allow_consecutive_lab_sessions: bool,
}

impl ConstraintChecker {
    pub fn new(allow_consecutive_lab_sessions: bool) -> Self {
        Self {
            allow_consecutive_lab_sessions,
        }
    }

    pub fn check_all(
        &self,
        assignment: &Assignment,
        ctx: &ConstraintContext<'_>,
    ) -> Result<(), ConstraintViolation> {
        for kind in ConstraintKind::ALL {
            if let Some(message) = self.check(kind, assignment, ctx) {
                return Err(ConstraintViolation { kind, message });
            }
        }
        Ok(())
    }

    pub fn check(
        &self,
        kind: ConstraintKind,
        a: &Assignment,
        ctx: &ConstraintContext<'_>,
    ) -> Option<String> {
        match kind {
            ConstraintKind::NoDoubleBooking => check_double_booking(a, ctx),
            ConstraintKind::RoomCapacity => check_room_capacity(a, ctx),
            ConstraintKind::RoomKindMatch => check_room_kind(a, ctx),
            ConstraintKind::LecturerSpecialization => check_specialization(a, ctx),
            ConstraintKind::Pairing => check_pairing(a, ctx),
            ConstraintKind::DailyLimit => check_daily_limit(a, ctx),
            ConstraintKind::WeeklyLimit => check_weekly_limit(a, ctx),
            ConstraintKind::NoSameDayRepeat => self.check_same_day_repeat(a, ctx),
            ConstraintKind::StandardBlocks => check_standard_blocks(a, ctx),
            ConstraintKind::MergeCapacity => check_merge_capacity(a, ctx),
            ConstraintKind::ClassSplitting => check_class_splitting(a, ctx),
        }
    }

    fn check_same_day_repeat(&self, a: &Assignment, ctx: &ConstraintContext<'_>) -> Option<String> {
        let existing = ctx.unit_sessions_on(&a.program_id, &a.course_id, a.slot.day);
        if existing == 0 {
            return None;
        }

        if self.allow_consecutive_lab_sessions {
            let is_lab = ctx
                .res
                .courses
                .get(&a.course_id)
                .map(|c| c.is_lab())
                .unwrap_or(false);
            if is_lab {
                let adjacent = ctx.assignments().any(|other| {
                    other.program_id == a.program_id
                        && other.course_id == a.course_id
                        && other.slot.day == a.slot.day
                        && other.slot.period.abs_diff(a.slot.period) == 1
                });
                if adjacent && existing == 1 {
                    return None;
                }
            }
        }

        Some(format!(
            "'{}' already has a session for '{}' on {}",
            a.program_id, a.course_id, a.slot.day
        ))
    }
}

fn check_double_booking(a: &Assignment, ctx: &ConstraintContext<'_>) -> Option<String> {
    for occupant in ctx.lecturer_occupants(&a.lecturer_id, a.slot) {
        if !ctx.is_excused_conflict(occupant, a) {
            return Some(format!(
                "lecturer '{}' already booked at {} by '{}'",
                a.lecturer_id, a.slot, occupant
            ));
        }
    }
    for occupant in ctx.room_occupants(&a.room_id, a.slot) {
        if !ctx.is_excused_conflict(occupant, a) {
            return Some(format!(
                "room '{}' already booked at {} by '{}'",
                a.room_id, a.slot, occupant
            ));
        }
    }
    for projection in ctx.groups.projections(&a.program_id) {
        for occupant in ctx.group_occupants(&projection, a.slot) {
            if !ctx.is_excused_conflict(occupant, a) {
                return Some(format!(
                    "group '{}' already busy at {} with '{}'",
                    projection, a.slot, occupant
                ));
            }
        }
    }
    None
}

fn check_room_capacity(a: &Assignment, ctx: &ConstraintContext<'_>) -> Option<String> {
    let size = ctx.res.group_size(&a.program_id);
    let room = ctx.res.rooms.get(&a.room_id)?;
    if room.fits(size) {
        return None;
    }
    // Split groups are sized upstream; the splitting rule owns them
    let split = ctx
        .res
        .programs
        .get(&a.program_id)
        .map(|p| p.is_split())
        .unwrap_or(false);
    if split {
        return None;
    }
    Some(format!(
        "room '{}' (cap {}) too small for '{}' ({} students)",
        a.room_id, room.capacity, a.program_id, size
    ))
}

fn check_room_kind(a: &Assignment, ctx: &ConstraintContext<'_>) -> Option<String> {
    let course = ctx.res.courses.get(&a.course_id)?;
    let room = ctx.res.rooms.get(&a.room_id)?;
    if room.kind == course.preferred_room_kind {
        return None;
    }
    if let Some(fallback) = ctx.fallbacks.get(&a.variable_id) {
        if room.kind == fallback.to {
            return None;
        }
    }
    Some(format!(
        "room '{}' is {} but '{}' wants {}",
        a.room_id,
        room.kind.display_name(),
        a.course_id,
        course.preferred_room_kind.display_name()
    ))
}

fn check_specialization(a: &Assignment, ctx: &ConstraintContext<'_>) -> Option<String> {
    let course = ctx.res.courses.get(&a.course_id)?;
    let lecturer = ctx.res.lecturers.get(&a.lecturer_id)?;
    if matches_specialization(course, &lecturer.specializations, &ctx.res.registry) {
        return None;
    }
    Some(format!(
        "lecturer '{}' is not qualified for '{}'",
        a.lecturer_id, a.course_id
    ))
}

/// Peers already placed must share the slot; peers not yet placed are
/// assumed fine until the last one lands
fn check_pairing(a: &Assignment, ctx: &ConstraintContext<'_>) -> Option<String> {
    for peer in super::pairing::peers_of(ctx.pairs, &a.variable_id) {
        if let Some(existing) = ctx.assignment(peer) {
            if existing.slot != a.slot {
                return Some(format!(
                    "paired session '{}' sits at {}, not {}",
                    peer, existing.slot, a.slot
                ));
            }
        }
    }
    None
}

fn check_daily_limit(a: &Assignment, ctx: &ConstraintContext<'_>) -> Option<String> {
    let count = ctx.daily_count(&a.lecturer_id, a.slot.day);
    if count >= 2 {
        return Some(format!(
            "lecturer '{}' already teaches {} sessions on {}",
            a.lecturer_id, count, a.slot.day
        ));
    }
    let (morning_used, afternoon_used) = ctx.half_day_used(&a.lecturer_id, a.slot.day);
    let afternoon = ctx.res.catalogue.is_afternoon(a.slot);
    if afternoon && afternoon_used {
        return Some(format!(
            "lecturer '{}' already has an afternoon session on {}",
            a.lecturer_id, a.slot.day
        ));
    }
    if !afternoon && morning_used {
        return Some(format!(
            "lecturer '{}' already has a morning session on {}",
            a.lecturer_id, a.slot.day
        ));
    }
    None
}

fn check_weekly_limit(a: &Assignment, ctx: &ConstraintContext<'_>) -> Option<String> {
    let lecturer = ctx.res.lecturers.get(&a.lecturer_id)?;
    // Part-timers are bounded by availability instead of a cap
    let cap = lecturer.weekly_hour_cap()?;
    let hours = ctx.weekly_hours(&a.lecturer_id);
    if hours + 2 > cap {
        return Some(format!(
            "lecturer '{}' at {}h of a {}h weekly cap",
            a.lecturer_id, hours, cap
        ));
    }
    None
}

fn check_standard_blocks(a: &Assignment, ctx: &ConstraintContext<'_>) -> Option<String> {
    if ctx.res.catalogue.contains(a.slot) {
        return None;
    }
    Some(format!("{} is not a catalogue teaching block", a.slot))
}

/// Everyone sharing the room at this slot must fit it together
fn check_merge_capacity(a: &Assignment, ctx: &ConstraintContext<'_>) -> Option<String> {
    let room = ctx.res.rooms.get(&a.room_id)?;
    let mut programs: Vec<&crate::types::ProgramId> = ctx.room_programs(&a.room_id, a.slot);
    if !programs.contains(&&a.program_id) {
        programs.push(&a.program_id);
    }
    let total: u32 = programs.iter().map(|p| ctx.res.group_size(p)).sum();
    if total <= room.capacity {
        return None;
    }
    Some(format!(
        "{} students across {} groups exceed room '{}' (cap {})",
        total,
        programs.len(),
        a.room_id,
        room.capacity
    ))
}

/// Oversized groups are only accepted when split upstream
fn check_class_splitting(a: &Assignment, ctx: &ConstraintContext<'_>) -> Option<String> {
    let size = ctx.res.group_size(&a.program_id);
    let room = ctx.res.rooms.get(&a.room_id)?;
    if room.fits(size) {
        return None;
    }
    let split = ctx
        .res
        .programs
        .get(&a.program_id)
        .map(|p| p.is_split())
        .unwrap_or(false);
    if split {
        return None;
    }
    Some(format!(
        "group '{}' ({} students) needs splitting before room '{}'",
        a.program_id, size, a.room_id
    ))
}
