use crate::scheduler::{ResourceIndex, TimetableRun};
use crate::types::{Assignment, Program, ScheduleInput};

const HEADER: &str = "Session_ID,Day,Time_Slot,Start_Time,End_Time,Course_Code,Course_Name,\
Course_Type,Credits,Lecturer_ID,Lecturer_Name,Lecturer_Role,Room_Number,Room_Type,\
Room_Capacity,Room_Building,Room_Campus,Student_Group,Semester,Term,Group_Size";

/// One exported row: merged assignments expand to one row per original
/// program, displaying the canonical unit as the course
#[derive(Debug, Clone)]
pub struct SessionRow {
    pub session_id: String,
    pub day: String,
    pub time_slot: String,
    pub start_time: String,
    pub end_time: String,
    pub course_code: String,
    pub course_name: String,
    pub course_type: String,
    pub credits: String,
    pub lecturer_id: String,
    pub lecturer_name: String,
    pub lecturer_role: String,
    pub room_number: String,
    pub room_type: String,
    pub room_capacity: String,
    pub room_building: String,
    pub room_campus: String,
    pub student_group: String,
    pub semester: String,
    pub term: String,
    pub group_size: String,
}

/// Expand every assignment into per-original-program rows
pub fn expand_rows(run: &TimetableRun, input: &ScheduleInput) -> Vec<SessionRow> {
    let res = ResourceIndex::build(input, &run.merged_programs);
    let mut rows = Vec::new();

    for assignment in &run.timetable.assignments {
        let originals = run.groups.originals_of(&assignment.program_id);
        if originals.is_empty() {
            if let Some(program) = res.programs.get(&assignment.program_id) {
                rows.push(build_row(assignment, program, &res, false));
            }
        } else {
            for original in originals {
                if let Some(program) = res.programs.get(original) {
                    rows.push(build_row(assignment, program, &res, true));
                }
            }
        }
    }

    rows.sort_by(|a, b| {
        (&a.student_group, &a.day, &a.start_time).cmp(&(&b.student_group, &b.day, &b.start_time))
    });
    rows
}

/// Render the full term CSV
pub fn generate_timetable_csv(run: &TimetableRun, input: &ScheduleInput) -> String {
    let mut out = String::from(HEADER);
    out.push('\n');
    for row in expand_rows(run, input) {
        let fields = [
            row.session_id,
            row.day,
            row.time_slot,
            row.start_time,
            row.end_time,
            row.course_code,
            row.course_name,
            row.course_type,
            row.credits,
            row.lecturer_id,
            row.lecturer_name,
            row.lecturer_role,
            row.room_number,
            row.room_type,
            row.room_capacity,
            row.room_building,
            row.room_campus,
            row.student_group,
            row.semester,
            row.term,
            row.group_size,
        ];
        let line: Vec<String> = fields.iter().map(|f| escape(f)).collect();
        out.push_str(&line.join(","));
        out.push('\n');
    }
    out
}

fn build_row(
    assignment: &Assignment,
    program: &Program,
    res: &ResourceIndex,
    merged: bool,
) -> SessionRow {
    let course = res.courses.get(&assignment.course_id);
    let lecturer = res.lecturers.get(&assignment.lecturer_id);
    let room = res.rooms.get(&assignment.room_id);
    let period = res.catalogue.period(assignment.slot);

    // Merged rows display the unified canonical unit
    let course_code = if merged {
        res.canonical_of(&assignment.course_id)
            .map(|c| c.0.clone())
            .or_else(|| course.map(|c| c.code.clone()))
            .unwrap_or_default()
    } else {
        course.map(|c| c.code.clone()).unwrap_or_default()
    };

    SessionRow {
        session_id: assignment.variable_id.0.clone(),
        day: assignment.slot.day.short_name().to_string(),
        time_slot: period.map(|p| p.id.clone()).unwrap_or_default(),
        start_time: period.map(|p| p.start.clone()).unwrap_or_default(),
        end_time: period.map(|p| p.end.clone()).unwrap_or_default(),
        course_code,
        course_name: course.map(|c| c.name.clone()).unwrap_or_default(),
        course_type: course
            .map(|c| c.preferred_room_kind.display_name().to_string())
            .unwrap_or_default(),
        credits: course.map(|c| c.credits.to_string()).unwrap_or_default(),
        lecturer_id: assignment.lecturer_id.0.clone(),
        lecturer_name: lecturer.map(|l| l.name.clone()).unwrap_or_default(),
        lecturer_role: lecturer
            .map(|l| l.role.display_name().to_string())
            .unwrap_or_default(),
        room_number: assignment.room_id.0.clone(),
        room_type: room
            .map(|r| r.kind.display_name().to_string())
            .unwrap_or_default(),
        room_capacity: room.map(|r| r.capacity.to_string()).unwrap_or_default(),
        room_building: room.map(|r| r.building.clone()).unwrap_or_default(),
        room_campus: room.map(|r| r.campus.clone()).unwrap_or_default(),
        student_group: program.id.0.clone(),
        semester: format!("S{}", program.semester),
        term: assignment.term.number().to_string(),
        group_size: program.size.to_string(),
    }
}

fn escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::MergedGroups;
    use crate::types::{
        CourseId, LecturerId, ProgramId, RoomId, Term, TimeSlot, Timetable, VariableId, Weekday,
    };

    fn run_with_merged() -> (TimetableRun, ScheduleInput) {
        use crate::canonical::CanonicalRegistry;
        use crate::types::{
            CanonicalId, Course, Lecturer, LecturerRole, Program, Room, RoomKind, SchedulerConfig,
        };
        use std::collections::BTreeMap;

        let mut families = BTreeMap::new();
        families.insert(
            CanonicalId("CS_INTRO".to_string()),
            vec!["BIT1101".to_string(), "BCS1102".to_string()],
        );

        let input = ScheduleInput {
            lecturers: vec![Lecturer {
                id: LecturerId("l1".to_string()),
                name: "Dr. One".to_string(),
                role: LecturerRole::FullTime,
                faculty: String::new(),
                specializations: vec!["BIT1101".to_string()],
                availability: BTreeMap::new(),
            }],
            rooms: vec![Room {
                id: RoomId("r1".to_string()),
                name: "Hall".to_string(),
                capacity: 60,
                kind: RoomKind::Theory,
                specializations: vec![],
                available: true,
                building: "Main".to_string(),
                campus: "City".to_string(),
            }],
            courses: vec![Course {
                id: CourseId("c1".to_string()),
                code: "BIT1101".to_string(),
                name: "Introduction to Computing".to_string(),
                weekly_hours: 2,
                credits: 4,
                preferred_room_kind: RoomKind::Theory,
                course_group: None,
                preferred_term: None,
                foundational: true,
                prerequisites: vec![],
            }],
            programs: vec![
                Program {
                    id: ProgramId("A".to_string()),
                    code: "A".to_string(),
                    batch: "2024".to_string(),
                    semester: 1,
                    size: 30,
                    courses: vec![CourseId("c1".to_string())],
                },
                Program {
                    id: ProgramId("B".to_string()),
                    code: "B".to_string(),
                    batch: "2024".to_string(),
                    semester: 1,
                    size: 25,
                    courses: vec![],
                },
            ],
            registry: CanonicalRegistry::from_families(families),
            config: SchedulerConfig::default(),
        };

        let merged_id = ProgramId("MERGED_CS_INTRO".to_string());
        let mut groups = MergedGroups::default();
        groups.merged_to_originals.insert(
            merged_id.clone(),
            vec![ProgramId("A".to_string()), ProgramId("B".to_string())],
        );

        let mut timetable = Timetable::new(Term::One);
        timetable.assignments.push(Assignment {
            variable_id: VariableId("m1".to_string()),
            course_id: CourseId("c1".to_string()),
            program_id: merged_id.clone(),
            lecturer_id: LecturerId("l1".to_string()),
            room_id: RoomId("r1".to_string()),
            slot: TimeSlot::new(Weekday::Mon, 0),
            term: Term::One,
            session_number: 1,
        });

        let run = TimetableRun {
            timetable,
            report: crate::verifier::verify_timetable(
                &[],
                &ResourceIndex::build(&input, &[]),
                &Default::default(),
                &MergedGroups::default(),
                &[],
                &input.config,
            ),
            decisions: vec![],
            diagnostics: vec![],
            groups,
            merged_programs: vec![Program {
                id: merged_id,
                code: "CS_INTRO".to_string(),
                batch: String::new(),
                semester: 1,
                size: 55,
                courses: vec![CourseId("c1".to_string())],
            }],
        };
        (run, input)
    }

    #[test]
    fn test_merged_assignment_expands_per_original_program() {
        let (run, input) = run_with_merged();
        let rows = expand_rows(&run, &input);

        assert_eq!(rows.len(), 2);
        let groups: Vec<&str> = rows.iter().map(|r| r.student_group.as_str()).collect();
        assert!(groups.contains(&"A"));
        assert!(groups.contains(&"B"));
        // The canonical unit is the displayed course
        assert!(rows.iter().all(|r| r.course_code == "CS_INTRO"));
        // Each row carries its own cohort's size
        assert!(rows.iter().any(|r| r.group_size == "30"));
        assert!(rows.iter().any(|r| r.group_size == "25"));
    }

    #[test]
    fn test_csv_has_header_and_rows() {
        let (run, input) = run_with_merged();
        let csv = generate_timetable_csv(&run, &input);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Session_ID,Day,Time_Slot"));
        assert!(lines[1].contains("CS_INTRO"));
    }

    #[test]
    fn test_escape_quotes_commas() {
        assert_eq!(escape("plain"), "plain");
        assert_eq!(escape("a,b"), "\"a,b\"");
        assert_eq!(escape("say \"hi\""), "\"say \"\"hi\"\"\"");
    }
}
