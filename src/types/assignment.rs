use super::{CourseId, LecturerId, ProgramId, RoomId, Term, TimeSlot, VariableId};
use serde::{Deserialize, Serialize};

/// A placed session. Immutable value; a plan mutation replaces the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub variable_id: VariableId,
    pub course_id: CourseId,
    pub program_id: ProgramId,
    pub lecturer_id: LecturerId,
    pub room_id: RoomId,
    pub slot: TimeSlot,
    pub term: Term,
    pub session_number: u32,
}

/// A variable the solver could not place, with the diagnosed reason
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnassignedVariable {
    pub variable_id: VariableId,
    pub course_id: CourseId,
    pub program_id: ProgramId,
    pub reason: String,
}

/// Counters and trajectory collected across both solver phases
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SolveStats {
    pub csp_iterations: u64,
    pub csp_backtracks: u64,
    pub csp_stalled: bool,
    pub csp_timed_out: bool,
    pub generations: u32,
    pub initial_fitness: f64,
    pub final_fitness: f64,
    pub fitness_trajectory: Vec<f64>,
    pub elapsed_ms: u64,
    pub best_partial: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimetableMetadata {
    pub generated_at: String,
    pub algorithm_version: String,
    pub term: Term,
    pub stats: SolveStats,
}

impl Default for TimetableMetadata {
    fn default() -> Self {
        Self {
            generated_at: String::new(),
            algorithm_version: String::new(),
            term: Term::One,
            stats: SolveStats::default(),
        }
    }
}

/// The produced weekly plan for one term
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Timetable {
    pub assignments: Vec<Assignment>,
    pub unassigned: Vec<UnassignedVariable>,
    pub metadata: TimetableMetadata,
}

impl Timetable {
    pub fn new(term: Term) -> Self {
        Self {
            assignments: Vec::new(),
            unassigned: Vec::new(),
            metadata: TimetableMetadata {
                generated_at: chrono::Utc::now().to_rfc3339(),
                algorithm_version: env!("CARGO_PKG_VERSION").to_string(),
                term,
                stats: SolveStats::default(),
            },
        }
    }

    pub fn is_complete(&self) -> bool {
        self.unassigned.is_empty()
    }

    pub fn assignments_for_lecturer(&self, lecturer: &LecturerId) -> Vec<&Assignment> {
        self.assignments
            .iter()
            .filter(|a| &a.lecturer_id == lecturer)
            .collect()
    }

    pub fn assignments_for_program(&self, program: &ProgramId) -> Vec<&Assignment> {
        self.assignments
            .iter()
            .filter(|a| &a.program_id == program)
            .collect()
    }

    pub fn assignment_for_variable(&self, variable: &VariableId) -> Option<&Assignment> {
        self.assignments.iter().find(|a| &a.variable_id == variable)
    }
}
