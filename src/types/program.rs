use super::{CourseId, ProgramId};
use serde::{Deserialize, Serialize};

/// Marker carried in the id of synthetic cross-program merged groups
pub const MERGED_PREFIX: &str = "MERGED_";

/// Marker carried in the id of groups split upstream to fit room capacity
pub const SPLIT_MARKER: &str = "_SPLIT_";

/// An enrolled cohort following one course list for an academic year
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Program {
    pub id: ProgramId,
    pub code: String,
    #[serde(default)]
    pub batch: String,
    /// Semester S1..S6
    pub semester: u8,
    /// Enrolled student count
    pub size: u32,
    pub courses: Vec<CourseId>,
}

impl Program {
    pub fn is_merged(&self) -> bool {
        self.id.0.starts_with(MERGED_PREFIX)
    }

    pub fn is_split(&self) -> bool {
        self.id.0.contains(SPLIT_MARKER)
    }

    pub fn takes(&self, course: &CourseId) -> bool {
        self.courses.contains(course)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markers() {
        let mut program = Program {
            id: ProgramId("BSCAIT_2024_S1".to_string()),
            code: "BSCAIT".to_string(),
            batch: "2024".to_string(),
            semester: 1,
            size: 30,
            courses: vec![],
        };
        assert!(!program.is_merged());
        assert!(!program.is_split());

        program.id = ProgramId("MERGED_CS_INTRO".to_string());
        assert!(program.is_merged());

        program.id = ProgramId("BCS_2024_S1_SPLIT_A".to_string());
        assert!(program.is_split());
    }
}
