use super::{CourseId, RoomKind, Term};
use serde::{Deserialize, Serialize};

/// A taught unit; weekly hours split into 2-hour sessions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    pub id: CourseId,
    /// Display code; may collide across programs
    pub code: String,
    pub name: String,
    /// Must be a positive even number of hours
    pub weekly_hours: u32,
    pub credits: u32,
    pub preferred_room_kind: RoomKind,
    /// Pair key tying theory and practical sessions together
    #[serde(default)]
    pub course_group: Option<String>,
    #[serde(default)]
    pub preferred_term: Option<Term>,
    #[serde(default)]
    pub foundational: bool,
    #[serde(default)]
    pub prerequisites: Vec<CourseId>,
}

impl Course {
    /// Number of 2-hour sessions required per week
    pub fn sessions_required(&self) -> u32 {
        self.weekly_hours / 2
    }

    pub fn is_lab(&self) -> bool {
        self.preferred_room_kind == RoomKind::Lab
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sessions_required() {
        let course = Course {
            id: CourseId("c1".to_string()),
            code: "CS101".to_string(),
            name: "Intro to Computing".to_string(),
            weekly_hours: 4,
            credits: 4,
            preferred_room_kind: RoomKind::Theory,
            course_group: None,
            preferred_term: None,
            foundational: true,
            prerequisites: vec![],
        };
        assert_eq!(course.sessions_required(), 2);
        assert!(!course.is_lab());
    }
}
