use super::{LecturerId, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Employment role, which determines the weekly teaching cap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LecturerRole {
    FullTime,
    PartTime,
    FacultyDean,
}

impl LecturerRole {
    /// Weekly teaching-hour cap; part-timers are bounded by availability instead
    pub fn weekly_hour_cap(&self) -> Option<u32> {
        match self {
            LecturerRole::FullTime => Some(22),
            LecturerRole::FacultyDean => Some(15),
            LecturerRole::PartTime => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            LecturerRole::FullTime => "Full-Time",
            LecturerRole::PartTime => "Part-Time",
            LecturerRole::FacultyDean => "Faculty Dean",
        }
    }
}

/// A member of teaching staff
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lecturer {
    pub id: LecturerId,
    pub name: String,
    pub role: LecturerRole,
    #[serde(default)]
    pub faculty: String,
    /// Free-form specialisation tokens matched through the canonical registry
    pub specializations: Vec<String>,
    /// day -> set of "HH:MM-HH:MM" labels the lecturer accepts.
    /// Empty means always available. Enforced only for part-timers.
    #[serde(default)]
    pub availability: BTreeMap<Weekday, BTreeSet<String>>,
}

impl Lecturer {
    /// Whether the lecturer admits a teaching block, identified by its label
    pub fn admits(&self, day: Weekday, label: &str) -> bool {
        if self.role != LecturerRole::PartTime || self.availability.is_empty() {
            return true;
        }
        self.availability
            .get(&day)
            .map(|labels| labels.contains(label))
            .unwrap_or(false)
    }

    pub fn weekly_hour_cap(&self) -> Option<u32> {
        self.role.weekly_hour_cap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn part_timer() -> Lecturer {
        let mut availability = BTreeMap::new();
        availability.insert(
            Weekday::Mon,
            ["09:00-11:00".to_string()].into_iter().collect(),
        );
        Lecturer {
            id: LecturerId("l1".to_string()),
            name: "Visiting Lecturer".to_string(),
            role: LecturerRole::PartTime,
            faculty: "Computing".to_string(),
            specializations: vec!["CS101".to_string()],
            availability,
        }
    }

    #[test]
    fn test_part_timer_bound_by_availability() {
        let lecturer = part_timer();
        assert!(lecturer.admits(Weekday::Mon, "09:00-11:00"));
        assert!(!lecturer.admits(Weekday::Mon, "11:00-13:00"));
        assert!(!lecturer.admits(Weekday::Tue, "09:00-11:00"));
    }

    #[test]
    fn test_full_timer_ignores_availability_map() {
        let mut lecturer = part_timer();
        lecturer.role = LecturerRole::FullTime;
        assert!(lecturer.admits(Weekday::Fri, "16:00-18:00"));
    }

    #[test]
    fn test_role_caps() {
        assert_eq!(LecturerRole::FullTime.weekly_hour_cap(), Some(22));
        assert_eq!(LecturerRole::FacultyDean.weekly_hour_cap(), Some(15));
        assert_eq!(LecturerRole::PartTime.weekly_hour_cap(), None);
    }
}
