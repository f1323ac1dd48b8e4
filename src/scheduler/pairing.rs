use crate::canonical::CanonicalRegistry;
use crate::types::{Course, CourseId, SchedulingVariable, VariableId};
use std::collections::{BTreeMap, HashMap};

/// Symmetric peer map: every linked variable lists all of its peers.
pub type VariablePairs = HashMap<VariableId, Vec<VariableId>>;

/// Link companion sessions that must share a time slot: variables whose
/// courses carry the same pair key, and variables whose courses fold into the
/// same canonical family, matched by session number in both cases.
pub fn build_variable_pairs(
    variables: &[SchedulingVariable],
    courses: &[Course],
    registry: &CanonicalRegistry,
) -> VariablePairs {
    let course_map: HashMap<&CourseId, &Course> = courses.iter().map(|c| (&c.id, c)).collect();

    // (link key, session number) -> variable ids
    let mut buckets: BTreeMap<(String, u32), Vec<&VariableId>> = BTreeMap::new();

    for variable in variables {
        let course = match course_map.get(&variable.course_id) {
            Some(c) => *c,
            None => continue,
        };

        if let Some(group) = &course.course_group {
            buckets
                .entry((format!("pair:{}", group), variable.session_number))
                .or_default()
                .push(&variable.id);
        }
        if let Some(canonical) = registry.canonical_of_course(course) {
            buckets
                .entry((format!("canon:{}", canonical), variable.session_number))
                .or_default()
                .push(&variable.id);
        }
    }

    let mut pairs: VariablePairs = HashMap::new();
    for ((_, _), members) in buckets {
        if members.len() < 2 {
            continue;
        }
        for a in &members {
            for b in &members {
                if a == b {
                    continue;
                }
                let entry = pairs.entry((*a).clone()).or_default();
                if !entry.contains(b) {
                    entry.push((*b).clone());
                }
            }
        }
    }
    pairs
}

/// Peers of a variable, empty when unlinked
pub fn peers_of<'a>(pairs: &'a VariablePairs, variable: &VariableId) -> &'a [VariableId] {
    pairs.get(variable).map(|v| v.as_slice()).unwrap_or(&[])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ProgramId, RoomKind};

    fn course(id: &str, group: Option<&str>) -> Course {
        Course {
            id: CourseId(id.to_string()),
            code: id.to_string(),
            name: id.to_string(),
            weekly_hours: 4,
            credits: 4,
            preferred_room_kind: RoomKind::Theory,
            course_group: group.map(|g| g.to_string()),
            preferred_term: None,
            foundational: false,
            prerequisites: vec![],
        }
    }

    fn variable(id: &str, course: &str, session: u32) -> SchedulingVariable {
        SchedulingVariable {
            id: VariableId(id.to_string()),
            program_id: ProgramId("p1".to_string()),
            course_id: CourseId(course.to_string()),
            session_number: session,
            group_size: 30,
            merged: false,
            slot_domain: vec![],
            lecturer_domain: vec![],
            room_domain: vec![],
            lecturer_slots: HashMap::new(),
            room_fallback: None,
        }
    }

    #[test]
    fn test_links_by_pair_key_and_session() {
        let courses = vec![course("theory", Some("PC")), course("practical", Some("PC"))];
        let variables = vec![
            variable("t1", "theory", 1),
            variable("t2", "theory", 2),
            variable("p1", "practical", 1),
            variable("p2", "practical", 2),
        ];
        let pairs = build_variable_pairs(&variables, &courses, &CanonicalRegistry::default());

        assert_eq!(
            peers_of(&pairs, &VariableId("t1".to_string())),
            &[VariableId("p1".to_string())]
        );
        assert_eq!(
            peers_of(&pairs, &VariableId("p2".to_string())),
            &[VariableId("t2".to_string())]
        );
    }

    #[test]
    fn test_links_by_canonical_family() {
        use crate::types::CanonicalId;
        let mut families = std::collections::BTreeMap::new();
        families.insert(
            CanonicalId("CS_INTRO".to_string()),
            vec!["a".to_string(), "b".to_string()],
        );
        let registry = CanonicalRegistry::from_families(families);

        let courses = vec![course("a", None), course("b", None)];
        let variables = vec![variable("va", "a", 1), variable("vb", "b", 1)];
        let pairs = build_variable_pairs(&variables, &courses, &registry);

        assert_eq!(
            peers_of(&pairs, &VariableId("va".to_string())),
            &[VariableId("vb".to_string())]
        );
    }

    #[test]
    fn test_unlinked_variables_have_no_peers() {
        let courses = vec![course("solo", None)];
        let variables = vec![variable("v1", "solo", 1)];
        let pairs = build_variable_pairs(&variables, &courses, &CanonicalRegistry::default());
        assert!(peers_of(&pairs, &VariableId("v1".to_string())).is_empty());
    }
}
