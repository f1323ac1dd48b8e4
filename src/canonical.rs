//! Canonical course families and specialisation matching.
//!
//! A canonical id names an equivalent teaching unit offered under different
//! course codes across programs. All lecturer-qualification and cross-program
//! merge decisions route through the registry, so the matching logic is kept
//! as pure functions over it.

use crate::types::{CanonicalId, Course};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Maps each course code to at most one canonical family, and each family to
/// its ordered member codes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, Vec<String>>", into = "BTreeMap<String, Vec<String>>")]
pub struct CanonicalRegistry {
    families: BTreeMap<CanonicalId, Vec<String>>,
    by_code: HashMap<String, CanonicalId>,
}

impl From<BTreeMap<String, Vec<String>>> for CanonicalRegistry {
    fn from(map: BTreeMap<String, Vec<String>>) -> Self {
        let families = map
            .into_iter()
            .map(|(id, codes)| (CanonicalId(id), codes))
            .collect();
        Self::from_families(families)
    }
}

impl From<CanonicalRegistry> for BTreeMap<String, Vec<String>> {
    fn from(registry: CanonicalRegistry) -> Self {
        registry
            .families
            .into_iter()
            .map(|(id, codes)| (id.0, codes))
            .collect()
    }
}

impl CanonicalRegistry {
    pub fn from_families(families: BTreeMap<CanonicalId, Vec<String>>) -> Self {
        let mut by_code = HashMap::new();
        for (canonical, codes) in &families {
            for code in codes {
                // First family wins; a code belongs to at most one family
                by_code.entry(code.clone()).or_insert_with(|| canonical.clone());
            }
        }
        Self { families, by_code }
    }

    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }

    pub fn family_count(&self) -> usize {
        self.families.len()
    }

    pub fn canonical_of_code(&self, code: &str) -> Option<&CanonicalId> {
        self.by_code.get(code)
    }

    /// The family a course belongs to, resolved through its code then its id
    pub fn canonical_of_course(&self, course: &Course) -> Option<&CanonicalId> {
        self.canonical_of_code(&course.code)
            .or_else(|| self.canonical_of_code(&course.id.0))
    }

    pub fn members(&self, canonical: &CanonicalId) -> &[String] {
        self.families
            .get(canonical)
            .map(|codes| codes.as_slice())
            .unwrap_or(&[])
    }

    pub fn families(&self) -> impl Iterator<Item = (&CanonicalId, &Vec<String>)> {
        self.families.iter()
    }

    /// Whether two courses denote the same canonical unit
    pub fn same_family(&self, a: &Course, b: &Course) -> bool {
        match (self.canonical_of_course(a), self.canonical_of_course(b)) {
            (Some(ca), Some(cb)) => ca == cb,
            _ => false,
        }
    }
}

/// Whether any of the free-form specialisation tokens qualifies a lecturer
/// for the course. Matches the course code, the course id, the canonical id,
/// any member code of the course's family, or a case-insensitive substring of
/// the display name.
pub fn matches_specialization(
    course: &Course,
    specializations: &[String],
    registry: &CanonicalRegistry,
) -> bool {
    let canonical = registry.canonical_of_course(course);
    let name_lower = course.name.to_lowercase();

    specializations.iter().any(|token| {
        if token == &course.code || token == &course.id.0 {
            return true;
        }
        if let Some(canonical) = canonical {
            if token == &canonical.0 {
                return true;
            }
            if registry.members(canonical).iter().any(|code| code == token) {
                return true;
            }
        }
        let token_lower = token.to_lowercase();
        !token_lower.is_empty()
            && (name_lower.contains(&token_lower) || token_lower.contains(&name_lower))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CourseId, RoomKind};

    fn course(id: &str, code: &str, name: &str) -> Course {
        Course {
            id: CourseId(id.to_string()),
            code: code.to_string(),
            name: name.to_string(),
            weekly_hours: 4,
            credits: 4,
            preferred_room_kind: RoomKind::Theory,
            course_group: None,
            preferred_term: None,
            foundational: false,
            prerequisites: vec![],
        }
    }

    fn registry() -> CanonicalRegistry {
        let mut families = BTreeMap::new();
        families.insert(
            CanonicalId("CS_INTRO".to_string()),
            vec!["BIT1101".to_string(), "BCS1102".to_string()],
        );
        CanonicalRegistry::from_families(families)
    }

    #[test]
    fn test_code_lookup() {
        let registry = registry();
        assert_eq!(
            registry.canonical_of_code("BIT1101"),
            Some(&CanonicalId("CS_INTRO".to_string()))
        );
        assert_eq!(registry.canonical_of_code("UNKNOWN"), None);
    }

    #[test]
    fn test_same_family_across_codes() {
        let registry = registry();
        let a = course("c1", "BIT1101", "Introduction to Computing");
        let b = course("c2", "BCS1102", "Fundamentals of Computing");
        assert!(registry.same_family(&a, &b));
    }

    #[test]
    fn test_matches_by_code_and_id() {
        let registry = registry();
        let c = course("c1", "BIT1101", "Introduction to Computing");
        assert!(matches_specialization(&c, &["BIT1101".to_string()], &registry));
        assert!(matches_specialization(&c, &["c1".to_string()], &registry));
    }

    #[test]
    fn test_matches_by_canonical_id_and_member_code() {
        let registry = registry();
        let c = course("c1", "BIT1101", "Introduction to Computing");
        // The canonical id itself
        assert!(matches_specialization(&c, &["CS_INTRO".to_string()], &registry));
        // A sibling code from the same family
        assert!(matches_specialization(&c, &["BCS1102".to_string()], &registry));
    }

    #[test]
    fn test_matches_by_name_substring() {
        let registry = registry();
        let c = course("c1", "BIT1101", "Introduction to Computing");
        assert!(matches_specialization(
            &c,
            &["introduction to computing".to_string()],
            &registry
        ));
        assert!(matches_specialization(&c, &["Computing".to_string()], &registry));
        assert!(!matches_specialization(&c, &["Thermodynamics".to_string()], &registry));
    }

    #[test]
    fn test_no_match_for_unrelated_tokens() {
        let registry = registry();
        let c = course("c1", "BIT1101", "Introduction to Computing");
        assert!(!matches_specialization(&c, &[], &registry));
        assert!(!matches_specialization(&c, &["MATH2201".to_string()], &registry));
    }

    #[test]
    fn test_registry_round_trips_through_serde() {
        let registry = registry();
        let json = serde_json::to_string(&registry).unwrap();
        let back: CanonicalRegistry = serde_json::from_str(&json).unwrap();
        assert_eq!(back.family_count(), 1);
        assert!(back.canonical_of_code("BCS1102").is_some());
    }
}
