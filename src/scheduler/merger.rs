use crate::canonical::CanonicalRegistry;
use crate::planner::TermPlan;
use crate::types::{
    Course, CourseId, Program, ProgramId, SchedulingVariable, Term, VariableId, MERGED_PREFIX,
};
use itertools::Itertools;
use std::collections::{BTreeMap, HashMap};

/// Bidirectional mapping between synthetic merged groups and the original
/// programs they absorb. Held as two explicit maps so conflict checks can
/// project in either direction.
#[derive(Debug, Clone, Default)]
pub struct MergedGroups {
    pub merged_to_originals: HashMap<ProgramId, Vec<ProgramId>>,
    pub original_to_merged: HashMap<ProgramId, Vec<ProgramId>>,
}

impl MergedGroups {
    pub fn originals_of(&self, merged: &ProgramId) -> &[ProgramId] {
        self.merged_to_originals
            .get(merged)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn merged_containing(&self, original: &ProgramId) -> &[ProgramId] {
        self.original_to_merged
            .get(original)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// The program ids an assignment for `program` occupies: the group itself
    /// plus, for merged groups, every underlying original
    pub fn projections(&self, program: &ProgramId) -> Vec<ProgramId> {
        let mut out = vec![program.clone()];
        out.extend(self.originals_of(program).iter().cloned());
        out
    }

    fn register(&mut self, merged: ProgramId, originals: Vec<ProgramId>) {
        for original in &originals {
            self.original_to_merged
                .entry(original.clone())
                .or_default()
                .push(merged.clone());
        }
        self.merged_to_originals.insert(merged, originals);
    }
}

/// The variable set for one term, before domains are attached
#[derive(Debug, Clone, Default)]
pub struct VariableSet {
    pub variables: Vec<SchedulingVariable>,
    pub groups: MergedGroups,
    /// Synthetic merged programs, alongside nothing else; originals stay in
    /// the input tables
    pub merged_programs: Vec<Program>,
}

/// Enumerate the term's (program, course) pairs, collapse canonical families
/// shared by several programs into merged groups, and emit one variable per
/// required session.
pub fn build_variables(
    programs: &[Program],
    courses: &[Course],
    registry: &CanonicalRegistry,
    plan: &TermPlan,
    term: Term,
) -> VariableSet {
    let course_map: HashMap<&CourseId, &Course> = courses.iter().map(|c| (&c.id, c)).collect();

    // canonical id -> enrolled (program, course) pairs for this term
    let mut by_family: BTreeMap<String, Vec<(&Program, &Course)>> = BTreeMap::new();
    let mut singletons: Vec<(&Program, &Course)> = Vec::new();

    for program in programs {
        for course_id in &program.courses {
            if plan.term_of(&program.id, course_id) != Some(term) {
                continue;
            }
            let course = match course_map.get(course_id) {
                Some(c) => *c,
                None => continue,
            };
            match registry.canonical_of_course(course) {
                Some(canonical) => by_family
                    .entry(canonical.0.clone())
                    .or_default()
                    .push((program, course)),
                None => singletons.push((program, course)),
            }
        }
    }

    let mut set = VariableSet::default();

    for (canonical, members) in by_family {
        let distinct_programs: Vec<&Program> = members
            .iter()
            .map(|(p, _)| *p)
            .unique_by(|p| p.id.clone())
            .collect();

        if distinct_programs.len() < 2 {
            // Single program families schedule as plain variables
            for (program, course) in members {
                push_variables(&mut set, program, course);
            }
            continue;
        }

        // One program may fold several codes into the family; size counts
        // each enrolled program once
        let size: u32 = distinct_programs.iter().map(|p| p.size).sum();
        let representative = members[0].1;
        let merged_id = ProgramId(format!("{}{}", MERGED_PREFIX, canonical));

        let merged_program = Program {
            id: merged_id.clone(),
            code: canonical.clone(),
            batch: String::new(),
            semester: distinct_programs.iter().map(|p| p.semester).min().unwrap_or(1),
            size,
            courses: vec![representative.id.clone()],
        };

        set.groups.register(
            merged_id.clone(),
            distinct_programs.iter().map(|p| p.id.clone()).collect(),
        );

        for session in 1..=representative.sessions_required() {
            set.variables.push(SchedulingVariable {
                id: variable_id(&merged_id, &representative.id, session),
                program_id: merged_id.clone(),
                course_id: representative.id.clone(),
                session_number: session,
                group_size: size,
                merged: true,
                slot_domain: Vec::new(),
                lecturer_domain: Vec::new(),
                room_domain: Vec::new(),
                lecturer_slots: HashMap::new(),
                room_fallback: None,
            });
        }
        set.merged_programs.push(merged_program);
    }

    for (program, course) in singletons {
        push_variables(&mut set, program, course);
    }

    // Keep deterministic ordering regardless of map iteration
    set.variables.sort_by(|a, b| a.id.cmp(&b.id));
    set
}

fn push_variables(set: &mut VariableSet, program: &Program, course: &Course) {
    for session in 1..=course.sessions_required() {
        set.variables.push(SchedulingVariable {
            id: variable_id(&program.id, &course.id, session),
            program_id: program.id.clone(),
            course_id: course.id.clone(),
            session_number: session,
            group_size: program.size,
            merged: false,
            slot_domain: Vec::new(),
            lecturer_domain: Vec::new(),
            room_domain: Vec::new(),
            lecturer_slots: HashMap::new(),
            room_fallback: None,
        });
    }
}

fn variable_id(program: &ProgramId, course: &CourseId, session: u32) -> VariableId {
    VariableId(format!("{}-{}-s{}", program, course, session))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CanonicalId, RoomKind};
    use std::collections::BTreeMap as Map;

    fn course(id: &str, code: &str) -> Course {
        Course {
            id: CourseId(id.to_string()),
            code: code.to_string(),
            name: code.to_string(),
            weekly_hours: 4,
            credits: 4,
            preferred_room_kind: RoomKind::Theory,
            course_group: None,
            preferred_term: None,
            foundational: false,
            prerequisites: vec![],
        }
    }

    fn program(id: &str, size: u32, course_ids: &[&str]) -> Program {
        Program {
            id: ProgramId(id.to_string()),
            code: id.to_string(),
            batch: "2024".to_string(),
            semester: 1,
            size,
            courses: course_ids.iter().map(|c| CourseId(c.to_string())).collect(),
        }
    }

    fn plan_all(programs: &[Program], term: Term) -> TermPlan {
        let mut plan = TermPlan::default();
        for p in programs {
            for c in &p.courses {
                plan.set_term(&p.id, c, term);
            }
        }
        plan
    }

    #[test]
    fn test_shared_family_produces_one_merged_group() {
        let mut families = Map::new();
        families.insert(
            CanonicalId("CS_INTRO".to_string()),
            vec!["BIT1101".to_string(), "BCS1102".to_string()],
        );
        let registry = CanonicalRegistry::from_families(families);

        let courses = vec![course("c_a", "BIT1101"), course("c_b", "BCS1102")];
        let programs = vec![program("A", 30, &["c_a"]), program("B", 25, &["c_b"])];
        let plan = plan_all(&programs, Term::One);

        let set = build_variables(&programs, &courses, &registry, &plan, Term::One);

        // 2 sessions of one merged course, not 4 separate variables
        assert_eq!(set.variables.len(), 2);
        assert!(set.variables.iter().all(|v| v.merged));
        assert_eq!(set.variables[0].group_size, 55);

        let merged_id = &set.variables[0].program_id;
        assert_eq!(set.groups.originals_of(merged_id).len(), 2);
        assert_eq!(
            set.groups.merged_containing(&ProgramId("A".to_string())),
            std::slice::from_ref(merged_id)
        );
    }

    #[test]
    fn test_size_deduplicates_programs_not_courses() {
        let mut families = Map::new();
        families.insert(
            CanonicalId("CS_INTRO".to_string()),
            vec!["BIT1101".to_string(), "BIT1102".to_string(), "BCS1101".to_string()],
        );
        let registry = CanonicalRegistry::from_families(families);

        // Program A folds two codes into the same family; its size counts once
        let courses = vec![
            course("c_a1", "BIT1101"),
            course("c_a2", "BIT1102"),
            course("c_b", "BCS1101"),
        ];
        let programs = vec![
            program("A", 30, &["c_a1", "c_a2"]),
            program("B", 25, &["c_b"]),
        ];
        let plan = plan_all(&programs, Term::One);

        let set = build_variables(&programs, &courses, &registry, &plan, Term::One);
        assert_eq!(set.variables[0].group_size, 55);
    }

    #[test]
    fn test_unshared_courses_stay_per_program() {
        let registry = CanonicalRegistry::default();
        let courses = vec![course("c_a", "X1"), course("c_b", "X2")];
        let programs = vec![program("A", 30, &["c_a"]), program("B", 25, &["c_b"])];
        let plan = plan_all(&programs, Term::One);

        let set = build_variables(&programs, &courses, &registry, &plan, Term::One);
        assert_eq!(set.variables.len(), 4);
        assert!(set.variables.iter().all(|v| !v.merged));
        assert!(set.groups.merged_to_originals.is_empty());
    }

    #[test]
    fn test_courses_outside_term_are_skipped() {
        let registry = CanonicalRegistry::default();
        let courses = vec![course("c_a", "X1")];
        let programs = vec![program("A", 30, &["c_a"])];
        let plan = plan_all(&programs, Term::Two);

        let set = build_variables(&programs, &courses, &registry, &plan, Term::One);
        assert!(set.variables.is_empty());
    }
}
