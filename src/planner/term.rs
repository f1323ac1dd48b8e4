use super::{TermDecision, TermPlan};
use crate::canonical::CanonicalRegistry;
use crate::error::SchedulerError;
use crate::types::{CanonicalId, Course, CourseId, Program, ProgramId, SchedulerConfig, Term};
use itertools::Itertools;
use std::collections::{BTreeMap, HashMap};

/// A pairing group (or singleton) that moves between terms as one unit
#[derive(Debug, Clone)]
struct PlanUnit {
    key: String,
    course_ids: Vec<CourseId>,
    forced: Option<Term>,
    foundational: bool,
    difficulty: u32,
}

/// Assign every course of every program to term 1 or 2.
///
/// Pairing groups stay together, prerequisites never land later than their
/// dependents, the per-semester ratio drives the split of flexible units, and
/// canonical families end up in the same term across all programs.
pub fn plan_terms(
    programs: &[Program],
    courses: &[Course],
    registry: &CanonicalRegistry,
    config: &SchedulerConfig,
) -> Result<TermPlan, SchedulerError> {
    let course_map: HashMap<&CourseId, &Course> = courses.iter().map(|c| (&c.id, c)).collect();
    let mut plan = TermPlan::default();
    let mut program_units: HashMap<ProgramId, Vec<PlanUnit>> = HashMap::new();

    for program in programs {
        let units = build_units(program, &course_map)?;
        let ratio = config.term_ratio(program.semester);
        let target_term1 = (units.len() as f64 * ratio).round() as usize;

        let mut term1_count = units.iter().filter(|u| u.forced == Some(Term::One)).count();

        // Forced units first, then flexible ones sorted foundations-first,
        // harder units earlier
        let flexible: Vec<usize> = units
            .iter()
            .enumerate()
            .filter(|(_, u)| u.forced.is_none())
            .sorted_by_key(|(_, u)| (!u.foundational, std::cmp::Reverse(u.difficulty)))
            .map(|(idx, _)| idx)
            .collect();

        let mut terms: Vec<Term> = units
            .iter()
            .map(|u| u.forced.unwrap_or(Term::Two))
            .collect();

        for idx in flexible {
            if term1_count < target_term1 {
                terms[idx] = Term::One;
                term1_count += 1;
            } else {
                terms[idx] = Term::Two;
            }
        }

        for (unit, term) in units.iter().zip(&terms) {
            for course_id in &unit.course_ids {
                plan.set_term(&program.id, course_id, *term);
            }
        }

        program_units.insert(program.id.clone(), units);
    }

    align_canonical_families(programs, &course_map, registry, &program_units, &mut plan);

    for program in programs {
        let units = &program_units[&program.id];
        repair_prerequisites(program, units, &course_map, &mut plan)?;
    }

    Ok(plan)
}

fn build_units(
    program: &Program,
    course_map: &HashMap<&CourseId, &Course>,
) -> Result<Vec<PlanUnit>, SchedulerError> {
    let mut by_key: BTreeMap<String, Vec<&Course>> = BTreeMap::new();
    for course_id in &program.courses {
        let course = match course_map.get(course_id) {
            Some(c) => *c,
            None => continue,
        };
        let key = course
            .course_group
            .clone()
            .unwrap_or_else(|| course.id.0.clone());
        by_key.entry(key).or_default().push(course);
    }

    let mut units = Vec::with_capacity(by_key.len());
    for (key, members) in by_key {
        let explicit: Vec<Term> = members
            .iter()
            .filter_map(|c| c.preferred_term)
            .unique()
            .collect();
        if explicit.len() > 1 {
            return Err(SchedulerError::TermSplitInfeasible {
                program: program.id.clone(),
                detail: format!(
                    "pairing group '{}' has members forced into opposite terms",
                    key
                ),
            });
        }

        units.push(PlanUnit {
            key,
            course_ids: members.iter().map(|c| c.id.clone()).collect(),
            forced: explicit.first().copied(),
            foundational: members.iter().any(|c| c.foundational),
            difficulty: members.iter().map(|c| c.credits).max().unwrap_or(0),
        });
    }
    Ok(units)
}

/// When a canonical family appears in several programs, every program must
/// place it in the same term. Majority vote of explicit preferences decides,
/// ties fall to term 1 and then to whichever choice moves fewer units.
fn align_canonical_families(
    programs: &[Program],
    course_map: &HashMap<&CourseId, &Course>,
    registry: &CanonicalRegistry,
    program_units: &HashMap<ProgramId, Vec<PlanUnit>>,
    plan: &mut TermPlan,
) {
    // canonical -> [(program, unit key, current term, explicit pref)]
    let mut occurrences: BTreeMap<CanonicalId, Vec<(ProgramId, String, Term, Option<Term>)>> =
        BTreeMap::new();

    for program in programs {
        for unit in &program_units[&program.id] {
            for course_id in &unit.course_ids {
                let course = match course_map.get(course_id) {
                    Some(c) => *c,
                    None => continue,
                };
                let canonical = match registry.canonical_of_course(course) {
                    Some(c) => c.clone(),
                    None => continue,
                };
                let current = match plan.term_of(&program.id, course_id) {
                    Some(t) => t,
                    None => continue,
                };
                occurrences.entry(canonical).or_default().push((
                    program.id.clone(),
                    unit.key.clone(),
                    current,
                    course.preferred_term,
                ));
            }
        }
    }

    for (canonical, entries) in occurrences {
        let distinct_programs = entries.iter().map(|(p, _, _, _)| p).unique().count();
        if distinct_programs < 2 {
            continue;
        }

        let chosen = choose_family_term(&entries);
        let mut moved = Vec::new();

        for (program_id, unit_key, current, _) in &entries {
            if *current == chosen {
                continue;
            }
            // The whole pairing unit migrates with the family member
            if let Some(unit) = program_units[program_id].iter().find(|u| &u.key == unit_key) {
                for course_id in &unit.course_ids {
                    plan.set_term(program_id, course_id, chosen);
                }
                moved.push(format!("{}:{}", program_id, unit_key));
            }
        }

        let reason = if moved.is_empty() {
            format!("family '{}' already aligned across {} programs", canonical, distinct_programs)
        } else {
            format!(
                "aligned family '{}' to {} across {} programs (moved {})",
                canonical,
                chosen,
                distinct_programs,
                moved.join(", ")
            )
        };
        plan.record(TermDecision {
            canonical_id: Some(canonical.clone()),
            subject: canonical.0.clone(),
            term: chosen,
            reason,
        });
    }
}

fn choose_family_term(entries: &[(ProgramId, String, Term, Option<Term>)]) -> Term {
    let votes_t1 = entries
        .iter()
        .filter(|(_, _, _, pref)| *pref == Some(Term::One))
        .count();
    let votes_t2 = entries
        .iter()
        .filter(|(_, _, _, pref)| *pref == Some(Term::Two))
        .count();

    if votes_t1 > votes_t2 {
        return Term::One;
    }
    if votes_t2 > votes_t1 {
        return Term::Two;
    }

    // No majority: prefer term 1, unless term 2 strictly reduces migrations
    let current_t1 = entries.iter().filter(|(_, _, t, _)| *t == Term::One).count();
    let current_t2 = entries.len() - current_t1;
    if current_t2 > current_t1 {
        Term::Two
    } else {
        Term::One
    }
}

/// Prerequisites must sit in an earlier or the same term as their dependents
fn repair_prerequisites(
    program: &Program,
    units: &[PlanUnit],
    course_map: &HashMap<&CourseId, &Course>,
    plan: &mut TermPlan,
) -> Result<(), SchedulerError> {
    let unit_of_course: HashMap<&CourseId, &PlanUnit> = units
        .iter()
        .flat_map(|u| u.course_ids.iter().map(move |c| (c, u)))
        .collect();

    // Two passes are enough: each repair only moves a unit once
    for _ in 0..2 {
        let mut changed = false;
        for course_id in &program.courses {
            let course = match course_map.get(course_id) {
                Some(c) => *c,
                None => continue,
            };
            let dependent_term = match plan.term_of(&program.id, course_id) {
                Some(t) => t,
                None => continue,
            };
            for prereq_id in &course.prerequisites {
                if !program.takes(prereq_id) {
                    continue;
                }
                let prereq_term = match plan.term_of(&program.id, prereq_id) {
                    Some(t) => t,
                    None => continue,
                };
                if prereq_term <= dependent_term {
                    continue;
                }

                let prereq_unit = unit_of_course.get(prereq_id);
                let dependent_unit = unit_of_course.get(course_id);
                let prereq_forced = prereq_unit.map(|u| u.forced).unwrap_or(None);
                let dependent_forced = dependent_unit.map(|u| u.forced).unwrap_or(None);

                match (prereq_forced, dependent_forced) {
                    (Some(Term::Two), Some(Term::One)) => {
                        return Err(SchedulerError::TermSplitInfeasible {
                            program: program.id.clone(),
                            detail: format!(
                                "prerequisite '{}' is forced after its dependent '{}'",
                                prereq_id, course_id
                            ),
                        });
                    }
                    (None, _) => {
                        move_unit(plan, &program.id, prereq_unit, Term::One);
                        plan.record(TermDecision {
                            canonical_id: None,
                            subject: prereq_id.0.clone(),
                            term: Term::One,
                            reason: format!(
                                "pulled prerequisite '{}' before '{}' in program '{}'",
                                prereq_id, course_id, program.id
                            ),
                        });
                        changed = true;
                    }
                    _ => {
                        move_unit(plan, &program.id, dependent_unit, Term::Two);
                        plan.record(TermDecision {
                            canonical_id: None,
                            subject: course_id.0.clone(),
                            term: Term::Two,
                            reason: format!(
                                "pushed '{}' after its prerequisite '{}' in program '{}'",
                                course_id, prereq_id, program.id
                            ),
                        });
                        changed = true;
                    }
                }
            }
        }
        if !changed {
            break;
        }
    }
    Ok(())
}

fn move_unit(plan: &mut TermPlan, program: &ProgramId, unit: Option<&&PlanUnit>, term: Term) {
    if let Some(unit) = unit {
        for course_id in &unit.course_ids {
            plan.set_term(program, course_id, term);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RoomKind;

    fn course(id: &str, opts: impl FnOnce(&mut Course)) -> Course {
        let mut c = Course {
            id: CourseId(id.to_string()),
            code: id.to_string(),
            name: id.to_string(),
            weekly_hours: 4,
            credits: 4,
            preferred_room_kind: RoomKind::Theory,
            course_group: None,
            preferred_term: None,
            foundational: false,
            prerequisites: vec![],
        };
        opts(&mut c);
        c
    }

    fn program(id: &str, course_ids: &[&str]) -> Program {
        Program {
            id: ProgramId(id.to_string()),
            code: id.to_string(),
            batch: "2024".to_string(),
            semester: 1,
            size: 30,
            courses: course_ids.iter().map(|c| CourseId(c.to_string())).collect(),
        }
    }

    #[test]
    fn test_partition_covers_every_course() {
        let courses = vec![
            course("a", |_| {}),
            course("b", |_| {}),
            course("c", |_| {}),
            course("d", |_| {}),
        ];
        let programs = vec![program("p1", &["a", "b", "c", "d"])];
        let plan = plan_terms(
            &programs,
            &courses,
            &CanonicalRegistry::default(),
            &SchedulerConfig::default(),
        )
        .unwrap();

        let p = ProgramId("p1".to_string());
        let t1 = courses
            .iter()
            .filter(|c| plan.term_of(&p, &c.id) == Some(Term::One))
            .count();
        let t2 = courses
            .iter()
            .filter(|c| plan.term_of(&p, &c.id) == Some(Term::Two))
            .count();
        assert_eq!(t1 + t2, 4);
        assert_eq!(t1, 2);
    }

    #[test]
    fn test_pairing_group_stays_together() {
        let courses = vec![
            course("theory", |c| c.course_group = Some("PC".to_string())),
            course("practical", |c| c.course_group = Some("PC".to_string())),
            course("x", |_| {}),
            course("y", |_| {}),
        ];
        let programs = vec![program("p1", &["theory", "practical", "x", "y"])];
        let plan = plan_terms(
            &programs,
            &courses,
            &CanonicalRegistry::default(),
            &SchedulerConfig::default(),
        )
        .unwrap();

        let p = ProgramId("p1".to_string());
        assert_eq!(
            plan.term_of(&p, &CourseId("theory".to_string())),
            plan.term_of(&p, &CourseId("practical".to_string()))
        );
    }

    #[test]
    fn test_contradictory_pairing_fails() {
        let courses = vec![
            course("theory", |c| {
                c.course_group = Some("PC".to_string());
                c.preferred_term = Some(Term::One);
            }),
            course("practical", |c| {
                c.course_group = Some("PC".to_string());
                c.preferred_term = Some(Term::Two);
            }),
        ];
        let programs = vec![program("p1", &["theory", "practical"])];
        let err = plan_terms(
            &programs,
            &courses,
            &CanonicalRegistry::default(),
            &SchedulerConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, SchedulerError::TermSplitInfeasible { .. }));
    }

    #[test]
    fn test_prerequisite_never_lands_later() {
        let courses = vec![
            course("basics", |_| {}),
            course("advanced", |c| {
                c.prerequisites = vec![CourseId("basics".to_string())];
                c.preferred_term = Some(Term::One);
            }),
            course("x", |_| {}),
            course("y", |_| {}),
        ];
        let programs = vec![program("p1", &["basics", "advanced", "x", "y"])];
        let plan = plan_terms(
            &programs,
            &courses,
            &CanonicalRegistry::default(),
            &SchedulerConfig::default(),
        )
        .unwrap();

        let p = ProgramId("p1".to_string());
        let basics = plan.term_of(&p, &CourseId("basics".to_string())).unwrap();
        let advanced = plan.term_of(&p, &CourseId("advanced".to_string())).unwrap();
        assert!(basics <= advanced);
    }

    #[test]
    fn test_canonical_alignment_follows_explicit_preference() {
        let mut families = BTreeMap::new();
        families.insert(
            CanonicalId("FOM_STATS".to_string()),
            vec!["stats_a".to_string(), "stats_b".to_string()],
        );
        let registry = CanonicalRegistry::from_families(families);

        let courses = vec![
            course("stats_a", |c| c.preferred_term = Some(Term::One)),
            course("stats_b", |_| {}),
            course("x", |_| {}),
            course("y", |_| {}),
        ];
        let programs = vec![
            program("A", &["stats_a", "x"]),
            program("B", &["stats_b", "y"]),
        ];
        let plan = plan_terms(&programs, &courses, &registry, &SchedulerConfig::default()).unwrap();

        assert_eq!(
            plan.term_of(&ProgramId("A".to_string()), &CourseId("stats_a".to_string())),
            Some(Term::One)
        );
        assert_eq!(
            plan.term_of(&ProgramId("B".to_string()), &CourseId("stats_b".to_string())),
            Some(Term::One)
        );
        assert!(plan
            .decisions
            .iter()
            .any(|d| d.canonical_id == Some(CanonicalId("FOM_STATS".to_string()))));
    }
}
