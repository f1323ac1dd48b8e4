mod term;

pub use term::*;

use crate::types::{CanonicalId, CourseId, ProgramId, Term};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One recorded planning decision, kept for the run report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TermDecision {
    /// Present when the decision aligned a canonical family across programs
    pub canonical_id: Option<CanonicalId>,
    /// The unit the decision applies to (pair-group key or course id)
    pub subject: String,
    pub term: Term,
    pub reason: String,
}

/// The computed course -> term partition for every program
#[derive(Debug, Clone, Default)]
pub struct TermPlan {
    by_program: HashMap<ProgramId, HashMap<CourseId, Term>>,
    pub decisions: Vec<TermDecision>,
}

impl TermPlan {
    pub fn term_of(&self, program: &ProgramId, course: &CourseId) -> Option<Term> {
        self.by_program.get(program)?.get(course).copied()
    }

    /// Courses of a program planned into the given term, in course-list order
    pub fn courses_in(&self, program: &ProgramId, courses: &[CourseId], term: Term) -> Vec<CourseId> {
        courses
            .iter()
            .filter(|c| self.term_of(program, c) == Some(term))
            .cloned()
            .collect()
    }

    pub(crate) fn set_term(&mut self, program: &ProgramId, course: &CourseId, term: Term) {
        self.by_program
            .entry(program.clone())
            .or_default()
            .insert(course.clone(), term);
    }

    pub(crate) fn record(&mut self, decision: TermDecision) {
        self.decisions.push(decision);
    }
}
