mod constraints;
mod context;
mod csp;
mod domains;
mod merger;
mod pairing;

pub use constraints::*;
pub use context::*;
pub use csp::*;
pub use domains::*;
pub use merger::*;
pub use pairing::*;

use crate::error::Result;
use crate::gga::GgaEngine;
use crate::planner::{plan_terms, TermDecision};
use crate::types::{
    Program, ScheduleInput, SolveStats, Term, Timetable, TimetableMetadata,
};
use crate::verifier::{verify_timetable, VerificationReport};
use indicatif::{ProgressBar, ProgressStyle};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Cooperative early-stop flag, polled at recursion tops and between
/// generations
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Options for one run
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub term: Term,
    pub quiet: bool,
    pub cancel: CancelToken,
    /// Overrides the configured seed when present
    pub seed: Option<u64>,
}

impl RunOptions {
    pub fn new(term: Term) -> Self {
        Self {
            term,
            quiet: true,
            cancel: CancelToken::new(),
            seed: None,
        }
    }
}

/// Everything one run produces
#[derive(Debug, Clone)]
pub struct TimetableRun {
    pub timetable: Timetable,
    pub report: VerificationReport,
    pub decisions: Vec<TermDecision>,
    pub diagnostics: Vec<DomainDiagnostic>,
    /// Merged-group mappings, needed to expand rows per original program
    pub groups: MergedGroups,
    pub merged_programs: Vec<Program>,
}

/// Main entry point: term planning, merging, domain construction, CSP search,
/// genetic refinement and verification in one pass.
pub fn generate_timetable(input: &ScheduleInput, options: &RunOptions) -> Result<TimetableRun> {
    let start_time = Instant::now();
    let term = options.term;

    let progress = if options.quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(100);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}% {msg}")
                .unwrap()
                .progress_chars("#>-"),
        );
        pb
    };

    // Phase 1: split the year into terms
    progress.set_message("Planning terms...");
    progress.set_position(5);
    let plan = plan_terms(&input.programs, &input.courses, &input.registry, &input.config)?;

    // Phase 2: merge canonical families and build session variables
    progress.set_message("Merging groups and building variables...");
    progress.set_position(15);
    let mut set = build_variables(&input.programs, &input.courses, &input.registry, &plan, term);

    // Phase 3: attach domains
    progress.set_message("Building domains...");
    progress.set_position(25);
    let diagnostics = build_domains(
        &mut set,
        &input.lecturers,
        &input.rooms,
        &input.courses,
        &input.registry,
        &input.config.catalogue,
    );

    let pairs = build_variable_pairs(&set.variables, &input.courses, &input.registry);
    let res = ResourceIndex::build(input, &set.merged_programs);
    let checker = ConstraintChecker::new(input.config.allow_consecutive_lab_sessions);

    let seed = options.seed.or(input.config.seed);
    let rng = match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };

    // Phase 4: constraint search
    progress.set_message("Solving hard constraints (CSP)...");
    progress.set_position(35);
    let solver = CspSolver::new(
        &res,
        &set.variables,
        &pairs,
        &set.groups,
        checker,
        &input.config.csp,
        term,
        rng.clone(),
        options.cancel.clone(),
    );
    let outcome = solver.solve();

    // Phase 5: genetic refinement of soft quality
    progress.set_message("Refining soft constraints (GGA)...");
    progress.set_position(65);
    let mut stats = SolveStats {
        csp_iterations: outcome.stats.iterations,
        csp_backtracks: outcome.stats.backtracks,
        csp_stalled: outcome.stats.stalled,
        csp_timed_out: outcome.stats.timed_out,
        best_partial: !outcome.complete,
        ..SolveStats::default()
    };

    let assignments = if outcome.assignments.is_empty() {
        outcome.assignments.clone()
    } else {
        let engine = GgaEngine::new(
            &res,
            &pairs,
            &set.groups,
            &set.variables,
            checker,
            &input.config.gga,
            rng,
            options.cancel.clone(),
        );
        let refined = engine.optimize(outcome.assignments.clone());
        stats.generations = refined.generations;
        stats.initial_fitness = refined.initial_fitness;
        stats.final_fitness = refined.fitness;
        stats.fitness_trajectory = refined.trajectory;
        refined.assignments
    };

    // Phase 6: verification
    progress.set_message("Verifying...");
    progress.set_position(90);
    let report = verify_timetable(
        &assignments,
        &res,
        &pairs,
        &set.groups,
        &set.variables,
        &input.config,
    );

    stats.elapsed_ms = start_time.elapsed().as_millis() as u64;

    progress.set_message("Complete");
    progress.set_position(100);
    progress.finish_with_message("Timetable generated");

    let timetable = Timetable {
        assignments,
        unassigned: outcome.unassigned,
        metadata: TimetableMetadata {
            generated_at: chrono::Utc::now().to_rfc3339(),
            algorithm_version: env!("CARGO_PKG_VERSION").to_string(),
            term,
            stats,
        },
    };

    Ok(TimetableRun {
        timetable,
        report,
        decisions: plan.decisions,
        diagnostics,
        groups: set.groups,
        merged_programs: set.merged_programs,
    })
}
