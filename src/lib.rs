//! University Timetabler - hybrid CSP + guided-genetic timetable generator
//!
//! This library produces a weekly university timetable for one academic term,
//! assigning every required teaching session a (time slot, lecturer, room)
//! triple under a large set of hard constraints, then evolving the result for
//! soft-constraint quality.
//!
//! # Algorithm Overview
//!
//! A run works in six phases:
//! 1. **Term Planning**: Assign every course of every program to term 1 or 2,
//!    keeping pairing groups together and canonical families aligned
//! 2. **Canonical Merging**: Collapse groups taking the same canonical unit
//!    into shared variables, one per required session
//! 3. **Domain Construction**: Compute candidate slots, lecturers and rooms
//!    per variable, honouring part-time availability
//! 4. **CSP Search**: Greedy pass, then MRV + degree backtracking with
//!    forward checking, stall detection and best-partial retention
//! 5. **GGA Refinement**: Population-based evolution with a fitness over five
//!    soft metrics and violation-prioritised mutation
//! 6. **Verification**: A typed report of remaining violations and scores
//!
//! # Example
//!
//! ```no_run
//! use uni_timetabler::parser::{load_input_from_dir, validate_input};
//! use uni_timetabler::scheduler::{generate_timetable, RunOptions};
//! use uni_timetabler::types::Term;
//! use std::path::Path;
//!
//! let input = load_input_from_dir(Path::new("./data/demo")).unwrap();
//! validate_input(&input).unwrap();
//! let run = generate_timetable(&input, &RunOptions::new(Term::One)).unwrap();
//! println!("scheduled {} sessions", run.timetable.assignments.len());
//! ```

pub mod canonical;
pub mod error;
pub mod gga;
pub mod parser;
pub mod planner;
pub mod reporter;
pub mod scheduler;
pub mod types;
pub mod verifier;

pub use error::{Result, SchedulerError};
