use crate::types::ProgramId;
use thiserror::Error;

/// Domain-specific errors for the timetabler
#[derive(Error, Debug)]
pub enum SchedulerError {
    // Input/Parse errors
    #[error("Failed to read file '{path}': {source}")]
    FileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse JSON in '{file}': {message}")]
    JsonParse { file: String, message: String },

    /// Malformed catalogue, odd weekly hours, dangling references and the like
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),

    #[error("Duplicate ID found: {id_type} '{id}'")]
    DuplicateId { id_type: String, id: String },

    #[error("Program '{program}' references unknown course '{course}'")]
    UnknownCourse { program: String, course: String },

    // Planner errors
    #[error("Term plan for program '{program}' is infeasible: {detail}")]
    TermSplitInfeasible { program: ProgramId, detail: String },

    // Solver errors
    #[error("Solver failed: {0}")]
    SolverFailed(String),
}

/// Use anyhow::Result at application boundaries
pub type Result<T> = anyhow::Result<T>;
