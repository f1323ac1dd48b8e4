mod csv;
mod json;
mod text;

pub use csv::*;
pub use json::*;
pub use text::*;

use crate::error::Result;
use crate::scheduler::TimetableRun;
use crate::types::ScheduleInput;
use std::fs;
use std::path::Path;

/// Output format for reports
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Csv,
    Json,
    Text,
}

/// Generate all requested artefacts and write them to the output directory
pub fn generate_reports(
    run: &TimetableRun,
    input: &ScheduleInput,
    output_dir: &Path,
    formats: &[OutputFormat],
) -> Result<()> {
    fs::create_dir_all(output_dir)?;
    let term = run.timetable.metadata.term.number();

    for format in formats {
        match format {
            OutputFormat::Csv => {
                let csv = generate_timetable_csv(run, input);
                fs::write(
                    output_dir.join(format!("TIMETABLE_TERM{term}_COMPLETE.csv")),
                    csv,
                )?;
            }
            OutputFormat::Json => {
                let violations = generate_violations_json(run)?;
                fs::write(
                    output_dir.join(format!("violations_term{term}.json")),
                    violations,
                )?;
                let timetable = generate_timetable_json(&run.timetable)?;
                fs::write(
                    output_dir.join(format!("timetable_term{term}.json")),
                    timetable,
                )?;
            }
            OutputFormat::Text => {
                let text = generate_text_report(run, input);
                fs::write(output_dir.join(format!("timetable_term{term}.txt")), text)?;
            }
        }
    }

    Ok(())
}
