use crate::scheduler::TimetableRun;
use crate::types::ScheduleInput;
use crate::verifier::Severity;
use colored::Colorize;

/// Print the run summary to the terminal
pub fn print_summary(run: &TimetableRun) {
    let timetable = &run.timetable;
    let stats = &timetable.metadata.stats;

    println!("\n{}", "Timetable Summary".bold());
    println!("{}", "─".repeat(40));
    println!("Term:          {}", timetable.metadata.term);
    println!("Scheduled:     {} sessions", timetable.assignments.len());
    if !timetable.unassigned.is_empty() {
        println!(
            "{}",
            format!("Unassigned:    {} sessions", timetable.unassigned.len()).yellow()
        );
    }
    println!(
        "Fitness:       {:.3} (from {:.3} over {} generations)",
        stats.final_fitness, stats.initial_fitness, stats.generations
    );
    println!(
        "Search:        {} iterations, {} backtracks, {} ms",
        stats.csp_iterations, stats.csp_backtracks, stats.elapsed_ms
    );
    if stats.best_partial {
        println!("{}", "Result:        best-partial".yellow().bold());
    } else {
        println!("{}", "Result:        complete".green().bold());
    }

    let critical = run.report.critical_count();
    if critical == 0 {
        println!("{}", "Verification:  no critical violations".green());
    } else {
        println!(
            "{}",
            format!("Verification:  {} critical violations", critical)
                .red()
                .bold()
        );
    }
}

/// Full plain-text report
pub fn generate_text_report(run: &TimetableRun, input: &ScheduleInput) -> String {
    let timetable = &run.timetable;
    let mut lines = Vec::new();

    lines.push(format!(
        "University Timetable - {} (generated {})",
        timetable.metadata.term, timetable.metadata.generated_at
    ));
    lines.push("=".repeat(60));
    lines.push(String::new());

    lines.push(format!("Sessions scheduled: {}", timetable.assignments.len()));
    lines.push(format!("Sessions unassigned: {}", timetable.unassigned.len()));
    lines.push(format!(
        "Final fitness: {:.3}",
        timetable.metadata.stats.final_fitness
    ));
    lines.push(String::new());

    lines.push("Soft scores".to_string());
    let soft = &run.report.soft;
    lines.push(format!("  student idle:         {:.3}", soft.student_idle));
    lines.push(format!("  lecturer balance:     {:.3}", soft.lecturer_balance));
    lines.push(format!("  room utilisation:     {:.3}", soft.room_utilization));
    lines.push(format!("  weekday distribution: {:.3}", soft.weekday_distribution));
    lines.push(format!("  slot preference:      {:.3}", soft.slot_preference));
    lines.push(String::new());

    if !run.decisions.is_empty() {
        lines.push("Term-planning decisions".to_string());
        for decision in &run.decisions {
            lines.push(format!("  [{}] {}", decision.term, decision.reason));
        }
        lines.push(String::new());
    }

    if !run.diagnostics.is_empty() {
        lines.push("Domain diagnostics".to_string());
        for diagnostic in &run.diagnostics {
            lines.push(format!("  {}: {}", diagnostic.variable_id, diagnostic.detail));
        }
        lines.push(String::new());
    }

    if !timetable.unassigned.is_empty() {
        lines.push("Unassigned sessions".to_string());
        for unassigned in &timetable.unassigned {
            lines.push(format!(
                "  {} ({} / {}): {}",
                unassigned.variable_id,
                unassigned.program_id,
                unassigned.course_id,
                unassigned.reason
            ));
        }
        lines.push(String::new());
    }

    let violations: Vec<_> = run
        .report
        .violations
        .iter()
        .filter(|v| v.severity != Severity::Info)
        .collect();
    if violations.is_empty() {
        lines.push("No constraint violations.".to_string());
    } else {
        lines.push(format!("Violations ({})", violations.len()));
        for violation in violations {
            lines.push(format!(
                "  [{}] {}: {}",
                violation.severity.name(),
                violation.constraint,
                violation.message
            ));
        }
    }
    lines.push(String::new());

    // Per-group weekly grids
    for program in &input.programs {
        let rows: Vec<_> = timetable.assignments_for_program(&program.id);
        if rows.is_empty() {
            continue;
        }
        lines.push(format!("Schedule for {} ({})", program.code, program.id));
        let mut sorted = rows;
        sorted.sort_by_key(|a| a.slot);
        for assignment in sorted {
            lines.push(format!(
                "  {} {}: {} with {} in {}",
                assignment.slot.day.full_name(),
                input.config.catalogue.label(assignment.slot),
                assignment.course_id,
                assignment.lecturer_id,
                assignment.room_id
            ));
        }
        lines.push(String::new());
    }

    lines.join("\n")
}
