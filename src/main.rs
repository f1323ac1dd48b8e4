use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use uni_timetabler::parser::{load_input_from_dir, validate_input};
use uni_timetabler::reporter::{generate_reports, print_summary, OutputFormat};
use uni_timetabler::scheduler::{generate_timetable, RunOptions};
use uni_timetabler::types::{LecturerId, ProgramId, Term, Timetable};

#[derive(Parser)]
#[command(name = "uni-timetabler")]
#[command(about = "Hybrid CSP + guided-genetic university timetable generator")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run demo with sample data
    Demo {
        /// Term to schedule (1 or 2)
        #[arg(short, long, default_value_t = 1)]
        term: u8,
    },

    /// Generate a timetable from input data
    Schedule {
        /// Directory containing input JSON files
        #[arg(short, long)]
        data: PathBuf,

        /// Term to schedule (1 or 2)
        #[arg(short, long)]
        term: u8,

        /// Output directory for exported artefacts
        #[arg(short, long, default_value = "./output")]
        output: PathBuf,

        /// Output format(s): csv, json, text, or all
        #[arg(short, long, default_value = "all")]
        format: String,

        /// Fixed RNG seed for a reproducible run
        #[arg(long)]
        seed: Option<u64>,

        /// Suppress progress output
        #[arg(short, long)]
        quiet: bool,
    },

    /// Re-verify an exported timetable
    Validate {
        /// Path to timetable_term{1|2}.json
        #[arg(short, long)]
        timetable: PathBuf,

        /// Directory containing the input data it was generated from
        #[arg(short, long)]
        data: PathBuf,

        /// Show per-constraint details
        #[arg(short, long)]
        verbose: bool,
    },

    /// Print schedules from an exported timetable
    Report {
        /// Path to timetable_term{1|2}.json
        #[arg(short, long)]
        timetable: PathBuf,

        /// Directory containing the input data
        #[arg(short, long)]
        data: PathBuf,

        /// Show the schedule of one lecturer
        #[arg(long)]
        lecturer: Option<String>,

        /// Show the schedule of one program
        #[arg(long)]
        program: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Demo { term } => run_demo(parse_term(term)?),
        Commands::Schedule {
            data,
            term,
            output,
            format,
            seed,
            quiet,
        } => run_schedule(&data, parse_term(term)?, &output, &format, seed, quiet),
        Commands::Validate {
            timetable,
            data,
            verbose,
        } => run_validate(&timetable, &data, verbose),
        Commands::Report {
            timetable,
            data,
            lecturer,
            program,
        } => run_report(&timetable, &data, lecturer, program),
    }
}

fn parse_term(term: u8) -> Result<Term> {
    Term::try_from(term).map_err(|e| anyhow::anyhow!(e))
}

fn run_demo(term: Term) -> Result<()> {
    println!("{}", "University Timetabler Demo".bold().cyan());
    println!("{}", "─".repeat(40));

    let demo_path = PathBuf::from("data/demo");
    let output_path = PathBuf::from("output");

    if !demo_path.join("courses.json").exists() {
        println!("{}", "Demo data not found. Creating sample data...".yellow());
        create_demo_data(&demo_path)?;
    }

    println!("Loading demo data from: {}", demo_path.display());
    let input = load_input_from_dir(&demo_path).context("Failed to load demo data")?;

    let validation = validate_input(&input)?;
    for warning in &validation.warnings {
        println!("{} {}", "Warning:".yellow(), warning);
    }

    println!(
        "Loaded {} lecturers, {} rooms, {} courses, {} programs",
        input.lecturers.len(),
        input.rooms.len(),
        input.courses.len(),
        input.programs.len()
    );

    println!("\nGenerating {} timetable...\n", term);
    let mut options = RunOptions::new(term);
    options.quiet = false;
    let run = generate_timetable(&input, &options)?;

    print_summary(&run);
    generate_reports(
        &run,
        &input,
        &output_path,
        &[OutputFormat::Csv, OutputFormat::Json, OutputFormat::Text],
    )?;
    println!(
        "Reports written to: {}",
        output_path.display().to_string().green()
    );

    exit_by_report(run.report.critical_count())
}

fn run_schedule(
    data: &PathBuf,
    term: Term,
    output: &PathBuf,
    format: &str,
    seed: Option<u64>,
    quiet: bool,
) -> Result<()> {
    let input = load_input_from_dir(data).context("Failed to load input data")?;
    let validation = validate_input(&input)?;

    if !quiet {
        for warning in &validation.warnings {
            println!("{} {}", "Warning:".yellow(), warning);
        }
        println!(
            "Loaded {} lecturers, {} rooms, {} courses, {} programs",
            input.lecturers.len(),
            input.rooms.len(),
            input.courses.len(),
            input.programs.len()
        );
    }

    let mut options = RunOptions::new(term);
    options.quiet = quiet;
    options.seed = seed;
    let run = generate_timetable(&input, &options)?;

    let formats = parse_formats(format);
    generate_reports(&run, &input, output, &formats)?;

    if !quiet {
        print_summary(&run);
        println!("Reports written to: {}", output.display().to_string().green());
    }

    exit_by_report(run.report.critical_count())
}

fn run_validate(timetable_path: &PathBuf, data: &PathBuf, verbose: bool) -> Result<()> {
    use uni_timetabler::scheduler::{
        build_domains, build_variable_pairs, build_variables, ResourceIndex,
    };
    use uni_timetabler::planner::plan_terms;
    use uni_timetabler::verifier::verify_timetable;

    let input = load_input_from_dir(data)?;
    let timetable_json = std::fs::read_to_string(timetable_path)?;
    let timetable: Timetable = serde_json::from_str(&timetable_json)?;
    let term = timetable.metadata.term;

    // Rebuild the variable set the timetable was produced from
    let plan = plan_terms(&input.programs, &input.courses, &input.registry, &input.config)?;
    let mut set = build_variables(&input.programs, &input.courses, &input.registry, &plan, term);
    build_domains(
        &mut set,
        &input.lecturers,
        &input.rooms,
        &input.courses,
        &input.registry,
        &input.config.catalogue,
    );
    let pairs = build_variable_pairs(&set.variables, &input.courses, &input.registry);
    let res = ResourceIndex::build(&input, &set.merged_programs);

    let report = verify_timetable(
        &timetable.assignments,
        &res,
        &pairs,
        &set.groups,
        &set.variables,
        &input.config,
    );

    if report.is_feasible() {
        println!("{}", "✓ Timetable satisfies all hard constraints".green().bold());
    } else {
        println!("{}", "✗ Timetable has critical violations".red().bold());
    }

    if verbose {
        for violation in &report.violations {
            println!(
                "  [{}] {}: {}",
                violation.severity.name(),
                violation.constraint.red(),
                violation.message
            );
        }
        println!("\n{}", "Soft scores:".bold());
        println!("  student idle:         {:.3}", report.soft.student_idle);
        println!("  lecturer balance:     {:.3}", report.soft.lecturer_balance);
        println!("  room utilisation:     {:.3}", report.soft.room_utilization);
        println!("  weekday distribution: {:.3}", report.soft.weekday_distribution);
        println!("  slot preference:      {:.3}", report.soft.slot_preference);
    }

    println!(
        "\n{} violations ({} critical)",
        report.total_violations,
        report.critical_count()
    );

    exit_by_report(report.critical_count())
}

fn run_report(
    timetable_path: &PathBuf,
    data: &PathBuf,
    lecturer: Option<String>,
    program: Option<String>,
) -> Result<()> {
    let input = load_input_from_dir(data)?;
    let timetable_json = std::fs::read_to_string(timetable_path)?;
    let timetable: Timetable = serde_json::from_str(&timetable_json)?;
    let catalogue = &input.config.catalogue;

    if let Some(lecturer_id) = lecturer {
        let id = LecturerId(lecturer_id);
        let name = input
            .lecturers
            .iter()
            .find(|l| l.id == id)
            .map(|l| l.name.clone())
            .unwrap_or_else(|| "Unknown".to_string());
        println!("{}", format!("Schedule for {} ({})", name, id).bold());
        let mut rows = timetable.assignments_for_lecturer(&id);
        rows.sort_by_key(|a| a.slot);
        for assignment in rows {
            println!(
                "  {} {}: {} for {} in {}",
                assignment.slot.day.full_name(),
                catalogue.label(assignment.slot),
                assignment.course_id,
                assignment.program_id,
                assignment.room_id
            );
        }
    } else if let Some(program_id) = program {
        let id = ProgramId(program_id);
        println!("{}", format!("Schedule for {}", id).bold());
        let mut rows = timetable.assignments_for_program(&id);
        rows.sort_by_key(|a| a.slot);
        for assignment in rows {
            println!(
                "  {} {}: {} with {} in {}",
                assignment.slot.day.full_name(),
                catalogue.label(assignment.slot),
                assignment.course_id,
                assignment.lecturer_id,
                assignment.room_id
            );
        }
    } else {
        println!(
            "Timetable for {}: {} sessions, {} unassigned",
            timetable.metadata.term,
            timetable.assignments.len(),
            timetable.unassigned.len()
        );
    }

    Ok(())
}

fn exit_by_report(critical: usize) -> Result<()> {
    if critical > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn parse_formats(format: &str) -> Vec<OutputFormat> {
    if format == "all" {
        return vec![OutputFormat::Csv, OutputFormat::Json, OutputFormat::Text];
    }

    format
        .split(',')
        .filter_map(|f| match f.trim().to_lowercase().as_str() {
            "csv" => Some(OutputFormat::Csv),
            "json" => Some(OutputFormat::Json),
            "text" | "txt" => Some(OutputFormat::Text),
            _ => None,
        })
        .collect()
}

fn create_demo_data(path: &PathBuf) -> Result<()> {
    std::fs::create_dir_all(path)?;

    let lecturers = serde_json::json!([
        {"id": "L001", "name": "Dr. Nakato", "role": "full_time", "faculty": "Computing", "specializations": ["BIT1101", "BIT1204", "CS_INTRO"]},
        {"id": "L002", "name": "Mr. Okello", "role": "full_time", "faculty": "Computing", "specializations": ["BIT1102", "Programming in C"]},
        {"id": "L003", "name": "Ms. Achieng", "role": "full_time", "faculty": "Computing", "specializations": ["BIT1103", "BCS1201", "Networking"]},
        {"id": "L004", "name": "Prof. Ssemakula", "role": "faculty_dean", "faculty": "Computing", "specializations": ["BIT1201", "Mathematics for Computing"]},
        {"id": "L005", "name": "Dr. Auma", "role": "part_time", "faculty": "Business", "specializations": ["BBA1101", "FOM_STATS"],
         "availability": {"MON": ["09:00-11:00", "11:00-13:00"], "WED": ["14:00-16:00"], "FRI": ["09:00-11:00"]}}
    ]);
    std::fs::write(
        path.join("lecturers.json"),
        serde_json::to_string_pretty(&lecturers)?,
    )?;

    let rooms = serde_json::json!([
        {"id": "R101", "name": "Lecture Hall 101", "capacity": 120, "kind": "theory", "building": "Block A", "campus": "Main"},
        {"id": "R102", "name": "Room 102", "capacity": 50, "kind": "theory", "building": "Block A", "campus": "Main"},
        {"id": "R201", "name": "Room 201", "capacity": 40, "kind": "theory", "building": "Block B", "campus": "Main"},
        {"id": "LAB1", "name": "Computer Lab 1", "capacity": 45, "kind": "lab", "specializations": ["programming_lab"], "building": "Block C", "campus": "Main"},
        {"id": "LAB2", "name": "Networking Lab", "capacity": 30, "kind": "lab", "specializations": ["networking_lab"], "building": "Block C", "campus": "Main"}
    ]);
    std::fs::write(path.join("rooms.json"), serde_json::to_string_pretty(&rooms)?)?;

    let courses = serde_json::json!([
        {"id": "bit1101", "code": "BIT1101", "name": "Introduction to Computing", "weekly_hours": 4, "credits": 4, "preferred_room_kind": "theory", "foundational": true, "preferred_term": 1},
        {"id": "bit1102", "code": "BIT1102", "name": "Programming in C", "weekly_hours": 4, "credits": 4, "preferred_room_kind": "theory", "course_group": "PROG_C", "foundational": true},
        {"id": "bit1102p", "code": "BIT1102P", "name": "Programming in C Practical", "weekly_hours": 2, "credits": 2, "preferred_room_kind": "lab", "course_group": "PROG_C"},
        {"id": "bit1103", "code": "BIT1103", "name": "Computer Networks", "weekly_hours": 4, "credits": 4, "preferred_room_kind": "theory"},
        {"id": "bit1201", "code": "BIT1201", "name": "Mathematics for Computing", "weekly_hours": 4, "credits": 4, "preferred_room_kind": "theory", "foundational": true},
        {"id": "bit1204", "code": "BIT1204", "name": "Statistics Fundamentals", "weekly_hours": 2, "credits": 3, "preferred_room_kind": "theory"},
        {"id": "bcs1201", "code": "BCS1201", "name": "Data Communication", "weekly_hours": 4, "credits": 4, "preferred_room_kind": "theory"},
        {"id": "bba1101", "code": "BBA1101", "name": "Business Statistics", "weekly_hours": 2, "credits": 3, "preferred_room_kind": "theory"}
    ]);
    std::fs::write(
        path.join("courses.json"),
        serde_json::to_string_pretty(&courses)?,
    )?;

    let programs = serde_json::json!([
        {"id": "BSCAIT_2024_S1", "code": "BSCAIT", "batch": "2024", "semester": 1, "size": 42,
         "courses": ["bit1101", "bit1102", "bit1102p", "bit1103", "bit1201"]},
        {"id": "BCS_2024_S1", "code": "BCS", "batch": "2024", "semester": 1, "size": 35,
         "courses": ["bit1101", "bcs1201", "bit1201", "bit1204"]},
        {"id": "BBA_2024_S1", "code": "BBA", "batch": "2024", "semester": 1, "size": 28,
         "courses": ["bba1101", "bit1101"]}
    ]);
    std::fs::write(
        path.join("programs.json"),
        serde_json::to_string_pretty(&programs)?,
    )?;

    let canonical = serde_json::json!({
        "CS_INTRO": ["BIT1101"],
        "FOM_STATS": ["BIT1204", "BBA1101"],
        "NETWORKS": ["BIT1103", "BCS1201"]
    });
    std::fs::write(
        path.join("canonical.json"),
        serde_json::to_string_pretty(&canonical)?,
    )?;

    println!("{}", "Demo data created successfully!".green());
    Ok(())
}
