use crate::canonical::CanonicalRegistry;
use crate::error::{Result, SchedulerError};
use crate::types::{Course, Lecturer, Program, Room, ScheduleInput, SchedulerConfig};
use std::fs;
use std::path::Path;

/// Load all input data from a directory
pub fn load_input_from_dir(dir: &Path) -> Result<ScheduleInput> {
    let lecturers = load_lecturers(&dir.join("lecturers.json"))?;
    let rooms = load_rooms(&dir.join("rooms.json"))?;
    let courses = load_courses(&dir.join("courses.json"))?;
    let programs = load_programs(&dir.join("programs.json"))?;
    let registry = load_registry_or_default(&dir.join("canonical.json"))?;
    let config = load_config_or_default(&dir.join("config.toml"));

    Ok(ScheduleInput {
        lecturers,
        rooms,
        courses,
        programs,
        registry,
        config,
    })
}

/// Load lecturers from JSON file
pub fn load_lecturers(path: &Path) -> Result<Vec<Lecturer>> {
    load_json_file(path)
}

/// Load rooms from JSON file
pub fn load_rooms(path: &Path) -> Result<Vec<Room>> {
    load_json_file(path)
}

/// Load courses from JSON file
pub fn load_courses(path: &Path) -> Result<Vec<Course>> {
    load_json_file(path)
}

/// Load programs from JSON file
pub fn load_programs(path: &Path) -> Result<Vec<Program>> {
    load_json_file(path)
}

/// Load the canonical registry; a missing file means no cross-program merges
pub fn load_registry_or_default(path: &Path) -> Result<CanonicalRegistry> {
    if !path.exists() {
        return Ok(CanonicalRegistry::default());
    }
    load_json_file(path)
}

/// Load config from TOML file, or use defaults
pub fn load_config_or_default(path: &Path) -> SchedulerConfig {
    if path.exists() {
        match fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).unwrap_or_default(),
            Err(_) => SchedulerConfig::default(),
        }
    } else {
        SchedulerConfig::default()
    }
}

/// Generic JSON file loader
fn load_json_file<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let path_str = path.display().to_string();
    let content = fs::read_to_string(path).map_err(|e| SchedulerError::FileRead {
        path: path_str.clone(),
        source: e,
    })?;

    serde_json::from_str(&content).map_err(|e| {
        SchedulerError::JsonParse {
            file: path_str,
            message: e.to_string(),
        }
        .into()
    })
}
