use super::{Course, Lecturer, Program, Room, SlotCatalogue};
use crate::canonical::CanonicalRegistry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// CSP search limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CspConfig {
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u64,
    /// Wall-clock budget in seconds; 0 returns the greedy-only plan
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Consecutive non-improving recursions before the search gives up
    #[serde(default = "default_stall_threshold")]
    pub stall_threshold: u32,
    /// Candidate list is truncated to this many entries when larger
    #[serde(default = "default_candidate_cap")]
    pub candidate_cap: usize,
}

fn default_max_iterations() -> u64 {
    200_000
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_stall_threshold() -> u32 {
    2_000
}

fn default_candidate_cap() -> usize {
    100
}

impl Default for CspConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            timeout_secs: default_timeout_secs(),
            stall_threshold: default_stall_threshold(),
            candidate_cap: default_candidate_cap(),
        }
    }
}

/// Relative weights of the five soft-quality metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitnessWeights {
    #[serde(default = "default_w_idle")]
    pub student_idle: f64,
    #[serde(default = "default_w_balance")]
    pub lecturer_balance: f64,
    #[serde(default = "default_w_rooms")]
    pub room_utilization: f64,
    #[serde(default = "default_w_weekday")]
    pub weekday_distribution: f64,
    #[serde(default = "default_w_slots")]
    pub slot_preference: f64,
}

fn default_w_idle() -> f64 {
    0.25
}

fn default_w_balance() -> f64 {
    0.20
}

fn default_w_rooms() -> f64 {
    0.20
}

fn default_w_weekday() -> f64 {
    0.20
}

fn default_w_slots() -> f64 {
    0.15
}

impl Default for FitnessWeights {
    fn default() -> Self {
        Self {
            student_idle: default_w_idle(),
            lecturer_balance: default_w_balance(),
            room_utilization: default_w_rooms(),
            weekday_distribution: default_w_weekday(),
            slot_preference: default_w_slots(),
        }
    }
}

/// Genetic optimiser parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GgaConfig {
    #[serde(default = "default_population")]
    pub population_size: usize,
    #[serde(default = "default_generations")]
    pub max_generations: u32,
    #[serde(default = "default_crossover_rate")]
    pub crossover_rate: f64,
    #[serde(default = "default_mutation_rate")]
    pub mutation_rate: f64,
    #[serde(default = "default_elite_size")]
    pub elite_size: usize,
    #[serde(default = "default_tournament_size")]
    pub tournament_size: usize,
    /// Survivors older than this are skipped during replacement
    #[serde(default = "default_age_cap")]
    pub age_cap: u32,
    #[serde(default = "default_target_fitness")]
    pub target_fitness: f64,
    /// Generations without improvement before stopping
    #[serde(default = "default_gga_stall")]
    pub stall_limit: u32,
    /// Retries per mutation before keeping the original
    #[serde(default = "default_mutation_attempts")]
    pub max_mutation_attempts: u32,
    #[serde(default)]
    pub weights: FitnessWeights,
}

fn default_population() -> usize {
    150
}

fn default_generations() -> u32 {
    300
}

fn default_crossover_rate() -> f64 {
    0.8
}

fn default_mutation_rate() -> f64 {
    0.15
}

fn default_elite_size() -> usize {
    10
}

fn default_tournament_size() -> usize {
    3
}

fn default_age_cap() -> u32 {
    50
}

fn default_target_fitness() -> f64 {
    0.95
}

fn default_gga_stall() -> u32 {
    60
}

fn default_mutation_attempts() -> u32 {
    8
}

impl Default for GgaConfig {
    fn default() -> Self {
        Self {
            population_size: default_population(),
            max_generations: default_generations(),
            crossover_rate: default_crossover_rate(),
            mutation_rate: default_mutation_rate(),
            elite_size: default_elite_size(),
            tournament_size: default_tournament_size(),
            age_cap: default_age_cap(),
            target_fitness: default_target_fitness(),
            stall_limit: default_gga_stall(),
            max_mutation_attempts: default_mutation_attempts(),
            weights: FitnessWeights::default(),
        }
    }
}

/// Full run configuration, loaded from config.toml or defaulted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default)]
    pub catalogue: SlotCatalogue,
    #[serde(default)]
    pub csp: CspConfig,
    #[serde(default)]
    pub gga: GgaConfig,
    /// semester -> fraction of effective units placed in term 1 (default half)
    #[serde(default)]
    pub term_ratios: BTreeMap<u8, f64>,
    /// Excuse back-to-back lab sessions from the one-session-per-day rule
    #[serde(default)]
    pub allow_consecutive_lab_sessions: bool,
    /// Fixed RNG seed for reproducible runs; absent means entropy-seeded
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            catalogue: SlotCatalogue::default(),
            csp: CspConfig::default(),
            gga: GgaConfig::default(),
            term_ratios: BTreeMap::new(),
            allow_consecutive_lab_sessions: false,
            seed: None,
        }
    }
}

impl SchedulerConfig {
    pub fn term_ratio(&self, semester: u8) -> f64 {
        self.term_ratios.get(&semester).copied().unwrap_or(0.5)
    }
}

/// All input data bundled together
#[derive(Debug, Clone)]
pub struct ScheduleInput {
    pub lecturers: Vec<Lecturer>,
    pub rooms: Vec<Room>,
    pub courses: Vec<Course>,
    pub programs: Vec<Program>,
    pub registry: CanonicalRegistry,
    pub config: SchedulerConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SchedulerConfig::default();
        assert_eq!(config.csp.timeout_secs, 60);
        assert_eq!(config.gga.population_size, 150);
        assert!((config.term_ratio(3) - 0.5).abs() < f64::EPSILON);
        assert!(!config.allow_consecutive_lab_sessions);
    }

    #[test]
    fn test_weights_sum_to_one() {
        let w = FitnessWeights::default();
        let sum = w.student_idle
            + w.lecturer_balance
            + w.room_utilization
            + w.weekday_distribution
            + w.slot_preference;
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_term_ratio_override() {
        let mut config = SchedulerConfig::default();
        config.term_ratios.insert(1, 0.6);
        assert!((config.term_ratio(1) - 0.6).abs() < f64::EPSILON);
        assert!((config.term_ratio(2) - 0.5).abs() < f64::EPSILON);
    }
}
