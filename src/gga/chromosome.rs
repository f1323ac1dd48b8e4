use super::fitness::FitnessScore;
use crate::types::{Assignment, VariableId};

/// One gene per scheduled session
pub type Gene = Assignment;

/// A candidate timetable in the evolving population.
///
/// Genes are kept sorted by variable id so that every chromosome shares the
/// same positional layout, which is what makes uniform crossover meaningful.
#[derive(Debug, Clone)]
pub struct Chromosome {
    pub id: u64,
    pub genes: Vec<Gene>,
    pub generation: u32,
    pub age: u32,
    pub fitness: Option<FitnessScore>,
}

impl Chromosome {
    pub fn new(id: u64, mut genes: Vec<Gene>, generation: u32) -> Self {
        genes.sort_by(|a, b| a.variable_id.cmp(&b.variable_id));
        Self {
            id,
            genes,
            generation,
            age: 0,
            fitness: None,
        }
    }

    pub fn total_fitness(&self) -> f64 {
        self.fitness.as_ref().map(|f| f.total).unwrap_or(f64::NEG_INFINITY)
    }

    pub fn gene_index_of(&self, variable: &VariableId) -> Option<usize> {
        self.genes
            .binary_search_by(|g| g.variable_id.cmp(variable))
            .ok()
    }

    /// Replace the gene vector, invalidating the cached fitness
    pub fn replace_genes(&mut self, genes: Vec<Gene>) {
        self.genes = genes;
        self.fitness = None;
    }
}
