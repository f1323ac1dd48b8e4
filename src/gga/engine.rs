use super::chromosome::{Chromosome, Gene};
use super::fitness::FitnessEvaluator;
use super::mutation::Mutator;
use crate::scheduler::{
    CancelToken, ConstraintChecker, MergedGroups, ResourceIndex, VariablePairs,
};
use crate::types::{Assignment, GgaConfig, SchedulingVariable};
use rand::Rng;
use rand_chacha::ChaCha8Rng;

/// What the genetic phase hands back
#[derive(Debug, Clone)]
pub struct GgaOutcome {
    pub assignments: Vec<Assignment>,
    pub fitness: f64,
    pub initial_fitness: f64,
    pub generations: u32,
    pub trajectory: Vec<f64>,
}

/// Guided genetic optimiser over complete assignment vectors.
///
/// The CSP output seeds the population and is preserved verbatim, so the
/// result can never score below what the search already achieved.
pub struct GgaEngine<'a> {
    evaluator: FitnessEvaluator<'a>,
    mutator: Mutator<'a>,
    config: &'a GgaConfig,
    rng: ChaCha8Rng,
    cancel: CancelToken,
    mutation_rate: f64,
    next_id: u64,
}

impl<'a> GgaEngine<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        res: &'a ResourceIndex,
        pairs: &'a VariablePairs,
        groups: &'a MergedGroups,
        variables: &'a [SchedulingVariable],
        checker: ConstraintChecker,
        config: &'a GgaConfig,
        rng: ChaCha8Rng,
        cancel: CancelToken,
    ) -> Self {
        Self {
            evaluator: FitnessEvaluator::new(
                res,
                pairs,
                groups,
                variables,
                checker,
                config.weights.clone(),
            ),
            mutator: Mutator::new(
                res,
                pairs,
                groups,
                variables,
                checker,
                config.max_mutation_attempts,
            ),
            config,
            rng,
            cancel,
            mutation_rate: config.mutation_rate,
            next_id: 0,
        }
    }

    pub fn optimize(mut self, base: Vec<Assignment>) -> GgaOutcome {
        let mut base_chromosome = Chromosome::new(self.fresh_id(), base, 0);
        base_chromosome.fitness = Some(self.evaluator.evaluate(&base_chromosome.genes));
        let initial_fitness = base_chromosome.total_fitness();

        if base_chromosome.genes.is_empty() || self.config.max_generations == 0 {
            return GgaOutcome {
                assignments: base_chromosome.genes,
                fitness: initial_fitness,
                initial_fitness,
                generations: 0,
                trajectory: vec![initial_fitness],
            };
        }

        let mut population = self.seed_population(&base_chromosome);
        let mut best = base_chromosome.clone();
        let mut trajectory = vec![initial_fitness];
        let mut stall = 0u32;
        let mut generations_run = 0u32;

        for generation in 1..=self.config.max_generations {
            if self.cancel.is_cancelled() {
                break;
            }
            generations_run = generation;

            self.evaluate_all(&mut population);
            population.sort_by(|a, b| b.total_fitness().total_cmp(&a.total_fitness()));

            let leader = &population[0];
            if leader.total_fitness() > best.total_fitness() + f64::EPSILON {
                best = leader.clone();
                stall = 0;
            } else {
                stall += 1;
            }
            trajectory.push(best.total_fitness());

            if best.total_fitness() >= self.config.target_fitness {
                break;
            }
            if stall >= self.config.stall_limit {
                break;
            }
            self.adapt_parameters(generation, &trajectory);

            let offspring = self.breed(&population, generation);
            population = self.replace(population, offspring);
        }

        GgaOutcome {
            fitness: best.total_fitness(),
            assignments: best.genes,
            initial_fitness,
            generations: generations_run,
            trajectory,
        }
    }

    /// Base individual plus locally mutated variants
    fn seed_population(&mut self, base: &Chromosome) -> Vec<Chromosome> {
        let mut population = Vec::with_capacity(self.config.population_size);
        population.push(base.clone());

        while population.len() < self.config.population_size {
            let id = self.fresh_id();
            match self.mutator.local_variant(&base.genes, &mut self.rng) {
                Some(genes) => population.push(Chromosome::new(id, genes, 0)),
                None => {
                    let mut clone = base.clone();
                    clone.id = id;
                    population.push(clone);
                }
            }
        }
        population
    }

    fn evaluate_all(&self, population: &mut [Chromosome]) {
        for chromosome in population.iter_mut() {
            if chromosome.fitness.is_none() {
                chromosome.fitness = Some(self.evaluator.evaluate(&chromosome.genes));
            }
        }
    }

    fn breed(&mut self, population: &[Chromosome], generation: u32) -> Vec<Chromosome> {
        let target = self
            .config
            .population_size
            .saturating_sub(self.config.elite_size)
            .max(2);
        let mut offspring = Vec::with_capacity(target);

        while offspring.len() < target {
            let parent_a = self.tournament(population).genes.clone();
            let parent_b = self.tournament(population).genes.clone();

            let (child_a, child_b) = if self.rng.gen_bool(self.config.crossover_rate) {
                self.uniform_crossover(parent_a, parent_b)
            } else {
                (parent_a, parent_b)
            };

            for genes in [child_a, child_b] {
                if offspring.len() >= target {
                    break;
                }
                let genes = if self.rng.gen_bool(self.mutation_rate) {
                    self.mutator.mutate(&genes, &mut self.rng).unwrap_or(genes)
                } else {
                    genes
                };
                let id = self.fresh_id();
                offspring.push(Chromosome::new(id, genes, generation));
            }
        }
        offspring
    }

    fn tournament<'p>(&mut self, population: &'p [Chromosome]) -> &'p Chromosome {
        let mut winner = &population[self.rng.gen_range(0..population.len())];
        for _ in 1..self.config.tournament_size {
            let challenger = &population[self.rng.gen_range(0..population.len())];
            if challenger.total_fitness() > winner.total_fitness() {
                winner = challenger;
            }
        }
        winner
    }

    /// Independent per-position swap; offspring survive on their own fitness
    fn uniform_crossover(
        &mut self,
        mut a: Vec<Gene>,
        mut b: Vec<Gene>,
    ) -> (Vec<Gene>, Vec<Gene>) {
        let len = a.len().min(b.len());
        for i in 0..len {
            if self.rng.gen_bool(0.5) {
                std::mem::swap(&mut a[i], &mut b[i]);
            }
        }
        (a, b)
    }

    /// Age-based replacement: elites survive unconditionally, the rest fill
    /// in fitness order skipping individuals past the age cap, backfilling
    /// from the skipped when short
    fn replace(&mut self, parents: Vec<Chromosome>, offspring: Vec<Chromosome>) -> Vec<Chromosome> {
        let mut combined: Vec<Chromosome> = parents
            .into_iter()
            .map(|mut c| {
                c.age += 1;
                c
            })
            .chain(offspring)
            .collect();
        for chromosome in combined.iter_mut() {
            if chromosome.fitness.is_none() {
                chromosome.fitness = Some(self.evaluator.evaluate(&chromosome.genes));
            }
        }
        combined.sort_by(|a, b| b.total_fitness().total_cmp(&a.total_fitness()));

        let mut next = Vec::with_capacity(self.config.population_size);
        let mut skipped = Vec::new();
        for chromosome in combined {
            if next.len() >= self.config.population_size {
                break;
            }
            if next.len() < self.config.elite_size || chromosome.age <= self.config.age_cap {
                next.push(chromosome);
            } else {
                skipped.push(chromosome);
            }
        }
        for chromosome in skipped {
            if next.len() >= self.config.population_size {
                break;
            }
            next.push(chromosome);
        }
        next
    }

    /// Every 50 generations: stagnation raises the mutation rate, strong
    /// improvement lowers it
    fn adapt_parameters(&mut self, generation: u32, trajectory: &[f64]) {
        if generation % 50 != 0 || trajectory.len() < 51 {
            return;
        }
        let current = trajectory[trajectory.len() - 1];
        let past = trajectory[trajectory.len() - 51];
        let rate = if past.abs() > f64::EPSILON {
            (current - past) / past.abs()
        } else {
            current - past
        };

        if rate < 0.01 {
            self.mutation_rate = (self.mutation_rate * 1.2).min(0.5);
        } else if rate > 0.05 {
            self.mutation_rate = (self.mutation_rate * 0.95).max(0.05);
        }
    }

    fn fresh_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::CanonicalRegistry;
    use crate::types::{
        Course, CourseId, Lecturer, LecturerId, LecturerRole, Program, ProgramId, Room, RoomId,
        RoomKind, ScheduleInput, SchedulerConfig, Term, TimeSlot, VariableId, Weekday,
    };
    use rand::SeedableRng;
    use std::collections::{BTreeMap, HashMap};

    fn world() -> ScheduleInput {
        ScheduleInput {
            lecturers: vec![Lecturer {
                id: LecturerId("l1".to_string()),
                name: "L1".to_string(),
                role: LecturerRole::FullTime,
                faculty: String::new(),
                specializations: vec!["C1".to_string(), "C2".to_string()],
                availability: BTreeMap::new(),
            }],
            rooms: vec![Room {
                id: RoomId("r1".to_string()),
                name: "R1".to_string(),
                capacity: 40,
                kind: RoomKind::Theory,
                specializations: vec![],
                available: true,
                building: String::new(),
                campus: String::new(),
            }],
            courses: vec![
                course("c1", "C1"),
                course("c2", "C2"),
            ],
            programs: vec![Program {
                id: ProgramId("p1".to_string()),
                code: "P1".to_string(),
                batch: "2024".to_string(),
                semester: 1,
                size: 25,
                courses: vec![CourseId("c1".to_string()), CourseId("c2".to_string())],
            }],
            registry: CanonicalRegistry::default(),
            config: SchedulerConfig::default(),
        }
    }

    fn course(id: &str, code: &str) -> Course {
        Course {
            id: CourseId(id.to_string()),
            code: code.to_string(),
            name: format!("{code} course"),
            weekly_hours: 2,
            credits: 4,
            preferred_room_kind: RoomKind::Theory,
            course_group: None,
            preferred_term: None,
            foundational: false,
            prerequisites: vec![],
        }
    }

    fn variable(id: &str, course: &str, slots: &[TimeSlot]) -> crate::types::SchedulingVariable {
        let mut lecturer_slots = HashMap::new();
        lecturer_slots.insert(LecturerId("l1".to_string()), slots.to_vec());
        crate::types::SchedulingVariable {
            id: VariableId(id.to_string()),
            program_id: ProgramId("p1".to_string()),
            course_id: CourseId(course.to_string()),
            session_number: 1,
            group_size: 25,
            merged: false,
            slot_domain: slots.to_vec(),
            lecturer_domain: vec![LecturerId("l1".to_string())],
            room_domain: vec![RoomId("r1".to_string())],
            lecturer_slots,
            room_fallback: None,
        }
    }

    fn gene(var: &str, course: &str, slot: TimeSlot) -> Assignment {
        Assignment {
            variable_id: VariableId(var.to_string()),
            course_id: CourseId(course.to_string()),
            program_id: ProgramId("p1".to_string()),
            lecturer_id: LecturerId("l1".to_string()),
            room_id: RoomId("r1".to_string()),
            slot,
            term: Term::One,
            session_number: 1,
        }
    }

    #[test]
    fn test_never_regresses_below_base() {
        let input = world();
        let res = ResourceIndex::build(&input, &[]);
        let pairs = VariablePairs::new();
        let groups = MergedGroups::default();
        let slots = input.config.catalogue.slots();
        let variables = vec![variable("v1", "c1", &slots), variable("v2", "c2", &slots)];

        let mut config = input.config.gga.clone();
        config.population_size = 12;
        config.max_generations = 15;

        let engine = GgaEngine::new(
            &res,
            &pairs,
            &groups,
            &variables,
            ConstraintChecker::new(false),
            &config,
            ChaCha8Rng::seed_from_u64(11),
            CancelToken::new(),
        );
        let base = vec![
            gene("v1", "c1", TimeSlot::new(Weekday::Mon, 0)),
            gene("v2", "c2", TimeSlot::new(Weekday::Tue, 0)),
        ];
        let outcome = engine.optimize(base);

        assert!(outcome.fitness >= outcome.initial_fitness);
        assert_eq!(outcome.assignments.len(), 2);
        assert!(!outcome.trajectory.is_empty());
    }

    #[test]
    fn test_empty_base_is_returned_unchanged() {
        let input = world();
        let res = ResourceIndex::build(&input, &[]);
        let pairs = VariablePairs::new();
        let groups = MergedGroups::default();

        let engine = GgaEngine::new(
            &res,
            &pairs,
            &groups,
            &[],
            ConstraintChecker::new(false),
            &input.config.gga,
            ChaCha8Rng::seed_from_u64(1),
            CancelToken::new(),
        );
        let outcome = engine.optimize(Vec::new());
        assert!(outcome.assignments.is_empty());
        assert_eq!(outcome.generations, 0);
    }

    #[test]
    fn test_cancellation_stops_between_generations() {
        let input = world();
        let res = ResourceIndex::build(&input, &[]);
        let pairs = VariablePairs::new();
        let groups = MergedGroups::default();
        let slots = input.config.catalogue.slots();
        let variables = vec![variable("v1", "c1", &slots)];

        let cancel = CancelToken::new();
        cancel.cancel();

        let engine = GgaEngine::new(
            &res,
            &pairs,
            &groups,
            &variables,
            ConstraintChecker::new(false),
            &input.config.gga,
            ChaCha8Rng::seed_from_u64(5),
            cancel,
        );
        let outcome = engine.optimize(vec![gene("v1", "c1", TimeSlot::new(Weekday::Mon, 0))]);

        // The base still comes back; no generations were run to completion
        assert_eq!(outcome.assignments.len(), 1);
    }
}
