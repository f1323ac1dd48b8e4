use super::chromosome::Gene;
use crate::scheduler::{
    peers_of, ConstraintChecker, ConstraintContext, ConstraintKind, MergedGroups, ResourceIndex,
    VariablePairs,
};
use crate::types::{LecturerId, SchedulingVariable, TimeSlot, VariableId, Weekday};
use rand::seq::SliceRandom;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use std::collections::HashMap;

/// Constraint breaches a chromosome currently carries, grouped by the fix
/// that addresses them
#[derive(Debug, Clone, Default)]
pub struct ViolationSummary {
    pub weekly: Vec<LecturerId>,
    pub daily: Vec<(LecturerId, Weekday)>,
    /// (overloaded day, lightest day) when the spread is badly skewed
    pub unbalanced: Option<(Weekday, Weekday)>,
}

impl ViolationSummary {
    pub fn any(&self) -> bool {
        !self.weekly.is_empty() || !self.daily.is_empty() || self.unbalanced.is_some()
    }
}

/// Gene-level mutation operators. Fixes target identified violations first;
/// peers and canonical siblings always travel together.
pub struct Mutator<'a> {
    res: &'a ResourceIndex,
    pairs: &'a VariablePairs,
    groups: &'a MergedGroups,
    variables: &'a [SchedulingVariable],
    var_index: HashMap<VariableId, usize>,
    checker: ConstraintChecker,
    max_attempts: u32,
}

const VALIDATED_KINDS: [ConstraintKind; 6] = [
    ConstraintKind::NoDoubleBooking,
    ConstraintKind::RoomCapacity,
    ConstraintKind::RoomKindMatch,
    ConstraintKind::MergeCapacity,
    ConstraintKind::NoSameDayRepeat,
    ConstraintKind::Pairing,
];

impl<'a> Mutator<'a> {
    pub fn new(
        res: &'a ResourceIndex,
        pairs: &'a VariablePairs,
        groups: &'a MergedGroups,
        variables: &'a [SchedulingVariable],
        checker: ConstraintChecker,
        max_attempts: u32,
    ) -> Self {
        let var_index = variables
            .iter()
            .enumerate()
            .map(|(i, v)| (v.id.clone(), i))
            .collect();
        Self {
            res,
            pairs,
            groups,
            variables,
            var_index,
            checker,
            max_attempts,
        }
    }

    /// Violation-prioritised mutation: with violations present, a targeted
    /// fix is applied 70% of the time; otherwise a regular move. Candidates
    /// failing critical validation are retried up to the attempt budget.
    pub fn mutate(&self, genes: &[Gene], rng: &mut ChaCha8Rng) -> Option<Vec<Gene>> {
        for _ in 0..self.max_attempts {
            let mut candidate = genes.to_vec();
            let violations = self.identify_violations(&candidate);

            let changed = if violations.any() && rng.gen_bool(0.7) {
                self.apply_targeted_fix(&mut candidate, &violations, rng)
            } else {
                self.apply_regular_mutation(&mut candidate, rng)
            };

            if changed && self.validate_critical(&candidate) {
                return Some(candidate);
            }
        }
        None
    }

    /// Small local edit used to diversify the initial population
    pub fn local_variant(&self, genes: &[Gene], rng: &mut ChaCha8Rng) -> Option<Vec<Gene>> {
        for _ in 0..self.max_attempts {
            let mut candidate = genes.to_vec();
            let changed = match rng.gen_range(0..3) {
                0 => self.reallocate_room(&mut candidate, rng),
                1 => self.swap_lecturer(&mut candidate, rng),
                _ => self.compact_day(&mut candidate, rng),
            };
            if changed && self.validate_critical(&candidate) {
                return Some(candidate);
            }
        }
        None
    }

    pub fn identify_violations(&self, genes: &[Gene]) -> ViolationSummary {
        let mut summary = ViolationSummary::default();

        let mut hours: HashMap<&LecturerId, u32> = HashMap::new();
        let mut daily: HashMap<(&LecturerId, Weekday), u32> = HashMap::new();
        let mut day_counts: HashMap<Weekday, u32> = HashMap::new();
        for gene in genes {
            *hours.entry(&gene.lecturer_id).or_insert(0) += 2;
            *daily.entry((&gene.lecturer_id, gene.slot.day)).or_insert(0) += 1;
            *day_counts.entry(gene.slot.day).or_insert(0) += 1;
        }

        for (lecturer, used) in hours {
            let cap = self
                .res
                .lecturers
                .get(lecturer)
                .and_then(|l| l.weekly_hour_cap());
            if let Some(cap) = cap {
                if used > cap {
                    summary.weekly.push(lecturer.clone());
                }
            }
        }
        for ((lecturer, day), count) in daily {
            if count > 2 {
                summary.daily.push((lecturer.clone(), day));
            }
        }
        // Map iteration order must not leak into seeded runs
        summary.weekly.sort();
        summary.daily.sort();

        let days = &self.res.catalogue.days;
        if genes.len() > days.len() {
            let counts: Vec<(Weekday, u32)> = days
                .iter()
                .map(|d| (*d, day_counts.get(d).copied().unwrap_or(0)))
                .collect();
            let max = counts.iter().max_by_key(|(_, c)| *c);
            let min = counts.iter().min_by_key(|(_, c)| *c);
            if let (Some(&(over, hi)), Some(&(light, lo))) = (max, min) {
                if hi >= lo + 3 {
                    summary.unbalanced = Some((over, light));
                }
            }
        }

        summary
    }

    fn apply_targeted_fix(
        &self,
        genes: &mut Vec<Gene>,
        violations: &ViolationSummary,
        rng: &mut ChaCha8Rng,
    ) -> bool {
        if let Some(lecturer) = violations.weekly.choose(rng) {
            if self.fix_weekly_limit(genes, lecturer, rng) {
                return true;
            }
        }
        if let Some((lecturer, day)) = violations.daily.choose(rng) {
            if self.fix_daily_limit(genes, lecturer, *day, rng) {
                return true;
            }
        }
        if let Some((over, light)) = violations.unbalanced {
            if self.move_between_days(genes, over, light, rng) {
                return true;
            }
        }
        false
    }

    fn apply_regular_mutation(&self, genes: &mut Vec<Gene>, rng: &mut ChaCha8Rng) -> bool {
        if rng.gen_bool(0.5) {
            // Weekday-balancing move
            let days = &self.res.catalogue.days;
            let mut counts: Vec<(Weekday, u32)> = days.iter().map(|d| (*d, 0)).collect();
            for gene in genes.iter() {
                if let Some(entry) = counts.iter_mut().find(|(d, _)| *d == gene.slot.day) {
                    entry.1 += 1;
                }
            }
            let over = counts.iter().max_by_key(|(_, c)| *c).map(|(d, _)| *d);
            let light = counts.iter().min_by_key(|(_, c)| *c).map(|(d, _)| *d);
            match (over, light) {
                (Some(over), Some(light)) if over != light => {
                    self.move_between_days(genes, over, light, rng)
                }
                _ => false,
            }
        } else {
            self.swap_two_slots(genes, rng)
        }
    }

    /// Hand one of an overloaded lecturer's sessions to another qualified
    /// lecturer who admits the same slot
    fn fix_weekly_limit(
        &self,
        genes: &mut [Gene],
        lecturer: &LecturerId,
        rng: &mut ChaCha8Rng,
    ) -> bool {
        let mut indices: Vec<usize> = genes
            .iter()
            .enumerate()
            .filter(|(_, g)| &g.lecturer_id == lecturer)
            .map(|(i, _)| i)
            .collect();
        indices.shuffle(rng);

        for idx in indices {
            let slot = genes[idx].slot;
            let variable = match self.variable_of(&genes[idx].variable_id) {
                Some(v) => v,
                None => continue,
            };
            let mut alternatives: Vec<&LecturerId> = variable
                .lecturer_domain
                .iter()
                .filter(|l| *l != lecturer)
                .filter(|l| {
                    variable
                        .lecturer_slots
                        .get(*l)
                        .map(|slots| slots.contains(&slot))
                        .unwrap_or(false)
                })
                .collect();
            alternatives.shuffle(rng);
            if let Some(alternative) = alternatives.first() {
                genes[idx].lecturer_id = (*alternative).clone();
                return true;
            }
        }
        false
    }

    /// Move one of the day's sessions (and its peers) to another day
    fn fix_daily_limit(
        &self,
        genes: &mut Vec<Gene>,
        lecturer: &LecturerId,
        day: Weekday,
        rng: &mut ChaCha8Rng,
    ) -> bool {
        let mut indices: Vec<usize> = genes
            .iter()
            .enumerate()
            .filter(|(_, g)| &g.lecturer_id == lecturer && g.slot.day == day)
            .map(|(i, _)| i)
            .collect();
        indices.shuffle(rng);

        for idx in indices {
            let candidates = self.admissible_slots(genes, idx, |slot| slot.day != day);
            if let Some(&new_slot) = candidates.choose(rng) {
                self.move_gene_with_peers(genes, idx, new_slot);
                return true;
            }
        }
        false
    }

    fn move_between_days(
        &self,
        genes: &mut Vec<Gene>,
        over: Weekday,
        light: Weekday,
        rng: &mut ChaCha8Rng,
    ) -> bool {
        let mut indices: Vec<usize> = genes
            .iter()
            .enumerate()
            .filter(|(_, g)| g.slot.day == over)
            .map(|(i, _)| i)
            .collect();
        indices.shuffle(rng);

        for idx in indices {
            let candidates = self.admissible_slots(genes, idx, |slot| slot.day == light);
            if let Some(&new_slot) = candidates.choose(rng) {
                self.move_gene_with_peers(genes, idx, new_slot);
                return true;
            }
        }
        false
    }

    /// Exchange the slots of two unrelated genes, peers travelling with each
    fn swap_two_slots(&self, genes: &mut Vec<Gene>, rng: &mut ChaCha8Rng) -> bool {
        if genes.len() < 2 {
            return false;
        }
        for _ in 0..4 {
            let a = rng.gen_range(0..genes.len());
            let b = rng.gen_range(0..genes.len());
            if a == b {
                continue;
            }
            let (slot_a, slot_b) = (genes[a].slot, genes[b].slot);
            if slot_a == slot_b {
                continue;
            }
            let peers_a = peers_of(self.pairs, &genes[a].variable_id);
            if peers_a.iter().any(|p| p == &genes[b].variable_id) {
                continue;
            }
            if !self.admits(genes, a, slot_b) || !self.admits(genes, b, slot_a) {
                continue;
            }
            self.move_gene_with_peers(genes, a, slot_b);
            self.move_gene_with_peers(genes, b, slot_a);
            return true;
        }
        false
    }

    fn reallocate_room(&self, genes: &mut [Gene], rng: &mut ChaCha8Rng) -> bool {
        if genes.is_empty() {
            return false;
        }
        let idx = rng.gen_range(0..genes.len());
        let variable = match self.variable_of(&genes[idx].variable_id) {
            Some(v) => v,
            None => return false,
        };
        let mut rooms: Vec<_> = variable
            .room_domain
            .iter()
            .filter(|r| **r != genes[idx].room_id)
            .collect();
        rooms.shuffle(rng);
        match rooms.first() {
            Some(room) => {
                genes[idx].room_id = (*room).clone();
                true
            }
            None => false,
        }
    }

    fn swap_lecturer(&self, genes: &mut [Gene], rng: &mut ChaCha8Rng) -> bool {
        if genes.is_empty() {
            return false;
        }
        let idx = rng.gen_range(0..genes.len());
        let current = genes[idx].lecturer_id.clone();
        self.fix_weekly_limit(genes, &current, rng)
    }

    /// Pull a session one period earlier in its day
    fn compact_day(&self, genes: &mut Vec<Gene>, rng: &mut ChaCha8Rng) -> bool {
        let mut indices: Vec<usize> = (0..genes.len()).collect();
        indices.shuffle(rng);
        for idx in indices {
            let slot = genes[idx].slot;
            if slot.period == 0 {
                continue;
            }
            let earlier = TimeSlot::new(slot.day, slot.period - 1);
            if self.admits(genes, idx, earlier)
                && peers_admit(self, genes, idx, earlier)
            {
                self.move_gene_with_peers(genes, idx, earlier);
                return true;
            }
        }
        false
    }

    /// Slots a gene and all of its peers can jointly move to
    fn admissible_slots<F: Fn(&TimeSlot) -> bool>(
        &self,
        genes: &[Gene],
        idx: usize,
        filter: F,
    ) -> Vec<TimeSlot> {
        let variable = match self.variable_of(&genes[idx].variable_id) {
            Some(v) => v,
            None => return Vec::new(),
        };
        let own = match variable.lecturer_slots.get(&genes[idx].lecturer_id) {
            Some(slots) => slots,
            None => return Vec::new(),
        };
        own.iter()
            .copied()
            .filter(|slot| filter(slot))
            .filter(|slot| peers_admit(self, genes, idx, *slot))
            .collect()
    }

    fn admits(&self, genes: &[Gene], idx: usize, slot: TimeSlot) -> bool {
        self.variable_of(&genes[idx].variable_id)
            .and_then(|v| v.lecturer_slots.get(&genes[idx].lecturer_id))
            .map(|slots| slots.contains(&slot))
            .unwrap_or(false)
    }

    fn move_gene_with_peers(&self, genes: &mut [Gene], idx: usize, new_slot: TimeSlot) {
        let vid = genes[idx].variable_id.clone();
        genes[idx].slot = new_slot;
        for peer in peers_of(self.pairs, &vid) {
            if let Some(peer_gene) = genes.iter_mut().find(|g| &g.variable_id == peer) {
                peer_gene.slot = new_slot;
            }
        }
    }

    fn variable_of(&self, vid: &VariableId) -> Option<&SchedulingVariable> {
        self.var_index.get(vid).map(|&i| &self.variables[i])
    }

    /// Critical-only validation: limit breaches are tolerated, structural
    /// breakage is not. Part-time availability is re-checked because slot
    /// moves must stay inside what each lecturer admits.
    pub fn validate_critical(&self, genes: &[Gene]) -> bool {
        for gene in genes {
            let lecturer = match self.res.lecturers.get(&gene.lecturer_id) {
                Some(l) => l,
                None => return false,
            };
            let label = self.res.catalogue.label(gene.slot);
            if !lecturer.admits(gene.slot.day, &label) {
                return false;
            }
        }

        let mut ctx = ConstraintContext::new(self.res, self.pairs, self.groups, self.variables);
        for gene in genes {
            for kind in VALIDATED_KINDS {
                if self.checker.check(kind, gene, &ctx).is_some() {
                    return false;
                }
            }
            ctx.add_assignment(gene);
        }
        true
    }
}

fn peers_admit(mutator: &Mutator<'_>, genes: &[Gene], idx: usize, slot: TimeSlot) -> bool {
    let vid = &genes[idx].variable_id;
    peers_of(mutator.pairs, vid).iter().all(|peer| {
        match genes.iter().position(|g| &g.variable_id == peer) {
            Some(peer_idx) => mutator.admits(genes, peer_idx, slot),
            None => true,
        }
    })
}
