use crate::scheduler::{
    ConstraintChecker, ConstraintContext, ConstraintKind, MergedGroups, ResourceIndex,
    VariablePairs,
};
use crate::types::{Assignment, FitnessWeights, ProgramId, SchedulingVariable, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-metric scores, each in [0, 1], plus the violation penalty applied on
/// top of the weighted sum
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FitnessBreakdown {
    pub student_idle: f64,
    pub lecturer_balance: f64,
    pub room_utilization: f64,
    pub weekday_distribution: f64,
    pub slot_preference: f64,
    pub penalty: f64,
    pub critical_violations: u32,
    pub limit_violations: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FitnessScore {
    pub total: f64,
    pub breakdown: FitnessBreakdown,
}

/// Scores a gene vector against the five soft metrics and the violation
/// penalty. The penalty keeps infeasible and near-feasible candidates on one
/// comparable scale, strongly favouring repair.
pub struct FitnessEvaluator<'a> {
    res: &'a ResourceIndex,
    pairs: &'a VariablePairs,
    groups: &'a MergedGroups,
    variables: &'a [SchedulingVariable],
    checker: ConstraintChecker,
    weights: FitnessWeights,
}

const CRITICAL_KINDS: [ConstraintKind; 4] = [
    ConstraintKind::NoDoubleBooking,
    ConstraintKind::RoomCapacity,
    ConstraintKind::RoomKindMatch,
    ConstraintKind::MergeCapacity,
];

const LIMIT_KINDS: [ConstraintKind; 2] =
    [ConstraintKind::DailyLimit, ConstraintKind::WeeklyLimit];

impl<'a> FitnessEvaluator<'a> {
    pub fn new(
        res: &'a ResourceIndex,
        pairs: &'a VariablePairs,
        groups: &'a MergedGroups,
        variables: &'a [SchedulingVariable],
        checker: ConstraintChecker,
        weights: FitnessWeights,
    ) -> Self {
        Self {
            res,
            pairs,
            groups,
            variables,
            checker,
            weights,
        }
    }

    pub fn evaluate(&self, genes: &[Assignment]) -> FitnessScore {
        let (critical, limit) = self.count_violations(genes);
        let penalty = 0.5 * critical as f64 + 0.02 * limit as f64;

        let breakdown = FitnessBreakdown {
            student_idle: self.student_idle(genes),
            lecturer_balance: self.lecturer_balance(genes),
            room_utilization: self.room_utilization(genes),
            weekday_distribution: self.weekday_distribution(genes),
            slot_preference: self.slot_preference(genes),
            penalty,
            critical_violations: critical,
            limit_violations: limit,
        };

        let total = self.weights.student_idle * breakdown.student_idle
            + self.weights.lecturer_balance * breakdown.lecturer_balance
            + self.weights.room_utilization * breakdown.room_utilization
            + self.weights.weekday_distribution * breakdown.weekday_distribution
            + self.weights.slot_preference * breakdown.slot_preference
            - penalty;

        FitnessScore { total, breakdown }
    }

    /// Gaps between a group's consecutive sessions shrink the day score, and
    /// a day spanning far more time than it teaches shrinks it further
    fn student_idle(&self, genes: &[Assignment]) -> f64 {
        let mut by_group_day: BTreeMap<(&ProgramId, Weekday), Vec<(u32, u32)>> = BTreeMap::new();
        for gene in genes {
            let period = match self.res.catalogue.period(gene.slot) {
                Some(p) => p,
                None => continue,
            };
            let (start, end) = match (period.start_minutes(), period.end_minutes()) {
                (Some(s), Some(e)) => (s, e),
                _ => continue,
            };
            by_group_day
                .entry((&gene.program_id, gene.slot.day))
                .or_default()
                .push((start, end));
        }

        if by_group_day.is_empty() {
            return 1.0;
        }

        let mut total = 0.0;
        for sessions in by_group_day.values_mut() {
            sessions.sort();
            let mut gap_factor = 1.0;
            let mut used = 0u32;
            for window in sessions.windows(2) {
                let gap = window[1].0.saturating_sub(window[0].1);
                gap_factor *= match gap {
                    0 => 1.0,
                    g if g <= 60 => 0.95,
                    g if g <= 120 => 0.85,
                    _ => 0.65,
                };
            }
            for (start, end) in sessions.iter() {
                used += end - start;
            }
            let span = sessions.last().map(|s| s.1).unwrap_or(0)
                - sessions.first().map(|s| s.0).unwrap_or(0);
            let efficiency = if span > 0 {
                (used as f64 / span as f64).min(1.0)
            } else {
                1.0
            };
            total += gap_factor * efficiency;
        }
        total / by_group_day.len() as f64
    }

    /// Prefers 3-5 teaching hours per active day and an even load across the
    /// days a lecturer actually works
    fn lecturer_balance(&self, genes: &[Assignment]) -> f64 {
        let mut daily_hours: BTreeMap<(&crate::types::LecturerId, Weekday), u32> = BTreeMap::new();
        for gene in genes {
            *daily_hours.entry((&gene.lecturer_id, gene.slot.day)).or_insert(0) += 2;
        }
        if daily_hours.is_empty() {
            return 1.0;
        }

        let mut per_lecturer: BTreeMap<&crate::types::LecturerId, Vec<u32>> = BTreeMap::new();
        for ((lecturer, _), hours) in &daily_hours {
            per_lecturer.entry(*lecturer).or_default().push(*hours);
        }

        let mut total = 0.0;
        for hours in per_lecturer.values() {
            let day_score: f64 = hours
                .iter()
                .map(|&h| match h {
                    3..=5 => 1.0,
                    2 => 0.9,
                    6 => 0.8,
                    _ if h > 6 => 0.5,
                    _ => 0.7,
                })
                .sum::<f64>()
                / hours.len() as f64;

            let mean = hours.iter().sum::<u32>() as f64 / hours.len() as f64;
            let variance = hours
                .iter()
                .map(|&h| (h as f64 - mean).powi(2))
                .sum::<f64>()
                / hours.len() as f64;
            let spread_factor = 1.0 / (1.0 + variance.sqrt() / 4.0);

            total += day_score * spread_factor;
        }
        total / per_lecturer.len() as f64
    }

    /// Prefers 40-80% occupancy with a nudge for specialised rooms
    fn room_utilization(&self, genes: &[Assignment]) -> f64 {
        if genes.is_empty() {
            return 1.0;
        }
        let mut total = 0.0;
        for gene in genes {
            let room = match self.res.rooms.get(&gene.room_id) {
                Some(r) => r,
                None => continue,
            };
            if room.capacity == 0 {
                continue;
            }
            let size = self.res.group_size(&gene.program_id);
            let occupancy = size as f64 / room.capacity as f64;
            let mut score = if (0.4..=0.8).contains(&occupancy) {
                1.0
            } else if occupancy < 0.4 {
                0.6 + occupancy
            } else {
                1.0 - (occupancy - 0.8) * 0.5
            };

            let matched = self
                .res
                .courses
                .get(&gene.course_id)
                .map(|course| {
                    !room.specializations.is_empty()
                        && crate::canonical::matches_specialization(
                            course,
                            &room.specializations,
                            &self.res.registry,
                        )
                })
                .unwrap_or(false);
            if matched {
                score += 0.05;
            }
            total += score.clamp(0.0, 1.0);
        }
        total / genes.len() as f64
    }

    /// Even spread across the week; overloaded or back-to-back heavy days
    /// are punished hard
    fn weekday_distribution(&self, genes: &[Assignment]) -> f64 {
        let days = &self.res.catalogue.days;
        if genes.len() <= days.len() {
            return 1.0;
        }

        let mut counts: Vec<u32> = vec![0; days.len()];
        for gene in genes {
            if let Some(pos) = days.iter().position(|d| *d == gene.slot.day) {
                counts[pos] += 1;
            }
        }

        let total: u32 = counts.iter().sum();
        let mean = total as f64 / days.len() as f64;
        let variance = counts
            .iter()
            .map(|&c| (c as f64 - mean).powi(2))
            .sum::<f64>()
            / days.len() as f64;
        let mut score = (1.0 - variance.sqrt() / mean.max(1.0)).max(0.0);

        if counts.iter().any(|&c| c as f64 > 1.8 * mean) {
            score *= 0.6;
        }
        let heavy_pair = counts
            .windows(2)
            .any(|w| w[0] as f64 > 1.5 * mean && w[1] as f64 > 1.5 * mean);
        if heavy_pair {
            score *= 0.7;
        }
        // A lighter day in the week is worth a small bonus
        if counts.iter().min().copied().unwrap_or(0) as f64 <= 0.7 * mean {
            score += 0.05;
        }
        score.clamp(0.0, 1.0)
    }

    /// Late-afternoon teaching is costly, especially for early semesters
    fn slot_preference(&self, genes: &[Assignment]) -> f64 {
        if genes.is_empty() {
            return 1.0;
        }
        let mut total = 0.0;
        for gene in genes {
            let semester = self
                .res
                .programs
                .get(&gene.program_id)
                .map(|p| p.semester)
                .unwrap_or(1);
            let early = semester <= 2;
            let afternoon = self.res.catalogue.is_afternoon(gene.slot);
            let last = self.res.catalogue.is_last_period(gene.slot);

            total += match (afternoon, last, early) {
                (_, true, true) => 0.5,
                (_, true, false) => 0.8,
                (true, false, true) => 0.85,
                (true, false, false) => 0.95,
                _ => 1.0,
            };
        }
        total / genes.len() as f64
    }

    /// Replays the genes through the constraint engine and counts critical
    /// and limit breaches with the same excuse rules the solver uses
    fn count_violations(&self, genes: &[Assignment]) -> (u32, u32) {
        let mut ctx = ConstraintContext::new(self.res, self.pairs, self.groups, self.variables);
        let mut critical = 0;
        let mut limit = 0;

        for gene in genes {
            for kind in CRITICAL_KINDS {
                if self.checker.check(kind, gene, &ctx).is_some() {
                    critical += 1;
                }
            }
            for kind in LIMIT_KINDS {
                if self.checker.check(kind, gene, &ctx).is_some() {
                    limit += 1;
                }
            }
            ctx.add_assignment(gene);
        }
        (critical, limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::CanonicalRegistry;
    use crate::types::{
        Course, CourseId, Lecturer, LecturerId, LecturerRole, Program, ProgramId, Room, RoomId,
        RoomKind, ScheduleInput, SchedulerConfig, Term, TimeSlot, VariableId,
    };
    use std::collections::BTreeMap;

    fn world() -> ScheduleInput {
        ScheduleInput {
            lecturers: vec![Lecturer {
                id: LecturerId("l1".to_string()),
                name: "L1".to_string(),
                role: LecturerRole::FullTime,
                faculty: String::new(),
                specializations: vec!["C1".to_string()],
                availability: BTreeMap::new(),
            }],
            rooms: vec![Room {
                id: RoomId("r1".to_string()),
                name: "R1".to_string(),
                capacity: 30,
                kind: RoomKind::Theory,
                specializations: vec![],
                available: true,
                building: String::new(),
                campus: String::new(),
            }],
            courses: vec![Course {
                id: CourseId("c1".to_string()),
                code: "C1".to_string(),
                name: "Course One".to_string(),
                weekly_hours: 4,
                credits: 4,
                preferred_room_kind: RoomKind::Theory,
                course_group: None,
                preferred_term: None,
                foundational: false,
                prerequisites: vec![],
            }],
            programs: vec![Program {
                id: ProgramId("p1".to_string()),
                code: "P1".to_string(),
                batch: "2024".to_string(),
                semester: 1,
                size: 20,
                courses: vec![CourseId("c1".to_string())],
            }],
            registry: CanonicalRegistry::default(),
            config: SchedulerConfig::default(),
        }
    }

    fn gene(var: &str, slot: TimeSlot) -> Assignment {
        Assignment {
            variable_id: VariableId(var.to_string()),
            course_id: CourseId("c1".to_string()),
            program_id: ProgramId("p1".to_string()),
            lecturer_id: LecturerId("l1".to_string()),
            room_id: RoomId("r1".to_string()),
            slot,
            term: Term::One,
            session_number: 1,
        }
    }

    fn evaluator<'a>(
        res: &'a ResourceIndex,
        pairs: &'a VariablePairs,
        groups: &'a MergedGroups,
    ) -> FitnessEvaluator<'a> {
        FitnessEvaluator::new(
            res,
            pairs,
            groups,
            &[],
            ConstraintChecker::new(false),
            FitnessWeights::default(),
        )
    }

    #[test]
    fn test_single_clean_assignment_scores_high() {
        let input = world();
        let res = ResourceIndex::build(&input, &[]);
        let pairs = VariablePairs::new();
        let groups = MergedGroups::default();
        let eval = evaluator(&res, &pairs, &groups);

        let genes = vec![gene("v1", TimeSlot::new(Weekday::Mon, 0))];
        let score = eval.evaluate(&genes);

        assert_eq!(score.breakdown.critical_violations, 0);
        assert_eq!(score.breakdown.limit_violations, 0);
        assert!(score.total > 0.9, "total was {}", score.total);
    }

    #[test]
    fn test_double_booking_draws_heavy_penalty() {
        let input = world();
        let res = ResourceIndex::build(&input, &[]);
        let pairs = VariablePairs::new();
        let groups = MergedGroups::default();
        let eval = evaluator(&res, &pairs, &groups);

        let slot = TimeSlot::new(Weekday::Mon, 0);
        let mut second = gene("v2", slot);
        second.session_number = 2;
        let genes = vec![gene("v1", slot), second];
        let score = eval.evaluate(&genes);

        assert!(score.breakdown.critical_violations > 0);
        assert!(score.breakdown.penalty >= 0.5);
        assert!(score.total < 0.6);
    }

    #[test]
    fn test_gaps_lower_student_idle_score() {
        let input = world();
        let res = ResourceIndex::build(&input, &[]);
        let pairs = VariablePairs::new();
        let groups = MergedGroups::default();
        let eval = evaluator(&res, &pairs, &groups);

        // Back-to-back morning pair
        let tight = vec![
            gene("v1", TimeSlot::new(Weekday::Mon, 0)),
            gene("v2", TimeSlot::new(Weekday::Mon, 1)),
        ];
        // Same day with the lunch break plus a free block between
        let gappy = vec![
            gene("v1", TimeSlot::new(Weekday::Mon, 0)),
            gene("v2", TimeSlot::new(Weekday::Mon, 3)),
        ];

        assert!(eval.student_idle(&tight) > eval.student_idle(&gappy));
    }

    #[test]
    fn test_verifier_scale_idempotent() {
        let input = world();
        let res = ResourceIndex::build(&input, &[]);
        let pairs = VariablePairs::new();
        let groups = MergedGroups::default();
        let eval = evaluator(&res, &pairs, &groups);

        let genes = vec![gene("v1", TimeSlot::new(Weekday::Tue, 1))];
        let a = eval.evaluate(&genes);
        let b = eval.evaluate(&genes);
        assert_eq!(a, b);
    }
}
