use super::constraints::ConstraintChecker;
use super::context::{ConstraintContext, ResourceIndex};
use super::merger::MergedGroups;
use super::pairing::{peers_of, VariablePairs};
use super::CancelToken;
use crate::types::{
    Assignment, CspConfig, LecturerId, RoomId, SchedulingVariable, Term, TimeSlot,
    UnassignedVariable, VariableId,
};
use rand::seq::SliceRandom;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

/// Counters for one search run
#[derive(Debug, Clone, Default)]
pub struct CspStats {
    pub iterations: u64,
    pub backtracks: u64,
    pub elapsed_ms: u64,
    pub stalled: bool,
    pub timed_out: bool,
    pub cancelled: bool,
    pub greedy_solved: bool,
}

/// Result contract: on `complete` every variable is assigned and hard-valid;
/// otherwise the retained best partial is returned with diagnosed gaps.
#[derive(Debug, Clone)]
pub struct CspOutcome {
    pub assignments: Vec<Assignment>,
    pub unassigned: Vec<UnassignedVariable>,
    pub complete: bool,
    pub stats: CspStats,
}

enum Stop {
    Timeout,
    Stalled,
    IterationCap,
    Cancelled,
}

/// Backtracking search with a greedy first pass, MRV + degree + random
/// variable selection and least-constraining value ordering.
pub struct CspSolver<'a> {
    res: &'a ResourceIndex,
    variables: &'a [SchedulingVariable],
    pairs: &'a VariablePairs,
    checker: ConstraintChecker,
    config: &'a CspConfig,
    term: Term,
    rng: ChaCha8Rng,
    cancel: CancelToken,
    ctx: ConstraintContext<'a>,
    index_of: HashMap<VariableId, usize>,

    best: Vec<Assignment>,
    best_count: usize,
    stall: u32,
    iterations: u64,
    backtracks: u64,
    start: Instant,
    stats: CspStats,
}

impl<'a> CspSolver<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        res: &'a ResourceIndex,
        variables: &'a [SchedulingVariable],
        pairs: &'a VariablePairs,
        groups: &'a MergedGroups,
        checker: ConstraintChecker,
        config: &'a CspConfig,
        term: Term,
        rng: ChaCha8Rng,
        cancel: CancelToken,
    ) -> Self {
        let index_of = variables
            .iter()
            .enumerate()
            .map(|(i, v)| (v.id.clone(), i))
            .collect();
        Self {
            res,
            variables,
            pairs,
            checker,
            config,
            term,
            rng,
            cancel,
            ctx: ConstraintContext::new(res, pairs, groups, variables),
            index_of,
            best: Vec::new(),
            best_count: 0,
            stall: 0,
            iterations: 0,
            backtracks: 0,
            start: Instant::now(),
            stats: CspStats::default(),
        }
    }

    pub fn solve(mut self) -> CspOutcome {
        self.start = Instant::now();

        if self.try_greedy() {
            self.stats.greedy_solved = true;
            return self.finish(true);
        }

        // Greedy left placements behind only on success; start clean
        let leftover: Vec<VariableId> =
            self.ctx.assignments().map(|a| a.variable_id.clone()).collect();
        for vid in leftover {
            self.ctx.remove_assignment(&vid);
        }

        let mut unassigned: Vec<usize> = (0..self.variables.len()).collect();
        let complete = match self.backtrack(&mut unassigned) {
            Ok(done) => done,
            Err(stop) => {
                match stop {
                    Stop::Timeout => self.stats.timed_out = true,
                    Stop::Stalled => self.stats.stalled = true,
                    Stop::Cancelled => self.stats.cancelled = true,
                    Stop::IterationCap => {}
                }
                false
            }
        };
        self.finish(complete)
    }

    fn finish(mut self, complete: bool) -> CspOutcome {
        self.stats.iterations = self.iterations;
        self.stats.backtracks = self.backtracks;
        self.stats.elapsed_ms = self.start.elapsed().as_millis() as u64;

        let mut assignments: Vec<Assignment> = if complete {
            self.ctx.assignments().cloned().collect()
        } else if self.ctx.len() >= self.best_count {
            self.ctx.assignments().cloned().collect()
        } else {
            self.best.clone()
        };
        // The store iterates in hash order; keep the output reproducible
        assignments.sort_by(|a, b| a.variable_id.cmp(&b.variable_id));

        let placed: HashSet<&VariableId> = assignments.iter().map(|a| &a.variable_id).collect();
        let unassigned: Vec<UnassignedVariable> = self
            .variables
            .iter()
            .filter(|v| !placed.contains(&v.id))
            .map(|v| UnassignedVariable {
                variable_id: v.id.clone(),
                course_id: v.course_id.clone(),
                program_id: v.program_id.clone(),
                reason: self.diagnose(v, &assignments),
            })
            .collect();

        CspOutcome {
            complete: unassigned.is_empty(),
            assignments,
            unassigned,
            stats: self.stats,
        }
    }

    /// Single ordered pass; any failure unwinds everything and defers to the
    /// full search
    fn try_greedy(&mut self) -> bool {
        let variables = self.variables;
        let mut order: Vec<usize> = (0..variables.len()).collect();
        let mut keys: HashMap<usize, (bool, std::cmp::Reverse<u32>, usize, u32)> = HashMap::new();
        for &idx in &order {
            let v = &variables[idx];
            let lab = self
                .res
                .courses
                .get(&v.course_id)
                .map(|c| c.is_lab())
                .unwrap_or(false);
            keys.insert(
                idx,
                (
                    !lab,
                    std::cmp::Reverse(v.group_size),
                    v.room_domain.len(),
                    self.rng.gen(),
                ),
            );
        }
        order.sort_by_key(|idx| keys[idx].clone());

        let mut placed_all: Vec<VariableId> = Vec::new();
        for idx in order {
            if self.ctx.assignment(&self.variables[idx].id).is_some() {
                continue; // co-placed as somebody's peer already
            }
            let candidates = self.order_values(idx, &[]);
            let mut placed_here = None;
            for (slot, lecturer, room) in candidates {
                if let Some(placed) = self.place_with_peers(idx, slot, &lecturer, &room) {
                    placed_here = Some(placed);
                    break;
                }
            }
            match placed_here {
                Some(placed) => placed_all.extend(placed),
                None => {
                    for vid in placed_all {
                        self.ctx.remove_assignment(&vid);
                    }
                    return false;
                }
            }
        }
        true
    }

    fn backtrack(&mut self, unassigned: &mut Vec<usize>) -> Result<bool, Stop> {
        self.poll_budget()?;
        self.iterations += 1;

        if self.ctx.len() > self.best_count {
            self.best_count = self.ctx.len();
            self.best = self.ctx.assignments().cloned().collect();
            self.stall = 0;
        } else {
            self.stall += 1;
            if self.stall >= self.config.stall_threshold {
                return Err(Stop::Stalled);
            }
        }

        if unassigned.is_empty() {
            return Ok(true);
        }

        let pick = self.select_variable(unassigned);
        let var_idx = unassigned[pick];
        unassigned.swap_remove(pick);

        let candidates = self.order_values(var_idx, unassigned);
        for (slot, lecturer, room) in candidates {
            let placed = match self.place_with_peers(var_idx, slot, &lecturer, &room) {
                Some(placed) => placed,
                None => continue,
            };

            let placed_indices: HashSet<usize> =
                placed.iter().filter_map(|vid| self.index_of.get(vid).copied()).collect();
            let removed: Vec<usize> = unassigned
                .iter()
                .copied()
                .filter(|i| placed_indices.contains(i))
                .collect();
            unassigned.retain(|i| !placed_indices.contains(i));

            if self.forward_check(&placed, unassigned) {
                match self.backtrack(unassigned) {
                    Ok(true) => return Ok(true),
                    Ok(false) => {}
                    Err(stop) => return Err(stop),
                }
            }

            unassigned.extend(removed);
            for vid in placed.iter().rev() {
                self.ctx.remove_assignment(vid);
            }
        }

        unassigned.push(var_idx);
        self.backtracks += 1;
        Ok(false)
    }

    fn poll_budget(&self) -> Result<(), Stop> {
        if self.cancel.is_cancelled() {
            return Err(Stop::Cancelled);
        }
        if self.start.elapsed() >= Duration::from_secs(self.config.timeout_secs) {
            return Err(Stop::Timeout);
        }
        if self.iterations >= self.config.max_iterations {
            return Err(Stop::IterationCap);
        }
        Ok(())
    }

    /// Smallest accurate domain first, highest degree second, random third
    fn select_variable(&mut self, unassigned: &[usize]) -> usize {
        let variables = self.variables;
        let mut best_pos = 0;
        let mut best_key = (usize::MAX, std::cmp::Reverse(0usize), u32::MAX);
        for (pos, &idx) in unassigned.iter().enumerate() {
            let v = &variables[idx];
            let degree = self.degree(idx, unassigned);
            let key = (v.accurate_domain_size(), std::cmp::Reverse(degree), self.rng.gen());
            if key < best_key {
                best_key = key;
                best_pos = pos;
            }
        }
        best_pos
    }

    /// Unassigned variables this one competes with for a group, lecturer or room
    fn degree(&self, idx: usize, unassigned: &[usize]) -> usize {
        let v = &self.variables[idx];
        let lecturers: HashSet<&LecturerId> = v.lecturer_domain.iter().collect();
        let rooms: HashSet<&RoomId> = v.room_domain.iter().collect();
        unassigned
            .iter()
            .filter(|&&other| other != idx)
            .filter(|&&other| {
                let o = &self.variables[other];
                o.program_id == v.program_id
                    || o.lecturer_domain.iter().any(|l| lecturers.contains(l))
                    || o.room_domain.iter().any(|r| rooms.contains(r))
            })
            .count()
    }

    /// Least-constraining value ordering over (slot, lecturer, room) triples
    fn order_values(
        &mut self,
        var_idx: usize,
        unassigned: &[usize],
    ) -> Vec<(TimeSlot, LecturerId, RoomId)> {
        let variables = self.variables;
        let v = &variables[var_idx];
        let course = self.res.courses.get(&v.course_id);
        let is_lab = course.map(|c| c.is_lab()).unwrap_or(false);

        // How contested each resource is among still-unassigned variables
        let mut lecturer_demand: HashMap<&LecturerId, f64> = HashMap::new();
        let mut room_demand: HashMap<&RoomId, f64> = HashMap::new();
        for &other in unassigned {
            if other == var_idx {
                continue;
            }
            let o = &self.variables[other];
            for l in &o.lecturer_domain {
                *lecturer_demand.entry(l).or_insert(0.0) += 1.0;
            }
            for r in &o.room_domain {
                *room_demand.entry(r).or_insert(0.0) += 1.0;
            }
        }

        let mut scored: Vec<(f64, TimeSlot, LecturerId, RoomId)> = Vec::new();
        for lecturer in &v.lecturer_domain {
            let slots = match v.lecturer_slots.get(lecturer) {
                Some(slots) => slots,
                None => continue,
            };
            for &slot in slots {
                for room_id in &v.room_domain {
                    let room = match self.res.rooms.get(room_id) {
                        Some(r) => r,
                        None => continue,
                    };
                    let mut score = 0.0;

                    if is_lab {
                        score += if room.kind == crate::types::RoomKind::Lab {
                            -1000.0
                        } else {
                            1000.0
                        };
                    }

                    score += if room_matches_course(room, v, self.res) {
                        -200.0
                    } else {
                        50.0
                    };

                    score += 10.0 * self.ctx.slot_usage(slot) as f64;

                    if room.fits(v.group_size) {
                        score += 0.1 * (room.capacity - v.group_size) as f64;
                    } else {
                        score += 10_000.0;
                    }

                    if self.merge_opportunity(v, room_id, slot, room.capacity) {
                        score += -1000.0;
                    }

                    score += lecturer_demand.get(lecturer).copied().unwrap_or(0.0);
                    score += room_demand.get(room_id).copied().unwrap_or(0.0);

                    scored.push((score, slot, lecturer.clone(), room_id.clone()));
                }
            }
        }

        // Shuffle before the stable sort so equal scores come out in random
        // order, then keep only the most promising candidates
        scored.shuffle(&mut self.rng);
        scored.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        if scored.len() > self.config.candidate_cap {
            scored.truncate(self.config.candidate_cap);
        }
        scored.into_iter().map(|(_, s, l, r)| (s, l, r)).collect()
    }

    /// Placing here would merge into an already-seated canonical equivalent
    fn merge_opportunity(
        &self,
        v: &SchedulingVariable,
        room: &RoomId,
        slot: TimeSlot,
        capacity: u32,
    ) -> bool {
        let occupants = self.ctx.room_occupants(room, slot);
        if occupants.is_empty() {
            return false;
        }
        let candidate = self.assignment_for(v, slot, &LecturerId(String::new()), room);
        let all_excused = occupants
            .iter()
            .all(|occupant| self.ctx.is_excused_conflict(occupant, &candidate));
        if !all_excused {
            return false;
        }
        let mut total: u32 = self
            .ctx
            .room_programs(room, slot)
            .iter()
            .map(|p| self.res.group_size(p))
            .sum();
        total += v.group_size;
        total <= capacity
    }

    fn assignment_for(
        &self,
        v: &SchedulingVariable,
        slot: TimeSlot,
        lecturer: &LecturerId,
        room: &RoomId,
    ) -> Assignment {
        Assignment {
            variable_id: v.id.clone(),
            course_id: v.course_id.clone(),
            program_id: v.program_id.clone(),
            lecturer_id: lecturer.clone(),
            room_id: room.clone(),
            slot,
            term: self.term,
            session_number: v.session_number,
        }
    }

    /// Place the variable, then eagerly co-place every unassigned peer at the
    /// same slot. Any peer that cannot be seated rolls the whole move back.
    fn place_with_peers(
        &mut self,
        var_idx: usize,
        slot: TimeSlot,
        lecturer: &LecturerId,
        room: &RoomId,
    ) -> Option<Vec<VariableId>> {
        let variables = self.variables;
        let v = &variables[var_idx];
        let assignment = self.assignment_for(v, slot, lecturer, room);
        if self.checker.check_all(&assignment, &self.ctx).is_err() {
            return None;
        }
        self.ctx.add_assignment(&assignment);
        let mut placed = vec![assignment.variable_id.clone()];

        let peers: Vec<VariableId> = peers_of(self.pairs, &v.id).to_vec();
        for peer_id in peers {
            if self.ctx.assignment(&peer_id).is_some() {
                continue;
            }
            let peer_idx = match self.index_of.get(&peer_id) {
                Some(&idx) => idx,
                None => continue,
            };
            match self.place_peer_at(peer_idx, slot, room) {
                Some(vid) => placed.push(vid),
                None => {
                    for vid in placed.iter().rev() {
                        self.ctx.remove_assignment(vid);
                    }
                    return None;
                }
            }
        }
        Some(placed)
    }

    fn place_peer_at(
        &mut self,
        peer_idx: usize,
        slot: TimeSlot,
        preferred_room: &RoomId,
    ) -> Option<VariableId> {
        let variables = self.variables;
        let peer = &variables[peer_idx];

        // Canonical siblings merge cleanly into the same room, so try it first
        let mut rooms: Vec<&RoomId> = Vec::with_capacity(peer.room_domain.len());
        if peer.room_domain.contains(preferred_room) {
            rooms.push(preferred_room);
        }
        rooms.extend(peer.room_domain.iter().filter(|r| *r != preferred_room));

        for lecturer in &peer.lecturer_domain {
            let admits = peer
                .lecturer_slots
                .get(lecturer)
                .map(|slots| slots.contains(&slot))
                .unwrap_or(false);
            if !admits {
                continue;
            }
            for room in &rooms {
                let assignment = self.assignment_for(peer, slot, lecturer, room);
                if self.checker.check_all(&assignment, &self.ctx).is_ok() {
                    self.ctx.add_assignment(&assignment);
                    return Some(assignment.variable_id);
                }
            }
        }
        None
    }

    /// Cheap look-ahead: every unassigned variable touching the new
    /// placements must still have a workable (lecturer, slot) option
    fn forward_check(&self, placed: &[VariableId], unassigned: &[usize]) -> bool {
        let placed_assignments: Vec<&Assignment> = placed
            .iter()
            .filter_map(|vid| self.ctx.assignment(vid))
            .collect();

        for &idx in unassigned {
            let v = &self.variables[idx];
            let touched = placed_assignments.iter().any(|a| {
                a.program_id == v.program_id || v.lecturer_domain.contains(&a.lecturer_id)
            });
            if !touched {
                continue;
            }
            if !self.has_open_option(v) {
                return false;
            }
        }
        true
    }

    fn has_open_option(&self, v: &SchedulingVariable) -> bool {
        for lecturer in &v.lecturer_domain {
            let lect = match self.res.lecturers.get(lecturer) {
                Some(l) => l,
                None => continue,
            };
            if let Some(cap) = lect.weekly_hour_cap() {
                if self.ctx.weekly_hours(lecturer) + 2 > cap {
                    continue;
                }
            }
            let slots = match v.lecturer_slots.get(lecturer) {
                Some(slots) => slots,
                None => continue,
            };
            for &slot in slots {
                if self.ctx.daily_count(lecturer, slot.day) >= 2 {
                    continue;
                }
                if !self.ctx.lecturer_occupants(lecturer, slot).is_empty() {
                    continue;
                }
                let group_free = self
                    .ctx
                    .groups
                    .projections(&v.program_id)
                    .iter()
                    .all(|p| self.ctx.group_occupants(p, slot).is_empty());
                if group_free {
                    return true;
                }
            }
        }
        false
    }

    /// Why a variable stayed unplaced, for the run report
    fn diagnose(&self, v: &SchedulingVariable, assignments: &[Assignment]) -> String {
        if let Some(reason) = v.empty_domain_reason() {
            return reason;
        }

        let mut hours: HashMap<&LecturerId, u32> = HashMap::new();
        let mut daily: HashMap<(&LecturerId, crate::types::Weekday), u32> = HashMap::new();
        for a in assignments {
            *hours.entry(&a.lecturer_id).or_insert(0) += 2;
            *daily.entry((&a.lecturer_id, a.slot.day)).or_insert(0) += 1;
        }

        let mut blockers = Vec::new();
        for lecturer_id in &v.lecturer_domain {
            let lecturer = match self.res.lecturers.get(lecturer_id) {
                Some(l) => l,
                None => continue,
            };
            let used = hours.get(lecturer_id).copied().unwrap_or(0);
            if let Some(cap) = lecturer.weekly_hour_cap() {
                if used + 2 > cap {
                    blockers.push(format!("{} at weekly cap ({}h of {}h)", lecturer_id, used, cap));
                    continue;
                }
            }
            let admitted = v
                .lecturer_slots
                .get(lecturer_id)
                .map(|s| s.as_slice())
                .unwrap_or(&[]);
            let saturated = !admitted.is_empty()
                && admitted.iter().all(|slot| {
                    daily.get(&(lecturer_id, slot.day)).copied().unwrap_or(0) >= 2
                });
            if saturated {
                blockers.push(format!("{} at daily limits on every admitted day", lecturer_id));
            }
        }

        if !blockers.is_empty() && blockers.len() == v.lecturer_domain.len() {
            return format!("all qualified lecturers blocked: {}", blockers.join("; "));
        }
        if !blockers.is_empty() {
            return format!("lecturers constrained ({}); search budget exhausted", blockers.join("; "));
        }
        "search budget exhausted before placement".to_string()
    }
}

/// Room tag match against the course, via code, family or name
fn room_matches_course(
    room: &crate::types::Room,
    v: &SchedulingVariable,
    res: &ResourceIndex,
) -> bool {
    if room.specializations.is_empty() {
        return false;
    }
    let course = match res.courses.get(&v.course_id) {
        Some(c) => c,
        None => return false,
    };
    crate::canonical::matches_specialization(course, &room.specializations, &res.registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::CanonicalRegistry;
    use crate::scheduler::domains::build_domains;
    use crate::scheduler::merger::build_variables;
    use crate::scheduler::pairing::build_variable_pairs;
    use crate::planner::TermPlan;
    use crate::types::{
        Course, CourseId, Lecturer, LecturerRole, Program, ProgramId, Room, RoomKind,
        ScheduleInput, SchedulerConfig,
    };
    use rand::SeedableRng;
    use std::collections::BTreeMap;

    fn course(id: &str, hours: u32, kind: RoomKind) -> Course {
        Course {
            id: CourseId(id.to_string()),
            code: id.to_string(),
            name: format!("{} course", id),
            weekly_hours: hours,
            credits: 4,
            preferred_room_kind: kind,
            course_group: None,
            preferred_term: None,
            foundational: false,
            prerequisites: vec![],
        }
    }

    fn room(id: &str, kind: RoomKind, capacity: u32) -> Room {
        Room {
            id: RoomId(id.to_string()),
            name: id.to_string(),
            capacity,
            kind,
            specializations: vec![],
            available: true,
            building: String::new(),
            campus: String::new(),
        }
    }

    fn lecturer(id: &str, specs: &[&str]) -> Lecturer {
        Lecturer {
            id: LecturerId(id.to_string()),
            name: id.to_string(),
            role: LecturerRole::FullTime,
            faculty: String::new(),
            specializations: specs.iter().map(|s| s.to_string()).collect(),
            availability: BTreeMap::new(),
        }
    }

    fn program(id: &str, size: u32, course_ids: &[&str]) -> Program {
        Program {
            id: ProgramId(id.to_string()),
            code: id.to_string(),
            batch: "2024".to_string(),
            semester: 1,
            size,
            courses: course_ids.iter().map(|c| CourseId(c.to_string())).collect(),
        }
    }

    fn solve(input: &ScheduleInput) -> CspOutcome {
        let mut plan = TermPlan::default();
        for p in &input.programs {
            for c in &p.courses {
                plan.set_term(&p.id, c, Term::One);
            }
        }
        let mut set = build_variables(
            &input.programs,
            &input.courses,
            &input.registry,
            &plan,
            Term::One,
        );
        build_domains(
            &mut set,
            &input.lecturers,
            &input.rooms,
            &input.courses,
            &input.registry,
            &input.config.catalogue,
        );
        let pairs = build_variable_pairs(&set.variables, &input.courses, &input.registry);
        let res = ResourceIndex::build(input, &set.merged_programs);

        let solver = CspSolver::new(
            &res,
            &set.variables,
            &pairs,
            &set.groups,
            ConstraintChecker::new(input.config.allow_consecutive_lab_sessions),
            &input.config.csp,
            Term::One,
            ChaCha8Rng::seed_from_u64(7),
            CancelToken::new(),
        );
        solver.solve()
    }

    #[test]
    fn test_trivial_instance_solves_completely() {
        let input = ScheduleInput {
            lecturers: vec![lecturer("l1", &["C1"])],
            rooms: vec![room("r1", RoomKind::Theory, 30)],
            courses: vec![course("C1", 2, RoomKind::Theory)],
            programs: vec![program("p1", 20, &["C1"])],
            registry: CanonicalRegistry::default(),
            config: SchedulerConfig::default(),
        };
        let outcome = solve(&input);
        assert!(outcome.complete);
        assert_eq!(outcome.assignments.len(), 1);
    }

    #[test]
    fn test_paired_sessions_share_slot() {
        let mut theory = course("TH", 2, RoomKind::Theory);
        theory.course_group = Some("PC".to_string());
        let mut practical = course("PR", 2, RoomKind::Lab);
        practical.course_group = Some("PC".to_string());

        let input = ScheduleInput {
            lecturers: vec![lecturer("l1", &["TH"]), lecturer("l2", &["PR"])],
            rooms: vec![room("r1", RoomKind::Theory, 40), room("lab", RoomKind::Lab, 40)],
            courses: vec![theory, practical],
            programs: vec![program("p1", 30, &["TH", "PR"])],
            registry: CanonicalRegistry::default(),
            config: SchedulerConfig::default(),
        };
        let outcome = solve(&input);
        assert!(outcome.complete);
        assert_eq!(outcome.assignments.len(), 2);
        assert_eq!(outcome.assignments[0].slot, outcome.assignments[1].slot);
    }

    #[test]
    fn test_overloaded_lecturer_yields_best_partial() {
        // Six 2-session courses against one lecturer: daily and weekly caps
        // make 12 placements impossible
        let courses: Vec<Course> = (0..6)
            .map(|i| course(&format!("C{i}"), 4, RoomKind::Theory))
            .collect();
        let codes: Vec<String> = courses.iter().map(|c| c.code.clone()).collect();
        let code_refs: Vec<&str> = codes.iter().map(|s| s.as_str()).collect();

        let input = ScheduleInput {
            lecturers: vec![lecturer(
                "only",
                &codes.iter().map(|s| s.as_str()).collect::<Vec<_>>(),
            )],
            rooms: vec![room("r1", RoomKind::Theory, 40), room("r2", RoomKind::Theory, 40)],
            courses,
            programs: vec![program("p1", 30, &code_refs)],
            registry: CanonicalRegistry::default(),
            config: SchedulerConfig::default(),
        };
        let outcome = solve(&input);

        assert!(!outcome.complete);
        assert!(!outcome.unassigned.is_empty());
        assert!(outcome.assignments.len() <= 10);
        for u in &outcome.unassigned {
            assert!(u.reason.contains("only"), "reason was: {}", u.reason);
        }
    }

    #[test]
    fn test_empty_domain_is_diagnosed_not_fatal() {
        let input = ScheduleInput {
            lecturers: vec![lecturer("l1", &["OTHER"])],
            rooms: vec![room("r1", RoomKind::Theory, 30)],
            courses: vec![course("C1", 2, RoomKind::Theory)],
            programs: vec![program("p1", 20, &["C1"])],
            registry: CanonicalRegistry::default(),
            config: SchedulerConfig::default(),
        };
        let outcome = solve(&input);
        assert!(!outcome.complete);
        assert_eq!(outcome.unassigned.len(), 1);
        assert!(outcome.unassigned[0].reason.contains("lecturer"));
    }

    #[test]
    fn test_zero_timeout_returns_quickly() {
        let mut config = SchedulerConfig::default();
        config.csp.timeout_secs = 0;

        let courses: Vec<Course> = (0..4)
            .map(|i| course(&format!("C{i}"), 4, RoomKind::Theory))
            .collect();
        let codes: Vec<String> = courses.iter().map(|c| c.code.clone()).collect();
        let code_refs: Vec<&str> = codes.iter().map(|s| s.as_str()).collect();

        let input = ScheduleInput {
            lecturers: vec![
                lecturer("l1", &codes.iter().map(|s| s.as_str()).collect::<Vec<_>>()),
            ],
            rooms: vec![room("r1", RoomKind::Theory, 40)],
            courses,
            programs: vec![program("p1", 50, &code_refs)],
            registry: CanonicalRegistry::default(),
            config,
        };
        let outcome = solve(&input);
        // Capacity makes this unsolvable; the zero budget must not hang
        assert!(!outcome.complete);
    }
}
