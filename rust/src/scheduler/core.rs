//! Timetable generator: greedy placement with bounded backtracking.
//!
//! Tasks are placed in work-list order, each taking the first candidate slot
//! the rule chain accepts. A task that runs out of candidates jumps back to
//! the most recent placement that blocked one of them, and that placement
//! moves on to its next candidate. Occurrences of one requirement are
//! interchangeable, so they are kept in ascending slot order and a retry
//! never revisits a permutation of slots already tried.

use std::collections::HashMap;

use rustc_hash::FxHashSet;

use crate::academic::AcademicConfig;
use crate::config::GeneratorConfig;
use crate::error::ScheduleError;
use crate::models::{Slot, SubjectRequirement, TimeTableEntry, TimetableResult};
use crate::repository::ReferenceLookup;
use crate::sorting::{build_work_list, PlacementTask};
use crate::{log_changes, log_checks, log_debug};

use super::conflict_index::ConflictIndex;
use super::rules::{RuleContext, SlotAvailabilityValidator, SlotRequest};
use super::state::{Placement, PlacementState};

/// Builds a full week of entries for one section.
pub struct TimetableGenerator<'a> {
    academic: &'a AcademicConfig,
    config: &'a GeneratorConfig,
    lookup: &'a dyn ReferenceLookup,
    validator: SlotAvailabilityValidator,
}

/// Per-run inputs that do not change while placing.
struct Run<'r> {
    section_id: &'r str,
    default_room: &'r str,
    requirements: &'r [SubjectRequirement],
    universe: Vec<Slot>,
    /// Per requirement: most periods to place on one day in the spread pass
    day_caps: Vec<u8>,
}

/// Search bookkeeping for one work-list position.
///
/// Reset whenever the position is reached going forward; kept when the
/// search jumps back to it.
#[derive(Clone, Debug, Default)]
struct Frame {
    /// How many of the position's candidates have been tried
    tried: usize,
    /// Stack depths of placements that ruled out a candidate
    culprits: FxHashSet<usize>,
}

impl<'a> TimetableGenerator<'a> {
    pub fn new(
        academic: &'a AcademicConfig,
        config: &'a GeneratorConfig,
        lookup: &'a dyn ReferenceLookup,
    ) -> Self {
        Self {
            academic,
            config,
            lookup,
            validator: SlotAvailabilityValidator::default(),
        }
    }

    /// Generate entries for `section_id`.
    ///
    /// `existing` may contain entries of any section; the section's own
    /// entries are ignored because the result replaces them. Either every
    /// requirement is placed in full or an error is returned; partial
    /// timetables are never produced.
    ///
    /// Weekly period counts above the storage bound are accepted here and
    /// fail as `Infeasible` once they exceed the slot universe.
    pub fn generate(
        &self,
        section_id: &str,
        default_room: &str,
        requirements: &[SubjectRequirement],
        existing: &[TimeTableEntry],
    ) -> Result<TimetableResult, ScheduleError> {
        let verbosity = self.config.verbosity;

        if let Some(req) = requirements.iter().find(|r| r.weekly_periods == 0) {
            return Err(ScheduleError::InvalidRequirement {
                subject_id: req.subject_id.clone(),
                weekly_periods: req.weekly_periods,
            });
        }

        let run = Run {
            section_id,
            default_room,
            requirements,
            universe: self.academic.slot_universe(),
            day_caps: self.day_caps(requirements),
        };

        let index = ConflictIndex::build(existing.iter().filter(|e| e.section_id != section_id));
        let tasks = build_work_list(requirements);
        let budget = self.config.backtrack_budget(run.universe.len());

        log_debug!(
            verbosity,
            "Generating section {}: {} tasks, {} slots, backtrack budget {}, rules {:?}",
            section_id,
            tasks.len(),
            run.universe.len(),
            budget,
            self.validator.rule_names()
        );

        if tasks.len() > run.universe.len() {
            log_changes!(
                verbosity,
                "{} periods requested but section {} has only {} slots",
                tasks.len(),
                section_id,
                run.universe.len()
            );
            return Err(self.infeasible(&run, &tasks, run.universe.len()));
        }

        let mut state = PlacementState::new(index);
        let mut frames = vec![Frame::default(); tasks.len()];
        let mut backtracks = 0usize;
        let mut deepest_failure = 0usize;
        let mut position = 0usize;

        while position < tasks.len() {
            let task = tasks[position];
            let placed = self.place_next(&run, task, position, &state, &mut frames[position])?;

            if let Some(universe_index) = placed {
                let entry = self.make_entry(&run, task, run.universe[universe_index]);
                log_changes!(
                    verbosity,
                    "Placed {} ({}) at {} in room {}",
                    entry.subject_id,
                    entry.teacher_id,
                    entry.slot(),
                    entry.room_number
                );
                state.commit(Placement {
                    task_position: position,
                    requirement: task.requirement,
                    universe_index,
                    entry,
                });
                position += 1;
                if position < tasks.len() {
                    frames[position] = Frame::default();
                }
                continue;
            }

            deepest_failure = deepest_failure.max(position);
            let blocked_subject = &requirements[task.requirement].subject_id;
            let failed = std::mem::take(&mut frames[position]);

            let Some(target) = failed.culprits.iter().copied().max() else {
                log_changes!(
                    verbosity,
                    "No placement left to revise for {}",
                    blocked_subject
                );
                return Err(self.infeasible(&run, &tasks, deepest_failure));
            };
            if backtracks >= budget {
                log_changes!(verbosity, "Backtrack budget of {} exhausted", budget);
                return Err(self.infeasible(&run, &tasks, deepest_failure));
            }

            backtracks += 1;
            frames[target]
                .culprits
                .extend(failed.culprits.into_iter().filter(|&depth| depth != target));
            let undone = state.rollback_to(target);
            if let Some(revised) = undone.last() {
                log_changes!(
                    verbosity,
                    "Backtrack {}/{}: {} blocked, moving {} off {} ({} placements undone)",
                    backtracks,
                    budget,
                    blocked_subject,
                    revised.entry.subject_id,
                    revised.entry.slot(),
                    undone.len()
                );
            }
            position = target;
        }

        let placements = state.len();
        let entries = state.into_entries();

        let mut metadata = HashMap::new();
        metadata.insert("algorithm".to_string(), "greedy_backtracking".to_string());
        metadata.insert("placements".to_string(), placements.to_string());
        metadata.insert("backtracks".to_string(), backtracks.to_string());
        metadata.insert("universe_size".to_string(), run.universe.len().to_string());

        log_changes!(
            verbosity,
            "Generated {} entries for section {} with {} backtracks",
            entries.len(),
            section_id,
            backtracks
        );

        Ok(TimetableResult { entries, metadata })
    }

    fn day_caps(&self, requirements: &[SubjectRequirement]) -> Vec<u8> {
        let days = self.academic.working_days().len().max(1) as u8;
        requirements
            .iter()
            .map(|r| r.weekly_periods.div_ceil(days))
            .collect()
    }

    /// Try the task's remaining candidates in order; the first one the rule
    /// chain accepts wins.
    ///
    /// A slot conflict just means "try the next slot" and records the
    /// placement that caused it, if it belongs to this run. Any other rule
    /// failure aborts the run.
    fn place_next(
        &self,
        run: &Run<'_>,
        task: PlacementTask,
        position: usize,
        state: &PlacementState,
        frame: &mut Frame,
    ) -> Result<Option<usize>, ScheduleError> {
        let req = &run.requirements[task.requirement];
        let room = self.room_for(run, req);
        let ctx = RuleContext {
            lookup: self.lookup,
            index: state.index(),
            periods_per_day: Some(self.academic.periods_per_day()),
        };

        // Occurrences are adjacent in the work list, so the previous one
        // sits directly below on the stack.
        let mut start = 0;
        if task.occurrence > 0 {
            let depth = position.saturating_sub(1);
            if let Some(prev) = state.placements().get(depth) {
                start = prev.universe_index + 1;
                frame.culprits.insert(depth);
            }
        }

        let candidates = self.candidate_order(run, task, start, state);
        while let Some(&universe_index) = candidates.get(frame.tried) {
            frame.tried += 1;
            let slot = run.universe[universe_index];
            let request = SlotRequest::for_slot(run.section_id, &req.teacher_id, room, slot);
            match self.validator.validate(&request, &ctx) {
                Ok(()) => return Ok(Some(universe_index)),
                Err(ScheduleError::SlotConflict { resource, .. }) => {
                    log_checks!(
                        self.config.verbosity,
                        "{} at {}: {} busy",
                        req.subject_id,
                        slot,
                        resource
                    );
                    if let Some(depth) = state.holder_of(&resource, slot) {
                        frame.culprits.insert(depth);
                    }
                }
                Err(e) => return Err(e),
            }
        }
        Ok(None)
    }

    /// Universe indices from `start` on, in the order they are tried.
    ///
    /// With daily spread on, slots on days where the requirement already
    /// holds its cap come after all others.
    fn candidate_order(
        &self,
        run: &Run<'_>,
        task: PlacementTask,
        start: usize,
        state: &PlacementState,
    ) -> Vec<usize> {
        let cap = run.day_caps[task.requirement];
        let range = start..run.universe.len();
        if !self.config.spread_across_days || cap >= self.academic.periods_per_day() {
            return range.collect();
        }

        let (under_cap, at_cap): (Vec<usize>, Vec<usize>) = range
            .partition(|&i| state.day_count(task.requirement, run.universe[i].day) < cap);
        under_cap.into_iter().chain(at_cap).collect()
    }

    fn room_for<'r>(&self, run: &Run<'r>, req: &'r SubjectRequirement) -> &'r str {
        req.room_number.as_deref().unwrap_or(run.default_room)
    }

    fn make_entry(&self, run: &Run<'_>, task: PlacementTask, slot: Slot) -> TimeTableEntry {
        let req = &run.requirements[task.requirement];
        let (start_time, end_time) = self.academic.period_window(slot.period);
        TimeTableEntry::new(
            run.section_id.to_string(),
            req.subject_id.clone(),
            req.teacher_id.clone(),
            slot.day,
            slot.period,
            start_time,
            end_time,
            self.room_for(run, req).to_string(),
            None,
        )
    }

    fn infeasible(&self, run: &Run<'_>, tasks: &[PlacementTask], position: usize) -> ScheduleError {
        let req = &run.requirements[tasks[position].requirement];
        ScheduleError::Infeasible {
            subject_id: req.subject_id.clone(),
            teacher_id: req.teacher_id.clone(),
            weekly_periods: req.weekly_periods,
        }
    }
}
