//! Command and query handlers for timetables.
//!
//! Each handler rebuilds its conflict index from whatever the repository
//! holds at call time, runs the rule chain or the generator against that
//! snapshot, and only then writes. Writes go through the repository's
//! uniqueness checks, so a race with another request surfaces as
//! `ConcurrentScheduleConflict` instead of a double booking.

use chrono::{Duration, NaiveTime};

use crate::academic::{AcademicConfig, AcademicConfigInput};
use crate::config::GeneratorConfig;
use crate::error::ScheduleError;
use crate::{log_changes, log_checks};
use crate::models::{TimeTableEntry, TimetableResult};
use crate::repository::{ReferenceLookup, TimeTableRepository};
use crate::scheduler::{
    ConflictIndex, RuleContext, SlotAvailabilityValidator, SlotRequest, TimetableGenerator,
};

/// Shortest entry a manual edit may create.
pub const MIN_ENTRY_MINUTES: i64 = 30;

#[derive(Clone, Debug)]
pub struct GenerateTimeTableCommand {
    pub section_id: String,
    pub config: AcademicConfigInput,
}

#[derive(Clone, Debug)]
pub struct CheckSlotAvailabilityQuery {
    pub section_id: String,
    pub teacher_id: String,
    pub room_number: String,
    pub day_of_week: i32,
    pub period_number: i32,
}

#[derive(Clone, Debug)]
pub struct CreateTimeTableEntryCommand {
    pub section_id: String,
    pub subject_id: String,
    pub teacher_id: String,
    pub day_of_week: i32,
    pub period_number: i32,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub room_number: String,
}

/// Replaces subject, teacher, times and room of an entry; its slot is kept.
#[derive(Clone, Debug)]
pub struct UpdateTimeTableEntryCommand {
    pub id: u64,
    pub subject_id: String,
    pub teacher_id: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub room_number: String,
}

#[derive(Clone, Copy, Debug)]
pub struct DeleteTimeTableEntryCommand {
    pub id: u64,
}

#[derive(Clone, Debug)]
pub struct GetTeacherTimeTableQuery {
    pub teacher_id: String,
}

/// `start < end` and at least [`MIN_ENTRY_MINUTES`] long. `NaiveTime` cannot
/// go past midnight, so the end never exceeds 24:00.
pub fn check_time_range(start: NaiveTime, end: NaiveTime) -> Result<(), ScheduleError> {
    if start >= end {
        return Err(ScheduleError::InvalidTimeRange(format!(
            "start {} must be before end {}",
            start.format("%H:%M"),
            end.format("%H:%M")
        )));
    }
    if end - start < Duration::minutes(MIN_ENTRY_MINUTES) {
        return Err(ScheduleError::InvalidTimeRange(format!(
            "entry must last at least {} minutes, got {}",
            MIN_ENTRY_MINUTES,
            (end - start).num_minutes()
        )));
    }
    Ok(())
}

/// Timetable operations over a repository.
pub struct TimetableService<R> {
    repo: R,
    config: GeneratorConfig,
    validator: SlotAvailabilityValidator,
}

impl<R> TimetableService<R>
where
    R: ReferenceLookup + TimeTableRepository,
{
    pub fn new(repo: R, config: GeneratorConfig) -> Self {
        Self {
            repo,
            config,
            validator: SlotAvailabilityValidator::default(),
        }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Generate and persist a full timetable for a section, replacing its
    /// previous entries. Nothing is written unless every requirement fits.
    pub fn generate(
        &mut self,
        cmd: &GenerateTimeTableCommand,
    ) -> Result<TimetableResult, ScheduleError> {
        let academic = AcademicConfig::validate(&cmd.config)?;
        let section = self
            .repo
            .get_section(&cmd.section_id)
            .ok_or_else(|| ScheduleError::InvalidSection(cmd.section_id.clone()))?;

        let existing = self.repo.get_active_entries();
        let result = TimetableGenerator::new(&academic, &self.config, &self.repo).generate(
            &section.id,
            &section.default_room,
            &section.requirements,
            &existing,
        )?;

        let periods_per_day = academic.periods_per_day();
        let saved = self
            .repo
            .save_entries(&section.id, periods_per_day, result.entries)?;
        log_changes!(
            self.config.verbosity,
            "Saved {} entries for section {} ({} periods per day)",
            saved.len(),
            section.id,
            periods_per_day
        );

        Ok(TimetableResult {
            entries: saved,
            metadata: result.metadata,
        })
    }

    pub fn check_slot_availability(
        &self,
        query: &CheckSlotAvailabilityQuery,
    ) -> Result<(), ScheduleError> {
        let request = SlotRequest {
            section_id: query.section_id.clone(),
            teacher_id: query.teacher_id.clone(),
            room_number: query.room_number.clone(),
            day_of_week: query.day_of_week,
            period_number: query.period_number,
        };
        let entries = self.repo.get_active_entries();
        self.validate(&request, &ConflictIndex::build(&entries))
    }

    pub fn create_entry(
        &mut self,
        cmd: &CreateTimeTableEntryCommand,
    ) -> Result<TimeTableEntry, ScheduleError> {
        check_time_range(cmd.start_time, cmd.end_time)?;

        let request = SlotRequest {
            section_id: cmd.section_id.clone(),
            teacher_id: cmd.teacher_id.clone(),
            room_number: cmd.room_number.clone(),
            day_of_week: cmd.day_of_week,
            period_number: cmd.period_number,
        };
        let entries = self.repo.get_active_entries();
        self.validate(&request, &ConflictIndex::build(&entries))?;

        let slot = request
            .slot()
            .ok_or(ScheduleError::InvalidDayOfWeek(cmd.day_of_week))?;
        let entry = TimeTableEntry::new(
            cmd.section_id.clone(),
            cmd.subject_id.clone(),
            cmd.teacher_id.clone(),
            slot.day,
            slot.period,
            cmd.start_time,
            cmd.end_time,
            cmd.room_number.trim().to_string(),
            None,
        );
        let saved = self.repo.insert_entry(entry)?;
        log_changes!(
            self.config.verbosity,
            "Created entry {:?} for section {} at {}",
            saved.id,
            saved.section_id,
            saved.slot()
        );
        Ok(saved)
    }

    /// Re-validate an edited entry at its own slot, ignoring the entry itself,
    /// then replace it.
    pub fn update_entry(
        &mut self,
        cmd: &UpdateTimeTableEntryCommand,
    ) -> Result<TimeTableEntry, ScheduleError> {
        let existing = self
            .repo
            .get_entry(cmd.id)
            .ok_or(ScheduleError::EntryNotFound(cmd.id))?;
        check_time_range(cmd.start_time, cmd.end_time)?;

        let request = SlotRequest::for_slot(
            &existing.section_id,
            &cmd.teacher_id,
            &cmd.room_number,
            existing.slot(),
        );
        let entries = self.repo.get_active_entries();
        self.validate(&request, &ConflictIndex::build_excluding(&entries, cmd.id))?;

        let updated = TimeTableEntry {
            subject_id: cmd.subject_id.clone(),
            teacher_id: cmd.teacher_id.clone(),
            start_time: cmd.start_time,
            end_time: cmd.end_time,
            room_number: cmd.room_number.trim().to_string(),
            ..existing
        };
        let saved = self.repo.replace_entry(cmd.id, updated)?;
        log_changes!(
            self.config.verbosity,
            "Updated entry {} at {}",
            cmd.id,
            saved.slot()
        );
        Ok(saved)
    }

    pub fn delete_entry(&mut self, cmd: DeleteTimeTableEntryCommand) -> Result<(), ScheduleError> {
        self.repo.soft_delete_entry(cmd.id)?;
        log_changes!(self.config.verbosity, "Deleted entry {}", cmd.id);
        Ok(())
    }

    /// A teacher's week across all sections, ordered by slot.
    pub fn teacher_timetable(
        &self,
        query: &GetTeacherTimeTableQuery,
    ) -> Result<Vec<TimeTableEntry>, ScheduleError> {
        if self.repo.get_teacher(&query.teacher_id).is_none() {
            return Err(ScheduleError::TeacherNotFound(query.teacher_id.clone()));
        }
        let mut entries = self
            .repo
            .get_entries_for_teacher_across_sections(&query.teacher_id);
        entries.sort_by(|a, b| {
            a.slot()
                .cmp(&b.slot())
                .then_with(|| a.section_id.cmp(&b.section_id))
        });
        Ok(entries)
    }

    /// Run the rule chain with the day length the section was last generated for.
    fn validate(&self, request: &SlotRequest, index: &ConflictIndex) -> Result<(), ScheduleError> {
        let periods_per_day = self
            .repo
            .get_section(&request.section_id)
            .and_then(|s| s.periods_per_day);
        let ctx = RuleContext {
            lookup: &self.repo,
            index,
            periods_per_day,
        };
        match self.validator.first_failure(request, &ctx) {
            Some((rule, err)) => {
                log_checks!(self.config.verbosity, "Slot request rejected by {}: {}", rule, err);
                Err(err)
            }
            None => Ok(()),
        }
    }
}
