//! Persistence boundary for sections, teachers and timetable entries.
//!
//! The traits describe what the scheduling core needs from storage. The
//! uniqueness of `(teacher, day, period)` and `(section, day, period)` among
//! active entries is enforced here, at write time, as the last defence
//! against two requests racing on the same slots.

use rustc_hash::{FxHashMap, FxHashSet};
use thiserror::Error;

use crate::error::ScheduleError;
use crate::models::{Section, Slot, Teacher, TimeTableEntry};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Teacher {teacher_id} already has an entry at {slot}")]
    TeacherSlotTaken { teacher_id: String, slot: Slot },
    #[error("Section {section_id} already has an entry at {slot}")]
    SectionSlotTaken { section_id: String, slot: Slot },
    #[error("Entry not found: {0}")]
    EntryNotFound(u64),
    #[error("Section not found: {0}")]
    SectionNotFound(String),
    #[error("Requirement for subject {subject_id} violates weekly period bounds: {weekly_periods}")]
    CheckViolation {
        subject_id: String,
        weekly_periods: u8,
    },
}

impl From<RepositoryError> for ScheduleError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::EntryNotFound(id) => ScheduleError::EntryNotFound(id),
            RepositoryError::SectionNotFound(id) => ScheduleError::InvalidSection(id),
            RepositoryError::CheckViolation {
                subject_id,
                weekly_periods,
            } => ScheduleError::InvalidRequirement {
                subject_id,
                weekly_periods,
            },
            other => ScheduleError::ConcurrentScheduleConflict(other.to_string()),
        }
    }
}

/// Existence lookups used by the rule chain.
pub trait ReferenceLookup {
    fn get_section(&self, section_id: &str) -> Option<Section>;
    fn get_teacher(&self, teacher_id: &str) -> Option<Teacher>;
}

/// Timetable entry storage. Deletes are soft; reads return active entries only.
pub trait TimeTableRepository {
    fn get_entry(&self, id: u64) -> Option<TimeTableEntry>;
    fn get_entries_for_section(&self, section_id: &str) -> Vec<TimeTableEntry>;
    fn get_entries_for_teacher_across_sections(&self, teacher_id: &str) -> Vec<TimeTableEntry>;
    /// Every active entry in the school; the input for conflict indexes.
    fn get_active_entries(&self) -> Vec<TimeTableEntry>;

    /// Replace a section's timetable: soft-delete its active entries, insert
    /// `entries`, and record `periods_per_day` as the section's day length so
    /// later manual edits are checked against the shape the timetable was
    /// generated for. All-or-nothing.
    fn save_entries(
        &mut self,
        section_id: &str,
        periods_per_day: u8,
        entries: Vec<TimeTableEntry>,
    ) -> Result<Vec<TimeTableEntry>, RepositoryError>;

    fn insert_entry(&mut self, entry: TimeTableEntry) -> Result<TimeTableEntry, RepositoryError>;

    /// Replace the active entry `id` with `entry`, keeping the id. All-or-nothing.
    fn replace_entry(
        &mut self,
        id: u64,
        entry: TimeTableEntry,
    ) -> Result<TimeTableEntry, RepositoryError>;

    fn soft_delete_entry(&mut self, id: u64) -> Result<(), RepositoryError>;
}

/// In-memory store implementing both repository traits.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    sections: FxHashMap<String, Section>,
    teachers: FxHashMap<String, Teacher>,
    /// All entries ever written, including soft-deleted ones, in insertion order.
    entries: Vec<TimeTableEntry>,
    next_id: u64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a section with its requirements, enforcing the weekly period bounds.
    pub fn add_section(&mut self, section: Section) -> Result<(), RepositoryError> {
        if let Some(bad) = section
            .requirements
            .iter()
            .find(|r| !r.has_valid_weekly_periods())
        {
            return Err(RepositoryError::CheckViolation {
                subject_id: bad.subject_id.clone(),
                weekly_periods: bad.weekly_periods,
            });
        }
        self.sections.insert(section.id.clone(), section);
        Ok(())
    }

    pub fn add_teacher(&mut self, teacher: Teacher) {
        self.teachers.insert(teacher.id.clone(), teacher);
    }

    /// Number of stored entries, soft-deleted ones included.
    pub fn stored_entry_count(&self) -> usize {
        self.entries.len()
    }

    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// Check `candidates` against active entries that survive the write
    /// (those not matched by `replaced`) and against each other.
    fn check_unique<'a>(
        &self,
        candidates: impl IntoIterator<Item = &'a TimeTableEntry>,
        replaced: impl Fn(&TimeTableEntry) -> bool,
    ) -> Result<(), RepositoryError> {
        let mut teacher_slots: FxHashSet<(&str, Slot)> = FxHashSet::default();
        let mut section_slots: FxHashSet<(&str, Slot)> = FxHashSet::default();

        for entry in self.entries.iter().filter(|e| e.is_active() && !replaced(*e)) {
            teacher_slots.insert((entry.teacher_id.as_str(), entry.slot()));
            section_slots.insert((entry.section_id.as_str(), entry.slot()));
        }

        for entry in candidates {
            if !teacher_slots.insert((entry.teacher_id.as_str(), entry.slot())) {
                return Err(RepositoryError::TeacherSlotTaken {
                    teacher_id: entry.teacher_id.clone(),
                    slot: entry.slot(),
                });
            }
            if !section_slots.insert((entry.section_id.as_str(), entry.slot())) {
                return Err(RepositoryError::SectionSlotTaken {
                    section_id: entry.section_id.clone(),
                    slot: entry.slot(),
                });
            }
        }
        Ok(())
    }
}

impl ReferenceLookup for InMemoryStore {
    fn get_section(&self, section_id: &str) -> Option<Section> {
        self.sections.get(section_id).cloned()
    }

    fn get_teacher(&self, teacher_id: &str) -> Option<Teacher> {
        self.teachers.get(teacher_id).cloned()
    }
}

impl TimeTableRepository for InMemoryStore {
    fn get_entry(&self, id: u64) -> Option<TimeTableEntry> {
        self.entries
            .iter()
            .find(|e| e.id == Some(id) && e.is_active())
            .cloned()
    }

    fn get_entries_for_section(&self, section_id: &str) -> Vec<TimeTableEntry> {
        self.entries
            .iter()
            .filter(|e| e.is_active() && e.section_id == section_id)
            .cloned()
            .collect()
    }

    fn get_entries_for_teacher_across_sections(&self, teacher_id: &str) -> Vec<TimeTableEntry> {
        self.entries
            .iter()
            .filter(|e| e.is_active() && e.teacher_id == teacher_id)
            .cloned()
            .collect()
    }

    fn get_active_entries(&self) -> Vec<TimeTableEntry> {
        self.entries.iter().filter(|e| e.is_active()).cloned().collect()
    }

    fn save_entries(
        &mut self,
        section_id: &str,
        periods_per_day: u8,
        entries: Vec<TimeTableEntry>,
    ) -> Result<Vec<TimeTableEntry>, RepositoryError> {
        if !self.sections.contains_key(section_id) {
            return Err(RepositoryError::SectionNotFound(section_id.to_string()));
        }
        self.check_unique(&entries, |e| e.section_id == section_id)?;

        if let Some(section) = self.sections.get_mut(section_id) {
            section.periods_per_day = Some(periods_per_day);
        }

        for existing in self
            .entries
            .iter_mut()
            .filter(|e| e.is_active() && e.section_id == section_id)
        {
            existing.is_deleted = true;
        }

        let mut saved = Vec::with_capacity(entries.len());
        for mut entry in entries {
            entry.id = Some(self.allocate_id());
            entry.is_deleted = false;
            self.entries.push(entry.clone());
            saved.push(entry);
        }
        Ok(saved)
    }

    fn insert_entry(
        &mut self,
        mut entry: TimeTableEntry,
    ) -> Result<TimeTableEntry, RepositoryError> {
        self.check_unique(std::iter::once(&entry), |_| false)?;
        entry.id = Some(self.allocate_id());
        entry.is_deleted = false;
        self.entries.push(entry.clone());
        Ok(entry)
    }

    fn replace_entry(
        &mut self,
        id: u64,
        mut entry: TimeTableEntry,
    ) -> Result<TimeTableEntry, RepositoryError> {
        entry.id = Some(id);
        entry.is_deleted = false;
        let position = self
            .entries
            .iter()
            .position(|e| e.id == Some(id) && e.is_active())
            .ok_or(RepositoryError::EntryNotFound(id))?;

        self.check_unique(std::iter::once(&entry), |e| e.id == Some(id))?;
        self.entries[position] = entry.clone();
        Ok(entry)
    }

    fn soft_delete_entry(&mut self, id: u64) -> Result<(), RepositoryError> {
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.id == Some(id) && e.is_active())
            .ok_or(RepositoryError::EntryNotFound(id))?;
        entry.is_deleted = true;
        Ok(())
    }
}
