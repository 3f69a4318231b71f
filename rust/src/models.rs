//! Core data types for timetable generation and slot validation.

use chrono::NaiveTime;
use pyo3::prelude::*;
use std::collections::HashMap;
use std::fmt;

// Note: We use std HashMap here for PyO3 interface compatibility

/// Day of the week, numbered Sunday=0 through Saturday=6.
#[pyclass(eq, eq_int)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DayOfWeek {
    Sunday = 0,
    Monday = 1,
    Tuesday = 2,
    Wednesday = 3,
    Thursday = 4,
    Friday = 5,
    Saturday = 6,
}

impl DayOfWeek {
    /// Parse a raw day number. Returns `None` for anything outside 0..=6.
    pub fn from_number(number: i32) -> Option<Self> {
        match number {
            0 => Some(Self::Sunday),
            1 => Some(Self::Monday),
            2 => Some(Self::Tuesday),
            3 => Some(Self::Wednesday),
            4 => Some(Self::Thursday),
            5 => Some(Self::Friday),
            6 => Some(Self::Saturday),
            _ => None,
        }
    }

    pub fn number(self) -> i32 {
        self as i32
    }

    /// Whether timetable entries may be placed on this day.
    pub fn is_school_day(self) -> bool {
        self != Self::Sunday
    }

    pub fn short_name(self) -> &'static str {
        match self {
            Self::Sunday => "Sun",
            Self::Monday => "Mon",
            Self::Tuesday => "Tue",
            Self::Wednesday => "Wed",
            Self::Thursday => "Thu",
            Self::Friday => "Fri",
            Self::Saturday => "Sat",
        }
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// A `(day, period)` coordinate within a section's week.
///
/// Ordered by day then period, which is the canonical scan order when
/// working days are configured Monday-first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Slot {
    pub day: DayOfWeek,
    pub period: u8,
}

impl Slot {
    pub fn new(day: DayOfWeek, period: u8) -> Self {
        Self { day, period }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} P{}", self.day, self.period)
    }
}

/// Upper bound on weekly periods a stored requirement may ask for.
pub const MAX_WEEKLY_PERIODS: u8 = 20;

/// How many periods per week a subject/teacher pair needs in a section.
#[pyclass]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubjectRequirement {
    #[pyo3(get, set)]
    pub subject_id: String,
    #[pyo3(get, set)]
    pub teacher_id: String,
    #[pyo3(get, set)]
    pub weekly_periods: u8,
    /// Room to use instead of the section's default room.
    #[pyo3(get, set)]
    pub room_number: Option<String>,
}

#[pymethods]
impl SubjectRequirement {
    #[new]
    #[pyo3(signature = (subject_id, teacher_id, weekly_periods, room_number=None))]
    pub fn new(
        subject_id: String,
        teacher_id: String,
        weekly_periods: u8,
        room_number: Option<String>,
    ) -> Self {
        Self {
            subject_id,
            teacher_id,
            weekly_periods,
            room_number,
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "SubjectRequirement(subject_id={:?}, teacher_id={:?}, weekly_periods={})",
            self.subject_id, self.teacher_id, self.weekly_periods
        )
    }
}

impl SubjectRequirement {
    /// The storage check constraint: 1 to 20 periods per week.
    pub fn has_valid_weekly_periods(&self) -> bool {
        (1..=MAX_WEEKLY_PERIODS).contains(&self.weekly_periods)
    }
}

/// A persisted (or about to be persisted) timetable assignment.
#[pyclass]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimeTableEntry {
    /// Assigned by the repository; `None` until saved.
    #[pyo3(get, set)]
    pub id: Option<u64>,
    #[pyo3(get, set)]
    pub section_id: String,
    #[pyo3(get, set)]
    pub subject_id: String,
    #[pyo3(get, set)]
    pub teacher_id: String,
    #[pyo3(get, set)]
    pub day_of_week: DayOfWeek,
    #[pyo3(get, set)]
    pub period_number: u8,
    #[pyo3(get, set)]
    pub start_time: NaiveTime,
    #[pyo3(get, set)]
    pub end_time: NaiveTime,
    #[pyo3(get, set)]
    pub room_number: String,
    #[pyo3(get, set)]
    pub is_deleted: bool,
}

impl TimeTableEntry {
    pub fn slot(&self) -> Slot {
        Slot::new(self.day_of_week, self.period_number)
    }

    pub fn is_active(&self) -> bool {
        !self.is_deleted
    }
}

#[pymethods]
impl TimeTableEntry {
    #[new]
    #[pyo3(signature = (
        section_id,
        subject_id,
        teacher_id,
        day_of_week,
        period_number,
        start_time,
        end_time,
        room_number,
        id=None
    ))]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        section_id: String,
        subject_id: String,
        teacher_id: String,
        day_of_week: DayOfWeek,
        period_number: u8,
        start_time: NaiveTime,
        end_time: NaiveTime,
        room_number: String,
        id: Option<u64>,
    ) -> Self {
        Self {
            id,
            section_id,
            subject_id,
            teacher_id,
            day_of_week,
            period_number,
            start_time,
            end_time,
            room_number,
            is_deleted: false,
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "TimeTableEntry(section_id={:?}, subject_id={:?}, teacher_id={:?}, slot={}, room={:?})",
            self.section_id,
            self.subject_id,
            self.teacher_id,
            self.slot(),
            self.room_number
        )
    }
}

/// A class section: owns its requirements and its timetable entries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Section {
    pub id: String,
    pub name: String,
    pub default_room: String,
    /// Configured periods per day, once the section has an academic config.
    pub periods_per_day: Option<u8>,
    pub requirements: Vec<SubjectRequirement>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Teacher {
    pub id: String,
    pub name: String,
}

/// Result of a timetable generation run.
#[pyclass]
#[derive(Clone, Debug, Default)]
pub struct TimetableResult {
    #[pyo3(get, set)]
    pub entries: Vec<TimeTableEntry>,
    #[pyo3(get, set)]
    pub metadata: HashMap<String, String>,
}

#[pymethods]
impl TimetableResult {
    fn __repr__(&self) -> String {
        format!(
            "TimetableResult(entries={}, metadata_keys={})",
            self.entries.len(),
            self.metadata.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_numbering() {
        assert_eq!(DayOfWeek::from_number(0), Some(DayOfWeek::Sunday));
        assert_eq!(DayOfWeek::from_number(6), Some(DayOfWeek::Saturday));
        assert_eq!(DayOfWeek::from_number(7), None);
        assert_eq!(DayOfWeek::from_number(-1), None);
        assert_eq!(DayOfWeek::Wednesday.number(), 3);
        assert!(!DayOfWeek::Sunday.is_school_day());
        assert!(DayOfWeek::Saturday.is_school_day());
    }

    #[test]
    fn test_slot_ordering() {
        let a = Slot::new(DayOfWeek::Monday, 6);
        let b = Slot::new(DayOfWeek::Tuesday, 1);
        let c = Slot::new(DayOfWeek::Tuesday, 2);
        assert!(a < b);
        assert!(b < c);
        assert_eq!(b.to_string(), "Tue P1");
    }
}
