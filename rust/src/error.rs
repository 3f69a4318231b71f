//! Error types shared by config validation, the rule chain and the generator.

use std::fmt;
use thiserror::Error;

use crate::models::Slot;

/// A single field-level problem with an academic configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfigViolation {
    pub field: &'static str,
    pub message: String,
}

impl ConfigViolation {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// The resource that was already occupied when a slot conflict was found.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConflictResource {
    Teacher(String),
    Section(String),
    Room(String),
}

impl fmt::Display for ConflictResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Teacher(id) => write!(f, "teacher {}", id),
            Self::Section(id) => write!(f, "section {}", id),
            Self::Room(room) => write!(f, "room {}", room),
        }
    }
}

/// Coarse grouping of errors, used by callers to pick a recovery strategy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    ConfigInvalid,
    NotFound,
    InvalidRange,
    Conflict,
    Infeasible,
    ConcurrentConflict,
}

/// Errors that can occur while validating, generating or editing timetables.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("Invalid academic configuration: {}", join_violations(.0))]
    ConfigInvalid(Vec<ConfigViolation>),
    /// Zero weekly periods, or outside 1-20 when stored.
    #[error("Invalid requirement for subject {subject_id}: {weekly_periods} weekly periods")]
    InvalidRequirement {
        subject_id: String,
        weekly_periods: u8,
    },
    #[error("Section not found: {0}")]
    InvalidSection(String),
    #[error("Teacher not found: {0}")]
    TeacherNotFound(String),
    #[error("Timetable entry not found: {0}")]
    EntryNotFound(u64),
    #[error("Invalid day of week: {0}")]
    InvalidDayOfWeek(i32),
    #[error("Invalid period number {period}: must be between 1 and {max}")]
    InvalidPeriodNumber { period: i32, max: u8 },
    #[error("Invalid room number: {0:?}")]
    InvalidRoomNumber(String),
    #[error("Invalid time range: {0}")]
    InvalidTimeRange(String),
    #[error("Slot conflict at {slot}: {resource} is already booked")]
    SlotConflict {
        resource: ConflictResource,
        slot: Slot,
    },
    #[error("Cannot place {subject_id} (teacher {teacher_id}, {weekly_periods} periods/week)")]
    Infeasible {
        subject_id: String,
        teacher_id: String,
        weekly_periods: u8,
    },
    #[error("Concurrent schedule conflict: {0}")]
    ConcurrentScheduleConflict(String),
}

impl ScheduleError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ConfigInvalid(_) | Self::InvalidRequirement { .. } => ErrorKind::ConfigInvalid,
            Self::InvalidSection(_) | Self::TeacherNotFound(_) | Self::EntryNotFound(_) => {
                ErrorKind::NotFound
            }
            Self::InvalidDayOfWeek(_)
            | Self::InvalidPeriodNumber { .. }
            | Self::InvalidRoomNumber(_)
            | Self::InvalidTimeRange(_) => ErrorKind::InvalidRange,
            Self::SlotConflict { .. } => ErrorKind::Conflict,
            Self::Infeasible { .. } => ErrorKind::Infeasible,
            Self::ConcurrentScheduleConflict(_) => ErrorKind::ConcurrentConflict,
        }
    }

    /// True when the same request may succeed if retried against a fresh snapshot.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::ConcurrentConflict
    }
}

fn join_violations(violations: &[ConfigViolation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DayOfWeek;

    #[test]
    fn test_kind_grouping() {
        assert_eq!(
            ScheduleError::TeacherNotFound("t1".into()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            ScheduleError::InvalidPeriodNumber { period: 0, max: 6 }.kind(),
            ErrorKind::InvalidRange
        );
        assert!(ScheduleError::ConcurrentScheduleConflict("x".into()).is_retryable());
        assert!(!ScheduleError::Infeasible {
            subject_id: "math".into(),
            teacher_id: "t1".into(),
            weekly_periods: 5,
        }
        .is_retryable());
    }

    #[test]
    fn test_messages() {
        let err = ScheduleError::SlotConflict {
            resource: ConflictResource::Teacher("t1".into()),
            slot: Slot::new(DayOfWeek::Monday, 2),
        };
        assert_eq!(
            err.to_string(),
            "Slot conflict at Mon P2: teacher t1 is already booked"
        );

        let err = ScheduleError::ConfigInvalid(vec![
            ConfigViolation::new("periods_per_day", "must be between 1 and 10"),
            ConfigViolation::new("working_days", "must not be empty"),
        ]);
        assert_eq!(
            err.to_string(),
            "Invalid academic configuration: periods_per_day: must be between 1 and 10; \
             working_days: must not be empty"
        );

        let err = ScheduleError::InvalidRequirement {
            subject_id: "math".to_string(),
            weekly_periods: 0,
        };
        assert_eq!(
            err.to_string(),
            "Invalid requirement for subject math: 0 weekly periods"
        );
    }
}
