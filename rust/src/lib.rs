//! Rust implementation of class timetable generation and slot validation.
//!
//! This module provides the academic config validator, the slot availability
//! rule chain, the backtracking timetable generator, and the command handlers
//! that tie them to a repository.

// Allow clippy warning triggered by PyO3 macro expansion
#![allow(clippy::useless_conversion)]

use chrono::NaiveTime;
use pyo3::prelude::*;

pub mod academic;
pub mod commands;
mod config;
pub mod error;
pub mod logging;
mod models;
pub mod repository;
pub mod scheduler;
pub mod sorting;

pub use academic::{AcademicConfig, AcademicConfigInput, MAX_DAILY_MINUTES, MAX_PERIODS_PER_DAY};
pub use commands::{
    check_time_range, CheckSlotAvailabilityQuery, CreateTimeTableEntryCommand,
    DeleteTimeTableEntryCommand, GenerateTimeTableCommand, GetTeacherTimeTableQuery,
    TimetableService, UpdateTimeTableEntryCommand,
};
pub use config::GeneratorConfig;
pub use error::{ConfigViolation, ConflictResource, ErrorKind, ScheduleError};
pub use models::{
    DayOfWeek, Section, Slot, SubjectRequirement, Teacher, TimeTableEntry, TimetableResult,
    MAX_WEEKLY_PERIODS,
};
pub use repository::{InMemoryStore, ReferenceLookup, RepositoryError, TimeTableRepository};
pub use scheduler::{
    ConflictIndex, RuleContext, SlotAvailabilityValidator, SlotRequest, TimetableGenerator,
};

fn to_py_err(err: ScheduleError) -> PyErr {
    pyo3::exceptions::PyValueError::new_err(err.to_string())
}

fn reference_section(id: &str, default_room: &str, periods_per_day: Option<u8>) -> Section {
    Section {
        id: id.to_string(),
        name: id.to_string(),
        default_room: default_room.to_string(),
        periods_per_day,
        requirements: Vec::new(),
    }
}

fn reference_teacher(id: &str) -> Teacher {
    Teacher {
        id: id.to_string(),
        name: id.to_string(),
    }
}

/// Validate an academic configuration.
///
/// # Returns
/// * List of violation messages, empty when the configuration is valid
#[pyfunction]
#[pyo3(signature = (
    periods_per_day,
    period_duration_minutes,
    break_after_period,
    break_duration_minutes,
    school_start_time,
    working_days
))]
fn validate_academic_config(
    periods_per_day: i32,
    period_duration_minutes: i32,
    break_after_period: i32,
    break_duration_minutes: i32,
    school_start_time: NaiveTime,
    working_days: Vec<i32>,
) -> Vec<String> {
    let input = AcademicConfigInput {
        periods_per_day,
        period_duration_minutes,
        break_after_period,
        break_duration_minutes,
        school_start_time,
        working_days,
    };
    match AcademicConfig::validate(&input) {
        Ok(_) => Vec::new(),
        Err(ScheduleError::ConfigInvalid(violations)) => {
            violations.iter().map(|v| v.to_string()).collect()
        }
        Err(other) => vec![other.to_string()],
    }
}

/// Generate a timetable for one section.
///
/// Teachers named by the requirements and by the existing entries are taken
/// as known. Persisting the returned entries is left to the caller.
///
/// # Arguments
/// * `section_id` - Section to generate for
/// * `default_room` - Room used by requirements without their own room
/// * `requirements` - Subject/teacher pairs with their weekly period counts
/// * `existing_entries` - Active entries of all sections; the section's own are ignored
/// * `config` - Generator tuning (verbosity, backtrack budget, daily spread)
///
/// # Returns
/// * TimetableResult with entries sorted by slot and run metadata
///
/// # Raises
/// * ValueError if the academic config is invalid or the requirements cannot all be placed
#[pyfunction]
#[pyo3(signature = (
    section_id,
    default_room,
    requirements,
    existing_entries,
    periods_per_day,
    period_duration_minutes,
    break_after_period,
    break_duration_minutes,
    school_start_time,
    working_days,
    config=None
))]
#[allow(clippy::too_many_arguments)]
fn generate_timetable(
    section_id: String,
    default_room: String,
    requirements: Vec<SubjectRequirement>,
    existing_entries: Vec<TimeTableEntry>,
    periods_per_day: i32,
    period_duration_minutes: i32,
    break_after_period: i32,
    break_duration_minutes: i32,
    school_start_time: NaiveTime,
    working_days: Vec<i32>,
    config: Option<GeneratorConfig>,
) -> PyResult<TimetableResult> {
    let academic = AcademicConfig::validate(&AcademicConfigInput {
        periods_per_day,
        period_duration_minutes,
        break_after_period,
        break_duration_minutes,
        school_start_time,
        working_days,
    })
    .map_err(to_py_err)?;
    let config = config.unwrap_or_default();

    let mut store = InMemoryStore::new();
    store
        .add_section(reference_section(
            &section_id,
            &default_room,
            Some(academic.periods_per_day()),
        ))
        .map_err(|e| to_py_err(e.into()))?;
    for teacher_id in requirements
        .iter()
        .map(|r| &r.teacher_id)
        .chain(existing_entries.iter().map(|e| &e.teacher_id))
    {
        store.add_teacher(reference_teacher(teacher_id));
    }

    let active: Vec<TimeTableEntry> = existing_entries
        .into_iter()
        .filter(|e| e.is_active())
        .collect();

    TimetableGenerator::new(&academic, &config, &store)
        .generate(&section_id, &default_room, &requirements, &active)
        .map_err(to_py_err)
}

/// Check whether a slot can take a new entry.
///
/// # Arguments
/// * `existing_entries` - Active entries across all sections
/// * `known_sections` / `known_teachers` - Ids that exist
/// * `periods_per_day` - The section's configured periods, when it has a config
///
/// # Raises
/// * ValueError naming the first failed rule
#[pyfunction]
#[pyo3(signature = (
    existing_entries,
    known_sections,
    known_teachers,
    section_id,
    teacher_id,
    room_number,
    day_of_week,
    period_number,
    periods_per_day=None
))]
#[allow(clippy::too_many_arguments)]
fn check_slot_availability(
    existing_entries: Vec<TimeTableEntry>,
    known_sections: Vec<String>,
    known_teachers: Vec<String>,
    section_id: String,
    teacher_id: String,
    room_number: String,
    day_of_week: i32,
    period_number: i32,
    periods_per_day: Option<u8>,
) -> PyResult<()> {
    let mut store = InMemoryStore::new();
    for id in &known_sections {
        let periods = if *id == section_id { periods_per_day } else { None };
        store
            .add_section(reference_section(id, "", periods))
            .map_err(|e| to_py_err(e.into()))?;
    }
    for id in &known_teachers {
        store.add_teacher(reference_teacher(id));
    }

    let active: Vec<TimeTableEntry> = existing_entries
        .into_iter()
        .filter(|e| e.is_active())
        .collect();
    let index = ConflictIndex::build(&active);
    let request = SlotRequest {
        section_id,
        teacher_id,
        room_number,
        day_of_week,
        period_number,
    };
    let ctx = RuleContext {
        lookup: &store,
        index: &index,
        periods_per_day,
    };
    SlotAvailabilityValidator::default()
        .validate(&request, &ctx)
        .map_err(to_py_err)
}

/// Validate a manual entry's start/end times.
#[pyfunction]
#[pyo3(name = "check_time_range")]
fn py_check_time_range(start_time: NaiveTime, end_time: NaiveTime) -> PyResult<()> {
    check_time_range(start_time, end_time).map_err(to_py_err)
}

/// The timetable.rust Python module.
#[pymodule]
fn rust(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Core data types
    m.add_class::<DayOfWeek>()?;
    m.add_class::<SubjectRequirement>()?;
    m.add_class::<TimeTableEntry>()?;
    m.add_class::<TimetableResult>()?;

    // Config types
    m.add_class::<GeneratorConfig>()?;

    // Validation and generation
    m.add_function(wrap_pyfunction!(validate_academic_config, m)?)?;
    m.add_function(wrap_pyfunction!(generate_timetable, m)?)?;
    m.add_function(wrap_pyfunction!(check_slot_availability, m)?)?;
    m.add_function(wrap_pyfunction!(py_check_time_range, m)?)?;

    Ok(())
}
