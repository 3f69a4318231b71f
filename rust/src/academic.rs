//! Academic configuration: the weekly shape of a section's timetable.

use chrono::{Duration, NaiveTime};
use rustc_hash::FxHashSet;

use crate::error::{ConfigViolation, ScheduleError};
use crate::models::{DayOfWeek, Slot};

/// Hard ceiling on periods per day, independent of any section's config.
pub const MAX_PERIODS_PER_DAY: u8 = 10;
/// Longest school day allowed, in minutes (periods plus break).
pub const MAX_DAILY_MINUTES: i32 = 720;

const PERIOD_DURATION_RANGE: (i32, i32) = (30, 120);
const BREAK_DURATION_RANGE: (i32, i32) = (15, 60);

/// Unvalidated academic configuration fields, as received from a command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AcademicConfigInput {
    pub periods_per_day: i32,
    pub period_duration_minutes: i32,
    pub break_after_period: i32,
    pub break_duration_minutes: i32,
    pub school_start_time: NaiveTime,
    /// Raw day numbers (Sunday=0 .. Saturday=6), in the order the week is scanned.
    pub working_days: Vec<i32>,
}

/// A validated academic configuration.
///
/// Only obtainable through [`AcademicConfig::validate`], so every instance
/// satisfies the range rules and the 12-hour day ceiling.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AcademicConfig {
    periods_per_day: u8,
    period_duration_minutes: u16,
    break_after_period: u8,
    break_duration_minutes: u16,
    school_start_time: NaiveTime,
    working_days: Vec<DayOfWeek>,
}

fn earliest_start() -> NaiveTime {
    NaiveTime::MIN + Duration::hours(6)
}

fn latest_start() -> NaiveTime {
    NaiveTime::MIN + Duration::hours(10)
}

impl AcademicConfig {
    /// Validate raw fields. All rules run; every violation is reported together.
    pub fn validate(input: &AcademicConfigInput) -> Result<Self, ScheduleError> {
        let mut violations = Vec::new();

        if !(1..=MAX_PERIODS_PER_DAY as i32).contains(&input.periods_per_day) {
            violations.push(ConfigViolation::new(
                "periods_per_day",
                format!(
                    "must be between 1 and {}, got {}",
                    MAX_PERIODS_PER_DAY, input.periods_per_day
                ),
            ));
        }

        let (min_period, max_period) = PERIOD_DURATION_RANGE;
        if !(min_period..=max_period).contains(&input.period_duration_minutes) {
            violations.push(ConfigViolation::new(
                "period_duration_minutes",
                format!(
                    "must be between {} and {}, got {}",
                    min_period, max_period, input.period_duration_minutes
                ),
            ));
        }

        let (min_break, max_break) = BREAK_DURATION_RANGE;
        if !(min_break..=max_break).contains(&input.break_duration_minutes) {
            violations.push(ConfigViolation::new(
                "break_duration_minutes",
                format!(
                    "must be between {} and {}, got {}",
                    min_break, max_break, input.break_duration_minutes
                ),
            ));
        }

        if input.break_after_period <= 0 {
            violations.push(ConfigViolation::new(
                "break_after_period",
                format!("must be greater than 0, got {}", input.break_after_period),
            ));
        } else if input.break_after_period > input.periods_per_day {
            violations.push(ConfigViolation::new(
                "break_after_period",
                format!(
                    "must not exceed periods_per_day ({}), got {}",
                    input.periods_per_day, input.break_after_period
                ),
            ));
        }

        if input.school_start_time < earliest_start() || input.school_start_time > latest_start() {
            violations.push(ConfigViolation::new(
                "school_start_time",
                format!(
                    "must be between 06:00 and 10:00, got {}",
                    input.school_start_time.format("%H:%M")
                ),
            ));
        }

        let working_days = Self::check_working_days(&input.working_days, &mut violations);

        let total_minutes = (input.periods_per_day as i64)
            * (input.period_duration_minutes as i64)
            + input.break_duration_minutes as i64;
        if total_minutes > MAX_DAILY_MINUTES as i64 {
            violations.push(ConfigViolation::new(
                "total_daily_minutes",
                format!(
                    "periods and break must fit in {} minutes, got {}",
                    MAX_DAILY_MINUTES, total_minutes
                ),
            ));
        }

        if !violations.is_empty() {
            return Err(ScheduleError::ConfigInvalid(violations));
        }

        // Ranges were checked above, so the narrowing casts are lossless.
        Ok(Self {
            periods_per_day: input.periods_per_day as u8,
            period_duration_minutes: input.period_duration_minutes as u16,
            break_after_period: input.break_after_period as u8,
            break_duration_minutes: input.break_duration_minutes as u16,
            school_start_time: input.school_start_time,
            working_days,
        })
    }

    fn check_working_days(raw: &[i32], violations: &mut Vec<ConfigViolation>) -> Vec<DayOfWeek> {
        if raw.is_empty() {
            violations.push(ConfigViolation::new("working_days", "must not be empty"));
            return Vec::new();
        }

        let mut seen: FxHashSet<DayOfWeek> = FxHashSet::default();
        let mut days = Vec::with_capacity(raw.len());
        for &number in raw {
            match DayOfWeek::from_number(number) {
                None => violations.push(ConfigViolation::new(
                    "working_days",
                    format!("unrecognized day number {}", number),
                )),
                Some(DayOfWeek::Sunday) => violations.push(ConfigViolation::new(
                    "working_days",
                    "Sunday cannot be a working day",
                )),
                Some(day) => {
                    if seen.insert(day) {
                        days.push(day);
                    } else {
                        violations.push(ConfigViolation::new(
                            "working_days",
                            format!("duplicate day {}", day),
                        ));
                    }
                }
            }
        }
        days
    }

    pub fn periods_per_day(&self) -> u8 {
        self.periods_per_day
    }

    pub fn period_duration_minutes(&self) -> u16 {
        self.period_duration_minutes
    }

    pub fn break_after_period(&self) -> u8 {
        self.break_after_period
    }

    pub fn break_duration_minutes(&self) -> u16 {
        self.break_duration_minutes
    }

    pub fn school_start_time(&self) -> NaiveTime {
        self.school_start_time
    }

    pub fn working_days(&self) -> &[DayOfWeek] {
        &self.working_days
    }

    pub fn total_daily_minutes(&self) -> i32 {
        self.periods_per_day as i32 * self.period_duration_minutes as i32
            + self.break_duration_minutes as i32
    }

    /// Start and end time of a period.
    ///
    /// Periods after `break_after_period` are shifted by the break duration.
    /// The 12-hour ceiling and the 10:00 latest start keep every period
    /// inside the same day.
    pub fn period_window(&self, period: u8) -> (NaiveTime, NaiveTime) {
        let mut offset = (period.saturating_sub(1) as i64) * self.period_duration_minutes as i64;
        if period > self.break_after_period {
            offset += self.break_duration_minutes as i64;
        }
        let start = self.school_start_time + Duration::minutes(offset);
        let end = start + Duration::minutes(self.period_duration_minutes as i64);
        (start, end)
    }

    /// The break window that follows `break_after_period`.
    pub fn break_window(&self) -> (NaiveTime, NaiveTime) {
        let (_, end_of_period) = self.period_window(self.break_after_period);
        (
            end_of_period,
            end_of_period + Duration::minutes(self.break_duration_minutes as i64),
        )
    }

    /// Every placeable slot, days in configured order, periods ascending.
    pub fn slot_universe(&self) -> Vec<Slot> {
        self.working_days
            .iter()
            .flat_map(|&day| (1..=self.periods_per_day).map(move |period| Slot::new(day, period)))
            .collect()
    }
}
