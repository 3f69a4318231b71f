//! Verbosity-gated logging for timetable generation and slot validation.
//!
//! Output goes to stderr and costs nothing beyond an integer comparison when
//! the level is off. Levels:
//! - 0: SILENT (errors are returned, never logged)
//! - 1: CHANGES (placements, backtracks, saved timetables)
//! - 2: CHECKS (candidate slots rejected by the rule chain)
//! - 3: DEBUG (index construction, work list, cursor movement)

pub const VERBOSITY_SILENT: u8 = 0;
pub const VERBOSITY_CHANGES: u8 = 1;
pub const VERBOSITY_CHECKS: u8 = 2;
pub const VERBOSITY_DEBUG: u8 = 3;

/// Log at CHANGES level (verbosity >= 1).
#[macro_export]
macro_rules! log_changes {
    ($verbosity:expr, $($arg:tt)*) => {
        if $verbosity >= $crate::logging::VERBOSITY_CHANGES {
            eprintln!("[timetable] {}", format_args!($($arg)*));
        }
    };
}

/// Log at CHECKS level (verbosity >= 2).
#[macro_export]
macro_rules! log_checks {
    ($verbosity:expr, $($arg:tt)*) => {
        if $verbosity >= $crate::logging::VERBOSITY_CHECKS {
            eprintln!("[timetable]   {}", format_args!($($arg)*));
        }
    };
}

/// Log at DEBUG level (verbosity >= 3).
#[macro_export]
macro_rules! log_debug {
    ($verbosity:expr, $($arg:tt)*) => {
        if $verbosity >= $crate::logging::VERBOSITY_DEBUG {
            eprintln!("[timetable:debug] {}", format_args!($($arg)*));
        }
    };
}
