//! Timetable generation and slot availability checking.
//!
//! The generator places one task per weekly period, most constrained
//! subjects first, and asks the same rule chain used for manual edits
//! whether each candidate slot is free.

mod conflict_index;
mod core;
mod rules;
mod state;

pub use conflict_index::ConflictIndex;
pub use core::TimetableGenerator;
pub use rules::{
    ConflictCheck, DayOfWeekValid, PeriodNumberValid, RoomNumberValid, RuleContext,
    SectionExists, SlotAvailabilityValidator, SlotRequest, SlotRule, TeacherExists,
    MAX_ROOM_NUMBER_LEN, STANDARD_RULES,
};
pub use state::{Placement, PlacementState};
