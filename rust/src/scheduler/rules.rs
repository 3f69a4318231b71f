//! Slot availability rule chain.
//!
//! Each rule is a small object implementing [`SlotRule`]; the validator runs
//! a fixed slice of them in order and stops at the first failure. Existence
//! rules come first because the range and conflict rules assume the section
//! and teacher are real.

use crate::academic::MAX_PERIODS_PER_DAY;
use crate::error::{ConflictResource, ScheduleError};
use crate::models::{DayOfWeek, Slot};
use crate::repository::ReferenceLookup;

use super::conflict_index::ConflictIndex;

pub const MAX_ROOM_NUMBER_LEN: usize = 20;

/// A candidate placement, with day and period still in raw form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlotRequest {
    pub section_id: String,
    pub teacher_id: String,
    pub room_number: String,
    pub day_of_week: i32,
    pub period_number: i32,
}

impl SlotRequest {
    pub fn for_slot(section_id: &str, teacher_id: &str, room_number: &str, slot: Slot) -> Self {
        Self {
            section_id: section_id.to_string(),
            teacher_id: teacher_id.to_string(),
            room_number: room_number.to_string(),
            day_of_week: slot.day.number(),
            period_number: slot.period as i32,
        }
    }

    /// The requested slot, if day and period are representable at all.
    pub fn slot(&self) -> Option<Slot> {
        let day = DayOfWeek::from_number(self.day_of_week)?;
        let period = u8::try_from(self.period_number).ok()?;
        Some(Slot::new(day, period))
    }
}

/// What a rule may consult besides the request itself.
pub struct RuleContext<'a> {
    pub lookup: &'a dyn ReferenceLookup,
    pub index: &'a ConflictIndex,
    /// The section's configured periods per day, when known.
    pub periods_per_day: Option<u8>,
}

pub trait SlotRule {
    fn name(&self) -> &'static str;
    fn check(&self, request: &SlotRequest, ctx: &RuleContext<'_>) -> Result<(), ScheduleError>;
}

pub struct SectionExists;

impl SlotRule for SectionExists {
    fn name(&self) -> &'static str {
        "section_exists"
    }

    fn check(&self, request: &SlotRequest, ctx: &RuleContext<'_>) -> Result<(), ScheduleError> {
        match ctx.lookup.get_section(&request.section_id) {
            Some(_) => Ok(()),
            None => Err(ScheduleError::InvalidSection(request.section_id.clone())),
        }
    }
}

pub struct TeacherExists;

impl SlotRule for TeacherExists {
    fn name(&self) -> &'static str {
        "teacher_exists"
    }

    fn check(&self, request: &SlotRequest, ctx: &RuleContext<'_>) -> Result<(), ScheduleError> {
        match ctx.lookup.get_teacher(&request.teacher_id) {
            Some(_) => Ok(()),
            None => Err(ScheduleError::TeacherNotFound(request.teacher_id.clone())),
        }
    }
}

pub struct DayOfWeekValid;

impl SlotRule for DayOfWeekValid {
    fn name(&self) -> &'static str {
        "day_of_week_valid"
    }

    fn check(&self, request: &SlotRequest, _ctx: &RuleContext<'_>) -> Result<(), ScheduleError> {
        match DayOfWeek::from_number(request.day_of_week) {
            Some(day) if day.is_school_day() => Ok(()),
            _ => Err(ScheduleError::InvalidDayOfWeek(request.day_of_week)),
        }
    }
}

/// Checks the absolute ceiling and, separately, the section's own period count.
pub struct PeriodNumberValid;

impl SlotRule for PeriodNumberValid {
    fn name(&self) -> &'static str {
        "period_number_valid"
    }

    fn check(&self, request: &SlotRequest, ctx: &RuleContext<'_>) -> Result<(), ScheduleError> {
        let period = request.period_number;
        if !(1..=MAX_PERIODS_PER_DAY as i32).contains(&period) {
            return Err(ScheduleError::InvalidPeriodNumber {
                period,
                max: MAX_PERIODS_PER_DAY,
            });
        }
        if let Some(configured) = ctx.periods_per_day {
            if period > configured as i32 {
                return Err(ScheduleError::InvalidPeriodNumber {
                    period,
                    max: configured,
                });
            }
        }
        Ok(())
    }
}

pub struct RoomNumberValid;

impl SlotRule for RoomNumberValid {
    fn name(&self) -> &'static str {
        "room_number_valid"
    }

    fn check(&self, request: &SlotRequest, _ctx: &RuleContext<'_>) -> Result<(), ScheduleError> {
        let room = request.room_number.trim();
        if room.is_empty() || room.chars().count() > MAX_ROOM_NUMBER_LEN {
            return Err(ScheduleError::InvalidRoomNumber(request.room_number.clone()));
        }
        Ok(())
    }
}

/// Teacher, then section slot, then room.
pub struct ConflictCheck;

impl SlotRule for ConflictCheck {
    fn name(&self) -> &'static str {
        "conflict_check"
    }

    fn check(&self, request: &SlotRequest, ctx: &RuleContext<'_>) -> Result<(), ScheduleError> {
        let slot = request
            .slot()
            .ok_or(ScheduleError::InvalidDayOfWeek(request.day_of_week))?;

        let resource = if ctx.index.is_teacher_busy(&request.teacher_id, slot) {
            ConflictResource::Teacher(request.teacher_id.clone())
        } else if ctx.index.is_section_slot_taken(&request.section_id, slot) {
            ConflictResource::Section(request.section_id.clone())
        } else if ctx.index.is_room_busy(&request.room_number, slot) {
            ConflictResource::Room(request.room_number.clone())
        } else {
            return Ok(());
        };
        Err(ScheduleError::SlotConflict { resource, slot })
    }
}

/// The full chain, in evaluation order.
pub const STANDARD_RULES: &[&dyn SlotRule] = &[
    &SectionExists,
    &TeacherExists,
    &DayOfWeekValid,
    &PeriodNumberValid,
    &RoomNumberValid,
    &ConflictCheck,
];

/// Runs rules in order; the first failure wins.
#[derive(Clone, Copy)]
pub struct SlotAvailabilityValidator {
    rules: &'static [&'static dyn SlotRule],
}

impl Default for SlotAvailabilityValidator {
    fn default() -> Self {
        Self::new(STANDARD_RULES)
    }
}

impl SlotAvailabilityValidator {
    pub fn new(rules: &'static [&'static dyn SlotRule]) -> Self {
        Self { rules }
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    pub fn validate(
        &self,
        request: &SlotRequest,
        ctx: &RuleContext<'_>,
    ) -> Result<(), ScheduleError> {
        for rule in self.rules {
            rule.check(request, ctx)?;
        }
        Ok(())
    }

    /// Like [`validate`](Self::validate), also naming the rule that failed.
    pub fn first_failure(
        &self,
        request: &SlotRequest,
        ctx: &RuleContext<'_>,
    ) -> Option<(&'static str, ScheduleError)> {
        self.rules
            .iter()
            .find_map(|rule| rule.check(request, ctx).err().map(|e| (rule.name(), e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Section, Teacher, TimeTableEntry};
    use crate::repository::InMemoryStore;
    use chrono::NaiveTime;

    fn store() -> InMemoryStore {
        let mut store = InMemoryStore::new();
        for (id, room) in [("s1", "101"), ("s2", "102")] {
            store.add_section(Section {
                id: id.to_string(),
                name: id.to_uppercase(),
                default_room: room.to_string(),
                periods_per_day: Some(6),
                requirements: vec![],
            })
            .unwrap();
        }
        for id in ["t1", "t2"] {
            store.add_teacher(Teacher {
                id: id.to_string(),
                name: id.to_uppercase(),
            });
        }
        store
    }

    fn request(day: i32, period: i32) -> SlotRequest {
        SlotRequest {
            section_id: "s1".to_string(),
            teacher_id: "t1".to_string(),
            room_number: "101".to_string(),
            day_of_week: day,
            period_number: period,
        }
    }

    fn busy_entry(section: &str, teacher: &str, room: &str) -> TimeTableEntry {
        TimeTableEntry::new(
            section.to_string(),
            "physics".to_string(),
            teacher.to_string(),
            DayOfWeek::Monday,
            2,
            NaiveTime::from_hms_opt(8, 45, 0).unwrap(),
            NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
            room.to_string(),
            Some(1),
        )
    }

    fn check(
        req: &SlotRequest,
        index: &ConflictIndex,
        periods: Option<u8>,
    ) -> Result<(), ScheduleError> {
        let store = store();
        let ctx = RuleContext {
            lookup: &store,
            index,
            periods_per_day: periods,
        };
        SlotAvailabilityValidator::default().validate(req, &ctx)
    }

    #[test]
    fn test_free_slot_passes() {
        assert_eq!(check(&request(1, 1), &ConflictIndex::default(), Some(6)), Ok(()));
    }

    #[test]
    fn test_rule_order() {
        assert_eq!(
            SlotAvailabilityValidator::default().rule_names(),
            vec![
                "section_exists",
                "teacher_exists",
                "day_of_week_valid",
                "period_number_valid",
                "room_number_valid",
                "conflict_check",
            ]
        );
    }

    #[test]
    fn test_existence_checked_first() {
        let mut req = request(0, 0);
        req.section_id = "missing".to_string();
        req.teacher_id = "missing".to_string();
        assert_eq!(
            check(&req, &ConflictIndex::default(), None),
            Err(ScheduleError::InvalidSection("missing".to_string()))
        );

        req.section_id = "s1".to_string();
        assert_eq!(
            check(&req, &ConflictIndex::default(), None),
            Err(ScheduleError::TeacherNotFound("missing".to_string()))
        );
    }

    #[test]
    fn test_sunday_always_fails() {
        for period in [0, 1, 11] {
            assert_eq!(
                check(&request(0, period), &ConflictIndex::default(), Some(6)),
                Err(ScheduleError::InvalidDayOfWeek(0))
            );
        }
        assert_eq!(
            check(&request(7, 1), &ConflictIndex::default(), Some(6)),
            Err(ScheduleError::InvalidDayOfWeek(7))
        );
    }

    #[test]
    fn test_period_boundaries() {
        let index = ConflictIndex::default();
        assert_eq!(
            check(&request(1, 0), &index, Some(6)),
            Err(ScheduleError::InvalidPeriodNumber { period: 0, max: 10 })
        );
        assert_eq!(
            check(&request(1, 7), &index, Some(6)),
            Err(ScheduleError::InvalidPeriodNumber { period: 7, max: 6 })
        );
        assert_eq!(check(&request(1, 6), &index, Some(6)), Ok(()));
        // Without a configured shape only the absolute ceiling applies.
        assert_eq!(check(&request(1, 10), &index, None), Ok(()));
        assert_eq!(
            check(&request(1, 11), &index, None),
            Err(ScheduleError::InvalidPeriodNumber { period: 11, max: 10 })
        );
    }

    #[test]
    fn test_room_number_rules() {
        let index = ConflictIndex::default();
        let mut req = request(1, 1);
        req.room_number = "   ".to_string();
        assert!(matches!(
            check(&req, &index, None),
            Err(ScheduleError::InvalidRoomNumber(_))
        ));
        req.room_number = "R".repeat(21);
        assert!(matches!(
            check(&req, &index, None),
            Err(ScheduleError::InvalidRoomNumber(_))
        ));
        req.room_number = "R".repeat(20);
        assert_eq!(check(&req, &index, None), Ok(()));
    }

    #[test]
    fn test_teacher_conflict_from_other_section() {
        let index = ConflictIndex::build(&[busy_entry("s2", "t1", "102")]);
        assert_eq!(
            check(&request(1, 2), &index, Some(6)),
            Err(ScheduleError::SlotConflict {
                resource: ConflictResource::Teacher("t1".to_string()),
                slot: Slot::new(DayOfWeek::Monday, 2),
            })
        );
    }

    #[test]
    fn test_section_and_room_conflicts() {
        let index = ConflictIndex::build(&[busy_entry("s1", "t2", "999")]);
        assert!(matches!(
            check(&request(1, 2), &index, Some(6)),
            Err(ScheduleError::SlotConflict {
                resource: ConflictResource::Section(_),
                ..
            })
        ));

        let index = ConflictIndex::build(&[busy_entry("s2", "t2", "101")]);
        assert!(matches!(
            check(&request(1, 2), &index, Some(6)),
            Err(ScheduleError::SlotConflict {
                resource: ConflictResource::Room(_),
                ..
            })
        ));
    }

    #[test]
    fn test_validation_is_idempotent() {
        let index = ConflictIndex::build(&[busy_entry("s2", "t1", "102")]);
        let first = check(&request(1, 2), &index, Some(6));
        let second = check(&request(1, 2), &index, Some(6));
        assert_eq!(first, second);
    }

    #[test]
    fn test_first_failure_names_rule() {
        let store = store();
        let index = ConflictIndex::default();
        let ctx = RuleContext {
            lookup: &store,
            index: &index,
            periods_per_day: Some(6),
        };
        let (rule, _) = SlotAvailabilityValidator::default()
            .first_failure(&request(1, 0), &ctx)
            .unwrap();
        assert_eq!(rule, "period_number_valid");
    }
}
