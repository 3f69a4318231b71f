//! Occupied-slot lookups for teachers, sections and rooms.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::models::{Slot, TimeTableEntry};

/// Snapshot of which slots each teacher, section and room already holds.
///
/// Built fresh for every generation or validation call from the active
/// entries visible at that moment. It only learns about new placements
/// through [`ConflictIndex::record`].
#[derive(Clone, Debug, Default)]
pub struct ConflictIndex {
    teachers: FxHashMap<String, FxHashSet<Slot>>,
    sections: FxHashMap<String, FxHashSet<Slot>>,
    rooms: FxHashMap<String, FxHashSet<Slot>>,
}

impl ConflictIndex {
    /// Index every active entry. O(n) in the number of entries.
    pub fn build<'a>(entries: impl IntoIterator<Item = &'a TimeTableEntry>) -> Self {
        let mut index = Self::default();
        for entry in entries.into_iter().filter(|e| e.is_active()) {
            index.record(entry);
        }
        index
    }

    /// Index every active entry except the one with `entry_id`, so an edit
    /// that keeps its own slot does not conflict with itself.
    pub fn build_excluding<'a>(
        entries: impl IntoIterator<Item = &'a TimeTableEntry>,
        entry_id: u64,
    ) -> Self {
        Self::build(entries.into_iter().filter(|e| e.id != Some(entry_id)))
    }

    /// Mark the entry's teacher, section and room as busy at its slot.
    pub fn record(&mut self, entry: &TimeTableEntry) {
        let slot = entry.slot();
        self.teachers
            .entry(entry.teacher_id.clone())
            .or_default()
            .insert(slot);
        self.sections
            .entry(entry.section_id.clone())
            .or_default()
            .insert(slot);
        self.rooms
            .entry(normalize_room(&entry.room_number))
            .or_default()
            .insert(slot);
    }

    /// Undo [`ConflictIndex::record`] for an entry.
    pub fn release(&mut self, entry: &TimeTableEntry) {
        let slot = entry.slot();
        if let Some(slots) = self.teachers.get_mut(&entry.teacher_id) {
            slots.remove(&slot);
        }
        if let Some(slots) = self.sections.get_mut(&entry.section_id) {
            slots.remove(&slot);
        }
        if let Some(slots) = self.rooms.get_mut(&normalize_room(&entry.room_number)) {
            slots.remove(&slot);
        }
    }

    #[inline]
    pub fn is_teacher_busy(&self, teacher_id: &str, slot: Slot) -> bool {
        self.teachers
            .get(teacher_id)
            .is_some_and(|slots| slots.contains(&slot))
    }

    #[inline]
    pub fn is_section_slot_taken(&self, section_id: &str, slot: Slot) -> bool {
        self.sections
            .get(section_id)
            .is_some_and(|slots| slots.contains(&slot))
    }

    #[inline]
    pub fn is_room_busy(&self, room_number: &str, slot: Slot) -> bool {
        self.rooms
            .get(&normalize_room(room_number))
            .is_some_and(|slots| slots.contains(&slot))
    }
}

/// Room numbers compare case-insensitively, ignoring surrounding whitespace.
pub(crate) fn normalize_room(room_number: &str) -> String {
    room_number.trim().to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DayOfWeek;
    use chrono::NaiveTime;

    fn entry(
        id: u64,
        section: &str,
        teacher: &str,
        room: &str,
        day: DayOfWeek,
        period: u8,
    ) -> TimeTableEntry {
        TimeTableEntry::new(
            section.to_string(),
            "math".to_string(),
            teacher.to_string(),
            day,
            period,
            NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(8, 45, 0).unwrap(),
            room.to_string(),
            Some(id),
        )
    }

    fn mon(period: u8) -> Slot {
        Slot::new(DayOfWeek::Monday, period)
    }

    #[test]
    fn test_empty_index() {
        let index = ConflictIndex::default();
        assert!(!index.is_teacher_busy("t1", mon(1)));
        assert!(!index.is_section_slot_taken("s1", mon(1)));
        assert!(!index.is_room_busy("101", mon(1)));
    }

    #[test]
    fn test_build_indexes_all_three_resources() {
        let entries = vec![entry(1, "s1", "t1", "101", DayOfWeek::Monday, 1)];
        let index = ConflictIndex::build(&entries);
        assert!(index.is_teacher_busy("t1", mon(1)));
        assert!(index.is_section_slot_taken("s1", mon(1)));
        assert!(index.is_room_busy("101", mon(1)));

        assert!(!index.is_teacher_busy("t1", mon(2)));
        assert!(!index.is_teacher_busy("t2", mon(1)));
        assert!(!index.is_section_slot_taken("s2", mon(1)));
    }

    #[test]
    fn test_build_skips_deleted() {
        let mut deleted = entry(1, "s1", "t1", "101", DayOfWeek::Monday, 1);
        deleted.is_deleted = true;
        let index = ConflictIndex::build(&[deleted]);
        assert!(!index.is_teacher_busy("t1", mon(1)));
    }

    #[test]
    fn test_build_excluding() {
        let entries = vec![
            entry(1, "s1", "t1", "101", DayOfWeek::Monday, 1),
            entry(2, "s1", "t1", "101", DayOfWeek::Monday, 2),
        ];
        let index = ConflictIndex::build_excluding(&entries, 1);
        assert!(!index.is_teacher_busy("t1", mon(1)));
        assert!(index.is_teacher_busy("t1", mon(2)));
        assert!(index.is_section_slot_taken("s1", mon(2)));
    }

    #[test]
    fn test_record_and_release() {
        let mut index = ConflictIndex::default();
        let e = entry(1, "s1", "t1", "101", DayOfWeek::Tuesday, 3);
        index.record(&e);
        assert!(index.is_teacher_busy("t1", Slot::new(DayOfWeek::Tuesday, 3)));
        index.release(&e);
        assert!(!index.is_teacher_busy("t1", Slot::new(DayOfWeek::Tuesday, 3)));
        assert!(!index.is_room_busy("101", Slot::new(DayOfWeek::Tuesday, 3)));
        assert!(!index.is_section_slot_taken("s1", Slot::new(DayOfWeek::Tuesday, 3)));
    }

    #[test]
    fn test_room_lookup_normalized() {
        let index = ConflictIndex::build(&[entry(1, "s1", "t1", " lab-a ", DayOfWeek::Monday, 1)]);
        assert!(index.is_room_busy("LAB-A", mon(1)));
    }
}
