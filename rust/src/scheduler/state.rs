//! Placement stack for generation with rollback.

use rustc_hash::FxHashMap;

use crate::error::ConflictResource;
use crate::models::{DayOfWeek, Slot, TimeTableEntry};

use super::conflict_index::{normalize_room, ConflictIndex};

/// A committed placement that can be undone.
#[derive(Clone, Debug)]
pub struct Placement {
    /// Position of the task in the work list
    pub task_position: usize,
    /// Requirement the task belongs to
    pub requirement: usize,
    /// Index of the chosen slot in the slot universe
    pub universe_index: usize,
    pub entry: TimeTableEntry,
}

/// In-progress generation state.
///
/// Every committed placement is recorded in the conflict index, so later
/// tasks see it; undoing a placement releases it again. Placements are only
/// ever undone from the top of the stack.
#[derive(Clone, Debug)]
pub struct PlacementState {
    index: ConflictIndex,
    stack: Vec<Placement>,
    /// (requirement, day) -> periods placed on that day
    day_counts: FxHashMap<(usize, DayOfWeek), u8>,
}

impl PlacementState {
    pub fn new(index: ConflictIndex) -> Self {
        Self {
            index,
            stack: Vec::new(),
            day_counts: FxHashMap::default(),
        }
    }

    pub fn index(&self) -> &ConflictIndex {
        &self.index
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn placements(&self) -> &[Placement] {
        &self.stack
    }

    pub fn day_count(&self, requirement: usize, day: DayOfWeek) -> u8 {
        self.day_counts.get(&(requirement, day)).copied().unwrap_or(0)
    }

    pub fn commit(&mut self, placement: Placement) {
        self.index.record(&placement.entry);
        *self
            .day_counts
            .entry((placement.requirement, placement.entry.day_of_week))
            .or_insert(0) += 1;
        self.stack.push(placement);
    }

    pub fn undo_last(&mut self) -> Option<Placement> {
        let placement = self.stack.pop()?;
        self.index.release(&placement.entry);
        if let Some(count) = self
            .day_counts
            .get_mut(&(placement.requirement, placement.entry.day_of_week))
        {
            *count = count.saturating_sub(1);
        }
        Some(placement)
    }

    /// Undo placements until the stack holds `depth` of them.
    pub fn rollback_to(&mut self, depth: usize) -> Vec<Placement> {
        let mut undone = Vec::new();
        while self.stack.len() > depth {
            match self.undo_last() {
                Some(p) => undone.push(p),
                None => break,
            }
        }
        undone
    }

    /// Stack depth of the placement holding `resource` at `slot`, if any.
    /// `None` means the slot is held by an entry from outside this run.
    pub fn holder_of(&self, resource: &ConflictResource, slot: Slot) -> Option<usize> {
        self.stack.iter().position(|p| {
            p.entry.slot() == slot
                && match resource {
                    ConflictResource::Teacher(id) => p.entry.teacher_id == *id,
                    ConflictResource::Section(id) => p.entry.section_id == *id,
                    ConflictResource::Room(room) => {
                        normalize_room(&p.entry.room_number) == normalize_room(room)
                    }
                }
        })
    }

    /// Placed entries in slot-universe order.
    pub fn into_entries(mut self) -> Vec<TimeTableEntry> {
        self.stack.sort_by_key(|p| p.universe_index);
        self.stack.into_iter().map(|p| p.entry).collect()
    }
}
