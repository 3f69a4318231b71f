//! Placement ordering for timetable generation.
//!
//! Requirements are expanded into one task per weekly period and ordered
//! most-constrained-first: subjects needing the most slots are placed before
//! lighter ones, which keeps backtracking rare.

use std::cmp::Ordering;

use crate::models::SubjectRequirement;

/// One weekly period of one requirement, waiting to be placed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlacementTask {
    /// Index into the requirement slice the work list was built from.
    pub requirement: usize,
    /// Which of the requirement's weekly periods this is (0-based).
    pub occurrence: u8,
}

/// Sort key for placement tasks (lower = placed earlier).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlacementKey {
    pub weekly_periods: u8,
    pub requirement: usize,
    pub occurrence: u8,
}

impl Ord for PlacementKey {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .weekly_periods
            .cmp(&self.weekly_periods)
            .then(self.requirement.cmp(&other.requirement))
            .then(self.occurrence.cmp(&other.occurrence))
    }
}

impl PartialOrd for PlacementKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Expand requirements into an ordered work list.
///
/// Ties on `weekly_periods` keep the input order, so the result is fully
/// determined by the requirement slice.
pub fn build_work_list(requirements: &[SubjectRequirement]) -> Vec<PlacementTask> {
    let mut keys: Vec<PlacementKey> = requirements
        .iter()
        .enumerate()
        .flat_map(|(idx, req)| {
            (0..req.weekly_periods).map(move |occurrence| PlacementKey {
                weekly_periods: req.weekly_periods,
                requirement: idx,
                occurrence,
            })
        })
        .collect();

    keys.sort();

    keys.into_iter()
        .map(|k| PlacementTask {
            requirement: k.requirement,
            occurrence: k.occurrence,
        })
        .collect()
}
