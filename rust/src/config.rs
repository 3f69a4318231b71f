//! Configuration types for the timetable generator.

use pyo3::prelude::*;

/// Tuning knobs for timetable generation.
#[pyclass]
#[derive(Clone, Debug)]
pub struct GeneratorConfig {
    /// Logging verbosity (0-3), see `logging`
    #[pyo3(get, set)]
    pub verbosity: u8,
    /// Backtrack budget; `None` means one backtrack per slot in the universe
    #[pyo3(get, set)]
    pub max_backtracks: Option<usize>,
    /// Prefer spreading a subject's periods evenly across working days
    #[pyo3(get, set)]
    pub spread_across_days: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            verbosity: 0,
            max_backtracks: None,
            spread_across_days: true,
        }
    }
}

impl GeneratorConfig {
    /// Backtrack budget for a universe of `total_slots` slots.
    pub fn backtrack_budget(&self, total_slots: usize) -> usize {
        self.max_backtracks.unwrap_or(total_slots)
    }
}

#[pymethods]
impl GeneratorConfig {
    #[new]
    #[pyo3(signature = (verbosity=None, max_backtracks=None, spread_across_days=None))]
    fn new(
        verbosity: Option<u8>,
        max_backtracks: Option<usize>,
        spread_across_days: Option<bool>,
    ) -> Self {
        let defaults = Self::default();
        Self {
            verbosity: verbosity.unwrap_or(defaults.verbosity),
            max_backtracks: max_backtracks.or(defaults.max_backtracks),
            spread_across_days: spread_across_days.unwrap_or(defaults.spread_across_days),
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "GeneratorConfig(verbosity={}, max_backtracks={:?}, spread_across_days={})",
            self.verbosity, self.max_backtracks, self.spread_across_days
        )
    }
}
