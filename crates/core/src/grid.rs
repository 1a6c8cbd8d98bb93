use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::shift::{DayCategory, ShiftValue};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonnelRow {
    pub display_order: u32,
    pub name: String,
    pub days: Vec<ShiftValue>,
}

/// All personnel rows of one scope plus the column headers the store sends.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScheduleGrid {
    pub title: String,
    pub unit_name: String,
    /// Weekday label per day column (`SEN`, ..., `SAB`, `MIN`).
    pub day_labels: Vec<String>,
    pub date_labels: Vec<String>,
    pub rows: Vec<PersonnelRow>,
}

impl ScheduleGrid {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn day_count(&self) -> usize {
        self.day_labels.len()
    }

    pub fn cell(&self, row: usize, day: usize) -> Option<&ShiftValue> {
        self.rows.get(row)?.days.get(day)
    }

    pub fn day_category(&self, day: usize) -> DayCategory {
        self.day_labels
            .get(day)
            .map(|label| DayCategory::from_label(label))
            .unwrap_or(DayCategory::Weekday)
    }

    /// Swap two rows and renumber their display order to match positions.
    pub fn swap_rows(&mut self, a: usize, b: usize) -> Result<(), CoreError> {
        let len = self.rows.len();
        if a >= len || b >= len {
            return Err(CoreError::OutOfRange { row: a.max(b), day: 0 });
        }
        self.rows.swap(a, b);
        self.rows[a].display_order = a as u32 + 1;
        self.rows[b].display_order = b as u32 + 1;
        Ok(())
    }
}

/// Per-row day values captured when an edit session starts. Immutable: the
/// only way to get a different snapshot is to build a new one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSnapshot {
    rows: Vec<Vec<ShiftValue>>,
}

impl GridSnapshot {
    pub fn capture(grid: &ScheduleGrid) -> Self {
        Self {
            rows: grid.rows.iter().map(|r| r.days.clone()).collect(),
        }
    }

    pub fn rows(&self) -> &[Vec<ShiftValue>] {
        &self.rows
    }

    pub fn cell(&self, row: usize, day: usize) -> Option<&ShiftValue> {
        self.rows.get(row)?.get(day)
    }

    pub fn with_rows_swapped(&self, a: usize, b: usize) -> Self {
        let mut rows = self.rows.clone();
        if a < rows.len() && b < rows.len() {
            rows.swap(a, b);
        }
        Self { rows }
    }
}

/// Server-computed per-row tallies shown next to each name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DerivedCounters {
    pub worked: u32,
    pub leave: u32,
    pub holiday: u32,
    pub off: u32,
}
