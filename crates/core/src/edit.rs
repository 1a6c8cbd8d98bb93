use serde::{Deserialize, Serialize};

use crate::scope::CellKey;
use crate::shift::ShiftValue;

/// One reversible cell assignment. Undo writes `old_value` back, redo
/// writes `new_value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndoEntry {
    pub key: CellKey,
    pub old_value: ShiftValue,
    pub new_value: ShiftValue,
    pub row: usize,
    pub day: usize,
}

impl UndoEntry {
    pub fn new(key: CellKey, old_value: ShiftValue, new_value: ShiftValue) -> Self {
        let (row, day) = (key.row, key.day);
        Self {
            key,
            old_value,
            new_value,
            row,
            day,
        }
    }

    /// Point the entry at `row`, keeping its key in step.
    pub fn move_to_row(&mut self, row: usize) {
        self.row = row;
        self.key.row = row;
    }
}
