//! Read-only projection of the session for rendering.

use shiftgrid_core::{
    DayCategory, GridSnapshot, ScheduleGrid, Scope, ShiftValue, SubMode, allowed_options,
};

use crate::overlay::EditOverlay;

/// Everything a cell widget needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellDescriptor {
    pub value: ShiftValue,
    pub category: DayCategory,
    /// Selectable values; empty when the cell is not editable.
    pub options: Vec<ShiftValue>,
    pub editable: bool,
    /// An uncommitted value is shown instead of the stored one.
    pub edited: bool,
}

pub struct GridView<'a> {
    pub grid: &'a ScheduleGrid,
    pub scope: &'a Scope,
    pub baseline: Option<&'a GridSnapshot>,
    pub overlay: &'a EditOverlay,
    pub sub_mode: SubMode,
    pub editing: bool,
}

impl GridView<'_> {
    /// Overlay value, else baseline value, else the loaded grid value.
    pub fn effective_value(&self, row: usize, day: usize) -> Option<ShiftValue> {
        if let Some(value) = self.overlay.get(&self.scope.cell(row, day)) {
            return Some(value.clone());
        }
        self.baseline
            .and_then(|b| b.cell(row, day))
            .or_else(|| self.grid.cell(row, day))
            .cloned()
    }

    pub fn cell(&self, row: usize, day: usize) -> Option<CellDescriptor> {
        self.grid.cell(row, day)?;
        let value = self.effective_value(row, day)?;
        let category = self.grid.day_category(day);
        let options = if self.editing {
            allowed_options(category, self.sub_mode, &value)
        } else {
            Vec::new()
        };
        Some(CellDescriptor {
            edited: self.overlay.contains(&self.scope.cell(row, day)),
            value,
            category,
            options,
            editable: self.editing,
        })
    }
}
