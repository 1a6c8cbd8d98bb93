use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use shiftgrid_core::{CellKey, Scope, ShiftValue};

/// Uncommitted cell values of the edit session, keyed by cell.
///
/// Persisted as a list of `(key, value)` pairs since msgpack maps want
/// string keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<(CellKey, ShiftValue)>", into = "Vec<(CellKey, ShiftValue)>")]
pub struct EditOverlay {
    entries: BTreeMap<CellKey, ShiftValue>,
}

impl From<Vec<(CellKey, ShiftValue)>> for EditOverlay {
    fn from(pairs: Vec<(CellKey, ShiftValue)>) -> Self {
        Self {
            entries: pairs.into_iter().collect(),
        }
    }
}

impl From<EditOverlay> for Vec<(CellKey, ShiftValue)> {
    fn from(overlay: EditOverlay) -> Self {
        overlay.entries.into_iter().collect()
    }
}

impl EditOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &CellKey) -> Option<&ShiftValue> {
        self.entries.get(key)
    }

    pub fn set(&mut self, key: CellKey, value: ShiftValue) {
        self.entries.insert(key, value);
    }

    pub fn contains(&self, key: &CellKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CellKey, &ShiftValue)> {
        self.entries.iter()
    }

    /// Drop every entry of `scope`, returning how many were removed.
    pub fn clear_scope(&mut self, scope: &Scope) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| !key.belongs_to(scope));
        before - self.entries.len()
    }

    /// Exchange the entries of rows `a` and `b` within `scope`.
    pub fn swap_rows(&mut self, scope: &Scope, a: usize, b: usize) {
        if a == b {
            return;
        }
        let moved: Vec<(CellKey, ShiftValue)> = self
            .entries
            .iter()
            .filter(|(key, _)| key.belongs_to(scope) && (key.row == a || key.row == b))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        for (key, _) in &moved {
            self.entries.remove(key);
        }
        for (mut key, value) in moved {
            key.row = if key.row == a { b } else { a };
            self.entries.insert(key, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shiftgrid_core::ScheduleMode;

    fn scope(unit: &str) -> Scope {
        Scope::new(ScheduleMode::Execution, 3, unit)
    }

    #[test]
    fn later_assignment_replaces_earlier() {
        let mut overlay = EditOverlay::new();
        let key = scope("A").cell(0, 1);
        overlay.set(key.clone(), "P".into());
        overlay.set(key.clone(), "S".into());
        assert_eq!(overlay.len(), 1);
        assert_eq!(overlay.get(&key), Some(&ShiftValue::from("S")));
    }

    #[test]
    fn clear_scope_leaves_other_scopes() {
        let mut overlay = EditOverlay::new();
        overlay.set(scope("A").cell(0, 0), "P".into());
        overlay.set(scope("A").cell(1, 2), "M".into());
        overlay.set(scope("B").cell(0, 0), "S".into());

        assert_eq!(overlay.clear_scope(&scope("A")), 2);
        assert_eq!(overlay.len(), 1);
        assert!(overlay.contains(&scope("B").cell(0, 0)));
    }

    #[test]
    fn swap_rows_moves_entries_both_ways() {
        let mut overlay = EditOverlay::new();
        overlay.set(scope("A").cell(0, 0), "P".into());
        overlay.set(scope("A").cell(2, 1), "M".into());
        overlay.set(scope("A").cell(1, 0), "OFF".into());

        overlay.swap_rows(&scope("A"), 0, 2);

        assert_eq!(overlay.get(&scope("A").cell(2, 0)), Some(&ShiftValue::from("P")));
        assert_eq!(overlay.get(&scope("A").cell(0, 1)), Some(&ShiftValue::from("M")));
        assert_eq!(overlay.get(&scope("A").cell(1, 0)), Some(&ShiftValue::from("OFF")));
        assert!(!overlay.contains(&scope("A").cell(0, 0)));
        assert_eq!(overlay.len(), 3);
    }

    #[test]
    fn persisted_as_pairs() {
        let mut overlay = EditOverlay::new();
        overlay.set(scope("A").cell(0, 0), "P".into());
        let pairs: Vec<(CellKey, ShiftValue)> = overlay.clone().into();
        assert_eq!(pairs.len(), 1);
        assert_eq!(EditOverlay::from(pairs), overlay);
    }
}
