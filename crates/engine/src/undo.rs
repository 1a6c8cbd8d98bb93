use std::collections::VecDeque;

use shiftgrid_core::{Scope, UndoEntry};

/// Undo and redo stacks for one edit session. Both grow without limit so
/// every edit of the session can be walked back.
#[derive(Default)]
pub struct UndoManager {
    undo_stack: VecDeque<UndoEntry>,
    redo_stack: VecDeque<UndoEntry>,
}

impl UndoManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted stacks, oldest entry first.
    pub fn restore(&mut self, undo: Vec<UndoEntry>, redo: Vec<UndoEntry>) {
        self.undo_stack = undo.into();
        self.redo_stack = redo.into();
    }

    /// Record a fresh edit. A new edit invalidates everything that could
    /// have been redone.
    pub fn record(&mut self, entry: UndoEntry) {
        self.push_undo(entry);
        self.clear_redo();
    }

    pub fn push_undo(&mut self, entry: UndoEntry) {
        self.undo_stack.push_back(entry);
    }

    pub fn pop_undo(&mut self) -> Option<UndoEntry> {
        self.undo_stack.pop_back()
    }

    pub fn push_redo(&mut self, entry: UndoEntry) {
        self.redo_stack.push_back(entry);
    }

    pub fn pop_redo(&mut self) -> Option<UndoEntry> {
        self.redo_stack.pop_back()
    }

    pub fn clear_redo(&mut self) {
        self.redo_stack.clear();
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn undo_entries(&self) -> &VecDeque<UndoEntry> {
        &self.undo_stack
    }

    pub fn redo_entries(&self) -> &VecDeque<UndoEntry> {
        &self.redo_stack
    }

    /// Follow a row swap in `scope` so undo still targets the same person.
    pub fn swap_rows(&mut self, scope: &Scope, a: usize, b: usize) {
        for entry in self.undo_stack.iter_mut().chain(self.redo_stack.iter_mut()) {
            if !entry.key.belongs_to(scope) {
                continue;
            }
            if entry.row == a {
                entry.move_to_row(b);
            } else if entry.row == b {
                entry.move_to_row(a);
            }
        }
    }
}
