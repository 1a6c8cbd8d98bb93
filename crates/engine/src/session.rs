//! The edit session.
//!
//! Cell edits are optimistic: the overlay and undo stacks change first and
//! the remote save is queued behind any earlier ones. Row rename and swap are the
//! opposite: nothing changes locally until the remote store has accepted.
//! All session state is written through a [`PersistedSessionStore`] so a
//! restart resumes where it left off.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use shiftgrid_core::{
    DerivedCounters, GridSnapshot, ScheduleGrid, ScheduleMode, Scope, SessionId, ShiftValue,
    SubMode, UndoEntry,
};
use shiftgrid_remote::{MonthOption, RemoteScheduleStore};
use shiftgrid_storage::{PersistedSessionStore, StorageError, encode, load_slot, save_slot};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::EngineError;
use crate::notice::{Notice, Notifier};
use crate::overlay::EditOverlay;
use crate::saves::{CounterBoard, PendingSave, SaveQueue, publish_counters};
use crate::undo::UndoManager;
use crate::view::{CellDescriptor, GridView};

mod slot {
    pub const STATE: &str = "session.state";
    pub const SUB_MODE: &str = "session.sub_mode";
    pub const SCOPE: &str = "session.scope";
    pub const SESSION_ID: &str = "session.id";
    pub const BASELINE: &str = "session.baseline";
    pub const OVERLAY: &str = "session.overlay";
    pub const UNDO: &str = "session.undo";
    pub const REDO: &str = "session.redo";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SessionState {
    #[default]
    #[serde(rename = "VIEW")]
    View,
    #[serde(rename = "EDIT")]
    Edit,
}

// ============================================================================
// Sub-mode confirmation
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubModeChange {
    pub from: SubMode,
    pub to: SubMode,
}

impl SubModeChange {
    pub fn prompt(&self) -> String {
        format!(
            "Switch input mode from {} to {}? Weekday options change; values already entered are kept.",
            self.from.display_name(),
            self.to.display_name()
        )
    }
}

/// Asked before the sub-mode changes. Closures work as gates.
pub trait ConfirmGate {
    fn confirm(&self, change: &SubModeChange) -> bool;
}

impl<F> ConfirmGate for F
where
    F: Fn(&SubModeChange) -> bool,
{
    fn confirm(&self, change: &SubModeChange) -> bool {
        self(change)
    }
}

/// Gate with a fixed answer.
#[derive(Debug, Clone, Copy)]
pub struct AutoConfirm(pub bool);

impl ConfirmGate for AutoConfirm {
    fn confirm(&self, _change: &SubModeChange) -> bool {
        self.0
    }
}

// ============================================================================
// Write-through persistence
// ============================================================================

struct SessionPersistence {
    store: Box<dyn PersistedSessionStore + Send>,
    healthy: bool,
    notifier: Notifier,
}

impl SessionPersistence {
    fn read<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match load_slot(&*self.store, key) {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "discarding unreadable session slot");
                None
            }
        }
    }

    fn write<T: Serialize>(&mut self, key: &str, value: &T) {
        if !self.healthy {
            return;
        }
        if let Err(e) = save_slot(&mut *self.store, key, value) {
            self.degrade(key, e);
        }
    }

    /// Write several slots as one batch, so a failure cannot leave some of
    /// them updated and others stale.
    fn write_all(&mut self, slots: Vec<(&str, Result<Vec<u8>, StorageError>)>) {
        if !self.healthy {
            return;
        }
        let mut entries = Vec::with_capacity(slots.len());
        for (key, bytes) in slots {
            match bytes {
                Ok(bytes) => entries.push((key, bytes)),
                Err(e) => return self.degrade(key, e),
            }
        }
        if let Err(e) = self.store.set_many(&entries) {
            self.degrade("session", e);
        }
    }

    fn degrade(&mut self, key: &str, e: StorageError) {
        warn!(key, error = %e, "session store write failed, continuing in memory");
        self.healthy = false;
        self.notifier.send(Notice::PersistenceLost);
    }
}

// ============================================================================
// EditSession
// ============================================================================

pub struct EditSession {
    remote: Arc<dyn RemoteScheduleStore>,
    persistence: SessionPersistence,
    state: SessionState,
    sub_mode: SubMode,
    session_id: Option<SessionId>,
    scope: Option<Scope>,
    grid: Option<ScheduleGrid>,
    baseline: Option<GridSnapshot>,
    overlay: EditOverlay,
    undo: UndoManager,
    saves: SaveQueue,
    counters: Arc<watch::Sender<CounterBoard>>,
    notifier: Notifier,
    notices: Option<mpsc::UnboundedReceiver<Notice>>,
}

impl EditSession {
    /// Build a session over `store`, resuming whatever it holds.
    pub fn restore(
        remote: Arc<dyn RemoteScheduleStore>,
        store: Box<dyn PersistedSessionStore + Send>,
    ) -> Self {
        let (notifier, notices) = Notifier::channel();
        let counters = Arc::new(watch::channel(CounterBoard::default()).0);
        let saves = SaveQueue::new(Arc::clone(&remote), Arc::clone(&counters), notifier.clone());
        let mut session = Self {
            remote,
            persistence: SessionPersistence {
                store,
                healthy: true,
                notifier: notifier.clone(),
            },
            state: SessionState::View,
            sub_mode: SubMode::Lengkap,
            session_id: None,
            scope: None,
            grid: None,
            baseline: None,
            overlay: EditOverlay::new(),
            undo: UndoManager::new(),
            saves,
            counters,
            notifier,
            notices: Some(notices),
        };
        session.rehydrate();
        session
    }

    fn rehydrate(&mut self) {
        let p = &self.persistence;
        let state: SessionState = p.read(slot::STATE).unwrap_or_default();
        self.sub_mode = p.read(slot::SUB_MODE).unwrap_or_default();
        self.scope = p.read(slot::SCOPE);
        self.session_id = p.read(slot::SESSION_ID);
        self.baseline = p.read(slot::BASELINE);
        self.overlay = p.read(slot::OVERLAY).unwrap_or_default();
        let undo: Vec<UndoEntry> = p.read(slot::UNDO).unwrap_or_default();
        let redo: Vec<UndoEntry> = p.read(slot::REDO).unwrap_or_default();
        self.undo.restore(undo, redo);

        if state != SessionState::Edit {
            if !self.overlay.is_empty() || self.undo.undo_depth() > 0 {
                warn!(edits = self.overlay.len(), "discarding edits stored outside an edit session");
                self.overlay = EditOverlay::new();
                self.undo.clear();
            }
            return;
        }
        if self.scope.is_none() || self.baseline.is_none() {
            warn!("persisted edit session is incomplete, starting in view mode");
            self.close_session();
            return;
        }
        self.state = SessionState::Edit;
        info!(
            session = ?self.session_id,
            scope = ?self.scope,
            edits = self.overlay.len(),
            undo = self.undo.undo_depth(),
            "resumed edit session"
        );
    }

    fn edit_slots(&self) -> Vec<(&'static str, Result<Vec<u8>, StorageError>)> {
        vec![
            (slot::OVERLAY, encode(&self.overlay)),
            (slot::UNDO, encode(self.undo.undo_entries())),
            (slot::REDO, encode(self.undo.redo_entries())),
        ]
    }

    fn persist_edits(&mut self) {
        let slots = self.edit_slots();
        self.persistence.write_all(slots);
    }

    fn persist_all(&mut self) {
        let mut slots = vec![
            (slot::STATE, encode(&self.state)),
            (slot::SUB_MODE, encode(&self.sub_mode)),
            (slot::SCOPE, encode(&self.scope)),
            (slot::SESSION_ID, encode(&self.session_id)),
            (slot::BASELINE, encode(&self.baseline)),
        ];
        slots.extend(self.edit_slots());
        self.persistence.write_all(slots);
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_editing(&self) -> bool {
        self.state == SessionState::Edit
    }

    pub fn sub_mode(&self) -> SubMode {
        self.sub_mode
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.session_id
    }

    pub fn scope(&self) -> Option<&Scope> {
        self.scope.as_ref()
    }

    pub fn grid(&self) -> Option<&ScheduleGrid> {
        self.grid.as_ref()
    }

    pub fn baseline(&self) -> Option<&GridSnapshot> {
        self.baseline.as_ref()
    }

    pub fn overlay(&self) -> &EditOverlay {
        &self.overlay
    }

    pub fn can_undo(&self) -> bool {
        self.undo.undo_depth() > 0
    }

    pub fn can_redo(&self) -> bool {
        self.undo.redo_depth() > 0
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.undo_depth()
    }

    pub fn redo_depth(&self) -> usize {
        self.undo.redo_depth()
    }

    /// Whether session state currently survives a restart.
    pub fn is_persistent(&self) -> bool {
        self.persistence.healthy && self.persistence.store.is_durable()
    }

    /// The notice stream. Handed out once.
    pub fn take_notices(&mut self) -> Option<mpsc::UnboundedReceiver<Notice>> {
        self.notices.take()
    }

    pub fn view(&self) -> Option<GridView<'_>> {
        Some(GridView {
            grid: self.grid.as_ref()?,
            scope: self.scope.as_ref()?,
            baseline: self.baseline.as_ref(),
            overlay: &self.overlay,
            sub_mode: self.sub_mode,
            editing: self.is_editing(),
        })
    }

    pub fn effective_value(&self, row: usize, day: usize) -> Option<ShiftValue> {
        self.view()?.effective_value(row, day)
    }

    pub fn cell_view(&self, row: usize, day: usize) -> Option<CellDescriptor> {
        self.view()?.cell(row, day)
    }

    /// Counters for the current scope; empty until a refresh has landed.
    pub fn counters(&self) -> BTreeMap<usize, DerivedCounters> {
        let board = self.counters.borrow();
        if board.scope.is_some() && board.scope == self.scope {
            board.rows.clone()
        } else {
            BTreeMap::new()
        }
    }

    pub fn subscribe_counters(&self) -> watch::Receiver<CounterBoard> {
        self.counters.subscribe()
    }

    fn loaded(&self) -> Result<(&Scope, &ScheduleGrid), EngineError> {
        match (&self.scope, &self.grid) {
            (Some(scope), Some(grid)) => Ok((scope, grid)),
            (Some(scope), None) => Err(EngineError::GridNotLoaded(scope.to_string())),
            _ => Err(EngineError::GridNotLoaded("no scope selected".to_string())),
        }
    }

    // ========================================================================
    // Loading
    // ========================================================================

    pub async fn list_months(&self, mode: ScheduleMode) -> Result<Vec<MonthOption>, EngineError> {
        Ok(self.remote.list_months(mode).await?)
    }

    pub async fn list_units(&self) -> Result<Vec<String>, EngineError> {
        Ok(self.remote.list_units().await?)
    }

    /// Fetch the grid for `scope` and make it current. While editing, only
    /// the scope under edit may be loaded.
    pub async fn load(&mut self, scope: Scope) -> Result<&ScheduleGrid, EngineError> {
        if self.is_editing()
            && let Some(active) = &self.scope
            && *active != scope
        {
            return Err(EngineError::ScopeLocked {
                active: active.to_string(),
            });
        }

        let grid = self.remote.fetch_grid(&scope).await?;
        debug!(scope = %scope, rows = grid.row_count(), days = grid.day_count(), "grid loaded");

        if self.scope.as_ref() != Some(&scope) {
            self.scope = Some(scope);
            self.persistence.write(slot::SCOPE, &self.scope);
        }
        let _ = self.refresh_counters();
        Ok(&*self.grid.insert(grid))
    }

    /// Re-fetch derived counters for the current scope in the background.
    pub fn refresh_counters(&self) -> Option<JoinHandle<()>> {
        let scope = self.scope.clone()?;
        let remote = Arc::clone(&self.remote);
        let board = Arc::clone(&self.counters);
        Some(tokio::spawn(async move {
            publish_counters(remote.as_ref(), scope, &board).await;
        }))
    }

    async fn reload(&mut self) {
        let Some(scope) = self.scope.clone() else {
            return;
        };
        match self.remote.fetch_grid(&scope).await {
            Ok(grid) => {
                self.grid = Some(grid);
                let _ = self.refresh_counters();
            }
            Err(e) => {
                warn!(scope = %scope, error = %e, "grid reload failed");
                self.notifier.send(Notice::ReloadFailed {
                    message: e.to_string(),
                });
            }
        }
    }

    // ========================================================================
    // Edit lifecycle
    // ========================================================================

    pub fn enter_edit(&mut self, scope: &Scope) -> Result<(), EngineError> {
        if self.is_editing() {
            debug!(session = ?self.session_id, "already editing");
            return Ok(());
        }
        let grid = match (&self.scope, &self.grid) {
            (Some(loaded), Some(grid)) if loaded == scope => grid,
            _ => return Err(EngineError::GridNotLoaded(scope.to_string())),
        };

        let id = SessionId::new();
        self.baseline = Some(GridSnapshot::capture(grid));
        self.sub_mode = SubMode::Lengkap;
        self.state = SessionState::Edit;
        self.session_id = Some(id);
        let stale = self.overlay.clear_scope(scope);
        if stale > 0 {
            warn!(stale, scope = %scope, "dropping edits left over from a closed session");
        }
        self.undo.clear();
        self.persist_all();

        info!(session = %id, scope = %scope, "edit session started");
        self.notifier.send(Notice::EditStarted { session: id });
        Ok(())
    }

    /// Assign `value` to a cell. Ignored outside an edit session.
    pub fn change_cell(
        &mut self,
        row: usize,
        day: usize,
        value: impl Into<ShiftValue>,
    ) -> Result<Option<PendingSave>, EngineError> {
        if !self.is_editing() {
            debug!(row, day, "not editing, change ignored");
            return Ok(None);
        }
        let (Some(scope), Some(baseline)) = (self.scope.clone(), self.baseline.as_ref()) else {
            return Ok(None);
        };
        let Some(base_value) = baseline.cell(row, day) else {
            return Err(EngineError::Validation(format!(
                "cell ({row}, {day}) is outside the grid"
            )));
        };

        let key = scope.cell(row, day);
        let value = value.into();
        let old_value = self.overlay.get(&key).unwrap_or(base_value).clone();
        self.undo.record(UndoEntry::new(key.clone(), old_value, value.clone()));
        self.overlay.set(key, value.clone());
        self.persist_edits();

        debug!(row, day, value = value.as_str(), "cell changed");
        Ok(Some(self.saves.push(scope, row, day, value)))
    }

    pub fn undo(&mut self) -> Option<PendingSave> {
        if !self.is_editing() {
            return None;
        }
        let entry = self.undo.pop_undo()?;
        self.overlay.set(entry.key.clone(), entry.old_value.clone());
        self.undo.push_redo(entry.clone());
        self.persist_edits();

        debug!(row = entry.row, day = entry.day, value = entry.old_value.as_str(), "undo");
        Some(self.saves.push(entry.key.scope, entry.row, entry.day, entry.old_value))
    }

    pub fn redo(&mut self) -> Option<PendingSave> {
        if !self.is_editing() {
            return None;
        }
        let entry = self.undo.pop_redo()?;
        self.overlay.set(entry.key.clone(), entry.new_value.clone());
        self.undo.push_undo(entry.clone());
        self.persist_edits();

        debug!(row = entry.row, day = entry.day, value = entry.new_value.as_str(), "redo");
        Some(self.saves.push(entry.key.scope, entry.row, entry.day, entry.new_value))
    }

    /// Change which weekday codes are offered. Returns whether the change
    /// was applied.
    pub fn set_sub_mode(&mut self, mode: SubMode, gate: impl ConfirmGate) -> bool {
        if mode == self.sub_mode {
            return false;
        }
        let change = SubModeChange {
            from: self.sub_mode,
            to: mode,
        };
        if !gate.confirm(&change) {
            debug!(from = change.from.as_str(), to = change.to.as_str(), "sub-mode change declined");
            return false;
        }
        self.sub_mode = mode;
        self.persistence.write(slot::SUB_MODE, &self.sub_mode);
        debug!(sub_mode = mode.as_str(), "sub-mode changed");
        self.notifier.send(Notice::SubModeChanged(mode));
        true
    }

    /// Accept every edit of the session. Cell values are already on their
    /// way to the remote; this waits for them, drops local edit state and
    /// reloads.
    pub async fn save(&mut self) {
        if !self.is_editing() {
            debug!("save outside an edit session ignored");
            return;
        }
        self.saves.drain().await;
        let session = self.session_id;
        let edits = self.overlay.len();
        self.close_session();
        info!(session = ?session, edits, "edit session committed");
        self.notifier.send(Notice::Committed);
        self.reload().await;
    }

    /// Roll the remote grid back to the baseline, then close the session.
    /// A failed rollback is reported and the session closes anyway.
    pub async fn cancel(&mut self) {
        if !self.is_editing() {
            debug!("cancel outside an edit session ignored");
            return;
        }
        // A save landing after the rollback would overwrite it.
        self.saves.drain().await;
        if let (Some(scope), Some(baseline)) = (&self.scope, &self.baseline)
            && let Err(e) = self.remote.save_grid(scope, baseline.rows()).await
        {
            warn!(scope = %scope, error = %e, "rollback to baseline failed");
            self.notifier.send(Notice::RollbackFailed {
                message: e.to_string(),
            });
        }
        let session = self.session_id;
        self.close_session();
        info!(session = ?session, "edit session cancelled");
        self.notifier.send(Notice::Cancelled);
        self.reload().await;
    }

    fn close_session(&mut self) {
        if let Some(scope) = &self.scope {
            self.overlay.clear_scope(scope);
        }
        self.undo.clear();
        self.baseline = None;
        self.session_id = None;
        self.state = SessionState::View;
        self.sub_mode = SubMode::Lengkap;
        self.persist_all();
    }

    // ========================================================================
    // Row operations (remote first)
    // ========================================================================

    /// Rename a row. Returns `false` when the name is unchanged and nothing
    /// was sent.
    pub async fn rename_row(&mut self, row: usize, new_name: &str) -> Result<bool, EngineError> {
        let name = new_name.trim();
        if name.is_empty() {
            return Err(EngineError::Validation("name must not be empty".to_string()));
        }
        let (scope, grid) = self.loaded()?;
        let current = grid
            .rows
            .get(row)
            .ok_or_else(|| EngineError::Validation(format!("row {row} is outside the grid")))?;
        if current.name == name {
            return Ok(false);
        }
        let scope = scope.clone();

        self.remote.rename_row(&scope, row, name).await?;

        if let Some(target) = self.grid.as_mut().and_then(|g| g.rows.get_mut(row)) {
            target.name = name.to_string();
        }
        info!(scope = %scope, row, "row renamed");
        Ok(true)
    }

    /// Exchange two rows. During an edit session the baseline, overlay and
    /// undo history follow the rows so they keep describing the same people.
    pub async fn swap_rows(&mut self, from: usize, to: usize) -> Result<(), EngineError> {
        if from == to {
            return Err(EngineError::Validation("cannot swap a row with itself".to_string()));
        }
        let (scope, grid) = self.loaded()?;
        let count = grid.row_count();
        if from >= count || to >= count {
            return Err(EngineError::Validation(format!(
                "rows ({from}, {to}) are outside the grid of {count}"
            )));
        }
        let scope = scope.clone();

        // Queued saves address rows by position.
        self.saves.drain().await;
        self.remote.swap_rows(&scope, from, to).await?;

        if let Some(grid) = self.grid.as_mut() {
            grid.swap_rows(from, to)?;
        }
        if self.is_editing() {
            self.baseline = self.baseline.as_ref().map(|b| b.with_rows_swapped(from, to));
            self.overlay.swap_rows(&scope, from, to);
            self.undo.swap_rows(&scope, from, to);
            let mut slots = vec![(slot::BASELINE, encode(&self.baseline))];
            slots.extend(self.edit_slots());
            self.persistence.write_all(slots);
        }
        let _ = self.refresh_counters();
        info!(scope = %scope, from, to, "rows swapped");
        Ok(())
    }

    pub async fn move_row_up(&mut self, row: usize) -> Result<(), EngineError> {
        if row == 0 {
            return Err(EngineError::Validation("first row cannot move up".to_string()));
        }
        self.swap_rows(row, row - 1).await
    }

    pub async fn move_row_down(&mut self, row: usize) -> Result<(), EngineError> {
        let next = row
            .checked_add(1)
            .ok_or_else(|| EngineError::Validation("last row cannot move down".to_string()))?;
        self.swap_rows(row, next).await
    }
}
