use std::sync::{Arc, Mutex, PoisonError};

use shiftgrid_core::{PersonnelRow, ScheduleGrid, ScheduleMode, Scope, ShiftValue};
use shiftgrid_engine::{EditSession, EngineError, Notice};
use shiftgrid_storage::{MemorySessionStore, PersistedSessionStore, StorageError};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::fake::FakeScheduleStore;

const WEEK: [&str; 7] = ["SEN", "SEL", "RAB", "KAM", "JUM", "SAB", "MIN"];

pub fn test_scope() -> Scope {
    Scope::new(ScheduleMode::Execution, 3, "GUDANG")
}

/// Grid with one row per entry of `rows`. Day labels follow the week
/// starting on Monday, so day 5 and 6 are weekend days.
pub fn grid(rows: &[&[&str]]) -> ScheduleGrid {
    let days = rows.iter().map(|r| r.len()).max().unwrap_or(0);
    ScheduleGrid {
        title: "JADWAL TEST".into(),
        unit_name: "GUDANG".into(),
        day_labels: (0..days).map(|d| WEEK[d % 7].to_string()).collect(),
        date_labels: (1..=days).map(|d| d.to_string()).collect(),
        rows: rows
            .iter()
            .enumerate()
            .map(|(idx, days)| PersonnelRow {
                display_order: idx as u32 + 1,
                name: format!("Person {}", idx + 1),
                days: days.iter().map(|v| ShiftValue::from(*v)).collect(),
            })
            .collect(),
    }
}

pub fn values(row: &[&str]) -> Vec<ShiftValue> {
    row.iter().map(|v| ShiftValue::from(*v)).collect()
}

/// Session store whose every operation fails.
pub struct UnavailableStore;

impl PersistedSessionStore for UnavailableStore {
    fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Err(StorageError::Unavailable("storage disabled".into()))
    }

    fn set(&mut self, _key: &str, _value: &[u8]) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("storage disabled".into()))
    }

    fn remove(&mut self, _key: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("storage disabled".into()))
    }

    fn is_durable(&self) -> bool {
        true
    }
}

/// Memory store that refuses writes once its allowance is spent. Batches
/// are written slot by slot, like a store without transactions, so a batch
/// can fail halfway.
#[derive(Clone, Default)]
pub struct RationedStore {
    inner: MemorySessionStore,
    allowance: Arc<Mutex<Option<usize>>>,
}

impl RationedStore {
    pub fn new(inner: MemorySessionStore) -> Self {
        Self {
            inner,
            allowance: Arc::default(),
        }
    }

    /// Accept `writes` more writes, then fail every one after.
    pub fn allow_writes(&self, writes: usize) {
        *self.allowance.lock().unwrap_or_else(PoisonError::into_inner) = Some(writes);
    }

    fn spend(&self) -> Result<(), StorageError> {
        let mut allowance = self.allowance.lock().unwrap_or_else(PoisonError::into_inner);
        match allowance.as_mut() {
            Some(0) => Err(StorageError::Unavailable("write allowance spent".into())),
            Some(left) => {
                *left -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl PersistedSessionStore for RationedStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        self.inner.get(key)
    }

    fn set(&mut self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        self.spend()?;
        self.inner.set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.spend()?;
        self.inner.remove(key)
    }

    fn is_durable(&self) -> bool {
        true
    }
}

/// An edit session wired to a fake backend and a shared in-memory store.
pub struct TestSession {
    pub remote: FakeScheduleStore,
    pub store: MemorySessionStore,
    pub session: EditSession,
    notices: UnboundedReceiver<Notice>,
}

impl TestSession {
    pub fn new(remote: FakeScheduleStore, store: MemorySessionStore) -> Self {
        let mut session = EditSession::restore(Arc::new(remote.clone()), Box::new(store.clone()));
        let notices = session
            .take_notices()
            .unwrap_or_else(|| tokio::sync::mpsc::unbounded_channel().1);
        Self {
            remote,
            store,
            session,
            notices,
        }
    }

    /// Backend holding `rows` under [`test_scope`], grid loaded.
    pub async fn loaded(rows: &[&[&str]]) -> Result<Self, EngineError> {
        let remote = FakeScheduleStore::with_grid(test_scope(), grid(rows));
        let mut fixture = Self::new(remote, MemorySessionStore::new());
        fixture.session.load(test_scope()).await?;
        Ok(fixture)
    }

    /// Like [`loaded`](Self::loaded), already in an edit session.
    pub async fn editing(rows: &[&[&str]]) -> Result<Self, EngineError> {
        let mut fixture = Self::loaded(rows).await?;
        fixture.session.enter_edit(&test_scope())?;
        fixture.remote.clear_calls();
        Ok(fixture)
    }

    /// Simulate a restart: a fresh session over the same store and backend.
    pub async fn reopen(self) -> Result<Self, EngineError> {
        let mut fixture = Self::new(self.remote, self.store);
        if let Some(scope) = fixture.session.scope().cloned() {
            fixture.session.load(scope).await?;
        }
        Ok(fixture)
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        let mut out = Vec::new();
        while let Ok(notice) = self.notices.try_recv() {
            out.push(notice);
        }
        out
    }

    /// Effective values of a whole row.
    pub fn row(&self, row: usize) -> Vec<ShiftValue> {
        let days = self.session.grid().map(|g| g.day_count()).unwrap_or(0);
        (0..days)
            .filter_map(|day| self.session.effective_value(row, day))
            .collect()
    }
}
