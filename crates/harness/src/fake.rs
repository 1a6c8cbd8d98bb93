use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use shiftgrid_core::{
    DayCategory, DerivedCounters, ScheduleGrid, ScheduleMode, Scope, ShiftCode, ShiftValue,
};
use shiftgrid_remote::{MonthOption, RemoteError, RemoteScheduleStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Action {
    ListMonths,
    ListUnits,
    FetchGrid,
    FetchCounters,
    SaveCell,
    SaveGrid,
    RenameRow,
    SwapRows,
}

/// A write the session sent, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    SaveCell {
        scope: Scope,
        row: usize,
        day: usize,
        value: ShiftValue,
    },
    SaveGrid {
        scope: Scope,
        rows: Vec<Vec<ShiftValue>>,
    },
    RenameRow {
        scope: Scope,
        row: usize,
        name: String,
    },
    SwapRows {
        scope: Scope,
        from: usize,
        to: usize,
    },
}

#[derive(Default)]
struct FakeState {
    grids: BTreeMap<Scope, ScheduleGrid>,
    units: Vec<String>,
    calls: Vec<RemoteCall>,
    failures: BTreeMap<Action, RemoteError>,
    hits: BTreeMap<Action, usize>,
    latency: BTreeMap<Action, Duration>,
    arrivals: BTreeMap<Action, usize>,
}

/// In-memory stand-in for the backend. Clones share state, so a test keeps
/// one handle to inspect while the session owns another.
#[derive(Clone, Default)]
pub struct FakeScheduleStore {
    state: Arc<Mutex<FakeState>>,
}

impl FakeScheduleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_grid(scope: Scope, grid: ScheduleGrid) -> Self {
        let store = Self::new();
        store.put_grid(scope, grid);
        store
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn put_grid(&self, scope: Scope, grid: ScheduleGrid) {
        let mut state = self.lock();
        if !state.units.contains(&scope.unit) {
            state.units.push(scope.unit.clone());
        }
        state.grids.insert(scope, grid);
    }

    pub fn grid(&self, scope: &Scope) -> Option<ScheduleGrid> {
        self.lock().grids.get(scope).cloned()
    }

    /// Day values of every row, as the backend currently holds them.
    pub fn rows(&self, scope: &Scope) -> Vec<Vec<ShiftValue>> {
        self.grid(scope)
            .map(|g| g.rows.into_iter().map(|r| r.days).collect())
            .unwrap_or_default()
    }

    pub fn cell(&self, scope: &Scope, row: usize, day: usize) -> Option<ShiftValue> {
        self.lock().grids.get(scope)?.cell(row, day).cloned()
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        self.lock().calls.clone()
    }

    pub fn saved_cells(&self) -> Vec<(usize, usize, ShiftValue)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                RemoteCall::SaveCell { row, day, value, .. } => Some((row, day, value)),
                _ => None,
            })
            .collect()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    pub fn hits(&self, action: Action) -> usize {
        self.lock().hits.get(&action).copied().unwrap_or(0)
    }

    /// Make every call of `action` fail with `error` until [`heal`](Self::heal).
    pub fn fail(&self, action: Action, error: RemoteError) {
        self.lock().failures.insert(action, error);
    }

    pub fn heal(&self, action: Action) {
        self.lock().failures.remove(&action);
    }

    /// Delay every other call of `action` (the first, third, ...) by
    /// `delay`, so a call sent later can overtake one sent earlier unless
    /// the caller waits in between.
    pub fn stagger(&self, action: Action, delay: Duration) {
        self.lock().latency.insert(action, delay);
    }

    async fn arrive(&self, action: Action) {
        let delay = {
            let mut state = self.lock();
            let arrivals = state.arrivals.entry(action).or_default();
            *arrivals += 1;
            let slow = *arrivals % 2 == 1;
            state.latency.get(&action).copied().filter(|_| slow)
        };
        match delay {
            Some(delay) => tokio::time::sleep(delay).await,
            None => tokio::task::yield_now().await,
        }
    }

    fn enter(&self, action: Action) -> Result<MutexGuard<'_, FakeState>, RemoteError> {
        let mut state = self.lock();
        *state.hits.entry(action).or_default() += 1;
        if let Some(error) = state.failures.get(&action).cloned() {
            return Err(error);
        }
        Ok(state)
    }
}

fn not_found(scope: &Scope) -> RemoteError {
    RemoteError::application(format!("no grid for {scope}"))
}

fn tally(grid: &ScheduleGrid) -> BTreeMap<usize, DerivedCounters> {
    grid.rows
        .iter()
        .enumerate()
        .map(|(idx, row)| {
            let mut counters = DerivedCounters::default();
            for (day, value) in row.days.iter().enumerate() {
                match value.as_code() {
                    Some(ShiftCode::Off) => counters.off += 1,
                    Some(ShiftCode::Cuti) => counters.leave += 1,
                    Some(_) if grid.day_category(day) == DayCategory::Weekend => {
                        counters.holiday += 1;
                        counters.worked += 1;
                    }
                    Some(_) => counters.worked += 1,
                    None => {}
                }
            }
            (idx, counters)
        })
        .collect()
}

#[async_trait]
impl RemoteScheduleStore for FakeScheduleStore {
    async fn list_months(&self, mode: ScheduleMode) -> Result<Vec<MonthOption>, RemoteError> {
        self.arrive(Action::ListMonths).await;
        let state = self.enter(Action::ListMonths)?;
        let months: BTreeSet<u32> = state
            .grids
            .keys()
            .filter(|s| s.mode == mode)
            .map(|s| s.month)
            .collect();
        Ok(months
            .into_iter()
            .map(|value| MonthOption {
                value,
                label: format!("Month {value}"),
            })
            .collect())
    }

    async fn list_units(&self) -> Result<Vec<String>, RemoteError> {
        self.arrive(Action::ListUnits).await;
        Ok(self.enter(Action::ListUnits)?.units.clone())
    }

    async fn fetch_grid(&self, scope: &Scope) -> Result<ScheduleGrid, RemoteError> {
        self.arrive(Action::FetchGrid).await;
        let state = self.enter(Action::FetchGrid)?;
        state.grids.get(scope).cloned().ok_or_else(|| not_found(scope))
    }

    async fn fetch_derived_counters(
        &self,
        scope: &Scope,
    ) -> Result<BTreeMap<usize, DerivedCounters>, RemoteError> {
        self.arrive(Action::FetchCounters).await;
        let state = self.enter(Action::FetchCounters)?;
        state.grids.get(scope).map(tally).ok_or_else(|| not_found(scope))
    }

    async fn save_cell(
        &self,
        scope: &Scope,
        row: usize,
        day: usize,
        value: &ShiftValue,
    ) -> Result<(), RemoteError> {
        self.arrive(Action::SaveCell).await;
        let mut state = self.enter(Action::SaveCell)?;
        state.calls.push(RemoteCall::SaveCell {
            scope: scope.clone(),
            row,
            day,
            value: value.clone(),
        });
        let cell = state
            .grids
            .get_mut(scope)
            .and_then(|g| g.rows.get_mut(row))
            .and_then(|r| r.days.get_mut(day))
            .ok_or_else(|| RemoteError::application("cell index out of range"))?;
        *cell = value.clone();
        Ok(())
    }

    async fn save_grid(&self, scope: &Scope, rows: &[Vec<ShiftValue>]) -> Result<(), RemoteError> {
        self.arrive(Action::SaveGrid).await;
        let mut state = self.enter(Action::SaveGrid)?;
        state.calls.push(RemoteCall::SaveGrid {
            scope: scope.clone(),
            rows: rows.to_vec(),
        });
        let grid = state.grids.get_mut(scope).ok_or_else(|| not_found(scope))?;
        for (target, days) in grid.rows.iter_mut().zip(rows) {
            target.days = days.clone();
        }
        Ok(())
    }

    async fn rename_row(&self, scope: &Scope, row: usize, new_name: &str) -> Result<(), RemoteError> {
        self.arrive(Action::RenameRow).await;
        let mut state = self.enter(Action::RenameRow)?;
        state.calls.push(RemoteCall::RenameRow {
            scope: scope.clone(),
            row,
            name: new_name.to_string(),
        });
        let target = state
            .grids
            .get_mut(scope)
            .and_then(|g| g.rows.get_mut(row))
            .ok_or_else(|| RemoteError::application("row index out of range"))?;
        target.name = new_name.to_string();
        Ok(())
    }

    async fn swap_rows(&self, scope: &Scope, from: usize, to: usize) -> Result<(), RemoteError> {
        self.arrive(Action::SwapRows).await;
        let mut state = self.enter(Action::SwapRows)?;
        state.calls.push(RemoteCall::SwapRows {
            scope: scope.clone(),
            from,
            to,
        });
        let grid = state.grids.get_mut(scope).ok_or_else(|| not_found(scope))?;
        grid.swap_rows(from, to)
            .map_err(|e| RemoteError::application(e.to_string()))
    }
}
