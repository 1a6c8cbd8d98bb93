//! Boundary to the canonical schedule store.
//!
//! The edit session only ever talks to [`RemoteScheduleStore`]; how requests
//! travel is the implementor's business. [`HttpScheduleStore`] speaks the
//! backend's action-style HTTP API.

mod error;
mod http;
mod wire;

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shiftgrid_core::{DerivedCounters, ScheduleGrid, ScheduleMode, Scope, ShiftValue};

pub use error::RemoteError;
pub use http::{HttpOptions, HttpScheduleStore};

/// A month the backend has a grid for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthOption {
    pub value: u32,
    pub label: String,
}

#[async_trait]
pub trait RemoteScheduleStore: Send + Sync {
    async fn list_months(&self, mode: ScheduleMode) -> Result<Vec<MonthOption>, RemoteError>;

    async fn list_units(&self) -> Result<Vec<String>, RemoteError>;

    async fn fetch_grid(&self, scope: &Scope) -> Result<ScheduleGrid, RemoteError>;

    /// Per-row tallies keyed by row index. Computed server-side.
    async fn fetch_derived_counters(
        &self,
        scope: &Scope,
    ) -> Result<BTreeMap<usize, DerivedCounters>, RemoteError>;

    async fn save_cell(
        &self,
        scope: &Scope,
        row: usize,
        day: usize,
        value: &ShiftValue,
    ) -> Result<(), RemoteError>;

    /// Overwrite every row's days in one call.
    async fn save_grid(&self, scope: &Scope, rows: &[Vec<ShiftValue>]) -> Result<(), RemoteError>;

    async fn rename_row(&self, scope: &Scope, row: usize, new_name: &str)
    -> Result<(), RemoteError>;

    async fn swap_rows(&self, scope: &Scope, from: usize, to: usize) -> Result<(), RemoteError>;
}
