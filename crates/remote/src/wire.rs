//! JSON shapes of the backend API and their mapping onto core types.
//!
//! The backend is a spreadsheet script, so numbers arrive as strings about as
//! often as they arrive as numbers, and empty cells can be `null`.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;
use shiftgrid_core::{DerivedCounters, PersonnelRow, ScheduleGrid, ShiftValue};

use crate::MonthOption;
use crate::error::RemoteError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GridPayload {
    #[serde(default)]
    judul: String,
    #[serde(default)]
    unit_name: String,
    #[serde(default)]
    header_hari: Vec<Value>,
    #[serde(default)]
    header_tanggal: Vec<Value>,
    #[serde(default)]
    personil: Vec<PersonnelPayload>,
}

#[derive(Debug, Deserialize)]
struct PersonnelPayload {
    #[serde(default)]
    no: Value,
    #[serde(default)]
    nama: Value,
    #[serde(default)]
    jadwal: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct CountersPayload {
    #[serde(default)]
    hk: Value,
    #[serde(default)]
    hl: Value,
    #[serde(default)]
    hw: Value,
    #[serde(default)]
    off: Value,
}

fn text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn number(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn invalid(what: &str, e: impl std::fmt::Display) -> RemoteError {
    RemoteError::Network(format!("invalid {what} response: {e}"))
}

/// Turn a `{"success": false, "message": ...}` envelope into an error.
pub(crate) fn check_envelope(value: &Value) -> Result<(), RemoteError> {
    if let Some(false) = value.get("success").and_then(Value::as_bool) {
        let message = value
            .get("message")
            .map(text)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| "request rejected".to_string());
        return Err(RemoteError::Application { message });
    }
    Ok(())
}

pub(crate) fn parse_grid(value: Value) -> Result<ScheduleGrid, RemoteError> {
    if value.is_null() {
        return Err(RemoteError::application("grid not found"));
    }
    check_envelope(&value)?;
    let payload: GridPayload = serde_json::from_value(value).map_err(|e| invalid("grid", e))?;

    let rows = payload
        .personil
        .iter()
        .enumerate()
        .map(|(idx, p)| PersonnelRow {
            display_order: number(&p.no).unwrap_or(idx as u32 + 1),
            name: text(&p.nama),
            days: p.jadwal.iter().map(|cell| ShiftValue::from(text(cell))).collect(),
        })
        .collect();

    Ok(ScheduleGrid {
        title: payload.judul,
        unit_name: payload.unit_name,
        day_labels: payload.header_hari.iter().map(text).collect(),
        date_labels: payload.header_tanggal.iter().map(text).collect(),
        rows,
    })
}

pub(crate) fn parse_months(value: Value) -> Result<Vec<MonthOption>, RemoteError> {
    check_envelope(&value)?;
    let items = value
        .as_array()
        .ok_or_else(|| invalid("months", "expected an array"))?;
    items
        .iter()
        .map(|item| {
            let value = item
                .get("value")
                .and_then(number)
                .ok_or_else(|| invalid("months", "missing month value"))?;
            let label = item.get("label").map(text).unwrap_or_else(|| value.to_string());
            Ok(MonthOption { value, label })
        })
        .collect()
}

pub(crate) fn parse_units(value: Value) -> Result<Vec<String>, RemoteError> {
    check_envelope(&value)?;
    let items = value
        .as_array()
        .ok_or_else(|| invalid("units", "expected an array"))?;
    Ok(items.iter().map(text).filter(|u| !u.is_empty()).collect())
}

pub(crate) fn parse_counters(value: Value) -> Result<BTreeMap<usize, DerivedCounters>, RemoteError> {
    check_envelope(&value)?;
    let data = value.get("data").cloned().unwrap_or(Value::Null);

    let entries: Vec<(usize, Value)> = match data {
        Value::Array(items) => items.into_iter().enumerate().collect(),
        Value::Object(map) => map
            .into_iter()
            .filter_map(|(k, v)| k.parse().ok().map(|idx| (idx, v)))
            .collect(),
        Value::Null => Vec::new(),
        _ => return Err(invalid("counters", "unexpected data shape")),
    };

    let mut counters = BTreeMap::new();
    for (row, entry) in entries {
        if entry.is_null() {
            continue;
        }
        let payload: CountersPayload =
            serde_json::from_value(entry).map_err(|e| invalid("counters", e))?;
        counters.insert(
            row,
            DerivedCounters {
                worked: number(&payload.hk).unwrap_or(0),
                leave: number(&payload.hl).unwrap_or(0),
                holiday: number(&payload.hw).unwrap_or(0),
                off: number(&payload.off).unwrap_or(0),
            },
        );
    }
    Ok(counters)
}

pub(crate) fn parse_ack(value: Value) -> Result<(), RemoteError> {
    check_envelope(&value)
}
