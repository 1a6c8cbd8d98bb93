use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CoreError;

/// Which schedule family a grid belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ScheduleMode {
    /// Execution schedule (`PEL`).
    #[serde(rename = "PEL")]
    Execution,
    /// Dispatch schedule (`PEN`).
    #[serde(rename = "PEN")]
    Dispatch,
}

impl ScheduleMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Execution => "PEL",
            Self::Dispatch => "PEN",
        }
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "PEL" => Ok(Self::Execution),
            "PEN" => Ok(Self::Dispatch),
            _ => Err(CoreError::UnknownMode(s.to_string())),
        }
    }
}

impl fmt::Display for ScheduleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One editable grid instance: (mode, month, unit).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Scope {
    pub mode: ScheduleMode,
    pub month: u32,
    pub unit: String,
}

impl Scope {
    pub fn new(mode: ScheduleMode, month: u32, unit: impl Into<String>) -> Self {
        Self {
            mode,
            month,
            unit: unit.into(),
        }
    }

    pub fn cell(&self, row: usize, day: usize) -> CellKey {
        CellKey {
            scope: self.clone(),
            row,
            day,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}", self.mode, self.month, self.unit)
    }
}

/// Identity of one cell across sessions: `{mode}_{month}_{unit}_{row}_{day}`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CellKey {
    pub scope: Scope,
    pub row: usize,
    pub day: usize,
}

impl CellKey {
    pub fn belongs_to(&self, scope: &Scope) -> bool {
        self.scope == *scope
    }

    /// Parse the textual form. Unit names may themselves contain `_`, so the
    /// row and day are taken from the right.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        let malformed = || CoreError::MalformedKey(s.to_string());

        let mut tail = s.rsplitn(3, '_');
        let day = tail.next().and_then(|d| d.parse().ok()).ok_or_else(malformed)?;
        let row = tail.next().and_then(|r| r.parse().ok()).ok_or_else(malformed)?;
        let head = tail.next().ok_or_else(malformed)?;

        let mut parts = head.splitn(3, '_');
        let mode = ScheduleMode::parse(parts.next().ok_or_else(malformed)?)?;
        let month = parts.next().and_then(|m| m.parse().ok()).ok_or_else(malformed)?;
        let unit = parts.next().filter(|u| !u.is_empty()).ok_or_else(malformed)?;

        Ok(CellKey {
            scope: Scope::new(mode, month, unit),
            row,
            day,
        })
    }
}

impl fmt::Display for CellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}", self.scope, self.row, self.day)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_text_form_matches_scope_prefix() {
        let scope = Scope::new(ScheduleMode::Execution, 3, "GUDANG");
        let key = scope.cell(4, 17);
        assert_eq!(key.to_string(), "PEL_3_GUDANG_4_17");
        assert!(key.to_string().starts_with(&format!("{scope}_")));
    }

    #[test]
    fn parse_handles_underscores_in_unit() -> Result<(), CoreError> {
        let key = CellKey::parse("PEN_12_UNIT_A_B_0_30")?;
        assert_eq!(key.scope.mode, ScheduleMode::Dispatch);
        assert_eq!(key.scope.month, 12);
        assert_eq!(key.scope.unit, "UNIT_A_B");
        assert_eq!((key.row, key.day), (0, 30));
        Ok(())
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(CellKey::parse("PEL_3_GUDANG_x_1").is_err());
        assert!(CellKey::parse("XXX_3_GUDANG_1_1").is_err());
        assert!(CellKey::parse("PEL_3__1_1").is_err());
        assert!(CellKey::parse("1_1").is_err());
    }

    #[test]
    fn belongs_to_compares_whole_scope() {
        let a = Scope::new(ScheduleMode::Execution, 3, "A");
        let a1 = Scope::new(ScheduleMode::Execution, 3, "A1");
        assert!(a.cell(0, 0).belongs_to(&a));
        assert!(!a1.cell(0, 0).belongs_to(&a));
    }
}
