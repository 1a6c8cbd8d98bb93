use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CoreError;

/// The closed set of shift codes a cell can be assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ShiftCode {
    /// Morning.
    P,
    /// Afternoon.
    S,
    /// Night.
    M,
    /// Afternoon and night combined.
    Sm,
    /// Twelve-hour day shift (weekends).
    P12,
    /// Twelve-hour night shift (weekends).
    M12,
    Off,
    /// Leave.
    Cuti,
}

impl ShiftCode {
    pub const ALL: [ShiftCode; 8] = [
        Self::P,
        Self::S,
        Self::M,
        Self::Sm,
        Self::P12,
        Self::M12,
        Self::Off,
        Self::Cuti,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::P => "P",
            Self::S => "S",
            Self::M => "M",
            Self::Sm => "SM",
            Self::P12 => "P12",
            Self::M12 => "M12",
            Self::Off => "OFF",
            Self::Cuti => "CUTI",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|code| code.as_str() == s)
    }
}

impl fmt::Display for ShiftCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single cell value. Anything the store hands back that is not a known code
/// is kept verbatim as `Other` so legacy data survives a round trip.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ShiftValue {
    #[default]
    Empty,
    Code(ShiftCode),
    Other(String),
}

impl ShiftValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, ShiftValue::Empty)
    }

    pub fn as_str(&self) -> &str {
        match self {
            ShiftValue::Empty => "",
            ShiftValue::Code(code) => code.as_str(),
            ShiftValue::Other(s) => s,
        }
    }

    pub fn as_code(&self) -> Option<ShiftCode> {
        match self {
            ShiftValue::Code(code) => Some(*code),
            _ => None,
        }
    }
}

impl From<ShiftCode> for ShiftValue {
    fn from(code: ShiftCode) -> Self {
        ShiftValue::Code(code)
    }
}

impl From<&str> for ShiftValue {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            return ShiftValue::Empty;
        }
        match ShiftCode::parse(s) {
            Some(code) => ShiftValue::Code(code),
            None => ShiftValue::Other(s.to_string()),
        }
    }
}

impl From<String> for ShiftValue {
    fn from(s: String) -> Self {
        if s.is_empty() {
            return ShiftValue::Empty;
        }
        match ShiftCode::parse(&s) {
            Some(code) => ShiftValue::Code(code),
            None => ShiftValue::Other(s),
        }
    }
}

impl From<ShiftValue> for String {
    fn from(value: ShiftValue) -> Self {
        match value {
            ShiftValue::Other(s) => s,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for ShiftValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DayCategory {
    Weekday,
    Weekend,
}

impl DayCategory {
    const WEEKEND_LABELS: [&'static str; 2] = ["SAB", "MIN"];

    /// Derive the category from the store's weekday label for a column.
    pub fn from_label(label: &str) -> Self {
        if Self::WEEKEND_LABELS.contains(&label.trim()) {
            DayCategory::Weekend
        } else {
            DayCategory::Weekday
        }
    }
}

/// Constraint profile narrowing which codes weekday cells may offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SubMode {
    #[default]
    #[serde(rename = "LENGKAP")]
    Lengkap,
    #[serde(rename = "PSM")]
    Psm,
    #[serde(rename = "P_SM")]
    PSm,
}

impl SubMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lengkap => "LENGKAP",
            Self::Psm => "PSM",
            Self::PSm => "P_SM",
        }
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "LENGKAP" => Ok(Self::Lengkap),
            "PSM" => Ok(Self::Psm),
            "P_SM" => Ok(Self::PSm),
            _ => Err(CoreError::InvalidData(format!("unknown sub-mode: {s}"))),
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Lengkap => "Mode Lengkap",
            Self::Psm => "Mode P, S, M",
            Self::PSm => "Mode P, SM",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes_parse_and_unknown_are_kept() {
        assert_eq!(ShiftValue::from("SM"), ShiftValue::Code(ShiftCode::Sm));
        assert_eq!(ShiftValue::from(""), ShiftValue::Empty);
        assert_eq!(ShiftValue::from("DL"), ShiftValue::Other("DL".into()));
        assert_eq!(ShiftValue::from("DL").as_str(), "DL");
    }

    #[test]
    fn equality_is_exact_string_match() {
        assert_ne!(ShiftValue::from("p"), ShiftValue::from("P"));
        assert_eq!(ShiftValue::from("OFF"), ShiftCode::Off.into());
    }

    #[test]
    fn weekend_labels() {
        assert_eq!(DayCategory::from_label("SAB"), DayCategory::Weekend);
        assert_eq!(DayCategory::from_label("MIN"), DayCategory::Weekend);
        assert_eq!(DayCategory::from_label("SEN"), DayCategory::Weekday);
        assert_eq!(DayCategory::from_label("JUM"), DayCategory::Weekday);
    }

    #[test]
    fn sub_mode_names_round_trip() -> Result<(), CoreError> {
        for mode in [SubMode::Lengkap, SubMode::Psm, SubMode::PSm] {
            assert_eq!(SubMode::parse(mode.as_str())?, mode);
        }
        assert!(SubMode::parse("FULL").is_err());
        Ok(())
    }
}
