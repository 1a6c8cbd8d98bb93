//! Which values a cell may offer, by day category and sub-mode.

use crate::shift::{DayCategory, ShiftCode, ShiftValue, SubMode};

const WEEKEND: &[ShiftCode] = &[ShiftCode::P12, ShiftCode::M12, ShiftCode::Off, ShiftCode::Cuti];

const WEEKDAY_FULL: &[ShiftCode] = &[
    ShiftCode::P,
    ShiftCode::S,
    ShiftCode::M,
    ShiftCode::Sm,
    ShiftCode::Off,
    ShiftCode::Cuti,
];

// SM dropped: afternoon and night are assigned separately.
const WEEKDAY_PSM: &[ShiftCode] = &[
    ShiftCode::P,
    ShiftCode::S,
    ShiftCode::M,
    ShiftCode::Off,
    ShiftCode::Cuti,
];

// S and M dropped in favour of the combined SM.
const WEEKDAY_P_SM: &[ShiftCode] = &[ShiftCode::P, ShiftCode::Sm, ShiftCode::Off, ShiftCode::Cuti];

pub fn base_codes(category: DayCategory, sub_mode: SubMode) -> &'static [ShiftCode] {
    match (category, sub_mode) {
        (DayCategory::Weekend, _) => WEEKEND,
        (DayCategory::Weekday, SubMode::Lengkap) => WEEKDAY_FULL,
        (DayCategory::Weekday, SubMode::Psm) => WEEKDAY_PSM,
        (DayCategory::Weekday, SubMode::PSm) => WEEKDAY_P_SM,
    }
}

/// Selectable values for a cell, empty option first.
///
/// A current value the profile would not offer (legacy data, or a code from
/// another profile) is slotted in right after the empty option so the cell
/// can still display it without forcing a change.
pub fn allowed_options(
    category: DayCategory,
    sub_mode: SubMode,
    current: &ShiftValue,
) -> Vec<ShiftValue> {
    let codes = base_codes(category, sub_mode);
    let mut options = Vec::with_capacity(codes.len() + 2);
    options.push(ShiftValue::Empty);

    let offered = match current.as_code() {
        Some(code) => codes.contains(&code),
        None => false,
    };
    if !current.is_empty() && !offered {
        options.push(current.clone());
    }

    options.extend(codes.iter().copied().map(ShiftValue::Code));
    options
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strs(options: &[ShiftValue]) -> Vec<&str> {
        options.iter().map(|o| o.as_str()).collect()
    }

    #[test]
    fn weekday_sets_per_sub_mode() {
        let none = ShiftValue::Empty;
        assert_eq!(
            strs(&allowed_options(DayCategory::Weekday, SubMode::Lengkap, &none)),
            ["", "P", "S", "M", "SM", "OFF", "CUTI"]
        );
        assert_eq!(
            strs(&allowed_options(DayCategory::Weekday, SubMode::Psm, &none)),
            ["", "P", "S", "M", "OFF", "CUTI"]
        );
        assert_eq!(
            strs(&allowed_options(DayCategory::Weekday, SubMode::PSm, &none)),
            ["", "P", "SM", "OFF", "CUTI"]
        );
    }

    #[test]
    fn weekend_ignores_sub_mode() {
        for mode in [SubMode::Lengkap, SubMode::Psm, SubMode::PSm] {
            assert_eq!(
                strs(&allowed_options(DayCategory::Weekend, mode, &ShiftValue::Empty)),
                ["", "P12", "M12", "OFF", "CUTI"]
            );
        }
    }

    #[test]
    fn foreign_value_is_injected_after_empty() {
        let current = ShiftValue::from("S");
        assert_eq!(
            strs(&allowed_options(DayCategory::Weekday, SubMode::PSm, &current)),
            ["", "S", "P", "SM", "OFF", "CUTI"]
        );

        let legacy = ShiftValue::from("DL");
        assert_eq!(
            strs(&allowed_options(DayCategory::Weekend, SubMode::Lengkap, &legacy)),
            ["", "DL", "P12", "M12", "OFF", "CUTI"]
        );
    }

    #[test]
    fn current_and_empty_appear_exactly_once() {
        let values: Vec<ShiftValue> = ["", "P", "S", "M", "SM", "P12", "M12", "OFF", "CUTI", "X"]
            .into_iter()
            .map(ShiftValue::from)
            .collect();
        for category in [DayCategory::Weekday, DayCategory::Weekend] {
            for mode in [SubMode::Lengkap, SubMode::Psm, SubMode::PSm] {
                for current in &values {
                    let options = allowed_options(category, mode, current);
                    assert_eq!(options[0], ShiftValue::Empty);
                    assert_eq!(options.iter().filter(|o| o.is_empty()).count(), 1);
                    assert_eq!(options.iter().filter(|o| *o == current).count(), 1);
                    let base = base_codes(category, mode);
                    assert!(base.iter().all(|c| options.contains(&ShiftValue::Code(*c))));
                }
            }
        }
    }
}
