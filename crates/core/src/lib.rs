pub mod edit;
pub mod error;
pub mod grid;
pub mod ids;
pub mod policy;
pub mod scope;
pub mod shift;

pub use edit::UndoEntry;
pub use error::CoreError;
pub use grid::{DerivedCounters, GridSnapshot, PersonnelRow, ScheduleGrid};
pub use ids::SessionId;
pub use policy::allowed_options;
pub use scope::{CellKey, ScheduleMode, Scope};
pub use shift::{DayCategory, ShiftCode, ShiftValue, SubMode};
