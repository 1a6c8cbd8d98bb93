use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("unknown schedule mode: {0}")]
    UnknownMode(String),

    #[error("malformed cell key: {0}")]
    MalformedKey(String),

    #[error("cell out of range: row {row}, day {day}")]
    OutOfRange { row: usize, day: usize },
}
