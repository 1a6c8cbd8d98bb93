use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("checksum mismatch for key: {0}")]
    Corrupted(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}
