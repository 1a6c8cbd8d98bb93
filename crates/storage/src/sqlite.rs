use rusqlite::{Connection, OptionalExtension};

use crate::error::StorageError;
use crate::traits::PersistedSessionStore;

const UPSERT_SQL: &str = "INSERT INTO session_kv (key, value, checksum) VALUES (?1, ?2, ?3)
     ON CONFLICT(key) DO UPDATE SET
        value = excluded.value,
        checksum = excluded.checksum,
        updated_at = CAST(unixepoch('now','subsec') * 1000 AS INTEGER)";

pub struct SqliteSessionStore {
    conn: Connection,
    durable: bool,
}

impl SqliteSessionStore {
    pub fn open(path: &str) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;
        crate::schema::init_schema(&conn)?;
        Ok(Self {
            conn,
            durable: true,
        })
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        crate::schema::init_schema(&conn)?;
        Ok(Self {
            conn,
            durable: false,
        })
    }

    /// Open the file at `path`, or fall back to an in-memory database when
    /// the file cannot be opened. The session keeps working either way; it
    /// just won't survive a restart in the fallback case.
    pub fn open_or_memory(path: &str) -> Result<Self, StorageError> {
        match Self::open(path) {
            Ok(store) => Ok(store),
            Err(e) => {
                tracing::warn!(path, error = %e, "session store unavailable, using in-memory store");
                Self::open_in_memory()
            }
        }
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}

impl PersistedSessionStore for SqliteSessionStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let row: Option<(Vec<u8>, Vec<u8>)> = self
            .conn
            .query_row(
                "SELECT value, checksum FROM session_kv WHERE key = ?1",
                rusqlite::params![key],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        match row {
            Some((value, checksum)) => {
                if blake3::hash(&value).as_bytes().as_slice() != checksum.as_slice() {
                    return Err(StorageError::Corrupted(key.to_string()));
                }
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    fn set(&mut self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        let checksum = blake3::hash(value);
        self.conn.execute(
            UPSERT_SQL,
            rusqlite::params![key, value, checksum.as_bytes().as_slice()],
        )?;
        Ok(())
    }

    fn set_many(&mut self, entries: &[(&str, Vec<u8>)]) -> Result<(), StorageError> {
        let tx = self.conn.transaction()?;
        for (key, value) in entries {
            let checksum = blake3::hash(value);
            tx.execute(
                UPSERT_SQL,
                rusqlite::params![key, value, checksum.as_bytes().as_slice()],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.conn
            .execute("DELETE FROM session_kv WHERE key = ?1", rusqlite::params![key])?;
        Ok(())
    }

    fn is_durable(&self) -> bool {
        self.durable
    }
}
