use serde::{Serialize, de::DeserializeOwned};

use crate::error::StorageError;

/// Durable key-value slots backing an edit session across reloads.
pub trait PersistedSessionStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    fn set(&mut self, key: &str, value: &[u8]) -> Result<(), StorageError>;

    /// Write several slots together. Stores that can should apply all of
    /// them or none.
    fn set_many(&mut self, entries: &[(&str, Vec<u8>)]) -> Result<(), StorageError> {
        for (key, value) in entries {
            self.set(key, value)?;
        }
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError>;

    /// False for stores that will not outlive the process.
    fn is_durable(&self) -> bool;
}

pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, StorageError> {
    rmp_serde::to_vec_named(value).map_err(|e| StorageError::Serialization(e.to_string()))
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, StorageError> {
    rmp_serde::from_slice(bytes).map_err(|e| StorageError::Serialization(e.to_string()))
}

/// Read and decode a slot. Missing slots come back as `None`.
pub fn load_slot<T: DeserializeOwned>(
    store: &dyn PersistedSessionStore,
    key: &str,
) -> Result<Option<T>, StorageError> {
    match store.get(key)? {
        Some(bytes) => Ok(Some(decode(&bytes)?)),
        None => Ok(None),
    }
}

pub fn save_slot<T: Serialize>(
    store: &mut dyn PersistedSessionStore,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let bytes = encode(value)?;
    store.set(key, &bytes)
}
