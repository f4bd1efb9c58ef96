//! Client-local durable storage.
//!
//! Values are JSON strings stored under well-known keys. There is no schema versioning:
//! readers go through [`load_json`], which treats anything that fails to parse as absent.

use std::{
    collections::HashMap,
    fs, io,
    path::{Path, PathBuf},
    sync::{Arc, RwLock},
};

use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;

pub mod keys {
    pub const CART: &str = "cart";
    pub const CUSTOMER_INFO: &str = "customerInfo";
    pub const ADMIN_SESSION: &str = "adminSession";
}

#[derive(Debug, Error)]
pub enum LocalStoreError {
    #[error("storage io error: {0}")]
    Io(#[from] io::Error),

    #[error("failed to encode value: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("invalid storage key {0:?}")]
    InvalidKey(String),

    #[error("storage lock poisoned")]
    Poisoned,
}

/// Key-value storage shared by everything running in one client.
///
/// Methods take `&self`; implementations use interior mutability so that clones observe
/// each other's writes, the way browser tabs share one storage area.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, LocalStoreError>;

    fn set(&self, key: &str, value: &str) -> Result<(), LocalStoreError>;

    fn remove(&self, key: &str) -> Result<(), LocalStoreError>;
}

/// Outcome of reading a JSON record.
#[derive(Debug, PartialEq)]
pub enum Stored<T> {
    Missing,
    Malformed,
    Present(T),
}

/// Reads and decodes `key`. Read failures and undecodable values are logged, never raised.
pub fn load_json<T, S>(store: &S, key: &str) -> Stored<T>
where
    T: DeserializeOwned,
    S: KeyValueStore + ?Sized,
{
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Stored::Missing,
        Err(err) => {
            tracing::warn!(key, error = %err, "failed to read local storage");
            return Stored::Missing;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Stored::Present(value),
        Err(err) => {
            tracing::warn!(key, error = %err, "discarding malformed local storage record");
            Stored::Malformed
        }
    }
}

pub fn save_json<T, S>(store: &S, key: &str, value: &T) -> Result<(), LocalStoreError>
where
    T: Serialize + ?Sized,
    S: KeyValueStore + ?Sized,
{
    let encoded = serde_json::to_string(value)?;
    store.set(key, &encoded)
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, LocalStoreError> {
        let entries = self.entries.read().map_err(|_| LocalStoreError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), LocalStoreError> {
        let mut entries = self.entries.write().map_err(|_| LocalStoreError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), LocalStoreError> {
        let mut entries = self.entries.write().map_err(|_| LocalStoreError::Poisoned)?;
        entries.remove(key);
        Ok(())
    }
}

/// One file per key inside a directory, for desktop or CLI front ends.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, LocalStoreError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, LocalStoreError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(LocalStoreError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, LocalStoreError> {
        match fs::read_to_string(self.path_for(key)?) {
            Ok(raw) => Ok(Some(raw)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), LocalStoreError> {
        let path = self.path_for(key)?;
        // write-then-rename so a crash never leaves a half-written record
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), LocalStoreError> {
        match fs::remove_file(self.path_for(key)?) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
