//! Durable key/value storage for session credentials
//!
//! The store holds at most one value per [`SessionKey`]. Writes replace the
//! previous value in one step. Nothing here knows about token lifetimes:
//! expiry is only discovered when the server rejects a credential.

use crate::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

/// Fixed keys under which credentials are persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SessionKey {
    #[serde(rename = "access_token")]
    AccessToken,
    #[serde(rename = "refresh_token")]
    RefreshToken,
    /// Key used by the plain HTML client for its access token
    #[serde(rename = "token")]
    LegacyToken,
}

impl SessionKey {
    /// Storage name of the key
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AccessToken => "access_token",
            Self::RefreshToken => "refresh_token",
            Self::LegacyToken => "token",
        }
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted session state shared by every view of the client
pub trait SessionStore: Send + Sync {
    fn get(&self, key: SessionKey) -> CoreResult<Option<String>>;
    fn set(&self, key: SessionKey, value: &str) -> CoreResult<()>;
    fn remove(&self, key: SessionKey) -> CoreResult<()>;
}

/// In-process store, lost when the process exits
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    entries: Mutex<BTreeMap<SessionKey, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> CoreResult<std::sync::MutexGuard<'_, BTreeMap<SessionKey, String>>> {
        self.entries
            .lock()
            .map_err(|_| CoreError::storage_error("session lock poisoned"))
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: SessionKey) -> CoreResult<Option<String>> {
        Ok(self.entries()?.get(&key).cloned())
    }

    fn set(&self, key: SessionKey, value: &str) -> CoreResult<()> {
        self.entries()?.insert(key, value.to_string());
        Ok(())
    }

    fn remove(&self, key: SessionKey) -> CoreResult<()> {
        self.entries()?.remove(&key);
        Ok(())
    }
}

/// Store backed by a JSON file, surviving restarts of the client
///
/// Every mutation rewrites the whole file through a temporary sibling and a
/// rename, so readers observe either the old or the new contents. Separate
/// processes sharing the file are not coordinated: the last writer wins.
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileSessionStore {
    /// Open a store at `path`. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Location of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> CoreResult<BTreeMap<String, String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(err) => Err(err.into()),
        }
    }

    fn save(&self, entries: &BTreeMap<String, String>) -> CoreResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, serde_json::to_string_pretty(entries)?)?;
        std::fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    fn update<F>(&self, f: F) -> CoreResult<()>
    where
        F: FnOnce(&mut BTreeMap<String, String>) -> bool,
    {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| CoreError::storage_error("session lock poisoned"))?;

        let mut entries = self.load()?;
        if f(&mut entries) {
            self.save(&entries)?;
        }
        Ok(())
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self, key: SessionKey) -> CoreResult<Option<String>> {
        Ok(self.load()?.remove(key.as_str()))
    }

    fn set(&self, key: SessionKey, value: &str) -> CoreResult<()> {
        debug!(key = %key, path = %self.path.display(), "Writing session entry");
        self.update(|entries| {
            entries.insert(key.as_str().to_string(), value.to_string());
            true
        })
    }

    fn remove(&self, key: SessionKey) -> CoreResult<()> {
        debug!(key = %key, path = %self.path.display(), "Removing session entry");
        self.update(|entries| entries.remove(key.as_str()).is_some())
    }
}

// Mock implementation for testing
#[cfg(test)]
pub mod mock {
    use super::*;
    use mockall::mock;

    mock! {
        pub SessionStore {}

        impl SessionStore for SessionStore {
            fn get(&self, key: SessionKey) -> CoreResult<Option<String>>;
            fn set(&self, key: SessionKey, value: &str) -> CoreResult<()>;
            fn remove(&self, key: SessionKey) -> CoreResult<()>;
        }
    }
}
