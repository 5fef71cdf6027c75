// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Persistent key/value storage for client-side state.
//!
//! Values are JSON and the whole map is written to a single file on every
//! change (write to a temp file, then rename).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use serde::{de::DeserializeOwned, Serialize};

use super::ClientError;

/// Client-side key/value store.
#[derive(Clone)]
pub struct LocalStorage {
    values: Arc<DashMap<String, serde_json::Value>>,
    path: Option<Arc<PathBuf>>,
}

impl LocalStorage {
    /// Open (or start) a file-backed store at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        let path = path.as_ref().to_path_buf();

        let values: BTreeMap<String, serde_json::Value> = match std::fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| ClientError::Storage(format!("corrupt {}: {e}", path.display())))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(ClientError::Storage(e.to_string())),
        };

        Ok(Self {
            values: Arc::new(values.into_iter().collect()),
            path: Some(Arc::new(path)),
        })
    }

    /// Store that lives only as long as the process.
    pub fn in_memory() -> Self {
        Self {
            values: Arc::new(DashMap::new()),
            path: None,
        }
    }

    /// Read `key`; values that no longer deserialize as `T` are treated as absent.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.values.get(key)?.value().clone();
        match serde_json::from_value(value) {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!(key, error = %e, "Ignoring unreadable stored value");
                None
            }
        }
    }

    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), ClientError> {
        let value =
            serde_json::to_value(value).map_err(|e| ClientError::Storage(e.to_string()))?;
        self.values.insert(key.to_string(), value);
        self.flush()
    }

    pub fn remove(&self, key: &str) -> Result<(), ClientError> {
        if self.values.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Write the current contents to disk (no-op for in-memory stores).
    pub fn flush(&self) -> Result<(), ClientError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let snapshot: BTreeMap<String, serde_json::Value> = self
            .values
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        let bytes = serde_json::to_vec_pretty(&snapshot)
            .map_err(|e| ClientError::Storage(e.to_string()))?;

        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, bytes).map_err(|e| ClientError::Storage(e.to_string()))?;
        std::fs::rename(&tmp, path.as_ref()).map_err(|e| ClientError::Storage(e.to_string()))?;
        Ok(())
    }
}
