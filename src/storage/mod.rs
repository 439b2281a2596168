//! JSON File Storage
//!
//! Each store keeps its whole collection in one JSON document. Saves are
//! all-or-nothing: the document is written to a sibling `.tmp` file,
//! flushed to disk, then renamed over the previous version, so a crash
//! mid-save leaves the last durable copy in place.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence failures surfaced by the stores.
///
/// Lookup misses and policy outcomes are never errors; they are part of
/// each operation's outcome enum.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to {action} {path}: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed store file {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// A JSON document on disk holding one store's state.
#[derive(Debug, Clone)]
pub struct JsonFile {
    path: PathBuf,
}

impl JsonFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut tmp = self.path.as_os_str().to_owned();
        tmp.push(".tmp");
        PathBuf::from(tmp)
    }

    /// Load the document, or `T::default()` when the file does not exist yet.
    pub fn load<T: DeserializeOwned + Default>(&self) -> StoreResult<T> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "store file missing, starting empty");
                return Ok(T::default());
            }
            Err(source) => {
                return Err(StoreError::Io {
                    action: "read",
                    path: self.path.clone(),
                    source,
                })
            }
        };

        serde_json::from_str(&raw).map_err(|source| StoreError::Json {
            path: self.path.clone(),
            source,
        })
    }

    /// Serialize `value` and atomically replace the document with it.
    pub fn save<T: Serialize>(&self, value: &T) -> StoreResult<()> {
        let content = serde_json::to_string_pretty(value).map_err(|source| StoreError::Json {
            path: self.path.clone(),
            source,
        })?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                    action: "create directory for",
                    path: self.path.clone(),
                    source,
                })?;
            }
        }

        let tmp_path = self.tmp_path();
        let write_tmp = || -> io::Result<()> {
            let mut file = fs::File::create(&tmp_path)?;
            file.write_all(content.as_bytes())?;
            file.write_all(b"\n")?;
            file.sync_all()
        };
        if let Err(source) = write_tmp() {
            let _ = fs::remove_file(&tmp_path);
            return Err(StoreError::Io {
                action: "write",
                path: tmp_path,
                source,
            });
        }

        fs::rename(&tmp_path, &self.path).map_err(|source| StoreError::Io {
            action: "replace",
            path: self.path.clone(),
            source,
        })?;

        debug!(path = %self.path.display(), bytes = content.len(), "store saved");
        Ok(())
    }
}
