//! Append-only screening record store: one JSON array in one file.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

use crate::screening::models::ScreeningRecord;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Store file is not a JSON array of records: {0}")]
    Json(#[from] serde_json::Error),
}

/// Shared by every session. Appends are read-modify-write of the whole file, so they
/// are serialized through `lock`.
#[derive(Debug)]
pub struct RecordStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl RecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one record and rewrites the file. Returns the new record count.
    pub async fn append(&self, record: &ScreeningRecord) -> Result<usize, StoreError> {
        let _guard = self.lock.lock().await;

        let mut records = self.read_records().await?;
        records.push(record.clone());

        let body = serde_json::to_vec_pretty(&records)?;
        tokio::fs::write(&self.path, body)
            .await
            .map_err(|source| StoreError::Io {
                path: self.path.clone(),
                source,
            })?;

        debug!("Store now holds {} records", records.len());
        Ok(records.len())
    }

    /// Every record in the store; a missing file reads as empty.
    pub async fn load_all(&self) -> Result<Vec<ScreeningRecord>, StoreError> {
        let _guard = self.lock.lock().await;
        self.read_records().await
    }

    async fn read_records(&self) -> Result<Vec<ScreeningRecord>, StoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(source) => Err(StoreError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }
}
