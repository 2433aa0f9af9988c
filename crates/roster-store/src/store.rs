//! Mutex-disciplined cache over a single JSON record file.
//!
//! The store holds the full record sequence in memory and rewrites the
//! entire backing file on every mutation, so the file always contains a
//! complete, self-consistent snapshot. One exclusive lock is held across
//! both the in-memory step and the persist; all operations serialize.
//!
//! Persistence writes to a sibling temp file and renames it over the
//! original, and the cache is only updated after the rename succeeds, so
//! a failed persist leaves the cache and the file agreeing on the last
//! committed state.

use std::path::{Path, PathBuf};

use tokio::sync::Mutex;

use crate::error::StoreError;
use crate::record::UserRecord;

/// File-backed store of [`UserRecord`]s addressed by index.
///
/// The cache starts uninitialized and is hydrated from the backing file
/// on first use. A failed hydration keeps the store uninitialized; the
/// next operation retries the load. Once hydrated, reads never touch the
/// file again — external edits to the file are not observed until the
/// process restarts.
pub struct UserStore {
    path: PathBuf,
    cache: Mutex<Option<Vec<UserRecord>>>,
}

impl UserStore {
    /// Creates a store backed by the given file. No I/O happens here;
    /// the file is first read when an operation needs the records.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: Mutex::new(None),
        }
    }

    /// Returns the path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns all records, hydrating the cache from the file if needed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Load`] if the store is uninitialized and the
    /// backing file cannot be read or decoded.
    pub async fn load_all(&self) -> Result<Vec<UserRecord>, StoreError> {
        let mut slot = self.cache.lock().await;
        let records = self.hydrate(&mut slot).await?;
        Ok(records.clone())
    }

    /// Returns the record at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if `index` is past the end of the
    /// sequence, or [`StoreError::Load`] if hydration fails.
    pub async fn get(&self, index: usize) -> Result<UserRecord, StoreError> {
        let mut slot = self.cache.lock().await;
        let records = self.hydrate(&mut slot).await?;
        records
            .get(index)
            .cloned()
            .ok_or(StoreError::NotFound { index })
    }

    /// Appends a record and persists the full sequence.
    ///
    /// Returns the index the record was stored at.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Load`] if hydration fails or
    /// [`StoreError::Persist`] if the file rewrite fails. On a persist
    /// failure the cache is left unchanged.
    pub async fn create(&self, record: UserRecord) -> Result<usize, StoreError> {
        let mut slot = self.cache.lock().await;
        let mut next = self.hydrate(&mut slot).await?.clone();
        next.push(record);
        self.persist(&next).await?;
        let index = next.len() - 1;
        *slot = Some(next);
        Ok(index)
    }

    /// Replaces the record at `index` and persists the full sequence.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if `index` is out of range,
    /// [`StoreError::Load`] if hydration fails, or [`StoreError::Persist`]
    /// if the file rewrite fails (cache unchanged).
    pub async fn update(&self, index: usize, record: UserRecord) -> Result<(), StoreError> {
        let mut slot = self.cache.lock().await;
        let current = self.hydrate(&mut slot).await?;
        if index >= current.len() {
            return Err(StoreError::NotFound { index });
        }
        let mut next = current.clone();
        next[index] = record;
        self.persist(&next).await?;
        *slot = Some(next);
        Ok(())
    }

    /// Removes the record at `index` and persists the full sequence.
    ///
    /// Every record after `index` shifts down by one position.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if `index` is out of range,
    /// [`StoreError::Load`] if hydration fails, or [`StoreError::Persist`]
    /// if the file rewrite fails (cache unchanged).
    pub async fn delete(&self, index: usize) -> Result<(), StoreError> {
        let mut slot = self.cache.lock().await;
        let current = self.hydrate(&mut slot).await?;
        if index >= current.len() {
            return Err(StoreError::NotFound { index });
        }
        let mut next = current.clone();
        next.remove(index);
        self.persist(&next).await?;
        *slot = Some(next);
        Ok(())
    }

    /// Loads the backing file into the cache slot if it is empty.
    async fn hydrate<'a>(
        &self,
        slot: &'a mut Option<Vec<UserRecord>>,
    ) -> Result<&'a mut Vec<UserRecord>, StoreError> {
        if slot.is_none() {
            let bytes = tokio::fs::read(&self.path)
                .await
                .map_err(|e| StoreError::load(e.to_string()))?;
            let records: Vec<UserRecord> =
                serde_json::from_slice(&bytes).map_err(|e| StoreError::load(e.to_string()))?;
            tracing::debug!(
                path = %self.path.display(),
                count = records.len(),
                "record file loaded"
            );
            *slot = Some(records);
        }
        Ok(slot.as_mut().expect("cache slot filled above"))
    }

    /// Writes the full sequence to a temp file and renames it over the
    /// backing file. The rename keeps a crash mid-write from corrupting
    /// the committed snapshot.
    async fn persist(&self, records: &[UserRecord]) -> Result<(), StoreError> {
        let json =
            serde_json::to_vec_pretty(records).map_err(|e| StoreError::persist(e.to_string()))?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &json)
            .await
            .map_err(|e| StoreError::persist(e.to_string()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| StoreError::persist(e.to_string()))?;
        tracing::trace!(
            path = %self.path.display(),
            count = records.len(),
            "record file persisted"
        );
        Ok(())
    }
}
