//! In-memory record stores used by router tests

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{
    ImageRecord, ImageStorageError, ImageStorageResult, ImageStore, ScanRecord, ScanStore,
};

/// Records that can be held by [`InMemoryStore`]
pub trait StoredRecord: Clone + Send + Sync {
    /// Document key
    fn key(&self) -> &str;

    /// Error returned when a record with the same key is inserted twice
    fn exists_error() -> ImageStorageError;
}

impl StoredRecord for ImageRecord {
    fn key(&self) -> &str {
        &self.id
    }

    fn exists_error() -> ImageStorageError {
        ImageStorageError::ImageRecordExists
    }
}

impl StoredRecord for ScanRecord {
    fn key(&self) -> &str {
        &self.id
    }

    fn exists_error() -> ImageStorageError {
        ImageStorageError::ScanRecordExists
    }
}

/// Store that keeps records in process memory
pub struct InMemoryStore<T> {
    records: Mutex<Vec<T>>,
    failing: Mutex<bool>,
}

/// In-memory stand-in for the images table
pub type InMemoryImageStore = InMemoryStore<ImageRecord>;

/// In-memory stand-in for the scans table
pub type InMemoryScanStore = InMemoryStore<ScanRecord>;

impl<T> Default for InMemoryStore<T> {
    fn default() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            failing: Mutex::new(false),
        }
    }
}

impl<T: StoredRecord> InMemoryStore<T> {
    /// Creates an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent inserts fail with `ImageStorageError::Unavailable`
    pub async fn set_failing(&self, failing: bool) {
        *self.failing.lock().await = failing;
    }

    /// Number of stored records
    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    /// Whether no record has been stored
    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }

    /// Snapshot of every stored record in insertion order
    pub async fn records(&self) -> Vec<T> {
        self.records.lock().await.clone()
    }

    async fn put(&self, record: &T) -> ImageStorageResult<()> {
        if *self.failing.lock().await {
            return Err(ImageStorageError::Unavailable(
                "in-memory store set to fail".to_string(),
            ));
        }

        let mut records = self.records.lock().await;
        if records.iter().any(|existing| existing.key() == record.key()) {
            return Err(T::exists_error());
        }
        records.push(record.clone());
        Ok(())
    }
}

#[async_trait]
impl ImageStore for InMemoryImageStore {
    async fn insert(&self, record: &ImageRecord) -> ImageStorageResult<()> {
        self.put(record).await
    }
}

#[async_trait]
impl ScanStore for InMemoryScanStore {
    async fn insert(&self, record: &ScanRecord) -> ImageStorageResult<()> {
        self.put(record).await
    }
}
