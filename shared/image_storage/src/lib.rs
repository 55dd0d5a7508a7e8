//! Image storage for the `MycoSCAN` upload service
//!
//! Holds the persisted [`ImageRecord`] and [`ScanRecord`] models and the
//! [`ImageStore`] and [`ScanStore`] seams the upload endpoints write through,
//! backed by `DynamoDB` tables in deployed environments.

mod binary;
pub mod image_record;
pub mod scan_record;

#[cfg(feature = "test-utils")]
pub mod memory;

pub use image_record::{
    ImageRecord, ImageRecordAttribute, ImageRecordStorage, ImageStorageError, ImageStorageResult,
    ImageStore,
};
pub use scan_record::{NewScan, ScanRecord, ScanRecordAttribute, ScanRecordStorage, ScanStore};

#[cfg(feature = "test-utils")]
pub use memory::{InMemoryImageStore, InMemoryScanStore, InMemoryStore};
