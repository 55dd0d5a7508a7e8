//! Image record storage integration using Dynamo DB
//!
//! Every successful upload becomes one independent document in the images table.
//! Documents are written once and never updated or deleted by this service.

mod error;

use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_dynamodb::{error::SdkError, Client as DynamoDbClient};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;
use tracing::debug;
use uuid::Uuid;

pub use error::{ImageStorageError, ImageStorageResult};

/// Attribute names for the images table
#[derive(Debug, Clone, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ImageRecordAttribute {
    /// Document key (Primary Key)
    Id,
    /// Raw binary payload
    Data,
    /// Declared MIME type of the payload
    ContentType,
    /// Server-assigned insertion time
    CreatedAt,
}

/// A persisted image upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    /// Document key (UUID v4), internal to the store
    pub id: String,
    /// Raw payload exactly as received
    #[serde(with = "crate::binary")]
    pub data: Vec<u8>,
    /// Content type declared by the uploader, not verified against the payload
    pub content_type: String,
    /// Insertion time
    pub created_at: DateTime<Utc>,
}

impl ImageRecord {
    /// Creates a record for a freshly received payload, stamped with the current time
    #[must_use]
    pub fn new(data: Vec<u8>, content_type: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            data,
            content_type: content_type.into(),
            created_at: Utc::now(),
        }
    }
}

/// Write seam for image records
///
/// Implementations must write exactly one document on success and nothing on failure.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Persists a single image record
    ///
    /// # Errors
    ///
    /// Returns `ImageStorageError` if the record could not be written
    async fn insert(&self, record: &ImageRecord) -> ImageStorageResult<()>;
}

/// Image record storage client for Dynamo DB operations
pub struct ImageRecordStorage {
    dynamodb_client: Arc<DynamoDbClient>,
    table_name: String,
}

impl ImageRecordStorage {
    /// Creates a new image record storage client
    ///
    /// # Arguments
    ///
    /// * `dynamodb_client` - Pre-configured Dynamo DB client
    /// * `table_name` - Dynamo DB table holding image records
    #[must_use]
    pub const fn new(dynamodb_client: Arc<DynamoDbClient>, table_name: String) -> Self {
        Self {
            dynamodb_client,
            table_name,
        }
    }
}

#[async_trait]
impl ImageStore for ImageRecordStorage {
    async fn insert(&self, record: &ImageRecord) -> ImageStorageResult<()> {
        let item = serde_dynamo::to_item(record)
            .map_err(|e| ImageStorageError::SerializationError(e.to_string()))?;

        self.dynamodb_client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .condition_expression("attribute_not_exists(#pk)")
            .expression_attribute_names("#pk", ImageRecordAttribute::Id.to_string())
            .send()
            .await
            .map_err(|err| {
                if matches!(
                    err,
                    SdkError::ServiceError(ref svc) if svc.err().is_conditional_check_failed_exception()
                ) {
                    ImageStorageError::ImageRecordExists
                } else {
                    err.into()
                }
            })?;

        debug!(
            id = %record.id,
            size = record.data.len(),
            content_type = %record.content_type,
            "Stored image record"
        );

        Ok(())
    }
}
