//! Scan record storage integration using Dynamo DB
//!
//! A scan is a captured image filed against a patient by name, together with the
//! clinician's notes. Scans live in their own table and, like image uploads, are
//! written once and never updated by this service.

use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_dynamodb::{error::SdkError, Client as DynamoDbClient};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;
use tracing::debug;
use uuid::Uuid;

use crate::{ImageStorageError, ImageStorageResult};

/// Attribute names for the scans table
#[derive(Debug, Clone, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ScanRecordAttribute {
    /// Document key (Primary Key)
    Id,
    /// Name of the patient the scan was taken for
    PatientName,
    /// Free-form clinician notes
    Notes,
    /// File name the uploader gave the image
    ImageFilename,
    /// Raw binary payload
    Data,
    /// Declared MIME type of the payload
    ContentType,
    /// Whether the scan has been through analysis
    Analyzed,
    /// Server-assigned insertion time
    CreatedAt,
}

/// Fields supplied by the uploader when filing a scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewScan {
    /// Name of the patient, never empty
    pub patient_name: String,
    /// Optional notes, stored exactly as sent
    pub notes: Option<String>,
    /// File name of the uploaded image
    pub image_filename: String,
    /// Raw payload exactly as received
    pub data: Vec<u8>,
    /// Content type declared by the uploader
    pub content_type: String,
}

/// A persisted scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRecord {
    /// Document key (UUID v4)
    pub id: String,
    /// Name of the patient the scan was taken for
    pub patient_name: String,
    /// Free-form clinician notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// File name the uploader gave the image
    pub image_filename: String,
    /// Raw payload exactly as received
    #[serde(with = "crate::binary")]
    pub data: Vec<u8>,
    /// Content type declared by the uploader, not verified against the payload
    pub content_type: String,
    /// Whether the scan has been through analysis, always `false` when filed
    pub analyzed: bool,
    /// Insertion time
    pub created_at: DateTime<Utc>,
}

impl ScanRecord {
    /// Creates an unanalyzed scan record, stamped with the current time
    #[must_use]
    pub fn new(scan: NewScan) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            patient_name: scan.patient_name,
            notes: scan.notes,
            image_filename: scan.image_filename,
            data: scan.data,
            content_type: scan.content_type,
            analyzed: false,
            created_at: Utc::now(),
        }
    }
}

/// Write seam for scan records
///
/// Implementations must write exactly one document on success and nothing on failure.
#[async_trait]
pub trait ScanStore: Send + Sync {
    /// Persists a single scan record
    ///
    /// # Errors
    ///
    /// Returns `ImageStorageError` if the record could not be written
    async fn insert(&self, record: &ScanRecord) -> ImageStorageResult<()>;
}

/// Scan record storage client for Dynamo DB operations
pub struct ScanRecordStorage {
    dynamodb_client: Arc<DynamoDbClient>,
    table_name: String,
}

impl ScanRecordStorage {
    /// Creates a new scan record storage client
    ///
    /// # Arguments
    ///
    /// * `dynamodb_client` - Pre-configured Dynamo DB client
    /// * `table_name` - Dynamo DB table holding scan records
    #[must_use]
    pub const fn new(dynamodb_client: Arc<DynamoDbClient>, table_name: String) -> Self {
        Self {
            dynamodb_client,
            table_name,
        }
    }
}

#[async_trait]
impl ScanStore for ScanRecordStorage {
    async fn insert(&self, record: &ScanRecord) -> ImageStorageResult<()> {
        let item = serde_dynamo::to_item(record)
            .map_err(|e| ImageStorageError::SerializationError(e.to_string()))?;

        self.dynamodb_client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .condition_expression("attribute_not_exists(#pk)")
            .expression_attribute_names("#pk", ScanRecordAttribute::Id.to_string())
            .send()
            .await
            .map_err(|err| {
                if matches!(
                    err,
                    SdkError::ServiceError(ref svc) if svc.err().is_conditional_check_failed_exception()
                ) {
                    ImageStorageError::ScanRecordExists
                } else {
                    err.into()
                }
            })?;

        debug!(
            id = %record.id,
            size = record.data.len(),
            "Stored scan record"
        );

        Ok(())
    }
}
