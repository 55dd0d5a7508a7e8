//! Scan filing endpoint

use std::sync::Arc;

use axum::{
    extract::{
        multipart::{Field, MultipartRejection},
        Multipart,
    },
    http::StatusCode,
    Extension, Json,
};
use image_storage::{ImageStorageError, NewScan, ScanRecord, ScanStore};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, instrument};

use super::upload::{self, UploadError, IMAGE_FIELD};
use crate::types::{AppError, UploadConfig};

/// Multipart text field naming the patient
pub const PATIENT_NAME_FIELD: &str = "patient_name";

/// Multipart text field carrying the clinician's notes
pub const NOTES_FIELD: &str = "notes";

/// Confirmation returned after a scan has been filed
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ScanResponse {
    /// Human-readable confirmation naming the patient
    pub message: String,
    /// Key of the stored scan
    pub scan_id: String,
}

/// Reasons a scan request cannot produce a scan record
#[derive(Debug, Error)]
pub enum ScanError {
    /// The body could not be read as a multipart form
    #[error(transparent)]
    Body(#[from] UploadError),

    /// `patient_name` is absent or empty, or no `image` file was sent
    #[error("multipart body is missing the patient name or the image")]
    MissingFields,

    /// The scan could not be written
    #[error("failed to store scan: {0}")]
    Storage(#[from] ImageStorageError),
}

impl From<ScanError> for AppError {
    fn from(err: ScanError) -> Self {
        match err {
            ScanError::MissingFields => {
                tracing::warn!("Rejected scan: {err}");
                Self::new(
                    StatusCode::BAD_REQUEST,
                    "missing_scan_fields",
                    "Missing patient name or image",
                )
            }
            ScanError::Body(UploadError::PayloadTooLarge { .. }) => upload::payload_too_large(),
            ScanError::Body(UploadError::Multipart(ref e))
                if e.status() == StatusCode::PAYLOAD_TOO_LARGE =>
            {
                upload::payload_too_large()
            }
            ScanError::Body(body) => {
                tracing::warn!("Rejected scan: {body}");
                Self::new(
                    StatusCode::BAD_REQUEST,
                    "malformed_scan_form",
                    "Missing patient name or image",
                )
            }
            ScanError::Storage(storage) => {
                tracing::error!("Scan storage error: {storage}");
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "scan_write_failed",
                    "Failed to save scan.",
                )
            }
        }
    }
}

/// Files a captured image against a patient
///
/// Accepts a `multipart/form-data` body with a non-empty `patient_name` text field,
/// an optional `notes` text field and an `image` file field. When a field is sent
/// more than once the first occurrence wins. The scan is stored unanalyzed.
#[instrument(skip(scan_store, upload_config, multipart))]
pub async fn file_scan(
    Extension(scan_store): Extension<Arc<dyn ScanStore>>,
    Extension(upload_config): Extension<UploadConfig>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ScanResponse>, AppError> {
    let multipart = multipart.map_err(|e| ScanError::from(UploadError::from(e)))?;
    let scan = read_scan_form(multipart, upload_config.max_upload_bytes).await?;

    let record = ScanRecord::new(scan);
    scan_store
        .insert(&record)
        .await
        .map_err(ScanError::from)?;

    info!(
        id = %record.id,
        size = record.data.len(),
        has_notes = record.notes.is_some(),
        "Scan saved"
    );

    Ok(Json(ScanResponse {
        message: format!("Scan saved for {}", record.patient_name),
        scan_id: record.id,
    }))
}

async fn read_scan_form(
    mut multipart: Multipart,
    max_upload_bytes: usize,
) -> Result<NewScan, ScanError> {
    let mut patient_name: Option<String> = None;
    let mut notes: Option<String> = None;
    let mut image: Option<(String, String, Vec<u8>)> = None;

    while let Some(field) = multipart.next_field().await.map_err(UploadError::from)? {
        let name = field.name().unwrap_or_default().to_string();

        match field.file_name().map(str::to_string) {
            None if name == PATIENT_NAME_FIELD && patient_name.is_none() => {
                patient_name = Some(read_text(field).await?);
            }
            None if name == NOTES_FIELD && notes.is_none() => {
                notes = Some(read_text(field).await?);
            }
            Some(file_name) if name == IMAGE_FIELD && image.is_none() && !file_name.is_empty() => {
                let content_type = upload::declared_content_type(&field);
                let data = upload::buffer_field(field, max_upload_bytes).await?;
                image = Some((file_name, content_type, data));
            }
            _ => debug!(field = %name, "Ignoring scan form field"),
        }
    }

    let patient_name = patient_name.filter(|name| !name.is_empty());
    let (Some(patient_name), Some((image_filename, content_type, data))) = (patient_name, image)
    else {
        return Err(ScanError::MissingFields);
    };

    Ok(NewScan {
        patient_name,
        notes,
        image_filename,
        data,
        content_type,
    })
}

async fn read_text(field: Field<'_>) -> Result<String, UploadError> {
    Ok(field.text().await?)
}
