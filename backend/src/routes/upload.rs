//! Image upload endpoint

use std::sync::Arc;

use aide::OperationOutput;
use axum::{
    extract::{
        multipart::{Field, MultipartError, MultipartRejection},
        Multipart,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use image_storage::{ImageRecord, ImageStore};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::types::{AppError, UploadConfig};

/// Multipart field carrying the image file
pub const IMAGE_FIELD: &str = "image";

/// Confirmation returned after an image has been stored
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct UploadResponse {
    /// Human-readable confirmation
    pub message: String,
}

/// JSON body sent with `201 Created`
#[derive(Debug)]
pub struct Created<T>(pub T);

impl<T: Serialize> IntoResponse for Created<T> {
    fn into_response(self) -> Response {
        (StatusCode::CREATED, Json(self.0)).into_response()
    }
}

impl<T: JsonSchema> OperationOutput for Created<T> {
    type Inner = T;

    fn operation_response(
        ctx: &mut aide::generate::GenContext,
        operation: &mut aide::openapi::Operation,
    ) -> Option<aide::openapi::Response> {
        Json::<T>::operation_response(ctx, operation)
    }
}

/// Reasons an upload request cannot produce an image record
#[derive(Debug, Error)]
pub enum UploadError {
    /// The request body is not a readable multipart form
    #[error("request is not multipart/form-data: {0}")]
    NotMultipart(#[from] MultipartRejection),

    /// The multipart stream broke off or was malformed
    #[error("malformed multipart body: {0}")]
    Multipart(#[from] MultipartError),

    /// No file part named `image`
    #[error("multipart body has no `image` file field")]
    MissingImageField,

    /// More than one file part named `image`
    #[error("multipart body has more than one `image` file field")]
    DuplicateImageField,

    /// A file part under any name other than `image`
    #[error("unexpected file field `{0}`")]
    UnexpectedFileField(String),

    /// The image is larger than the configured bound
    #[error("image exceeds the upload limit of {limit} bytes")]
    PayloadTooLarge {
        /// Configured bound in bytes
        limit: usize,
    },
}

impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        tracing::warn!("Rejected upload: {err}");

        match err {
            UploadError::PayloadTooLarge { .. } => payload_too_large(),
            UploadError::Multipart(ref e) if e.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                payload_too_large()
            }
            UploadError::NotMultipart(_) => Self::save_failed("not_multipart"),
            UploadError::Multipart(_) => Self::save_failed("malformed_multipart"),
            UploadError::MissingImageField => Self::save_failed("missing_image_field"),
            UploadError::DuplicateImageField => Self::save_failed("duplicate_image_field"),
            UploadError::UnexpectedFileField(_) => Self::save_failed("unexpected_file_field"),
        }
    }
}

pub(super) const fn payload_too_large() -> AppError {
    AppError::new(
        StatusCode::PAYLOAD_TOO_LARGE,
        "payload_too_large",
        "Image exceeds the maximum upload size.",
    )
}

/// Image file read from the request, fully buffered
#[derive(Debug)]
struct ImagePart {
    data: Vec<u8>,
    content_type: String,
}

/// Stores one uploaded image
///
/// Accepts a `multipart/form-data` body with a single file field named `image`.
/// Text fields are ignored, any other file field is refused. The payload is
/// buffered in memory and written as one record together with its declared
/// content type, `text/plain` when the part declares none. Content is not
/// inspected. Any failure to produce or persist the record returns a generic
/// server error and writes nothing.
#[instrument(skip(image_store, upload_config, multipart))]
pub async fn upload_image(
    Extension(image_store): Extension<Arc<dyn ImageStore>>,
    Extension(upload_config): Extension<UploadConfig>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Created<UploadResponse>, AppError> {
    let multipart = multipart.map_err(UploadError::from)?;
    let image = read_image_part(multipart, upload_config.max_upload_bytes).await?;

    let record = ImageRecord::new(image.data, image.content_type);
    image_store.insert(&record).await?;

    info!(
        size = record.data.len(),
        content_type = %record.content_type,
        "Image saved"
    );

    Ok(Created(UploadResponse {
        message: "Image saved to database.".to_string(),
    }))
}

/// Walks the multipart stream and buffers the single `image` file part
async fn read_image_part(
    mut multipart: Multipart,
    max_upload_bytes: usize,
) -> Result<ImagePart, UploadError> {
    let mut image = None;

    while let Some(field) = multipart.next_field().await? {
        if field.file_name().is_none() {
            debug!(field = ?field.name(), "Ignoring text field");
            continue;
        }
        if field.name() != Some(IMAGE_FIELD) {
            return Err(UploadError::UnexpectedFileField(
                field.name().unwrap_or_default().to_string(),
            ));
        }
        if image.is_some() {
            return Err(UploadError::DuplicateImageField);
        }

        let content_type = declared_content_type(&field);
        let data = buffer_field(field, max_upload_bytes).await?;

        debug!(size = data.len(), %content_type, "Buffered image field");
        image = Some(ImagePart { data, content_type });
    }

    image.ok_or(UploadError::MissingImageField)
}

/// Content type of a file part, `text/plain` when the part declares none
pub(super) fn declared_content_type(field: &Field<'_>) -> String {
    field
        .content_type()
        .unwrap_or(mime::TEXT_PLAIN.as_ref())
        .to_string()
}

/// Reads a file part into memory, failing as soon as it grows past `limit`
pub(super) async fn buffer_field(
    mut field: Field<'_>,
    limit: usize,
) -> Result<Vec<u8>, UploadError> {
    let mut data = Vec::new();

    while let Some(chunk) = field.chunk().await? {
        if data.len() + chunk.len() > limit {
            return Err(UploadError::PayloadTooLarge { limit });
        }
        data.extend_from_slice(&chunk);
    }

    Ok(data)
}
