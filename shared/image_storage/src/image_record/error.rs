//! Error types for image and scan record storage operations

use aws_sdk_dynamodb::error::SdkError;
use aws_sdk_dynamodb::operation::put_item::PutItemError;
use thiserror::Error;

/// Result type for image record storage operations
pub type ImageStorageResult<T> = Result<T, ImageStorageError>;

/// Errors that can occur during image record storage operations
#[derive(Error, Debug)]
pub enum ImageStorageError {
    /// Failed to insert a record into Dynamo DB
    #[error("Failed to insert record into DynamoDB: {0}")]
    DynamoDbPutError(#[from] SdkError<PutItemError>),

    /// A record with the same key already exists
    #[error("Image record already exists")]
    ImageRecordExists,

    /// A scan with the same key already exists
    #[error("Scan record already exists")]
    ScanRecordExists,

    /// Serialization error for `serde_dynamo`
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// The backing store could not be reached
    #[error("Image store unavailable: {0}")]
    Unavailable(String),
}
