mod environment;
mod error;

pub use environment::{Environment, UploadConfig, DEFAULT_MAX_UPLOAD_BYTES};
pub use error::{ApiErrorResponse, AppError};
