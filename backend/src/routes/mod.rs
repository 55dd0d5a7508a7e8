mod docs;
mod health;
pub mod scans;
pub mod upload;

use aide::axum::{
    routing::{get, post},
    ApiRouter,
};
use axum::{extract::DefaultBodyLimit, Extension};

use crate::types::UploadConfig;

/// Room left for multipart boundaries and part headers on top of the image itself
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Creates the router with all handler routes
pub fn handler(upload_config: UploadConfig) -> ApiRouter {
    let body_limit = upload_config
        .max_upload_bytes
        .saturating_add(MULTIPART_OVERHEAD_BYTES);

    ApiRouter::new()
        .merge(docs::handler())
        .api_route("/health", get(health::handler))
        .api_route("/api/upload", post(upload::upload_image))
        .api_route("/api/scans", post(scans::file_scan))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(Extension(upload_config))
}
