use aide::{axum::ApiRouter, openapi::OpenApi, scalar::Scalar};
use axum::{http::StatusCode, routing::get, Extension, Json};

use crate::types::Environment;

/// OpenAPI document and its Scalar viewer
pub fn handler() -> ApiRouter {
    let scalar = Scalar::new("/openapi.json").with_title("MycoSCAN Upload API");

    ApiRouter::new()
        .route("/docs", scalar.axum_route())
        .route("/openapi.json", get(openapi_schema))
}

/// Hidden in production
#[allow(clippy::unused_async)]
async fn openapi_schema(
    Extension(environment): Extension<Environment>,
    Extension(openapi): Extension<OpenApi>,
) -> Result<Json<OpenApi>, StatusCode> {
    if environment.show_api_docs() {
        Ok(Json(openapi))
    } else {
        Err(StatusCode::NOT_FOUND)
    }
}
