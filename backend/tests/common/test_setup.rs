use std::sync::Arc;

use aide::openapi::OpenApi;
use axum::{body::Body, http::Request, response::Response, Extension, Router};
use image_storage::{ImageStore, InMemoryImageStore, InMemoryScanStore, ScanStore};
use mycoscan_backend::{
    routes,
    types::{Environment, UploadConfig},
};
use tower::ServiceExt;

/// Initialize tracing for tests
pub fn setup_test_env() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .try_init()
        .ok();
}

/// Router wired to in-memory image and scan stores
pub struct TestSetup {
    pub router: Router,
    pub image_store: Arc<InMemoryImageStore>,
    pub scan_store: Arc<InMemoryScanStore>,
}

impl TestSetup {
    pub fn new() -> Self {
        Self::with_upload_config(UploadConfig::default())
    }

    pub fn with_upload_config(upload_config: UploadConfig) -> Self {
        Self::build(Environment::Development, upload_config)
    }

    pub fn with_environment(environment: Environment) -> Self {
        Self::build(environment, UploadConfig::default())
    }

    fn build(environment: Environment, upload_config: UploadConfig) -> Self {
        setup_test_env();

        let image_store = Arc::new(InMemoryImageStore::new());
        let store: Arc<dyn ImageStore> = image_store.clone();
        let scan_store = Arc::new(InMemoryScanStore::new());
        let scans: Arc<dyn ScanStore> = scan_store.clone();

        let mut openapi = OpenApi::default();
        let router = routes::handler(upload_config)
            .finish_api(&mut openapi)
            .layer(Extension(openapi))
            .layer(Extension(environment))
            .layer(Extension(store))
            .layer(Extension(scans));

        Self {
            router,
            image_store,
            scan_store,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }

    pub async fn send_get_request(&self, route: &str) -> Response {
        let request = Request::builder()
            .uri(route)
            .method("GET")
            .body(Body::empty())
            .expect("valid request");
        self.send(request).await
    }
}

pub async fn parse_response_body(response: Response) -> serde_json::Value {
    use http_body_util::BodyExt;

    let body = response
        .into_body()
        .collect()
        .await
        .expect("readable body")
        .to_bytes();
    serde_json::from_slice(&body).expect("JSON body")
}
