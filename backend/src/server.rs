use std::sync::Arc;

use aide::openapi::OpenApi;
use axum::Extension;
use datadog_tracing::axum::{shutdown_signal, OtelAxumLayer, OtelInResponseLayer};
use image_storage::{ImageStore, ScanStore};
use tokio::net::TcpListener;

use crate::routes;
use crate::types::Environment;

/// Starts the server with the given environment and dependencies
///
/// # Errors
///
/// Returns an error if the server fails to start or bind to the port
pub async fn start(
    environment: Environment,
    image_store: Arc<dyn ImageStore>,
    scan_store: Arc<dyn ScanStore>,
) -> anyhow::Result<()> {
    let mut openapi = OpenApi::default();

    let router = routes::handler(environment.upload_config())
        .finish_api(&mut openapi)
        .layer(Extension(openapi))
        .layer(Extension(environment.clone()))
        .layer(Extension(image_store))
        .layer(Extension(scan_store))
        // Include trace context as header into the response
        .layer(OtelInResponseLayer)
        // Start OpenTelemetry trace on incoming request
        .layer(OtelAxumLayer::default())
        .layer(tower_http::timeout::TimeoutLayer::new(
            environment.request_timeout(),
        ));

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], environment.port()?));

    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("🔄 MycoSCAN backend started on http://{addr}");

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(anyhow::Error::from)
}
