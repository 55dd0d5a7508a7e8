use std::sync::Arc;

use aws_sdk_dynamodb::Client as DynamoDbClient;
use image_storage::{ImageRecordStorage, ImageStore, ScanRecordStorage, ScanStore};
use mycoscan_backend::{server, types::Environment};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let environment = Environment::from_env();

    // JSON logs for staging/production (Datadog), plain logs for development
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(environment.tracing_level().as_str()));
    match environment {
        Environment::Production | Environment::Staging => {
            fmt().json().with_env_filter(filter).init();
        }
        Environment::Development => {
            fmt().with_env_filter(filter).init();
        }
    }

    tracing::info!("Starting MycoSCAN backend in {environment:?} environment");

    let dynamodb_client = Arc::new(DynamoDbClient::new(&environment.aws_config().await));
    let image_store: Arc<dyn ImageStore> = Arc::new(ImageRecordStorage::new(
        dynamodb_client.clone(),
        environment.images_table_name(),
    ));
    let scan_store: Arc<dyn ScanStore> = Arc::new(ScanRecordStorage::new(
        dynamodb_client,
        environment.scans_table_name(),
    ));

    tracing::info!("✅ Initialized image and scan storage");

    server::start(environment, image_store, scan_store).await
}
