#[cfg(feature = "server")]
#[derive(Debug, clap::Parser)]
#[command(name = "salen", about = "Content service for the association's website")]
struct Args {
    /// Address to listen on, overrides BIND_ADDR.
    #[arg(long, env = "BIND_ADDR")]
    bind: Option<String>,

    /// Configuration file to read before the environment.
    #[arg(long)]
    config: Option<std::path::PathBuf>,
}

#[cfg(feature = "server")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    use anyhow::Context;
    use clap::Parser;
    use salen::app::{build_router, AppState};
    use salen::config::AppConfig;
    use salen::db::document_repository::MongoDocumentAssetRepository;
    use salen::db::repository::{MongoPostRepository, MongoSlugLookup};
    use salen::rendering::links::SiteLinkResolver;
    use salen::storage::client::S3StorageClient;
    use std::sync::Arc;

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "salen=info,tower_http=info".into()),
        )
        .init();

    let args = Args::parse();

    tracing::info!("Starting salen server...");

    let config = AppConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    let bind_addr = args.bind.unwrap_or_else(|| config.bind_addr.clone());

    // Connect to MongoDB
    let mongo_client = mongodb::Client::with_uri_str(&config.mongodb_uri)
        .await
        .context("Failed to connect to MongoDB")?;
    let mongo_db = mongo_client.database(&config.mongodb_database);

    let post_repo = MongoPostRepository::new(&mongo_db);
    post_repo
        .ensure_indexes()
        .await
        .context("Failed to create post indexes")?;

    tracing::info!(
        uri = %config.redacted_mongodb_uri(),
        database = %config.mongodb_database,
        "Connected to MongoDB"
    );

    // Connect to S3
    let s3_config = config.s3();
    let storage_client = S3StorageClient::from_config(&s3_config).await;

    tracing::info!(bucket = %s3_config.bucket, endpoint = %s3_config.endpoint, "S3 storage client initialized");

    let state = AppState {
        post_repo: Arc::new(post_repo),
        slug_lookup: Arc::new(MongoSlugLookup::new(&mongo_db)),
        document_repo: Arc::new(MongoDocumentAssetRepository::new(&mongo_db)),
        storage_client: Arc::new(storage_client),
        link_resolver: Arc::new(SiteLinkResolver),
        service_token: config.service_token.clone(),
        default_page_limit: config.default_page_limit,
    };

    let app = build_router(state);

    // Start the server
    tracing::info!("Listening on http://{}", bind_addr);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;
    axum::serve(listener, app.into_make_service())
        .await
        .context("Server error")?;

    Ok(())
}

// Without the server feature only the library (models, slugs, rendering) is built.
#[cfg(not(feature = "server"))]
fn main() {}
