use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::db::document_repository::DocumentAssetRepository;
use crate::db::repository::PostRepository;
use crate::rendering::links::LinkResolver;
use crate::slug::SlugLookup;
use crate::storage::client::StorageClient;

/// Shared application state available to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub post_repo: Arc<dyn PostRepository>,
    pub slug_lookup: Arc<dyn SlugLookup>,
    pub document_repo: Arc<dyn DocumentAssetRepository>,
    pub storage_client: Arc<dyn StorageClient>,
    pub link_resolver: Arc<dyn LinkResolver>,
    pub service_token: String,
    pub default_page_limit: i64,
}

async fn health() -> &'static str {
    "ok"
}

/// Build the HTTP router.
///
/// `GET` on a single post takes its slug, `PUT` takes its database id; both
/// share one path segment.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/api/v1/posts",
            get(api::posts::list_posts_handler).post(api::posts::create_post_handler),
        )
        .route(
            "/api/v1/posts/{key}",
            get(api::posts::get_post_handler).put(api::posts::update_post_handler),
        )
        .route(
            "/api/v1/documents",
            get(api::documents::list_documents_handler),
        )
        .route(
            "/files/documents/{filename}",
            get(api::documents::download_document_handler),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
