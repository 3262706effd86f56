use std::sync::Arc;

use axum::Router;
use testcontainers::runners::AsyncRunner;
use testcontainers::ContainerAsync;
use testcontainers_modules::minio::MinIO;
use testcontainers_modules::mongo::Mongo;

use salen::app::{build_router, AppState};
use salen::config::S3Config;
use salen::db::document_repository::{DocumentAssetRepository, MongoDocumentAssetRepository};
use salen::db::repository::{MongoPostRepository, MongoSlugLookup, PostRepository};
use salen::rendering::links::SiteLinkResolver;
use salen::storage::client::{S3StorageClient, StorageClient};

pub const SERVICE_TOKEN: &str = "test-token";
const BUCKET: &str = "salen-test";

/// Holds running containers and provides the Axum router for integration tests.
///
/// Containers are kept alive for as long as this struct lives. When dropped,
/// containers are stopped and cleaned up automatically.
#[allow(dead_code)]
pub struct TestEnv {
    _mongo: ContainerAsync<Mongo>,
    _minio: ContainerAsync<MinIO>,
    pub router: Router,
    pub post_repo: Arc<dyn PostRepository>,
    pub document_repo: Arc<dyn DocumentAssetRepository>,
    pub storage: Arc<dyn StorageClient>,
    /// Raw S3 client for seeding objects the service only reads.
    pub s3: aws_sdk_s3::Client,
}

#[allow(dead_code)]
impl TestEnv {
    /// Spin up all containers and build the application router against them.
    pub async fn start() -> Self {
        // Start containers concurrently
        let (mongo_container, minio_container) =
            tokio::join!(Mongo::default().start(), MinIO::default().start());
        let mongo_container = mongo_container.expect("Failed to start MongoDB container");
        let minio_container = minio_container.expect("Failed to start MinIO container");

        // --- MongoDB ---
        let mongo_port = mongo_container
            .get_host_port_ipv4(27017)
            .await
            .expect("Failed to get MongoDB port");
        let mongo_uri = format!("mongodb://127.0.0.1:{}", mongo_port);
        let mongo_client = mongodb::Client::with_uri_str(&mongo_uri)
            .await
            .expect("Failed to connect to MongoDB");
        let mongo_db = mongo_client.database("salen_test");

        let mongo_post_repo = MongoPostRepository::new(&mongo_db);
        mongo_post_repo
            .ensure_indexes()
            .await
            .expect("Failed to create post indexes");
        let post_repo: Arc<dyn PostRepository> = Arc::new(mongo_post_repo);
        let document_repo: Arc<dyn DocumentAssetRepository> =
            Arc::new(MongoDocumentAssetRepository::new(&mongo_db));

        // --- MinIO (S3) ---
        let minio_port = minio_container
            .get_host_port_ipv4(9000)
            .await
            .expect("Failed to get MinIO port");
        let s3_config = S3Config {
            bucket: BUCKET.to_string(),
            endpoint: format!("http://127.0.0.1:{}", minio_port),
            access_key_id: "minioadmin".to_string(),
            secret_access_key: "minioadmin".to_string(),
            region: "us-east-1".to_string(),
        };

        let credentials = aws_sdk_s3::config::Credentials::new(
            "minioadmin",
            "minioadmin",
            None,
            None,
            "salen-test",
        );
        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .endpoint_url(&s3_config.endpoint)
            .region(aws_config::Region::new("us-east-1"))
            .credentials_provider(credentials)
            .load()
            .await;
        let s3 = aws_sdk_s3::Client::from_conf(
            aws_sdk_s3::config::Builder::from(&sdk_config)
                .force_path_style(true)
                .build(),
        );

        // Create test bucket
        s3.create_bucket()
            .bucket(BUCKET)
            .send()
            .await
            .expect("Failed to create test bucket");

        let storage: Arc<dyn StorageClient> = Arc::new(S3StorageClient::from_config(&s3_config).await);

        // --- Build AppState ---
        let app_state = AppState {
            post_repo: post_repo.clone(),
            slug_lookup: Arc::new(MongoSlugLookup::new(&mongo_db)),
            document_repo: document_repo.clone(),
            storage_client: storage.clone(),
            link_resolver: Arc::new(SiteLinkResolver),
            service_token: SERVICE_TOKEN.to_string(),
            default_page_limit: 10,
        };

        Self {
            _mongo: mongo_container,
            _minio: minio_container,
            router: build_router(app_state),
            post_repo,
            document_repo,
            storage,
            s3,
        }
    }

    /// Build an `axum_test::TestServer` from this environment's router.
    pub fn server(&self) -> axum_test::TestServer {
        axum_test::TestServer::builder()
            .expect_success_by_default()
            .try_build(self.router.clone())
            .expect("Failed to build TestServer")
    }

    /// Build a `TestServer` that does NOT expect success by default (for error tests).
    pub fn server_permissive(&self) -> axum_test::TestServer {
        axum_test::TestServer::builder()
            .try_build(self.router.clone())
            .expect("Failed to build TestServer")
    }

    /// Helper: store an object in the test bucket.
    pub async fn put_object(&self, key: &str, body: &[u8]) {
        self.s3
            .put_object()
            .bucket(BUCKET)
            .key(key)
            .body(aws_sdk_s3::primitives::ByteStream::from(body.to_vec()))
            .send()
            .await
            .expect("Failed to put test object");
    }

    /// Helper: create a post via the API and return the response body.
    pub async fn create_post(
        &self,
        server: &axum_test::TestServer,
        title: &str,
        content: serde_json::Value,
    ) -> serde_json::Value {
        server
            .post("/api/v1/posts")
            .json(&serde_json::json!({
                "service_token": SERVICE_TOKEN,
                "title": title,
                "content": content,
            }))
            .await
            .json::<serde_json::Value>()
    }
}

/// A one-paragraph editor document.
#[allow(dead_code)]
pub fn paragraph(text: &str) -> serde_json::Value {
    serde_json::json!({
        "root": {
            "type": "root",
            "children": [{
                "type": "paragraph",
                "version": 1,
                "children": [{ "type": "text", "text": text, "format": 0, "version": 1 }]
            }]
        }
    })
}
