use crate::db::document_repository::DocumentAssetRepository;
use crate::db::models::DocumentListItem;
use crate::error::AppError;
use crate::storage::client::{document_key, StorageClient};

/// Format a size in bytes with appropriate units.
pub fn readable_file_size(bytes: i64) -> String {
    const UNITS: [&str; 5] = ["B", "kB", "MB", "GB", "TB"];

    if bytes < 1024 {
        return format!("{} B", bytes.max(0));
    }

    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", size, UNITS[unit])
}

/// Documents ready for download, newest first.
///
/// Entries whose upload has not completed (no URL, or an empty one) are left out.
pub async fn list_documents(
    repo: &dyn DocumentAssetRepository,
    limit: i64,
) -> Result<Vec<DocumentListItem>, AppError> {
    let assets = repo.list(limit).await?;

    Ok(assets
        .into_iter()
        .filter_map(|asset| {
            let url = asset.url.filter(|url| !url.is_empty())?;
            Some(DocumentListItem {
                id: asset.id.map(|id| id.to_hex()).unwrap_or_default(),
                filename: asset.filename,
                description: asset.description,
                url,
                created: asset.created_at.format("%Y-%m-%d").to_string(),
                size: asset.filesize.map(readable_file_size),
            })
        })
        .collect())
}

/// A stored document body with the content type to serve it as.
#[derive(Debug)]
pub struct DocumentDownload {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Fetch a document body from storage.
///
/// The content type comes from the document record when one exists;
/// bodies without a record are still served as opaque bytes.
pub async fn fetch_document(
    repo: &dyn DocumentAssetRepository,
    storage: &dyn StorageClient,
    filename: &str,
) -> Result<DocumentDownload, AppError> {
    if filename.is_empty() || filename.contains('/') || filename.contains("..") {
        return Err(AppError::BadRequest(format!("Invalid filename '{}'", filename)));
    }

    let data = storage
        .get_object(&document_key(filename))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Document '{}' not found", filename)))?;

    let content_type = repo
        .find_by_filename(filename)
        .await?
        .and_then(|asset| asset.mime_type)
        .unwrap_or_else(|| "application/octet-stream".to_string());

    Ok(DocumentDownload {
        filename: filename.to_string(),
        content_type,
        data,
    })
}

/// Axum handler for `GET /api/v1/documents`.
#[cfg(feature = "server")]
pub async fn list_documents_handler(
    axum::extract::State(state): axum::extract::State<crate::app::AppState>,
    axum::extract::Query(params): axum::extract::Query<crate::api::posts::ListParams>,
) -> Result<axum::Json<Vec<DocumentListItem>>, AppError> {
    let limit = params
        .limit
        .unwrap_or(state.default_page_limit)
        .clamp(1, crate::api::posts::MAX_PAGE_LIMIT);
    let documents = list_documents(state.document_repo.as_ref(), limit).await?;
    Ok(axum::Json(documents))
}

/// Axum handler for `GET /files/documents/{filename}`.
///
/// Serves the document from S3 storage as an attachment.
#[cfg(feature = "server")]
pub async fn download_document_handler(
    axum::extract::State(state): axum::extract::State<crate::app::AppState>,
    axum::extract::Path(filename): axum::extract::Path<String>,
) -> Result<axum::response::Response, AppError> {
    use axum::http::header;
    use axum::response::IntoResponse;

    let download = fetch_document(
        state.document_repo.as_ref(),
        state.storage_client.as_ref(),
        &filename,
    )
    .await?;

    let disposition = format!(
        "attachment; filename=\"{}\"",
        download.filename.replace('"', "")
    );

    Ok((
        [
            (header::CONTENT_TYPE, download.content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        download.data,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::DocumentAsset;
    use async_trait::async_trait;
    use bson::oid::ObjectId;
    use chrono::{TimeZone, Utc};
    use std::collections::HashMap;
    use std::sync::Mutex;

    // -- Mock implementations --

    struct MockStorage {
        objects: Mutex<HashMap<String, Vec<u8>>>,
    }

    impl MockStorage {
        fn with(objects: &[(&str, &[u8])]) -> Self {
            Self {
                objects: Mutex::new(
                    objects
                        .iter()
                        .map(|(k, v)| (k.to_string(), v.to_vec()))
                        .collect(),
                ),
            }
        }
    }

    #[async_trait]
    impl StorageClient for MockStorage {
        async fn get_object(&self, key: &str) -> Result<Option<Vec<u8>>, AppError> {
            Ok(self.objects.lock().unwrap().get(key).cloned())
        }
    }

    struct MockRepo {
        assets: Mutex<Vec<DocumentAsset>>,
    }

    impl MockRepo {
        fn with(assets: Vec<DocumentAsset>) -> Self {
            Self {
                assets: Mutex::new(assets),
            }
        }
    }

    #[async_trait]
    impl DocumentAssetRepository for MockRepo {
        async fn list(&self, limit: i64) -> Result<Vec<DocumentAsset>, AppError> {
            let mut assets: Vec<DocumentAsset> = self
                .assets
                .lock()
                .unwrap()
                .iter()
                .filter(|a| a.url.as_deref().is_some_and(|url| !url.is_empty()))
                .cloned()
                .collect();
            assets.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            assets.truncate(limit as usize);
            Ok(assets)
        }

        async fn find_by_filename(&self, filename: &str) -> Result<Option<DocumentAsset>, AppError> {
            Ok(self
                .assets
                .lock()
                .unwrap()
                .iter()
                .find(|a| a.filename == filename)
                .cloned())
        }

        async fn insert(&self, mut asset: DocumentAsset) -> Result<DocumentAsset, AppError> {
            asset.id = Some(ObjectId::new());
            self.assets.lock().unwrap().push(asset.clone());
            Ok(asset)
        }
    }

    fn asset(filename: &str, day: u32, url: Option<&str>, filesize: Option<i64>) -> DocumentAsset {
        let at = Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap();
        DocumentAsset {
            id: Some(ObjectId::new()),
            filename: filename.to_string(),
            mime_type: Some("application/pdf".to_string()),
            filesize,
            url: url.map(str::to_string),
            description: format!("Beskrivning av {filename}"),
            date: at,
            created_at: at,
        }
    }

    // -- Tests --

    #[test]
    fn test_readable_file_size() {
        assert_eq!(readable_file_size(0), "0 B");
        assert_eq!(readable_file_size(512), "512 B");
        assert_eq!(readable_file_size(1024), "1.0 kB");
        assert_eq!(readable_file_size(1536), "1.5 kB");
        assert_eq!(readable_file_size(1024 * 1024 * 3 / 2), "1.5 MB");
        assert_eq!(readable_file_size(5 * 1024 * 1024 * 1024), "5.0 GB");
        assert_eq!(readable_file_size(-1), "0 B");
    }

    #[tokio::test]
    async fn test_list_skips_documents_without_url() {
        let repo = MockRepo::with(vec![
            asset("stadgar.pdf", 1, Some("/files/documents/stadgar.pdf"), Some(2048)),
            asset("pending.pdf", 2, None, Some(10)),
            asset("protokoll.pdf", 3, Some("/files/documents/protokoll.pdf"), None),
        ]);

        let items = list_documents(&repo, 10).await.unwrap();
        let names: Vec<&str> = items.iter().map(|i| i.filename.as_str()).collect();
        assert_eq!(names, vec!["protokoll.pdf", "stadgar.pdf"]);

        assert_eq!(items[0].created, "2024-03-03");
        assert!(items[0].size.is_none());
        assert_eq!(items[1].size.as_deref(), Some("2.0 kB"));
        assert_eq!(items[1].url, "/files/documents/stadgar.pdf");
        assert_eq!(items[1].description, "Beskrivning av stadgar.pdf");
    }

    #[tokio::test]
    async fn test_list_skips_documents_with_empty_url() {
        struct Unfiltered(Vec<DocumentAsset>);

        #[async_trait]
        impl DocumentAssetRepository for Unfiltered {
            async fn list(&self, _limit: i64) -> Result<Vec<DocumentAsset>, AppError> {
                Ok(self.0.clone())
            }

            async fn find_by_filename(&self, _filename: &str) -> Result<Option<DocumentAsset>, AppError> {
                Ok(None)
            }

            async fn insert(&self, asset: DocumentAsset) -> Result<DocumentAsset, AppError> {
                Ok(asset)
            }
        }

        let repo = Unfiltered(vec![asset("tom.pdf", 1, Some(""), Some(10))]);
        let items = list_documents(&repo, 10).await.unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_list_fills_limit_with_downloadable_documents() {
        let repo = MockRepo::with(vec![
            asset("a.pdf", 1, Some("/files/documents/a.pdf"), None),
            asset("b.pdf", 2, Some("/files/documents/b.pdf"), None),
            asset("pending.pdf", 3, None, None),
            asset("tom.pdf", 4, Some(""), None),
        ]);

        let items = list_documents(&repo, 2).await.unwrap();
        let names: Vec<&str> = items.iter().map(|i| i.filename.as_str()).collect();
        assert_eq!(names, vec!["b.pdf", "a.pdf"]);
    }

    #[tokio::test]
    async fn test_fetch_document_uses_record_mime_type() {
        let repo = MockRepo::with(vec![asset("stadgar.pdf", 1, Some("/x"), None)]);
        let storage = MockStorage::with(&[("documents/stadgar.pdf", b"%PDF-1.7".as_slice())]);

        let download = fetch_document(&repo, &storage, "stadgar.pdf").await.unwrap();
        assert_eq!(download.content_type, "application/pdf");
        assert_eq!(download.data, b"%PDF-1.7".to_vec());
        assert_eq!(download.filename, "stadgar.pdf");
    }

    #[tokio::test]
    async fn test_fetch_document_without_record_is_octet_stream() {
        let repo = MockRepo::with(vec![]);
        let storage = MockStorage::with(&[("documents/bilaga.bin", b"\x00\x01".as_slice())]);

        let download = fetch_document(&repo, &storage, "bilaga.bin").await.unwrap();
        assert_eq!(download.content_type, "application/octet-stream");
    }

    #[tokio::test]
    async fn test_fetch_missing_document() {
        let repo = MockRepo::with(vec![asset("stadgar.pdf", 1, Some("/x"), None)]);
        let storage = MockStorage::with(&[]);

        let result = fetch_document(&repo, &storage, "stadgar.pdf").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_fetch_rejects_path_traversal() {
        let repo = MockRepo::with(vec![]);
        let storage = MockStorage::with(&[("secret", b"x".as_slice())]);

        let result = fetch_document(&repo, &storage, "../secret").await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }
}
