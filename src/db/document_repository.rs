use async_trait::async_trait;

use crate::db::models::DocumentAsset;
use crate::error::AppError;

/// Repository trait for the downloadable documents collection.
#[async_trait]
pub trait DocumentAssetRepository: Send + Sync {
    /// Documents with a non-empty URL, newest uploads first, at most `limit` of them.
    async fn list(&self, limit: i64) -> Result<Vec<DocumentAsset>, AppError>;

    /// Find a document by its stored filename.
    async fn find_by_filename(&self, filename: &str) -> Result<Option<DocumentAsset>, AppError>;

    /// Register a document whose body is already in storage.
    async fn insert(&self, asset: DocumentAsset) -> Result<DocumentAsset, AppError>;
}

/// MongoDB implementation of the DocumentAssetRepository.
#[cfg(feature = "server")]
pub struct MongoDocumentAssetRepository {
    collection: mongodb::Collection<DocumentAsset>,
}

#[cfg(feature = "server")]
impl MongoDocumentAssetRepository {
    pub fn new(db: &mongodb::Database) -> Self {
        Self {
            collection: db.collection(crate::db::models::DOCUMENTS_COLLECTION),
        }
    }
}

#[cfg(feature = "server")]
#[async_trait]
impl DocumentAssetRepository for MongoDocumentAssetRepository {
    async fn list(&self, limit: i64) -> Result<Vec<DocumentAsset>, AppError> {
        use futures::TryStreamExt;
        use mongodb::bson::doc;
        use mongodb::options::FindOptions;

        let options = FindOptions::builder()
            .sort(doc! { "created_at": -1 })
            .limit(limit)
            .build();

        let cursor = self
            .collection
            .find(doc! { "url": { "$type": "string", "$ne": "" } })
            .with_options(options)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        cursor
            .try_collect()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn find_by_filename(&self, filename: &str) -> Result<Option<DocumentAsset>, AppError> {
        use mongodb::bson::doc;

        self.collection
            .find_one(doc! { "filename": filename })
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn insert(&self, mut asset: DocumentAsset) -> Result<DocumentAsset, AppError> {
        let result = self
            .collection
            .insert_one(&asset)
            .await
            .map_err(crate::db::repository::map_write_error)?;

        asset.id = result.inserted_id.as_object_id();
        Ok(asset)
    }
}
