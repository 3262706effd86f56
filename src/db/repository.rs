use async_trait::async_trait;

use crate::db::models::Post;
use crate::error::AppError;

/// Repository trait for post operations.
///
/// This trait allows mocking the database layer in tests.
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Store a new post and return it with its assigned id.
    async fn insert(&self, post: Post) -> Result<Post, AppError>;

    /// Overwrite an existing post, matched by id.
    async fn replace(&self, post: &Post) -> Result<(), AppError>;

    /// Find a post by its hex id. Malformed ids are treated as missing.
    async fn find_by_id(&self, id: &str) -> Result<Option<Post>, AppError>;

    /// Find a post by its slug.
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>, AppError>;

    /// Newest posts first, at most `limit` of them.
    async fn list(&self, limit: i64) -> Result<Vec<Post>, AppError>;
}

/// Map a driver error, turning unique-index violations into `Conflict`.
#[cfg(feature = "server")]
pub(crate) fn map_write_error(err: mongodb::error::Error) -> AppError {
    use mongodb::error::{ErrorKind, WriteFailure};

    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) if write_error.code == 11000 => {
            AppError::Conflict(write_error.message.clone())
        }
        _ => AppError::Database(err.to_string()),
    }
}

/// MongoDB implementation of the PostRepository.
///
/// This is only available when the `server` feature is enabled.
#[cfg(feature = "server")]
pub struct MongoPostRepository {
    collection: mongodb::Collection<Post>,
}

#[cfg(feature = "server")]
impl MongoPostRepository {
    pub fn new(db: &mongodb::Database) -> Self {
        Self {
            collection: db.collection(crate::db::models::POSTS_COLLECTION),
        }
    }

    /// Create the unique slug index. Posts without a slug are not indexed,
    /// so any number of them may coexist.
    pub async fn ensure_indexes(&self) -> Result<(), AppError> {
        use mongodb::bson::doc;
        use mongodb::options::IndexOptions;
        use mongodb::IndexModel;

        let options = IndexOptions::builder()
            .unique(true)
            .partial_filter_expression(doc! { "slug": { "$type": "string" } })
            .build();
        let index = IndexModel::builder()
            .keys(doc! { "slug": 1 })
            .options(options)
            .build();

        self.collection
            .create_index(index)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }
}

#[cfg(feature = "server")]
#[async_trait]
impl PostRepository for MongoPostRepository {
    async fn insert(&self, mut post: Post) -> Result<Post, AppError> {
        let result = self
            .collection
            .insert_one(&post)
            .await
            .map_err(map_write_error)?;

        post.id = result.inserted_id.as_object_id();
        Ok(post)
    }

    async fn replace(&self, post: &Post) -> Result<(), AppError> {
        use mongodb::bson::doc;

        let id = post
            .id
            .ok_or_else(|| AppError::Internal("Cannot replace a post without an id".into()))?;

        let result = self
            .collection
            .replace_one(doc! { "_id": id }, post)
            .await
            .map_err(map_write_error)?;

        if result.matched_count == 0 {
            return Err(AppError::NotFound(format!("Post '{}' not found", id.to_hex())));
        }

        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Post>, AppError> {
        use mongodb::bson::doc;
        use mongodb::bson::oid::ObjectId;

        let Ok(object_id) = ObjectId::parse_str(id) else {
            return Ok(None);
        };

        self.collection
            .find_one(doc! { "_id": object_id })
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>, AppError> {
        use mongodb::bson::doc;

        self.collection
            .find_one(doc! { "slug": slug })
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn list(&self, limit: i64) -> Result<Vec<Post>, AppError> {
        use futures::TryStreamExt;
        use mongodb::bson::doc;
        use mongodb::options::FindOptions;

        let options = FindOptions::builder()
            .sort(doc! { "created_at": -1 })
            .limit(limit)
            .build();

        let mut cursor = self
            .collection
            .find(doc! {})
            .with_options(options)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut posts = Vec::new();
        while let Some(post) = cursor
            .try_next()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
        {
            posts.push(post);
        }

        Ok(posts)
    }
}

/// MongoDB implementation of the slug lookup, usable against any collection.
#[cfg(feature = "server")]
pub struct MongoSlugLookup {
    db: mongodb::Database,
}

#[cfg(feature = "server")]
impl MongoSlugLookup {
    pub fn new(db: &mongodb::Database) -> Self {
        Self { db: db.clone() }
    }
}

#[cfg(feature = "server")]
#[async_trait]
impl crate::slug::SlugLookup for MongoSlugLookup {
    async fn count_matching_slug(&self, collection: &str, slug: &str) -> Result<u64, AppError> {
        use mongodb::bson::{doc, Document};

        self.db
            .collection::<Document>(collection)
            .count_documents(doc! { "slug": slug })
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
