use bson::oid::ObjectId;
use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::rendering::richtext::RichTextDocument;

/// Collection holding news posts. Slugs are unique within it.
pub const POSTS_COLLECTION: &str = "posts";

/// Collection holding downloadable documents (protocols, bylaws, ...).
pub const DOCUMENTS_COLLECTION: &str = "documents";

/// A news post stored in MongoDB.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub title: String,
    /// URL-safe identifier, unique across posts. Absent when the title
    /// yields no usable characters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    /// Body as written in the editor.
    pub content: RichTextDocument,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub publish_date: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Hex form of the database id, empty for unsaved posts.
    pub fn id_hex(&self) -> String {
        self.id.map(|id| id.to_hex()).unwrap_or_default()
    }
}

/// An uploaded file in the `documents` collection.
///
/// The file body lives in object storage under `documents/{filename}`;
/// `url` is only set once the upload has completed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentAsset {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub filename: String,
    #[serde(default)]
    pub mime_type: Option<String>,
    /// Size in bytes.
    #[serde(default)]
    pub filesize: Option<i64>,
    #[serde(default)]
    pub url: Option<String>,
    pub description: String,
    /// The date the document refers to (e.g. meeting date).
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub date: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

/// Request payload for creating or updating a post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostRequest {
    /// Service authentication token.
    pub service_token: String,
    pub title: String,
    pub content: RichTextDocument,
    /// Defaults to the time of the request on create, unchanged on update.
    #[serde(default)]
    pub publish_date: Option<DateTime<Utc>>,
}

/// Response from a successful post create/update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostWriteResponse {
    pub message: String,
    pub id: String,
    pub slug: Option<String>,
}

/// A post as shown in listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostSummary {
    pub id: String,
    pub title: String,
    pub slug: Option<String>,
    pub publish_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<&Post> for PostSummary {
    fn from(post: &Post) -> Self {
        Self {
            id: post.id_hex(),
            title: post.title.clone(),
            slug: post.slug.clone(),
            publish_date: post.publish_date,
            created_at: post.created_at,
        }
    }
}

/// A single post with its body rendered to HTML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostDetail {
    pub id: String,
    pub title: String,
    pub slug: Option<String>,
    pub publish_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub content_html: String,
}

/// A downloadable document as shown in the documents list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentListItem {
    pub id: String,
    pub filename: String,
    pub description: String,
    pub url: String,
    /// Upload date formatted as `yyyy-MM-dd`.
    pub created: String,
    /// Human-readable size such as `1.4 MB`, when known.
    pub size: Option<String>,
}
