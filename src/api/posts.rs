use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;

use crate::db::models::{Post, PostDetail, PostRequest, PostSummary, PostWriteResponse};
use crate::db::repository::PostRepository;
use crate::error::AppError;
use crate::rendering::links::LinkResolver;
use crate::rendering::render::render_document_html;
use crate::slug::{assign_slug, slugify, SlugLookup, POSTS_COLLECTION};

/// Upper bound for a single listing page.
pub const MAX_PAGE_LIMIT: i64 = 100;

/// Query parameters for `GET /api/v1/posts`.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub limit: Option<i64>,
}

fn check_token(request: &PostRequest, expected_token: &str) -> Result<(), AppError> {
    if request.service_token != expected_token {
        return Err(AppError::Auth("Invalid service token".into()));
    }
    Ok(())
}

fn check_title(request: &PostRequest) -> Result<(), AppError> {
    if request.title.is_empty() {
        return Err(AppError::BadRequest("Title cannot be empty".into()));
    }
    Ok(())
}

/// Slug lookup for a post being updated: the slug the post already holds
/// counts as free, since the unique index means only this post can hold it.
struct OwnSlugIsFree<'a> {
    inner: &'a dyn SlugLookup,
    own_slug: Option<&'a str>,
}

#[async_trait]
impl<'a> SlugLookup for OwnSlugIsFree<'a> {
    async fn count_matching_slug(&self, collection: &str, slug: &str) -> Result<u64, AppError> {
        if self.own_slug == Some(slug) {
            return Ok(0);
        }
        self.inner.count_matching_slug(collection, slug).await
    }
}

/// Create a post, deriving a collection-unique slug from its title.
pub async fn process_create_post(
    repo: &dyn PostRepository,
    lookup: &dyn SlugLookup,
    request: PostRequest,
    expected_token: &str,
) -> Result<PostWriteResponse, AppError> {
    check_token(&request, expected_token)?;
    check_title(&request)?;

    let slug = assign_slug(&request.title, None, POSTS_COLLECTION, lookup).await?;

    let now = Utc::now();
    let post = repo
        .insert(Post {
            id: None,
            title: request.title,
            slug,
            content: request.content,
            publish_date: request.publish_date.unwrap_or(now),
            created_at: now,
            updated_at: now,
        })
        .await?;

    tracing::info!(id = %post.id_hex(), slug = ?post.slug, "created post");

    Ok(PostWriteResponse {
        message: "Post created".to_string(),
        id: post.id_hex(),
        slug: post.slug,
    })
}

/// Update a post by id.
///
/// The slug is only re-derived when the title's slug base changed, and the
/// post's own slug never counts as a collision, so a suffixed slug survives
/// edits that lead back to it. A title that yields no slug keeps the stored
/// one.
pub async fn process_update_post(
    repo: &dyn PostRepository,
    lookup: &dyn SlugLookup,
    id: &str,
    request: PostRequest,
    expected_token: &str,
) -> Result<PostWriteResponse, AppError> {
    check_token(&request, expected_token)?;
    check_title(&request)?;

    let mut post = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Post '{}' not found", id)))?;

    if slugify(&post.title) != slugify(&request.title) {
        let own = OwnSlugIsFree {
            inner: lookup,
            own_slug: post.slug.as_deref(),
        };
        let assigned =
            assign_slug(&request.title, post.slug.as_deref(), POSTS_COLLECTION, &own).await?;
        if assigned.is_some() {
            post.slug = assigned;
        }
    }

    post.title = request.title;
    post.content = request.content;
    if let Some(publish_date) = request.publish_date {
        post.publish_date = publish_date;
    }
    post.updated_at = Utc::now();

    repo.replace(&post).await?;

    tracing::info!(id = %post.id_hex(), slug = ?post.slug, "updated post");

    Ok(PostWriteResponse {
        message: "Post updated".to_string(),
        id: post.id_hex(),
        slug: post.slug,
    })
}

/// Newest posts first. `limit` falls back to `default_limit` and is clamped
/// to `1..=MAX_PAGE_LIMIT`.
pub async fn list_posts(
    repo: &dyn PostRepository,
    limit: Option<i64>,
    default_limit: i64,
) -> Result<Vec<PostSummary>, AppError> {
    let limit = limit.unwrap_or(default_limit).clamp(1, MAX_PAGE_LIMIT);
    let posts = repo.list(limit).await?;
    Ok(posts.iter().map(PostSummary::from).collect())
}

/// A single post with its body rendered to HTML.
pub async fn get_post(
    repo: &dyn PostRepository,
    slug: &str,
    resolver: &dyn LinkResolver,
) -> Result<PostDetail, AppError> {
    let post = repo
        .find_by_slug(slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Post '{}' not found", slug)))?;

    let content_html = render_document_html(&post.content, resolver);

    Ok(PostDetail {
        id: post.id_hex(),
        title: post.title,
        slug: post.slug,
        publish_date: post.publish_date,
        created_at: post.created_at,
        updated_at: post.updated_at,
        content_html,
    })
}

/// Axum handler for `POST /api/v1/posts`.
#[cfg(feature = "server")]
pub async fn create_post_handler(
    axum::extract::State(state): axum::extract::State<crate::app::AppState>,
    axum::Json(request): axum::Json<PostRequest>,
) -> Result<(axum::http::StatusCode, axum::Json<PostWriteResponse>), AppError> {
    let response = process_create_post(
        state.post_repo.as_ref(),
        state.slug_lookup.as_ref(),
        request,
        &state.service_token,
    )
    .await?;

    Ok((axum::http::StatusCode::CREATED, axum::Json(response)))
}

/// Axum handler for `PUT /api/v1/posts/{id}`.
#[cfg(feature = "server")]
pub async fn update_post_handler(
    axum::extract::State(state): axum::extract::State<crate::app::AppState>,
    axum::extract::Path(id): axum::extract::Path<String>,
    axum::Json(request): axum::Json<PostRequest>,
) -> Result<axum::Json<PostWriteResponse>, AppError> {
    let response = process_update_post(
        state.post_repo.as_ref(),
        state.slug_lookup.as_ref(),
        &id,
        request,
        &state.service_token,
    )
    .await?;

    Ok(axum::Json(response))
}

/// Axum handler for `GET /api/v1/posts`.
#[cfg(feature = "server")]
pub async fn list_posts_handler(
    axum::extract::State(state): axum::extract::State<crate::app::AppState>,
    axum::extract::Query(params): axum::extract::Query<ListParams>,
) -> Result<axum::Json<Vec<PostSummary>>, AppError> {
    let posts = list_posts(
        state.post_repo.as_ref(),
        params.limit,
        state.default_page_limit,
    )
    .await?;

    Ok(axum::Json(posts))
}

/// Axum handler for `GET /api/v1/posts/{slug}`.
#[cfg(feature = "server")]
pub async fn get_post_handler(
    axum::extract::State(state): axum::extract::State<crate::app::AppState>,
    axum::extract::Path(slug): axum::extract::Path<String>,
) -> Result<axum::Json<PostDetail>, AppError> {
    let post = get_post(state.post_repo.as_ref(), &slug, state.link_resolver.as_ref()).await?;
    Ok(axum::Json(post))
}
