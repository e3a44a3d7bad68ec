use std::collections::HashMap;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::api::errors::ApiJson;
use crate::app::AppState;
use crate::auth::models::AuthenticatedUser;
use crate::db::models::{Blog, BlogChanges, User};
use crate::db::repository::BlogRepository;
use crate::db::user_repository::UserRepository;
use crate::error::AppError;
use crate::models::slug::{is_valid_slug, slugify};

/// Attempts before a like toggle gives up on a document that keeps changing
/// underneath it.
const LIKE_TOGGLE_ATTEMPTS: usize = 3;

fn blog_not_found() -> AppError {
    AppError::NotFound("Blog not found".into())
}

/// Parse a path id. Anything that is not an ObjectId cannot name a blog.
pub fn parse_blog_id(raw: &str) -> Result<ObjectId, AppError> {
    ObjectId::parse_str(raw.trim()).map_err(|_| blog_not_found())
}

/// Public link for a published blog.
pub fn share_url(base_url: &str, id: &ObjectId) -> String {
    format!("{}/blog/{}", base_url.trim_end_matches('/'), id.to_hex())
}

// ---------------------------------------------------------------------------
// Request / response shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CreateBlogRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub idea: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateBlogRequest {
    pub title: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeResponse {
    pub likes: i64,
    pub is_liked: bool,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthorSummary {
    pub id: String,
    pub name: String,
    pub email: String,
}

impl From<&User> for AuthorSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_hex(),
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

/// The author as a populated summary, or the bare id when the account is gone.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AuthorRef {
    Populated(AuthorSummary),
    Id(String),
}

/// Blog as returned by the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogView {
    pub id: String,
    pub title: String,
    pub content: String,
    pub idea: String,
    pub author: AuthorRef,
    pub published: bool,
    pub share_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    pub views: i64,
    pub likes: i64,
    pub liked_by: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BlogView {
    fn new(blog: Blog, author: Option<&User>) -> Self {
        let author = match author {
            Some(user) => AuthorRef::Populated(AuthorSummary::from(user)),
            None => AuthorRef::Id(blog.author.to_hex()),
        };
        Self {
            id: blog.id.to_hex(),
            title: blog.title,
            content: blog.content,
            idea: blog.idea,
            author,
            published: blog.published,
            share_url: blog.share_url,
            slug: blog.slug,
            views: blog.views,
            likes: blog.likes,
            liked_by: blog.liked_by.iter().map(|id| id.to_hex()).collect(),
            created_at: blog.created_at,
            updated_at: blog.updated_at,
        }
    }
}

/// Populate authors with one lookup for the whole batch.
pub async fn present_blogs(
    users: &dyn UserRepository,
    blogs: Vec<Blog>,
) -> Result<Vec<BlogView>, AppError> {
    let mut author_ids: Vec<ObjectId> = blogs.iter().map(|b| b.author).collect();
    author_ids.sort();
    author_ids.dedup();

    let authors: HashMap<ObjectId, User> = if author_ids.is_empty() {
        HashMap::new()
    } else {
        users
            .find_by_ids(&author_ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect()
    };

    Ok(blogs
        .into_iter()
        .map(|blog| {
            let author = authors.get(&blog.author);
            BlogView::new(blog, author)
        })
        .collect())
}

pub async fn present_blog(users: &dyn UserRepository, blog: Blog) -> Result<BlogView, AppError> {
    let author = users.find_by_id(&blog.author).await?;
    Ok(BlogView::new(blog, author.as_ref()))
}

// ---------------------------------------------------------------------------
// Lifecycle operations
// ---------------------------------------------------------------------------

/// Create an unpublished blog owned by `author`.
pub async fn process_create_blog(
    repo: &dyn BlogRepository,
    author: &ObjectId,
    request: CreateBlogRequest,
) -> Result<Blog, AppError> {
    if request.title.trim().is_empty()
        || request.content.trim().is_empty()
        || request.idea.trim().is_empty()
    {
        return Err(AppError::BadRequest("Missing required fields".into()));
    }

    let blog = Blog::new(
        request.title.trim().to_string(),
        request.content,
        request.idea,
        *author,
    );
    repo.insert(&blog).await?;

    tracing::info!(blog_id = %blog.id, slug = ?blog.slug, "Created blog");
    Ok(blog)
}

pub async fn process_list_my_blogs(
    repo: &dyn BlogRepository,
    author: &ObjectId,
) -> Result<Vec<Blog>, AppError> {
    repo.list_by_author(author).await
}

/// Resolve a locator as an id first, then as a slug, counting one view.
///
/// Drafts are reachable through this path; only the public routes filter on
/// `published`.
pub async fn process_fetch_blog(repo: &dyn BlogRepository, locator: &str) -> Result<Blog, AppError> {
    if let Ok(id) = ObjectId::parse_str(locator) {
        if let Some(blog) = repo.record_view_by_id(&id).await? {
            return Ok(blog);
        }
    }
    if !is_valid_slug(locator) {
        return Err(blog_not_found());
    }

    repo.record_view_by_slug(locator, false)
        .await?
        .ok_or_else(blog_not_found)
}

/// A published blog by slug, counting one view.
pub async fn process_fetch_public_blog(
    repo: &dyn BlogRepository,
    slug: &str,
) -> Result<Blog, AppError> {
    if !is_valid_slug(slug) {
        return Err(blog_not_found());
    }
    repo.record_view_by_slug(slug, true)
        .await?
        .ok_or_else(blog_not_found)
}

pub async fn process_list_public(repo: &dyn BlogRepository) -> Result<Vec<Blog>, AppError> {
    repo.list_published().await
}

/// Load a blog and check that `user` wrote it.
async fn load_owned(
    repo: &dyn BlogRepository,
    id: &ObjectId,
    user: &ObjectId,
) -> Result<Blog, AppError> {
    let blog = repo.find_by_id(id).await?.ok_or_else(blog_not_found)?;
    if &blog.author != user {
        return Err(AppError::Forbidden(
            "Only the author can modify this blog".into(),
        ));
    }
    Ok(blog)
}

/// Author edit of content and, optionally, title. A new title re-derives
/// the slug.
pub async fn process_update_blog(
    repo: &dyn BlogRepository,
    id: &ObjectId,
    user: &ObjectId,
    request: UpdateBlogRequest,
) -> Result<Blog, AppError> {
    load_owned(repo, id, user).await?;

    let mut changes = BlogChanges::default();

    if let Some(title) = request.title {
        let title = title.trim().to_string();
        if title.is_empty() {
            return Err(AppError::BadRequest("Title cannot be empty".into()));
        }
        changes.slug = Some(slugify(&title));
        changes.title = Some(title);
    }
    if let Some(content) = request.content {
        if content.trim().is_empty() {
            return Err(AppError::BadRequest("Content cannot be empty".into()));
        }
        changes.content = Some(content);
    }
    if changes.is_empty() {
        return Err(AppError::BadRequest("Nothing to update".into()));
    }

    let blog = repo
        .update_fields(id, &changes)
        .await?
        .ok_or_else(blog_not_found)?;

    tracing::info!(blog_id = %blog.id, "Updated blog");
    Ok(blog)
}

/// Mark a blog published and (re)compute its share URL. Repeating the call
/// writes the same URL again.
pub async fn process_publish(
    repo: &dyn BlogRepository,
    base_url: &str,
    id: &ObjectId,
    user: &ObjectId,
) -> Result<Blog, AppError> {
    load_owned(repo, id, user).await?;

    let url = share_url(base_url, id);
    let blog = repo
        .set_published(id, true, Some(&url))
        .await?
        .ok_or_else(blog_not_found)?;

    tracing::info!(blog_id = %blog.id, share_url = %blog.share_url, "Published blog");
    Ok(blog)
}

/// Take a blog off the public listing. The share URL is kept.
pub async fn process_unpublish(
    repo: &dyn BlogRepository,
    id: &ObjectId,
    user: &ObjectId,
) -> Result<Blog, AppError> {
    load_owned(repo, id, user).await?;

    let blog = repo
        .set_published(id, false, None)
        .await?
        .ok_or_else(blog_not_found)?;

    tracing::info!(blog_id = %blog.id, "Unpublished blog");
    Ok(blog)
}

/// Flip `user`'s like on a blog.
///
/// Both directions are conditional single-document updates, so the counter
/// and the liker set move together. If neither condition matches (another
/// request toggled in between) the pair is retried.
pub async fn process_toggle_like(
    repo: &dyn BlogRepository,
    id: &ObjectId,
    user: &ObjectId,
) -> Result<LikeResponse, AppError> {
    for _ in 0..LIKE_TOGGLE_ATTEMPTS {
        if let Some(blog) = repo.add_like(id, user).await? {
            tracing::debug!(blog_id = %id, user_id = %user, likes = blog.likes, "Blog liked");
            return Ok(LikeResponse {
                likes: blog.likes,
                is_liked: true,
                message: "Blog liked".to_string(),
            });
        }

        if let Some(blog) = repo.remove_like(id, user).await? {
            tracing::debug!(blog_id = %id, user_id = %user, likes = blog.likes, "Blog unliked");
            return Ok(LikeResponse {
                likes: blog.likes,
                is_liked: false,
                message: "Blog unliked".to_string(),
            });
        }

        if repo.find_by_id(id).await?.is_none() {
            return Err(blog_not_found());
        }
    }

    tracing::warn!(blog_id = %id, user_id = %user, "Like toggle kept racing");
    Err(AppError::Conflict(
        "Blog was modified concurrently, please retry".into(),
    ))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `POST /api/blogs`
pub async fn create_blog_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiJson(request): ApiJson<CreateBlogRequest>,
) -> Result<(StatusCode, axum::Json<BlogView>), AppError> {
    let author = user.object_id()?;
    let blog = process_create_blog(state.blog_repo.as_ref(), &author, request).await?;
    let view = present_blog(state.user_repo.as_ref(), blog).await?;
    Ok((StatusCode::CREATED, axum::Json(view)))
}

/// `GET /api/blogs`
pub async fn list_my_blogs_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<axum::Json<Vec<BlogView>>, AppError> {
    let author = user.object_id()?;
    let blogs = process_list_my_blogs(state.blog_repo.as_ref(), &author).await?;
    Ok(axum::Json(present_blogs(state.user_repo.as_ref(), blogs).await?))
}

/// `GET /api/blogs/{locator}`
pub async fn get_blog_handler(
    State(state): State<AppState>,
    Path(locator): Path<String>,
) -> Result<axum::Json<BlogView>, AppError> {
    let blog = process_fetch_blog(state.blog_repo.as_ref(), &locator).await?;
    Ok(axum::Json(present_blog(state.user_repo.as_ref(), blog).await?))
}

/// `PUT /api/blogs/{id}`
pub async fn update_blog_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<UpdateBlogRequest>,
) -> Result<axum::Json<BlogView>, AppError> {
    let id = parse_blog_id(&id)?;
    let blog =
        process_update_blog(state.blog_repo.as_ref(), &id, &user.object_id()?, request).await?;
    Ok(axum::Json(present_blog(state.user_repo.as_ref(), blog).await?))
}

/// `POST /api/blogs/{id}/publish`
pub async fn publish_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<axum::Json<BlogView>, AppError> {
    let id = parse_blog_id(&id)?;
    let blog = process_publish(
        state.blog_repo.as_ref(),
        &state.public_base_url,
        &id,
        &user.object_id()?,
    )
    .await?;
    Ok(axum::Json(present_blog(state.user_repo.as_ref(), blog).await?))
}

/// `DELETE /api/blogs/{id}/publish`
pub async fn unpublish_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<axum::Json<BlogView>, AppError> {
    let id = parse_blog_id(&id)?;
    let blog = process_unpublish(state.blog_repo.as_ref(), &id, &user.object_id()?).await?;
    Ok(axum::Json(present_blog(state.user_repo.as_ref(), blog).await?))
}

/// `POST /api/blogs/{id}/like`
pub async fn toggle_like_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<axum::Json<LikeResponse>, AppError> {
    let id = parse_blog_id(&id)?;
    let response = process_toggle_like(state.blog_repo.as_ref(), &id, &user.object_id()?).await?;
    Ok(axum::Json(response))
}

/// `GET /api/blogs/public`
pub async fn list_public_handler(
    State(state): State<AppState>,
) -> Result<axum::Json<Vec<BlogView>>, AppError> {
    let blogs = process_list_public(state.blog_repo.as_ref()).await?;
    Ok(axum::Json(present_blogs(state.user_repo.as_ref(), blogs).await?))
}

/// `GET /api/blogs/public/{slug}`
pub async fn get_public_blog_handler(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<axum::Json<BlogView>, AppError> {
    let blog = process_fetch_public_blog(state.blog_repo.as_ref(), &slug).await?;
    Ok(axum::Json(present_blog(state.user_repo.as_ref(), blog).await?))
}
