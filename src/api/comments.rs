use std::collections::HashMap;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::api::blogs::parse_blog_id;
use crate::api::errors::ApiJson;
use crate::app::AppState;
use crate::auth::models::AuthenticatedUser;
use crate::db::comment_repository::CommentRepository;
use crate::db::models::{Comment, User};
use crate::db::repository::BlogRepository;
use crate::db::user_repository::UserRepository;
use crate::error::AppError;

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommenterSummary {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CommenterRef {
    Populated(CommenterSummary),
    Id(String),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: String,
    pub blog_id: String,
    pub user: CommenterRef,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl CommentView {
    fn new(comment: Comment, user: Option<&User>) -> Self {
        let user = match user {
            Some(u) => CommenterRef::Populated(CommenterSummary {
                id: u.id.to_hex(),
                name: u.name.clone(),
            }),
            None => CommenterRef::Id(comment.user_id.to_hex()),
        };
        Self {
            id: comment.id.to_hex(),
            blog_id: comment.blog_id.to_hex(),
            user,
            content: comment.content,
            created_at: comment.created_at,
        }
    }
}

async fn present_comments(
    users: &dyn UserRepository,
    comments: Vec<Comment>,
) -> Result<Vec<CommentView>, AppError> {
    let mut user_ids: Vec<ObjectId> = comments.iter().map(|c| c.user_id).collect();
    user_ids.sort();
    user_ids.dedup();

    let by_id: HashMap<ObjectId, User> = if user_ids.is_empty() {
        HashMap::new()
    } else {
        users
            .find_by_ids(&user_ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect()
    };

    Ok(comments
        .into_iter()
        .map(|c| {
            let user = by_id.get(&c.user_id);
            CommentView::new(c, user)
        })
        .collect())
}

async fn require_blog(blogs: &dyn BlogRepository, blog_id: &ObjectId) -> Result<(), AppError> {
    match blogs.find_by_id(blog_id).await? {
        Some(_) => Ok(()),
        None => Err(AppError::NotFound("Blog not found".into())),
    }
}

/// Comments on an existing blog, newest first.
pub async fn process_list_comments(
    blogs: &dyn BlogRepository,
    comments: &dyn CommentRepository,
    blog_id: &ObjectId,
) -> Result<Vec<Comment>, AppError> {
    require_blog(blogs, blog_id).await?;
    comments.list_for_blog(blog_id).await
}

/// Attach a comment by `user` to an existing blog.
pub async fn process_create_comment(
    blogs: &dyn BlogRepository,
    comments: &dyn CommentRepository,
    blog_id: &ObjectId,
    user: &ObjectId,
    request: CreateCommentRequest,
) -> Result<Comment, AppError> {
    if request.content.trim().is_empty() {
        return Err(AppError::BadRequest("Comment cannot be empty".into()));
    }
    require_blog(blogs, blog_id).await?;

    let comment = Comment::new(*blog_id, *user, &request.content);
    comments.insert(&comment).await?;

    tracing::debug!(blog_id = %blog_id, comment_id = %comment.id, "Added comment");
    Ok(comment)
}

/// `GET /api/blogs/{id}/comments`
pub async fn list_comments_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<axum::Json<Vec<CommentView>>, AppError> {
    let blog_id = parse_blog_id(&id)?;
    let comments = process_list_comments(
        state.blog_repo.as_ref(),
        state.comment_repo.as_ref(),
        &blog_id,
    )
    .await?;
    Ok(axum::Json(
        present_comments(state.user_repo.as_ref(), comments).await?,
    ))
}

/// `POST /api/blogs/{id}/comments`
pub async fn create_comment_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<CreateCommentRequest>,
) -> Result<(StatusCode, axum::Json<CommentView>), AppError> {
    let blog_id = parse_blog_id(&id)?;
    let comment = process_create_comment(
        state.blog_repo.as_ref(),
        state.comment_repo.as_ref(),
        &blog_id,
        &user.object_id()?,
        request,
    )
    .await?;

    let mut views = present_comments(state.user_repo.as_ref(), vec![comment]).await?;
    let view = views
        .pop()
        .ok_or_else(|| AppError::Internal("Comment vanished while rendering".into()))?;
    Ok((StatusCode::CREATED, axum::Json(view)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::{MemoryBlogRepo, MemoryCommentRepo, MemoryUserRepo};
    use crate::db::models::Blog;

    fn blog_repo_with_blog() -> (MemoryBlogRepo, ObjectId) {
        let repo = MemoryBlogRepo::default();
        let blog = Blog::new("T".into(), "C".into(), "I".into(), ObjectId::new());
        let id = blog.id;
        repo.blogs.lock().unwrap().push(blog);
        (repo, id)
    }

    fn comment(content: &str) -> CreateCommentRequest {
        CreateCommentRequest {
            content: content.to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_and_list_newest_first() {
        let (blogs, blog_id) = blog_repo_with_blog();
        let comments = MemoryCommentRepo::default();
        let user = ObjectId::new();

        let first = process_create_comment(&blogs, &comments, &blog_id, &user, comment(" first "))
            .await
            .unwrap();
        assert_eq!(first.content, "first");

        let second = process_create_comment(&blogs, &comments, &blog_id, &user, comment("second"))
            .await
            .unwrap();

        let listed = process_list_comments(&blogs, &comments, &blog_id).await.unwrap();
        assert_eq!(listed.len(), 2);
        // Same-millisecond inserts fall back to id order, which is also newest first.
        assert_eq!(listed[0].id, second.id);
        assert_eq!(listed[1].id, first.id);
    }

    #[tokio::test]
    async fn test_blank_comment_rejected() {
        let (blogs, blog_id) = blog_repo_with_blog();
        let comments = MemoryCommentRepo::default();

        let result =
            process_create_comment(&blogs, &comments, &blog_id, &ObjectId::new(), comment("  \n"))
                .await;
        match result.unwrap_err() {
            AppError::BadRequest(msg) => assert_eq!(msg, "Comment cannot be empty"),
            other => panic!("Expected BadRequest error, got: {:?}", other),
        }
        assert!(comments.comments.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_comment_on_missing_blog() {
        let blogs = MemoryBlogRepo::default();
        let comments = MemoryCommentRepo::default();
        let missing = ObjectId::new();

        let created =
            process_create_comment(&blogs, &comments, &missing, &ObjectId::new(), comment("hi"))
                .await;
        assert!(matches!(created, Err(AppError::NotFound(_))));

        let listed = process_list_comments(&blogs, &comments, &missing).await;
        assert!(matches!(listed, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_views_populate_commenter_name() {
        let (users, user) = MemoryUserRepo::with_user("Grace", "grace@example.com");
        let blog_id = ObjectId::new();
        let known = Comment::new(blog_id, user.id, "hello");
        let unknown = Comment::new(blog_id, ObjectId::new(), "who?");
        let unknown_user = unknown.user_id.to_hex();

        let views = present_comments(&users, vec![known, unknown]).await.unwrap();
        let json = serde_json::to_value(&views[0]).unwrap();
        assert_eq!(json["user"]["name"], "Grace");
        assert_eq!(json["blogId"], blog_id.to_hex());
        assert!(json["user"].get("email").is_none());
        assert_eq!(views[1].user, CommenterRef::Id(unknown_user));
    }
}
