use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use crate::ai::client::ContentGenerator;
use crate::ai::prompts::PromptLibrary;
use crate::api;
use crate::auth;
use crate::auth::session::SessionManager;
use crate::db::comment_repository::CommentRepository;
use crate::db::repository::BlogRepository;
use crate::db::user_repository::UserRepository;
use crate::error::AppError;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub blog_repo: Arc<dyn BlogRepository>,
    pub comment_repo: Arc<dyn CommentRepository>,
    pub user_repo: Arc<dyn UserRepository>,
    /// `None` when no Gemini API key is configured.
    pub generator: Option<Arc<dyn ContentGenerator>>,
    pub prompts: Arc<PromptLibrary>,
    pub sessions: Arc<SessionManager>,
    /// Public origin for share links, without trailing slash.
    pub public_base_url: String,
}

impl AppState {
    /// The configured generator, or the error AI endpoints report without one.
    pub fn generator(&self) -> Result<&dyn ContentGenerator, AppError> {
        self.generator
            .as_deref()
            .ok_or_else(|| AppError::Internal("Missing Gemini API key".into()))
    }
}

/// Build the API router. Layers (tracing, CORS) are added by the caller.
pub fn router(state: AppState) -> Router {
    Router::new()
        // Accounts
        .route("/api/auth/register", post(auth::handlers::register_handler))
        .route("/api/auth/login", post(auth::handlers::login_handler))
        .route("/api/auth/me", get(auth::handlers::me_handler))
        .route("/api/auth/logout", post(auth::handlers::logout_handler))
        // Blog lifecycle
        .route(
            "/api/blogs",
            get(api::blogs::list_my_blogs_handler).post(api::blogs::create_blog_handler),
        )
        .route("/api/blogs/public", get(api::blogs::list_public_handler))
        .route(
            "/api/blogs/public/{slug}",
            get(api::blogs::get_public_blog_handler),
        )
        .route(
            "/api/blogs/{id}",
            get(api::blogs::get_blog_handler).put(api::blogs::update_blog_handler),
        )
        .route(
            "/api/blogs/{id}/publish",
            post(api::blogs::publish_handler).delete(api::blogs::unpublish_handler),
        )
        .route("/api/blogs/{id}/like", post(api::blogs::toggle_like_handler))
        .route(
            "/api/blogs/{id}/comments",
            get(api::comments::list_comments_handler).post(api::comments::create_comment_handler),
        )
        .route(
            "/api/blogs/{id}/translate",
            post(api::translate::translate_blog_handler),
        )
        // AI content
        .route("/api/translate", post(api::translate::translate_text_handler))
        .route("/api/ai/generate-blog", post(api::content::generate_blog_handler))
        .route("/api/ai/rephrase", post(api::content::rephrase_handler))
        .route("/api/ai/repurpose", post(api::content::repurpose_handler))
        .route("/api/ai/format-blog", post(api::content::format_blog_handler))
        .with_state(state)
}
