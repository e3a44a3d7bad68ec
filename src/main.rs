use std::sync::Arc;

use anyhow::Context;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use blogsmith::ai::client::{ContentGenerator, GeminiClient};
use blogsmith::ai::prompts::PromptLibrary;
use blogsmith::app::{self, AppState};
use blogsmith::auth::session::SessionManager;
use blogsmith::config::Settings;
use blogsmith::db::comment_repository::MongoCommentRepository;
use blogsmith::db::connection::MongoConnection;
use blogsmith::db::repository::MongoBlogRepository;
use blogsmith::db::user_repository::MongoUserRepository;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "blogsmith=info,tower_http=info".into()),
        )
        .init();

    tracing::info!("Starting Blogsmith server...");

    let settings = Settings::load().context("Failed to load settings")?;
    if settings.uses_default_secret() {
        tracing::warn!("SESSION_SECRET is not set; using the built-in development secret");
    }

    // Connect to MongoDB
    let connection = MongoConnection::connect(&settings.mongodb_uri, &settings.mongodb_database)
        .await
        .context("Failed to connect to MongoDB")?;
    connection
        .ensure_indexes()
        .await
        .context("Failed to create MongoDB indexes")?;

    let db = connection.database();

    let generator: Option<Arc<dyn ContentGenerator>> = match &settings.gemini_api_key {
        Some(key) => {
            tracing::info!(model = %settings.gemini_model, "Gemini client initialized");
            Some(Arc::new(GeminiClient::new(
                &settings.gemini_endpoint,
                &settings.gemini_model,
                key,
            )))
        }
        None => {
            tracing::warn!("GEMINI_API_KEY is not set; AI endpoints are disabled");
            None
        }
    };

    // Build application state
    let state = AppState {
        blog_repo: Arc::new(MongoBlogRepository::new(db)),
        comment_repo: Arc::new(MongoCommentRepository::new(db)),
        user_repo: Arc::new(MongoUserRepository::new(db)),
        generator,
        prompts: Arc::new(PromptLibrary::new().context("Failed to compile prompt templates")?),
        sessions: Arc::new(SessionManager::new(
            &settings.session_secret,
            settings.session_ttl_hours,
        )),
        public_base_url: settings.public_base_url.clone(),
    };

    let router = app::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    // Start the server
    let listener = tokio::net::TcpListener::bind(&settings.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", settings.bind_addr))?;
    tracing::info!("Listening on http://{}", settings.bind_addr);

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    connection.shutdown().await;
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
    }
    tracing::info!("Shutdown signal received");
}
