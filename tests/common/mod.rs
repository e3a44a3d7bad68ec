use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use testcontainers::runners::AsyncRunner;
use testcontainers::ContainerAsync;
use testcontainers_modules::mongo::Mongo;

use blogsmith::ai::client::{ContentGenerator, SamplingConfig};
use blogsmith::ai::prompts::PromptLibrary;
use blogsmith::app::AppState;
use blogsmith::auth::session::SessionManager;
use blogsmith::db::comment_repository::MongoCommentRepository;
use blogsmith::db::connection::MongoConnection;
use blogsmith::db::repository::{BlogRepository, MongoBlogRepository};
use blogsmith::db::user_repository::{MongoUserRepository, UserRepository};
use blogsmith::error::AppError;

#[allow(dead_code)]
pub const BASE_URL: &str = "https://blogs.test";

/// Generator that answers every prompt with a canned reply and records
/// the prompts it saw.
#[derive(Default)]
pub struct CannedGenerator {
    #[allow(dead_code)]
    pub prompts: Mutex<Vec<String>>,
}

#[async_trait]
impl ContentGenerator for CannedGenerator {
    async fn generate(&self, prompt: &str, sampling: &SamplingConfig) -> Result<String, AppError> {
        self.prompts.lock().unwrap().push(prompt.to_string());

        let reply = if sampling.response_mime_type.as_deref() == Some("application/json") {
            "```json\n{\"title\": \"Titre traduit\", \"content\": \"Contenu traduit\"}\n```"
        } else if prompt.starts_with("Translate") {
            "Texte traduit"
        } else if prompt.starts_with("Create 3 engaging tweets") {
            "Tweet one\nTweet two\n\nTweet three\nTweet four"
        } else if prompt.starts_with("Convert this blog post into a Twitter thread") {
            "Thread one\nThread two"
        } else if prompt.starts_with("Create a concise") || prompt.starts_with("Create a brief") {
            "Canned summary"
        } else if prompt.starts_with("Create an engaging Instagram") {
            "Canned caption"
        } else {
            "Canned content"
        };
        Ok(reply.to_string())
    }
}

/// Holds a running MongoDB container and the Axum router for integration tests.
///
/// The container is kept alive for as long as this struct lives. When
/// dropped, it is stopped and cleaned up automatically.
pub struct TestEnv {
    _mongo: ContainerAsync<Mongo>,
    #[allow(dead_code)]
    pub connection: MongoConnection,
    #[allow(dead_code)]
    pub blog_repo: Arc<dyn BlogRepository>,
    #[allow(dead_code)]
    pub user_repo: Arc<dyn UserRepository>,
    #[allow(dead_code)]
    pub generator: Arc<CannedGenerator>,
    state: AppState,
}

impl TestEnv {
    /// Start MongoDB and build a router whose AI endpoints use [`CannedGenerator`].
    pub async fn start() -> Self {
        let mongo_container = Mongo::default()
            .start()
            .await
            .expect("Failed to start MongoDB container");
        let mongo_port = mongo_container
            .get_host_port_ipv4(27017)
            .await
            .expect("Failed to get MongoDB port");
        let mongo_uri = format!("mongodb://127.0.0.1:{}", mongo_port);

        let connection = MongoConnection::connect(&mongo_uri, "blogsmith_test")
            .await
            .expect("Failed to connect to MongoDB");
        connection
            .ensure_indexes()
            .await
            .expect("Failed to create indexes");

        let db = connection.database();
        let blog_repo: Arc<dyn BlogRepository> = Arc::new(MongoBlogRepository::new(db));
        let user_repo: Arc<dyn UserRepository> = Arc::new(MongoUserRepository::new(db));
        let generator = Arc::new(CannedGenerator::default());

        let state = AppState {
            blog_repo: blog_repo.clone(),
            comment_repo: Arc::new(MongoCommentRepository::new(db)),
            user_repo: user_repo.clone(),
            generator: Some(generator.clone()),
            prompts: Arc::new(PromptLibrary::new().expect("Failed to compile prompts")),
            sessions: Arc::new(SessionManager::new("test-secret", 1)),
            public_base_url: BASE_URL.to_string(),
        };

        Self {
            _mongo: mongo_container,
            connection,
            blog_repo,
            user_repo,
            generator,
            state,
        }
    }

    pub fn router(&self) -> Router {
        blogsmith::app::router(self.state.clone())
    }

    /// Router with no generator configured.
    #[allow(dead_code)]
    pub fn router_without_ai(&self) -> Router {
        let state = AppState {
            generator: None,
            ..self.state.clone()
        };
        blogsmith::app::router(state)
    }

    /// Build an `axum_test::TestServer` with its own cookie jar.
    #[allow(dead_code)]
    pub fn server(&self) -> axum_test::TestServer {
        axum_test::TestServer::builder()
            .save_cookies()
            .expect_success_by_default()
            .build(self.router())
    }

    /// Build a `TestServer` that does NOT expect success by default (for error tests).
    #[allow(dead_code)]
    pub fn server_permissive(&self) -> axum_test::TestServer {
        axum_test::TestServer::builder()
            .save_cookies()
            .build(self.router())
    }

    /// Helper: register an account and log in on `server`. Returns the user id.
    #[allow(dead_code)]
    pub async fn sign_in(&self, server: &axum_test::TestServer, name: &str, email: &str) -> String {
        server
            .post("/api/auth/register")
            .json(&serde_json::json!({
                "name": name,
                "email": email,
                "password": "correct horse battery staple"
            }))
            .await
            .assert_status(axum::http::StatusCode::CREATED);

        let response = server
            .post("/api/auth/login")
            .json(&serde_json::json!({
                "email": email,
                "password": "correct horse battery staple"
            }))
            .await;
        response.assert_status_ok();

        let body: serde_json::Value = response.json();
        body["user"]["user_id"]
            .as_str()
            .expect("login response carries the user id")
            .to_string()
    }

    /// Helper: create a blog via the API and return its JSON.
    #[allow(dead_code)]
    pub async fn create_blog(
        &self,
        server: &axum_test::TestServer,
        title: &str,
    ) -> serde_json::Value {
        let response = server
            .post("/api/blogs")
            .json(&serde_json::json!({
                "title": title,
                "content": "Body of the post",
                "idea": "Why Rust"
            }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        response.json()
    }
}
