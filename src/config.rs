use serde::Deserialize;

use crate::error::AppError;

/// Default signing secret; startup warns when it is still in use.
pub const DEFAULT_SESSION_SECRET: &str = "change-me-in-production";

/// Runtime settings for the server and the maintenance tool.
///
/// Values are layered: built-in defaults, then an optional `blogsmith.toml`
/// in the working directory, then environment variables (`MONGODB_URI`,
/// `PUBLIC_BASE_URL`, `GEMINI_API_KEY`, ...).
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Socket address the HTTP server binds to.
    pub bind_addr: String,
    pub mongodb_uri: String,
    pub mongodb_database: String,
    /// Public origin used to build share links (no trailing slash).
    pub public_base_url: String,
    /// Gemini API key. AI endpoints are disabled when absent.
    #[serde(default)]
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_endpoint: String,
    /// HMAC secret for session tokens.
    pub session_secret: String,
    pub session_ttl_hours: i64,
}

impl Settings {
    /// Load settings from defaults, `blogsmith.toml` and the environment.
    pub fn load() -> Result<Self, AppError> {
        let built = config::Config::builder()
            .set_default("bind_addr", "127.0.0.1:3000")
            .and_then(|b| b.set_default("mongodb_uri", "mongodb://localhost:27017"))
            .and_then(|b| b.set_default("mongodb_database", "blogsmith"))
            .and_then(|b| b.set_default("public_base_url", "http://localhost:3002"))
            .and_then(|b| b.set_default("gemini_model", "gemini-2.0-flash-exp"))
            .and_then(|b| {
                b.set_default(
                    "gemini_endpoint",
                    "https://generativelanguage.googleapis.com/v1beta",
                )
            })
            .and_then(|b| b.set_default("session_secret", DEFAULT_SESSION_SECRET))
            .and_then(|b| b.set_default("session_ttl_hours", 24))
            .map_err(|e| AppError::Internal(format!("Invalid default settings: {e}")))?
            .add_source(config::File::with_name("blogsmith").required(false))
            .add_source(config::Environment::default())
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to load settings: {e}")))?;

        let mut settings: Settings = built
            .try_deserialize()
            .map_err(|e| AppError::Internal(format!("Invalid settings: {e}")))?;

        settings.public_base_url = normalize_base_url(&settings.public_base_url)?;
        settings.gemini_api_key = settings
            .gemini_api_key
            .filter(|key| !key.trim().is_empty());

        Ok(settings)
    }

    /// `true` when the session secret was never overridden.
    pub fn uses_default_secret(&self) -> bool {
        self.session_secret == DEFAULT_SESSION_SECRET
    }
}

/// Validate a public base URL and strip any trailing slash.
pub fn normalize_base_url(raw: &str) -> Result<String, AppError> {
    let trimmed = raw.trim();
    let parsed = url::Url::parse(trimmed)
        .map_err(|e| AppError::Internal(format!("Invalid public base URL '{trimmed}': {e}")))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(AppError::Internal(format!(
            "Public base URL must use http or https, got '{}'",
            parsed.scheme()
        )));
    }

    Ok(trimmed.trim_end_matches('/').to_string())
}
