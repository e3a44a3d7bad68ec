use axum::extract::State;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::ai::client::{ContentGenerator, SamplingConfig};
use crate::ai::prompts::{self, PromptLibrary};
use crate::api::errors::ApiJson;
use crate::app::AppState;
use crate::error::AppError;

const DEFAULT_TONE: &str = "professional";
const TWEET_LIMIT: usize = 280;
const REPURPOSE_TWEETS: usize = 3;
const THREAD_TWEETS: usize = 5;

fn default_tone() -> String {
    DEFAULT_TONE.to_string()
}

fn default_blog_words() -> u32 {
    200
}

fn default_repurpose_words() -> u32 {
    150
}

/// A blank tone means the caller left the selector empty.
fn tone_or_default(tone: String) -> String {
    let trimmed = tone.trim();
    if trimmed.is_empty() {
        default_tone()
    } else {
        trimmed.to_string()
    }
}

fn require_text(value: &str, field: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::BadRequest(format!("Missing {field}")));
    }
    Ok(())
}

/// Non-empty lines of a model reply, trimmed, at most `limit` of them.
pub fn split_lines(text: &str, limit: usize) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .take(limit)
        .map(str::to_string)
        .collect()
}

/// Lines that fit in a single tweet, at most `limit` of them.
pub fn split_tweets(text: &str, limit: usize) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && line.chars().count() <= TWEET_LIMIT)
        .take(limit)
        .map(str::to_string)
        .collect()
}

// ---------------------------------------------------------------------------
// generate-blog
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateBlogRequest {
    #[serde(default)]
    pub transcript: String,
    #[serde(default = "default_blog_words")]
    pub word_count: u32,
    #[serde(default = "default_tone")]
    pub tone: String,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct GenerateBlogResponse {
    pub content: String,
    pub summary: String,
}

/// Draft an article from an idea or transcript, then summarize the draft.
pub async fn process_generate_blog(
    generator: &dyn ContentGenerator,
    prompts: &PromptLibrary,
    request: GenerateBlogRequest,
) -> Result<GenerateBlogResponse, AppError> {
    require_text(&request.transcript, "transcript")?;

    let prompt = prompts.render(
        prompts::GENERATE_BLOG,
        &json!({
            "word_count": request.word_count,
            "tone": tone_or_default(request.tone),
            "transcript": request.transcript,
        }),
    )?;
    let content = generator
        .generate(&prompt, &SamplingConfig::creative())
        .await?;

    let prompt = prompts.render(prompts::SUMMARIZE_BLOG, &json!({ "content": content }))?;
    let summary = generator
        .generate(&prompt, &SamplingConfig::precise())
        .await?;

    tracing::debug!(words = request.word_count, "Generated blog draft");
    Ok(GenerateBlogResponse { content, summary })
}

// ---------------------------------------------------------------------------
// rephrase
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RephraseRequest {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub word_count: Option<u32>,
    #[serde(default = "default_tone")]
    pub tone: String,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct RephraseResponse {
    pub rephrased: String,
}

pub async fn process_rephrase(
    generator: &dyn ContentGenerator,
    prompts: &PromptLibrary,
    request: RephraseRequest,
) -> Result<RephraseResponse, AppError> {
    require_text(&request.text, "text")?;

    let prompt = prompts.render(
        prompts::REPHRASE,
        &json!({
            "tone": tone_or_default(request.tone),
            "word_count": request.word_count.filter(|n| *n > 0),
            "text": request.text,
        }),
    )?;
    let rephrased = generator
        .generate(&prompt, &SamplingConfig::balanced())
        .await?;

    Ok(RephraseResponse {
        // The editor shows this placeholder when the model returns nothing.
        rephrased: if rephrased.trim().is_empty() {
            "-".to_string()
        } else {
            rephrased
        },
    })
}

// ---------------------------------------------------------------------------
// repurpose
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepurposeRequest {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub style: String,
    #[serde(default)]
    pub emojis: bool,
    #[serde(default = "default_repurpose_words")]
    pub word_count: u32,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RepurposeResponse {
    pub repurposed_content: String,
    pub summary: String,
    pub tweets: Vec<String>,
    pub instagram: String,
}

/// Rewrite text in a social style, then derive a summary, a short tweet
/// thread and an Instagram caption from the rewrite.
pub async fn process_repurpose(
    generator: &dyn ContentGenerator,
    prompts: &PromptLibrary,
    request: RepurposeRequest,
) -> Result<RepurposeResponse, AppError> {
    require_text(&request.text, "text")?;

    let prompt = prompts.render(
        prompts::REPURPOSE,
        &json!({
            "style": request.style.trim().to_lowercase(),
            "word_count": request.word_count,
            "text": request.text,
            "emojis": request.emojis,
        }),
    )?;
    let repurposed_content = generator
        .generate(&prompt, &SamplingConfig::creative())
        .await?;

    let derived = json!({ "content": repurposed_content });

    let prompt = prompts.render(prompts::REPURPOSE_SUMMARY, &derived)?;
    let summary = generator
        .generate(&prompt, &SamplingConfig::precise())
        .await?;

    let prompt = prompts.render(prompts::REPURPOSE_TWEETS, &derived)?;
    let tweets = generator
        .generate(&prompt, &SamplingConfig::creative())
        .await?;

    let prompt = prompts.render(prompts::REPURPOSE_INSTAGRAM, &derived)?;
    let instagram = generator
        .generate(&prompt, &SamplingConfig::creative())
        .await?;

    Ok(RepurposeResponse {
        repurposed_content,
        summary,
        tweets: split_lines(&tweets, REPURPOSE_TWEETS),
        instagram,
    })
}

// ---------------------------------------------------------------------------
// format-blog
// ---------------------------------------------------------------------------

/// Target platform for a formatted post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    LinkedIn,
    Twitter,
    Medium,
}

impl Platform {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "linkedin" => Some(Self::LinkedIn),
            "twitter" => Some(Self::Twitter),
            "medium" => Some(Self::Medium),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LinkedIn => "linkedin",
            Self::Twitter => "twitter",
            Self::Medium => "medium",
        }
    }

    fn template(&self) -> &'static str {
        match self {
            Self::LinkedIn => prompts::FORMAT_LINKEDIN,
            Self::Twitter => prompts::FORMAT_TWITTER,
            Self::Medium => prompts::FORMAT_MEDIUM,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct FormatBlogRequest {
    #[serde(default)]
    pub blog: String,
    #[serde(default)]
    pub format: String,
    #[serde(default = "default_tone")]
    pub tone: String,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FormatBlogResponse {
    pub formatted_content: String,
    /// Only filled for Twitter threads.
    pub tweets: Vec<String>,
    pub format: String,
    pub tone: String,
}

pub async fn process_format_blog(
    generator: &dyn ContentGenerator,
    prompts: &PromptLibrary,
    request: FormatBlogRequest,
) -> Result<FormatBlogResponse, AppError> {
    let platform = Platform::parse(&request.format)
        .ok_or_else(|| AppError::BadRequest("Invalid format specified".into()))?;
    require_text(&request.blog, "blog")?;

    let tone = tone_or_default(request.tone);
    let prompt = prompts.render(
        platform.template(),
        &json!({ "tone": tone, "blog": request.blog }),
    )?;
    let formatted_content = generator
        .generate(&prompt, &SamplingConfig::creative())
        .await?;

    let tweets = match platform {
        Platform::Twitter => split_tweets(&formatted_content, THREAD_TWEETS),
        _ => Vec::new(),
    };

    Ok(FormatBlogResponse {
        formatted_content,
        tweets,
        format: platform.as_str().to_string(),
        tone,
    })
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `POST /api/ai/generate-blog`
pub async fn generate_blog_handler(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<GenerateBlogRequest>,
) -> Result<axum::Json<GenerateBlogResponse>, AppError> {
    let response = process_generate_blog(state.generator()?, &state.prompts, request).await?;
    Ok(axum::Json(response))
}

/// `POST /api/ai/rephrase`
pub async fn rephrase_handler(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RephraseRequest>,
) -> Result<axum::Json<RephraseResponse>, AppError> {
    let response = process_rephrase(state.generator()?, &state.prompts, request).await?;
    Ok(axum::Json(response))
}

/// `POST /api/ai/repurpose`
pub async fn repurpose_handler(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RepurposeRequest>,
) -> Result<axum::Json<RepurposeResponse>, AppError> {
    let response = process_repurpose(state.generator()?, &state.prompts, request).await?;
    Ok(axum::Json(response))
}

/// `POST /api/ai/format-blog`
pub async fn format_blog_handler(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<FormatBlogRequest>,
) -> Result<axum::Json<FormatBlogResponse>, AppError> {
    let response = process_format_blog(state.generator()?, &state.prompts, request).await?;
    Ok(axum::Json(response))
}
