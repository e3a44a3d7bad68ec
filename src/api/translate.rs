use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::ai::client::{ContentGenerator, SamplingConfig};
use crate::ai::prompts::{self, PromptLibrary};
use crate::api::blogs::parse_blog_id;
use crate::api::errors::ApiJson;
use crate::app::AppState;
use crate::db::repository::BlogRepository;
use crate::error::AppError;
use crate::models::language::Language;

fn parse_language(code: &str) -> Result<Language, AppError> {
    Language::from_code(code).ok_or_else(|| AppError::BadRequest("Unsupported language".into()))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateTextRequest {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub target_language: String,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TranslateTextResponse {
    pub translated_text: String,
    pub original_text: String,
    pub target_language: String,
    pub language_name: String,
}

/// Translate free text into one of the supported languages.
pub async fn process_translate_text(
    generator: &dyn ContentGenerator,
    prompts: &PromptLibrary,
    request: TranslateTextRequest,
) -> Result<TranslateTextResponse, AppError> {
    if request.text.trim().is_empty() || request.target_language.trim().is_empty() {
        return Err(AppError::BadRequest(
            "Missing text or target language".into(),
        ));
    }
    let language = parse_language(&request.target_language)?;

    let prompt = prompts.render(
        prompts::TRANSLATE_TEXT,
        &json!({ "language": language.name(), "text": &request.text }),
    )?;
    let translated = generator
        .generate(&prompt, &SamplingConfig::precise())
        .await?;

    let translated_text = if translated.trim().is_empty() {
        tracing::warn!(language = language.code(), "Empty translation, returning original text");
        request.text.clone()
    } else {
        translated
    };

    Ok(TranslateTextResponse {
        translated_text,
        original_text: request.text,
        target_language: language.code().to_string(),
        language_name: language.name().to_string(),
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateBlogRequest {
    #[serde(default)]
    pub target_language: String,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TranslateBlogResponse {
    pub title: String,
    pub content: String,
    pub target_language: String,
    pub language_name: String,
}

/// Shape the model is asked to answer with.
#[derive(Debug, Deserialize, PartialEq)]
pub struct TranslatedBlog {
    pub title: String,
    pub content: String,
}

/// Parse the model's JSON answer, tolerating a markdown code fence around it.
pub fn parse_translated_blog(reply: &str) -> Result<TranslatedBlog, AppError> {
    let mut body = reply.trim();
    if let Some(rest) = body.strip_prefix("```") {
        // Drop the info string (`json`) on the opening fence line.
        body = rest.split_once('\n').map(|(_, b)| b).unwrap_or("");
        body = body.trim_end().strip_suffix("```").unwrap_or(body).trim();
    }

    serde_json::from_str(body).map_err(|e| {
        tracing::warn!("Unparseable blog translation: {e}");
        AppError::Upstream(format!("Gemini API error: malformed translation ({e})"))
    })
}

/// Translate a stored blog's title and body. Does not count as a view.
pub async fn process_translate_blog(
    repo: &dyn BlogRepository,
    generator: &dyn ContentGenerator,
    prompts: &PromptLibrary,
    blog_id: &str,
    request: TranslateBlogRequest,
) -> Result<TranslateBlogResponse, AppError> {
    if request.target_language.trim().is_empty() {
        return Err(AppError::BadRequest("Missing target language".into()));
    }
    let language = parse_language(&request.target_language)?;

    let id = parse_blog_id(blog_id)?;
    let blog = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("Blog not found".into()))?;

    let prompt = prompts.render(
        prompts::TRANSLATE_BLOG,
        &json!({
            "language": language.name(),
            "title": blog.title,
            "content": blog.content,
        }),
    )?;
    let reply = generator
        .generate(&prompt, &SamplingConfig::precise().json())
        .await?;
    let translated = parse_translated_blog(&reply)?;

    tracing::debug!(blog_id = %id, language = language.code(), "Translated blog");
    Ok(TranslateBlogResponse {
        title: translated.title,
        content: translated.content,
        target_language: language.code().to_string(),
        language_name: language.name().to_string(),
    })
}

/// `POST /api/translate`
pub async fn translate_text_handler(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<TranslateTextRequest>,
) -> Result<axum::Json<TranslateTextResponse>, AppError> {
    let response = process_translate_text(state.generator()?, &state.prompts, request).await?;
    Ok(axum::Json(response))
}

/// `POST /api/blogs/{id}/translate`
pub async fn translate_blog_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<TranslateBlogRequest>,
) -> Result<axum::Json<TranslateBlogResponse>, AppError> {
    let response = process_translate_blog(
        state.blog_repo.as_ref(),
        state.generator()?,
        &state.prompts,
        &id,
        request,
    )
    .await?;
    Ok(axum::Json(response))
}
