use serde::Serialize;
use tera::{Context, Tera};

use crate::error::AppError;

/// Template names. The `.txt` suffix keeps tera from HTML-escaping prompts.
pub const GENERATE_BLOG: &str = "generate_blog.txt";
pub const SUMMARIZE_BLOG: &str = "summarize_blog.txt";
pub const REPHRASE: &str = "rephrase.txt";
pub const REPURPOSE: &str = "repurpose.txt";
pub const REPURPOSE_SUMMARY: &str = "repurpose_summary.txt";
pub const REPURPOSE_TWEETS: &str = "repurpose_tweets.txt";
pub const REPURPOSE_INSTAGRAM: &str = "repurpose_instagram.txt";
pub const FORMAT_LINKEDIN: &str = "format_linkedin.txt";
pub const FORMAT_TWITTER: &str = "format_twitter.txt";
pub const FORMAT_MEDIUM: &str = "format_medium.txt";
pub const TRANSLATE_TEXT: &str = "translate_text.txt";
pub const TRANSLATE_BLOG: &str = "translate_blog.txt";

const TEMPLATES: &[(&str, &str)] = &[
    (
        GENERATE_BLOG,
        "Write a detailed, engaging, {{ word_count }}-word blog post with a {{ tone }} tone. \
Include a catchy introduction and conclusion about the following topic. \
Make it sound like a real blog, not a summary:\n\n{{ transcript }}",
    ),
    (
        SUMMARIZE_BLOG,
        "Create a concise 2-3 sentence summary of the following blog post:\n\n{{ content }}",
    ),
    (
        REPHRASE,
        "Rephrase the following text for fluency and naturalness with a {{ tone }} tone\
{% if word_count %} (approximately {{ word_count }} words){% endif %}:\n{{ text }}",
    ),
    (
        REPURPOSE,
        "{% if style == \"catchy\" %}Rewrite this content in a catchy, attention-grabbing style\
{% elif style == \"hot\" %}Rewrite this content in a hot, trending, viral style\
{% else %}Rewrite this content in a clear, engaging style{% endif %} \
({{ word_count }} words): {{ text }}\
{% if emojis %}\nAdd relevant emojis to make it more engaging.{% endif %}",
    ),
    (
        REPURPOSE_SUMMARY,
        "Create a brief 1-2 sentence summary of this content:\n\n{{ content }}",
    ),
    (
        REPURPOSE_TWEETS,
        "Create 3 engaging tweets from this content. Each tweet should be under 280 characters \
and form a coherent thread. Put each tweet on its own line:\n\n{{ content }}",
    ),
    (
        REPURPOSE_INSTAGRAM,
        "Create an engaging Instagram caption (under 120 characters) from this content:\n\n{{ content }}",
    ),
    (
        FORMAT_LINKEDIN,
        "Convert this blog post into a professional LinkedIn post with a {{ tone }} tone. \
Make it engaging, include relevant hashtags, and keep it under 1300 characters:\n\n{{ blog }}",
    ),
    (
        FORMAT_TWITTER,
        "Convert this blog post into a Twitter thread (3-5 tweets) with a {{ tone }} tone. \
Each tweet should be under 280 characters and form a coherent story. \
Put each tweet on its own line:\n\n{{ blog }}",
    ),
    (
        FORMAT_MEDIUM,
        "Convert this blog post into a Medium-ready draft with a {{ tone }} tone. \
Add a compelling headline, subheadings, and maintain the same key points but with \
Medium's style:\n\n{{ blog }}",
    ),
    (
        TRANSLATE_TEXT,
        "Translate the following text to {{ language }}. Maintain the original formatting, \
tone, and structure. Only return the translated text without any additional \
explanations:\n\n{{ text }}",
    ),
    (
        TRANSLATE_BLOG,
        "Translate the following blog post to {{ language }}. Maintain the original formatting, \
tone, and structure. Respond with a JSON object with exactly two string fields: \
\"title\" holding the translated title and \"content\" holding the translated body.\n\n\
Title:\n{{ title }}\n\nContent:\n{{ content }}",
    ),
];

/// Compiled prompt templates, built once at startup.
pub struct PromptLibrary {
    tera: Tera,
}

impl PromptLibrary {
    pub fn new() -> Result<Self, AppError> {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);
        tera.add_raw_templates(TEMPLATES.iter().copied())
            .map_err(|e| AppError::Internal(format!("Invalid prompt template: {e}")))?;
        Ok(Self { tera })
    }

    /// Render a template with any serializable context.
    pub fn render<C: Serialize>(&self, name: &str, context: &C) -> Result<String, AppError> {
        let context = Context::from_serialize(context)
            .map_err(|e| AppError::Internal(format!("Invalid prompt context: {e}")))?;
        self.tera
            .render(name, &context)
            .map_err(|e| AppError::Internal(format!("Failed to render prompt '{name}': {e}")))
    }
}
