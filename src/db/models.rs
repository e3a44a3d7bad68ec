use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::models::slug::slugify;

/// A blog post stored in the `blogs` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blog {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub title: String,
    pub content: String,
    /// The free-text idea the post was generated from.
    pub idea: String,
    /// Owning user.
    pub author: ObjectId,
    #[serde(default)]
    pub published: bool,
    /// Public link, filled in on first publish.
    #[serde(default)]
    pub share_url: String,
    /// Derived from the title. Omitted (not null) when empty so the sparse
    /// unique index ignores it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default)]
    pub views: i64,
    #[serde(default)]
    pub likes: i64,
    #[serde(default)]
    pub liked_by: Vec<ObjectId>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Blog {
    /// Build a fresh, unpublished blog owned by `author`.
    pub fn new(title: String, content: String, idea: String, author: ObjectId) -> Self {
        let now = Utc::now();
        let slug = slugify(&title);
        Self {
            id: ObjectId::new(),
            title,
            content,
            idea,
            author,
            published: false,
            share_url: String::new(),
            slug,
            views: 0,
            likes: 0,
            liked_by: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_liked_by(&self, user: &ObjectId) -> bool {
        self.liked_by.contains(user)
    }
}

/// Field changes applied by an author edit.
///
/// `slug` must always be re-derived together with `title`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlogChanges {
    pub title: Option<String>,
    pub slug: Option<Option<String>>,
    pub content: Option<String>,
}

impl BlogChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none()
    }
}

/// A reader comment in the `comments` collection. Never modified after insert.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub blog_id: ObjectId,
    pub user_id: ObjectId,
    pub content: String,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(blog_id: ObjectId, user_id: ObjectId, content: &str) -> Self {
        Self {
            id: ObjectId::new(),
            blog_id,
            user_id,
            content: content.trim().to_string(),
            created_at: Utc::now(),
        }
    }
}

/// A registered account in the `users` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub email: String,
    pub name: String,
    /// Argon2 PHC string.
    #[serde(rename = "password")]
    pub password_hash: String,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(email: &str, name: &str, password_hash: String) -> Self {
        Self {
            id: ObjectId::new(),
            email: normalize_email(email),
            name: name.trim().to_string(),
            password_hash,
            created_at: Utc::now(),
        }
    }
}

/// Canonical form used for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
