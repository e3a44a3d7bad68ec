//! In-memory repositories for unit tests.
//!
//! They mirror the conditional-update semantics of the MongoDB
//! implementations so lifecycle logic can be tested without a database.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use mongodb::bson::oid::ObjectId;

use crate::db::comment_repository::CommentRepository;
use crate::db::models::{Blog, BlogChanges, Comment, User};
use crate::db::repository::BlogRepository;
use crate::db::user_repository::UserRepository;
use crate::error::AppError;

#[derive(Default)]
pub struct MemoryBlogRepo {
    pub blogs: Mutex<Vec<Blog>>,
}

impl MemoryBlogRepo {
    fn slug_taken(blogs: &[Blog], slug: &Option<String>, except: &ObjectId) -> bool {
        slug.is_some()
            && blogs
                .iter()
                .any(|b| &b.id != except && b.slug.is_some() && b.slug == *slug)
    }

    fn modify<F>(&self, id: &ObjectId, f: F) -> Option<Blog>
    where
        F: FnOnce(&mut Blog) -> bool,
    {
        let mut blogs = self.blogs.lock().unwrap();
        let blog = blogs.iter_mut().find(|b| &b.id == id)?;
        if f(blog) {
            Some(blog.clone())
        } else {
            None
        }
    }

    fn sorted(mut blogs: Vec<Blog>) -> Vec<Blog> {
        blogs.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        blogs
    }
}

#[async_trait]
impl BlogRepository for MemoryBlogRepo {
    async fn insert(&self, blog: &Blog) -> Result<(), AppError> {
        let mut blogs = self.blogs.lock().unwrap();
        if Self::slug_taken(&blogs, &blog.slug, &blog.id) {
            return Err(AppError::Conflict("A blog with this slug already exists".into()));
        }
        blogs.push(blog.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<Blog>, AppError> {
        Ok(self.blogs.lock().unwrap().iter().find(|b| &b.id == id).cloned())
    }

    async fn record_view_by_id(&self, id: &ObjectId) -> Result<Option<Blog>, AppError> {
        Ok(self.modify(id, |b| {
            b.views += 1;
            true
        }))
    }

    async fn record_view_by_slug(
        &self,
        slug: &str,
        published_only: bool,
    ) -> Result<Option<Blog>, AppError> {
        let mut blogs = self.blogs.lock().unwrap();
        let blog = blogs
            .iter_mut()
            .find(|b| b.slug.as_deref() == Some(slug) && (!published_only || b.published));
        Ok(blog.map(|b| {
            b.views += 1;
            b.clone()
        }))
    }

    async fn list_by_author(&self, author: &ObjectId) -> Result<Vec<Blog>, AppError> {
        let blogs = self.blogs.lock().unwrap();
        Ok(Self::sorted(
            blogs.iter().filter(|b| &b.author == author).cloned().collect(),
        ))
    }

    async fn list_published(&self) -> Result<Vec<Blog>, AppError> {
        let blogs = self.blogs.lock().unwrap();
        Ok(Self::sorted(
            blogs.iter().filter(|b| b.published).cloned().collect(),
        ))
    }

    async fn set_published<'a>(
        &self,
        id: &ObjectId,
        published: bool,
        share_url: Option<&'a str>,
    ) -> Result<Option<Blog>, AppError> {
        Ok(self.modify(id, |b| {
            b.published = published;
            if let Some(url) = share_url {
                b.share_url = url.to_string();
            }
            b.updated_at = Utc::now();
            true
        }))
    }

    async fn update_fields(
        &self,
        id: &ObjectId,
        changes: &BlogChanges,
    ) -> Result<Option<Blog>, AppError> {
        let mut blogs = self.blogs.lock().unwrap();
        if let Some(slug) = &changes.slug {
            if Self::slug_taken(&blogs, slug, id) {
                return Err(AppError::Conflict("A blog with this slug already exists".into()));
            }
        }

        let Some(blog) = blogs.iter_mut().find(|b| &b.id == id) else {
            return Ok(None);
        };
        if let Some(title) = &changes.title {
            blog.title = title.clone();
        }
        if let Some(slug) = &changes.slug {
            blog.slug = slug.clone();
        }
        if let Some(content) = &changes.content {
            blog.content = content.clone();
        }
        blog.updated_at = Utc::now();
        Ok(Some(blog.clone()))
    }

    async fn add_like(&self, id: &ObjectId, user: &ObjectId) -> Result<Option<Blog>, AppError> {
        Ok(self.modify(id, |b| {
            if b.liked_by.contains(user) {
                return false;
            }
            b.liked_by.push(*user);
            b.likes += 1;
            true
        }))
    }

    async fn remove_like(
        &self,
        id: &ObjectId,
        user: &ObjectId,
    ) -> Result<Option<Blog>, AppError> {
        Ok(self.modify(id, |b| {
            if !b.liked_by.contains(user) {
                return false;
            }
            b.liked_by.retain(|u| u != user);
            b.likes = (b.likes - 1).max(0);
            true
        }))
    }

    async fn set_share_url(&self, id: &ObjectId, share_url: &str) -> Result<(), AppError> {
        self.modify(id, |b| {
            b.share_url = share_url.to_string();
            true
        });
        Ok(())
    }

    async fn backfill_engagement(&self) -> Result<u64, AppError> {
        // Every in-memory blog already carries the engagement fields.
        Ok(0)
    }
}

#[derive(Default)]
pub struct MemoryCommentRepo {
    pub comments: Mutex<Vec<Comment>>,
}

#[async_trait]
impl CommentRepository for MemoryCommentRepo {
    async fn insert(&self, comment: &Comment) -> Result<(), AppError> {
        self.comments.lock().unwrap().push(comment.clone());
        Ok(())
    }

    async fn list_for_blog(&self, blog_id: &ObjectId) -> Result<Vec<Comment>, AppError> {
        let mut comments: Vec<Comment> = self
            .comments
            .lock()
            .unwrap()
            .iter()
            .filter(|c| &c.blog_id == blog_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(comments)
    }
}

#[derive(Default)]
pub struct MemoryUserRepo {
    pub users: Mutex<Vec<User>>,
}

impl MemoryUserRepo {
    /// Seed a user directly, bypassing password hashing.
    pub fn with_user(name: &str, email: &str) -> (Self, User) {
        let repo = Self::default();
        let user = User::new(email, name, "unused-hash".to_string());
        repo.users.lock().unwrap().push(user.clone());
        (repo, user)
    }

    pub fn add(&self, name: &str, email: &str) -> User {
        let user = User::new(email, name, "unused-hash".to_string());
        self.users.lock().unwrap().push(user.clone());
        user
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepo {
    async fn insert(&self, user: &User) -> Result<(), AppError> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == user.email) {
            return Err(AppError::Conflict("User already exists".into()));
        }
        users.push(user.clone());
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<User>, AppError> {
        Ok(self.users.lock().unwrap().iter().find(|u| &u.id == id).cloned())
    }

    async fn find_by_ids(&self, ids: &[ObjectId]) -> Result<Vec<User>, AppError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .filter(|u| ids.contains(&u.id))
            .cloned()
            .collect())
    }
}
