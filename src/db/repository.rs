use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;

use crate::db::models::{Blog, BlogChanges};
use crate::error::AppError;

/// Repository trait for blog operations.
///
/// Every mutation is a single-document atomic update so concurrent requests
/// cannot lose view or like increments. Methods returning `Option<Blog>`
/// yield the document as it is *after* the update, or `None` when the
/// filter matched nothing.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BlogRepository: Send + Sync {
    /// Insert a new blog. A duplicate slug fails with `Conflict`.
    async fn insert(&self, blog: &Blog) -> Result<(), AppError>;

    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<Blog>, AppError>;

    /// Increment `views` by one on the blog with this id.
    async fn record_view_by_id(&self, id: &ObjectId) -> Result<Option<Blog>, AppError>;

    /// Increment `views` by one on the blog with this slug, optionally
    /// restricted to published blogs.
    async fn record_view_by_slug(
        &self,
        slug: &str,
        published_only: bool,
    ) -> Result<Option<Blog>, AppError>;

    /// All blogs of one author, newest first.
    async fn list_by_author(&self, author: &ObjectId) -> Result<Vec<Blog>, AppError>;

    /// All published blogs, newest first.
    async fn list_published(&self) -> Result<Vec<Blog>, AppError>;

    /// Set the `published` flag. `share_url` is written only when given.
    async fn set_published<'a>(
        &self,
        id: &ObjectId,
        published: bool,
        share_url: Option<&'a str>,
    ) -> Result<Option<Blog>, AppError>;

    /// Apply an author edit. A duplicate slug fails with `Conflict`.
    async fn update_fields(
        &self,
        id: &ObjectId,
        changes: &BlogChanges,
    ) -> Result<Option<Blog>, AppError>;

    /// Add `user` to `likedBy` and increment `likes`, only if not already liked.
    async fn add_like(&self, id: &ObjectId, user: &ObjectId) -> Result<Option<Blog>, AppError>;

    /// Remove `user` from `likedBy` and decrement `likes` (not below zero),
    /// only if liked.
    async fn remove_like(&self, id: &ObjectId, user: &ObjectId)
        -> Result<Option<Blog>, AppError>;

    /// Overwrite the stored share URL without touching `published`.
    async fn set_share_url(&self, id: &ObjectId, share_url: &str) -> Result<(), AppError>;

    /// Give blogs written before likes existed `likes: 0, likedBy: []`.
    /// Returns the number of blogs modified.
    async fn backfill_engagement(&self) -> Result<u64, AppError>;
}

/// MongoDB implementation of the BlogRepository.
pub struct MongoBlogRepository {
    collection: mongodb::Collection<Blog>,
}

impl MongoBlogRepository {
    pub fn new(db: &mongodb::Database) -> Self {
        Self {
            collection: db.collection(crate::db::connection::BLOGS),
        }
    }

    async fn find_and_update(
        &self,
        filter: mongodb::bson::Document,
        update: impl Into<mongodb::options::UpdateModifications>,
    ) -> Result<Option<Blog>, AppError> {
        use mongodb::options::{FindOneAndUpdateOptions, ReturnDocument};

        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        self.collection
            .find_one_and_update(filter, update)
            .with_options(options)
            .await
            .map_err(map_write_error)
    }

    async fn find_sorted(&self, filter: mongodb::bson::Document) -> Result<Vec<Blog>, AppError> {
        use futures::TryStreamExt;
        use mongodb::bson::doc;
        use mongodb::options::FindOptions;

        let options = FindOptions::builder()
            .sort(doc! { "createdAt": -1, "_id": -1 })
            .build();

        let cursor = self.collection.find(filter).with_options(options).await?;
        Ok(cursor.try_collect::<Vec<Blog>>().await?)
    }
}

fn map_write_error(err: mongodb::error::Error) -> AppError {
    if crate::error::is_duplicate_key(&err) {
        AppError::Conflict("A blog with this slug already exists".into())
    } else {
        AppError::Database(err.to_string())
    }
}

fn now() -> mongodb::bson::DateTime {
    mongodb::bson::DateTime::now()
}

#[async_trait]
impl BlogRepository for MongoBlogRepository {
    async fn insert(&self, blog: &Blog) -> Result<(), AppError> {
        self.collection
            .insert_one(blog)
            .await
            .map_err(map_write_error)?;
        Ok(())
    }

    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<Blog>, AppError> {
        use mongodb::bson::doc;

        Ok(self.collection.find_one(doc! { "_id": *id }).await?)
    }

    async fn record_view_by_id(&self, id: &ObjectId) -> Result<Option<Blog>, AppError> {
        use mongodb::bson::doc;

        self.find_and_update(doc! { "_id": *id }, doc! { "$inc": { "views": 1 } })
            .await
    }

    async fn record_view_by_slug(
        &self,
        slug: &str,
        published_only: bool,
    ) -> Result<Option<Blog>, AppError> {
        use mongodb::bson::doc;

        let mut filter = doc! { "slug": slug };
        if published_only {
            filter.insert("published", true);
        }

        self.find_and_update(filter, doc! { "$inc": { "views": 1 } })
            .await
    }

    async fn list_by_author(&self, author: &ObjectId) -> Result<Vec<Blog>, AppError> {
        use mongodb::bson::doc;

        self.find_sorted(doc! { "author": *author }).await
    }

    async fn list_published(&self) -> Result<Vec<Blog>, AppError> {
        use mongodb::bson::doc;

        self.find_sorted(doc! { "published": true }).await
    }

    async fn set_published<'a>(
        &self,
        id: &ObjectId,
        published: bool,
        share_url: Option<&'a str>,
    ) -> Result<Option<Blog>, AppError> {
        use mongodb::bson::doc;

        let mut set = doc! { "published": published, "updatedAt": now() };
        if let Some(url) = share_url {
            set.insert("shareUrl", url);
        }

        self.find_and_update(doc! { "_id": *id }, doc! { "$set": set })
            .await
    }

    async fn update_fields(
        &self,
        id: &ObjectId,
        changes: &BlogChanges,
    ) -> Result<Option<Blog>, AppError> {
        use mongodb::bson::doc;

        let mut set = doc! { "updatedAt": now() };
        let mut unset = doc! {};

        if let Some(title) = &changes.title {
            set.insert("title", title.as_str());
        }
        match &changes.slug {
            Some(Some(slug)) => {
                set.insert("slug", slug.as_str());
            }
            Some(None) => {
                unset.insert("slug", "");
            }
            None => {}
        }
        if let Some(content) = &changes.content {
            set.insert("content", content.as_str());
        }

        let mut update = doc! { "$set": set };
        if !unset.is_empty() {
            update.insert("$unset", unset);
        }

        self.find_and_update(doc! { "_id": *id }, update).await
    }

    async fn add_like(&self, id: &ObjectId, user: &ObjectId) -> Result<Option<Blog>, AppError> {
        use mongodb::bson::doc;

        self.find_and_update(
            doc! { "_id": *id, "likedBy": { "$ne": *user } },
            doc! {
                "$addToSet": { "likedBy": *user },
                "$inc": { "likes": 1 },
            },
        )
        .await
    }

    async fn remove_like(
        &self,
        id: &ObjectId,
        user: &ObjectId,
    ) -> Result<Option<Blog>, AppError> {
        use mongodb::bson::doc;

        // Update pipeline: `likes` is floored at zero and the other likers keep their order.
        self.find_and_update(
            doc! { "_id": *id, "likedBy": *user },
            vec![
                doc! {
                    "$set": {
                        "likedBy": {
                            "$filter": { "input": "$likedBy", "cond": { "$ne": ["$$this", *user] } }
                        }
                    }
                },
                doc! { "$set": { "likes": { "$max": [0_i64, { "$subtract": ["$likes", 1_i64] }] } } },
            ],
        )
        .await
    }

    async fn set_share_url(&self, id: &ObjectId, share_url: &str) -> Result<(), AppError> {
        use mongodb::bson::doc;

        self.collection
            .update_one(
                doc! { "_id": *id },
                doc! { "$set": { "shareUrl": share_url, "updatedAt": now() } },
            )
            .await?;

        Ok(())
    }

    async fn backfill_engagement(&self) -> Result<u64, AppError> {
        use mongodb::bson::doc;

        let result = self
            .collection
            .update_many(
                doc! { "likes": { "$exists": false } },
                doc! { "$set": { "likes": 0_i64, "likedBy": [] } },
            )
            .await?;

        Ok(result.modified_count)
    }
}
