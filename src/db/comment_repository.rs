use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;

use crate::db::models::Comment;
use crate::error::AppError;

/// Repository trait for blog comments.
#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn insert(&self, comment: &Comment) -> Result<(), AppError>;

    /// Comments on a blog, newest first.
    async fn list_for_blog(&self, blog_id: &ObjectId) -> Result<Vec<Comment>, AppError>;
}

/// MongoDB implementation of the CommentRepository.
pub struct MongoCommentRepository {
    collection: mongodb::Collection<Comment>,
}

impl MongoCommentRepository {
    pub fn new(db: &mongodb::Database) -> Self {
        Self {
            collection: db.collection(crate::db::connection::COMMENTS),
        }
    }
}

#[async_trait]
impl CommentRepository for MongoCommentRepository {
    async fn insert(&self, comment: &Comment) -> Result<(), AppError> {
        self.collection.insert_one(comment).await?;
        Ok(())
    }

    async fn list_for_blog(&self, blog_id: &ObjectId) -> Result<Vec<Comment>, AppError> {
        use futures::TryStreamExt;
        use mongodb::bson::doc;
        use mongodb::options::FindOptions;

        let options = FindOptions::builder()
            .sort(doc! { "createdAt": -1, "_id": -1 })
            .build();

        let mut cursor = self
            .collection
            .find(doc! { "blogId": *blog_id })
            .with_options(options)
            .await?;

        let mut comments = Vec::new();
        while let Some(comment) = cursor.try_next().await? {
            comments.push(comment);
        }

        Ok(comments)
    }
}
