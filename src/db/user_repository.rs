use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;

use crate::db::models::User;
use crate::error::AppError;

/// Repository trait for registered users.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user. An already registered email fails with `Conflict`.
    async fn insert(&self, user: &User) -> Result<(), AppError>;

    /// Look up by normalized email.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<User>, AppError>;

    /// Fetch several users at once. Unknown ids are silently skipped.
    async fn find_by_ids(&self, ids: &[ObjectId]) -> Result<Vec<User>, AppError>;
}

/// MongoDB implementation of the UserRepository.
pub struct MongoUserRepository {
    collection: mongodb::Collection<User>,
}

impl MongoUserRepository {
    pub fn new(db: &mongodb::Database) -> Self {
        Self {
            collection: db.collection(crate::db::connection::USERS),
        }
    }
}

#[async_trait]
impl UserRepository for MongoUserRepository {
    async fn insert(&self, user: &User) -> Result<(), AppError> {
        self.collection.insert_one(user).await.map_err(|e| {
            if crate::error::is_duplicate_key(&e) {
                AppError::Conflict("User already exists".into())
            } else {
                AppError::Database(e.to_string())
            }
        })?;
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        use mongodb::bson::doc;

        Ok(self.collection.find_one(doc! { "email": email }).await?)
    }

    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<User>, AppError> {
        use mongodb::bson::doc;

        Ok(self.collection.find_one(doc! { "_id": *id }).await?)
    }

    async fn find_by_ids(&self, ids: &[ObjectId]) -> Result<Vec<User>, AppError> {
        use futures::TryStreamExt;
        use mongodb::bson::doc;

        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let cursor = self
            .collection
            .find(doc! { "_id": { "$in": ids.to_vec() } })
            .await?;

        Ok(cursor.try_collect::<Vec<User>>().await?)
    }
}
