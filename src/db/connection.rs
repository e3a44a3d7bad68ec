use mongodb::bson::doc;
use mongodb::options::IndexOptions;
use mongodb::{Client, Database, IndexModel};

use crate::db::models::{Blog, Comment, User};
use crate::error::AppError;

pub const BLOGS: &str = "blogs";
pub const COMMENTS: &str = "comments";
pub const USERS: &str = "users";

/// Owns the process-wide MongoDB client.
///
/// Created once at startup and handed to the repositories; call
/// [`MongoConnection::shutdown`] after the server stops.
pub struct MongoConnection {
    client: Client,
    database: Database,
}

impl MongoConnection {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        let client = Client::with_uri_str(uri)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to MongoDB: {e}")))?;

        // The driver connects lazily; ping so a bad URI fails at startup.
        let database = client.database(database);
        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| AppError::Database(format!("MongoDB ping failed: {e}")))?;

        tracing::info!(database = database.name(), "Connected to MongoDB");

        Ok(Self { client, database })
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    /// Create the indexes the repositories rely on. Idempotent.
    pub async fn ensure_indexes(&self) -> Result<(), AppError> {
        let slug_index = IndexModel::builder()
            .keys(doc! { "slug": 1 })
            .options(IndexOptions::builder().unique(true).sparse(true).build())
            .build();
        let author_index = IndexModel::builder()
            .keys(doc! { "author": 1, "createdAt": -1 })
            .build();
        let published_index = IndexModel::builder()
            .keys(doc! { "published": 1, "createdAt": -1 })
            .build();

        self.database
            .collection::<Blog>(BLOGS)
            .create_indexes([slug_index, author_index, published_index])
            .await?;

        self.database
            .collection::<Comment>(COMMENTS)
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "blogId": 1, "createdAt": -1 })
                    .build(),
            )
            .await?;

        self.database
            .collection::<User>(USERS)
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "email": 1 })
                    .options(IndexOptions::builder().unique(true).build())
                    .build(),
            )
            .await?;

        tracing::debug!("MongoDB indexes ensured");
        Ok(())
    }

    /// Close the client, waiting for in-flight operations to finish.
    pub async fn shutdown(self) {
        self.client.shutdown().await;
        tracing::info!("MongoDB connection closed");
    }
}
