use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::db::models::User;
use crate::error::AppError;

/// The identity attached to a request by a valid session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    /// Hex string of the user's ObjectId.
    pub user_id: String,
    pub email: String,
    pub name: String,
}

impl AuthenticatedUser {
    /// The user id as an ObjectId. A malformed id means a forged or stale
    /// session, so it is reported as unauthorized.
    pub fn object_id(&self) -> Result<ObjectId, AppError> {
        ObjectId::parse_str(&self.user_id)
            .map_err(|_| AppError::Auth("Invalid session".into()))
    }
}

impl From<&User> for AuthenticatedUser {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id.to_hex(),
            email: user.email.clone(),
            name: user.name.clone(),
        }
    }
}
