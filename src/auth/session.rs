use chrono::{TimeDelta, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::auth::models::AuthenticatedUser;
use crate::error::AppError;

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "blogsmith_session";

const ISSUER: &str = "blogsmith";

/// Claims embedded in a session token.
#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    sub: String,
    email: String,
    name: String,
    iat: i64,
    exp: i64,
    iss: String,
}

/// Issues and verifies HS256 session tokens.
pub struct SessionManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_hours: i64,
}

impl SessionManager {
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl_hours,
        }
    }

    /// Session lifetime, used for the cookie `Max-Age`.
    pub fn ttl_seconds(&self) -> i64 {
        self.ttl_hours * 3600
    }

    pub fn issue(&self, user: &AuthenticatedUser) -> Result<String, AppError> {
        let now = Utc::now();
        let exp = now + TimeDelta::hours(self.ttl_hours);

        let claims = SessionClaims {
            sub: user.user_id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            iss: ISSUER.to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to sign session: {e}")))
    }

    pub fn verify(&self, token: &str) -> Result<AuthenticatedUser, AppError> {
        let mut validation = Validation::default();
        validation.set_issuer(&[ISSUER]);

        let data = decode::<SessionClaims>(token, &self.decoding_key, &validation).map_err(|e| {
            tracing::debug!("Rejected session token: {e}");
            AppError::Auth("Unauthorized".into())
        })?;

        Ok(AuthenticatedUser {
            user_id: data.claims.sub,
            email: data.claims.email,
            name: data.claims.name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> AuthenticatedUser {
        AuthenticatedUser {
            user_id: "65f0c0ffee0000000000abcd".to_string(),
            email: "writer@example.com".to_string(),
            name: "Writer".to_string(),
        }
    }

    #[test]
    fn test_issue_and_verify() {
        let sessions = SessionManager::new("test-secret", 1);
        let token = sessions.issue(&user()).unwrap();
        assert_eq!(sessions.verify(&token).unwrap(), user());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = SessionManager::new("secret-a", 1).issue(&user()).unwrap();
        let result = SessionManager::new("secret-b", 1).verify(&token);
        assert!(matches!(result, Err(AppError::Auth(_))));
    }

    #[test]
    fn test_expired_token_rejected() {
        // Negative TTL puts `exp` well outside the default leeway.
        let sessions = SessionManager::new("test-secret", -2);
        let token = sessions.issue(&user()).unwrap();
        assert!(matches!(sessions.verify(&token), Err(AppError::Auth(_))));
    }

    #[test]
    fn test_garbage_rejected() {
        let sessions = SessionManager::new("test-secret", 1);
        assert!(sessions.verify("not-a-token").is_err());
    }

    #[test]
    fn test_ttl_seconds() {
        assert_eq!(SessionManager::new("s", 24).ttl_seconds(), 86_400);
    }
}
