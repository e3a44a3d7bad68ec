use axum::http::StatusCode;
use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};

use crate::api::errors::ApiJson;
use crate::app::AppState;
use crate::auth::models::AuthenticatedUser;
use crate::auth::password::{hash_password, verify_password};
use crate::auth::session::SESSION_COOKIE;
use crate::db::models::{normalize_email, User};
use crate::db::user_repository::UserRepository;
use crate::error::AppError;

/// Registration request body.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub name: String,
}

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Login response body.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub user: AuthenticatedUser,
}

/// Create an account. The password is stored only as an Argon2 hash.
pub async fn process_register(
    users: &dyn UserRepository,
    request: RegisterRequest,
) -> Result<User, AppError> {
    if request.email.trim().is_empty()
        || request.password.is_empty()
        || request.name.trim().is_empty()
    {
        return Err(AppError::BadRequest("Missing required fields".into()));
    }

    let email = normalize_email(&request.email);
    if users.find_by_email(&email).await?.is_some() {
        return Err(AppError::BadRequest("User already exists".into()));
    }

    let user = User::new(&email, &request.name, hash_password(&request.password)?);
    users.insert(&user).await.map_err(|e| match e {
        // Lost a race with a concurrent registration of the same email.
        AppError::Conflict(_) => AppError::BadRequest("User already exists".into()),
        other => other,
    })?;

    tracing::info!(user_id = %user.id, "Registered new user");
    Ok(user)
}

/// Check credentials and return the session identity.
pub async fn process_login(
    users: &dyn UserRepository,
    request: LoginRequest,
) -> Result<AuthenticatedUser, AppError> {
    let invalid = || AppError::Auth("Invalid email or password".into());

    if request.email.trim().is_empty() || request.password.is_empty() {
        return Err(invalid());
    }

    let user = users
        .find_by_email(&normalize_email(&request.email))
        .await?
        .ok_or_else(invalid)?;

    if !verify_password(&request.password, &user.password_hash)? {
        return Err(invalid());
    }

    Ok(AuthenticatedUser::from(&user))
}

/// `POST /api/auth/register`
pub async fn register_handler(
    axum::extract::State(state): axum::extract::State<AppState>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, axum::Json<MessageResponse>), AppError> {
    process_register(state.user_repo.as_ref(), request).await?;

    Ok((
        StatusCode::CREATED,
        axum::Json(MessageResponse {
            message: "User created successfully".to_string(),
        }),
    ))
}

/// `POST /api/auth/login`
///
/// On success, sets the `blogsmith_session` cookie and returns the user info.
pub async fn login_handler(
    axum::extract::State(state): axum::extract::State<AppState>,
    jar: CookieJar,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<(CookieJar, axum::Json<LoginResponse>), AppError> {
    let user = process_login(state.user_repo.as_ref(), request).await?;
    let token = state.sessions.issue(&user)?;

    let cookie = Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(state.sessions.ttl_seconds()))
        .build();

    tracing::debug!(user_id = %user.user_id, "User logged in");

    Ok((
        jar.add(cookie),
        axum::Json(LoginResponse {
            message: "Login successful".to_string(),
            user,
        }),
    ))
}

/// `GET /api/auth/me` returns the current session user.
pub async fn me_handler(user: AuthenticatedUser) -> axum::Json<AuthenticatedUser> {
    axum::Json(user)
}

/// `POST /api/auth/logout` clears the session cookie.
pub async fn logout_handler(jar: CookieJar) -> CookieJar {
    let cookie = Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .removal()
        .build();

    jar.remove(cookie)
}
