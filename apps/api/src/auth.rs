//! Caller identity.
//!
//! Sign-in is handled entirely by the external identity provider. Its
//! gateway forwards the authenticated subject in `x-authenticated-user`,
//! along with the account's email and display name. This module maps that
//! subject onto the local `users` row, creating the row on first contact.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::user::User;

pub const USER_HEADER: &str = "x-authenticated-user";
pub const EMAIL_HEADER: &str = "x-authenticated-email";
pub const NAME_HEADER: &str = "x-authenticated-name";

/// Identity-provider subject of the caller, plus the profile claims the
/// gateway forwards with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub external_id: String,
    pub email: Option<String>,
    pub name: Option<String>,
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

impl AuthUser {
    pub fn from_header_value(value: Option<&str>) -> Result<Self, AppError> {
        Self::from_headers(value, None, None)
    }

    pub fn from_headers(
        subject: Option<&str>,
        email: Option<&str>,
        name: Option<&str>,
    ) -> Result<Self, AppError> {
        let external_id = non_blank(subject).ok_or(AppError::Unauthorized)?;
        Ok(AuthUser {
            external_id,
            email: non_blank(email).map(|e| e.to_lowercase()),
            name: non_blank(name),
        })
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| parts.headers.get(name).and_then(|v| v.to_str().ok());
        AuthUser::from_headers(header(USER_HEADER), header(EMAIL_HEADER), header(NAME_HEADER))
    }
}

async fn find_user(pool: &PgPool, external_id: &str) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE external_id = $1")
        .bind(external_id)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

/// Loads the local profile for the caller, creating it on first sign-in when
/// the gateway supplied an email. Without an email, or when the email already
/// belongs to another subject, the caller is treated as unauthenticated.
pub async fn load_user(pool: &PgPool, auth: &AuthUser) -> Result<User, AppError> {
    if let Some(user) = find_user(pool, &auth.external_id).await? {
        return Ok(user);
    }
    let Some(email) = auth.email.as_deref() else {
        return Err(AppError::Unauthorized);
    };

    let created = sqlx::query(
        r#"
        INSERT INTO users (id, external_id, email, name)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&auth.external_id)
    .bind(email)
    .bind(&auth.name)
    .execute(pool)
    .await?;
    if created.rows_affected() > 0 {
        info!("Provisioned local profile for subject {}", auth.external_id);
    }

    // A concurrent first request may have won the insert.
    find_user(pool, &auth.external_id)
        .await?
        .ok_or(AppError::Unauthorized)
}
