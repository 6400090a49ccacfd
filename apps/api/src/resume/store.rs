//! The caller's single markdown resume.

use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::resume::Resume;

const MAX_RESUME_CHARS: usize = 50_000;

pub fn validate_content(content: &str) -> Result<(), AppError> {
    if content.trim().is_empty() {
        return Err(AppError::Validation("content must not be empty".to_string()));
    }
    if content.chars().count() > MAX_RESUME_CHARS {
        return Err(AppError::Validation(format!(
            "content exceeds {MAX_RESUME_CHARS} characters"
        )));
    }
    Ok(())
}

pub async fn get_resume(pool: &PgPool, user_id: Uuid) -> Result<Resume, AppError> {
    sqlx::query_as::<_, Resume>("SELECT * FROM resumes WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Resume not found".to_string()))
}

/// Creates the resume on first save, replaces its content afterwards.
pub async fn save_resume(pool: &PgPool, user_id: Uuid, content: &str) -> Result<Resume, AppError> {
    validate_content(content)?;
    let resume = sqlx::query_as::<_, Resume>(
        r#"
        INSERT INTO resumes (id, user_id, content)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_id)
        DO UPDATE SET content = EXCLUDED.content, updated_at = now()
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(content)
    .fetch_one(pool)
    .await?;

    info!("Saved resume for user {user_id}");
    Ok(resume)
}
