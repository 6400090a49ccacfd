//! Cover letter generation and storage. Every query is scoped to the owning
//! user; a row that exists but belongs to someone else is reported as missing.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use sqlx::PgPool;
use tracing::{error, info};
use uuid::Uuid;

use crate::cover_letter::prompts::{build_cover_letter_prompt, CoverLetterRequest};
use crate::errors::AppError;
use crate::llm_client::normalize::strip_code_fences;
use crate::llm_client::{generate_text, TextGenerator};
use crate::models::cover_letter::CoverLetter;
use crate::models::user::User;

pub const STATUS_COMPLETED: &str = "completed";

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Cover letter {id} not found"))
}

pub fn validate_request(req: &CoverLetterRequest) -> Result<(), AppError> {
    if req.job_title.trim().is_empty() {
        return Err(AppError::Validation("job_title is required".to_string()));
    }
    if req.company_name.trim().is_empty() {
        return Err(AppError::Validation("company_name is required".to_string()));
    }
    Ok(())
}

/// Asks the model for a letter. No fallback: upstream failures propagate.
pub async fn write_cover_letter(
    llm: &Arc<dyn TextGenerator>,
    req: &CoverLetterRequest,
    user: &User,
    timeout: Duration,
) -> Result<String, AppError> {
    validate_request(req)?;
    let prompt = build_cover_letter_prompt(req, user, Utc::now().date_naive());
    let text = generate_text(llm, prompt, timeout).await.map_err(|e| {
        error!("Cover letter generation failed for user {}: {e}", user.id);
        e
    })?;
    // Asked not to, but models still fence markdown sometimes.
    Ok(strip_code_fences(&text).trim().to_string())
}

pub async fn generate_cover_letter(
    pool: &PgPool,
    llm: &Arc<dyn TextGenerator>,
    user: &User,
    req: &CoverLetterRequest,
    timeout: Duration,
) -> Result<CoverLetter, AppError> {
    let content = write_cover_letter(llm, req, user, timeout).await?;

    let letter = sqlx::query_as::<_, CoverLetter>(
        r#"
        INSERT INTO cover_letters (id, user_id, content, job_description, company_name, job_title, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user.id)
    .bind(&content)
    .bind(&req.job_description)
    .bind(req.company_name.trim())
    .bind(req.job_title.trim())
    .bind(STATUS_COMPLETED)
    .fetch_one(pool)
    .await?;

    info!("Stored cover letter {} for user {}", letter.id, user.id);
    Ok(letter)
}

/// Newest first.
pub async fn list_cover_letters(pool: &PgPool, user_id: Uuid) -> Result<Vec<CoverLetter>, AppError> {
    let letters = sqlx::query_as::<_, CoverLetter>(
        "SELECT * FROM cover_letters WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(letters)
}

pub async fn get_cover_letter(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<CoverLetter, AppError> {
    sqlx::query_as::<_, CoverLetter>("SELECT * FROM cover_letters WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| not_found(id))
}

/// Replaces the letter body after manual editing; status returns to `completed`.
pub async fn update_cover_letter(
    pool: &PgPool,
    user_id: Uuid,
    id: Uuid,
    content: &str,
) -> Result<CoverLetter, AppError> {
    if content.trim().is_empty() {
        return Err(AppError::Validation("content must not be empty".to_string()));
    }
    sqlx::query_as::<_, CoverLetter>(
        r#"
        UPDATE cover_letters
        SET content = $3, status = $4, updated_at = now()
        WHERE id = $1 AND user_id = $2
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(content)
    .bind(STATUS_COMPLETED)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| not_found(id))
}

pub async fn delete_cover_letter(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM cover_letters WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(not_found(id));
    }
    info!("Deleted cover letter {id}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::testing::FakeGenerator;

    fn user() -> User {
        User {
            id: Uuid::new_v4(),
            external_id: "user_1".to_string(),
            email: "sam@example.com".to_string(),
            name: None,
            industry: Some("Finance".to_string()),
            experience: None,
            bio: None,
            skills: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn request() -> CoverLetterRequest {
        CoverLetterRequest {
            job_title: "Analyst".to_string(),
            company_name: "Globex".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_title_and_company_required() {
        let missing_title = CoverLetterRequest {
            job_title: " ".to_string(),
            ..request()
        };
        let missing_company = CoverLetterRequest {
            company_name: String::new(),
            ..request()
        };
        assert!(matches!(validate_request(&missing_title), Err(AppError::Validation(_))));
        assert!(matches!(validate_request(&missing_company), Err(AppError::Validation(_))));
        assert!(validate_request(&request()).is_ok());
    }

    #[tokio::test]
    async fn test_letter_text_is_unfenced() {
        let fake = Arc::new(FakeGenerator::replying("```markdown\nDear Hiring Manager,\n```"));
        let llm: Arc<dyn TextGenerator> = fake.clone();

        let text = write_cover_letter(&llm, &request(), &user(), Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(text, "Dear Hiring Manager,");
        assert!(fake.prompts.lock().unwrap()[0].contains("Analyst position at Globex"));
    }

    #[tokio::test]
    async fn test_provider_failure_is_surfaced() {
        let llm = FakeGenerator::failing(500).into_dyn();
        let err = write_cover_letter(&llm, &request(), &user(), Duration::from_secs(60))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UpstreamFailure(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_surfaced() {
        let llm = FakeGenerator::replying("Dear Hiring Manager,")
            .delayed(Duration::from_secs(120))
            .into_dyn();
        let err = write_cover_letter(&llm, &request(), &user(), Duration::from_secs(60))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UpstreamTimeout(_)));
    }

    #[tokio::test]
    async fn test_invalid_request_skips_the_model() {
        let fake = Arc::new(FakeGenerator::replying("letter"));
        let llm: Arc<dyn TextGenerator> = fake.clone();
        let req = CoverLetterRequest::default();
        assert!(write_cover_letter(&llm, &req, &user(), Duration::from_secs(60))
            .await
            .is_err());
        assert_eq!(fake.calls(), 0);
    }
}
