//! Persisted quiz results.

use std::sync::Arc;
use std::time::Duration;

use sqlx::types::Json;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::fallback::DEFAULT_QUIZ_INDUSTRY;
use crate::interview::grading::{grade_answers, GradedQuiz};
use crate::interview::prompts::IMPROVEMENT_TIP_PROMPT_TEMPLATE;
use crate::llm_client::normalize::clamp_str;
use crate::llm_client::prompts::fill_template;
use crate::llm_client::{generate_text, TextGenerator};
use crate::models::assessment::{Assessment, QuizQuestion};
use crate::models::user::User;

pub const ASSESSMENT_CATEGORY: &str = "Technical";
const MAX_TIP_CHARS: usize = 1_000;

pub fn build_improvement_tip_prompt(industry: &str, graded: &GradedQuiz) -> String {
    let wrong_answers = graded
        .wrong_answers()
        .map(|r| {
            format!(
                "Question: \"{}\"\nCorrect Answer: \"{}\"\nUser Answer: \"{}\"",
                r.question, r.answer, r.user_answer
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    fill_template(
        IMPROVEMENT_TIP_PROMPT_TEMPLATE,
        &[("industry", industry), ("wrong_answers", &wrong_answers)],
    )
}

/// Asks for a study tip when at least one answer was wrong. Any upstream
/// failure yields `None`; the result is saved without a tip.
pub async fn improvement_tip(
    llm: &Arc<dyn TextGenerator>,
    industry: Option<&str>,
    graded: &GradedQuiz,
    timeout: Duration,
) -> Option<String> {
    if graded.wrong_answers().next().is_none() {
        return None;
    }
    let prompt = build_improvement_tip_prompt(industry.unwrap_or(DEFAULT_QUIZ_INDUSTRY), graded);
    match generate_text(llm, prompt, timeout).await {
        Ok(tip) => Some(clamp_str(tip, MAX_TIP_CHARS)),
        Err(e) => {
            warn!("Improvement tip generation failed: {e}");
            None
        }
    }
}

/// Grades `answers`, attaches a tip where useful, and stores the result.
pub async fn save_quiz_result(
    pool: &PgPool,
    llm: &Arc<dyn TextGenerator>,
    user: &User,
    questions: &[QuizQuestion],
    answers: &[String],
    timeout: Duration,
) -> Result<Assessment, AppError> {
    let graded = grade_answers(questions, answers)?;
    let tip = improvement_tip(llm, user.industry.as_deref(), &graded, timeout).await;

    let assessment = sqlx::query_as::<_, Assessment>(
        r#"
        INSERT INTO assessments (id, user_id, quiz_score, questions, category, improvement_tip)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user.id)
    .bind(graded.score)
    .bind(Json(&graded.results))
    .bind(ASSESSMENT_CATEGORY)
    .bind(&tip)
    .fetch_one(pool)
    .await?;

    info!(
        "Saved assessment {} for user {} (score {:.1})",
        assessment.id, user.id, assessment.quiz_score
    );
    Ok(assessment)
}

/// The caller's assessments, newest first.
pub async fn get_assessments(pool: &PgPool, user_id: Uuid) -> Result<Vec<Assessment>, AppError> {
    let assessments = sqlx::query_as::<_, Assessment>(
        "SELECT * FROM assessments WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(assessments)
}
