use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::auth::{load_user, AuthUser};
use crate::errors::AppError;
use crate::interview::assessments::{get_assessments, save_quiz_result};
use crate::interview::explain::explain_question;
use crate::interview::grading::{assessment_stats, AssessmentStats};
use crate::interview::quiz::generate_quiz_questions;
use crate::models::assessment::{Assessment, QuizQuestion};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SaveQuizRequest {
    pub questions: Vec<QuizQuestion>,
    pub answers: Vec<String>,
}

#[derive(Deserialize)]
pub struct ExplainRequest {
    pub question: String,
    pub correct_answer: String,
}

#[derive(Serialize)]
pub struct ExplainResponse {
    pub explanation: String,
}

/// POST /api/v1/interview/quiz
pub async fn handle_generate_quiz(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<QuizQuestion>>, AppError> {
    let user = load_user(&state.db, &auth).await?;
    let questions = generate_quiz_questions(
        &state.llm,
        &state.caches.quizzes,
        user.id,
        user.industry.as_deref(),
        &user.skills,
        state.config.ai_timeout,
    )
    .await;
    Ok(Json(questions))
}

/// POST /api/v1/interview/assessments
pub async fn handle_save_quiz_result(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<SaveQuizRequest>,
) -> Result<(StatusCode, Json<Assessment>), AppError> {
    let user = load_user(&state.db, &auth).await?;
    let assessment = save_quiz_result(
        &state.db,
        &state.llm,
        &user,
        &req.questions,
        &req.answers,
        state.config.ai_timeout,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(assessment)))
}

/// GET /api/v1/interview/assessments
pub async fn handle_get_assessments(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<Assessment>>, AppError> {
    let user = load_user(&state.db, &auth).await?;
    Ok(Json(get_assessments(&state.db, user.id).await?))
}

/// GET /api/v1/interview/stats
pub async fn handle_get_stats(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<AssessmentStats>, AppError> {
    let user = load_user(&state.db, &auth).await?;
    let assessments = get_assessments(&state.db, user.id).await?;
    Ok(Json(assessment_stats(&assessments)))
}

/// POST /api/v1/interview/explain
pub async fn handle_explain(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<ExplainRequest>,
) -> Result<Json<ExplainResponse>, AppError> {
    let user = load_user(&state.db, &auth).await?;
    let explanation = explain_question(
        &state.llm,
        &state.caches.explanations,
        user.industry.as_deref(),
        &req.question,
        &req.correct_answer,
        state.config.ai_timeout,
    )
    .await?;
    Ok(Json(ExplainResponse { explanation }))
}
