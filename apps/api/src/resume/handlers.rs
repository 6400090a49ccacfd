use axum::{extract::State, Json};
use serde::Deserialize;

use crate::auth::{load_user, AuthUser};
use crate::errors::AppError;
use crate::models::resume::Resume;
use crate::resume::store::{get_resume, save_resume};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SaveResumeRequest {
    pub content: String,
}

/// GET /api/v1/resume
pub async fn handle_get_resume(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Resume>, AppError> {
    let user = load_user(&state.db, &auth).await?;
    Ok(Json(get_resume(&state.db, user.id).await?))
}

/// PUT /api/v1/resume
pub async fn handle_save_resume(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<SaveResumeRequest>,
) -> Result<Json<Resume>, AppError> {
    let user = load_user(&state.db, &auth).await?;
    Ok(Json(save_resume(&state.db, user.id, &req.content).await?))
}
