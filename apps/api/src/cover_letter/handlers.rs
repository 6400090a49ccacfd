use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::{load_user, AuthUser};
use crate::cover_letter::letters::{
    delete_cover_letter, generate_cover_letter, get_cover_letter, list_cover_letters,
    update_cover_letter,
};
use crate::cover_letter::prompts::CoverLetterRequest;
use crate::errors::AppError;
use crate::models::cover_letter::CoverLetter;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct UpdateCoverLetterRequest {
    pub content: String,
}

/// POST /api/v1/cover-letters
pub async fn handle_generate(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CoverLetterRequest>,
) -> Result<(StatusCode, Json<CoverLetter>), AppError> {
    let user = load_user(&state.db, &auth).await?;
    let letter = generate_cover_letter(
        &state.db,
        &state.llm,
        &user,
        &req,
        state.config.cover_letter_timeout,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(letter)))
}

/// GET /api/v1/cover-letters
pub async fn handle_list(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<CoverLetter>>, AppError> {
    let user = load_user(&state.db, &auth).await?;
    Ok(Json(list_cover_letters(&state.db, user.id).await?))
}

/// GET /api/v1/cover-letters/:id
pub async fn handle_get(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<CoverLetter>, AppError> {
    let user = load_user(&state.db, &auth).await?;
    Ok(Json(get_cover_letter(&state.db, user.id, id).await?))
}

/// PUT /api/v1/cover-letters/:id
pub async fn handle_update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateCoverLetterRequest>,
) -> Result<Json<CoverLetter>, AppError> {
    let user = load_user(&state.db, &auth).await?;
    Ok(Json(
        update_cover_letter(&state.db, user.id, id, &req.content).await?,
    ))
}

/// DELETE /api/v1/cover-letters/:id
pub async fn handle_delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let user = load_user(&state.db, &auth).await?;
    delete_cover_letter(&state.db, user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
