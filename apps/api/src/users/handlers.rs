use axum::{extract::State, Json};

use crate::auth::{load_user, AuthUser};
use crate::errors::AppError;
use crate::models::user::User;
use crate::state::AppState;
use crate::users::profile::{onboarding_status, update_profile, OnboardingStatus, ProfileUpdate};

/// GET /api/v1/users/me
pub async fn handle_get_me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<User>, AppError> {
    Ok(Json(load_user(&state.db, &auth).await?))
}

/// PUT /api/v1/users/me
pub async fn handle_update_me(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<User>, AppError> {
    let user = load_user(&state.db, &auth).await?;
    let updated = update_profile(
        &state.db,
        &state.llm,
        &user,
        update,
        state.config.ai_timeout,
    )
    .await?;
    Ok(Json(updated))
}

/// GET /api/v1/users/me/onboarding
pub async fn handle_onboarding_status(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<OnboardingStatus>, AppError> {
    let user = load_user(&state.db, &auth).await?;
    Ok(Json(onboarding_status(&user)))
}
