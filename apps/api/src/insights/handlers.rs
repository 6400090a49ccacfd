//! Axum route handlers for the dashboard insights.

use axum::{extract::State, Json};

use crate::auth::{load_user, AuthUser};
use crate::errors::AppError;
use crate::insights::generator::{ensure_industry_insight, get_global_insights};
use crate::insights::tech_stacks::{resolve_tech_stacks, TechStack};
use crate::models::insight::IndustryInsight;
use crate::state::AppState;

/// GET /api/v1/insights
///
/// Insight for the caller's industry, generated on first access.
pub async fn handle_get_industry_insight(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<IndustryInsight>, AppError> {
    let user = load_user(&state.db, &auth).await?;
    let industry = user
        .industry
        .ok_or_else(|| AppError::NotFound("User has not selected an industry".to_string()))?;

    let insight =
        ensure_industry_insight(&state.db, &state.llm, &industry, state.config.ai_timeout).await?;
    Ok(Json(insight))
}

/// GET /api/v1/insights/global
///
/// Worldwide summary over every stored industry.
pub async fn handle_get_global_insights(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<IndustryInsight>, AppError> {
    load_user(&state.db, &auth).await?;
    Ok(Json(get_global_insights(&state.db).await?))
}

/// GET /api/v1/insights/tech-stacks
pub async fn handle_get_tech_stacks(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<TechStack>>, AppError> {
    load_user(&state.db, &auth).await?;
    let stacks = resolve_tech_stacks(
        &state.llm,
        &state.caches.tech_stacks,
        state.config.ai_timeout,
    )
    .await;
    Ok(Json(stacks))
}
