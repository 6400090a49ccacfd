pub mod health;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::cover_letter::handlers as cover_letters;
use crate::insights::handlers as insights;
use crate::interview::handlers as interview;
use crate::resume::handlers as resume;
use crate::state::AppState;
use crate::users::handlers as users;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Profile
        .route(
            "/api/v1/users/me",
            get(users::handle_get_me).put(users::handle_update_me),
        )
        .route(
            "/api/v1/users/me/onboarding",
            get(users::handle_onboarding_status),
        )
        // Dashboard
        .route("/api/v1/insights", get(insights::handle_get_industry_insight))
        .route(
            "/api/v1/insights/global",
            get(insights::handle_get_global_insights),
        )
        .route(
            "/api/v1/insights/tech-stacks",
            get(insights::handle_get_tech_stacks),
        )
        // Interview prep
        .route("/api/v1/interview/quiz", post(interview::handle_generate_quiz))
        .route(
            "/api/v1/interview/assessments",
            get(interview::handle_get_assessments).post(interview::handle_save_quiz_result),
        )
        .route("/api/v1/interview/stats", get(interview::handle_get_stats))
        .route("/api/v1/interview/explain", post(interview::handle_explain))
        // Cover letters
        .route(
            "/api/v1/cover-letters",
            get(cover_letters::handle_list).post(cover_letters::handle_generate),
        )
        .route(
            "/api/v1/cover-letters/:id",
            get(cover_letters::handle_get)
                .put(cover_letters::handle_update)
                .delete(cover_letters::handle_delete),
        )
        // Resume
        .route(
            "/api/v1/resume",
            get(resume::handle_get_resume).put(resume::handle_save_resume),
        )
        .with_state(state)
}
