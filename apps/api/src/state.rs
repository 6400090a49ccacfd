use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::insights::tech_stacks::TechStackCache;
use crate::interview::explain::ExplanationCache;
use crate::interview::quiz::QuizCache;
use crate::llm_client::TextGenerator;

/// Key for cached explanations: (industry, question, correct answer).
pub type ExplanationKey = (String, String, String);

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Pluggable text generator. Default: GeminiClient, or DisabledGenerator without an API key.
    pub llm: Arc<dyn TextGenerator>,
    pub config: Config,
    pub caches: Arc<Caches>,
}

/// Process-local caches. Built once in `main`; each test builds its own.
#[derive(Default)]
pub struct Caches {
    pub quizzes: QuizCache,
    pub tech_stacks: TechStackCache,
    pub explanations: ExplanationCache,
}
