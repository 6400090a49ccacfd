//! On-demand answer explanations, cached for a day per (industry, question, answer).

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::cache::TtlCache;
use crate::errors::AppError;
use crate::fallback::{DEFAULT_EXPLANATION, DEFAULT_QUIZ_INDUSTRY};
use crate::interview::prompts::EXPLANATION_PROMPT_TEMPLATE;
use crate::llm_client::normalize::clamp_str;
use crate::llm_client::prompts::fill_template;
use crate::llm_client::{generate_text, TextGenerator};
use crate::state::ExplanationKey;

pub const EXPLANATION_TTL: Duration = Duration::from_secs(24 * 60 * 60);
const MAX_EXPLANATION_CHARS: usize = 1_000;

pub type ExplanationCache = TtlCache<ExplanationKey, String>;

pub fn build_explanation_prompt(industry: &str, question: &str, correct_answer: &str) -> String {
    fill_template(
        EXPLANATION_PROMPT_TEMPLATE,
        &[
            ("industry", industry),
            ("question", question),
            ("correct_answer", correct_answer),
        ],
    )
}

/// Explains why `correct_answer` answers `question`. Falls back to a generic
/// sentence, uncached, when the model is unavailable.
pub async fn explain_question(
    llm: &Arc<dyn TextGenerator>,
    cache: &ExplanationCache,
    industry: Option<&str>,
    question: &str,
    correct_answer: &str,
    timeout: Duration,
) -> Result<String, AppError> {
    let question = question.trim();
    let correct_answer = correct_answer.trim();
    if question.is_empty() || correct_answer.is_empty() {
        return Err(AppError::Validation(
            "question and correct_answer are required".to_string(),
        ));
    }

    let industry = industry.unwrap_or(DEFAULT_QUIZ_INDUSTRY);
    let key = (
        industry.to_string(),
        question.to_string(),
        correct_answer.to_string(),
    );

    let generated = cache
        .get_or_compute(key, EXPLANATION_TTL, || async {
            debug!("Explanation cache miss");
            let prompt = build_explanation_prompt(industry, question, correct_answer);
            let text = generate_text(llm, prompt, timeout).await?;
            Ok::<_, AppError>(clamp_str(text, MAX_EXPLANATION_CHARS))
        })
        .await;

    Ok(match generated {
        Ok(explanation) => explanation,
        Err(e) => {
            warn!("Explanation generation failed, using default: {e}");
            DEFAULT_EXPLANATION.to_string()
        }
    })
}
