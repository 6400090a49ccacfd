//! Quiz generation with a short per-user cache.
//!
//! A fresh quiz is cached per user for five minutes so page reloads do not
//! burn provider quota. Upstream failures serve the static quiz, which is
//! never cached: the next request tries the model again.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::cache::TtlCache;
use crate::errors::AppError;
use crate::fallback::{fallback_quiz, DEFAULT_QUIZ_INDUSTRY};
use crate::interview::prompts::QUIZ_PROMPT_TEMPLATE;
use crate::llm_client::normalize::{clamp_str, Bounded};
use crate::llm_client::prompts::{fill_template, skills_clause, JSON_ONLY_INSTRUCTION};
use crate::llm_client::{generate_json, TextGenerator};
use crate::models::assessment::QuizQuestion;

pub const QUIZ_TTL: Duration = Duration::from_secs(5 * 60);
pub const QUIZ_LENGTH: usize = 10;
const OPTIONS_PER_QUESTION: usize = 4;
const MAX_TEXT_CHARS: usize = 500;

pub type QuizCache = TtlCache<Uuid, Vec<QuizQuestion>>;

#[derive(Debug, Deserialize)]
pub struct QuizReply {
    pub questions: Vec<QuizQuestion>,
}

impl Bounded for QuizQuestion {
    fn bound(self) -> Self {
        QuizQuestion {
            question: clamp_str(self.question.trim().to_string(), MAX_TEXT_CHARS),
            options: self
                .options
                .into_iter()
                .map(|o| clamp_str(o.trim().to_string(), MAX_TEXT_CHARS))
                .filter(|o| !o.is_empty())
                .take(OPTIONS_PER_QUESTION)
                .collect(),
            correct_answer: clamp_str(self.correct_answer.trim().to_string(), MAX_TEXT_CHARS),
            explanation: None,
        }
    }
}

impl QuizQuestion {
    /// A question can only be graded if its answer is one of its options.
    pub fn is_gradeable(&self) -> bool {
        !self.question.is_empty()
            && self.options.len() >= 2
            && self.options.contains(&self.correct_answer)
    }
}

impl Bounded for QuizReply {
    fn bound(self) -> Self {
        QuizReply {
            questions: self
                .questions
                .into_iter()
                .map(Bounded::bound)
                .filter(QuizQuestion::is_gradeable)
                .take(QUIZ_LENGTH)
                .collect(),
        }
    }
}

pub fn build_quiz_prompt(industry: Option<&str>, skills: &[String]) -> String {
    fill_template(
        QUIZ_PROMPT_TEMPLATE,
        &[
            ("count", &QUIZ_LENGTH.to_string()),
            ("industry", industry.unwrap_or(DEFAULT_QUIZ_INDUSTRY)),
            ("skills_clause", &skills_clause(skills)),
            ("json_only", JSON_ONLY_INSTRUCTION),
        ],
    )
}

/// Returns quiz questions for `user_id`, from cache when fresh.
pub async fn generate_quiz_questions(
    llm: &Arc<dyn TextGenerator>,
    cache: &QuizCache,
    user_id: Uuid,
    industry: Option<&str>,
    skills: &[String],
    timeout: Duration,
) -> Vec<QuizQuestion> {
    let generated = cache
        .get_or_compute(user_id, QUIZ_TTL, || async {
            debug!("Quiz cache miss for user {user_id}");
            let reply =
                generate_json::<QuizReply>(llm, build_quiz_prompt(industry, skills), timeout)
                    .await?;
            if reply.questions.is_empty() {
                return Err(AppError::UpstreamParse(
                    "model returned no gradeable questions".to_string(),
                ));
            }
            info!(
                "Generated {} quiz questions for user {user_id}",
                reply.questions.len()
            );
            Ok::<_, AppError>(reply.questions)
        })
        .await;

    match generated {
        Ok(questions) => questions,
        Err(e) => {
            warn!("Quiz generation failed for user {user_id}, serving fallback quiz: {e}");
            fallback_quiz(industry)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::normalize::normalize;
    use crate::llm_client::testing::FakeGenerator;

    const REPLY: &str = r#"Here you go:
{
  "questions": [
    {
      "question": "Which keyword declares an immutable binding in Rust?",
      "options": ["let", "mut", "var", "const fn"],
      "correctAnswer": "let"
    },
    {
      "question": "Broken question",
      "options": ["a", "b"],
      "correctAnswer": "c"
    }
  ]
}"#;

    #[test]
    fn test_ungradeable_questions_are_dropped() {
        let reply: QuizReply = normalize(REPLY).unwrap();
        assert_eq!(reply.questions.len(), 1);
        assert_eq!(reply.questions[0].correct_answer, "let");
    }

    #[test]
    fn test_numbered_intro_before_payload_still_parses() {
        let raw = "Here are your [10] questions:\n{\"questions\": [{\"question\": \"Q\", \"options\": [\"a\", \"b\"], \"correctAnswer\": \"a\"}]}";
        let reply: QuizReply = normalize(raw).unwrap();
        assert_eq!(reply.questions.len(), 1);
        assert_eq!(reply.questions[0].correct_answer, "a");
    }

    #[test]
    fn test_options_capped_at_four() {
        let question = QuizQuestion {
            question: "Q".to_string(),
            options: vec!["a", "b", "c", "d", "e"]
                .into_iter()
                .map(String::from)
                .collect(),
            correct_answer: "a".to_string(),
            explanation: Some("ignored".to_string()),
        }
        .bound();
        assert_eq!(question.options.len(), 4);
        assert!(question.explanation.is_none());
    }

    #[test]
    fn test_missing_questions_field_is_rejected() {
        assert!(normalize::<QuizReply>(r#"{"items": []}"#).is_err());
    }

    #[test]
    fn test_prompt_mentions_industry_and_skills() {
        let skills = vec!["Kotlin".to_string(), "Android".to_string()];
        let prompt = build_quiz_prompt(Some("Mobile Development"), &skills);
        assert!(prompt.contains(
            "Generate 10 technical interview questions for a Mobile Development professional with expertise in Kotlin, Android."
        ));
    }

    #[test]
    fn test_prompt_without_industry_uses_default() {
        let prompt = build_quiz_prompt(None, &[]);
        assert!(prompt.contains("for a Software Development professional."));
    }

    #[tokio::test(start_paused = true)]
    async fn test_quiz_cached_per_user_for_five_minutes() {
        let fake = Arc::new(FakeGenerator::replying(REPLY));
        let llm: Arc<dyn TextGenerator> = fake.clone();
        let cache = QuizCache::new();
        let user = Uuid::new_v4();
        let timeout = Duration::from_secs(10);

        let first = generate_quiz_questions(&llm, &cache, user, Some("Tech"), &[], timeout).await;
        let again = generate_quiz_questions(&llm, &cache, user, Some("Tech"), &[], timeout).await;
        assert_eq!(first, again);
        assert_eq!(fake.calls(), 1);

        let other = Uuid::new_v4();
        generate_quiz_questions(&llm, &cache, other, Some("Tech"), &[], timeout).await;
        assert_eq!(fake.calls(), 2);

        tokio::time::advance(QUIZ_TTL).await;
        generate_quiz_questions(&llm, &cache, user, Some("Tech"), &[], timeout).await;
        assert_eq!(fake.calls(), 3);
    }

    #[tokio::test]
    async fn test_failure_serves_uncached_fallback() {
        let fake = Arc::new(FakeGenerator::failing(500));
        let llm: Arc<dyn TextGenerator> = fake.clone();
        let cache = QuizCache::new();
        let user = Uuid::new_v4();

        let quiz =
            generate_quiz_questions(&llm, &cache, user, Some("Finance"), &[], Duration::from_secs(10))
                .await;
        assert_eq!(quiz, fallback_quiz(Some("Finance")));
        assert_eq!(cache.len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_provider_serves_fallback() {
        let llm = FakeGenerator::replying(REPLY)
            .delayed(Duration::from_secs(120))
            .into_dyn();
        let cache = QuizCache::new();

        let quiz = generate_quiz_questions(
            &llm,
            &cache,
            Uuid::new_v4(),
            None,
            &[],
            Duration::from_secs(10),
        )
        .await;
        assert_eq!(quiz, fallback_quiz(None));
    }
}
