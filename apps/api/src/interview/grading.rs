//! Server-side grading and assessment statistics. Pure functions only.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::errors::AppError;
use crate::models::assessment::{Assessment, QuestionResult, QuizQuestion};

#[derive(Debug, Clone, PartialEq)]
pub struct GradedQuiz {
    pub results: Vec<QuestionResult>,
    /// Percentage of correct answers, 0 to 100.
    pub score: f64,
}

impl GradedQuiz {
    pub fn wrong_answers(&self) -> impl Iterator<Item = &QuestionResult> {
        self.results.iter().filter(|r| !r.is_correct)
    }
}

pub fn score_percent(correct: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    correct as f64 / total as f64 * 100.0
}

/// Grades `answers` positionally against `questions`.
pub fn grade_answers(questions: &[QuizQuestion], answers: &[String]) -> Result<GradedQuiz, AppError> {
    if questions.is_empty() {
        return Err(AppError::Validation("Quiz has no questions".to_string()));
    }
    if questions.len() != answers.len() {
        return Err(AppError::Validation(format!(
            "Expected {} answers, got {}",
            questions.len(),
            answers.len()
        )));
    }

    let results: Vec<QuestionResult> = questions
        .iter()
        .zip(answers)
        .map(|(q, answer)| QuestionResult {
            question: q.question.clone(),
            answer: q.correct_answer.clone(),
            user_answer: answer.clone(),
            is_correct: answer.trim() == q.correct_answer.trim(),
            explanation: q.explanation.clone(),
        })
        .collect();

    let correct = results.iter().filter(|r| r.is_correct).count();
    Ok(GradedQuiz {
        score: score_percent(correct, results.len()),
        results,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssessmentStats {
    pub total_assessments: usize,
    pub average_score: f64,
    pub latest_score: Option<f64>,
    pub latest_at: Option<DateTime<Utc>>,
    pub total_questions: usize,
}

pub fn assessment_stats(assessments: &[Assessment]) -> AssessmentStats {
    let latest = assessments.iter().max_by_key(|a| a.created_at);
    let average_score = if assessments.is_empty() {
        0.0
    } else {
        assessments.iter().map(|a| a.quiz_score).sum::<f64>() / assessments.len() as f64
    };

    AssessmentStats {
        total_assessments: assessments.len(),
        average_score,
        latest_score: latest.map(|a| a.quiz_score),
        latest_at: latest.map(|a| a.created_at),
        total_questions: assessments.iter().map(|a| a.questions.len()).sum(),
    }
}
