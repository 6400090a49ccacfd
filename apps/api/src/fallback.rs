//! Static payloads served when the AI pipeline cannot produce a usable result.
//!
//! These values are literal and stable; callers and tests rely on them
//! byte-for-byte.

use crate::insights::generator::GeneratedInsights;
use crate::insights::tech_stacks::TechStack;
use crate::models::assessment::QuizQuestion;
use crate::models::insight::{DemandLevel, MarketOutlook, SalaryRange};

pub const DEFAULT_EXPLANATION: &str =
    "This is the correct answer based on industry best practices.";

/// Industry used for the generic quiz when the caller has none on file.
pub const DEFAULT_QUIZ_INDUSTRY: &str = "Software Development";

fn band(role: &str, min: f64, max: f64, median: f64) -> SalaryRange {
    SalaryRange {
        role: role.to_string(),
        min,
        max,
        median,
        location: "US".to_string(),
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

pub fn default_insights() -> GeneratedInsights {
    GeneratedInsights {
        salary_ranges: vec![
            band("Junior Developer", 50_000.0, 80_000.0, 65_000.0),
            band("Senior Developer", 80_000.0, 120_000.0, 100_000.0),
            band("Lead Developer", 100_000.0, 150_000.0, 125_000.0),
            band("Manager", 90_000.0, 140_000.0, 115_000.0),
            band("Director", 120_000.0, 200_000.0, 160_000.0),
        ],
        growth_rate: 12.0,
        demand_level: DemandLevel::High,
        market_outlook: MarketOutlook::Positive,
        top_skills: strings(&["JavaScript", "Python", "React", "Node.js", "AWS"]),
        key_trends: strings(&[
            "Remote Work",
            "AI Integration",
            "Cloud Migration",
            "DevOps",
            "Security",
        ]),
        recommended_skills: strings(&[
            "TypeScript",
            "Docker",
            "Kubernetes",
            "GraphQL",
            "Machine Learning",
        ]),
    }
}

pub fn default_tech_stacks() -> Vec<TechStack> {
    vec![
        TechStack {
            name: "React + Node + AWS".to_string(),
            items: strings(&["React", "Node.js", "AWS"]),
            description:
                "Full-stack web apps with scalable serverless/backend services on AWS.".to_string(),
        },
        TechStack {
            name: "Python + Django + Postgres".to_string(),
            items: strings(&["Python", "Django", "PostgreSQL"]),
            description: "Rapid backend development with a batteries-included framework and SQL database."
                .to_string(),
        },
    ]
}

fn question(text: &str, options: &[&str], correct: &str) -> QuizQuestion {
    QuizQuestion {
        question: text.to_string(),
        options: strings(options),
        correct_answer: correct.to_string(),
        explanation: None,
    }
}

/// Five generic questions, plus one industry question when an industry is known.
pub fn fallback_quiz(industry: Option<&str>) -> Vec<QuizQuestion> {
    let mut questions = vec![
        question(
            "What is the primary purpose of version control systems like Git?",
            &[
                "To store large files",
                "To track changes in code and collaborate with others",
                "To compile code faster",
                "To debug applications",
            ],
            "To track changes in code and collaborate with others",
        ),
        question(
            "Which of the following is NOT a programming paradigm?",
            &[
                "Object-Oriented Programming",
                "Functional Programming",
                "Procedural Programming",
                "Database Programming",
            ],
            "Database Programming",
        ),
        question(
            "What does API stand for?",
            &[
                "Application Programming Interface",
                "Advanced Programming Integration",
                "Automated Program Interface",
                "Application Process Integration",
            ],
            "Application Programming Interface",
        ),
        question(
            "Which HTTP method is typically used to retrieve data?",
            &["POST", "PUT", "GET", "DELETE"],
            "GET",
        ),
        question(
            "What is the main advantage of using a database?",
            &[
                "Faster internet connection",
                "Organized storage and retrieval of data",
                "Better user interface",
                "Automatic code generation",
            ],
            "Organized storage and retrieval of data",
        ),
    ];

    if let Some(industry) = industry.map(str::trim).filter(|i| !i.is_empty()) {
        questions.push(question(
            &format!("In {industry}, what is the most important skill for career growth?"),
            &[
                "Memorizing all tools",
                "Continuous learning and adaptation",
                "Working alone",
                "Avoiding new technologies",
            ],
            "Continuous learning and adaptation",
        ));
    }

    questions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_insights_are_stable() {
        let insights = default_insights();
        assert_eq!(insights.salary_ranges.len(), 5);
        assert_eq!(insights.salary_ranges[0].role, "Junior Developer");
        assert_eq!(insights.salary_ranges[4].median, 160_000.0);
        assert_eq!(insights.growth_rate, 12.0);
        assert_eq!(insights.demand_level, DemandLevel::High);
        assert_eq!(insights.market_outlook, MarketOutlook::Positive);
        assert_eq!(insights.top_skills[0], "JavaScript");
        assert_eq!(insights.recommended_skills[4], "Machine Learning");
    }

    #[test]
    fn test_default_tech_stacks() {
        let stacks = default_tech_stacks();
        assert_eq!(stacks.len(), 2);
        assert_eq!(stacks[0].name, "React + Node + AWS");
        assert_eq!(stacks[1].items, vec!["Python", "Django", "PostgreSQL"]);
    }

    #[test]
    fn test_fallback_quiz_without_industry() {
        let quiz = fallback_quiz(None);
        assert_eq!(quiz.len(), 5);
        assert!(quiz.iter().all(|q| q.options.contains(&q.correct_answer)));
    }

    #[test]
    fn test_fallback_quiz_with_industry() {
        let quiz = fallback_quiz(Some("Healthcare"));
        assert_eq!(quiz.len(), 6);
        assert_eq!(
            quiz[5].question,
            "In Healthcare, what is the most important skill for career growth?"
        );
        assert_eq!(quiz[5].correct_answer, "Continuous learning and adaptation");
    }

    #[test]
    fn test_blank_industry_is_ignored() {
        assert_eq!(fallback_quiz(Some("  ")).len(), 5);
    }
}
