//! Per-industry insight generation and persistence.
//!
//! A stored row is served as is. On a miss the model is asked, bounded by
//! the AI timeout, and any upstream failure substitutes the static default.
//! The result is inserted with a refresh date one week out.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use sqlx::types::Json;
use sqlx::{PgExecutor, PgPool};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::fallback::default_insights;
use crate::insights::aggregator::{aggregate, UPDATE_INTERVAL_DAYS};
use crate::insights::prompts::INSIGHTS_PROMPT_TEMPLATE;
use crate::llm_client::normalize::{cap_strings, clamp_str, non_negative, Bounded};
use crate::llm_client::prompts::{fill_template, JSON_ONLY_INSTRUCTION};
use crate::llm_client::{generate_json, TextGenerator};
use crate::models::insight::{
    DemandLevel, IndustryInsight, IndustryInsightRow, MarketOutlook, SalaryRange,
};

const MAX_SALARY_BANDS: usize = 10;
const MAX_LIST_LEN: usize = 10;
const MAX_ITEM_CHARS: usize = 80;

/// Insight payload as the model is asked to produce it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedInsights {
    pub salary_ranges: Vec<SalaryRange>,
    pub growth_rate: f64,
    #[serde(deserialize_with = "lenient_label")]
    pub demand_level: DemandLevel,
    #[serde(deserialize_with = "lenient_label")]
    pub market_outlook: MarketOutlook,
    pub top_skills: Vec<String>,
    pub key_trends: Vec<String>,
    pub recommended_skills: Vec<String>,
}

// Models drift on casing ("high", "POSITIVE"); anything unrecognised falls
// back to the neutral default rather than rejecting the whole payload.
fn lenient_label<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: std::str::FromStr + Default,
{
    let raw = String::deserialize(deserializer)?;
    Ok(raw.parse().unwrap_or_default())
}

impl Bounded for GeneratedInsights {
    fn bound(self) -> Self {
        let salary_ranges = self
            .salary_ranges
            .into_iter()
            .filter(|band| !band.role.trim().is_empty())
            .take(MAX_SALARY_BANDS)
            .map(|band| SalaryRange {
                role: clamp_str(band.role.trim().to_string(), MAX_ITEM_CHARS),
                min: non_negative(band.min),
                max: non_negative(band.max),
                median: non_negative(band.median),
                location: clamp_str(band.location, MAX_ITEM_CHARS),
            })
            .collect();

        GeneratedInsights {
            salary_ranges,
            growth_rate: non_negative(self.growth_rate),
            demand_level: self.demand_level,
            market_outlook: self.market_outlook,
            top_skills: cap_strings(self.top_skills, MAX_LIST_LEN, MAX_ITEM_CHARS),
            key_trends: cap_strings(self.key_trends, MAX_LIST_LEN, MAX_ITEM_CHARS),
            recommended_skills: cap_strings(self.recommended_skills, MAX_LIST_LEN, MAX_ITEM_CHARS),
        }
    }
}

impl GeneratedInsights {
    pub fn into_insight(self, industry: &str, now: DateTime<Utc>) -> IndustryInsight {
        IndustryInsight {
            industry: industry.to_string(),
            salary_ranges: self.salary_ranges,
            growth_rate: self.growth_rate,
            demand_level: self.demand_level,
            market_outlook: self.market_outlook,
            top_skills: self.top_skills,
            key_trends: self.key_trends,
            recommended_skills: self.recommended_skills,
            last_updated: now,
            next_update: now + chrono::Duration::days(UPDATE_INTERVAL_DAYS),
        }
    }
}

pub fn build_insights_prompt(industry: &str) -> String {
    fill_template(
        INSIGHTS_PROMPT_TEMPLATE,
        &[("industry", industry), ("json_only", JSON_ONLY_INSTRUCTION)],
    )
}

/// Asks the model for insights on `industry`; never fails, falling back to
/// the static default on timeout, provider error or unusable output.
pub async fn generate_insights_or_fallback(
    llm: &Arc<dyn TextGenerator>,
    industry: &str,
    timeout: Duration,
) -> GeneratedInsights {
    match generate_json::<GeneratedInsights>(llm, build_insights_prompt(industry), timeout).await {
        Ok(insights) => insights,
        Err(e) => {
            warn!("Insight generation for '{industry}' failed, using fallback: {e}");
            default_insights()
        }
    }
}

pub async fn find_insight<'e>(
    executor: impl PgExecutor<'e>,
    industry: &str,
) -> Result<Option<IndustryInsight>, AppError> {
    let row = sqlx::query_as::<_, IndustryInsightRow>(
        "SELECT * FROM industry_insights WHERE industry = $1",
    )
    .bind(industry)
    .fetch_optional(executor)
    .await?;
    Ok(row.map(IndustryInsight::from))
}

/// Inserts `insight` unless a row for its industry already exists.
pub async fn insert_insight<'e>(
    executor: impl PgExecutor<'e>,
    insight: &IndustryInsight,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO industry_insights
            (id, industry, salary_ranges, growth_rate, demand_level, market_outlook,
             top_skills, key_trends, recommended_skills, last_updated, next_update)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        ON CONFLICT (industry) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&insight.industry)
    .bind(Json(&insight.salary_ranges))
    .bind(insight.growth_rate)
    .bind(insight.demand_level.as_str())
    .bind(insight.market_outlook.as_str())
    .bind(&insight.top_skills)
    .bind(&insight.key_trends)
    .bind(&insight.recommended_skills)
    .bind(insight.last_updated)
    .bind(insight.next_update)
    .execute(executor)
    .await?;
    Ok(())
}

/// Returns the stored insight for `industry`, generating and storing one
/// first if none exists. Concurrent first requests for the same industry
/// may both generate; the losing insert is discarded and both callers read
/// the surviving row.
pub async fn ensure_industry_insight(
    pool: &PgPool,
    llm: &Arc<dyn TextGenerator>,
    industry: &str,
    timeout: Duration,
) -> Result<IndustryInsight, AppError> {
    if let Some(existing) = find_insight(pool, industry).await? {
        return Ok(existing);
    }

    info!("No insight stored for '{industry}', generating");
    let generated = generate_insights_or_fallback(llm, industry, timeout).await;
    let insight = generated.into_insight(industry, Utc::now());
    insert_insight(pool, &insight).await?;

    find_insight(pool, industry)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Insight for industry '{industry}' not found")))
}

pub async fn load_all_insights(pool: &PgPool) -> Result<Vec<IndustryInsight>, AppError> {
    let rows = sqlx::query_as::<_, IndustryInsightRow>(
        "SELECT * FROM industry_insights ORDER BY industry",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(IndustryInsight::from).collect())
}

/// Worldwide summary across every stored industry.
pub async fn get_global_insights(pool: &PgPool) -> Result<IndustryInsight, AppError> {
    let insights = load_all_insights(pool).await?;
    info!("Aggregating global insights over {} industries", insights.len());
    Ok(global_summary(&insights))
}

/// Worldwide summary as of now.
pub fn global_summary(insights: &[IndustryInsight]) -> IndustryInsight {
    aggregate(insights, Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::insights::aggregator::GLOBAL_LABEL;
    use crate::llm_client::normalize::normalize;
    use crate::llm_client::testing::FakeGenerator;

    const MODEL_REPLY: &str = r#"```json
{
  "salaryRanges": [
    {"role": "Data Analyst", "min": 60000, "max": 90000, "median": 75000, "location": "US"},
    {"role": "  ", "min": 1, "max": 2, "median": 1, "location": "US"}
  ],
  "growthRate": -3,
  "demandLevel": "high",
  "topSkills": ["SQL", "Python"],
  "marketOutlook": "Positive",
  "keyTrends": ["Automation"],
  "recommendedSkills": ["dbt"]
}
```"#;

    #[test]
    fn test_model_reply_is_normalized() {
        let insights: GeneratedInsights = normalize(MODEL_REPLY).unwrap();
        assert_eq!(insights.salary_ranges.len(), 1);
        assert_eq!(insights.salary_ranges[0].role, "Data Analyst");
        assert_eq!(insights.growth_rate, 0.0);
        assert_eq!(insights.demand_level, DemandLevel::High);
        assert_eq!(insights.market_outlook, MarketOutlook::Positive);
        assert_eq!(insights.top_skills, vec!["SQL", "Python"]);
    }

    #[test]
    fn test_unknown_labels_default() {
        let reply = r#"{"salaryRanges": [], "growthRate": 5, "demandLevel": "extreme",
            "topSkills": [], "marketOutlook": "mixed", "keyTrends": [], "recommendedSkills": []}"#;
        let insights: GeneratedInsights = normalize(reply).unwrap();
        assert_eq!(insights.demand_level, DemandLevel::Medium);
        assert_eq!(insights.market_outlook, MarketOutlook::Neutral);
    }

    #[test]
    fn test_missing_list_is_rejected() {
        let reply = r#"{"salaryRanges": [], "growthRate": 5, "demandLevel": "High",
            "marketOutlook": "Positive", "keyTrends": [], "recommendedSkills": []}"#;
        assert!(normalize::<GeneratedInsights>(reply).is_err());
    }

    #[test]
    fn test_prompt_names_industry() {
        let prompt = build_insights_prompt("Renewable Energy");
        assert!(prompt.contains("Provide Renewable Energy industry insights"));
        assert!(!prompt.contains("{industry}"));
    }

    #[test]
    fn test_into_insight_schedules_weekly_refresh() {
        let now = Utc::now();
        let insight = default_insights().into_insight("Retail", now);
        assert_eq!(insight.industry, "Retail");
        assert_eq!(insight.last_updated, now);
        assert_eq!(insight.next_update - now, chrono::Duration::days(7));
    }

    #[test]
    fn test_empty_global_summary_is_stamped_with_current_time() {
        let before = Utc::now();
        let summary = global_summary(&[]);
        let after = Utc::now();

        assert_eq!(summary.industry, GLOBAL_LABEL);
        assert!(summary.salary_ranges.is_empty());
        assert!(summary.last_updated >= before && summary.last_updated <= after);
        let week = chrono::Duration::days(UPDATE_INTERVAL_DAYS);
        assert!(summary.next_update >= before + week);
        assert!(summary.next_update <= after + week);
    }

    #[tokio::test]
    async fn test_generation_success_uses_model_output() {
        let llm = FakeGenerator::replying(MODEL_REPLY).into_dyn();
        let insights =
            generate_insights_or_fallback(&llm, "Analytics", Duration::from_secs(10)).await;
        assert_eq!(insights.top_skills, vec!["SQL", "Python"]);
    }

    #[tokio::test]
    async fn test_generation_failure_uses_fallback() {
        let llm = FakeGenerator::failing(500).into_dyn();
        let insights =
            generate_insights_or_fallback(&llm, "Analytics", Duration::from_secs(10)).await;
        assert_eq!(insights, default_insights());
    }

    #[tokio::test]
    async fn test_unparsable_reply_uses_fallback() {
        let llm = FakeGenerator::replying("Sorry, I can't help with that.").into_dyn();
        let insights =
            generate_insights_or_fallback(&llm, "Analytics", Duration::from_secs(10)).await;
        assert_eq!(insights, default_insights());
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_provider_uses_fallback() {
        let llm = FakeGenerator::replying(MODEL_REPLY)
            .delayed(Duration::from_secs(60))
            .into_dyn();
        let insights =
            generate_insights_or_fallback(&llm, "Analytics", Duration::from_secs(10)).await;
        assert_eq!(insights, default_insights());
    }
}
