use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DemandLevel {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarketOutlook {
    Negative,
    #[default]
    Neutral,
    Positive,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant(pub String);

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown variant '{}'", self.0)
    }
}

impl FromStr for DemandLevel {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(DemandLevel::Low),
            "medium" => Ok(DemandLevel::Medium),
            "high" => Ok(DemandLevel::High),
            _ => Err(UnknownVariant(s.to_string())),
        }
    }
}

impl FromStr for MarketOutlook {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "negative" => Ok(MarketOutlook::Negative),
            "neutral" => Ok(MarketOutlook::Neutral),
            "positive" => Ok(MarketOutlook::Positive),
            _ => Err(UnknownVariant(s.to_string())),
        }
    }
}

impl DemandLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            DemandLevel::Low => "Low",
            DemandLevel::Medium => "Medium",
            DemandLevel::High => "High",
        }
    }
}

impl MarketOutlook {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarketOutlook::Negative => "Negative",
            MarketOutlook::Neutral => "Neutral",
            MarketOutlook::Positive => "Positive",
        }
    }
}

/// One salary band for a role within an industry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalaryRange {
    pub role: String,
    pub min: f64,
    pub max: f64,
    pub median: f64,
    #[serde(default)]
    pub location: String,
}

/// Stored per-industry snapshot of salary, demand and skill-trend data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndustryInsight {
    pub industry: String,
    pub salary_ranges: Vec<SalaryRange>,
    pub growth_rate: f64,
    pub demand_level: DemandLevel,
    pub market_outlook: MarketOutlook,
    pub top_skills: Vec<String>,
    pub key_trends: Vec<String>,
    pub recommended_skills: Vec<String>,
    pub last_updated: DateTime<Utc>,
    pub next_update: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct IndustryInsightRow {
    pub id: Uuid,
    pub industry: String,
    pub salary_ranges: Json<Vec<SalaryRange>>,
    pub growth_rate: f64,
    pub demand_level: String,
    pub market_outlook: String,
    pub top_skills: Vec<String>,
    pub key_trends: Vec<String>,
    pub recommended_skills: Vec<String>,
    pub last_updated: DateTime<Utc>,
    pub next_update: DateTime<Utc>,
}

impl From<IndustryInsightRow> for IndustryInsight {
    fn from(row: IndustryInsightRow) -> Self {
        IndustryInsight {
            industry: row.industry,
            salary_ranges: row.salary_ranges.0,
            growth_rate: row.growth_rate,
            demand_level: row.demand_level.parse().unwrap_or_default(),
            market_outlook: row.market_outlook.parse().unwrap_or_default(),
            top_skills: row.top_skills,
            key_trends: row.key_trends,
            recommended_skills: row.recommended_skills,
            last_updated: row.last_updated,
            next_update: row.next_update,
        }
    }
}
