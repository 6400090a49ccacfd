//! Folds every stored industry insight into one worldwide summary.
//!
//! Pure and deterministic: no I/O, and ties are always broken in favour of
//! the value seen first while iterating the input. Iteration order is the
//! order rows come back from the store, so the tie-break is stable but
//! otherwise arbitrary.

use std::collections::HashMap;
use std::hash::Hash;

use chrono::{DateTime, Duration, Utc};

use crate::models::insight::{DemandLevel, IndustryInsight, MarketOutlook, SalaryRange};

/// Label used for the aggregate's industry and for every salary band location.
pub const GLOBAL_LABEL: &str = "Global";
pub const TOP_LIST_LEN: usize = 10;
pub const UPDATE_INTERVAL_DAYS: i64 = 7;

/// Returns up to `n` distinct items ordered by descending frequency,
/// equal counts keeping first-seen order.
pub fn top_n<T, I>(items: I, n: usize) -> Vec<T>
where
    T: Eq + Hash + Clone,
    I: IntoIterator<Item = T>,
{
    let mut order: Vec<T> = Vec::new();
    let mut counts: HashMap<T, usize> = HashMap::new();
    for item in items {
        let count = counts.entry(item.clone()).or_insert(0);
        if *count == 0 {
            order.push(item);
        }
        *count += 1;
    }
    // sort_by is stable, which is what keeps first-seen order on ties.
    order.sort_by(|a, b| counts[b].cmp(&counts[a]));
    order.truncate(n);
    order
}

#[derive(Default)]
struct BandTotals {
    count: u32,
    min: f64,
    max: f64,
    median: f64,
}

fn aggregate_salary_ranges(insights: &[IndustryInsight]) -> Vec<SalaryRange> {
    let mut roles: Vec<String> = Vec::new();
    let mut totals: HashMap<&str, BandTotals> = HashMap::new();

    for band in insights.iter().flat_map(|i| &i.salary_ranges) {
        let entry = totals.entry(band.role.as_str()).or_insert_with(|| {
            roles.push(band.role.clone());
            BandTotals::default()
        });
        entry.count += 1;
        entry.min += band.min;
        entry.max += band.max;
        entry.median += band.median;
    }

    roles
        .into_iter()
        .map(|role| {
            let t = &totals[role.as_str()];
            let n = f64::from(t.count);
            SalaryRange {
                min: (t.min / n).round(),
                max: (t.max / n).round(),
                median: (t.median / n).round(),
                location: GLOBAL_LABEL.to_string(),
                role,
            }
        })
        .collect()
}

fn mean(values: impl ExactSizeIterator<Item = f64>) -> f64 {
    let n = values.len();
    if n == 0 {
        return 0.0;
    }
    values.sum::<f64>() / n as f64
}

fn top_strings<'a>(lists: impl Iterator<Item = &'a Vec<String>>) -> Vec<String> {
    top_n(lists.flatten().cloned(), TOP_LIST_LEN)
}

/// Neutral summary served when nothing has been stored yet.
pub fn empty_summary(now: DateTime<Utc>) -> IndustryInsight {
    IndustryInsight {
        industry: GLOBAL_LABEL.to_string(),
        salary_ranges: vec![],
        growth_rate: 0.0,
        demand_level: DemandLevel::Medium,
        market_outlook: MarketOutlook::Neutral,
        top_skills: vec![],
        key_trends: vec![],
        recommended_skills: vec![],
        last_updated: now,
        next_update: now + Duration::days(UPDATE_INTERVAL_DAYS),
    }
}

pub fn aggregate(insights: &[IndustryInsight], now: DateTime<Utc>) -> IndustryInsight {
    if insights.is_empty() {
        return empty_summary(now);
    }

    IndustryInsight {
        industry: GLOBAL_LABEL.to_string(),
        salary_ranges: aggregate_salary_ranges(insights),
        growth_rate: mean(insights.iter().map(|i| i.growth_rate)),
        demand_level: top_n(insights.iter().map(|i| i.demand_level), 1)
            .pop()
            .unwrap_or_default(),
        market_outlook: top_n(insights.iter().map(|i| i.market_outlook), 1)
            .pop()
            .unwrap_or_default(),
        top_skills: top_strings(insights.iter().map(|i| &i.top_skills)),
        key_trends: top_strings(insights.iter().map(|i| &i.key_trends)),
        recommended_skills: top_strings(insights.iter().map(|i| &i.recommended_skills)),
        last_updated: insights
            .iter()
            .map(|i| i.last_updated)
            .max()
            .unwrap_or(now),
        next_update: insights
            .iter()
            .map(|i| i.next_update)
            .min()
            .unwrap_or(now),
    }
}
